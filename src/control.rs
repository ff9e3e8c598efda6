use alloc::vec::Vec;

use crate::error::{Error, Result};

const POLL_FINAL_8: u8 = 0b0001_0000;
const POLL_FINAL_16: u8 = 0b0000_0001;

/// Sequence numbering width of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modulo {
    /// Sequence numbers 0-7 in a one-byte control field.
    Eight,
    /// Sequence numbers 0-127 in a two-byte control field (AX.25 v2.2 extended mode).
    OneTwentyEight,
}

impl Modulo {
    /// Mask applied to sequence numbers when packing them.
    pub fn mask(self) -> u8 {
        match self {
            Modulo::Eight => 0b0000_0111,
            Modulo::OneTwentyEight => 0b0111_1111,
        }
    }

    /// Number of distinct sequence numbers in this mode.
    pub fn modulus(self) -> u8 {
        match self {
            Modulo::Eight => 8,
            Modulo::OneTwentyEight => 128,
        }
    }

    /// Length of an I or S control field in this mode.
    pub fn control_len(self) -> usize {
        match self {
            Modulo::Eight => 1,
            Modulo::OneTwentyEight => 2,
        }
    }
}

/// The three kinds of AX.25 frame, told apart by the low bits of the first control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Information,
    Supervisory,
    Unnumbered,
}

impl FrameType {
    /// Classify a frame from its first control byte.
    pub fn of(control: u8) -> FrameType {
        if control & 0b01 == 0 {
            FrameType::Information
        } else if control & 0b11 == 0b01 {
            FrameType::Supervisory
        } else {
            FrameType::Unnumbered
        }
    }
}

/// The 2-bit function code of a supervisory frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisoryKind {
    /// RR
    ReceiveReady,
    /// RNR
    ReceiveNotReady,
    /// REJ
    Reject,
    /// SREJ
    SelectiveReject,
}

impl SupervisoryKind {
    fn code(self) -> u8 {
        match self {
            SupervisoryKind::ReceiveReady => 0b00,
            SupervisoryKind::ReceiveNotReady => 0b01,
            SupervisoryKind::Reject => 0b10,
            SupervisoryKind::SelectiveReject => 0b11,
        }
    }

    fn from_code(code: u8) -> SupervisoryKind {
        match code & 0b11 {
            0b00 => SupervisoryKind::ReceiveReady,
            0b01 => SupervisoryKind::ReceiveNotReady,
            0b10 => SupervisoryKind::Reject,
            _ => SupervisoryKind::SelectiveReject,
        }
    }
}

/// Unnumbered frame subtypes, identified by the control byte with the P/F bit masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnnumberedKind {
    /// Set Asynchronous Balanced Mode
    Sabm,
    /// Set Asynchronous Balanced Mode Extended
    Sabme,
    /// Disconnect
    Disc,
    /// Disconnected Mode
    Dm,
    /// Unnumbered Acknowledge
    Ua,
    /// Unnumbered Information
    Ui,
    /// Exchange Identification
    Xid,
    /// Test
    Test,
    /// Frame Reject
    Frmr,
}

impl UnnumberedKind {
    /// The control byte for this subtype with the P/F bit clear.
    pub fn modifier(self) -> u8 {
        match self {
            UnnumberedKind::Sabm => 0b0010_1111,
            UnnumberedKind::Sabme => 0b0110_1111,
            UnnumberedKind::Disc => 0b0100_0011,
            UnnumberedKind::Dm => 0b0000_1111,
            UnnumberedKind::Ua => 0b0110_0011,
            UnnumberedKind::Ui => 0b0000_0011,
            UnnumberedKind::Xid => 0b1010_1111,
            UnnumberedKind::Test => 0b1110_0011,
            UnnumberedKind::Frmr => 0b1000_0111,
        }
    }

    /// Look up the subtype of an unnumbered control byte, ignoring the P/F bit.
    pub fn from_control(control: u8) -> Result<UnnumberedKind> {
        match control & !POLL_FINAL_8 {
            0b0010_1111 => Ok(UnnumberedKind::Sabm),
            0b0110_1111 => Ok(UnnumberedKind::Sabme),
            0b0100_0011 => Ok(UnnumberedKind::Disc),
            0b0000_1111 => Ok(UnnumberedKind::Dm),
            0b0110_0011 => Ok(UnnumberedKind::Ua),
            0b0000_0011 => Ok(UnnumberedKind::Ui),
            0b1010_1111 => Ok(UnnumberedKind::Xid),
            0b1110_0011 => Ok(UnnumberedKind::Test),
            0b1000_0111 => Ok(UnnumberedKind::Frmr),
            _ => Err(Error::InvalidControlField { control }),
        }
    }
}

/// A decoded control field.
///
/// Sequence numbers must be below the modulus of the mode they are encoded in.
/// Wrapping them is the caller's job. Debug builds panic on an out of range number;
/// release builds mask it to the width of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Information {
        send_sequence: u8,
        receive_sequence: u8,
        poll: bool,
    },
    Supervisory {
        kind: SupervisoryKind,
        receive_sequence: u8,
        poll_or_final: bool,
    },
    Unnumbered {
        kind: UnnumberedKind,
        poll_or_final: bool,
    },
}

impl Control {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Control::Information { .. } => FrameType::Information,
            Control::Supervisory { .. } => FrameType::Supervisory,
            Control::Unnumbered { .. } => FrameType::Unnumbered,
        }
    }

    /// Append the control field to `out`. U frames always take one byte; I and S frames
    /// take one or two depending on `modulo`.
    pub fn encode_into(&self, modulo: Modulo, out: &mut Vec<u8>) {
        debug_assert!(
            match *self {
                Control::Information {
                    send_sequence,
                    receive_sequence,
                    ..
                } => send_sequence.max(receive_sequence) < modulo.modulus(),
                Control::Supervisory {
                    receive_sequence, ..
                } => receive_sequence < modulo.modulus(),
                Control::Unnumbered { .. } => true,
            },
            "sequence number out of range for modulo {}",
            modulo.modulus()
        );
        let mask = modulo.mask();
        match (*self, modulo) {
            (
                Control::Information {
                    send_sequence,
                    receive_sequence,
                    poll,
                },
                Modulo::Eight,
            ) => {
                let mut c: u8 = 0;
                c |= (receive_sequence & mask) << 5;
                c |= if poll { POLL_FINAL_8 } else { 0 };
                c |= (send_sequence & mask) << 1;
                out.push(c);
            }
            (
                Control::Information {
                    send_sequence,
                    receive_sequence,
                    poll,
                },
                Modulo::OneTwentyEight,
            ) => {
                out.push((send_sequence & mask) << 1);
                out.push(((receive_sequence & mask) << 1) | if poll { POLL_FINAL_16 } else { 0 });
            }
            (
                Control::Supervisory {
                    kind,
                    receive_sequence,
                    poll_or_final,
                },
                Modulo::Eight,
            ) => {
                let mut c: u8 = 0b0000_0001;
                c |= kind.code() << 2;
                c |= if poll_or_final { POLL_FINAL_8 } else { 0 };
                c |= (receive_sequence & mask) << 5;
                out.push(c);
            }
            (
                Control::Supervisory {
                    kind,
                    receive_sequence,
                    poll_or_final,
                },
                Modulo::OneTwentyEight,
            ) => {
                out.push(0b0000_0001 | (kind.code() << 2));
                out.push(
                    ((receive_sequence & mask) << 1)
                        | if poll_or_final { POLL_FINAL_16 } else { 0 },
                );
            }
            (
                Control::Unnumbered {
                    kind,
                    poll_or_final,
                },
                _,
            ) => {
                out.push(kind.modifier() | if poll_or_final { POLL_FINAL_8 } else { 0 });
            }
        }
    }

    /// Decode the control field at the start of `bytes`, returning it with the number of
    /// bytes it used.
    pub fn decode(bytes: &[u8], modulo: Modulo) -> Result<(Control, usize)> {
        let c = *bytes.first().ok_or(Error::TruncatedFrame {
            needed: 1,
            actual: 0,
        })?;
        let frame_type = FrameType::of(c);
        if frame_type == FrameType::Unnumbered {
            let control = Control::Unnumbered {
                kind: UnnumberedKind::from_control(c)?,
                poll_or_final: c & POLL_FINAL_8 > 0,
            };
            return Ok((control, 1));
        }

        match modulo {
            Modulo::Eight => {
                let receive_sequence = (c & 0b1110_0000) >> 5;
                let poll_or_final = c & POLL_FINAL_8 > 0;
                let control = match frame_type {
                    FrameType::Information => Control::Information {
                        send_sequence: (c & 0b0000_1110) >> 1,
                        receive_sequence,
                        poll: poll_or_final,
                    },
                    _ => Control::Supervisory {
                        kind: SupervisoryKind::from_code(c >> 2),
                        receive_sequence,
                        poll_or_final,
                    },
                };
                Ok((control, 1))
            }
            Modulo::OneTwentyEight => {
                let c2 = *bytes.get(1).ok_or(Error::TruncatedFrame {
                    needed: 2,
                    actual: bytes.len(),
                })?;
                let receive_sequence = c2 >> 1;
                let poll_or_final = c2 & POLL_FINAL_16 > 0;
                let control = match frame_type {
                    FrameType::Information => Control::Information {
                        send_sequence: c >> 1,
                        receive_sequence,
                        poll: poll_or_final,
                    },
                    _ => {
                        if c & 0b1111_0000 != 0 {
                            return Err(Error::InvalidControlField { control: c });
                        }
                        Control::Supervisory {
                            kind: SupervisoryKind::from_code(c >> 2),
                            receive_sequence,
                            poll_or_final,
                        }
                    }
                };
                Ok((control, 2))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(control: Control, modulo: Modulo) -> Vec<u8> {
        let mut out = Vec::new();
        control.encode_into(modulo, &mut out);
        out
    }

    #[test]
    fn classify() {
        assert_eq!(FrameType::of(0x00), FrameType::Information);
        assert_eq!(FrameType::of(0xfe), FrameType::Information);
        assert_eq!(FrameType::of(0x01), FrameType::Supervisory);
        assert_eq!(FrameType::of(0x0d), FrameType::Supervisory);
        assert_eq!(FrameType::of(0x03), FrameType::Unnumbered);
        assert_eq!(FrameType::of(0xff), FrameType::Unnumbered);
    }

    #[test]
    fn extended_information_control() {
        let control = Control::Information {
            send_sequence: 5,
            receive_sequence: 3,
            poll: true,
        };
        let bytes = encode(control, Modulo::OneTwentyEight);
        assert_eq!(bytes, vec![0x0a, 0x07]);
        assert_eq!(
            Control::decode(&bytes, Modulo::OneTwentyEight),
            Ok((control, 2))
        );
    }

    #[test]
    fn information_control_8() {
        // N(S)=3, N(R)=5, P=1
        let control = Control::Information {
            send_sequence: 3,
            receive_sequence: 5,
            poll: true,
        };
        assert_eq!(encode(control, Modulo::Eight), vec![0xb6]);
        assert_eq!(Control::decode(&[0xb6], Modulo::Eight), Ok((control, 1)));
    }

    #[test]
    fn supervisory_codes() {
        let kinds = [
            (SupervisoryKind::ReceiveReady, 0x01),
            (SupervisoryKind::ReceiveNotReady, 0x05),
            (SupervisoryKind::Reject, 0x09),
            (SupervisoryKind::SelectiveReject, 0x0d),
        ];
        for (kind, byte) in kinds {
            let control = Control::Supervisory {
                kind,
                receive_sequence: 6,
                poll_or_final: false,
            };
            assert_eq!(encode(control, Modulo::Eight), vec![byte | 0xc0]);
            assert_eq!(
                encode(control, Modulo::OneTwentyEight),
                vec![byte, 6 << 1]
            );
            assert_eq!(
                Control::decode(&[byte, 0x0c], Modulo::OneTwentyEight),
                Ok((control, 2))
            );
        }
    }

    #[test]
    fn sequence_numbers_at_the_boundary() {
        for (modulo, top) in [(Modulo::Eight, 7), (Modulo::OneTwentyEight, 127)] {
            for ns in [top, 0] {
                let control = Control::Information {
                    send_sequence: ns,
                    receive_sequence: top - ns,
                    poll: false,
                };
                let bytes = encode(control, modulo);
                assert_eq!(bytes.len(), modulo.control_len());
                assert_eq!(Control::decode(&bytes, modulo), Ok((control, bytes.len())));
            }
        }
    }

    #[test]
    fn modulus_and_mask_agree() {
        for modulo in [Modulo::Eight, Modulo::OneTwentyEight] {
            assert_eq!(u16::from(modulo.mask()) + 1, u16::from(modulo.modulus()));
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "sequence number out of range for modulo 8")]
    fn send_sequence_beyond_modulus() {
        encode(
            Control::Information {
                send_sequence: 8,
                receive_sequence: 1,
                poll: false,
            },
            Modulo::Eight,
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "sequence number out of range for modulo 128")]
    fn receive_sequence_beyond_modulus() {
        encode(
            Control::Supervisory {
                kind: SupervisoryKind::ReceiveReady,
                receive_sequence: 128,
                poll_or_final: false,
            },
            Modulo::OneTwentyEight,
        );
    }

    #[test]
    fn unnumbered_table() {
        let kinds = [
            UnnumberedKind::Sabm,
            UnnumberedKind::Sabme,
            UnnumberedKind::Disc,
            UnnumberedKind::Dm,
            UnnumberedKind::Ua,
            UnnumberedKind::Ui,
            UnnumberedKind::Xid,
            UnnumberedKind::Test,
            UnnumberedKind::Frmr,
        ];
        for kind in kinds {
            for poll_or_final in [false, true] {
                let control = Control::Unnumbered {
                    kind,
                    poll_or_final,
                };
                // U frames never grow a second byte
                for modulo in [Modulo::Eight, Modulo::OneTwentyEight] {
                    let bytes = encode(control, modulo);
                    assert_eq!(bytes.len(), 1);
                    assert_eq!(Control::decode(&bytes, modulo), Ok((control, 1)));
                }
            }
        }
    }

    #[test]
    fn invalid_control_fields() {
        assert_eq!(
            Control::decode(&[0xff], Modulo::Eight),
            Err(Error::InvalidControlField { control: 0xff })
        );
        assert_eq!(
            Control::decode(&[0x21, 0x00], Modulo::OneTwentyEight),
            Err(Error::InvalidControlField { control: 0x21 })
        );
        assert_eq!(
            Control::decode(&[0x00], Modulo::OneTwentyEight),
            Err(Error::TruncatedFrame {
                needed: 2,
                actual: 1
            })
        );
        assert_eq!(
            Control::decode(&[], Modulo::Eight),
            Err(Error::TruncatedFrame {
                needed: 1,
                actual: 0
            })
        );
    }
}
