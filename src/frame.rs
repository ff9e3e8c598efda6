use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, trace};

use crate::control::{Control, FrameType, Modulo, SupervisoryKind, UnnumberedKind};
use crate::error::{Error, Result};
use crate::header::{CommandResponse, Header};
use crate::xid::Xid;

// Mostly from AX.25 2.2 which has far more examples than 2.0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolIdentifier {
    /// AX.25 layer 3 implemented; the exact byte is kept.
    Layer3Impl(u8),
    X25Plp,
    CompressedTcpIp,
    UncompressedTcpIp,
    SegmentationFragment,
    TexnetDatagram,
    LinkQuality,
    Appletalk,
    AppletalkArp,
    ArpaIp,
    ArpaAddress,
    Flexnet,
    NetRom,
    None,
    Escape,
    Unknown(u8),
}

impl From<u8> for ProtocolIdentifier {
    fn from(byte: u8) -> ProtocolIdentifier {
        match byte {
            pid if pid & 0b0011_0000 == 0b0001_0000 || pid & 0b0011_0000 == 0b0010_0000 => {
                ProtocolIdentifier::Layer3Impl(pid)
            }
            0x01 => ProtocolIdentifier::X25Plp,
            0x06 => ProtocolIdentifier::CompressedTcpIp,
            0x07 => ProtocolIdentifier::UncompressedTcpIp,
            0x08 => ProtocolIdentifier::SegmentationFragment,
            0xC3 => ProtocolIdentifier::TexnetDatagram,
            0xC4 => ProtocolIdentifier::LinkQuality,
            0xCA => ProtocolIdentifier::Appletalk,
            0xCB => ProtocolIdentifier::AppletalkArp,
            0xCC => ProtocolIdentifier::ArpaIp,
            0xCD => ProtocolIdentifier::ArpaAddress,
            0xCE => ProtocolIdentifier::Flexnet,
            0xCF => ProtocolIdentifier::NetRom,
            0xF0 => ProtocolIdentifier::None,
            0xFF => ProtocolIdentifier::Escape,
            pid => ProtocolIdentifier::Unknown(pid),
        }
    }
}

impl From<ProtocolIdentifier> for u8 {
    fn from(pid: ProtocolIdentifier) -> u8 {
        match pid {
            ProtocolIdentifier::Layer3Impl(pid) => pid,
            ProtocolIdentifier::X25Plp => 0x01,
            ProtocolIdentifier::CompressedTcpIp => 0x06,
            ProtocolIdentifier::UncompressedTcpIp => 0x07,
            ProtocolIdentifier::SegmentationFragment => 0x08,
            ProtocolIdentifier::TexnetDatagram => 0xC3,
            ProtocolIdentifier::LinkQuality => 0xC4,
            ProtocolIdentifier::Appletalk => 0xCA,
            ProtocolIdentifier::AppletalkArp => 0xCB,
            ProtocolIdentifier::ArpaIp => 0xCC,
            ProtocolIdentifier::ArpaAddress => 0xCD,
            ProtocolIdentifier::Flexnet => 0xCE,
            ProtocolIdentifier::NetRom => 0xCF,
            ProtocolIdentifier::None => 0xF0,
            ProtocolIdentifier::Escape => 0xFF,
            ProtocolIdentifier::Unknown(pid) => pid,
        }
    }
}

/// How to interpret the control field when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Don't interpret the control field at all; produce `FrameContent::Raw`.
    Raw,
    /// One-byte control fields.
    Modulo8,
    /// Two-byte control fields for I and S frames.
    Modulo128,
    /// Use two-byte control fields for I and S frames when the source address's second
    /// reserved bit is clear, otherwise one byte.
    #[default]
    Auto,
}

/// Contents of an FRMR frame: the rejected control field, the sender's state variables
/// and the reason for rejection. Flag names follow AX.25 2.2.
///
/// The state variables must be below the modulus. Debug builds panic otherwise;
/// release builds mask them to the width of their field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReject {
    /// Width of `rejected_control`, and of the state variables.
    pub modulo: Modulo,
    /// A raw copy of the control field in the frame that was rejected. For modulo-128
    /// the first transmitted byte is in the high half.
    pub rejected_control: u16,
    /// V(R) of the station sending the FRMR
    pub receive_state: u8,
    /// V(S) of the station sending the FRMR
    pub send_state: u8,
    /// Whether the rejected frame was a command or a response
    pub command_response: CommandResponse,
    /// The received control field was invalid or not implemented.
    pub w: bool,
    /// A U or S frame was received that contained an information field.
    pub x: bool,
    /// The information field of a received frame exceeded the maximum allowable length.
    pub y: bool,
    /// The attached control field contained an invalid Receive Sequence Number
    pub z: bool,
}

impl FrameReject {
    fn reasons(&self) -> u8 {
        let mut reasons: u8 = 0;
        reasons |= if self.z { 1 << 3 } else { 0 };
        reasons |= if self.y { 1 << 2 } else { 0 };
        reasons |= if self.x { 1 << 1 } else { 0 };
        reasons |= if self.w { 1 << 0 } else { 0 };
        reasons
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        debug_assert!(
            self.receive_state.max(self.send_state) < self.modulo.modulus(),
            "state variable out of range for modulo {}",
            self.modulo.modulus()
        );
        let mask = self.modulo.mask();
        let response = self.command_response == CommandResponse::Response;
        match self.modulo {
            Modulo::Eight => {
                out.push(self.rejected_control as u8);
                let mut frmr1: u8 = (self.receive_state & mask) << 5;
                frmr1 |= if response { 1 << 4 } else { 0 };
                out.push(frmr1);
                out.push(((self.send_state & mask) << 5) | self.reasons());
            }
            Modulo::OneTwentyEight => {
                out.extend_from_slice(&self.rejected_control.to_be_bytes());
                out.push(((self.receive_state & mask) << 1) | u8::from(response));
                out.push((self.send_state & mask) << 1);
                out.push(self.reasons());
            }
        }
    }

    fn decode(info: &[u8]) -> Result<FrameReject> {
        let (modulo, rejected_control, receive_state, response, send_state, reasons) =
            match *info {
                [control, frmr1, frmr2] => (
                    Modulo::Eight,
                    u16::from(control),
                    frmr1 >> 5,
                    frmr1 & (1 << 4) > 0,
                    frmr2 >> 5,
                    frmr2,
                ),
                [c1, c2, frmr1, frmr2, frmr3] => (
                    Modulo::OneTwentyEight,
                    u16::from_be_bytes([c1, c2]),
                    frmr1 >> 1,
                    frmr1 & 1 > 0,
                    frmr2 >> 1,
                    frmr3,
                ),
                _ => {
                    return Err(Error::TruncatedFrame {
                        needed: if info.len() < 3 { 3 } else { 5 },
                        actual: info.len(),
                    })
                }
            };
        Ok(FrameReject {
            modulo,
            rejected_control,
            receive_state,
            send_state,
            command_response: if response {
                CommandResponse::Response
            } else {
                CommandResponse::Command
            },
            w: reasons & 0b0001 > 0,
            x: reasons & 0b0010 > 0,
            y: reasons & 0b0100 > 0,
            z: reasons & 0b1000 > 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameContent {
    /// Uninterpreted control byte and everything after it
    Raw { control: u8, payload: Vec<u8> },

    /// Information (I) frame
    Information {
        modulo: Modulo,
        pid: ProtocolIdentifier,
        info: Vec<u8>,
        receive_sequence: u8,
        send_sequence: u8,
        poll: bool,
    },

    /// Supervisory (S) frame: RR, RNR, REJ or SREJ
    Supervisory {
        modulo: Modulo,
        kind: SupervisoryKind,
        receive_sequence: u8,
        poll_or_final: bool,
    },

    /// SABM Unnumbered (U) frame
    SetAsynchronousBalancedMode { poll: bool },
    /// SABME Unnumbered (U) frame
    SetAsynchronousBalancedModeExtended { poll: bool },
    /// DISC Unnumbered (U) frame
    Disconnect { poll: bool },
    /// DM Unnumbered (U) frame
    DisconnectedMode {
        final_bit: bool, // 'final' is a rust keyword
    },
    /// UA Unnumbered (U) frame
    UnnumberedAcknowledge { final_bit: bool },
    /// FRMR Unnumbered (U) frame
    FrameReject {
        final_bit: bool,
        reject: FrameReject,
    },
    /// UI Unnumbered Information frame
    UnnumberedInformation {
        pid: ProtocolIdentifier,
        info: Vec<u8>,
        poll_or_final: bool,
    },
    /// XID Unnumbered (U) frame
    ExchangeIdentification { poll_or_final: bool, xid: Xid },
    /// TEST Unnumbered (U) frame
    Test { poll_or_final: bool, info: Vec<u8> },
}

impl FrameContent {
    /// The control field this content encodes to. `None` for raw content.
    pub fn control(&self) -> Option<Control> {
        let unnumbered = |kind, poll_or_final| Control::Unnumbered {
            kind,
            poll_or_final,
        };
        let control = match *self {
            FrameContent::Raw { .. } => return None,
            FrameContent::Information {
                receive_sequence,
                send_sequence,
                poll,
                ..
            } => Control::Information {
                send_sequence,
                receive_sequence,
                poll,
            },
            FrameContent::Supervisory {
                kind,
                receive_sequence,
                poll_or_final,
                ..
            } => Control::Supervisory {
                kind,
                receive_sequence,
                poll_or_final,
            },
            FrameContent::SetAsynchronousBalancedMode { poll } => {
                unnumbered(UnnumberedKind::Sabm, poll)
            }
            FrameContent::SetAsynchronousBalancedModeExtended { poll } => {
                unnumbered(UnnumberedKind::Sabme, poll)
            }
            FrameContent::Disconnect { poll } => unnumbered(UnnumberedKind::Disc, poll),
            FrameContent::DisconnectedMode { final_bit } => {
                unnumbered(UnnumberedKind::Dm, final_bit)
            }
            FrameContent::UnnumberedAcknowledge { final_bit } => {
                unnumbered(UnnumberedKind::Ua, final_bit)
            }
            FrameContent::FrameReject { final_bit, .. } => {
                unnumbered(UnnumberedKind::Frmr, final_bit)
            }
            FrameContent::UnnumberedInformation { poll_or_final, .. } => {
                unnumbered(UnnumberedKind::Ui, poll_or_final)
            }
            FrameContent::ExchangeIdentification { poll_or_final, .. } => {
                unnumbered(UnnumberedKind::Xid, poll_or_final)
            }
            FrameContent::Test { poll_or_final, .. } => {
                unnumbered(UnnumberedKind::Test, poll_or_final)
            }
        };
        Some(control)
    }

    pub fn frame_type(&self) -> FrameType {
        match (self, self.control()) {
            (FrameContent::Raw { control, .. }, _) => FrameType::of(*control),
            (_, Some(control)) => control.frame_type(),
            (_, None) => FrameType::Unnumbered,
        }
    }

    /// Modulo of I and S content. U frames work the same either way.
    pub fn modulo(&self) -> Option<Modulo> {
        match self {
            FrameContent::Information { modulo, .. } | FrameContent::Supervisory { modulo, .. } => {
                Some(*modulo)
            }
            _ => None,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        if let FrameContent::Raw { control, payload } = self {
            out.push(*control);
            out.extend_from_slice(payload);
            return;
        }
        if let Some(control) = self.control() {
            control.encode_into(self.modulo().unwrap_or(Modulo::Eight), out);
        }
        match self {
            FrameContent::Information { pid, info, .. }
            | FrameContent::UnnumberedInformation { pid, info, .. } => {
                out.push(u8::from(*pid));
                out.extend_from_slice(info);
            }
            FrameContent::FrameReject { reject, .. } => reject.encode_into(out),
            FrameContent::ExchangeIdentification { xid, .. } => xid.encode_into(out),
            FrameContent::Test { info, .. } => out.extend_from_slice(info),
            _ => {}
        }
    }

    /// Parse the content of the frame starting from the control field. Truncation is
    /// reported relative to the control field.
    fn decode(bytes: &[u8], modulo: Modulo) -> Result<FrameContent> {
        let (control, used) = Control::decode(bytes, modulo)?;
        let rest = &bytes[used..];
        let after_control = |e: Error| e.offset_by(used);
        let content = match control {
            Control::Information {
                send_sequence,
                receive_sequence,
                poll,
            } => {
                let (pid, info) = split_pid(rest).map_err(after_control)?;
                FrameContent::Information {
                    modulo,
                    pid,
                    info,
                    receive_sequence,
                    send_sequence,
                    poll,
                }
            }
            Control::Supervisory {
                kind,
                receive_sequence,
                poll_or_final,
            } => {
                ignore_trailing(rest);
                FrameContent::Supervisory {
                    modulo,
                    kind,
                    receive_sequence,
                    poll_or_final,
                }
            }
            Control::Unnumbered {
                kind,
                poll_or_final,
            } => decode_unnumbered(kind, poll_or_final, rest).map_err(after_control)?,
        };
        Ok(content)
    }
}

fn decode_unnumbered(kind: UnnumberedKind, pf: bool, rest: &[u8]) -> Result<FrameContent> {
    let content = match kind {
        UnnumberedKind::Ui => {
            let (pid, info) = split_pid(rest)?;
            FrameContent::UnnumberedInformation {
                pid,
                info,
                poll_or_final: pf,
            }
        }
        UnnumberedKind::Frmr => FrameContent::FrameReject {
            final_bit: pf,
            reject: FrameReject::decode(rest)?,
        },
        UnnumberedKind::Xid => FrameContent::ExchangeIdentification {
            poll_or_final: pf,
            xid: Xid::decode(rest)?,
        },
        UnnumberedKind::Test => FrameContent::Test {
            poll_or_final: pf,
            info: rest.to_vec(),
        },
        UnnumberedKind::Sabm => {
            ignore_trailing(rest);
            FrameContent::SetAsynchronousBalancedMode { poll: pf }
        }
        UnnumberedKind::Sabme => {
            ignore_trailing(rest);
            FrameContent::SetAsynchronousBalancedModeExtended { poll: pf }
        }
        UnnumberedKind::Disc => {
            ignore_trailing(rest);
            FrameContent::Disconnect { poll: pf }
        }
        UnnumberedKind::Dm => {
            ignore_trailing(rest);
            FrameContent::DisconnectedMode { final_bit: pf }
        }
        UnnumberedKind::Ua => {
            ignore_trailing(rest);
            FrameContent::UnnumberedAcknowledge { final_bit: pf }
        }
    };
    Ok(content)
}

fn split_pid(rest: &[u8]) -> Result<(ProtocolIdentifier, Vec<u8>)> {
    match rest.split_first() {
        Some((pid, info)) => Ok((ProtocolIdentifier::from(*pid), info.to_vec())),
        None => Err(Error::TruncatedFrame {
            needed: 1,
            actual: 0,
        }),
    }
}

fn ignore_trailing(rest: &[u8]) {
    if !rest.is_empty() {
        debug!("Ignoring {} bytes after a frame with no information field", rest.len());
    }
}

/// A complete AX.25 frame, without HDLC flags or FCS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Frame {
    pub header: Header,
    pub content: FrameContent,
}

impl Ax25Frame {
    pub fn new(header: Header, content: FrameContent) -> Ax25Frame {
        Ax25Frame { header, content }
    }

    /// The information field, for frame types that have one.
    pub fn info(&self) -> Option<&[u8]> {
        match self.content {
            FrameContent::Information { ref info, .. }
            | FrameContent::UnnumberedInformation { ref info, .. }
            | FrameContent::Test { ref info, .. } => Some(info.as_slice()),
            FrameContent::Raw { ref payload, .. } => Some(payload.as_slice()),
            _ => None,
        }
    }

    /// Returns a UTF-8 string that is a "best effort" at displaying the information
    /// content of this frame. Returns None if there is no information field present.
    /// Most applications will need to work with the Vec<u8> info directly.
    pub fn info_string_lossy(&self) -> Option<String> {
        self.info()
            .map(|info| String::from_utf8_lossy(info).into_owned())
    }

    /// Decode a frame. `mode` selects how the control field is interpreted.
    ///
    /// A [`Error::TruncatedFrame`] counts bytes from the start of the frame.
    pub fn from_bytes(bytes: &[u8], mode: DecodeMode) -> Result<Ax25Frame> {
        let (header, used) = Header::decode(bytes)?;
        let body = &bytes[used..];
        if body.is_empty() {
            return Err(Error::TruncatedFrame {
                needed: used + 1,
                actual: used,
            });
        }

        let modulo = match mode {
            DecodeMode::Raw => {
                let content = FrameContent::Raw {
                    control: body[0],
                    payload: body[1..].to_vec(),
                };
                return Ok(Ax25Frame { header, content });
            }
            DecodeMode::Modulo8 => Modulo::Eight,
            DecodeMode::Modulo128 => Modulo::OneTwentyEight,
            DecodeMode::Auto => {
                let numbered = FrameType::of(body[0]) != FrameType::Unnumbered;
                if numbered && body.len() >= 2 && !header.source.reserved2 {
                    trace!("Source {} signals modulo-128, using 16-bit control", header.source);
                    Modulo::OneTwentyEight
                } else {
                    Modulo::Eight
                }
            }
        };

        let content = FrameContent::decode(body, modulo).map_err(|e| e.offset_by(used))?;
        Ok(Ax25Frame { header, content })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.header.encoded_len() + 2);
        self.header.encode_into(&mut frame);
        self.content.encode_into(&mut frame);
        frame
    }
}

impl fmt::Display for Ax25Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info_display = match self.info_string_lossy() {
            Some(info) => info,
            None => String::from("-"),
        };
        write!(f, "{}:{}", self.header, info_display)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::Path;
    use crate::xid::{XidParameter, PI_WINDOW_SIZE_RX};

    fn command_header() -> Header {
        Header::command(
            "ABCDEF-7".parse().unwrap(),
            "GHIJKL-1*".parse().unwrap(),
            Path::new(),
        )
    }

    fn round_trip(frame: &Ax25Frame, mode: DecodeMode) {
        let bytes = frame.to_bytes();
        assert_eq!(&Ax25Frame::from_bytes(&bytes, mode).unwrap(), frame);
    }

    #[test]
    fn pid_test() {
        assert_eq!(ProtocolIdentifier::from(0x01), ProtocolIdentifier::X25Plp);
        assert_eq!(ProtocolIdentifier::from(0xCA), ProtocolIdentifier::Appletalk);
        assert_eq!(ProtocolIdentifier::from(0xFF), ProtocolIdentifier::Escape);
        assert_eq!(
            ProtocolIdentifier::from(0x45),
            ProtocolIdentifier::Unknown(0x45)
        );
        assert_eq!(
            ProtocolIdentifier::from(0x10),
            ProtocolIdentifier::Layer3Impl(0x10)
        );
        assert_eq!(
            ProtocolIdentifier::from(0xA5),
            ProtocolIdentifier::Layer3Impl(0xA5)
        );
        for byte in 0..=255u8 {
            assert_eq!(u8::from(ProtocolIdentifier::from(byte)), byte);
        }
    }

    #[test]
    fn ui_frame_bytes() {
        let frame = Ax25Frame::new(
            command_header(),
            FrameContent::UnnumberedInformation {
                pid: ProtocolIdentifier::None,
                info: b"TEST".to_vec(),
                poll_or_final: false,
            },
        );
        assert_eq!(
            frame.to_bytes(),
            vec![
                0x82, 0x84, 0x86, 0x88, 0x8A, 0x8C, 0xEE, 0x8E, 0x90, 0x92, 0x94, 0x96, 0x98,
                0x63, 0x03, 0xF0, 0x54, 0x45, 0x53, 0x54
            ]
        );
        round_trip(&frame, DecodeMode::Modulo8);
        assert_eq!(frame.info_string_lossy().as_deref(), Some("TEST"));
        assert_eq!(frame.to_string(), "GHIJKL-1>ABCDEF-7:TEST");
    }

    #[test]
    fn extended_information_frame() {
        let frame = Ax25Frame::new(
            command_header(),
            FrameContent::Information {
                modulo: Modulo::OneTwentyEight,
                pid: ProtocolIdentifier::None,
                info: b"hello".to_vec(),
                receive_sequence: 3,
                send_sequence: 5,
                poll: true,
            },
        );
        let bytes = frame.to_bytes();
        assert_eq!(&bytes[14..17], &[0x0A, 0x07, 0xF0]);
        round_trip(&frame, DecodeMode::Modulo128);
    }

    #[test]
    fn invalid_control_byte() {
        let mut bytes = command_header().encode();
        bytes.push(0xFF);
        for mode in [DecodeMode::Modulo8, DecodeMode::Modulo128, DecodeMode::Auto] {
            assert_eq!(
                Ax25Frame::from_bytes(&bytes, mode),
                Err(Error::InvalidControlField { control: 0xFF })
            );
        }
        // Raw mode doesn't look at it
        let frame = Ax25Frame::from_bytes(&bytes, DecodeMode::Raw).unwrap();
        assert_eq!(
            frame.content,
            FrameContent::Raw {
                control: 0xFF,
                payload: vec![]
            }
        );
    }

    #[test]
    fn raw_mode() {
        let frame = Ax25Frame::new(
            command_header(),
            FrameContent::Raw {
                control: 0x03,
                payload: vec![0xF0, 1, 2, 3],
            },
        );
        round_trip(&frame, DecodeMode::Raw);
        assert_eq!(frame.content.frame_type(), FrameType::Unnumbered);
        // Same bytes as a UI frame
        let ui = Ax25Frame::from_bytes(&frame.to_bytes(), DecodeMode::Modulo8).unwrap();
        assert_eq!(ui.info(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn missing_control_and_pid() {
        let header = command_header().encode();
        assert_eq!(
            Ax25Frame::from_bytes(&header, DecodeMode::Modulo8),
            Err(Error::TruncatedFrame {
                needed: 15,
                actual: 14
            })
        );
        let mut ui = header.clone();
        ui.push(0x03);
        assert_eq!(
            Ax25Frame::from_bytes(&ui, DecodeMode::Modulo8),
            Err(Error::TruncatedFrame {
                needed: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn truncation_counts_from_frame_start() {
        let header = command_header().encode();

        // Extended I frame cut off after its first control byte
        let mut i_frame = header.clone();
        i_frame.push(0x04);
        assert_eq!(
            Ax25Frame::from_bytes(&i_frame, DecodeMode::Modulo128),
            Err(Error::TruncatedFrame {
                needed: 16,
                actual: 15
            })
        );

        // Extended I frame with both control bytes but no PID
        i_frame.push(0x00);
        assert_eq!(
            Ax25Frame::from_bytes(&i_frame, DecodeMode::Modulo128),
            Err(Error::TruncatedFrame {
                needed: 17,
                actual: 16
            })
        );

        // FRMR with one byte of its three byte information field
        let mut frmr = header;
        frmr.extend_from_slice(&[0x87, 0x3F]);
        assert_eq!(
            Ax25Frame::from_bytes(&frmr, DecodeMode::Modulo8),
            Err(Error::TruncatedFrame {
                needed: 18,
                actual: 16
            })
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "state variable out of range for modulo 8")]
    fn frame_reject_state_beyond_modulus() {
        let reject = FrameReject {
            modulo: Modulo::Eight,
            rejected_control: 0x3F,
            receive_state: 8,
            send_state: 0,
            command_response: CommandResponse::Command,
            w: true,
            x: false,
            y: false,
            z: false,
        };
        reject.encode_into(&mut Vec::new());
    }

    #[test]
    fn every_frame_type_round_trips() {
        let mut contents = vec![
            FrameContent::SetAsynchronousBalancedMode { poll: true },
            FrameContent::SetAsynchronousBalancedModeExtended { poll: true },
            FrameContent::Disconnect { poll: false },
            FrameContent::DisconnectedMode { final_bit: true },
            FrameContent::UnnumberedAcknowledge { final_bit: false },
            FrameContent::Test {
                poll_or_final: true,
                info: vec![],
            },
            FrameContent::Test {
                poll_or_final: false,
                info: vec![0x00, 0x7E, 0xFF],
            },
            FrameContent::ExchangeIdentification {
                poll_or_final: true,
                xid: Xid::new(vec![XidParameter::raw(PI_WINDOW_SIZE_RX, vec![4]).unwrap()])
                    .unwrap(),
            },
            FrameContent::UnnumberedInformation {
                pid: ProtocolIdentifier::Layer3Impl(0x20),
                info: vec![],
                poll_or_final: true,
            },
        ];
        for modulo in [Modulo::Eight, Modulo::OneTwentyEight] {
            let top = modulo.mask();
            for kind in [
                SupervisoryKind::ReceiveReady,
                SupervisoryKind::ReceiveNotReady,
                SupervisoryKind::Reject,
                SupervisoryKind::SelectiveReject,
            ] {
                contents.push(FrameContent::Supervisory {
                    modulo,
                    kind,
                    receive_sequence: top,
                    poll_or_final: true,
                });
            }
            for ns in [top, 0] {
                contents.push(FrameContent::Information {
                    modulo,
                    pid: ProtocolIdentifier::None,
                    info: b"data".to_vec(),
                    receive_sequence: 0,
                    send_sequence: ns,
                    poll: false,
                });
            }
            contents.push(FrameContent::FrameReject {
                final_bit: true,
                reject: FrameReject {
                    modulo,
                    rejected_control: 0x0102 & if modulo == Modulo::Eight { 0xFF } else { 0xFFFF },
                    receive_state: top,
                    send_state: 1,
                    command_response: CommandResponse::Response,
                    w: true,
                    x: false,
                    y: true,
                    z: false,
                },
            });
        }

        for content in contents {
            let mode = match content.modulo() {
                Some(Modulo::OneTwentyEight) => DecodeMode::Modulo128,
                _ => DecodeMode::Modulo8,
            };
            let frame = Ax25Frame::new(command_header(), content);
            round_trip(&frame, mode);
        }
    }

    #[test]
    fn frmr_layout() {
        let reject = FrameReject {
            modulo: Modulo::Eight,
            rejected_control: 0x3F,
            receive_state: 5,
            send_state: 2,
            command_response: CommandResponse::Response,
            w: true,
            x: false,
            y: false,
            z: true,
        };
        let mut out = Vec::new();
        reject.encode_into(&mut out);
        assert_eq!(out, vec![0x3F, 0b1011_0000, 0b0100_1001]);

        assert_eq!(
            FrameReject::decode(&[0x3F, 0x00]),
            Err(Error::TruncatedFrame {
                needed: 3,
                actual: 2
            })
        );
        assert_eq!(
            FrameReject::decode(&[0; 4]),
            Err(Error::TruncatedFrame {
                needed: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn auto_mode_follows_source_reserved_bit() {
        let mut header = command_header();
        let content = FrameContent::Information {
            modulo: Modulo::OneTwentyEight,
            pid: ProtocolIdentifier::None,
            info: b"x".to_vec(),
            receive_sequence: 100,
            send_sequence: 127,
            poll: false,
        };
        header.set_modulo_hint(Modulo::OneTwentyEight);
        let frame = Ax25Frame::new(header.clone(), content);
        round_trip(&frame, DecodeMode::Auto);

        header.set_modulo_hint(Modulo::Eight);
        let frame = Ax25Frame::new(
            header,
            FrameContent::Supervisory {
                modulo: Modulo::Eight,
                kind: SupervisoryKind::ReceiveReady,
                receive_sequence: 7,
                poll_or_final: false,
            },
        );
        round_trip(&frame, DecodeMode::Auto);
    }

    #[test]
    fn auto_mode_keeps_unnumbered_frames_narrow() {
        let mut header = command_header();
        header.set_modulo_hint(Modulo::OneTwentyEight);
        let frame = Ax25Frame::new(
            header,
            FrameContent::SetAsynchronousBalancedModeExtended { poll: true },
        );
        round_trip(&frame, DecodeMode::Auto);
    }
}
