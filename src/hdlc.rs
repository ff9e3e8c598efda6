//! HDLC bit framing for AX.25 frames sent over a synchronous bit channel.
//!
//! Every byte of the frame is bit-reversed, because AX.25 sends the least significant
//! bit first, and the CRC-16/X.25 FCS of the reversed bytes is appended big-endian.
//! The result is sent most significant bit first with a zero inserted after every
//! five consecutive ones, between two `0x7E` flags.

use alloc::vec::Vec;

use crc::{Crc, CRC_16_IBM_SDLC};
use log::{debug, trace};

use crate::error::{Error, Result};

/// The flag that opens and closes every frame.
pub const FLAG: u8 = 0x7E;

const FCS_LEN: usize = 2;

const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// CRC-16/X.25 of `bytes`.
pub fn fcs(bytes: &[u8]) -> u16 {
    X25.checksum(bytes)
}

/// Growable buffer of bits, filled most significant bit first.
#[derive(Debug, Default)]
struct BitBuf {
    bytes: Vec<u8>,
    len: usize,
}

impl BitBuf {
    fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    fn push_byte(&mut self, byte: u8) {
        for i in (0..8).rev() {
            self.push(byte >> i & 1 == 1);
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.len = len;
        self.bytes.truncate(len.div_ceil(8));
        let offset = len % 8;
        if offset != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xFF << (8 - offset);
            }
        }
    }

    /// The contents, which must be a whole number of bytes.
    fn into_bytes(self) -> Result<Vec<u8>> {
        if self.len % 8 != 0 {
            return Err(Error::UnalignedFrame { bits: self.len });
        }
        Ok(self.bytes)
    }

    /// The contents with any partial final byte filled out with zeros.
    fn into_padded_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn bit_at(bytes: &[u8], pos: usize) -> bool {
    bytes[pos / 8] & (0x80 >> (pos % 8)) > 0
}

/// Wrap an encoded AX.25 frame for transmission: FCS, bit stuffing and flags.
///
/// The final byte is padded with zero bits after the closing flag.
pub fn encode(frame: &[u8]) -> Vec<u8> {
    let mut body: Vec<u8> = frame.iter().map(|b| b.reverse_bits()).collect();
    let fcs = fcs(&body);
    body.extend_from_slice(&fcs.to_be_bytes());
    frame_bits(&body)
}

/// Stuff `body` and surround it with flags.
fn frame_bits(body: &[u8]) -> Vec<u8> {
    let mut bits = BitBuf::default();
    bits.push_byte(FLAG);
    stuff_into(&mut bits, body);
    bits.push_byte(FLAG);
    bits.into_padded_bytes()
}

fn stuff_into(bits: &mut BitBuf, body: &[u8]) {
    let mut ones = 0;
    for pos in 0..body.len() * 8 {
        let bit = bit_at(body, pos);
        bits.push(bit);
        if !bit {
            ones = 0;
            continue;
        }
        ones += 1;
        if ones == 5 {
            bits.push(false);
            ones = 0;
        }
    }
}

/// Decode the first frame in `stream`, returning the original AX.25 frame bytes.
pub fn decode(stream: &[u8]) -> Result<Vec<u8>> {
    Deframer::new(stream).next().unwrap_or(Err(Error::MissingFlag))
}

enum Scan {
    LookingForFlag { shift: u8 },
    Data,
    SixOnes,
}

/// Iterator over every frame in a received bit stream.
///
/// Frames may share flags or be separated by any number of them. After an abort
/// (seven ones in a row) the deframer hunts for the next flag. An abort with less
/// than a byte of data before it is idle fill (a mark-idle line sends nothing but
/// ones) and is skipped quietly. A bad frame is reported as an error and the frames
/// after it are still returned.
pub struct Deframer<'a> {
    stream: &'a [u8],
    pos: usize,
    state: Scan,
    ones: u8,
    frame: BitBuf,
}

impl<'a> Deframer<'a> {
    pub fn new(stream: &'a [u8]) -> Deframer<'a> {
        Deframer {
            stream,
            pos: 0,
            state: Scan::LookingForFlag { shift: 0xFF },
            ones: 0,
            frame: BitBuf::default(),
        }
    }

    fn next_bit(&mut self) -> Option<bool> {
        if self.pos >= self.stream.len() * 8 {
            return None;
        }
        let bit = bit_at(self.stream, self.pos);
        self.pos += 1;
        Some(bit)
    }

    fn hunt(&mut self) {
        self.state = Scan::LookingForFlag { shift: 0xFF };
        self.frame = BitBuf::default();
        self.ones = 0;
    }
}

impl Iterator for Deframer<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(bit) = self.next_bit() {
            match self.state {
                Scan::LookingForFlag { shift } => {
                    let shift = (shift << 1) | u8::from(bit);
                    self.state = if shift == FLAG {
                        self.frame = BitBuf::default();
                        self.ones = 0;
                        Scan::Data
                    } else {
                        Scan::LookingForFlag { shift }
                    };
                }
                Scan::Data => {
                    if bit {
                        self.ones += 1;
                        if self.ones == 6 {
                            self.state = Scan::SixOnes;
                        } else {
                            self.frame.push(true);
                        }
                    } else {
                        // A zero after five ones was stuffed by the sender
                        if self.ones != 5 {
                            self.frame.push(false);
                        }
                        self.ones = 0;
                    }
                }
                Scan::SixOnes => {
                    self.ones = 0;
                    if bit {
                        // The five ones before this went into the frame
                        let data_bits = self.frame.len().saturating_sub(5);
                        self.hunt();
                        if data_bits < 8 {
                            trace!("idle after {} bits", data_bits);
                            continue;
                        }
                        debug!("abort sequence after {} bits", data_bits);
                        return Some(Err(Error::BitStuffingViolation));
                    }
                    // Closing flag. Its leading zero and five ones went into the frame.
                    self.state = Scan::Data;
                    let mut frame = core::mem::take(&mut self.frame);
                    frame.truncate(frame.len().saturating_sub(6));
                    // Anything shorter is fill between flags
                    if frame.len() >= 8 {
                        return Some(check(frame));
                    }
                    trace!("skipping {} bits between flags", frame.len());
                }
            }
        }
        // Out of input. Less than a byte is padding after the last flag.
        if self.frame.len() >= 8 {
            debug!("stream ended inside a {} bit frame", self.frame.len());
            self.hunt();
            return Some(Err(Error::MissingFlag));
        }
        None
    }
}

/// Verify the FCS of a destuffed frame and restore the original bit order.
fn check(frame: BitBuf) -> Result<Vec<u8>> {
    let body = frame.into_bytes()?;
    if body.len() < FCS_LEN {
        return Err(Error::TruncatedFrame {
            needed: FCS_LEN,
            actual: body.len(),
        });
    }
    let (data, trailer) = body.split_at(body.len() - FCS_LEN);
    let received = u16::from_be_bytes([trailer[0], trailer[1]]);
    let computed = fcs(data);
    if received != computed {
        debug!(
            "FCS mismatch on {} byte frame: received {:#06x}, computed {:#06x}",
            data.len(),
            received,
            computed
        );
        return Err(Error::FcsMismatch { received, computed });
    }
    trace!("received {} byte frame", data.len());
    Ok(data.iter().map(|b| b.reverse_bits()).collect())
}
