//! Splitting payloads that are larger than N1 into AX.25 segments, and putting them
//! back together.
//!
//! A segmented payload travels in I or UI frames with PID `0x08`. Each info field
//! starts with a segmenter control byte. The first segment announces the total length;
//! later ones carry a 7-bit sequence number with the top bit set while more follow.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::error::{Error, Result};

/// PID value for frames carrying segments.
pub const SEGMENT_PID: u8 = 0x08;

/// Smallest N1 that leaves room for the first segment's length plus one data byte.
pub const MIN_SEGMENT_SIZE: usize = 3;

const FIRST_SEGMENT: u8 = 0x80;
const MORE_FOLLOWS: u8 = 0x80;
const SEQUENCE_MASK: u8 = 0x7f;

/// One piece of a segmented payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segmenter control byte, `0x88` for the first segment and `0x08` otherwise
    pub control: u8,
    /// Length of the whole payload. Only meaningful on the first segment.
    pub total_length: u16,
    pub data: Vec<u8>,
    /// Zero for the first segment, then counting up modulo 128
    pub sequence: u8,
    /// Whether further segments follow this one
    pub more: bool,
}

impl Segment {
    pub fn is_first(&self) -> bool {
        self.control & FIRST_SEGMENT > 0
    }

    pub fn is_last(&self) -> bool {
        !self.more
    }

    /// The info field carrying this segment.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 3);
        out.push(self.control);
        if self.is_first() {
            out.extend_from_slice(&self.total_length.to_be_bytes());
        } else {
            let more = if self.more { MORE_FOLLOWS } else { 0 };
            out.push((self.sequence & SEQUENCE_MASK) | more);
        }
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse the info field of a segment frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Segment> {
        let (&control, rest) = bytes.split_first().ok_or(Error::TruncatedFrame {
            needed: 1,
            actual: 0,
        })?;
        if control & !FIRST_SEGMENT != SEGMENT_PID {
            return Err(Error::InvalidControlField { control });
        }
        if control & FIRST_SEGMENT > 0 {
            let [hi, lo, ref data @ ..] = *rest else {
                return Err(Error::TruncatedFrame {
                    needed: 3,
                    actual: bytes.len(),
                });
            };
            let total_length = u16::from_be_bytes([hi, lo]);
            Ok(Segment {
                control,
                total_length,
                data: data.to_vec(),
                sequence: 0,
                more: data.len() < usize::from(total_length),
            })
        } else {
            let [seq, ref data @ ..] = *rest else {
                return Err(Error::TruncatedFrame {
                    needed: 2,
                    actual: bytes.len(),
                });
            };
            Ok(Segment {
                control,
                total_length: 0,
                data: data.to_vec(),
                sequence: seq & SEQUENCE_MASK,
                more: seq & MORE_FOLLOWS > 0,
            })
        }
    }
}

/// Split `payload` into segments whose info fields, apart from the control byte,
/// fit in `n1` bytes.
///
/// An empty payload still produces a single first segment announcing zero bytes.
pub fn segment(payload: &[u8], n1: usize) -> Result<Vec<Segment>> {
    if n1 < MIN_SEGMENT_SIZE {
        return Err(Error::SegmentSizeTooSmall { n1 });
    }
    let total_length =
        u16::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge { len: payload.len() })?;

    let first_len = payload.len().min(n1 - 2);
    let (first, mut rest) = payload.split_at(first_len);
    let mut segments = Vec::with_capacity(1 + rest.len().div_ceil(n1 - 1));
    segments.push(Segment {
        control: SEGMENT_PID | FIRST_SEGMENT,
        total_length,
        data: first.to_vec(),
        sequence: 0,
        more: !rest.is_empty(),
    });

    let mut sequence: u8 = 0;
    while !rest.is_empty() {
        let (data, remaining) = rest.split_at(rest.len().min(n1 - 1));
        sequence = (sequence + 1) & SEQUENCE_MASK;
        segments.push(Segment {
            control: SEGMENT_PID,
            total_length: 0,
            data: data.to_vec(),
            sequence,
            more: !remaining.is_empty(),
        });
        rest = remaining;
    }
    debug!(
        "split {} bytes into {} segments (n1 {})",
        payload.len(),
        segments.len(),
        n1
    );
    Ok(segments)
}

/// Concatenate the data of `segments` in the order given.
///
/// Ordering is up to the caller. If the first segment announces a total length that
/// doesn't match what was collected, the payload is still returned.
pub fn reassemble(segments: &[Segment]) -> Result<Vec<u8>> {
    let first = segments.first().ok_or(Error::IncompleteReassembly)?;
    let payload: Vec<u8> = segments
        .iter()
        .flat_map(|s| s.data.iter().copied())
        .collect();
    if first.is_first() && payload.len() != usize::from(first.total_length) {
        warn!(
            "reassembled {} bytes but first segment announced {}",
            payload.len(),
            first.total_length
        );
    }
    Ok(payload)
}

/// Collects segments as they arrive off the air and hands back each completed payload.
#[derive(Debug, Default)]
pub struct Reassembler {
    partial: Option<Partial>,
}

#[derive(Debug)]
struct Partial {
    total_length: u16,
    next_sequence: u8,
    payload: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Reassembler {
        Reassembler { partial: None }
    }

    /// Whether a payload is currently partway through reassembly.
    pub fn in_progress(&self) -> bool {
        self.partial.is_some()
    }

    /// Feed the next segment. Returns the payload once its last segment arrives.
    ///
    /// A segment out of sequence throws away the partial payload. A new first segment
    /// replaces whatever was in progress.
    pub fn push(&mut self, segment: Segment) -> Option<Vec<u8>> {
        if segment.is_first() {
            if self.partial.is_some() {
                debug!("new first segment, discarding incomplete payload");
            }
            let mut partial = Partial {
                total_length: segment.total_length,
                next_sequence: 1,
                payload: Vec::with_capacity(usize::from(segment.total_length)),
            };
            partial.payload.extend_from_slice(&segment.data);
            if segment.more {
                self.partial = Some(partial);
                return None;
            }
            self.partial = None;
            return Some(finish(partial));
        }

        let Some(mut partial) = self.partial.take() else {
            debug!("dropping segment {} with no first segment", segment.sequence);
            return None;
        };
        if segment.sequence != partial.next_sequence {
            debug!(
                "expected segment {} but got {}, discarding incomplete payload",
                partial.next_sequence, segment.sequence
            );
            return None;
        }
        partial.payload.extend_from_slice(&segment.data);
        if segment.more {
            partial.next_sequence = (partial.next_sequence + 1) & SEQUENCE_MASK;
            self.partial = Some(partial);
            None
        } else {
            Some(finish(partial))
        }
    }
}

fn finish(partial: Partial) -> Vec<u8> {
    if partial.payload.len() != usize::from(partial.total_length) {
        warn!(
            "reassembled {} bytes but first segment announced {}",
            partial.payload.len(),
            partial.total_length
        );
    }
    partial.payload
}
