//! AX.25 packets and HDLC framing in Rust.
//!
//! This crate turns strongly typed AX.25 frames into bytes and back, and wraps those
//! bytes in the bit-stuffed, flag-delimited HDLC framing used on the air.
//!
//! Main features:
//! * Encode and decode AX.25 v2.0 and v2.2 frames, including modulo-128 control fields
//! * XID link parameter negotiation
//! * Segmentation and reassembly of oversized payloads
//! * HDLC bit-stuffing with a CRC-16 frame check sequence
//!
//! A typical transmit path is `Ax25Frame::to_bytes()` followed by `hdlc::encode()`.
//! Receiving runs the other way: `hdlc::decode()` (or a `hdlc::Deframer` for a
//! continuous bit stream) followed by `Ax25Frame::from_bytes()`.
//!
//! Nothing here performs I/O. Getting the bytes to and from a radio is up to the caller.

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

extern crate alloc;

/// Single station addresses: callsign, SSID and the flag bits around them.
pub mod address;

/// Classifying and encoding the control field of I, S and U frames.
pub mod control;

/// Errors produced anywhere in this crate.
pub mod error;

/// Encoding and decoding AX.25 frames between raw bytes and strongly typed structures.
pub mod frame;

/// HDLC bit-stuffing, flags and frame check sequence.
pub mod hdlc;

/// The address field: destination, source and repeater path.
pub mod header;

/// Choosing modulo-8 or modulo-128 from link setup exchanges.
pub mod negotiate;

/// Splitting payloads into AX.25 segments and putting them back together.
pub mod segment;

/// Exchange Identification (XID) parameters.
pub mod xid;

pub use address::Address;
pub use control::{FrameType, Modulo};
pub use error::{Error, Result};
pub use frame::{Ax25Frame, DecodeMode, FrameContent, ProtocolIdentifier};
pub use header::{CommandResponse, Header, Path};
