/// Everything that can go wrong while encoding or decoding.
///
/// Decoders report malformed input with one of these rather than panicking. None of
/// them are retried internally; what to do next is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A callsign was empty or longer than six characters.
    #[error("callsign must be 1-6 letters/numbers, got {len} characters")]
    InvalidCallsignLength { len: usize },

    /// A callsign contained something other than letters and digits.
    #[error("callsign must be alphanumeric only, found {ch:?}")]
    InvalidCallsignCharacter { ch: char },

    /// The SSID was not a number from 0 to 15.
    #[error("SSID must be a number from 0 to 15")]
    InvalidSsid,

    /// A `*` appeared somewhere other than the end of an address.
    #[error("'*' may only appear at the end of an address")]
    MisplacedFlag,

    /// No address text was supplied at all.
    #[error("no address supplied")]
    NullInput,

    /// The input ended before an address with the extension bit set.
    #[error("address field ends without a final address")]
    TruncatedAddressField,

    /// The address field holds more than eight repeaters.
    #[error("address field holds more than 8 repeaters")]
    TooManyRepeaters,

    /// The control field does not describe any known frame.
    #[error("unrecognised control field {control:#04x}")]
    InvalidControlField { control: u8 },

    /// The frame is shorter than its type requires.
    ///
    /// Both counts are in bytes from the start of the input handed to the decoder.
    /// For [`Ax25Frame::from_bytes`](crate::Ax25Frame::from_bytes) that is the whole
    /// frame, address field included.
    #[error("frame too short: needed {needed} bytes but only {actual} present")]
    TruncatedFrame { needed: usize, actual: usize },

    /// An XID parameter list disagrees with its declared group length.
    #[error("XID parameter list does not match its group length")]
    TruncatedParameterList,

    /// The XID parameters do not fit the 16-bit group length.
    #[error("XID parameters total {len} bytes, more than 65535")]
    GroupTooLong { len: usize },

    /// An XID parameter value does not fit its one-byte length field.
    #[error("XID parameter value of {len} bytes exceeds 255")]
    ParameterTooLong { len: usize },

    /// Six or more consecutive 1-bits appeared inside a frame.
    #[error("bit stuffing violation (abort sequence) inside frame")]
    BitStuffingViolation,

    /// The bit stream lacks an opening or closing HDLC flag.
    #[error("no HDLC flag delimiting the frame")]
    MissingFlag,

    /// The destuffed frame body is not a whole number of octets.
    #[error("frame body of {bits} bits is not a whole number of octets")]
    UnalignedFrame { bits: usize },

    /// The frame check sequence did not match the frame contents.
    #[error("FCS mismatch: received {received:#06x}, computed {computed:#06x}")]
    FcsMismatch { received: u16, computed: u16 },

    /// Reassembly was attempted with no segments.
    #[error("no segments to reassemble")]
    IncompleteReassembly,

    /// The requested segment size cannot carry any data.
    #[error("segment size {n1} is too small, minimum is 3")]
    SegmentSizeTooSmall { n1: usize },

    /// The payload is too large to describe in a 16-bit segment length.
    #[error("payload of {len} bytes is too large to segment")]
    PayloadTooLarge { len: usize },
}

impl Error {
    /// Moves the counts of a `TruncatedFrame` from an inner field to the enclosing
    /// buffer, which starts `offset` bytes earlier.
    pub(crate) fn offset_by(self, offset: usize) -> Error {
        match self {
            Error::TruncatedFrame { needed, actual } => Error::TruncatedFrame {
                needed: needed + offset,
                actual: actual + offset,
            },
            other => other,
        }
    }
}

/// Result type used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
