use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Length of one encoded address in bytes.
pub const ADDRESS_LEN: usize = 7;

/// Maximum number of characters in a callsign.
pub const CALLSIGN_LEN: usize = 6;

/// Largest valid SSID.
pub const MAX_SSID: u8 = 15;

const CH_BIT: u8 = 0b1000_0000;
const RESERVED2_BIT: u8 = 0b0100_0000;
const RESERVED1_BIT: u8 = 0b0010_0000;
const EXTENSION_BIT: u8 = 0b0000_0001;

/// A single AX.25 station address.
///
/// The callsign and SSID are validated on construction. The remaining bits are plain
/// flags that depend on where the address sits in a frame:
/// * `ch` is the command/response bit for the destination and source, and the
///   has-been-repeated bit for a repeater.
/// * `reserved1` and `reserved2` are conventionally set. A cleared `reserved2` on the
///   source address signals that a modulo-128 link was negotiated.
/// * `extension` marks the last address of the address field. `Header` takes care of
///   it when encoding, so it only matters when handling addresses one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    callsign: String,
    ssid: u8,
    pub ch: bool,
    pub reserved1: bool,
    pub reserved2: bool,
    pub extension: bool,
}

impl Address {
    /// Create an address from a callsign and SSID.
    ///
    /// The callsign is converted to uppercase. Fails if it is empty, longer than six
    /// characters or not alphanumeric, or if the SSID is above 15.
    pub fn new(callsign: &str, ssid: u8) -> Result<Address> {
        let callsign = validate_callsign(callsign)?;
        if ssid > MAX_SSID {
            return Err(Error::InvalidSsid);
        }
        Ok(Address {
            callsign,
            ssid,
            ch: false,
            reserved1: true,
            reserved2: true,
            extension: false,
        })
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Encode into the 7-byte on-air form using the flag bits stored in this address.
    pub fn encode(&self) -> [u8; ADDRESS_LEN] {
        self.encode_with(self.ch, self.extension)
    }

    /// Encode with the `ch` and extension bits supplied by the caller instead of the
    /// stored ones.
    pub(crate) fn encode_with(&self, ch: bool, extension: bool) -> [u8; ADDRESS_LEN] {
        let mut encoded = [b' ' << 1; ADDRESS_LEN];
        // Shift by one bit as required for AX.25 address encoding
        for (slot, b) in encoded.iter_mut().zip(self.callsign.bytes()) {
            *slot = b << 1;
        }
        let mut ssid_byte = (self.ssid & 0x0f) << 1;
        if ch {
            ssid_byte |= CH_BIT;
        }
        if self.reserved2 {
            ssid_byte |= RESERVED2_BIT;
        }
        if self.reserved1 {
            ssid_byte |= RESERVED1_BIT;
        }
        if extension {
            ssid_byte |= EXTENSION_BIT;
        }
        encoded[ADDRESS_LEN - 1] = ssid_byte;
        encoded
    }

    /// Decode the first 7 bytes of `bytes`. Trailing spaces are removed from the callsign.
    pub fn decode(bytes: &[u8]) -> Result<Address> {
        if bytes.len() < ADDRESS_LEN {
            return Err(Error::TruncatedAddressField);
        }
        let mut callsign: String = bytes[..CALLSIGN_LEN]
            .iter()
            .map(|&c| char::from(c >> 1))
            .collect();
        let trimmed = callsign.trim_end_matches(' ').len();
        callsign.truncate(trimmed);

        let ssid_byte = bytes[CALLSIGN_LEN];
        Ok(Address {
            callsign,
            ssid: (ssid_byte >> 1) & 0x0f,
            ch: ssid_byte & CH_BIT > 0,
            reserved1: ssid_byte & RESERVED1_BIT > 0,
            reserved2: ssid_byte & RESERVED2_BIT > 0,
            extension: ssid_byte & EXTENSION_BIT > 0,
        })
    }
}

fn validate_callsign(callsign: &str) -> Result<String> {
    let len = callsign.chars().count();
    if len == 0 || len > CALLSIGN_LEN {
        return Err(Error::InvalidCallsignLength { len });
    }
    if let Some(ch) = callsign.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidCallsignCharacter { ch });
    }
    Ok(callsign.to_ascii_uppercase())
}

impl Default for Address {
    fn default() -> Address {
        Address {
            callsign: String::from("NOCALL"),
            ssid: 0,
            ch: false,
            reserved1: true,
            reserved2: true,
            extension: false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.callsign)?;
        if self.ssid != 0 {
            write!(f, "-{}", self.ssid)?;
        }
        if self.ch {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Parses `CALL`, `CALL-SSID`, `CALL*` or `CALL-SSID*`. A trailing `*` sets `ch`.
impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::NullInput);
        }
        let (body, ch) = match s.find('*') {
            Some(idx) if idx + 1 == s.len() => (&s[..idx], true),
            Some(_) => return Err(Error::MisplacedFlag),
            None => (s, false),
        };
        let (callsign, ssid) = match body.split_once('-') {
            Some((callsign, ssid)) => {
                let ssid = ssid.parse::<u8>().map_err(|_| Error::InvalidSsid)?;
                (callsign, ssid)
            }
            None => (body, 0),
        };
        let mut address = Address::new(callsign, ssid)?;
        address.ch = ch;
        Ok(address)
    }
}
