use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::address::{Address, ADDRESS_LEN};
use crate::control::Modulo;
use crate::error::{Error, Result};

/// Maximum number of repeaters in an address field.
pub const MAX_REPEATERS: usize = 8;

/// The role of a frame under AX.25 v2.0, as signalled by the destination and source
/// `ch` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResponse {
    Command,
    Response,
}

/// The repeater chain, in the order the frame is to be (or has been) digipeated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    repeaters: heapless::Vec<Address, MAX_REPEATERS>,
}

impl Path {
    pub fn new() -> Path {
        Path::default()
    }

    /// Build a path from a sequence of addresses, failing if there are more than eight.
    pub fn from_addresses<I: IntoIterator<Item = Address>>(addresses: I) -> Result<Path> {
        let mut path = Path::new();
        for address in addresses {
            path.push(address)?;
        }
        Ok(path)
    }

    /// Append a repeater to the end of the path.
    pub fn push(&mut self, repeater: Address) -> Result<()> {
        self.repeaters
            .push(repeater)
            .map_err(|_| Error::TooManyRepeaters)
    }

    pub fn len(&self) -> usize {
        self.repeaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repeaters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Address> {
        self.repeaters.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Address> {
        self.repeaters.iter()
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.repeaters
    }

    fn as_mut_slice(&mut self) -> &mut [Address] {
        &mut self.repeaters
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Address;
    type IntoIter = core::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, repeater) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", repeater)?;
        }
        Ok(())
    }
}

/// Parses a comma-separated list such as `WIDE1-1*,WIDE2-1`. An empty string is an
/// empty path.
impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Path::new());
        }
        let mut path = Path::new();
        for part in s.split(',') {
            path.push(part.trim().parse()?)?;
        }
        Ok(path)
    }
}

/// The address field of a frame.
///
/// `cr` and `src_cr` are the `ch` bits of the destination and source. Every constructor
/// keeps the two in agreement, and encoding always writes `cr`/`src_cr` into the
/// destination and source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub destination: Address,
    pub source: Address,
    pub path: Path,
    pub cr: bool,
    pub src_cr: bool,
}

impl Header {
    /// Build a header taking the role flags from the `ch` bits already present on the
    /// destination and source.
    pub fn new(destination: Address, source: Address, path: Path) -> Header {
        let cr = destination.ch;
        let src_cr = source.ch;
        Header {
            destination,
            source,
            path,
            cr,
            src_cr,
        }
        .normalised()
    }

    /// Build a header for an AX.25 v2.0 command frame.
    pub fn command(destination: Address, source: Address, path: Path) -> Header {
        Header::with_roles(destination, source, path, true, false)
    }

    /// Build a header for an AX.25 v2.0 response frame.
    pub fn response(destination: Address, source: Address, path: Path) -> Header {
        Header::with_roles(destination, source, path, false, true)
    }

    fn with_roles(
        destination: Address,
        source: Address,
        path: Path,
        cr: bool,
        src_cr: bool,
    ) -> Header {
        Header {
            destination,
            source,
            path,
            cr,
            src_cr,
        }
        .normalised()
    }

    /// Copy the role flags into the addresses and set extension bits so that only the
    /// last address carries one. The result compares equal to its own decoding.
    fn normalised(mut self) -> Header {
        self.destination.ch = self.cr;
        self.source.ch = self.src_cr;
        self.destination.extension = false;
        self.source.extension = self.path.is_empty();
        let count = self.path.len();
        for (i, repeater) in self.path.as_mut_slice().iter_mut().enumerate() {
            repeater.extension = i + 1 == count;
        }
        self
    }

    /// The v2.0 role of this frame, or `None` for older frames where both bits agree.
    pub fn command_response(&self) -> Option<CommandResponse> {
        match (self.cr, self.src_cr) {
            (true, false) => Some(CommandResponse::Command),
            (false, true) => Some(CommandResponse::Response),
            _ => None,
        }
    }

    /// Mark the source address so that a receiver decoding with `DecodeMode::Auto`
    /// picks the control field width for `modulo`.
    pub fn set_modulo_hint(&mut self, modulo: Modulo) {
        self.source.reserved2 = modulo == Modulo::Eight;
    }

    /// Number of bytes `encode` will produce.
    pub fn encoded_len(&self) -> usize {
        (2 + self.path.len()) * ADDRESS_LEN
    }

    /// Append the encoded address field to `out`.
    ///
    /// The extension bit is set on the last address only, whatever the addresses
    /// themselves say.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.destination.encode_with(self.cr, false));
        out.extend_from_slice(&self.source.encode_with(self.src_cr, self.path.is_empty()));
        let count = self.path.len();
        for (i, repeater) in self.path.iter().enumerate() {
            out.extend_from_slice(&repeater.encode_with(repeater.ch, i + 1 == count));
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Decode an address field from the start of `bytes`, returning the header and the
    /// number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(Header, usize)> {
        let mut offset = 0;
        let mut next = || -> Result<Address> {
            let chunk = bytes
                .get(offset..offset + ADDRESS_LEN)
                .ok_or(Error::TruncatedAddressField)?;
            offset += ADDRESS_LEN;
            Address::decode(chunk)
        };

        let destination = next()?;
        if destination.extension {
            // The address field needs at least a destination and a source
            return Err(Error::TruncatedAddressField);
        }
        let source = next()?;
        let mut path = Path::new();
        let mut last = source.extension;
        while !last {
            if path.len() == MAX_REPEATERS {
                return Err(Error::TooManyRepeaters);
            }
            let repeater = next()?;
            last = repeater.extension;
            path.push(repeater)?;
        }

        let header = Header {
            cr: destination.ch,
            src_cr: source.ch,
            destination,
            source,
            path,
        };
        Ok((header, offset))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The role bits on destination and source are not "repeated" markers, so no '*'
        write_station(f, &self.source)?;
        write!(f, ">")?;
        write_station(f, &self.destination)?;
        if !self.path.is_empty() {
            write!(f, ",{}", self.path)?;
        }
        Ok(())
    }
}

fn write_station(f: &mut fmt::Formatter<'_>, address: &Address) -> fmt::Result {
    match address.ssid() {
        0 => write!(f, "{}", address.callsign()),
        ssid => write!(f, "{}-{}", address.callsign(), ssid),
    }
}
