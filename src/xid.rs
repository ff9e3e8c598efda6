//! XID frames carry a list of `[PI][PL][PV]` parameters describing the link a station
//! is willing to run. The typed constructors here only build parameters; decoding
//! always yields raw `XidParameter`s and it is up to the caller to interpret them.

use alloc::vec;
use alloc::vec::Vec;

use crate::control::Modulo;
use crate::error::{Error, Result};

/// Format identifier for general purpose XID information.
pub const FORMAT_IDENTIFIER: u8 = 0x82;
/// Group identifier for parameter negotiation.
pub const GROUP_IDENTIFIER: u8 = 0x80;

pub const PI_CLASS_OF_PROCEDURES: u8 = 2;
pub const PI_HDLC_OPTIONAL_FUNCTIONS: u8 = 3;
/// Maximum I field length, transmit, in bits
pub const PI_I_FIELD_LENGTH_TX: u8 = 5;
/// Maximum I field length, receive, in bits
pub const PI_I_FIELD_LENGTH_RX: u8 = 6;
pub const PI_WINDOW_SIZE_TX: u8 = 7;
pub const PI_WINDOW_SIZE_RX: u8 = 8;
/// Acknowledge timer T1 in milliseconds
pub const PI_ACK_TIMER: u8 = 9;
/// Retries N2
pub const PI_RETRIES: u8 = 10;

const HEADER_LEN: usize = 4;

/// A single XID parameter: identifier plus opaque value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XidParameter {
    id: u8,
    value: Vec<u8>,
}

impl XidParameter {
    /// A parameter with arbitrary value bytes. The value must fit the one-byte length.
    pub fn raw(id: u8, value: Vec<u8>) -> Result<XidParameter> {
        if value.len() > usize::from(u8::MAX) {
            return Err(Error::ParameterTooLong { len: value.len() });
        }
        Ok(XidParameter { id, value })
    }

    pub fn class_of_procedures(classes: ClassOfProcedures) -> XidParameter {
        XidParameter {
            id: PI_CLASS_OF_PROCEDURES,
            value: classes.bits().to_be_bytes().to_vec(),
        }
    }

    pub fn hdlc_optional_functions(functions: HdlcOptionalFunctions) -> XidParameter {
        XidParameter {
            id: PI_HDLC_OPTIONAL_FUNCTIONS,
            value: functions.bits().to_be_bytes()[1..].to_vec(),
        }
    }

    /// A big-endian integer occupying `width` bytes. Higher bits of `value` that don't
    /// fit are dropped.
    pub fn integer(id: u8, value: u32, width: IntWidth) -> XidParameter {
        let bytes = value.to_be_bytes();
        XidParameter {
            id,
            value: bytes[bytes.len() - width.len()..].to_vec(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Length of the encoded parameter including PI and PL.
    pub fn encoded_len(&self) -> usize {
        2 + self.value.len()
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.id);
        out.push(self.value.len() as u8);
        out.extend_from_slice(&self.value);
    }

    /// Decode one parameter from the start of `bytes`, returning it with the number of
    /// bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(XidParameter, usize)> {
        let (&id, rest) = bytes.split_first().ok_or(Error::TruncatedParameterList)?;
        let (&len, rest) = rest.split_first().ok_or(Error::TruncatedParameterList)?;
        let value = rest
            .get(..usize::from(len))
            .ok_or(Error::TruncatedParameterList)?;
        let parameter = XidParameter {
            id,
            value: value.to_vec(),
        };
        Ok((parameter, 2 + value.len()))
    }
}

/// Byte width of an integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    One,
    Two,
    Four,
}

impl IntWidth {
    pub fn len(self) -> usize {
        match self {
            IntWidth::One => 1,
            IntWidth::Two => 2,
            IntWidth::Four => 4,
        }
    }

    /// The narrowest width that holds `value`.
    pub fn fitting(value: u32) -> IntWidth {
        if value <= u32::from(u8::MAX) {
            IntWidth::One
        } else if value <= u32::from(u16::MAX) {
            IntWidth::Two
        } else {
            IntWidth::Four
        }
    }
}

/// Class of Procedures (PI 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassOfProcedures {
    pub balanced_abm: bool,
    pub half_duplex: bool,
    pub full_duplex: bool,
}

impl ClassOfProcedures {
    pub fn bits(&self) -> u16 {
        let mut bits = 0;
        bits |= if self.balanced_abm { 0x0100 } else { 0 };
        bits |= if self.half_duplex { 0x2000 } else { 0 };
        bits |= if self.full_duplex { 0x4000 } else { 0 };
        bits
    }
}

impl Default for ClassOfProcedures {
    fn default() -> ClassOfProcedures {
        ClassOfProcedures {
            balanced_abm: true,
            half_duplex: true,
            full_duplex: false,
        }
    }
}

/// HDLC Optional Functions (PI 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HdlcOptionalFunctions {
    pub reject: bool,
    pub selective_reject: bool,
    pub multi_selective_reject: bool,
    pub extended_address: bool,
    pub modulo_8: bool,
    pub modulo_128: bool,
    pub test: bool,
    pub fcs_16: bool,
    pub segmenter: bool,
    pub synchronous_tx: bool,
}

pub(crate) const HDLC_MODULO_128: u32 = 0x00_0800;

impl HdlcOptionalFunctions {
    /// What an AX.25 v2.0 station supports.
    pub fn v2_0() -> HdlcOptionalFunctions {
        HdlcOptionalFunctions {
            reject: true,
            extended_address: true,
            modulo_8: true,
            test: true,
            fcs_16: true,
            synchronous_tx: true,
            ..Default::default()
        }
    }

    /// What an AX.25 v2.2 station offers by default.
    pub fn v2_2() -> HdlcOptionalFunctions {
        HdlcOptionalFunctions {
            selective_reject: true,
            multi_selective_reject: true,
            extended_address: true,
            modulo_128: true,
            test: true,
            fcs_16: true,
            synchronous_tx: true,
            ..Default::default()
        }
    }

    /// 24 significant bits, transmitted big-endian.
    pub fn bits(&self) -> u32 {
        let flags = [
            (self.reject, 0x02_0000),
            (self.selective_reject, 0x04_0000),
            (self.extended_address, 0x80_0000),
            (self.modulo_8, 0x00_0400),
            (self.modulo_128, HDLC_MODULO_128),
            (self.test, 0x00_0020),
            (self.fcs_16, 0x00_0080),
            (self.multi_selective_reject, 0x00_2000),
            (self.segmenter, 0x00_4000),
            (self.synchronous_tx, 0x00_0002),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(0, |bits, (_, bit)| bits | bit)
    }
}

/// The information field of an XID frame.
///
/// The parameters always fit the 16-bit group length: every way of adding one
/// checks the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xid {
    pub format_identifier: u8,
    pub group_identifier: u8,
    parameters: Vec<XidParameter>,
}

impl Xid {
    /// A general purpose negotiation XID holding `parameters`.
    pub fn new(parameters: Vec<XidParameter>) -> Result<Xid> {
        let xid = Xid {
            format_identifier: FORMAT_IDENTIFIER,
            group_identifier: GROUP_IDENTIFIER,
            parameters,
        };
        check_group_len(xid.group_len())?;
        Ok(xid)
    }

    /// Appends `parameter`, leaving the XID untouched if the group would overflow.
    pub fn push(&mut self, parameter: XidParameter) -> Result<()> {
        check_group_len(self.group_len() + parameter.encoded_len())?;
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn parameters(&self) -> &[XidParameter] {
        &self.parameters
    }

    /// The first parameter with identifier `id`.
    pub fn parameter(&self, id: u8) -> Option<&XidParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    fn group_len(&self) -> usize {
        self.parameters.iter().map(XidParameter::encoded_len).sum()
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        // Checked on construction
        let group_len = self.group_len() as u16;
        out.push(self.format_identifier);
        out.push(self.group_identifier);
        out.extend_from_slice(&group_len.to_be_bytes());
        for parameter in &self.parameters {
            parameter.encode_into(out);
        }
    }

    /// Decode an XID information field. The parameters must use up exactly the group
    /// length, and the group must end the field.
    pub fn decode(info: &[u8]) -> Result<Xid> {
        if info.len() < HEADER_LEN {
            return Err(Error::TruncatedParameterList);
        }
        let group_len = usize::from(u16::from_be_bytes([info[2], info[3]]));
        let mut group = &info[HEADER_LEN..];
        if group.len() != group_len {
            return Err(Error::TruncatedParameterList);
        }
        let mut parameters = Vec::new();
        while !group.is_empty() {
            let (parameter, used) = XidParameter::decode(group)?;
            parameters.push(parameter);
            group = &group[used..];
        }
        Ok(Xid {
            format_identifier: info[0],
            group_identifier: info[1],
            parameters,
        })
    }
}

fn check_group_len(len: usize) -> Result<()> {
    if len > usize::from(u16::MAX) {
        return Err(Error::GroupTooLong { len });
    }
    Ok(())
}

/// Link settings a station wants to negotiate, with AX.25 v2.2 defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParameters {
    pub modulo: Modulo,
    /// N1, the largest I field in bytes
    pub max_info_len: u16,
    /// k, the number of outstanding I frames
    pub window_size: u8,
    /// T1 in milliseconds
    pub ack_timer_ms: u32,
    /// N2
    pub retries: u8,
}

impl Default for LinkParameters {
    fn default() -> LinkParameters {
        LinkParameters {
            modulo: Modulo::Eight,
            max_info_len: 256,
            window_size: 4,
            ack_timer_ms: 3000,
            retries: 10,
        }
    }
}

impl LinkParameters {
    /// The XID a station would send to propose these parameters.
    pub fn to_xid(&self, defaults: &XidDefaults) -> Xid {
        let functions = match self.modulo {
            Modulo::Eight => defaults.v2_0.clone(),
            Modulo::OneTwentyEight => defaults.v2_2.clone(),
        };
        let info_bits = u32::from(self.max_info_len) * 8;
        // Six short parameters always fit the group length
        let parameters = vec![
            XidParameter::class_of_procedures(ClassOfProcedures::default()),
            functions,
            XidParameter::integer(PI_I_FIELD_LENGTH_RX, info_bits, IntWidth::fitting(info_bits)),
            XidParameter::integer(PI_WINDOW_SIZE_RX, self.window_size.into(), IntWidth::One),
            XidParameter::integer(
                PI_ACK_TIMER,
                self.ack_timer_ms,
                IntWidth::fitting(self.ack_timer_ms),
            ),
            XidParameter::integer(PI_RETRIES, self.retries.into(), IntWidth::One),
        ];
        Xid {
            format_identifier: FORMAT_IDENTIFIER,
            group_identifier: GROUP_IDENTIFIER,
            parameters,
        }
    }
}

/// Default HDLC Optional Functions parameters for the two protocol versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XidDefaults {
    pub v2_0: XidParameter,
    pub v2_2: XidParameter,
}

impl XidDefaults {
    pub fn new() -> XidDefaults {
        XidDefaults {
            v2_0: XidParameter::hdlc_optional_functions(HdlcOptionalFunctions::v2_0()),
            v2_2: XidParameter::hdlc_optional_functions(HdlcOptionalFunctions::v2_2()),
        }
    }
}

impl Default for XidDefaults {
    fn default() -> XidDefaults {
        XidDefaults::new()
    }
}

/// Process-wide defaults, built on first use and never modified afterwards.
#[cfg(feature = "std")]
pub fn defaults() -> &'static XidDefaults {
    static DEFAULTS: std::sync::OnceLock<XidDefaults> = std::sync::OnceLock::new();
    DEFAULTS.get_or_init(XidDefaults::new)
}
