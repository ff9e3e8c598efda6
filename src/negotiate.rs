//! Decide which sequence modulo a link ended up with by looking at a connection
//! request and the peer's reply.

use log::debug;

use crate::control::Modulo;
use crate::frame::FrameContent;
use crate::xid::{Xid, HDLC_MODULO_128, PI_HDLC_OPTIONAL_FUNCTIONS};

/// Given the frame we sent and the frame that came back, return the modulo the link
/// now uses, or `None` if the exchange did not establish or negotiate one.
///
/// A v2.0 station answers SABME with FRMR, in which case the link falls back to
/// modulo 8. For an XID exchange modulo 128 is only selected when both sides
/// advertise it in their HDLC Optional Functions.
pub fn select_modulo(request: &FrameContent, response: &FrameContent) -> Option<Modulo> {
    use FrameContent::*;
    let selected = match (request, response) {
        (SetAsynchronousBalancedModeExtended { .. }, UnnumberedAcknowledge { .. }) => {
            Some(Modulo::OneTwentyEight)
        }
        (SetAsynchronousBalancedMode { .. }, UnnumberedAcknowledge { .. }) => Some(Modulo::Eight),
        (SetAsynchronousBalancedModeExtended { .. }, FrameReject { .. }) => Some(Modulo::Eight),
        (ExchangeIdentification { xid: ours, .. }, ExchangeIdentification { xid: theirs, .. }) => {
            if offers_modulo_128(ours) && offers_modulo_128(theirs) {
                Some(Modulo::OneTwentyEight)
            } else {
                Some(Modulo::Eight)
            }
        }
        _ => None,
    };
    debug!("modulo selected from exchange: {:?}", selected);
    selected
}

fn offers_modulo_128(xid: &Xid) -> bool {
    let Some(parameter) = xid.parameter(PI_HDLC_OPTIONAL_FUNCTIONS) else {
        return false;
    };
    let value = parameter.value();
    if value.len() > 4 {
        return false;
    }
    let bits = value
        .iter()
        .fold(0u32, |bits, &b| (bits << 8) | u32::from(b));
    bits & HDLC_MODULO_128 > 0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::FrameReject as Frmr;
    use crate::header::CommandResponse;
    use crate::xid::{HdlcOptionalFunctions, XidParameter};

    fn sabm() -> FrameContent {
        FrameContent::SetAsynchronousBalancedMode { poll: true }
    }

    fn sabme() -> FrameContent {
        FrameContent::SetAsynchronousBalancedModeExtended { poll: true }
    }

    fn ua() -> FrameContent {
        FrameContent::UnnumberedAcknowledge { final_bit: true }
    }

    fn dm() -> FrameContent {
        FrameContent::DisconnectedMode { final_bit: true }
    }

    fn frmr() -> FrameContent {
        FrameContent::FrameReject {
            final_bit: true,
            reject: Frmr {
                modulo: Modulo::Eight,
                rejected_control: 0x7F,
                receive_state: 0,
                send_state: 0,
                command_response: CommandResponse::Command,
                w: true,
                x: false,
                y: false,
                z: false,
            },
        }
    }

    fn xid(functions: HdlcOptionalFunctions) -> FrameContent {
        FrameContent::ExchangeIdentification {
            poll_or_final: true,
            xid: Xid::new(vec![XidParameter::hdlc_optional_functions(functions)]).unwrap(),
        }
    }

    #[test]
    fn connection_requests() {
        assert_eq!(select_modulo(&sabme(), &ua()), Some(Modulo::OneTwentyEight));
        assert_eq!(select_modulo(&sabm(), &ua()), Some(Modulo::Eight));
        assert_eq!(select_modulo(&sabme(), &frmr()), Some(Modulo::Eight));
        assert_eq!(select_modulo(&sabme(), &dm()), None);
        assert_eq!(select_modulo(&sabm(), &dm()), None);
        assert_eq!(select_modulo(&sabm(), &frmr()), None);
    }

    #[test]
    fn xid_exchange() {
        let v20 = xid(HdlcOptionalFunctions::v2_0());
        let v22 = xid(HdlcOptionalFunctions::v2_2());
        assert_eq!(select_modulo(&v22, &v22), Some(Modulo::OneTwentyEight));
        assert_eq!(select_modulo(&v22, &v20), Some(Modulo::Eight));
        assert_eq!(select_modulo(&v20, &v22), Some(Modulo::Eight));

        let bare = FrameContent::ExchangeIdentification {
            poll_or_final: false,
            xid: Xid::new(vec![]).unwrap(),
        };
        assert_eq!(select_modulo(&v22, &bare), Some(Modulo::Eight));
    }

    #[test]
    fn unrelated_pairs() {
        assert_eq!(select_modulo(&ua(), &sabme()), None);
        assert_eq!(select_modulo(&sabme(), &sabme()), None);
        assert_eq!(select_modulo(&xid(HdlcOptionalFunctions::v2_2()), &ua()), None);
    }
}
