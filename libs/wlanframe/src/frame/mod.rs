/// Contains structs representing recurring sets of structured data.
/// For instance, MAC-Addresses, frame control fields, headers.
pub mod components;

/// The EAPOL-Key frame body and its key-information helpers.
mod eapol;
/// Raw-IP link frames.
mod ip;
/// RSN information element structures.
mod rsn;

pub use eapol::*;
pub use ip::*;
pub use rsn::*;

use components::{Dot11Header, RadioHeader};

/// A decoded monitor-mode 802.11 frame: radio metadata, MAC header,
/// the EAPOL-Key body when one was found, and whatever payload remains
/// after the consumed headers.
#[derive(Clone, Debug)]
pub struct Dot11Frame {
    pub radio: RadioHeader,
    pub header: Dot11Header,
    pub eapol_key: Option<EapolKey>,
    pub payload: Vec<u8>,
}
