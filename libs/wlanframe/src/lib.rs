/// Wlanframe's own [Error](error::Error) implementation
pub mod error;
/// Frame structs and their components.
pub mod frame;
/// Enums representing frame types and frame subtypes.
mod frame_types;
/// [nom] parsers for internal usage.
mod parsers;

use crate::error::Error;
use crate::parsers::*;

// Re-exports for user convenience
pub use crate::frame::{Dot11Frame, IpFrame};
pub use crate::frame_types::*;

/// Parse a monitor-mode 802.11 frame from raw bytes.
///
/// The buffer is expected to start with a radiotap-style radio metadata
/// header, followed by the MAC header and payload. EAPOL-Key payloads are
/// decoded when the LLC/SNAP marker and minimum length are present.
///
/// No FCS checks are performed.
pub fn parse_dot11(input: &[u8]) -> Result<Dot11Frame, Error> {
    let (remaining, radio) = parse_radio_header(input)?;
    parse_dot11_frame(radio, remaining)
}

/// Parse a raw-IP link frame (no radio or MAC header).
pub fn parse_ip(input: &[u8]) -> Result<IpFrame, Error> {
    parse_ip_packet(input)
}
