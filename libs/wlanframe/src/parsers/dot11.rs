use log::trace;
use nom::bytes::complete::take;
use nom::combinator::opt;
use nom::sequence::tuple;

use super::{clone_slice, parse_eapol_key, parse_frame_control, parse_mac, parse_sequence_control};
use crate::error::Error;
use crate::frame::components::{Dot11Header, RadioHeader};
use crate::frame::{Dot11Frame, LLC_SNAP_EAPOL, MIN_EAPOL_FRAME_LEN};

/// Parse and return the [Dot11Header] from a given payload.
pub fn parse_dot11_header(input: &[u8]) -> Result<(&[u8], Dot11Header), Error> {
    let (input, frame_control) = parse_frame_control(input)?;

    let (mut remaining, (duration, address_1, address_2, address_3, sequence_control)) =
        tuple((
            take(2usize),
            parse_mac,
            parse_mac,
            parse_mac,
            parse_sequence_control,
        ))(input)?;

    let duration = clone_slice::<2>(duration);

    // The fourth address only exists if both `from_ds` and `to_ds` is set.
    let mut address_4 = None;
    if frame_control.to_ds() && frame_control.from_ds() {
        (remaining, address_4) = opt(parse_mac)(remaining)?;
    }

    // QoS subtypes carry two extra control bytes before the payload.
    if frame_control.frame_subtype.is_qos() {
        let (rest, _qos) = take(2usize)(remaining)?;
        remaining = rest;
    }

    Ok((
        remaining,
        Dot11Header {
            frame_control,
            duration,
            address_1,
            address_2,
            address_3,
            sequence_control,
            address_4,
        },
    ))
}

/// Parse the MAC layer and payload of a monitor-mode frame whose radio
/// header has already been consumed.
pub fn parse_dot11_frame(radio: RadioHeader, input: &[u8]) -> Result<Dot11Frame, Error> {
    let (remaining, header) = parse_dot11_header(input)?;

    // EAPOL detection: LLC/SNAP marker plus the registered ethertype,
    // but only once the buffer can actually hold a key frame.
    if remaining.starts_with(&LLC_SNAP_EAPOL) && remaining.len() >= MIN_EAPOL_FRAME_LEN {
        let eapol_key = parse_eapol_key(&remaining[LLC_SNAP_EAPOL.len()..])?;
        trace!(
            "EAPOL-Key frame: {} -> {} ({} bytes key data)",
            header.address_2,
            header.address_1,
            eapol_key.key_data.len()
        );
        Ok(Dot11Frame {
            radio,
            header,
            eapol_key: Some(eapol_key),
            // No other data if an EAPOL-Key frame is present.
            payload: Vec::new(),
        })
    } else {
        Ok(Dot11Frame {
            radio,
            header,
            eapol_key: None,
            payload: remaining.to_vec(),
        })
    }
}
