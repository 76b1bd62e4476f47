use nom::sequence::tuple;
use nom::{bits, IResult};
use nom::{complete::take, error::Error as NomError};

use crate::error::Error;
use crate::frame::components::{FrameControl, RadioHeader, SequenceControl};
use crate::frame_types::*;

/// Parse the frame control of a frame.
/// The format is the same for ALL frames, which makes this part quite unique.
pub fn parse_frame_control(input: &[u8]) -> IResult<&[u8], FrameControl> {
    let (remaining, (frame_subtype, frame_type, protocol_version, flags)) =
        bits::<_, (u8, u8, u8, u8), NomError<(&[u8], usize)>, _, _>(tuple((
            take(4usize),
            take(2usize),
            take(2usize),
            take(8usize),
        )))(input)?;

    let frame_type = parse_frame_type(frame_type);

    // The next 4 bits are then used to determine the frame sub-type.
    // The sub-type depends on the current FrameType
    let frame_subtype = match frame_type {
        FrameType::Management => management_frame_subtype(frame_subtype),
        FrameType::Control => control_frame_subtype(frame_subtype),
        FrameType::Data => data_frame_subtype(frame_subtype),
        FrameType::Unknown => FrameSubType::Unhandled,
    };

    Ok((
        remaining,
        FrameControl {
            protocol_version,
            frame_type,
            frame_subtype,
            flags,
        },
    ))
}

/// Parse the sequence control field: 4 bits fragment number, 12 bits
/// sequence number, little endian.
pub fn parse_sequence_control(input: &[u8]) -> IResult<&[u8], SequenceControl> {
    let (remaining, (fragment_number, sequence_number)) =
        bits::<_, (u8, u16), NomError<(&[u8], usize)>, _, _>(tuple((
            take(4usize),
            take(12usize),
        )))(input)?;

    Ok((
        remaining,
        SequenceControl {
            fragment_number,
            sequence_number,
        },
    ))
}

/// Validate and consume the radio metadata header in front of the MAC layer.
///
/// Only the fixed prefix is interpreted here: the version byte must be 0 and
/// the declared little-endian length must fit inside the buffer. Field
/// extraction beyond that is left to a dedicated radiotap parser.
pub fn parse_radio_header(input: &[u8]) -> Result<(&[u8], RadioHeader), Error> {
    if input.len() < 8 {
        return Err(Error::Incomplete(
            "Radio metadata header needs at least 8 bytes".to_string(),
        ));
    }

    let version = input[0];
    if version != 0 {
        return Err(Error::InvalidRadioHeader("version byte must be 0"));
    }

    let length = u16::from_le_bytes([input[2], input[3]]);
    if length as usize > input.len() {
        return Err(Error::InvalidRadioHeader(
            "declared length exceeds the buffer",
        ));
    }

    Ok((&input[length as usize..], RadioHeader { version, length }))
}

/// Get the FrameType from a two-bit integer (bits 2-3 of the payload).
fn parse_frame_type(byte: u8) -> FrameType {
    match byte {
        0 => FrameType::Management,
        1 => FrameType::Control,
        2 => FrameType::Data,
        _ => FrameType::Unknown,
    }
}

/// Get the FrameSubType from a 4-bit integer (bit 4-7) under
/// the assumption that this is a management frame.
fn management_frame_subtype(byte: u8) -> FrameSubType {
    match byte {
        0 => FrameSubType::AssociationRequest,
        1 => FrameSubType::AssociationResponse,
        2 => FrameSubType::ReassociationRequest,
        3 => FrameSubType::ReassociationResponse,
        4 => FrameSubType::ProbeRequest,
        5 => FrameSubType::ProbeResponse,
        6 => FrameSubType::TimingAdvertisement,
        7 => FrameSubType::Reserved,
        8 => FrameSubType::Beacon,
        9 => FrameSubType::Atim,
        10 => FrameSubType::Disassociation,
        11 => FrameSubType::Authentication,
        12 => FrameSubType::Deauthentication,
        13 => FrameSubType::Action,
        14 => FrameSubType::ActionNoAck,
        15 => FrameSubType::Reserved,
        _ => FrameSubType::Unhandled,
    }
}

/// Get the FrameSubType from a 4-bit integer (bit 4-7) under
/// the assumption that this is a control frame.
fn control_frame_subtype(byte: u8) -> FrameSubType {
    match byte {
        0 => FrameSubType::Reserved,
        1 => FrameSubType::Reserved,
        2 => FrameSubType::Trigger,
        3 => FrameSubType::Tack,
        4 => FrameSubType::BeamformingReportPoll,
        5 => FrameSubType::NdpAnnouncement,
        6 => FrameSubType::ControlFrameExtension,
        7 => FrameSubType::ControlWrapper,
        8 => FrameSubType::BlockAckRequest,
        9 => FrameSubType::BlockAck,
        10 => FrameSubType::PsPoll,
        11 => FrameSubType::Rts,
        12 => FrameSubType::Cts,
        13 => FrameSubType::Ack,
        14 => FrameSubType::CfEnd,
        15 => FrameSubType::CfEndCfAck,
        _ => FrameSubType::Unhandled,
    }
}

/// Get the FrameSubType from a 4-bit integer (bit 4-7) under
/// the assumption that this is a data frame.
fn data_frame_subtype(byte: u8) -> FrameSubType {
    match byte {
        0 => FrameSubType::Data,
        1 => FrameSubType::DataCfAck,
        2 => FrameSubType::DataCfPoll,
        3 => FrameSubType::DataCfAckCfPoll,
        4 => FrameSubType::NullData,
        5 => FrameSubType::CfAck,
        6 => FrameSubType::CfPoll,
        7 => FrameSubType::CfAckCfPoll,
        8 => FrameSubType::QosData,
        9 => FrameSubType::QosDataCfAck,
        10 => FrameSubType::QosDataCfPoll,
        11 => FrameSubType::QosDataCfAckCfPoll,
        12 => FrameSubType::QosNull,
        13 => FrameSubType::Reserved,
        14 => FrameSubType::QosCfPoll,
        15 => FrameSubType::QosCfAckCfPoll,
        _ => FrameSubType::Unhandled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_header_version_check() {
        let buf = [1u8, 0, 8, 0, 0, 0, 0, 0];
        assert!(parse_radio_header(&buf).is_err());
    }

    #[test]
    fn test_radio_header_length_check() {
        // Declared length 64 on a 8-byte buffer.
        let buf = [0u8, 0, 64, 0, 0, 0, 0, 0];
        assert!(parse_radio_header(&buf).is_err());
    }

    #[test]
    fn test_radio_header_consumes_declared_length() {
        let mut buf = vec![0u8, 0, 12, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        buf.extend_from_slice(&[0xAA, 0xBB]);
        let (remaining, radio) = parse_radio_header(&buf).unwrap();
        assert_eq!(radio.length, 12);
        assert_eq!(remaining, &[0xAA, 0xBB]);
    }
}
