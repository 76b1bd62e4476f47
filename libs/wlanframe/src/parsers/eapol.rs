use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u64, be_u8};

use crate::error::Error;
use crate::frame::EapolKey;

/// Parse an [EapolKey] frame starting at the EAPOL header
/// (version, packet type, body length).
///
/// All multi-byte fields of the key descriptor are big-endian on the wire.
pub fn parse_eapol_key(input: &[u8]) -> Result<EapolKey, Error> {
    let (input, protocol_version) = be_u8(input)?;
    let (input, packet_type) = be_u8(input)?;
    let (input, packet_length) = be_u16(input)?;
    let (input, descriptor_type) = be_u8(input)?;
    let (input, key_information) = be_u16(input)?;
    let (input, key_length) = be_u16(input)?;
    let (input, replay_counter) = be_u64(input)?;
    let (input, key_nonce) = take(32usize)(input)?;
    let (input, key_iv) = take(16usize)(input)?;
    let (input, key_rsc) = be_u64(input)?;
    let (input, key_id) = be_u64(input)?;
    let (input, key_mic) = take(16usize)(input)?;
    let (input, key_data_length) = be_u16(input)?;
    let (_, key_data) = take(key_data_length as usize)(input)?;

    let key = EapolKey {
        protocol_version,
        packet_type,
        packet_length,
        descriptor_type,
        key_information,
        key_length,
        replay_counter,
        key_nonce: key_nonce.try_into().expect("Slice with incorrect length"),
        key_iv: key_iv.try_into().expect("Slice with incorrect length"),
        key_rsc,
        key_id,
        // The wire always carries 16 MIC bytes; they are only meaningful
        // when the MIC bit of the key information says so.
        key_mic: if key_information & 0x0100 != 0 {
            Some(key_mic.try_into().expect("Slice with incorrect length"))
        } else {
            None
        },
        key_data: key_data.to_vec(),
    };

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_frame_bytes(key_information: u16, key_data: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x02, 0x03];
        buf.extend_from_slice(&(95u16 + key_data.len() as u16).to_be_bytes());
        buf.push(0x02); // descriptor type
        buf.extend_from_slice(&key_information.to_be_bytes());
        buf.extend_from_slice(&16u16.to_be_bytes()); // key length
        buf.extend_from_slice(&7u64.to_be_bytes()); // replay counter
        buf.extend_from_slice(&[0x42; 32]); // nonce
        buf.extend_from_slice(&[0; 16]); // iv
        buf.extend_from_slice(&[0; 8]); // rsc
        buf.extend_from_slice(&[0; 8]); // id
        buf.extend_from_slice(&[0x99; 16]); // mic
        buf.extend_from_slice(&(key_data.len() as u16).to_be_bytes());
        buf.extend_from_slice(key_data);
        buf
    }

    #[test]
    fn test_parse_with_mic_bit() {
        let bytes = key_frame_bytes(0x0109, &[]);
        let key = parse_eapol_key(&bytes).unwrap();
        assert_eq!(key.replay_counter, 7);
        assert_eq!(key.key_nonce, [0x42; 32]);
        assert_eq!(key.key_mic, Some([0x99; 16]));
    }

    #[test]
    fn test_parse_without_mic_bit() {
        let bytes = key_frame_bytes(0x0088, &[]);
        let key = parse_eapol_key(&bytes).unwrap();
        assert_eq!(key.key_mic, None);
    }

    #[test]
    fn test_truncated_key_data_is_an_error() {
        let mut bytes = key_frame_bytes(0x0109, &[0xAA, 0xBB, 0xCC]);
        bytes.truncate(bytes.len() - 2);
        assert!(parse_eapol_key(&bytes).is_err());
    }
}
