#![allow(dead_code)]

use shakedown::frames::{decode, CapturedFrame, LinkType};

pub const AP: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
pub const CLIENT: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

/// An RSN element advertising group CCMP plus the given pairwise cipher
/// and AKM suite, wrapped as key data for message 3.
pub fn rsn_key_data(pairwise: [u8; 4], akm: [u8; 4]) -> Vec<u8> {
    let mut body = vec![0x01, 0x00]; // version 1
    body.extend_from_slice(&[0x00, 0x0F, 0xAC, 0x04]); // group: CCMP
    body.extend_from_slice(&[0x01, 0x00]); // one pairwise suite
    body.extend_from_slice(&pairwise);
    body.extend_from_slice(&[0x01, 0x00]); // one AKM suite
    body.extend_from_slice(&akm);

    let mut key_data = vec![0x30, body.len() as u8];
    key_data.extend(body);
    key_data
}

/// Build a complete monitor-mode EAPOL frame for the given message
/// ordinal: radio metadata, QoS data MAC header, LLC/SNAP marker and the
/// key frame body.
pub fn eapol_frame(message: u8, replay_counter: u64, key_data: &[u8]) -> Vec<u8> {
    let (key_information, from_ap): (u16, bool) = match message {
        1 => (0x0088, true),
        2 => (0x0109, false),
        3 => (0x01C9, true),
        4 => (0x010B, false),
        _ => panic!("Message ordinal must be 1-4"),
    };

    // Radio metadata: version 0, 8-byte header, no fields present.
    let mut frame = vec![0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];

    // QoS data MAC header. AP-originated frames set from-DS, client
    // frames set to-DS.
    let flags = if from_ap { 0x02 } else { 0x01 };
    frame.extend_from_slice(&[0x88, flags, 0x2C, 0x00]);
    if from_ap {
        frame.extend_from_slice(&CLIENT); // address 1: recipient
        frame.extend_from_slice(&AP); // address 2: transmitter / BSSID
        frame.extend_from_slice(&AP);
    } else {
        frame.extend_from_slice(&AP); // address 1: recipient / BSSID
        frame.extend_from_slice(&CLIENT); // address 2: transmitter
        frame.extend_from_slice(&AP);
    }
    frame.extend_from_slice(&[0x40, 0x77]); // sequence control
    frame.extend_from_slice(&[0x00, 0x00]); // qos control

    frame.extend_from_slice(&[0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x88, 0x8E]);

    // EAPOL header + 95-byte key body + key data.
    frame.extend_from_slice(&[0x02, 0x03]);
    frame.extend_from_slice(&(95u16 + key_data.len() as u16).to_be_bytes());
    frame.push(0x02); // key descriptor type
    frame.extend_from_slice(&key_information.to_be_bytes());
    frame.extend_from_slice(&[0x00, 0x10]); // key length
    frame.extend_from_slice(&replay_counter.to_be_bytes());
    frame.extend_from_slice(&[0xC0 + message; 32]); // nonce
    frame.extend_from_slice(&[0x00; 16]); // iv
    frame.extend_from_slice(&[0x00; 8]); // rsc
    frame.extend_from_slice(&[0x00; 8]); // id
    let mic = if key_information & 0x0100 != 0 { 0x9A } else { 0x00 };
    frame.extend_from_slice(&[mic; 16]);
    frame.extend_from_slice(&(key_data.len() as u16).to_be_bytes());
    frame.extend_from_slice(key_data);

    frame
}

/// Decode raw frame bytes into a [CapturedFrame] fixture.
pub fn captured(bytes: Vec<u8>, timestamp: f64) -> CapturedFrame {
    decode(&bytes, LinkType::Ieee80211Radio)
        .expect("Fixture frames always decode")
        .into_captured(CapturedFrame::fresh_id(), timestamp, LinkType::Ieee80211Radio, bytes)
}

/// The four frames of one orderly exchange with CCMP + PSK.
pub fn full_exchange(base_timestamp: f64) -> Vec<CapturedFrame> {
    let key_data = rsn_key_data([0x00, 0x0F, 0xAC, 0x04], [0x00, 0x0F, 0xAC, 0x02]);
    vec![
        captured(eapol_frame(1, 1, &[]), base_timestamp),
        captured(eapol_frame(2, 2, &[]), base_timestamp + 0.01),
        captured(eapol_frame(3, 3, &key_data), base_timestamp + 0.02),
        captured(eapol_frame(4, 4, &[]), base_timestamp + 0.03),
    ]
}
