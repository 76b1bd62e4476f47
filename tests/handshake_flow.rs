mod common;

use common::{captured, eapol_frame, full_exchange, rsn_key_data, AP, CLIENT};

use shakedown::analysis::{CrackComplexity, HandshakeAnalyzer};
use wlanframe::frame::SecurityType;

#[test]
fn test_ccmp_psk_exchange_is_medium() {
    let frames = full_exchange(1_700_000_000.0);
    let handshake = HandshakeAnalyzer::analyze(&frames).expect("Exchange should complete");

    assert_eq!(handshake.bssid.0, AP);
    assert_eq!(handshake.client.0, CLIENT);
    assert_eq!(handshake.security_type, SecurityType::Wpa2);
    assert_eq!(handshake.pairwise_cipher, "CCMP");
    assert_eq!(handshake.group_cipher, "CCMP");
    assert_eq!(handshake.auth_key_management, vec!["PSK".to_string()]);
    assert!(handshake.crackable);
    assert_eq!(handshake.crack_complexity, CrackComplexity::Medium);
    assert_eq!(handshake.packets.len(), 4);
}

#[test]
fn test_tkip_is_easy_and_sae_is_wpa3() {
    let tkip = rsn_key_data([0x00, 0x0F, 0xAC, 0x02], [0x00, 0x0F, 0xAC, 0x02]);
    let mut frames = full_exchange(0.0);
    frames[2] = captured(eapol_frame(3, 3, &tkip), 0.02);
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();
    assert_eq!(handshake.pairwise_cipher, "TKIP");
    assert_eq!(handshake.crack_complexity, CrackComplexity::Easy);

    let sae = rsn_key_data([0x00, 0x0F, 0xAC, 0x04], [0x00, 0x0F, 0xAC, 0x08]);
    let mut frames = full_exchange(0.0);
    frames[2] = captured(eapol_frame(3, 3, &sae), 0.02);
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();
    assert_eq!(handshake.security_type, SecurityType::Wpa3);
    // SAE without PSK is still CCMP underneath, but harder to attack.
    assert_eq!(handshake.crack_complexity, CrackComplexity::Hard);
}

#[test]
fn test_completion_is_set_based_and_order_independent() {
    let mut frames = full_exchange(10.0);
    frames.reverse();

    let mut analyzer = HandshakeAnalyzer::new();
    let mut completions = 0;
    for (idx, frame) in frames.iter().enumerate() {
        if let Some(_handshake) = analyzer.ingest(frame) {
            completions += 1;
            // Only the last ingested frame may complete the set.
            assert_eq!(idx, frames.len() - 1);
        }
    }
    assert_eq!(completions, 1);
}

#[test]
fn test_duplicate_message_1_does_not_block_completion() {
    let exchange = full_exchange(20.0);
    let mut frames = vec![
        exchange[0].clone(),
        captured(eapol_frame(1, 1, &[]), 20.005), // retransmitted M1
        exchange[0].clone(),
    ];
    frames.extend_from_slice(&exchange[1..]);

    let handshake = HandshakeAnalyzer::analyze(&frames).expect("Duplicates must not block");
    assert_eq!(handshake.packets.len(), 4);
}

#[test]
fn test_completion_does_not_refire_for_unchanged_set() {
    let frames = full_exchange(30.0);

    let mut analyzer = HandshakeAnalyzer::new();
    let mut completions = 0;
    for frame in frames.iter().chain(frames.iter()) {
        if analyzer.ingest(frame).is_some() {
            completions += 1;
        }
    }
    assert_eq!(completions, 1);
}

#[test]
fn test_unclassifiable_frames_never_complete() {
    // Build key frames whose key-information uses an unrecognized
    // descriptor version pattern for every message slot.
    let mut analyzer = HandshakeAnalyzer::new();
    for _ in 0..8 {
        let mut bytes = eapol_frame(1, 1, &[]);
        // Rewrite the key-information flags to an unclassifiable value
        // while keeping the frame well-formed. The 95-byte key body ends
        // the frame; key information sits after its descriptor-type byte.
        let key_info_offset = bytes.len() - 95 + 1;
        bytes[key_info_offset] = 0x00;
        bytes[key_info_offset + 1] = 0x0A;
        let frame = captured(bytes, 0.0);
        assert_eq!(frame.headers.eapol_message, None);
        assert!(analyzer.ingest(&frame).is_none());
    }
    assert_eq!(analyzer.completed_handshakes().count(), 0);
}

#[test]
fn test_concurrent_pairs_are_independent() {
    // Interleave two exchanges for different clients under one AP.
    let first = full_exchange(40.0);
    let second: Vec<_> = {
        // Second client: rewrite address bytes in the raw frames.
        full_exchange(40.0)
            .into_iter()
            .map(|frame| {
                let mut raw = frame.raw.clone();
                for chunk in raw.chunks_exact_mut(6) {
                    if chunk == CLIENT {
                        chunk.copy_from_slice(&[0x21, 0x22, 0x23, 0x24, 0x25, 0x26]);
                    }
                }
                captured(raw, frame.timestamp)
            })
            .collect()
    };

    let mut analyzer = HandshakeAnalyzer::new();
    let mut completions = 0;
    for pair in first.iter().zip(second.iter()) {
        completions += analyzer.ingest(pair.0).is_some() as u32;
        completions += analyzer.ingest(pair.1).is_some() as u32;
    }
    assert_eq!(completions, 2);
    assert_eq!(analyzer.completed_handshakes().count(), 2);
}

#[test]
fn test_quality_deductions() {
    // Clean exchange scores 100.
    let handshake = HandshakeAnalyzer::analyze(&full_exchange(50.0)).unwrap();
    let quality = HandshakeAnalyzer::quality(&handshake);
    assert_eq!(quality.score, 100);
    assert!(quality.issues.is_empty());
    assert!(quality.mic_lengths_ok);
    assert!(quality.replay_counters_monotonic);

    // Slow exchange: message 4 arrives ten seconds late.
    let key_data = rsn_key_data([0x00, 0x0F, 0xAC, 0x04], [0x00, 0x0F, 0xAC, 0x02]);
    let frames = vec![
        captured(eapol_frame(1, 1, &[]), 100.0),
        captured(eapol_frame(2, 2, &[]), 100.1),
        captured(eapol_frame(3, 3, &key_data), 100.2),
        captured(eapol_frame(4, 4, &[]), 110.5),
    ];
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();
    let quality = HandshakeAnalyzer::quality(&handshake);
    assert_eq!(quality.score, 80);
    assert_eq!(quality.issues.len(), 1);

    // Replay counter reuse on top of that.
    let frames = vec![
        captured(eapol_frame(1, 7, &[]), 100.0),
        captured(eapol_frame(2, 7, &[]), 100.1),
        captured(eapol_frame(3, 7, &key_data), 100.2),
        captured(eapol_frame(4, 7, &[]), 110.5),
    ];
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();
    let quality = HandshakeAnalyzer::quality(&handshake);
    assert_eq!(quality.score, 55);
    assert_eq!(quality.issues.len(), 2);
}

#[test]
fn test_handshake_without_rsn_is_not_crackable() {
    // Message 3 carries no RSN element at all.
    let frames = vec![
        captured(eapol_frame(1, 1, &[]), 0.0),
        captured(eapol_frame(2, 2, &[]), 0.1),
        captured(eapol_frame(3, 3, &[]), 0.2),
        captured(eapol_frame(4, 4, &[]), 0.3),
    ];
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();
    assert_eq!(handshake.security_type, SecurityType::Wpa);
    assert_eq!(handshake.pairwise_cipher, "Unknown");
    assert!(!handshake.crackable);
    assert_eq!(handshake.crack_complexity, CrackComplexity::Impossible);
}
