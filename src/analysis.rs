use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;
use strum_macros::Display;

use wlanframe::frame::components::MacAddress;
use wlanframe::frame::{RsnAkmSuite, RsnCipherSuite, RsnInformation, SecurityType};

use crate::frames::CapturedFrame;

/// How far apart two messages of one exchange may be before the
/// handshake is considered slow.
const SLOW_EXCHANGE_SECONDS: f64 = 5.0;
/// Signal spread beyond which the capture is considered unstable.
const UNSTABLE_SIGNAL_DBM: f64 = 10.0;

/// How hard it would be to run an offline attack against a handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display, Serialize)]
pub enum CrackComplexity {
    Easy,
    Medium,
    Hard,
    Impossible,
}

/// A completed four-way exchange and everything derived from it.
/// Immutable once produced; a new completion for the same pair
/// replaces it.
#[derive(Clone, Debug)]
pub struct ParsedHandshake {
    pub bssid: MacAddress,
    pub client: MacAddress,
    /// Timestamp of the last contributing frame.
    pub timestamp: f64,
    /// The contributing frames, ordered by message ordinal.
    pub packets: Vec<CapturedFrame>,
    pub security_type: SecurityType,
    pub channel: Option<u8>,
    pub signal_dbm: Option<i8>,
    pub key_version: u8,
    pub group_cipher: String,
    pub pairwise_cipher: String,
    pub auth_key_management: Vec<String>,
    pub crackable: bool,
    pub crack_complexity: CrackComplexity,
}

impl ParsedHandshake {
    /// The derived security parameters, used to decide whether a
    /// re-completion actually changed anything.
    fn security_fingerprint(&self) -> (SecurityType, u8, &str, &str, &[String]) {
        (
            self.security_type,
            self.key_version,
            self.group_cipher.as_str(),
            self.pairwise_cipher.as_str(),
            &self.auth_key_management,
        )
    }
}

/// Capture-quality verdict for a completed handshake. Produced for the
/// export document; never gates completion.
#[derive(Clone, Debug, Serialize)]
pub struct QualityReport {
    pub score: u8,
    pub issues: Vec<String>,
    /// Messages 2-4 carried a 16-byte MIC as they should.
    pub mic_lengths_ok: bool,
    /// Replay counters never decreased across the exchange.
    pub replay_counters_monotonic: bool,
}

#[derive(Hash, Eq, PartialEq, Debug, Clone, Copy)]
struct HandshakeKey {
    bssid: MacAddress,
    client: MacAddress,
}

/// State for one `(bssid, client)` pair while its exchange is still
/// incomplete. Only the first frame per message ordinal is retained, so
/// a retransmission flood cannot grow the session without bound;
/// replay-counter reuse across the kept frames is what quality scoring
/// later reports as retransmission.
#[derive(Debug, Default)]
struct HandshakeSession {
    frames: BTreeMap<u8, CapturedFrame>,
}

impl HandshakeSession {
    fn observe(&mut self, ordinal: u8, frame: &CapturedFrame) {
        self.frames.entry(ordinal).or_insert_with(|| frame.clone());
    }

    fn is_complete(&self) -> bool {
        (1..=4).all(|ordinal| self.frames.contains_key(&ordinal))
    }
}

/// Groups classified EAPOL frames per station pair and finalizes a
/// [ParsedHandshake] the moment all four messages are present.
///
/// Sessions for different pairs are independent; datagram reordering is
/// tolerated because completion is set-based, not sequence-based.
#[derive(Debug, Default)]
pub struct HandshakeAnalyzer {
    sessions: HashMap<HandshakeKey, HandshakeSession>,
    completed: HashMap<HandshakeKey, ParsedHandshake>,
}

impl HandshakeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one captured frame. Returns a handshake when this frame
    /// completed one, or changed the derived security parameters of an
    /// already complete pair.
    pub fn ingest(&mut self, frame: &CapturedFrame) -> Option<ParsedHandshake> {
        let observation = frame.eapol.as_ref()?;
        // Unclassifiable key frames never count toward completion.
        let ordinal = observation.message?;

        let key = HandshakeKey {
            bssid: observation.bssid,
            client: observation.client,
        };

        let session = self.sessions.entry(key).or_default();
        session.observe(ordinal, frame);
        debug!(
            "EAPOL message {ordinal} for {} / {} ({} of 4 collected)",
            key.bssid,
            key.client,
            session.frames.len()
        );

        if !session.is_complete() {
            return None;
        }

        let handshake = finalize(key, session);

        // Re-completion with unchanged parameters must not re-fire.
        if let Some(previous) = self.completed.get(&key) {
            if previous.security_fingerprint() == handshake.security_fingerprint() {
                return None;
            }
        }

        info!(
            "Handshake complete: {} / {} ({}, {})",
            handshake.bssid,
            handshake.client,
            handshake.security_type,
            handshake.crack_complexity
        );
        self.completed.insert(key, handshake.clone());
        Some(handshake)
    }

    /// Batch form of [Self::ingest], used to re-score a frame list after
    /// new captures arrive. Returns the last completion, if any.
    pub fn analyze(frames: &[CapturedFrame]) -> Option<ParsedHandshake> {
        let mut analyzer = HandshakeAnalyzer::new();
        let mut result = None;
        for frame in frames {
            if let Some(handshake) = analyzer.ingest(frame) {
                result = Some(handshake);
            }
        }
        result
    }

    pub fn completed_handshakes(&self) -> impl Iterator<Item = &ParsedHandshake> {
        self.completed.values()
    }

    /// Score the capture quality of a completed handshake.
    pub fn quality(handshake: &ParsedHandshake) -> QualityReport {
        let mut score: i32 = 100;
        let mut issues = Vec::new();

        let timestamps: Vec<f64> = handshake
            .packets
            .iter()
            .map(|frame| frame.timestamp)
            .collect();
        let max_gap = timestamps
            .iter()
            .tuple_windows()
            .map(|(a, b)| (b - a).abs())
            .fold(0.0f64, f64::max);
        if max_gap > SLOW_EXCHANGE_SECONDS {
            score -= 20;
            issues.push(format!(
                "Slow exchange: {max_gap:.1}s between consecutive messages"
            ));
        }

        let signals: Vec<f64> = handshake
            .packets
            .iter()
            .filter_map(|frame| frame.signal_dbm())
            .map(f64::from)
            .collect();
        if signals.len() > 1 {
            let mean = signals.iter().sum::<f64>() / signals.len() as f64;
            let variance = signals
                .iter()
                .map(|signal| (signal - mean).powi(2))
                .sum::<f64>()
                / signals.len() as f64;
            if variance.sqrt() > UNSTABLE_SIGNAL_DBM {
                score -= 15;
                issues.push(format!(
                    "Unstable signal: {:.1} dBm standard deviation",
                    variance.sqrt()
                ));
            }
        }

        let counters: Vec<u64> = handshake
            .packets
            .iter()
            .filter_map(|frame| frame.eapol.as_ref())
            .map(|observation| observation.key.replay_counter)
            .collect();
        let reused = counters.iter().unique().count() < counters.len();
        if reused {
            score -= 25;
            issues.push("Replay counter reuse: exchange includes retransmissions".to_string());
        }

        let mic_lengths_ok = handshake
            .packets
            .iter()
            .filter_map(|frame| frame.eapol.as_ref())
            .filter(|observation| observation.message.is_some_and(|m| m >= 2))
            .all(|observation| observation.key.key_mic.is_some());

        let replay_counters_monotonic = counters.windows(2).all(|pair| pair[0] <= pair[1]);

        QualityReport {
            score: score.max(0) as u8,
            issues,
            mic_lengths_ok,
            replay_counters_monotonic,
        }
    }
}

/// Build the [ParsedHandshake] for a just-completed session.
fn finalize(key: HandshakeKey, session: &HandshakeSession) -> ParsedHandshake {
    let packets: Vec<CapturedFrame> = session.frames.values().cloned().collect();

    let rsn = session
        .frames
        .get(&3)
        .and_then(|frame| frame.eapol.as_ref())
        .and_then(|observation| RsnInformation::find_in_key_data(&observation.key.key_data));

    let security_type = match &rsn {
        Some(rsn) if rsn.akm_suites.contains(&RsnAkmSuite::SAE) => SecurityType::Wpa3,
        Some(_) => SecurityType::Wpa2,
        None => SecurityType::Wpa,
    };

    let key_version = session
        .frames
        .get(&1)
        .and_then(|frame| frame.eapol.as_ref())
        .map(|observation| observation.key.parse_key_information().descriptor_version)
        .unwrap_or(0);

    let (crackable, crack_complexity) = assess_crackability(&rsn);

    let timestamp = packets
        .iter()
        .map(|frame| frame.timestamp)
        .fold(0.0f64, f64::max);
    let channel = packets.iter().find_map(|frame| frame.headers.channel);
    let signal_dbm = packets.iter().rev().find_map(|frame| frame.signal_dbm());

    ParsedHandshake {
        bssid: key.bssid,
        client: key.client,
        timestamp,
        packets,
        security_type,
        channel,
        signal_dbm,
        key_version,
        group_cipher: rsn
            .as_ref()
            .map(|rsn| rsn.group_cipher.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        pairwise_cipher: rsn
            .as_ref()
            .map(|rsn| rsn.pairwise_cipher.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        auth_key_management: rsn
            .as_ref()
            .map(|rsn| rsn.akm_suites.iter().map(|suite| suite.to_string()).collect())
            .unwrap_or_default(),
        crackable,
        crack_complexity,
    }
}

/// A handshake is worth attacking offline only when its pairwise cipher
/// is one of the two PSK-era ciphers.
fn assess_crackability(rsn: &Option<RsnInformation>) -> (bool, CrackComplexity) {
    let Some(rsn) = rsn else {
        return (false, CrackComplexity::Impossible);
    };

    match rsn.pairwise_cipher {
        RsnCipherSuite::TKIP => (true, CrackComplexity::Easy),
        RsnCipherSuite::CCMP => {
            let psk = rsn
                .akm_suites
                .iter()
                .any(|suite| matches!(suite, RsnAkmSuite::PSK | RsnAkmSuite::PSK256));
            if psk {
                (true, CrackComplexity::Medium)
            } else {
                (true, CrackComplexity::Hard)
            }
        }
        _ => (false, CrackComplexity::Impossible),
    }
}
