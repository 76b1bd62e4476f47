use log::trace;
use radiotap::Radiotap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use wlanframe::frame::components::MacAddress;
use wlanframe::frame::EapolKey;

use crate::util::{freq_to_channel, hex_preview};

/// How many source bytes a frame preview may cover.
pub const PREVIEW_LIMIT: usize = 64;

/// The two link layers the engine can interpret.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display, Serialize, Deserialize)]
pub enum LinkType {
    /// Frames start directly at the IP header.
    Ip,
    /// Radio metadata header followed by an 802.11 MAC header.
    Ieee80211Radio,
}

/// The parsed fields of one frame, flattened for the UI event stream and
/// the bridge envelope. Absent fields simply stay unset; a default value
/// of this struct is what an undecodable frame produces.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameHeaders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_dbm: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eapol_message: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_counter: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<u16>,
}

/// An EAPOL key frame observed between an AP and one of its stations.
///
/// `client` is whichever of source and destination is not the BSSID.
/// `message` is the classified ordinal within the four-way exchange;
/// frames without one never count toward handshake completion.
#[derive(Clone, Debug)]
pub struct EapolObservation {
    pub bssid: MacAddress,
    pub source: MacAddress,
    pub destination: MacAddress,
    pub client: MacAddress,
    pub message: Option<u8>,
    pub key: EapolKey,
}

/// One captured frame, immutable once produced: raw bytes plus everything
/// the decoder derived from them.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub id: String,
    /// Seconds since the epoch, fractional.
    pub timestamp: f64,
    pub link_type: LinkType,
    pub raw: Vec<u8>,
    pub headers: FrameHeaders,
    pub eapol: Option<EapolObservation>,
    pub preview: String,
}

impl CapturedFrame {
    pub fn fresh_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn signal_dbm(&self) -> Option<i8> {
        self.headers.signal_dbm
    }
}

/// The output of one decode attempt.
#[derive(Clone, Debug, Default)]
pub struct DecodedFrame {
    pub headers: FrameHeaders,
    pub eapol: Option<EapolObservation>,
    pub preview: String,
}

impl DecodedFrame {
    pub fn into_captured(
        self,
        id: String,
        timestamp: f64,
        link_type: LinkType,
        raw: Vec<u8>,
    ) -> CapturedFrame {
        CapturedFrame {
            id,
            timestamp,
            link_type,
            raw,
            headers: self.headers,
            eapol: self.eapol,
            preview: self.preview,
        }
    }
}

/// Decode a raw frame according to the link-type hint.
///
/// Never panics and never returns an error: malformed input below the
/// documented length checks comes back as `None`, so callers count it as
/// a drop instead of tearing down the pipeline.
pub fn decode(bytes: &[u8], link_type: LinkType) -> Option<DecodedFrame> {
    match link_type {
        LinkType::Ieee80211Radio => decode_dot11(bytes),
        LinkType::Ip => decode_ip(bytes),
    }
}

fn decode_dot11(bytes: &[u8]) -> Option<DecodedFrame> {
    let frame = match wlanframe::parse_dot11(bytes) {
        Ok(frame) => frame,
        Err(err) => {
            trace!("Dropping undecodable 802.11 frame: {err}");
            return None;
        }
    };

    // The fixed prefix has been validated above; radiotap field extraction
    // is best effort and its failure does not fail the frame.
    let (signal_dbm, channel) = match Radiotap::from_bytes(bytes) {
        Ok(radiotap) => (
            radiotap.antenna_signal.map(|signal| signal.value),
            radiotap
                .channel
                .and_then(|channel| freq_to_channel(channel.freq)),
        ),
        Err(_) => (None, None),
    };

    let header = &frame.header;
    let mut headers = FrameHeaders {
        frame_type: Some(header.frame_control.frame_type.to_string()),
        frame_subtype: Some(header.frame_control.frame_subtype.to_string()),
        source: header.src().map(|mac| mac.to_string()),
        destination: Some(header.dest().to_string()),
        bssid: header.bssid().map(|mac| mac.to_string()),
        sequence_number: Some(header.sequence_control.sequence_number),
        signal_dbm,
        channel,
        ..Default::default()
    };

    let eapol = frame.eapol_key.as_ref().and_then(|key| {
        let bssid = *header.bssid()?;
        let source = *header.src()?;
        let destination = *header.dest();
        let client = *header.station()?;
        let message = key.message_ordinal().ordinal();

        headers.eapol_message = message;
        headers.replay_counter = Some(key.replay_counter);

        Some(EapolObservation {
            bssid,
            source,
            destination,
            client,
            message,
            key: key.clone(),
        })
    });

    // Whatever payload remains once the headers are consumed: the body of
    // plain data frames, or the key data of an EAPOL key frame.
    let preview = if let Some(observation) = &eapol {
        hex_preview(&observation.key.key_data, PREVIEW_LIMIT)
    } else {
        hex_preview(&frame.payload, PREVIEW_LIMIT)
    };

    Some(DecodedFrame {
        headers,
        eapol,
        preview,
    })
}

fn decode_ip(bytes: &[u8]) -> Option<DecodedFrame> {
    let frame = match wlanframe::parse_ip(bytes) {
        Ok(frame) => frame,
        Err(err) => {
            trace!("Dropping undecodable IP frame: {err}");
            return None;
        }
    };

    let headers = FrameHeaders {
        ip_protocol: Some(frame.protocol.to_string()),
        source: Some(frame.source.to_string()),
        destination: Some(frame.destination.to_string()),
        source_port: frame.source_port,
        destination_port: frame.destination_port,
        ..Default::default()
    };

    Some(DecodedFrame {
        headers,
        eapol: None,
        preview: hex_preview(&frame.payload, PREVIEW_LIMIT),
    })
}
