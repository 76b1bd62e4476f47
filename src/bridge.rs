use std::net::{SocketAddr, UdpSocket};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use byteorder::{BigEndian, ByteOrder};
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frames::{decode, FrameHeaders, LinkType};

/// A captured frame crossing the process boundary: small envelope,
/// best-effort delivery, no ordering guarantee.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    /// Capture time in milliseconds since the epoch.
    pub timestamp: u64,
    /// The raw frame bytes, base64 encoded.
    pub payload: String,
    #[serde(default)]
    pub headers: FrameHeaders,
    #[serde(default)]
    pub preview: String,
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Datagram too short for a length frame")]
    TooShort,
    #[error("Length frame disagrees with the datagram size")]
    LengthMismatch,
    #[error("Envelope body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Envelope payload is not valid base64: {0}")]
    Payload(#[from] base64::DecodeError),
}

impl Envelope {
    /// Serialize into a length-framed datagram body:
    /// a big-endian u32 length followed by that many JSON bytes.
    pub fn encode(&self) -> Vec<u8> {
        let body = serde_json::to_vec(self).expect("Envelope serialization cannot fail");
        let mut buf = vec![0u8; 4];
        BigEndian::write_u32(&mut buf, body.len() as u32);
        buf.extend_from_slice(&body);
        buf
    }

    /// Parse a length-framed datagram body back into an envelope.
    pub fn decode(buf: &[u8]) -> Result<Envelope, EnvelopeError> {
        if buf.len() < 4 {
            return Err(EnvelopeError::TooShort);
        }
        let declared = BigEndian::read_u32(buf) as usize;
        if declared != buf.len() - 4 {
            return Err(EnvelopeError::LengthMismatch);
        }
        Ok(serde_json::from_slice(&buf[4..])?)
    }

    /// Decode the base64 frame bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(BASE64.decode(&self.payload)?)
    }
}

/// True when `needle` occurs as a contiguous byte subsequence of
/// `haystack`. An empty needle matches everything.
pub fn contains_subsequence(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// The sending half of the capture bridge, run by the privileged side.
///
/// Applies the same drop semantics as the receiving session manager
/// (empty, filtered-out or undecodable frames are never transmitted), so
/// filtering happens on both sides of the process boundary.
pub struct FrameForwarder {
    socket: UdpSocket,
    target: SocketAddr,
    link_type: LinkType,
    filter: Option<Vec<u8>>,
    forwarded: u64,
    dropped: u64,
}

impl FrameForwarder {
    pub fn new(
        target: SocketAddr,
        link_type: LinkType,
        filter: Option<Vec<u8>>,
    ) -> std::io::Result<FrameForwarder> {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        Ok(FrameForwarder {
            socket,
            target,
            link_type,
            filter,
            forwarded: 0,
            dropped: 0,
        })
    }

    /// Filter, wrap and transmit one frame. Returns whether the frame was
    /// actually sent.
    pub fn forward(&mut self, id: String, timestamp_ms: u64, bytes: &[u8]) -> std::io::Result<bool> {
        if bytes.is_empty() {
            self.dropped += 1;
            return Ok(false);
        }
        if let Some(filter) = &self.filter {
            if !contains_subsequence(bytes, filter) {
                self.dropped += 1;
                return Ok(false);
            }
        }
        let Some(decoded) = decode(bytes, self.link_type) else {
            self.dropped += 1;
            return Ok(false);
        };

        let envelope = Envelope {
            id,
            timestamp: timestamp_ms,
            payload: BASE64.encode(bytes),
            headers: decoded.headers,
            preview: decoded.preview,
        };

        self.socket.send_to(&envelope.encode(), self.target)?;
        self.forwarded += 1;
        trace!("Forwarded frame #{} to {}", self.forwarded, self.target);
        Ok(true)
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
