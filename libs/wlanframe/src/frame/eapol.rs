use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

use strum_macros::Display;

/// LLC/SNAP encapsulation marker followed by the EAPOL ethertype.
/// Data payloads starting with this sequence carry 802.1X traffic.
pub const LLC_SNAP_EAPOL: [u8; 8] = [0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x88, 0x8E];

/// The fixed EAPOL-Key body is 95 bytes after the 4-byte EAPOL header.
/// Anything shorter than marker + header + body cannot be a key frame.
pub const MIN_EAPOL_FRAME_LEN: usize = LLC_SNAP_EAPOL.len() + 4 + 95;

#[derive(Clone, Copy, Debug)]
pub struct KeyInformation {
    pub descriptor_version: u8,
    pub key_type: bool,
    pub key_index: u8,
    pub install: bool,
    pub key_ack: bool,
    pub key_mic: bool,
    pub secure: bool,
    pub error: bool,
    pub request: bool,
    pub encrypted_key_data: bool,
    pub smk_message: bool,
}

/// One EAPOL-Key frame as found inside a data payload.
///
/// The MIC field is kept only when the key-information MIC bit says it is
/// meaningful; the 16 wire bytes are present either way.
#[derive(Clone, Debug)]
pub struct EapolKey {
    pub protocol_version: u8,
    pub packet_type: u8,
    pub packet_length: u16,
    pub descriptor_type: u8,
    pub key_information: u16,
    pub key_length: u16,
    pub replay_counter: u64,
    pub key_nonce: [u8; 32],
    pub key_iv: [u8; 16],
    pub key_rsc: u64,
    pub key_id: u64,
    pub key_mic: Option<[u8; 16]>,
    pub key_data: Vec<u8>,
}

impl EapolKey {
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();

        bytes.write_u8(self.protocol_version)?;
        bytes.write_u8(self.packet_type)?;
        bytes.write_u16::<BigEndian>(self.packet_length)?;
        bytes.write_u8(self.descriptor_type)?;
        bytes.write_u16::<BigEndian>(self.key_information)?;
        bytes.write_u16::<BigEndian>(self.key_length)?;
        bytes.write_u64::<BigEndian>(self.replay_counter)?;
        bytes.write_all(&self.key_nonce)?;
        bytes.write_all(&self.key_iv)?;
        bytes.write_u64::<BigEndian>(self.key_rsc)?;
        bytes.write_u64::<BigEndian>(self.key_id)?;
        bytes.write_all(&self.key_mic.unwrap_or([0u8; 16]))?;
        bytes.write_u16::<BigEndian>(self.key_data.len() as u16)?;
        bytes.write_all(&self.key_data)?;

        Ok(bytes)
    }

    pub fn parse_key_information(&self) -> KeyInformation {
        KeyInformation {
            descriptor_version: (self.key_information & 0x0007) as u8, // Bits 0-2
            key_type: (self.key_information & 0x0008) != 0,            // Bit 3
            key_index: ((self.key_information & 0x0030) >> 4) as u8,   // Bits 4-5
            install: (self.key_information & 0x0040) != 0,             // Bit 6
            key_ack: (self.key_information & 0x0080) != 0,             // Bit 7
            key_mic: (self.key_information & 0x0100) != 0,             // Bit 8
            secure: (self.key_information & 0x0200) != 0,              // Bit 9
            error: (self.key_information & 0x0400) != 0,               // Bit 10
            request: (self.key_information & 0x0800) != 0,             // Bit 11
            encrypted_key_data: (self.key_information & 0x1000) != 0,  // Bit 12
            smk_message: (self.key_information & 0x2000) != 0,         // Bit 13
        }
    }

    /// Classify this key frame's place in the four-way exchange.
    ///
    /// The low four key-information bits plus the ACK bit are enough to
    /// tell the four messages apart for the descriptor version this
    /// classification targets; key frames using other descriptor versions
    /// fall through to [MessageType::Other] and stay out of handshake
    /// accounting.
    pub fn message_ordinal(&self) -> MessageType {
        const KEY_TYPE: u16 = 1 << 3;
        const KEY_ACK: u16 = 1 << 7;

        if self.key_information & KEY_TYPE == 0 {
            // Group-key updates never advance a pairwise handshake.
            return MessageType::Gtk;
        }

        let flags = self.key_information & 0x000F;
        let ack = self.key_information & KEY_ACK != 0;

        match (flags, ack) {
            (0x8, true) => MessageType::Message1,
            (0x9, false) => MessageType::Message2,
            (0x9, true) => MessageType::Message3,
            (0xB, false) => MessageType::Message4,
            _ => MessageType::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum MessageType {
    Message1,
    Message2,
    Message3,
    Message4,
    Gtk,
    Other,
}

impl MessageType {
    /// The 1-based ordinal within the four-way exchange, when there is one.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            MessageType::Message1 => Some(1),
            MessageType::Message2 => Some(2),
            MessageType::Message3 => Some(3),
            MessageType::Message4 => Some(4),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Message1 => write!(f, "Message 1"),
            MessageType::Message2 => write!(f, "Message 2"),
            MessageType::Message3 => write!(f, "Message 3"),
            MessageType::Message4 => write!(f, "Message 4"),
            MessageType::Gtk => write!(f, "Group Temporal Key"),
            MessageType::Other => write!(f, "Unclassified Message"),
        }
    }
}

/// Coarse security scheme derived from a handshake's key material.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display)]
pub enum SecurityType {
    Wpa,
    Wpa2,
    Wpa3,
}
