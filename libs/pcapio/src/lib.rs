#![allow(clippy::unreadable_literal)]

//! Reader and writer for the classic pcap capture-file format:
//! a 24-byte global header followed by 16-byte record headers and
//! raw frame bytes.
//!
//! See [`PcapReader<R>`](PcapReader) and [`PcapWriter<W>`](PcapWriter).

pub use errors::*;
pub use header::*;
pub use record::*;
pub use reader::*;
pub use writer::*;

mod errors;
mod header;
mod reader;
mod record;
mod writer;

/// The link layer a capture file declares for its records.
///
/// Only the two link types the engine can decode get their own variant;
/// everything else is carried through numerically.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataLink {
    /// LINKTYPE_RAW: packets start directly at the IP header.
    Raw,
    /// LINKTYPE_IEEE802_11_RADIOTAP: radio metadata header + 802.11 MAC.
    Ieee80211Radiotap,
    Unknown(u32),
}

impl From<u32> for DataLink {
    fn from(value: u32) -> Self {
        match value {
            101 => DataLink::Raw,
            127 => DataLink::Ieee80211Radiotap,
            other => DataLink::Unknown(other),
        }
    }
}

impl From<DataLink> for u32 {
    fn from(value: DataLink) -> Self {
        match value {
            DataLink::Raw => 101,
            DataLink::Ieee80211Radiotap => 127,
            DataLink::Unknown(other) => other,
        }
    }
}

/// Endianness of a pcap file, decided by its magic number.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Endianness {
    Big,
    Little,
}
