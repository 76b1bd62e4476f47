use std::io::{Read, Write};
use std::time::Duration;

use byteorder::{ByteOrder, WriteBytesExt};

use crate::errors::*;

/// One pcap record: a 16-byte header (timestamp seconds, timestamp
/// microseconds, captured length, original length) plus the frame bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcapRecord {
    /// Timestamp of the capture, relative to the EPOCH
    pub timestamp: Duration,
    /// Original length of the packet when captured on the wire
    pub orig_len: u32,
    /// The captured frame bytes
    pub data: Vec<u8>,
}

impl PcapRecord {
    /// Creates a new [`PcapRecord`] whose original length equals the
    /// captured length.
    pub fn new(timestamp: Duration, data: Vec<u8>) -> PcapRecord {
        let orig_len = data.len() as u32;
        PcapRecord {
            timestamp,
            orig_len,
            data,
        }
    }

    /// Reads a [`PcapRecord`] from a reader whose position is at a record
    /// boundary. The 16 header bytes must already be in `header`.
    pub(crate) fn from_reader<R: Read, B: ByteOrder>(
        header: &[u8; 16],
        reader: &mut R,
        snaplen: u32,
    ) -> PcapResult<PcapRecord> {
        let ts_sec = B::read_u32(&header[0..4]);
        let ts_usec = B::read_u32(&header[4..8]);
        let incl_len = B::read_u32(&header[8..12]);
        let orig_len = B::read_u32(&header[12..16]);

        if ts_usec >= 1_000_000 {
            return Err(PcapError::InvalidField(
                "PcapRecord: ts_usec >= 1_000_000",
            ));
        }
        if incl_len > snaplen {
            return Err(PcapError::InvalidField("PcapRecord: incl_len > snaplen"));
        }
        if incl_len > orig_len {
            return Err(PcapError::InvalidField("PcapRecord: incl_len > orig_len"));
        }

        let mut data = vec![0u8; incl_len as usize];
        reader.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PcapError::IncompleteBuffer
            } else {
                PcapError::IoError(e)
            }
        })?;

        Ok(PcapRecord {
            timestamp: Duration::new(ts_sec as u64, ts_usec * 1000),
            orig_len,
            data,
        })
    }

    /// Writes a [`PcapRecord`] to a writer, splitting the timestamp into
    /// whole seconds and the microsecond remainder.
    pub(crate) fn write_to<W: Write, B: ByteOrder>(
        &self,
        writer: &mut W,
        snaplen: u32,
    ) -> PcapResult<usize> {
        let ts_sec = self
            .timestamp
            .as_secs()
            .try_into()
            .map_err(|_| PcapError::InvalidField("PcapRecord: timestamp_secs > u32::MAX"))?;
        let ts_usec = self.timestamp.subsec_micros();

        let incl_len: u32 = self
            .data
            .len()
            .try_into()
            .map_err(|_| PcapError::InvalidField("PcapRecord: incl_len > u32::MAX"))?;

        if incl_len > snaplen {
            return Err(PcapError::InvalidField("PcapRecord: incl_len > snaplen"));
        }
        if incl_len > self.orig_len {
            return Err(PcapError::InvalidField("PcapRecord: incl_len > orig_len"));
        }

        writer.write_u32::<B>(ts_sec)?;
        writer.write_u32::<B>(ts_usec)?;
        writer.write_u32::<B>(incl_len)?;
        writer.write_u32::<B>(self.orig_len)?;
        writer.write_all(&self.data)?;

        Ok(16 + self.data.len())
    }
}
