use std::io::Write;

use byteorder::{BigEndian, LittleEndian};

use crate::errors::*;
use crate::{Endianness, PcapHeader, PcapRecord};

/// Writes a pcap to a writer.
///
/// # Example
/// ```rust,no_run
/// use std::fs::File;
///
/// use pcapio::{PcapReader, PcapWriter};
///
/// let file_in = File::open("test.pcap").expect("Error opening file");
/// let mut pcap_reader = PcapReader::new(file_in).unwrap();
///
/// let file_out = File::create("out.pcap").expect("Error creating file out");
/// let mut pcap_writer = PcapWriter::new(file_out).expect("Error writing file");
///
/// while let Some(record) = pcap_reader.next_record() {
///     let record = record.unwrap();
///     pcap_writer.write_record(&record).unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct PcapWriter<W: Write> {
    endianness: Endianness,
    snaplen: u32,
    writer: W,
}

impl<W: Write> PcapWriter<W> {
    /// Creates a new [`PcapWriter`] with the default global header:
    /// version 2.4, snaplen 65535, radiotap link type, little endian.
    ///
    /// # Errors
    /// The writer can't be written to.
    pub fn new(writer: W) -> PcapResult<PcapWriter<W>> {
        PcapWriter::with_header(writer, PcapHeader::default())
    }

    /// Creates a new [`PcapWriter`] with a user defined [`PcapHeader`],
    /// which is written to the stream immediately.
    ///
    /// # Errors
    /// The writer can't be written to.
    pub fn with_header(mut writer: W, header: PcapHeader) -> PcapResult<PcapWriter<W>> {
        header.write_to(&mut writer)?;

        Ok(PcapWriter {
            endianness: header.endianness,
            snaplen: header.snaplen,
            writer,
        })
    }

    /// Consumes [`Self`], returning the wrapped writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Writes a [`PcapRecord`].
    pub fn write_record(&mut self, record: &PcapRecord) -> PcapResult<usize> {
        match self.endianness {
            Endianness::Big => record.write_to::<_, BigEndian>(&mut self.writer, self.snaplen),
            Endianness::Little => {
                record.write_to::<_, LittleEndian>(&mut self.writer, self.snaplen)
            }
        }
    }

    /// Flush data
    pub fn flush(&mut self) -> PcapResult<()> {
        self.writer.flush().map_err(PcapError::IoError)
    }

    /// Returns the endianness used by the writer.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Returns the snaplen used by the writer.
    pub fn snaplen(&self) -> u32 {
        self.snaplen
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{DataLink, PcapReader};

    #[test]
    fn test_write_then_read_is_lossless() {
        let records = vec![
            PcapRecord::new(Duration::new(1_700_000_000, 1500), vec![0xAA; 64]),
            PcapRecord::new(Duration::new(1_700_000_001, 999_999_000), vec![0x55; 9]),
        ];

        let mut buf = Vec::new();
        let header = PcapHeader {
            datalink: DataLink::Ieee80211Radiotap,
            ..Default::default()
        };
        let mut writer = PcapWriter::with_header(&mut buf, header).unwrap();
        for record in &records {
            writer.write_record(record).unwrap();
        }
        drop(writer);

        let mut reader = PcapReader::new(&buf[..]).unwrap();
        assert_eq!(reader.header().datalink, DataLink::Ieee80211Radiotap);
        assert_eq!(reader.header().version_major, 2);
        assert_eq!(reader.header().version_minor, 4);

        let mut read_back = Vec::new();
        while let Some(record) = reader.next_record() {
            read_back.push(record.unwrap());
        }
        assert_eq!(read_back, records);
    }

    #[test]
    fn test_truncated_record_header() {
        let mut buf = Vec::new();
        let mut writer = PcapWriter::new(&mut buf).unwrap();
        writer
            .write_record(&PcapRecord::new(Duration::new(0, 0), vec![1, 2, 3]))
            .unwrap();
        drop(writer);
        buf.truncate(buf.len() - 10);

        let mut reader = PcapReader::new(&buf[..]).unwrap();
        assert!(matches!(
            reader.next_record(),
            Some(Err(PcapError::IncompleteBuffer))
        ));
    }
}
