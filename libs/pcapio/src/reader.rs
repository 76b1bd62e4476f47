use std::io::Read;

use byteorder::{BigEndian, LittleEndian};

use crate::errors::*;
use crate::{Endianness, PcapHeader, PcapRecord};

/// Reads a pcap from a reader.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
///
/// use pcapio::PcapReader;
///
/// let file_in = File::open("test.pcap").expect("Error opening file");
/// let mut pcap_reader = PcapReader::new(file_in).unwrap();
///
/// while let Some(record) = pcap_reader.next_record() {
///     let record = record.unwrap();
///     // Do something with the record
/// }
/// ```
#[derive(Debug)]
pub struct PcapReader<R: Read> {
    header: PcapHeader,
    reader: R,
}

impl<R: Read> PcapReader<R> {
    /// Creates a new [`PcapReader`] from an existing reader.
    ///
    /// Parses the global pcap header immediately to verify the stream.
    ///
    /// # Errors
    /// The data stream is not in a valid pcap file format, or the
    /// underlying data is not readable.
    pub fn new(mut reader: R) -> PcapResult<PcapReader<R>> {
        let header = PcapHeader::from_reader(&mut reader)?;

        Ok(PcapReader { header, reader })
    }

    /// Consumes [`Self`], returning the wrapped reader.
    pub fn into_reader(self) -> R {
        self.reader
    }

    /// Returns the next [`PcapRecord`], or `None` at a clean end of file.
    ///
    /// A partial record header at the end of the stream is reported as
    /// [`PcapError::IncompleteBuffer`], not silently discarded.
    pub fn next_record(&mut self) -> Option<PcapResult<PcapRecord>> {
        let mut header_bytes = [0u8; 16];

        // Probe one byte first so that a clean EOF at a record boundary
        // can be told apart from a truncated header.
        match self.reader.read(&mut header_bytes[..1]) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(PcapError::IoError(e))),
        }
        if let Err(e) = self.reader.read_exact(&mut header_bytes[1..]) {
            return Some(Err(if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PcapError::IncompleteBuffer
            } else {
                PcapError::IoError(e)
            }));
        }

        let snaplen = self.header.snaplen;
        Some(match self.header.endianness {
            Endianness::Big => {
                PcapRecord::from_reader::<_, BigEndian>(&header_bytes, &mut self.reader, snaplen)
            }
            Endianness::Little => {
                PcapRecord::from_reader::<_, LittleEndian>(&header_bytes, &mut self.reader, snaplen)
            }
        })
    }

    /// Returns the global header of the pcap.
    pub fn header(&self) -> PcapHeader {
        self.header
    }
}
