use std::io::{Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::*;
use crate::{DataLink, Endianness};

/// The pcap magic for microsecond timestamp resolution.
pub const PCAP_MAGIC: u32 = 0xA1B2C3D4;

/// Pcap global header: 24 bytes in front of every capture file.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PcapHeader {
    /// Major version number, 2 since 1998
    pub version_major: u16,

    /// Minor version number, 4 since 1998
    pub version_minor: u16,

    /// GMT to local timezone correction, should always be 0
    pub ts_correction: i32,

    /// Timestamp accuracy, should always be 0
    pub ts_accuracy: u32,

    /// Max length of captured packet, typically 65535
    pub snaplen: u32,

    /// DataLink type (first layer in the packet)
    pub datalink: DataLink,

    /// Endianness of the file (excluding the packet data)
    pub endianness: Endianness,
}

impl PcapHeader {
    /// Reads a [`PcapHeader`] from a reader.
    ///
    /// The magic number decides the endianness of everything that follows.
    /// Returns [`PcapError::InvalidField`] on an unrecognized magic.
    pub fn from_reader<R: Read>(reader: &mut R) -> PcapResult<PcapHeader> {
        let magic = reader.read_u32::<BigEndian>()?;

        match magic {
            PCAP_MAGIC => read_fields::<_, BigEndian>(reader, Endianness::Big),
            m if m == PCAP_MAGIC.swap_bytes() => {
                read_fields::<_, LittleEndian>(reader, Endianness::Little)
            }
            _ => Err(PcapError::InvalidField("PcapHeader: wrong magic number")),
        }
    }

    /// Writes a [`PcapHeader`] to a writer.
    ///
    /// Uses the endianness of the header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> PcapResult<usize> {
        return match self.endianness {
            Endianness::Big => write_fields::<_, BigEndian>(self, writer),
            Endianness::Little => write_fields::<_, LittleEndian>(self, writer),
        };

        fn write_fields<W: Write, B: ByteOrder>(
            header: &PcapHeader,
            writer: &mut W,
        ) -> PcapResult<usize> {
            writer.write_u32::<B>(PCAP_MAGIC)?;
            writer.write_u16::<B>(header.version_major)?;
            writer.write_u16::<B>(header.version_minor)?;
            writer.write_i32::<B>(header.ts_correction)?;
            writer.write_u32::<B>(header.ts_accuracy)?;
            writer.write_u32::<B>(header.snaplen)?;
            writer.write_u32::<B>(header.datalink.into())?;

            Ok(24)
        }
    }
}

fn read_fields<R: Read, B: ByteOrder>(
    reader: &mut R,
    endianness: Endianness,
) -> PcapResult<PcapHeader> {
    Ok(PcapHeader {
        version_major: reader.read_u16::<B>()?,
        version_minor: reader.read_u16::<B>()?,
        ts_correction: reader.read_i32::<B>()?,
        ts_accuracy: reader.read_u32::<B>()?,
        snaplen: reader.read_u32::<B>()?,
        datalink: DataLink::from(reader.read_u32::<B>()?),
        endianness,
    })
}

/// Creates a new [`PcapHeader`]: version 2.4, snaplen 65535,
/// radiotap link type, little endian.
impl Default for PcapHeader {
    fn default() -> Self {
        PcapHeader {
            version_major: 2,
            version_minor: 4,
            ts_correction: 0,
            ts_accuracy: 0,
            snaplen: 65535,
            datalink: DataLink::Ieee80211Radiotap,
            endianness: Endianness::Little,
        }
    }
}
