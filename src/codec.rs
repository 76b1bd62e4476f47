use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use serde_json::json;
use thiserror::Error;

use pcapio::{DataLink, PcapHeader, PcapReader, PcapRecord, PcapWriter};

use crate::analysis::{HandshakeAnalyzer, ParsedHandshake};
use crate::bridge::contains_subsequence;
use crate::frames::{decode, CapturedFrame, LinkType};
use crate::util::{epoch_to_filename_stamp, epoch_to_system_time, system_time_to_iso8601};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Could not open capture file: {0}")]
    Open(#[source] std::io::Error),
    #[error("Not a valid capture file: {0}")]
    Format(#[source] pcapio::PcapError),
    #[error("Capture file declares unsupported link type {0}")]
    UnsupportedLinkType(u32),
    #[error("Could not write export artifact: {0}")]
    Write(#[source] std::io::Error),
}

/// The outcome of importing a capture file: decoded frames plus the
/// processed/dropped bookkeeping of the run.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub link_type: Option<LinkType>,
    pub processed: u64,
    pub dropped: u64,
    pub frames: Vec<CapturedFrame>,
}

/// Import a third-party capture file.
///
/// File-open and format errors abort the import; a decode failure on a
/// single record is only counted as dropped and the remaining records
/// are still read.
pub fn import_pcap(path: &Path, filter: Option<&[u8]>) -> Result<ImportSummary, CodecError> {
    let file = File::open(path).map_err(CodecError::Open)?;
    let mut reader = PcapReader::new(file).map_err(CodecError::Format)?;

    let link_type = match reader.header().datalink {
        DataLink::Raw => LinkType::Ip,
        DataLink::Ieee80211Radiotap => LinkType::Ieee80211Radio,
        DataLink::Unknown(value) => return Err(CodecError::UnsupportedLinkType(value)),
    };

    let mut summary = ImportSummary {
        link_type: Some(link_type),
        ..Default::default()
    };

    while let Some(record) = reader.next_record() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                // The stream position is unreliable after a bad record
                // header; count it and stop reading.
                warn!("Capture file truncated or corrupt after record {}: {err}", summary.processed);
                summary.dropped += 1;
                break;
            }
        };

        if let Some(filter) = filter {
            if !contains_subsequence(&record.data, filter) {
                summary.dropped += 1;
                continue;
            }
        }

        let Some(decoded) = decode(&record.data, link_type) else {
            debug!("Undecodable record dropped during import");
            summary.dropped += 1;
            continue;
        };

        summary.processed += 1;
        summary.frames.push(decoded.into_captured(
            CapturedFrame::fresh_id(),
            record.timestamp.as_secs_f64(),
            link_type,
            record.data,
        ));
    }

    info!(
        "Imported {} ({} records, {} dropped)",
        path.display(),
        summary.processed,
        summary.dropped
    );
    Ok(summary)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExportFormat {
    /// A structured JSON document with metadata and analysis.
    Json,
    /// The capture-file wire format.
    Pcap,
}

#[derive(Copy, Clone, Debug)]
pub struct ExportOptions {
    pub include_raw_packets: bool,
    pub include_analysis: bool,
    pub format: ExportFormat,
    pub compress: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            include_raw_packets: true,
            include_analysis: true,
            format: ExportFormat::Json,
            compress: false,
        }
    }
}

/// Export a completed handshake into `directory`, returning the path of
/// the written artifact. The filename pattern is
/// `handshake_<bssid-no-colons>_<ISO8601-with-dashes>.<ext>`.
pub fn export_handshake(
    handshake: &ParsedHandshake,
    options: &ExportOptions,
    directory: &Path,
) -> Result<PathBuf, CodecError> {
    let extension = match (options.format, options.compress) {
        (ExportFormat::Json, false) => "json",
        (ExportFormat::Json, true) => "json.gz",
        (ExportFormat::Pcap, false) => "pcap",
        (ExportFormat::Pcap, true) => "pcap.gz",
    };
    let filename = format!(
        "handshake_{}_{}.{}",
        handshake.bssid.to_flat_string(),
        epoch_to_filename_stamp(handshake.timestamp),
        extension
    );
    let path = directory.join(filename);

    let body = match options.format {
        ExportFormat::Json => {
            let document = export_document(handshake, options);
            serde_json::to_vec_pretty(&document).expect("Export document is valid JSON")
        }
        ExportFormat::Pcap => {
            serialize_pcap(&handshake.packets).map_err(codec_write_error)?
        }
    };

    let file = File::create(&path).map_err(CodecError::Write)?;
    if options.compress {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&body).map_err(CodecError::Write)?;
        encoder.finish().map_err(CodecError::Write)?;
    } else {
        let mut file = file;
        file.write_all(&body).map_err(CodecError::Write)?;
    }

    info!("Exported handshake to {}", path.display());
    Ok(path)
}

/// Build the structured export document.
pub fn export_document(
    handshake: &ParsedHandshake,
    options: &ExportOptions,
) -> serde_json::Value {
    let mut document = json!({
        "bssid": handshake.bssid.to_string(),
        "client": handshake.client.to_string(),
        "timestamp": handshake.timestamp,
        "captured_at": system_time_to_iso8601(epoch_to_system_time(handshake.timestamp)),
        "channel": handshake.channel,
        "signal_dbm": handshake.signal_dbm,
        "security": {
            "type": handshake.security_type.to_string(),
            "key_version": handshake.key_version,
            "group_cipher": handshake.group_cipher.clone(),
            "pairwise_cipher": handshake.pairwise_cipher.clone(),
            "auth_key_management": handshake.auth_key_management.clone(),
            "crackable": handshake.crackable,
            "crack_complexity": handshake.crack_complexity.to_string(),
        },
    });

    if options.include_analysis {
        let quality = HandshakeAnalyzer::quality(handshake);
        document["analysis"] = serde_json::to_value(&quality)
            .expect("Quality report is valid JSON");
    }

    if options.include_raw_packets {
        document["packets"] = handshake
            .packets
            .iter()
            .map(|frame| {
                json!({
                    "id": frame.id.clone(),
                    "timestamp": frame.timestamp,
                    "message": frame.headers.eapol_message,
                    "preview": frame.preview.clone(),
                    "raw": hex::encode(&frame.raw),
                })
            })
            .collect();
    }

    document
}

/// Serialize frames into the capture-file wire format: the 24-byte
/// global header followed by one 16-byte record header plus raw bytes
/// per frame.
pub fn serialize_pcap(frames: &[CapturedFrame]) -> Result<Vec<u8>, pcapio::PcapError> {
    let datalink = match frames.first().map(|frame| frame.link_type) {
        Some(LinkType::Ip) => DataLink::Raw,
        _ => DataLink::Ieee80211Radiotap,
    };
    let header = PcapHeader {
        datalink,
        ..Default::default()
    };

    let mut buf = Vec::new();
    let mut writer = PcapWriter::with_header(&mut buf, header)?;
    for frame in frames {
        let record = PcapRecord::new(
            std::time::Duration::from_secs_f64(frame.timestamp.max(0.0)),
            frame.raw.clone(),
        );
        writer.write_record(&record)?;
    }
    drop(writer);
    Ok(buf)
}

fn codec_write_error(err: pcapio::PcapError) -> CodecError {
    match err {
        pcapio::PcapError::IoError(io) => CodecError::Write(io),
        other => CodecError::Write(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            other.to_string(),
        )),
    }
}
