mod common;

use std::fs::File;
use std::io::Read;

use flate2::read::GzDecoder;

use common::full_exchange;
use shakedown::analysis::HandshakeAnalyzer;
use shakedown::codec::{
    export_document, export_handshake, import_pcap, serialize_pcap, ExportFormat, ExportOptions,
};

#[test]
fn test_pcap_export_reimport_is_lossless() {
    let frames = full_exchange(1_700_000_000.0);
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();

    let directory = tempfile::tempdir().unwrap();
    let options = ExportOptions {
        format: ExportFormat::Pcap,
        compress: false,
        ..Default::default()
    };
    let path = export_handshake(&handshake, &options, directory.path()).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("handshake_AABBCCDDEEFF_"));
    assert!(name.ends_with(".pcap"));

    let summary = import_pcap(&path, None).unwrap();
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.dropped, 0);

    let exported_raw: Vec<&Vec<u8>> = handshake.packets.iter().map(|f| &f.raw).collect();
    let imported_raw: Vec<&Vec<u8>> = summary.frames.iter().map(|f| &f.raw).collect();
    assert_eq!(exported_raw, imported_raw);

    // The re-imported frames carry a complete handshake again.
    assert!(HandshakeAnalyzer::analyze(&summary.frames).is_some());
}

#[test]
fn test_gzip_export_roundtrips() {
    let handshake = HandshakeAnalyzer::analyze(&full_exchange(1_700_000_000.0)).unwrap();

    let directory = tempfile::tempdir().unwrap();
    let options = ExportOptions {
        format: ExportFormat::Pcap,
        compress: true,
        ..Default::default()
    };
    let path = export_handshake(&handshake, &options, directory.path()).unwrap();
    assert!(path.to_string_lossy().ends_with(".pcap.gz"));

    let mut decompressed = Vec::new();
    GzDecoder::new(File::open(&path).unwrap())
        .read_to_end(&mut decompressed)
        .unwrap();
    assert_eq!(decompressed, serialize_pcap(&handshake.packets).unwrap());
}

#[test]
fn test_json_document_contents() {
    let handshake = HandshakeAnalyzer::analyze(&full_exchange(1_700_000_000.0)).unwrap();
    let options = ExportOptions::default();
    let document = export_document(&handshake, &options);

    assert_eq!(document["bssid"], "AA:BB:CC:DD:EE:FF");
    assert_eq!(document["client"], "11:22:33:44:55:66");
    assert_eq!(document["security"]["type"], "Wpa2");
    assert_eq!(document["security"]["pairwise_cipher"], "CCMP");
    assert_eq!(document["security"]["crackable"], true);
    assert_eq!(document["security"]["crack_complexity"], "Medium");
    assert_eq!(document["analysis"]["score"], 100);
    assert_eq!(document["analysis"]["mic_lengths_ok"], true);
    assert_eq!(document["packets"].as_array().unwrap().len(), 4);

    // Raw packets can be omitted.
    let options = ExportOptions {
        include_raw_packets: false,
        ..Default::default()
    };
    let document = export_document(&handshake, &options);
    assert!(document.get("packets").is_none());
}

#[test]
fn test_import_filter_and_missing_file() {
    let frames = full_exchange(0.0);
    let handshake = HandshakeAnalyzer::analyze(&frames).unwrap();

    let directory = tempfile::tempdir().unwrap();
    let options = ExportOptions {
        format: ExportFormat::Pcap,
        compress: false,
        ..Default::default()
    };
    let path = export_handshake(&handshake, &options, directory.path()).unwrap();

    // A filter that matches nothing drops every record without error.
    let summary = import_pcap(&path, Some(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01])).unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.dropped, 4);

    // Missing files surface as open errors, not panics.
    assert!(import_pcap(directory.path().join("nope.pcap").as_path(), None).is_err());
}
