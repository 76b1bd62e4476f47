use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use shakedown::analysis::HandshakeAnalyzer;
use shakedown::bridge::FrameForwarder;
use shakedown::codec::{export_handshake, import_pcap, ExportFormat, ExportOptions};
use shakedown::engine::{CaptureEngine, EngineEvent};
use shakedown::facility::{CaptureFacility, ExternalFacility, HelperProcessFacility};
use shakedown::frames::{CapturedFrame, LinkType};
use shakedown::util::system_time_to_epoch;

#[derive(Parser)]
#[command(name = "shakedown", version, about = "WPA/WPA2 handshake capture and analysis engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live capture session and analyze handshakes as they arrive.
    Capture {
        /// Local UDP port the privileged facility forwards frames to.
        #[arg(short, long, default_value_t = 19371)]
        port: i64,
        /// Byte filter: a hex string with 0x prefix, or literal bytes.
        #[arg(short, long)]
        filter: Option<String>,
        /// Helper command to spawn as the privileged capture facility.
        /// Without it, an external forwarder is expected on the port.
        #[arg(long)]
        facility_cmd: Option<String>,
        /// Directory completed handshakes are exported into.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Export the capture-file format instead of the JSON document.
        #[arg(long)]
        pcap: bool,
        /// Gzip the export artifact.
        #[arg(long)]
        gzip: bool,
    },
    /// Import a tethered capture file and analyze its frames.
    Import {
        /// Capture file in the classic pcap format.
        file: PathBuf,
        #[arg(short, long)]
        filter: Option<String>,
        /// Export completed handshakes into this directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        pcap: bool,
        #[arg(long)]
        gzip: bool,
    },
    /// Replay a capture file through the datagram bridge, acting as the
    /// forwarding side for a running capture session.
    Forward {
        /// Capture file in the classic pcap format.
        file: PathBuf,
        /// Target UDP port of the running session.
        #[arg(short, long, default_value_t = 19371)]
        port: u16,
        #[arg(short, long)]
        filter: Option<String>,
        /// Frames per second to replay at; 0 replays as fast as possible.
        #[arg(long, default_value_t = 200)]
        rate: u32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Capture {
            port,
            filter,
            facility_cmd,
            output_dir,
            pcap,
            gzip,
        } => run_capture(port, filter, facility_cmd, output_dir, pcap, gzip),
        Commands::Import {
            file,
            filter,
            output_dir,
            pcap,
            gzip,
        } => run_import(file, filter, output_dir, pcap, gzip),
        Commands::Forward {
            file,
            port,
            filter,
            rate,
        } => run_forward(file, port, filter, rate),
    }
}

fn run_capture(
    port: i64,
    filter: Option<String>,
    facility_cmd: Option<String>,
    output_dir: PathBuf,
    pcap: bool,
    gzip: bool,
) -> Result<()> {
    let facility: Box<dyn CaptureFacility> = match facility_cmd {
        Some(command) => Box::new(HelperProcessFacility::new(command)),
        None => Box::new(ExternalFacility::new()),
    };

    let mut engine = CaptureEngine::new(facility, LinkType::Ieee80211Radio);
    let events = engine.subscribe();

    let session_id = engine
        .start_capture(port, filter.as_deref().map(parse_filter))
        .context("Could not start the capture session")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = running.clone();
    ctrlc::set_handler(move || {
        running_flag.store(false, Ordering::SeqCst);
    })
    .context("Could not install the interrupt handler")?;

    let options = export_options(pcap, gzip);
    info!("Capturing on 127.0.0.1:{port}; press ctrl-c to stop");

    while running.load(Ordering::SeqCst) {
        engine.pump();
        while let Ok(event) = events.try_recv() {
            if let EngineEvent::HandshakeComplete(handshake) = event {
                match export_handshake(&handshake, &options, &output_dir) {
                    Ok(path) => info!("Wrote {}", path.display()),
                    Err(err) => warn!("Export failed: {err}"),
                }
            }
        }
        thread::sleep(Duration::from_millis(50));
    }

    if let Ok(stats) = engine.stats(&session_id) {
        info!(
            "Session totals: {} bytes, {} packets, {} dropped",
            stats.bytes_captured, stats.packets_processed, stats.dropped
        );
    }
    engine.stop_capture(&session_id);
    Ok(())
}

fn run_import(
    file: PathBuf,
    filter: Option<String>,
    output_dir: Option<PathBuf>,
    pcap: bool,
    gzip: bool,
) -> Result<()> {
    let filter = filter.as_deref().map(parse_filter);
    let summary = import_pcap(&file, filter.as_deref())
        .with_context(|| format!("Could not import {}", file.display()))?;

    println!(
        "{}: {} records processed, {} dropped",
        file.display(),
        summary.processed,
        summary.dropped
    );

    let mut analyzer = HandshakeAnalyzer::new();
    let mut completed = Vec::new();
    for frame in &summary.frames {
        if let Some(handshake) = analyzer.ingest(frame) {
            completed.push(handshake);
        }
    }

    if completed.is_empty() {
        println!("No complete handshakes found");
        return Ok(());
    }

    let options = export_options(pcap, gzip);
    for handshake in &completed {
        let quality = HandshakeAnalyzer::quality(handshake);
        println!(
            "{} / {}: {} {} (crackable: {}, complexity: {}, quality: {})",
            handshake.bssid,
            handshake.client,
            handshake.security_type,
            handshake.pairwise_cipher,
            handshake.crackable,
            handshake.crack_complexity,
            quality.score
        );
        for issue in &quality.issues {
            println!("  - {issue}");
        }
        if let Some(dir) = &output_dir {
            let path = export_handshake(handshake, &options, dir)?;
            println!("  exported to {}", path.display());
        }
    }
    Ok(())
}

fn run_forward(file: PathBuf, port: u16, filter: Option<String>, rate: u32) -> Result<()> {
    let summary = import_pcap(&file, None)
        .with_context(|| format!("Could not read {}", file.display()))?;
    let Some(link_type) = summary.link_type else {
        bail!("Capture file declared no usable link type");
    };

    let target = format!("127.0.0.1:{port}").parse()?;
    let mut forwarder = FrameForwarder::new(target, link_type, filter.as_deref().map(parse_filter))
        .context("Could not open the forwarding socket")?;

    let delay = if rate > 0 {
        Some(Duration::from_secs(1) / rate)
    } else {
        None
    };

    for frame in &summary.frames {
        let timestamp_ms = (system_time_to_epoch(SystemTime::now()) * 1000.0) as u64;
        forwarder.forward(CapturedFrame::fresh_id(), timestamp_ms, &frame.raw)?;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
    }

    println!(
        "Replayed {} frames to {target} ({} dropped by the filter)",
        forwarder.forwarded(),
        forwarder.dropped()
    );
    Ok(())
}

fn export_options(pcap: bool, gzip: bool) -> ExportOptions {
    ExportOptions {
        format: if pcap {
            ExportFormat::Pcap
        } else {
            ExportFormat::Json
        },
        compress: gzip,
        ..Default::default()
    }
}

/// A `0x`-prefixed argument is hex; anything else is matched literally.
fn parse_filter(arg: &str) -> Vec<u8> {
    if let Some(hex_str) = arg.strip_prefix("0x") {
        hex::decode(hex_str).unwrap_or_else(|_| arg.as_bytes().to_vec())
    } else {
        arg.as_bytes().to_vec()
    }
}
