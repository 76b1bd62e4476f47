use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;

use crate::analysis::{HandshakeAnalyzer, ParsedHandshake};
use crate::facility::CaptureFacility;
use crate::frames::{CapturedFrame, LinkType};
use crate::session::{CaptureSessionManager, CaptureStats, SessionError};

/// The two event kinds the UI layer consumes.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    PacketCaptured(CapturedFrame),
    HandshakeComplete(ParsedHandshake),
}

/// The explicitly constructed engine object: owns the capture session,
/// the per-pair handshake state, and the outbound event channels.
/// Lifetime and teardown are entirely caller-controlled.
pub struct CaptureEngine {
    manager: CaptureSessionManager,
    analyzer: HandshakeAnalyzer,
    frames: Receiver<CapturedFrame>,
    subscribers: Vec<Sender<EngineEvent>>,
}

impl CaptureEngine {
    pub fn new(facility: Box<dyn CaptureFacility>, link_type: LinkType) -> Self {
        let (sink, frames) = mpsc::channel();
        CaptureEngine {
            manager: CaptureSessionManager::new(facility, link_type, sink),
            analyzer: HandshakeAnalyzer::new(),
            frames,
            subscribers: Vec::new(),
        }
    }

    /// Register an event consumer. Disconnected subscribers are pruned on
    /// the next emission.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn start_capture(
        &mut self,
        port: i64,
        filter: Option<Vec<u8>>,
    ) -> Result<String, SessionError> {
        self.manager.start(port, filter)
    }

    pub fn stop_capture(&mut self, session_id: &str) {
        self.manager.stop(session_id);
    }

    pub fn stats(&mut self, session_id: &str) -> Result<CaptureStats, SessionError> {
        self.manager.stats(session_id)
    }

    /// Drain frames queued by the receive thread, in arrival order, and
    /// run each through the analyzer. Returns how many frames were
    /// processed this call.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(frame) = self.frames.try_recv() {
            processed += 1;
            let completed = self.analyzer.ingest(&frame);
            self.emit(EngineEvent::PacketCaptured(frame));
            if let Some(handshake) = completed {
                self.emit(EngineEvent::HandshakeComplete(handshake));
            }
        }
        processed
    }

    /// Feed frames that did not come through a live session, e.g. from a
    /// capture-file import.
    pub fn ingest_frames(&mut self, frames: &[CapturedFrame]) -> Vec<ParsedHandshake> {
        let mut completed = Vec::new();
        for frame in frames {
            let result = self.analyzer.ingest(frame);
            self.emit(EngineEvent::PacketCaptured(frame.clone()));
            if let Some(handshake) = result {
                self.emit(EngineEvent::HandshakeComplete(handshake.clone()));
                completed.push(handshake);
            }
        }
        completed
    }

    pub fn handshakes(&self) -> Vec<&ParsedHandshake> {
        self.analyzer.completed_handshakes().collect()
    }

    fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|subscriber| {
            let delivered = subscriber.send(event.clone()).is_ok();
            if !delivered {
                debug!("Dropping disconnected event subscriber");
            }
            delivered
        });
    }
}
