use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::bridge::{contains_subsequence, Envelope};
use crate::facility::CaptureFacility;
use crate::frames::{decode, CapturedFrame, LinkType};
use crate::util::system_time_to_epoch;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A capture session is already active")]
    SessionActive,
    #[error("Port {0} is outside (0, 65535]")]
    InvalidPort(i64),
    #[error("Could not bind local UDP port {0}: {1}")]
    PortBound(u16, #[source] std::io::Error),
    #[error("Session id does not match the active session")]
    InvalidSession,
    #[error("Capture facility failure: {0}")]
    Facility(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// Monotonic per-session counters, reset on every start.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CaptureStats {
    pub bytes_captured: u64,
    pub packets_processed: u64,
    pub dropped: u64,
}

/// The writable side of [CaptureStats]: written only by the receive
/// thread, read concurrently by `stats()`.
#[derive(Debug, Default)]
struct Counters {
    bytes_captured: AtomicU64,
    packets_processed: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn reset(&self) {
        self.bytes_captured.store(0, Ordering::SeqCst);
        self.packets_processed.store(0, Ordering::SeqCst);
        self.dropped.store(0, Ordering::SeqCst);
    }

    fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            bytes_captured: self.bytes_captured.load(Ordering::SeqCst),
            packets_processed: self.packets_processed.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}

struct Listener {
    alive: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Orchestrates one live capture at a time: local datagram listener,
/// privileged facility, per-session statistics, and the drop semantics
/// shared with the forwarding side.
pub struct CaptureSessionManager {
    state: SessionState,
    session_id: Option<String>,
    link_type: LinkType,
    filter: Option<Vec<u8>>,
    counters: Arc<Counters>,
    facility: Box<dyn CaptureFacility>,
    facility_failed: Arc<AtomicBool>,
    listener: Option<Listener>,
    sink: Sender<CapturedFrame>,
}

impl CaptureSessionManager {
    pub fn new(
        facility: Box<dyn CaptureFacility>,
        link_type: LinkType,
        sink: Sender<CapturedFrame>,
    ) -> Self {
        CaptureSessionManager {
            state: SessionState::Idle,
            session_id: None,
            link_type,
            filter: None,
            counters: Arc::new(Counters::default()),
            facility,
            facility_failed: Arc::new(AtomicBool::new(false)),
            listener: None,
            sink,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start a capture session. On success the fresh opaque session id is
    /// returned and the session is Active; on any failure every part of
    /// the setup is rolled back before the error is returned.
    pub fn start(
        &mut self,
        port: i64,
        filter: Option<Vec<u8>>,
    ) -> Result<String, SessionError> {
        self.reap_failed_facility();

        if self.state == SessionState::Active {
            return Err(SessionError::SessionActive);
        }
        if port <= 0 || port > 65535 {
            return Err(SessionError::InvalidPort(port));
        }
        let port = port as u16;

        self.state = SessionState::Starting;

        let socket = match UdpSocket::bind(("127.0.0.1", port)) {
            Ok(socket) => socket,
            Err(err) => {
                self.state = SessionState::Idle;
                return Err(SessionError::PortBound(port, err));
            }
        };
        socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .expect("A non-zero read timeout is always accepted");

        self.facility_failed.store(false, Ordering::SeqCst);
        if let Err(message) =
            self.facility
                .start(port, filter.as_deref(), self.facility_failed.clone())
        {
            // Rollback: the bound socket is dropped here, nothing else
            // has been set up yet.
            drop(socket);
            self.state = SessionState::Idle;
            return Err(SessionError::Facility(message));
        }

        self.counters.reset();
        self.filter = filter;

        let session_id = Uuid::new_v4().to_string();
        let alive = Arc::new(AtomicBool::new(true));
        let handle = spawn_receive_loop(
            socket,
            alive.clone(),
            self.counters.clone(),
            self.filter.clone(),
            self.link_type,
            self.sink.clone(),
        );

        self.listener = Some(Listener { alive, handle });
        self.session_id = Some(session_id.clone());
        self.state = SessionState::Active;
        info!("Capture session {session_id} active on 127.0.0.1:{port}");

        Ok(session_id)
    }

    /// Stop the session with the given id. A stale or unknown id is a
    /// no-op, not an error.
    pub fn stop(&mut self, session_id: &str) {
        self.reap_failed_facility();

        if self.session_id.as_deref() != Some(session_id) {
            debug!("stop() for inactive session {session_id} ignored");
            return;
        }

        self.state = SessionState::Stopping;
        // The local listener closes before the upstream facility is torn
        // down, so nothing is processed on a half-closed pipe.
        self.close_listener();
        self.facility.stop();

        self.counters.reset();
        self.filter = None;
        self.session_id = None;
        self.state = SessionState::Idle;
        info!("Capture session {session_id} stopped");
    }

    /// Snapshot the counters of the active session.
    pub fn stats(&mut self, session_id: &str) -> Result<CaptureStats, SessionError> {
        self.reap_failed_facility();

        if self.state != SessionState::Active
            || self.session_id.as_deref() != Some(session_id)
        {
            return Err(SessionError::InvalidSession);
        }
        Ok(self.counters.snapshot())
    }

    /// An asynchronous facility failure invalidates the running session:
    /// the old id must behave as unknown from now on.
    fn reap_failed_facility(&mut self) {
        if self.facility_failed.swap(false, Ordering::SeqCst) {
            if let Some(session_id) = self.session_id.take() {
                warn!("Capture facility died, invalidating session {session_id}");
                self.close_listener();
                self.facility.stop();
                self.counters.reset();
                self.filter = None;
                self.state = SessionState::Idle;
            }
        }
    }

    fn close_listener(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.alive.store(false, Ordering::SeqCst);
            if listener.handle.join().is_err() {
                warn!("Receive thread panicked during shutdown");
            }
        }
    }
}

impl Drop for CaptureSessionManager {
    fn drop(&mut self) {
        if let Some(session_id) = self.session_id.clone() {
            self.stop(&session_id);
        }
    }
}

fn spawn_receive_loop(
    socket: UdpSocket,
    alive: Arc<AtomicBool>,
    counters: Arc<Counters>,
    filter: Option<Vec<u8>>,
    link_type: LinkType,
    sink: Sender<CapturedFrame>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = vec![0u8; 65536];
        while alive.load(Ordering::SeqCst) {
            let len = match socket.recv(&mut buf) {
                Ok(len) => len,
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(err) => {
                    warn!("Receive loop terminating: {err}");
                    break;
                }
            };

            process_datagram(&buf[..len], &counters, filter.as_deref(), link_type, &sink);
        }
    })
}

/// Handle one inbound datagram: either a length-framed envelope or, if
/// envelope parsing fails, a raw frame run through the decoder directly.
///
/// Drop semantics (shared with the forwarding side): empty, filtered-out
/// and undecodable payloads increment `dropped` only; everything else
/// counts toward `bytes_captured`/`packets_processed` and reaches the sink.
fn process_datagram(
    datagram: &[u8],
    counters: &Counters,
    filter: Option<&[u8]>,
    link_type: LinkType,
    sink: &Sender<CapturedFrame>,
) {
    let (id, timestamp, payload) = match Envelope::decode(datagram) {
        Ok(envelope) => match envelope.payload_bytes() {
            Ok(payload) => (
                envelope.id,
                envelope.timestamp as f64 / 1000.0,
                payload,
            ),
            Err(err) => {
                debug!("Envelope with undecodable payload dropped: {err}");
                counters.dropped.fetch_add(1, Ordering::SeqCst);
                return;
            }
        },
        // Not an envelope; treat the whole datagram as one raw frame.
        Err(_) => (
            CapturedFrame::fresh_id(),
            system_time_to_epoch(SystemTime::now()),
            datagram.to_vec(),
        ),
    };

    if payload.is_empty() {
        counters.dropped.fetch_add(1, Ordering::SeqCst);
        return;
    }
    if let Some(filter) = filter {
        if !contains_subsequence(&payload, filter) {
            counters.dropped.fetch_add(1, Ordering::SeqCst);
            return;
        }
    }

    let Some(decoded) = decode(&payload, link_type) else {
        counters.dropped.fetch_add(1, Ordering::SeqCst);
        return;
    };

    counters
        .bytes_captured
        .fetch_add(payload.len() as u64, Ordering::SeqCst);
    counters.packets_processed.fetch_add(1, Ordering::SeqCst);

    let frame = decoded.into_captured(id, timestamp, link_type, payload);
    if sink.send(frame).is_err() {
        debug!("Packet sink disconnected");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::facility::ExternalFacility;

    fn manager() -> (CaptureSessionManager, mpsc::Receiver<CapturedFrame>) {
        let (tx, rx) = mpsc::channel();
        (
            CaptureSessionManager::new(
                Box::new(ExternalFacility::new()),
                LinkType::Ieee80211Radio,
                tx,
            ),
            rx,
        )
    }

    #[test]
    fn test_invalid_ports() {
        let (mut manager, _rx) = manager();
        assert!(matches!(
            manager.start(-1, None),
            Err(SessionError::InvalidPort(-1))
        ));
        assert!(matches!(
            manager.start(0, None),
            Err(SessionError::InvalidPort(0))
        ));
        assert!(matches!(
            manager.start(70000, None),
            Err(SessionError::InvalidPort(70000))
        ));
        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let (mut manager, _rx) = manager();
        let id = manager.start(40411, None).unwrap();
        assert!(matches!(
            manager.start(40412, None),
            Err(SessionError::SessionActive)
        ));
        // The first session stays intact.
        assert!(manager.stats(&id).is_ok());
        manager.stop(&id);
    }

    #[test]
    fn test_stats_with_wrong_id() {
        let (mut manager, _rx) = manager();
        let id = manager.start(40413, None).unwrap();
        assert!(matches!(
            manager.stats("not-the-session"),
            Err(SessionError::InvalidSession)
        ));
        assert!(manager.stats(&id).is_ok());
        manager.stop(&id);
        assert!(matches!(
            manager.stats(&id),
            Err(SessionError::InvalidSession)
        ));
    }

    #[test]
    fn test_stop_with_wrong_id_is_a_noop() {
        let (mut manager, _rx) = manager();
        let id = manager.start(40414, None).unwrap();
        manager.stop("someone-else");
        assert_eq!(manager.state(), SessionState::Active);
        manager.stop(&id);
        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[test]
    fn test_empty_payload_counts_as_dropped() {
        let (tx, _rx) = mpsc::channel();
        let counters = Counters::default();
        process_datagram(&[], &counters, None, LinkType::Ieee80211Radio, &tx);
        let stats = counters.snapshot();
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.packets_processed, 0);
        assert_eq!(stats.bytes_captured, 0);
    }

    #[test]
    fn test_filtered_out_payload_counts_as_dropped() {
        let (tx, _rx) = mpsc::channel();
        let counters = Counters::default();
        process_datagram(
            &[0x01, 0x02, 0x03],
            &counters,
            Some(&[0xFF]),
            LinkType::Ieee80211Radio,
            &tx,
        );
        assert_eq!(counters.snapshot().dropped, 1);
        assert_eq!(counters.snapshot().packets_processed, 0);
    }
}
