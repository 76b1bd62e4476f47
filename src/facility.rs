use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{info, warn};

/// The privileged capture facility: a host-managed process that reads
/// link-layer frames and forwards them as envelopes over UDP to the
/// analysis side.
///
/// `start` receives the local UDP port the facility must target and the
/// byte filter it should apply before transmission; `failed` is raised by
/// the implementation if the facility dies while a session is active, so
/// the session manager can invalidate the session asynchronously.
pub trait CaptureFacility: Send {
    fn start(
        &mut self,
        udp_port: u16,
        filter: Option<&[u8]>,
        failed: Arc<AtomicBool>,
    ) -> Result<(), String>;

    /// Cease forwarding and release whatever tunnel or network
    /// configuration the facility established. Must be idempotent.
    fn stop(&mut self);
}

/// A facility implemented as an external helper command, spawned with the
/// UDP port and filter as arguments. A watcher thread raises the failure
/// flag if the helper exits while the session is supposed to be running.
pub struct HelperProcessFacility {
    command: String,
    child: Option<Child>,
    stopping: Arc<AtomicBool>,
}

impl HelperProcessFacility {
    pub fn new(command: impl Into<String>) -> Self {
        HelperProcessFacility {
            command: command.into(),
            child: None,
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CaptureFacility for HelperProcessFacility {
    fn start(
        &mut self,
        udp_port: u16,
        filter: Option<&[u8]>,
        failed: Arc<AtomicBool>,
    ) -> Result<(), String> {
        let mut command = Command::new(&self.command);
        command
            .arg("--udp-port")
            .arg(udp_port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        if let Some(filter) = filter {
            command.arg("--filter").arg(hex::encode(filter));
        }

        let mut child = command
            .spawn()
            .map_err(|err| format!("Failed to spawn capture helper '{}': {err}", self.command))?;
        info!("Capture helper '{}' started (pid {})", self.command, child.id());

        self.stopping.store(false, Ordering::SeqCst);
        let stopping = self.stopping.clone();
        let pid = child.id();
        self.child = Some(child);

        // The Child handle stays with the facility so stop can kill it;
        // the watcher polls the process table instead of waiting on it.
        thread::spawn(move || {
            while !stopping.load(Ordering::SeqCst) {
                if !process_alive(pid) {
                    if !stopping.load(Ordering::SeqCst) {
                        warn!("Capture helper exited unexpectedly (pid {pid})");
                        failed.store(true, Ordering::SeqCst);
                    }
                    return;
                }
                thread::sleep(Duration::from_millis(200));
            }
        });

        Ok(())
    }

    fn stop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                warn!("Could not kill capture helper: {err}");
            }
            let _ = child.wait();
            info!("Capture helper stopped");
        }
    }
}

impl Drop for HelperProcessFacility {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// A facility that manages nothing. Used when the forwarding side is
/// driven externally, e.g. by the `forward` subcommand or by tests that
/// send datagrams themselves.
#[derive(Default)]
pub struct ExternalFacility {
    running: bool,
}

impl ExternalFacility {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureFacility for ExternalFacility {
    fn start(
        &mut self,
        udp_port: u16,
        _filter: Option<&[u8]>,
        _failed: Arc<AtomicBool>,
    ) -> Result<(), String> {
        info!("Expecting an external forwarder on 127.0.0.1:{udp_port}");
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}
