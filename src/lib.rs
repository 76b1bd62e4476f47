/// Handshake reassembly and security scoring.
pub mod analysis;
/// The UDP datagram bridge shared by both sides of the capture boundary.
pub mod bridge;
/// Capture-file import and export.
pub mod codec;
/// The engine object tying session, analyzer and event stream together.
pub mod engine;
/// The privileged capture facility boundary.
pub mod facility;
/// Captured frames and the decode shim in front of [wlanframe].
pub mod frames;
/// Live capture session lifecycle and statistics.
pub mod session;
pub mod util;
