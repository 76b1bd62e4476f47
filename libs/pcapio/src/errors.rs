use thiserror::Error;

/// Result type for pcap parsing and writing
pub type PcapResult<T> = Result<T, PcapError>;

/// Error type for pcap parsing and writing
#[derive(Error, Debug)]
pub enum PcapError {
    /// Buffer too small
    #[error("Need more bytes")]
    IncompleteBuffer,

    /// Generic IO error
    #[error("Error reading bytes")]
    IoError(#[source] std::io::Error),

    /// Invalid field
    #[error("Invalid field value: {0}")]
    InvalidField(&'static str),
}

impl From<std::io::Error> for PcapError {
    fn from(err: std::io::Error) -> Self {
        PcapError::IoError(err)
    }
}
