use thiserror::Error;

/// Errors that can occur while enumerating, opening, streaming or writing audio.
///
/// `Clone + PartialEq` so a failure can be stored in `CaptureState::Failed`
/// and compared in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    #[error("failed to open media source: {0}")]
    SourceOpen(String),

    #[error("format negotiation failed: {0}")]
    FormatNegotiation(String),

    #[error("error reading audio: {0}")]
    Read(String),

    #[error("container I/O error: {0}")]
    ContainerIo(String),

    #[error("unsupported sample width: {0} bytes")]
    UnsupportedSampleWidth(usize),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("session has been disposed")]
    Disposed,
}
