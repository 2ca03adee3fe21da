use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the savefile reader
    #[error("Savefile error: {0}")]
    SavefileError(#[from] pcap_file::PcapError),

    /// Error from the live capture library
    #[cfg(feature = "live")]
    #[error("PCAP error: {0}")]
    PcapError(#[from] pcap::Error),

    /// Error from JSON configuration parsing
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),

    /// Error from capture operations
    #[error("Capture error: {0}")]
    CaptureError(String),

    /// Error while writing the rendered report
    #[error("Render error: {0}")]
    RenderError(String),
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
