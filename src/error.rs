//! Error types for the photo-booth core.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Vendor camera SDK could not be loaded or no camera answered
    #[error("Camera bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// A call into the camera bridge returned a failure code
    #[error("Camera bridge error: {0}")]
    Bridge(String),

    /// Operation needs an open camera handle and none is open
    #[error("No camera handle is open")]
    NoCameraHandle,

    /// A bounded wait elapsed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Landmark detector failed on a frame
    #[error("Detector error: {0}")]
    Detector(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Acquisition worker thread could not be spawned or went away
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
