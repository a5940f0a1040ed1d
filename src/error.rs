//! Error types for chime
//!
//! Defines engine-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the chime audio engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio output device errors
    #[error("Audio device error: {0}")]
    Device(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Resource bundle errors
    #[error("Resource error: {0}")]
    Resource(String),

    /// Malformed raw wave data
    #[error("Invalid wave data: {0}")]
    InvalidWave(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using chime Error
pub type Result<T> = std::result::Result<T, Error>;
