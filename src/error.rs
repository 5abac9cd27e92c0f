//! Error types for vocab-audio
//!
//! Nothing in here is fatal to the host: every failure degrades to
//! "no sound played".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The clip asset could not be resolved or opened, or the backend
    /// refused to create a session for it.
    #[error("Clip unavailable: {0}")]
    ResourceUnavailable(String),

    /// The arbitration service refused playback rights.
    #[error("Audio focus denied")]
    FocusDenied,

    /// The rendering backend failed after a session was created.
    #[error("Audio backend failure: {0}")]
    BackendFailure(String),

    /// Configuration or catalog file errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using vocab-audio Error
pub type Result<T> = std::result::Result<T, Error>;
