//! Error types for Chime.

use thiserror::Error;

/// Result type alias using Chime's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Chime.
#[derive(Error, Debug)]
pub enum Error {
    // External command errors
    #[error("failed to start decoder: {0}")]
    Spawn(String),

    #[error("mixer command failed: {0}")]
    Mixer(String),

    #[error("equalizer profile write failed: {0}")]
    Equalizer(String),

    // Tag reading errors
    #[error("metadata extraction failed: {0}")]
    Metadata(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error is a transient external-command failure.
    ///
    /// Transient failures are logged and absorbed at the controller
    /// boundary; they never abort playback.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Spawn(_) | Self::Mixer(_) | Self::Equalizer(_))
    }
}
