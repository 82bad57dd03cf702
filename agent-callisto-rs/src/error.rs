//! Error types for announcement providers.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single announcement side effect.
///
/// These never escape the announcement task; they are logged and recorded
/// in history.
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// No usable audio output
    #[error("audio device error: {0}")]
    AudioDevice(String),

    /// Decoding or playback failed
    #[error("playback error: {0}")]
    Playback(String),

    #[error("ElevenLabs API key not configured")]
    ApiKeyMissing,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Speech or haptic utility failed or is not configured
    #[error("{program}: {message}")]
    Command { program: String, message: String },

    #[error("no sample available for {0}")]
    NoSample(String),

    #[error("desktop notification error: {0}")]
    Desktop(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnnounceError {
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnounceError>;
