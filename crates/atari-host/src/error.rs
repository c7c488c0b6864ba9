//! Error types for sessions, audio output and session persistence.

use thiserror::Error;

/// A session could not start. Reported through the host's failure flag.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no machine could be created for {0}")]
    MachineUnavailable(String),
}

/// Audio device failure. Sound is treated as unavailable for the session.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device")]
    NoDevice,
    #[error("unsupported audio configuration: {0}")]
    Unsupported(String),
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Session persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(String),
}
