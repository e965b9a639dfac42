//! Error types for the PaceTune engine
//!
//! Defines engine-specific error types using thiserror for clear error
//! propagation. None of these are fatal: there is no persistent state to
//! corrupt, and every failure is recoverable by a subsequent user action.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the PaceTune engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No track with the given id exists in the registry
    #[error("Track not found: {0}")]
    TrackNotFound(Uuid),

    /// The track has no audio source attached yet
    #[error("No audio source attached to track {0}")]
    NoSourceAttached(Uuid),

    /// The platform blocked a play request; the attempt is abandoned
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    /// Play-all was invoked with no tracks that have a source attached
    #[error("Nothing to play: no tracks with an attached audio source")]
    EmptyQueue,

    /// Too few plausible tap intervals; the session was reset for a retry
    #[error("Tap estimation failed: too few plausible intervals")]
    TapEstimationFailed,

    /// Operation not legal in the current sequencer state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
