//! Audio source port
//!
//! The engine drives a single shared media backend through this trait. The
//! real implementation wraps whatever platform facility actually produces
//! sound (and is responsible for pitch preservation); tests substitute a
//! fake. Only one source is associated with the port at a time.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Opaque handle to an audio source, minted by the external provider
///
/// The engine never interprets the underlying reference; it only forwards it
/// to the port and compares handles for identity. Dropping the last clone is
/// the provider's signal to release the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSourceRef {
    uri: Arc<str>,
}

impl AudioSourceRef {
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self { uri: uri.into() }
    }

    /// The provider-side reference string, passed through to the port
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// A play request was rejected by the platform (e.g. autoplay policy)
#[derive(Debug, Clone, Error)]
#[error("play request rejected: {reason}")]
pub struct PlayRejected {
    pub reason: String,
}

impl PlayRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Media backend boundary
///
/// `play` is the only suspension point: it resolves once playback has
/// actually started, or rejects when the platform blocks it. The engine
/// awaits that outcome before reporting success.
#[async_trait::async_trait]
pub trait AudioSourcePort: Send + Sync {
    /// Associate a source with the port, replacing any previous one
    fn load(&self, source: &AudioSourceRef);

    /// Start or resume playback of the loaded source
    async fn play(&self) -> std::result::Result<(), PlayRejected>;

    /// Pause playback; position is retained
    fn pause(&self);

    /// Reset the playback position to the beginning
    fn seek_to_start(&self);

    /// Set the playback speed multiplier (1.0 = native speed)
    fn set_rate(&self, rate: f64);

    /// The currently associated source, if any
    fn current_source(&self) -> Option<AudioSourceRef>;

    /// Whether the port is currently paused (true when nothing is loaded)
    fn is_paused(&self) -> bool;

    /// Subscribe to end-of-source notifications
    ///
    /// The engine keeps at most one live subscription; arming a new watcher
    /// supersedes the previous one.
    fn subscribe_ended(&self) -> broadcast::Receiver<()>;
}
