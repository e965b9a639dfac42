//! Test helper modules for PaceTune engine integration tests
//!
//! Provides a fake audio source port standing in for the media backend and
//! shortcuts for building engines with attached tracks.

pub mod fake_port;

// Re-export commonly used types
pub use fake_port::FakePort;

use pacetune_engine::{AudioSourcePort, AudioSourceRef, EngineConfig, PlaybackEngine};
use std::sync::Arc;
use uuid::Uuid;

/// Build an engine wired to a fresh fake port
pub fn test_engine() -> (Arc<FakePort>, PlaybackEngine) {
    let port = Arc::new(FakePort::new());
    let engine = PlaybackEngine::new(
        Arc::clone(&port) as Arc<dyn AudioSourcePort>,
        EngineConfig::default(),
    );
    (port, engine)
}

/// Ensure the engine has `count` tracks, each with a source attached
///
/// Reuses the initial blank track, then appends the rest. Returns the track
/// ids in registry order.
pub async fn attach_tracks(engine: &PlaybackEngine, count: usize) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = engine.tracks().await.iter().map(|t| t.id).collect();
    while ids.len() < count {
        ids.push(engine.add_track().await);
    }

    for (n, id) in ids.iter().enumerate() {
        engine
            .attach_source(
                *id,
                AudioSourceRef::new(format!("blob:track-{n}")),
                format!("track-{n}.mp3"),
            )
            .await
            .unwrap();
    }
    ids
}
