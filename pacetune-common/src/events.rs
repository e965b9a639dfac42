//! Event types for the PaceTune engine
//!
//! The engine broadcasts these to whatever front end is attached (the UI
//! layer renders row highlights, button states and alerts from them).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse playback state as seen by the user-facing transport controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Engine event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// Playback state changed (play / pause / stop)
    PlaybackStateChanged {
        state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// The active track changed (None when playback ends or stops)
    ActiveTrackChanged {
        track_id: Option<Uuid>,
        timestamp: DateTime<Utc>,
    },

    /// A track started playing at the given rate
    TrackStarted {
        track_id: Uuid,
        playback_rate: f64,
        timestamp: DateTime<Utc>,
    },

    /// The platform rejected a play request for this track
    PlaybackBlocked {
        track_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A play-all traversal reached the end of its queue
    QueueCompleted {
        timestamp: DateTime<Utc>,
    },

    /// Track list membership or order changed
    TrackListChanged {
        timestamp: DateTime<Utc>,
    },

    /// Tap estimation finished and wrote the track's current tempo
    TempoEstimated {
        track_id: Uuid,
        bpm: u32,
        timestamp: DateTime<Utc>,
    },

    /// Tap estimation discarded its taps; the user should tap again
    TapEstimationFailed {
        track_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_state_serializes_lowercase() {
        let json = serde_json::to_string(&PlaybackState::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = EngineEvent::TempoEstimated {
            track_id: Uuid::new_v4(),
            bpm: 171,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"TempoEstimated\""));
        assert!(json.contains("\"bpm\":171"));
    }

    #[test]
    fn event_round_trips() {
        let event = EngineEvent::ActiveTrackChanged {
            track_id: None,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&json).unwrap();
        match back {
            EngineEvent::ActiveTrackChanged { track_id, .. } => assert!(track_id.is_none()),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
