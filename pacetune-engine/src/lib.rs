//! # PaceTune Engine
//!
//! Playback engine for tempo-matched track queues: estimate a track's tempo
//! by tapping, then play it back at the speed ratio that converts its native
//! tempo to a target cadence, pitch preserved by the media backend.
//!
//! The engine owns the track registry and the sequencer state machine; the
//! media backend is injected through the [`port::AudioSourcePort`] trait so
//! the whole engine runs under test against a fake.

pub mod config;
pub mod engine;
pub mod error;
pub mod port;
pub mod state;
pub mod tap;
pub mod track_list;

pub use config::{init_tracing, EngineConfig};
pub use engine::PlaybackEngine;
pub use error::{Error, Result};
pub use port::{AudioSourcePort, AudioSourceRef, PlayRejected};
pub use state::{SequencerState, SharedState};
pub use tap::{TapOutcome, TapStatus, TAP_COUNT};
