//! # PaceTune Common Library
//!
//! Shared code for the PaceTune engine and its UI layer:
//! - Event types (`EngineEvent` enum) broadcast by the engine
//! - Tempo parsing and playback-rate conversion

pub mod events;
pub mod tempo;

pub use events::{EngineEvent, PlaybackState};
pub use tempo::{compute_rate, parse_bpm, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
