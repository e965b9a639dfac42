//! Shared engine state
//!
//! Thread-safe state shared between the engine's public API and its spawned
//! ended-watcher task, plus the event broadcast channel the UI subscribes
//! to. The sequencer state is the single source of truth for which track is
//! active; nothing else stores an "active row".

use pacetune_common::events::EngineEvent;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Sequencer state machine
///
/// `PlayingQueue` carries the queue snapshot captured when play-all started;
/// later registry edits do not alter an in-flight traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SequencerState {
    Idle,
    PlayingSingle { track_id: Uuid },
    PlayingQueue { queue: Vec<Uuid>, index: usize },
}

impl SequencerState {
    /// The track currently associated with the port, derived from the state
    pub fn active_track_id(&self) -> Option<Uuid> {
        match self {
            SequencerState::Idle => None,
            SequencerState::PlayingSingle { track_id } => Some(*track_id),
            SequencerState::PlayingQueue { queue, index } => queue.get(*index).copied(),
        }
    }
}

/// Shared state accessible by all engine tasks
pub struct SharedState {
    /// Current sequencer state
    sequencer: RwLock<SequencerState>,

    /// Global target tempo as raw text, mirrored from the UI input
    global_target: RwLock<String>,

    /// Event broadcaster for UI listeners
    event_tx: broadcast::Sender<EngineEvent>,
}

impl SharedState {
    /// Create new shared state with the given initial global target text
    pub fn new(initial_target: impl Into<String>) -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            sequencer: RwLock::new(SequencerState::Idle),
            global_target: RwLock::new(initial_target.into()),
            event_tx,
        }
    }

    /// Broadcast an event to all listeners
    pub fn broadcast_event(&self, event: EngineEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the engine event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    pub async fn sequencer(&self) -> SequencerState {
        self.sequencer.read().await.clone()
    }

    pub async fn set_sequencer(&self, state: SequencerState) {
        *self.sequencer.write().await = state;
    }

    pub async fn active_track_id(&self) -> Option<Uuid> {
        self.sequencer.read().await.active_track_id()
    }

    /// Global target tempo text (raw, parsed on use)
    pub async fn global_target_text(&self) -> String {
        self.global_target.read().await.clone()
    }

    pub async fn set_global_target_text(&self, text: impl Into<String>) {
        *self.global_target.write().await = text.into();
    }
}
