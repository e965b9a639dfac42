//! Playback engine orchestration
//!
//! Coordinates the track registry, tap sessions and the injected audio
//! source port, and owns the sequencer state machine that drives
//! single-track and queued playback. Queue advancement runs on a spawned
//! watcher task holding the engine's only ended-notification subscription;
//! arming a new watcher supersedes the previous one, so at most one
//! continuation is ever live.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::port::{AudioSourcePort, AudioSourceRef};
use crate::state::{SequencerState, SharedState};
use crate::tap::TapOutcome;
use crate::track_list::{TrackList, TrackSnapshot};
use chrono::Utc;
use pacetune_common::events::{EngineEvent, PlaybackState};
use pacetune_common::tempo::{compute_rate, parse_bpm, rate_for};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Playback engine - orchestrates registry, taps and the audio source port
pub struct PlaybackEngine {
    /// Bootstrap configuration
    config: EngineConfig,

    /// Injected media backend (single shared instance)
    port: Arc<dyn AudioSourcePort>,

    /// Track registry
    tracks: Arc<RwLock<TrackList>>,

    /// Sequencer state, global target and event broadcaster
    state: Arc<SharedState>,

    /// Single-slot ended-notification watcher
    ended_watcher: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PlaybackEngine {
    /// Create a new engine around the given port
    ///
    /// The registry starts with one blank track whose target field is seeded
    /// from the configured default target tempo.
    pub fn new(port: Arc<dyn AudioSourcePort>, config: EngineConfig) -> Self {
        let initial_target = config.default_target_bpm.to_string();
        info!(
            "Creating playback engine (default target {} BPM)",
            config.default_target_bpm
        );

        Self {
            port,
            tracks: Arc::new(RwLock::new(TrackList::new(&initial_target))),
            state: Arc::new(SharedState::new(initial_target)),
            ended_watcher: Arc::new(Mutex::new(None)),
            config,
        }
    }

    // === Read surface for the UI layer ===

    /// Read-only rows for rendering, in registry order
    pub async fn tracks(&self) -> Vec<TrackSnapshot> {
        self.tracks.read().await.snapshot()
    }

    pub async fn sequencer_state(&self) -> SequencerState {
        self.state.sequencer().await
    }

    /// The track currently associated with the port, if any
    pub async fn active_track_id(&self) -> Option<Uuid> {
        self.state.active_track_id().await
    }

    /// Subscribe to the engine event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.state.subscribe_events()
    }

    /// Global target tempo, falling back to the configured default when the
    /// stored text does not parse
    pub async fn global_target_bpm(&self) -> f64 {
        parse_bpm(&self.state.global_target_text().await).unwrap_or(self.config.default_target_bpm)
    }

    /// Replace the global target tempo text (mirrors the UI input)
    pub async fn set_global_target(&self, text: impl Into<String>) {
        self.state.set_global_target_text(text).await;
    }

    // === Registry operations ===

    /// Append a blank track, target preset to the global target
    pub async fn add_track(&self) -> Uuid {
        let preset = self.global_target_bpm().await.to_string();
        let id = self.tracks.write().await.push_blank(&preset);
        self.emit_track_list_changed();
        id
    }

    /// Remove a track, stopping playback first if it is the active one
    pub async fn remove_track(&self, track_id: Uuid) -> Result<()> {
        if self.state.active_track_id().await == Some(track_id) {
            info!("Removing active track {}, stopping playback", track_id);
            self.stop().await?;
        }

        let preset = self.global_target_bpm().await.to_string();
        self.tracks.write().await.remove(track_id, &preset)?;
        self.emit_track_list_changed();
        Ok(())
    }

    /// Swap the tracks at `index` and `index + 1`; out of range is a no-op
    pub async fn swap_tracks(&self, index: usize) {
        if self.tracks.write().await.swap_with_next(index) {
            self.emit_track_list_changed();
        }
    }

    pub async fn set_current_bpm(&self, track_id: Uuid, text: impl Into<String>) -> Result<()> {
        self.tracks.write().await.set_current_bpm(track_id, text)
    }

    pub async fn set_target_bpm(&self, track_id: Uuid, text: impl Into<String>) -> Result<()> {
        self.tracks.write().await.set_target_bpm(track_id, text)
    }

    pub async fn set_display_name(&self, track_id: Uuid, name: impl Into<String>) -> Result<()> {
        self.tracks.write().await.set_display_name(track_id, name)
    }

    /// Attach a provider-supplied source to a track
    ///
    /// Replaces any previous source (dropping our clone of the old
    /// reference) and resets the track's tap session.
    pub async fn attach_source(
        &self,
        track_id: Uuid,
        source: AudioSourceRef,
        display_name: impl Into<String>,
    ) -> Result<()> {
        self.tracks
            .write()
            .await
            .attach_source(track_id, source, display_name)?;
        self.emit_track_list_changed();
        Ok(())
    }

    /// Bulk-overwrite every track's target tempo text
    pub async fn set_all_targets(&self, value: &str) {
        self.tracks.write().await.set_all_targets(value);
        self.emit_track_list_changed();
    }

    // === Tap tempo ===

    /// Record one tap against a track's session
    ///
    /// Taps are accepted only while the track is the active one and the port
    /// is actually playing; anything else is silently ignored. A completed
    /// estimate is written into the track's current tempo text.
    pub async fn record_tap(&self, track_id: Uuid, at: Instant) -> Result<TapOutcome> {
        if self.state.active_track_id().await != Some(track_id) || self.port.is_paused() {
            debug!("Ignoring tap for {}: track not actively playing", track_id);
            return Ok(TapOutcome::Ignored);
        }

        let mut tracks = self.tracks.write().await;
        let track = tracks
            .get_mut(track_id)
            .ok_or(Error::TrackNotFound(track_id))?;

        match track.tap.record(at) {
            TapOutcome::Estimated(bpm) => {
                track.current_bpm = bpm.to_string();
                info!("Tap estimate for {}: {} BPM", track_id, bpm);
                self.state.broadcast_event(EngineEvent::TempoEstimated {
                    track_id,
                    bpm,
                    timestamp: Utc::now(),
                });
                Ok(TapOutcome::Estimated(bpm))
            }
            TapOutcome::Failed => {
                warn!("Tap estimation for {} failed, session reset", track_id);
                self.state.broadcast_event(EngineEvent::TapEstimationFailed {
                    track_id,
                    timestamp: Utc::now(),
                });
                Err(Error::TapEstimationFailed)
            }
            outcome => Ok(outcome),
        }
    }

    // === Playback operations ===

    /// Play a single track at its own current/target ratio
    ///
    /// Valid from any state; cancels an in-flight queue traversal. On
    /// rejection the sequencer stays idle and no retry is attempted.
    pub async fn play_track(&self, track_id: Uuid) -> Result<()> {
        info!("Play command for track {}", track_id);

        // Validate before touching the queue: a bad request must not tear
        // down an in-flight traversal.
        let (source, rate) = {
            let tracks = self.tracks.read().await;
            let track = tracks.get(track_id).ok_or(Error::TrackNotFound(track_id))?;
            let source = track
                .source
                .clone()
                .ok_or(Error::NoSourceAttached(track_id))?;
            (source, compute_rate(&track.current_bpm, &track.target_bpm))
        };

        self.cancel_ended_watcher().await;
        self.transition(SequencerState::Idle).await;
        self.start_playback(track_id, &source, rate).await?;
        self.transition(SequencerState::PlayingSingle { track_id }).await;
        Ok(())
    }

    /// Play every track with an attached source, in registry order
    ///
    /// The queue membership and order are captured here; later registry
    /// edits do not alter the traversal. Per-track text fields and the
    /// global target are read again at each track start.
    pub async fn play_all(&self) -> Result<()> {
        if matches!(
            self.state.sequencer().await,
            SequencerState::PlayingQueue { .. }
        ) {
            return Err(Error::InvalidState(
                "queue playback already in progress".to_string(),
            ));
        }

        let queue = self.tracks.read().await.playable_ids();
        if queue.is_empty() {
            return Err(Error::EmptyQueue);
        }
        info!("Starting play-all over {} tracks", queue.len());

        // Subscribe before the first play so an immediate ended signal
        // cannot be missed.
        self.arm_ended_watcher().await;
        self.transition(SequencerState::PlayingQueue {
            queue: queue.clone(),
            index: 0,
        })
        .await;

        if let Err(e) = self.play_queue_entry(queue[0]).await {
            self.stop().await?;
            return Err(e);
        }
        Ok(())
    }

    /// Advance the play-all queue after an end-of-track signal
    ///
    /// Meaningful only while a queue traversal is in flight; the signal is
    /// ignored in any other state.
    pub async fn on_track_ended(&self) -> Result<()> {
        let (queue, index) = match self.state.sequencer().await {
            SequencerState::PlayingQueue { queue, index } => (queue, index),
            state => {
                debug!("Ignoring track-ended signal in state {:?}", state);
                return Ok(());
            }
        };

        let next_index = index + 1;
        if next_index >= queue.len() {
            info!("Play-all queue completed ({} tracks)", queue.len());
            self.transition(SequencerState::Idle).await;
            self.state.broadcast_event(EngineEvent::QueueCompleted {
                timestamp: Utc::now(),
            });
            // Cancel last: this may run on the watcher task itself
            self.cancel_ended_watcher().await;
            return Ok(());
        }

        self.transition(SequencerState::PlayingQueue {
            queue: queue.clone(),
            index: next_index,
        })
        .await;

        if let Err(e) = self.play_queue_entry(queue[next_index]).await {
            // A blocked track aborts the whole traversal rather than
            // skipping ahead.
            self.stop().await?;
            return Err(e);
        }
        Ok(())
    }

    /// Pause playback; sequencer state is unchanged and the queue stays live
    pub async fn pause(&self) -> Result<()> {
        if self.port.current_source().is_none() {
            debug!("Pause ignored: no source loaded");
            return Ok(());
        }

        self.port.pause();
        self.state.broadcast_event(EngineEvent::PlaybackStateChanged {
            state: PlaybackState::Paused,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Resume paused playback; sequencer state is unchanged
    pub async fn resume(&self) -> Result<()> {
        if self.port.current_source().is_none() {
            debug!("Resume ignored: no source loaded");
            return Ok(());
        }

        match self.port.play().await {
            Ok(()) => {
                self.state.broadcast_event(EngineEvent::PlaybackStateChanged {
                    state: PlaybackState::Playing,
                    timestamp: Utc::now(),
                });
                Ok(())
            }
            Err(rejected) => {
                warn!("Resume rejected: {}", rejected);
                Err(Error::PlaybackBlocked(rejected.reason))
            }
        }
    }

    /// Stop playback from any state
    ///
    /// Pauses the port, resets its position, clears the active marker and
    /// discards any queue snapshot. Safe to call repeatedly.
    pub async fn stop(&self) -> Result<()> {
        info!("Stop command received");
        self.port.pause();
        self.port.seek_to_start();
        self.transition(SequencerState::Idle).await;
        self.state.broadcast_event(EngineEvent::PlaybackStateChanged {
            state: PlaybackState::Stopped,
            timestamp: Utc::now(),
        });
        // Cancel last so a stop issued from the watcher task itself
        // completes its teardown before the task dies.
        self.cancel_ended_watcher().await;
        Ok(())
    }

    // === Internals ===

    /// Move the sequencer to `next`, announcing active-track changes
    async fn transition(&self, next: SequencerState) {
        let previous_active = self.state.active_track_id().await;
        let next_active = next.active_track_id();
        self.state.set_sequencer(next).await;

        if previous_active != next_active {
            self.state.broadcast_event(EngineEvent::ActiveTrackChanged {
                track_id: next_active,
                timestamp: Utc::now(),
            });
        }
    }

    /// Resolve the queue-mode rate for one entry and start it
    async fn play_queue_entry(&self, track_id: Uuid) -> Result<()> {
        let global_target = self.global_target_bpm().await;

        let (source, rate) = {
            let tracks = self.tracks.read().await;
            let track = tracks.get(track_id).ok_or(Error::TrackNotFound(track_id))?;
            let source = track
                .source
                .clone()
                .ok_or(Error::NoSourceAttached(track_id))?;
            // The track's own target wins; the global target fills unset
            // rows. The current tempo is always used as-is.
            let target = parse_bpm(&track.target_bpm).unwrap_or(global_target);
            (source, rate_for(parse_bpm(&track.current_bpm), Some(target)))
        };

        self.start_playback(track_id, &source, rate).await
    }

    /// Tear down the previous port association and start this source
    ///
    /// The outcome of the awaited play request decides success; state is
    /// never advanced as if playback started when it did not.
    async fn start_playback(
        &self,
        track_id: Uuid,
        source: &AudioSourceRef,
        rate: f64,
    ) -> Result<()> {
        self.port.pause();
        self.port.seek_to_start();
        self.port.load(source);
        self.port.set_rate(rate);

        match self.port.play().await {
            Ok(()) => {
                info!("Track {} playing at {:.3}x", track_id, rate);
                self.state.broadcast_event(EngineEvent::TrackStarted {
                    track_id,
                    playback_rate: rate,
                    timestamp: Utc::now(),
                });
                self.state.broadcast_event(EngineEvent::PlaybackStateChanged {
                    state: PlaybackState::Playing,
                    timestamp: Utc::now(),
                });
                Ok(())
            }
            Err(rejected) => {
                warn!("Play request for {} rejected: {}", track_id, rejected);
                self.state.broadcast_event(EngineEvent::PlaybackBlocked {
                    track_id,
                    timestamp: Utc::now(),
                });
                Err(Error::PlaybackBlocked(rejected.reason))
            }
        }
    }

    /// Arm the single-slot ended watcher, superseding any previous one
    async fn arm_ended_watcher(&self) {
        let mut ended = self.port.subscribe_ended();
        let engine = self.clone_handles();

        let handle = tokio::spawn(async move {
            loop {
                match ended.recv().await {
                    Ok(()) => {
                        if let Err(e) = engine.on_track_ended().await {
                            warn!("Queue traversal aborted: {}", e);
                            break;
                        }
                        if !matches!(
                            engine.state.sequencer().await,
                            SequencerState::PlayingQueue { .. }
                        ) {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Ended watcher lagged, {} signals dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut slot = self.ended_watcher.lock().await;
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Drop and abort the current ended watcher, if any
    async fn cancel_ended_watcher(&self) {
        let handle = self.ended_watcher.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn emit_track_list_changed(&self) {
        self.state.broadcast_event(EngineEvent::TrackListChanged {
            timestamp: Utc::now(),
        });
    }

    /// Clone handles for spawned tasks
    fn clone_handles(&self) -> Self {
        Self {
            config: self.config.clone(),
            port: Arc::clone(&self.port),
            tracks: Arc::clone(&self.tracks),
            state: Arc::clone(&self.state),
            ended_watcher: Arc::clone(&self.ended_watcher),
        }
    }
}
