//! Track registry
//!
//! Ordered collection of track entries. Registry order is authoritative for
//! both display and play-all order. The list is never empty: removing the
//! last entry immediately reseeds a blank one, so the UI always has a row to
//! attach a file to.

use crate::error::{Error, Result};
use crate::port::AudioSourceRef;
use crate::tap::{TapSession, TapStatus};
use pacetune_common::tempo::compute_rate;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// One queued track
///
/// Tempo fields hold raw user-entered text and are parsed on demand; empty
/// or unparsable text means "unset". The tap session lives on the track so
/// deletion and source changes follow the track's own lifecycle.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: Uuid,
    pub source: Option<AudioSourceRef>,
    pub display_name: String,
    pub current_bpm: String,
    pub target_bpm: String,
    pub tap: TapSession,
}

impl Track {
    fn blank(preset_target: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: None,
            display_name: String::new(),
            current_bpm: String::new(),
            target_bpm: preset_target.to_string(),
            tap: TapSession::new(),
        }
    }
}

/// Read-only row for rendering
///
/// `playback_rate` is derived through the same conversion the engine hands
/// to the port, so the displayed rate always matches the played one.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSnapshot {
    pub id: Uuid,
    pub display_name: String,
    pub has_source: bool,
    pub current_bpm: String,
    pub target_bpm: String,
    pub playback_rate: f64,
    pub tap_status: TapStatus,
    pub tap_count: usize,
}

/// Ordered, never-empty track collection
#[derive(Debug)]
pub struct TrackList {
    tracks: Vec<Track>,
}

impl TrackList {
    /// Create a list seeded with one blank track
    pub fn new(preset_target: &str) -> Self {
        Self {
            tracks: vec![Track::blank(preset_target)],
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Append a blank track with the given preset target text
    pub fn push_blank(&mut self, preset_target: &str) -> Uuid {
        let track = Track::blank(preset_target);
        let id = track.id;
        self.tracks.push(track);
        debug!("Added track {} ({} total)", id, self.tracks.len());
        id
    }

    /// Remove a track by id
    ///
    /// Reseeds a blank entry (with the given preset target) when the removal
    /// would leave the list empty. The caller must stop the sequencer first
    /// if this track is currently active.
    pub fn remove(&mut self, id: Uuid, preset_target: &str) -> Result<()> {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.id != id);
        if self.tracks.len() == before {
            return Err(Error::TrackNotFound(id));
        }

        if self.tracks.is_empty() {
            self.tracks.push(Track::blank(preset_target));
        }
        debug!("Removed track {} ({} remain)", id, self.tracks.len());
        Ok(())
    }

    /// Swap the entries at `index` and `index + 1`
    ///
    /// Out-of-range indices are a no-op; returns whether a swap happened.
    pub fn swap_with_next(&mut self, index: usize) -> bool {
        if index + 1 >= self.tracks.len() {
            return false;
        }
        self.tracks.swap(index, index + 1);
        true
    }

    pub fn set_current_bpm(&mut self, id: Uuid, text: impl Into<String>) -> Result<()> {
        let track = self.get_mut(id).ok_or(Error::TrackNotFound(id))?;
        track.current_bpm = text.into();
        Ok(())
    }

    pub fn set_target_bpm(&mut self, id: Uuid, text: impl Into<String>) -> Result<()> {
        let track = self.get_mut(id).ok_or(Error::TrackNotFound(id))?;
        track.target_bpm = text.into();
        Ok(())
    }

    pub fn set_display_name(&mut self, id: Uuid, name: impl Into<String>) -> Result<()> {
        let track = self.get_mut(id).ok_or(Error::TrackNotFound(id))?;
        track.display_name = name.into();
        Ok(())
    }

    /// Attach a new audio source, replacing any previous one
    ///
    /// The old reference is dropped (the provider observes the release) and
    /// the tap session resets for a fresh estimate of the new audio.
    pub fn attach_source(
        &mut self,
        id: Uuid,
        source: AudioSourceRef,
        display_name: impl Into<String>,
    ) -> Result<()> {
        let track = self.get_mut(id).ok_or(Error::TrackNotFound(id))?;
        track.source = Some(source);
        track.display_name = display_name.into();
        track.tap.reset();
        Ok(())
    }

    /// Bulk-overwrite every entry's target tempo text
    pub fn set_all_targets(&mut self, value: &str) {
        for track in &mut self.tracks {
            track.target_bpm = value.to_string();
        }
    }

    /// Ids of every track with an attached source, in registry order
    pub fn playable_ids(&self) -> Vec<Uuid> {
        self.tracks
            .iter()
            .filter(|t| t.source.is_some())
            .map(|t| t.id)
            .collect()
    }

    /// Read-only rows for rendering
    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        self.tracks
            .iter()
            .map(|t| TrackSnapshot {
                id: t.id,
                display_name: t.display_name.clone(),
                has_source: t.source.is_some(),
                current_bpm: t.current_bpm.clone(),
                target_bpm: t.target_bpm.clone(),
                playback_rate: compute_rate(&t.current_bpm, &t.target_bpm),
                tap_status: t.tap.status(),
                tap_count: t.tap.count(),
            })
            .collect()
    }
}
