//! Tap-tempo estimation
//!
//! Each track owns one [`TapSession`] that accumulates tap timestamps while
//! that track is playing. Once enough taps arrive, the session estimates the
//! track's tempo from the median inter-tap interval and locks itself until a
//! new audio source is attached.

use serde::Serialize;
use std::time::Instant;

/// Number of taps that triggers estimation
pub const TAP_COUNT: usize = 16;

/// Plausible inter-tap interval band, ≈50–240 BPM
///
/// Intervals outside the band are discarded as mis-taps.
const MIN_INTERVAL_MS: f64 = 250.0;
const MAX_INTERVAL_MS: f64 = 1200.0;

/// Minimum surviving intervals for a usable estimate
const MIN_VALID_INTERVALS: usize = 3;

/// Octave-correction band: estimates below/above get doubled/halved once
const OCTAVE_LOW_BPM: f64 = 95.0;
const OCTAVE_HIGH_BPM: f64 = 220.0;

/// Tap session status, exposed to the UI for the TAP control state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TapStatus {
    NotStarted,
    Collecting,
    Done,
}

/// Outcome of recording a single tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tap not accepted (session already done)
    Ignored,
    /// Tap accepted; estimation needs more taps
    Collecting(usize),
    /// Estimation succeeded with this tempo
    Estimated(u32),
    /// Too few plausible intervals; session reset, all taps discarded
    Failed,
}

/// Per-track tap accumulator
#[derive(Debug, Clone)]
pub struct TapSession {
    taps: Vec<Instant>,
    status: TapStatus,
}

impl TapSession {
    pub fn new() -> Self {
        Self {
            taps: Vec::new(),
            status: TapStatus::NotStarted,
        }
    }

    pub fn status(&self) -> TapStatus {
        self.status
    }

    /// Taps collected so far
    pub fn count(&self) -> usize {
        self.taps.len()
    }

    /// Discard all taps and return to `NotStarted`
    ///
    /// Called when a new audio source is attached to the owning track.
    pub fn reset(&mut self) {
        self.taps.clear();
        self.status = TapStatus::NotStarted;
    }

    /// Record one tap timestamp
    ///
    /// A `Done` session ignores taps until reset. The caller is responsible
    /// for the playback-side acceptance checks (owning track active and not
    /// paused).
    pub fn record(&mut self, at: Instant) -> TapOutcome {
        if self.status == TapStatus::Done {
            return TapOutcome::Ignored;
        }

        self.taps.push(at);
        self.status = TapStatus::Collecting;

        if self.taps.len() < TAP_COUNT {
            return TapOutcome::Collecting(self.taps.len());
        }

        match estimate_bpm(&self.taps) {
            Some(bpm) => {
                self.status = TapStatus::Done;
                TapOutcome::Estimated(bpm)
            }
            None => {
                // No partial result: discard everything for a fresh attempt
                self.reset();
                TapOutcome::Failed
            }
        }
    }
}

impl Default for TapSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimate tempo from a full set of tap timestamps
///
/// Returns `None` when fewer than [`MIN_VALID_INTERVALS`] inter-tap
/// intervals fall inside the plausible band.
fn estimate_bpm(taps: &[Instant]) -> Option<u32> {
    let mut intervals: Vec<f64> = taps
        .windows(2)
        .map(|pair| pair[1].duration_since(pair[0]).as_secs_f64() * 1000.0)
        .filter(|ms| (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(ms))
        .collect();

    if intervals.len() < MIN_VALID_INTERVALS {
        return None;
    }

    intervals.sort_by(f64::total_cmp);
    let median = if intervals.len() % 2 == 1 {
        intervals[intervals.len() / 2]
    } else {
        let upper = intervals.len() / 2;
        (intervals[upper - 1] + intervals[upper]) / 2.0
    };

    let mut bpm = 60_000.0 / median;

    // One octave-correction pass only: fixes the common half/double-tempo
    // confusion without iterating toward the band.
    if bpm < OCTAVE_LOW_BPM {
        bpm *= 2.0;
    } else if bpm > OCTAVE_HIGH_BPM {
        bpm /= 2.0;
    }

    Some(bpm.round() as u32)
}
