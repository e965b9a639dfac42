//! Tempo parsing and playback-rate conversion
//!
//! Converts a (current tempo, target tempo) pair into the speed multiplier
//! handed to the audio source port. Both the per-row rate display and the
//! rate actually applied to playback go through [`compute_rate`], so the two
//! can never disagree.

/// Lowest playback rate the engine will request
///
/// Extreme multipliers are unreliable on constrained playback engines, so
/// out-of-band ratios are clamped rather than rejected.
pub const MIN_PLAYBACK_RATE: f64 = 0.5;

/// Highest playback rate the engine will request
pub const MAX_PLAYBACK_RATE: f64 = 2.5;

/// Parse user-entered tempo text into a BPM value.
///
/// Returns `None` for anything that does not parse to a finite, positive
/// number. Empty fields, garbage text, zero and negative values all mean
/// "unset".
pub fn parse_bpm(text: &str) -> Option<f64> {
    let bpm: f64 = text.trim().parse().ok()?;
    (bpm.is_finite() && bpm > 0.0).then_some(bpm)
}

/// Playback rate for already-resolved tempo values.
///
/// Either side unset yields the identity rate 1.0 (no speed change); this is
/// policy, not an error. Otherwise the ratio target/current, clamped to
/// [`MIN_PLAYBACK_RATE`]..=[`MAX_PLAYBACK_RATE`].
pub fn rate_for(current: Option<f64>, target: Option<f64>) -> f64 {
    match (current, target) {
        (Some(current), Some(target)) => {
            (target / current).clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
        }
        _ => 1.0,
    }
}

/// Playback rate for raw tempo text, as stored on a track.
pub fn compute_rate(current_bpm: &str, target_bpm: &str) -> f64 {
    rate_for(parse_bpm(current_bpm), parse_bpm(target_bpm))
}
