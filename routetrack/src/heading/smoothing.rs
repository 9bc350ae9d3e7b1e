//! Heading smoothing with a bounded turn rate.

use crate::geo;

/// Smallest time step the turn-rate limit assumes (one 60Hz frame).
pub const MIN_SMOOTHING_DELTA_SECS: f64 = 1.0 / 60.0;

/// Largest time step the turn-rate limit assumes.
pub const MAX_SMOOTHING_DELTA_SECS: f64 = 1.0;

/// Ease `current` toward `target`.
///
/// The shortest signed delta is scaled by `factor`, then limited to
/// `max_turn_rate_per_second * delta_time`, with `delta_time` clamped to
/// `[1/60, 1]` seconds. Non-finite `delta_time` counts as one frame.
/// Returns a heading in `[0, 360)`.
pub fn smooth_heading(
    current: f64,
    target: f64,
    factor: f64,
    delta_time: f64,
    max_turn_rate_per_second: f64,
) -> f64 {
    let current = geo::normalize_heading(current);
    let delta = geo::heading_delta(current, target);

    let factor = if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let dt = if delta_time.is_finite() {
        delta_time.clamp(MIN_SMOOTHING_DELTA_SECS, MAX_SMOOTHING_DELTA_SECS)
    } else {
        MIN_SMOOTHING_DELTA_SECS
    };
    let max_step = (max_turn_rate_per_second.abs() * dt).max(0.0);

    let step = (delta * factor).clamp(-max_step, max_step);
    geo::normalize_heading(current + step)
}
