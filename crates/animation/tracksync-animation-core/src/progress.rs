//! Progress/time math.
//!
//! Progress is derived from an interval `[start, end)` over which it moves
//! linearly from a frozen `passed` value up to 1.0. Every function takes `now`
//! explicitly, so results are reproducible on any side that shares the clock.

/// Result of re-anchoring an interval at a new speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedChange {
    /// Progress frozen at the moment of the change.
    pub passed_progress: f64,
    /// End of the new interval (its start is the `now` of the change).
    pub end_time: f64,
}

/// Interpolation factor of `now` within `[start, end)`, clamped to [0,1].
/// Degenerate intervals count as elapsed once `now` reaches `end`.
#[inline]
fn alpha(start: f64, end: f64, now: f64) -> f64 {
    let span = end - start;
    if span <= 0.0 || !span.is_finite() {
        return if now >= end { 1.0 } else { 0.0 };
    }
    let a = (now - start) / span;
    if a.is_nan() {
        return 0.0;
    }
    a.clamp(0.0, 1.0)
}

/// Current normalized progress in [0,1].
///
/// Saturates at `passed` before `start` and at 1.0 after `end`, which keeps
/// readers with slightly skewed clocks well-defined.
#[inline]
pub fn compute_progress(start: f64, end: f64, passed: f64, now: f64) -> f64 {
    let passed = passed.clamp(0.0, 1.0);
    (alpha(start, end, now) * (1.0 - passed) + passed).clamp(0.0, 1.0)
}

/// Freeze the progress implied by the current interval and compute the end of
/// a new interval starting at `now` for `new_speed`.
///
/// `new_speed` must be positive; pausing is handled by the tracker.
pub fn compute_speed_change(
    start: f64,
    end: f64,
    passed: f64,
    duration: f64,
    new_speed: f64,
    now: f64,
) -> SpeedChange {
    debug_assert!(new_speed > 0.0, "speed change requires a positive speed");
    let frozen = compute_progress(start, end, passed, now);
    SpeedChange {
        passed_progress: frozen,
        end_time: remaining_end_time(now, duration, frozen, new_speed),
    }
}

/// End of an interval that starts at `now` and covers what is left of the
/// cycle after `passed`, played at `speed`.
#[inline]
pub fn remaining_end_time(now: f64, duration: f64, passed: f64, speed: f64) -> f64 {
    now + duration * (1.0 - passed.clamp(0.0, 1.0)) / speed
}
