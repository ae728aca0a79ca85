//! Replicable playback state value.
//!
//! A `PlaybackState` is never edited in place once committed: every change
//! builds a new value through the `with_*` helpers or the transition
//! constructors below, and the owner swaps it in wholesale.

use serde::{Deserialize, Serialize};

use crate::progress::compute_progress;

/// Ordinal playback priority, lowest first.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    #[default]
    Core,
    Idle,
    Movement,
    Action,
    Action2,
    Action3,
    Action4,
}

impl Priority {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Idle => "idle",
            Self::Movement => "movement",
            Self::Action => "action",
            Self::Action2 => "action2",
            Self::Action3 => "action3",
            Self::Action4 => "action4",
        }
    }
}

/// Coarse phase derived from a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackerPhase {
    Stopped,
    Playing,
    Paused,
}

/// Authoritative status of one animation instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Progress frozen at the last transition (play, speed change or stop).
    pub passed_progress: f64,
    /// Absolute start of the current interval; 0 when stopped.
    pub start_time: f64,
    /// Absolute end of the current interval; 0 when stopped.
    pub end_time: f64,
    pub weight: f64,
    pub fade_time: f64,
    pub speed: f64,
    pub priority: Priority,
    pub looped: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::stopped(Priority::default(), false)
    }
}

impl PlaybackState {
    /// Initial state of a tracker: not playing, nothing passed.
    pub fn stopped(priority: Priority, looped: bool) -> Self {
        Self {
            is_playing: false,
            passed_progress: 0.0,
            start_time: 0.0,
            end_time: 0.0,
            weight: 1.0,
            fade_time: crate::config::DEFAULT_FADE_TIME,
            speed: 1.0,
            priority,
            looped,
        }
    }

    #[inline]
    pub fn phase(&self) -> TrackerPhase {
        if !self.is_playing {
            TrackerPhase::Stopped
        } else if self.speed == 0.0 {
            TrackerPhase::Paused
        } else {
            TrackerPhase::Playing
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.phase() == TrackerPhase::Paused
    }

    /// Progress at `now`. Stopped and paused states report the frozen value.
    #[inline]
    pub fn progress_at(&self, now: f64) -> f64 {
        match self.phase() {
            TrackerPhase::Playing => {
                compute_progress(self.start_time, self.end_time, self.passed_progress, now)
            }
            TrackerPhase::Stopped | TrackerPhase::Paused => self.passed_progress.clamp(0.0, 1.0),
        }
    }

    /// Replace progress and interval together.
    #[inline]
    pub fn with_timing(self, passed_progress: f64, start_time: f64, end_time: f64) -> Self {
        Self {
            passed_progress: passed_progress.clamp(0.0, 1.0),
            start_time,
            end_time,
            ..self
        }
    }

    #[inline]
    pub fn with_speed(self, speed: f64) -> Self {
        Self {
            speed: speed.max(0.0),
            ..self
        }
    }

    #[inline]
    pub fn with_weight(self, weight: f64) -> Self {
        Self {
            weight: weight.max(0.0),
            ..self
        }
    }

    #[inline]
    pub fn with_fade_time(self, fade_time: f64) -> Self {
        Self {
            fade_time: fade_time.max(0.0),
            ..self
        }
    }

    #[inline]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    #[inline]
    pub fn with_looped(self, looped: bool) -> Self {
        Self { looped, ..self }
    }

    #[inline]
    pub fn with_playing(self, is_playing: bool) -> Self {
        Self { is_playing, ..self }
    }
}
