//! Playback defaults shared by trackers and animators.

use serde::{Deserialize, Serialize};

use crate::error::TrackSyncError;

/// Fade applied when play/stop are called without an explicit fade.
pub const DEFAULT_FADE_TIME: f64 = 0.1;

/// Defaults for optional playback arguments and for freshly created trackers.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Fade-in/fade-out time in seconds.
    pub fade_time: f64,
    /// Target weight handed to the render target on play.
    pub weight: f64,
    /// Playback speed multiplier.
    pub speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fade_time: DEFAULT_FADE_TIME,
            weight: 1.0,
            speed: 1.0,
        }
    }
}

impl Config {
    /// Parse a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(s: &str) -> Result<Self, TrackSyncError> {
        Ok(serde_json::from_str(s)?)
    }
}
