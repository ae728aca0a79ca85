//! Static animation data and the replicated record.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TrackSyncError;
use crate::state::{PlaybackState, Priority};

/// Opaque reference to an animation asset (e.g. an asset id or path).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationRef(pub String);

impl AnimationRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnimationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnimationRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named, timed event within one cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDef {
    pub name: String,
    /// Seconds from the start of the cycle.
    pub time: f64,
    #[serde(default)]
    pub value: String,
}

impl MarkerDef {
    pub fn new(name: impl Into<String>, time: f64, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time,
            value: value.into(),
        }
    }
}

/// Static configuration of one animation; shared between every instance.
///
/// Deserialization goes through [`AnimationConfig::new`], so a config received
/// from a peer is validated like a locally built one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnimationConfig")]
pub struct AnimationConfig {
    duration: f64,
    source: AnimationRef,
    markers: Vec<MarkerDef>,
}

#[derive(Deserialize)]
struct RawAnimationConfig {
    duration: f64,
    source: AnimationRef,
    #[serde(default)]
    markers: Vec<MarkerDef>,
}

impl TryFrom<RawAnimationConfig> for AnimationConfig {
    type Error = TrackSyncError;

    fn try_from(raw: RawAnimationConfig) -> Result<Self, Self::Error> {
        AnimationConfig::new(raw.source, raw.duration, raw.markers)
    }
}

impl AnimationConfig {
    /// Build a config. Marker times are clamped into `[0, duration]` and
    /// sorted ascending; equal times keep their definition order.
    pub fn new(
        source: AnimationRef,
        duration: f64,
        mut markers: Vec<MarkerDef>,
    ) -> Result<Self, TrackSyncError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(TrackSyncError::InvalidDuration { duration });
        }
        for marker in &mut markers {
            let clamped = if marker.time.is_nan() {
                0.0
            } else {
                marker.time.clamp(0.0, duration)
            };
            if clamped != marker.time {
                log::warn!(
                    "marker '{}' at {} is outside [0, {}] for '{}'; clamped",
                    marker.name,
                    marker.time,
                    duration,
                    source
                );
                marker.time = clamped;
            }
        }
        markers.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self {
            duration,
            source,
            markers,
        })
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn source(&self) -> &AnimationRef {
        &self.source
    }

    #[inline]
    pub fn markers(&self) -> &[MarkerDef] {
        &self.markers
    }

    /// Fresh pending set for a new cycle, ascending by required progress.
    pub fn pending_markers(&self) -> Vec<PendingMarker> {
        self.markers
            .iter()
            .map(|m| PendingMarker {
                name: m.name.clone(),
                value: m.value.clone(),
                required_progress: m.time / self.duration,
            })
            .collect()
    }
}

/// What an asset source knows about an animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationAsset {
    pub duration: f64,
    #[serde(default)]
    pub markers: Vec<MarkerDef>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub looped: bool,
}

impl AnimationAsset {
    /// Turn the asset into a shareable config for `source`.
    pub fn into_config(self, source: AnimationRef) -> Result<AnimationConfig, TrackSyncError> {
        AnimationConfig::new(source, self.duration, self.markers)
    }
}

/// Marker scheduled for the cycle in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingMarker {
    pub name: String,
    pub value: String,
    pub required_progress: f64,
}

/// Payload delivered when a marker fires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub name: String,
    pub value: String,
}

/// One replicated entry: identity, static config and current state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerRecord {
    pub name: String,
    pub id: String,
    pub config: Arc<AnimationConfig>,
    pub state: PlaybackState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_duration() {
        let err = AnimationConfig::new("a".into(), 0.0, vec![]).unwrap_err();
        assert_eq!(err, TrackSyncError::InvalidDuration { duration: 0.0 });
        assert!(AnimationConfig::new("a".into(), f64::NAN, vec![]).is_err());
    }

    #[test]
    fn markers_sorted_and_clamped() {
        let cfg = AnimationConfig::new(
            "a".into(),
            2.0,
            vec![
                MarkerDef::new("late", 5.0, "x"),
                MarkerDef::new("mid", 1.0, "y"),
                MarkerDef::new("first", 0.5, "z"),
                MarkerDef::new("mid", 1.0, "w"),
            ],
        )
        .unwrap();
        let names: Vec<_> = cfg.markers().iter().map(|m| m.value.as_str()).collect();
        assert_eq!(names, vec!["z", "y", "w", "x"]);
        assert_eq!(cfg.markers()[3].time, 2.0);

        let pending = cfg.pending_markers();
        assert_eq!(pending[0].required_progress, 0.25);
        assert_eq!(pending[3].required_progress, 1.0);
    }

    #[test]
    fn deserialized_config_is_validated() {
        let err = serde_json::from_str::<AnimationConfig>(
            r#"{ "duration": 0.0, "source": "a", "markers": [] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid animation duration"));

        let cfg: AnimationConfig = serde_json::from_str(
            r#"{ "duration": 2.0, "source": "a", "markers": [
                { "name": "b", "time": 1.5 },
                { "name": "a", "time": 0.5 }
            ] }"#,
        )
        .unwrap();
        assert_eq!(cfg.markers()[0].name, "a");
        assert_eq!(cfg.pending_markers()[1].required_progress, 0.75);
    }
}
