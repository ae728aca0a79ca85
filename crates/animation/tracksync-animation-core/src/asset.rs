use serde::Deserialize;

use crate::data::{AnimationAsset, MarkerDef};
use crate::error::TrackSyncError;
use crate::state::Priority;

/// Public API: parse a keyframe-sequence JSON document into an [`AnimationAsset`].
///
/// Notes:
/// - Duration is the largest keyframe time unless `duration` is given explicitly.
/// - Markers take the time of the keyframe that contains them.
/// - Markers are returned sorted ascending by time; ties keep document order.
/// - `priority` and `loop` seed the initial state of trackers built from the asset.
pub fn parse_animation_asset_json(s: &str) -> Result<AnimationAsset, TrackSyncError> {
    let doc: KeyframeSequence = serde_json::from_str(s)?;

    let length = doc.keyframes.iter().map(|k| k.time).fold(0.0_f64, f64::max);
    let duration = doc.duration.unwrap_or(length);

    let mut markers: Vec<MarkerDef> = Vec::new();
    for keyframe in doc.keyframes {
        for marker in keyframe.markers {
            markers.push(MarkerDef {
                name: marker.name,
                time: keyframe.time,
                value: marker.value,
            });
        }
    }
    markers.sort_by(|a, b| a.time.total_cmp(&b.time));

    Ok(AnimationAsset {
        duration,
        markers,
        priority: doc.priority,
        looped: doc.looped,
    })
}

#[derive(Deserialize)]
struct KeyframeSequence {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    priority: Priority,
    #[serde(default, rename = "loop")]
    looped: bool,
    #[serde(default)]
    keyframes: Vec<Keyframe>,
}

#[derive(Deserialize)]
struct Keyframe {
    time: f64,
    #[serde(default)]
    markers: Vec<KeyframeMarker>,
}

#[derive(Deserialize)]
struct KeyframeMarker {
    name: String,
    #[serde(default)]
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_last_keyframe() {
        let asset = parse_animation_asset_json(
            r#"{
                "priority": "Movement",
                "loop": true,
                "keyframes": [
                    { "time": 0.0 },
                    { "time": 1.2, "markers": [ { "name": "Step", "value": "R" } ] },
                    { "time": 0.4, "markers": [ { "name": "Step", "value": "L" } ] },
                    { "time": 2.0 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(asset.duration, 2.0);
        assert_eq!(asset.priority, Priority::Movement);
        assert!(asset.looped);
        let values: Vec<_> = asset.markers.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["L", "R"]);
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let err = parse_animation_asset_json(r#"{ "keyframes": 3 }"#).unwrap_err();
        assert!(matches!(err, TrackSyncError::Parse { .. }));
    }
}
