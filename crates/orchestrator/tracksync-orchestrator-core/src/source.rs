//! Where animation assets come from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hashbrown::HashMap;

use tracksync_animation_core::{
    parse_animation_asset_json, AnimationAsset, AnimationRef, TrackSyncError,
};

/// Resolves an [`AnimationRef`] to its asset data.
pub trait AssetSource {
    fn load(&self, reference: &AnimationRef) -> Result<AnimationAsset>;
}

/// Reads keyframe-sequence documents from `<root>/<reference>.json`.
#[derive(Clone, Debug)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File for `reference`. References are bare file stems; anything that
    /// could leave `root` is rejected.
    fn path_for(&self, reference: &AnimationRef) -> Result<PathBuf> {
        let stem = reference.as_str();
        if stem.is_empty() || stem == "." || stem.contains("..") || stem.contains(['/', '\\']) {
            bail!("invalid asset reference '{stem}'");
        }
        Ok(self.root.join(format!("{stem}.json")))
    }
}

impl AssetSource for JsonDirectorySource {
    fn load(&self, reference: &AnimationRef) -> Result<AnimationAsset> {
        let path = self.path_for(reference)?;
        if !path.is_file() {
            return Err(TrackSyncError::AssetNotFound {
                reference: reference.to_string(),
            })
            .with_context(|| format!("no asset file at {}", path.display()));
        }
        let text = fs::read_to_string(&path)
            .map_err(TrackSyncError::from)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let asset = parse_animation_asset_json(&text)
            .with_context(|| format!("failed to parse animation '{reference}'"))?;
        Ok(asset)
    }
}

/// In-memory assets, for tests and hosts that bundle their data.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    assets: HashMap<AnimationRef, AnimationAsset>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, reference: impl Into<AnimationRef>, asset: AnimationAsset) -> Self {
        self.insert(reference, asset);
        self
    }

    pub fn insert(&mut self, reference: impl Into<AnimationRef>, asset: AnimationAsset) {
        self.assets.insert(reference.into(), asset);
    }

    /// Parse a keyframe-sequence document and register it under `reference`.
    pub fn insert_json(&mut self, reference: impl Into<AnimationRef>, json: &str) -> Result<()> {
        let reference = reference.into();
        let asset = parse_animation_asset_json(json)
            .with_context(|| format!("failed to parse animation '{reference}'"))?;
        self.assets.insert(reference, asset);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for StaticSource {
    fn load(&self, reference: &AnimationRef) -> Result<AnimationAsset> {
        self.assets.get(reference).cloned().ok_or_else(|| {
            TrackSyncError::AssetNotFound {
                reference: reference.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_reports_missing_reference() {
        let source = StaticSource::new();
        let err = source.load(&AnimationRef::new("ghost")).unwrap_err();
        let inner = err.downcast_ref::<TrackSyncError>().unwrap();
        assert_eq!(inner.category(), "data");
    }

    #[test]
    fn directory_source_stays_inside_root() {
        let source = JsonDirectorySource::new(tracksync_test_fixtures::animations::dir());
        assert_eq!(source.load(&"walk".into()).unwrap().duration, 1.0);
        for bad in ["../configs/slow_fade", "..", "sub/walk", "sub\\walk", ""] {
            let err = source.load(&bad.into()).unwrap_err();
            assert!(err.to_string().contains("invalid asset reference"), "{bad}");
        }
    }

    #[test]
    fn insert_json_rejects_garbage() {
        let mut source = StaticSource::new();
        assert!(source.insert_json("bad", "not json").is_err());
        assert!(source.is_empty());
        source
            .insert_json("ok", r#"{ "keyframes": [ { "time": 1.0 } ] }"#)
            .unwrap();
        assert_eq!(source.load(&"ok".into()).unwrap().duration, 1.0);
    }
}
