//! Shared cache of loaded animation configs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use hashbrown::HashMap;
use log::{debug, warn};

use tracksync_animation_core::{AnimationConfig, AnimationRef, Priority};

use crate::source::AssetSource;

/// Config plus the asset's defaults for a new tracker's state.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedAnimation {
    pub config: Arc<AnimationConfig>,
    pub priority: Priority,
    pub looped: bool,
}

/// Cache keyed by [`AnimationRef`]. Clones share the same entries, so one
/// cache can back several animators.
#[derive(Clone, Default)]
pub struct AnimationCache {
    entries: Rc<RefCell<HashMap<AnimationRef, CachedAnimation>>>,
}

impl fmt::Debug for AnimationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl AnimationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &AnimationRef) -> Option<CachedAnimation> {
        self.entries.borrow().get(reference).cloned()
    }

    pub fn insert(&self, reference: AnimationRef, entry: CachedAnimation) {
        self.entries.borrow_mut().insert(reference, entry);
    }

    /// Return the cached entry, or load it from `source` and remember it.
    /// Failed loads are not cached.
    pub fn get_or_load(
        &self,
        reference: &AnimationRef,
        source: &dyn AssetSource,
    ) -> Result<CachedAnimation> {
        if let Some(hit) = self.get(reference) {
            return Ok(hit);
        }
        let loaded = source
            .load(reference)
            .and_then(|asset| {
                let priority = asset.priority;
                let looped = asset.looped;
                let config = asset.into_config(reference.clone())?;
                Ok(CachedAnimation {
                    config: Arc::new(config),
                    priority,
                    looped,
                })
            })
            .with_context(|| format!("loading animation '{reference}'"));
        match loaded {
            Ok(entry) => {
                debug!(
                    "cached '{reference}' (duration {}s, {} markers)",
                    entry.config.duration(),
                    entry.config.markers().len()
                );
                self.insert(reference.clone(), entry.clone());
                Ok(entry)
            }
            Err(err) => {
                warn!("{err:#}");
                Err(err)
            }
        }
    }

    pub fn contains(&self, reference: &AnimationRef) -> bool {
        self.entries.borrow().contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
