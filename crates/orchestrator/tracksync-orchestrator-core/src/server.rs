//! Authority side: creates trackers and mirrors their state into the
//! shared collection.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use uuid::Uuid;

use tracksync_animation_core::{
    AnimationRef, AnimationTracker, Clock, Config, FrameScheduler, PlaybackState, TrackerRecord,
};

use crate::cache::AnimationCache;
use crate::collection::SharedCollection;
use crate::source::AssetSource;

type TrackerMap = RefCell<IndexMap<String, AnimationTracker>>;

/// Owns every tracker of one authority.
pub struct ServerAnimator {
    collection: SharedCollection,
    cache: AnimationCache,
    source: Rc<dyn AssetSource>,
    clock: Rc<dyn Clock>,
    scheduler: FrameScheduler,
    defaults: Config,
    trackers: Rc<TrackerMap>,
}

impl fmt::Debug for ServerAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerAnimator")
            .field("trackers", &self.trackers.borrow().len())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ServerAnimator {
    pub fn new(
        collection: SharedCollection,
        cache: AnimationCache,
        source: Rc<dyn AssetSource>,
        clock: Rc<dyn Clock>,
        scheduler: FrameScheduler,
        defaults: Config,
    ) -> Self {
        Self {
            collection,
            cache,
            source,
            clock,
            scheduler,
            defaults,
            trackers: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// Create a stopped tracker for `reference`, publish its record, and
    /// keep the record in sync until the tracker is destroyed.
    pub fn load_animation(
        &self,
        name: &str,
        reference: impl Into<AnimationRef>,
    ) -> Result<AnimationTracker> {
        let reference = reference.into();
        let cached = self
            .cache
            .get_or_load(&reference, self.source.as_ref())
            .with_context(|| format!("cannot create tracker '{name}'"))?;

        let id = Uuid::new_v4().to_string();
        let state = PlaybackState::stopped(cached.priority, cached.looped)
            .with_fade_time(self.defaults.fade_time)
            .with_weight(self.defaults.weight)
            .with_speed(self.defaults.speed);
        let record = TrackerRecord {
            name: name.to_string(),
            id: id.clone(),
            config: cached.config,
            state,
        };
        self.collection.insert(record.clone());

        let tracker = AnimationTracker::with_config(
            record,
            self.defaults,
            self.clock.clone(),
            self.scheduler.clone(),
        );

        let collection = self.collection.clone();
        let sync_id = id.clone();
        tracker.subscribe(move |next, _| collection.update_state(&sync_id, *next));

        let collection = self.collection.clone();
        let trackers: Weak<TrackerMap> = Rc::downgrade(&self.trackers);
        let cleanup_id = id.clone();
        tracker.destroying().connect(move |_| {
            collection.remove(&cleanup_id);
            if let Some(trackers) = trackers.upgrade() {
                trackers.borrow_mut().shift_remove(&cleanup_id);
            }
        });

        debug!("loaded '{name}' from '{reference}' as {id}");
        self.trackers.borrow_mut().insert(id, tracker.clone());
        Ok(tracker)
    }

    pub fn get_animation(&self, id: &str) -> Option<AnimationTracker> {
        self.trackers.borrow().get(id).cloned()
    }

    /// Live trackers in creation order.
    pub fn trackers(&self) -> Vec<AnimationTracker> {
        self.trackers.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.trackers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.borrow().is_empty()
    }

    pub fn collection(&self) -> &SharedCollection {
        &self.collection
    }

    pub fn cache(&self) -> &AnimationCache {
        &self.cache
    }

    /// Destroy every tracker; their records leave the collection.
    pub fn destroy(&self) {
        for tracker in self.trackers() {
            tracker.destroy();
        }
        self.trackers.borrow_mut().clear();
    }
}
