//! Shared record collection: the replication boundary between the authority
//! and every renderer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use tracksync_animation_core::{Connection, PlaybackState, Signal, TrackerRecord};

/// One mutation of the collection, as delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "camelCase")]
pub enum CollectionChange {
    Added(TrackerRecord),
    Changed(TrackerRecord),
    Removed(String),
}

impl CollectionChange {
    pub fn id(&self) -> &str {
        match self {
            Self::Added(record) | Self::Changed(record) => &record.id,
            Self::Removed(id) => id,
        }
    }
}

struct CollectionInner {
    records: RefCell<IndexMap<String, TrackerRecord>>,
    changes: Signal<CollectionChange>,
}

/// Keyed, insertion-ordered map of id -> [`TrackerRecord`]. Clones share
/// the same storage.
#[derive(Clone)]
pub struct SharedCollection {
    inner: Rc<CollectionInner>,
}

impl Default for SharedCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCollection")
            .field("ids", &self.ids())
            .field("subscribers", &self.inner.changes.handler_count())
            .finish()
    }
}

impl SharedCollection {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                records: RefCell::new(IndexMap::new()),
                changes: Signal::new(),
            }),
        }
    }

    pub fn get(&self, id: &str) -> Option<TrackerRecord> {
        self.inner.records.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.records.borrow().contains_key(id)
    }

    /// Insert or replace a record. Re-inserting an identical record is silent.
    pub fn insert(&self, record: TrackerRecord) {
        let change = {
            let mut records = self.inner.records.borrow_mut();
            match records.get_mut(&record.id) {
                Some(existing) if *existing == record => return,
                Some(existing) => {
                    *existing = record.clone();
                    CollectionChange::Changed(record)
                }
                None => {
                    debug!("record '{}' ({}) added", record.name, record.id);
                    records.insert(record.id.clone(), record.clone());
                    CollectionChange::Added(record)
                }
            }
        };
        self.inner.changes.fire(&change);
    }

    /// Replace only the state of an existing record. Unknown ids are ignored.
    pub fn update_state(&self, id: &str, state: PlaybackState) {
        let record = {
            let mut records = self.inner.records.borrow_mut();
            let Some(existing) = records.get_mut(id) else {
                return;
            };
            if existing.state == state {
                return;
            }
            existing.state = state;
            existing.clone()
        };
        self.inner.changes.fire(&CollectionChange::Changed(record));
    }

    pub fn remove(&self, id: &str) -> Option<TrackerRecord> {
        let removed = self.inner.records.borrow_mut().shift_remove(id)?;
        debug!("record '{}' ({}) removed", removed.name, removed.id);
        self.inner
            .changes
            .fire(&CollectionChange::Removed(removed.id.clone()));
        Some(removed)
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner.records.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.records.borrow().is_empty()
    }

    /// All records in insertion order.
    pub fn snapshot(&self) -> Vec<TrackerRecord> {
        self.inner.records.borrow().values().cloned().collect()
    }

    /// Snapshot as a JSON document, e.g. for a late-joining transport.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    pub fn subscribe(&self, handler: impl Fn(&CollectionChange) + 'static) -> Connection {
        self.inner.changes.connect(handler)
    }
}
