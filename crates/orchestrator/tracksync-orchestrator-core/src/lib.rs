//! tracksync-orchestrator
//!
//! Wires the playback core into an authority/renderer pair around a shared
//! record collection:
//!
//! - [`ServerAnimator`] loads animations through an [`AssetSource`] (with an
//!   injectable [`AnimationCache`]), creates trackers and publishes their
//!   records.
//! - [`ClientAnimator`] watches the same collection and keeps one
//!   [`RenderProjector`](tracksync_animation_core::RenderProjector) per record.
//!
//! Transport is out of scope: anything that can replay [`CollectionChange`]s
//! into a collection on the other side will do.

pub mod cache;
pub mod client;
pub mod collection;
pub mod server;
pub mod source;

pub use crate::cache::{AnimationCache, CachedAnimation};
pub use crate::client::{ClientAnimator, TargetFactory};
pub use crate::collection::{CollectionChange, SharedCollection};
pub use crate::server::ServerAnimator;
pub use crate::source::{AssetSource, JsonDirectorySource, StaticSource};

/// Apply a change observed on one collection to another, e.g. after it has
/// crossed a transport.
pub fn apply_change(collection: &SharedCollection, change: CollectionChange) {
    match change {
        CollectionChange::Added(record) | CollectionChange::Changed(record) => {
            collection.insert(record)
        }
        CollectionChange::Removed(id) => {
            collection.remove(&id);
        }
    }
}
