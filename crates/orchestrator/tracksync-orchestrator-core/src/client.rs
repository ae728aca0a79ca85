//! Renderer side: projects every record of the shared collection onto a
//! render target.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::debug;

use tracksync_animation_core::{
    Clock, Connection, Observable, PlaybackState, RenderProjector, SharedTarget, TrackerRecord,
};

use crate::collection::{CollectionChange, SharedCollection};

/// Builds the render target for a newly seen record.
pub type TargetFactory = Box<dyn Fn(&TrackerRecord) -> SharedTarget>;

struct Projection {
    state: Observable<PlaybackState>,
    projector: RenderProjector,
}

struct ClientInner {
    collection: SharedCollection,
    clock: Rc<dyn Clock>,
    factory: TargetFactory,
    projections: RefCell<IndexMap<String, Projection>>,
    connection: RefCell<Option<Connection>>,
    destroyed: Cell<bool>,
}

impl ClientInner {
    fn on_change(&self, change: &CollectionChange) {
        match change {
            CollectionChange::Added(record) | CollectionChange::Changed(record) => {
                self.project(record)
            }
            CollectionChange::Removed(id) => self.forget(id),
        }
    }

    fn project(&self, record: &TrackerRecord) {
        let existing = self
            .projections
            .borrow()
            .get(&record.id)
            .map(|p| p.state.clone());
        if let Some(state) = existing {
            state.set(record.state);
            return;
        }

        debug!("projecting '{}' ({})", record.name, record.id);
        let target = (self.factory)(record);
        let state = Observable::new(record.state);
        let projector = RenderProjector::new(
            state.clone(),
            record.config.clone(),
            target,
            self.clock.clone(),
        );
        self.projections
            .borrow_mut()
            .insert(record.id.clone(), Projection { state, projector });
    }

    fn forget(&self, id: &str) {
        let removed = self.projections.borrow_mut().shift_remove(id);
        if let Some(projection) = removed {
            debug!("dropping projection {id}");
            projection.projector.destroy();
        }
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            connection.disconnect();
        }
    }
}

/// Mirrors a [`SharedCollection`] into render targets, one projector per record.
pub struct ClientAnimator {
    inner: Rc<ClientInner>,
}

impl fmt::Debug for ClientAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientAnimator")
            .field("projections", &self.inner.projections.borrow().len())
            .field("started", &self.is_started())
            .finish()
    }
}

impl ClientAnimator {
    pub fn new(
        collection: SharedCollection,
        clock: Rc<dyn Clock>,
        factory: impl Fn(&TrackerRecord) -> SharedTarget + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                collection,
                clock,
                factory: Box::new(factory),
                projections: RefCell::new(IndexMap::new()),
                connection: RefCell::new(None),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Project every existing record, then follow additions, changes and
    /// removals. Calling it again is a no-op.
    pub fn start(&self) {
        if self.is_started() || self.inner.destroyed.get() {
            return;
        }
        for record in self.inner.collection.snapshot() {
            self.inner.project(&record);
        }
        let weak: Weak<ClientInner> = Rc::downgrade(&self.inner);
        let connection = self.inner.collection.subscribe(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(change);
            }
        });
        *self.inner.connection.borrow_mut() = Some(connection);
    }

    pub fn is_started(&self) -> bool {
        self.inner.connection.borrow().is_some()
    }

    /// Target bound to record `id`, if projected.
    pub fn target(&self, id: &str) -> Option<SharedTarget> {
        self.inner
            .projections
            .borrow()
            .get(id)
            .map(|p| p.projector.target().clone())
    }

    /// Locally observed state of record `id`.
    pub fn state(&self, id: &str) -> Option<PlaybackState> {
        self.inner.projections.borrow().get(id).map(|p| p.state.get())
    }

    pub fn len(&self) -> usize {
        self.inner.projections.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.projections.borrow().is_empty()
    }

    /// Stop observing the collection and release every projector. Targets
    /// are left as they are.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        if let Some(connection) = self.inner.connection.borrow_mut().take() {
            connection.disconnect();
        }
        let projections: Vec<Projection> = self
            .inner
            .projections
            .borrow_mut()
            .drain(..)
            .map(|(_, p)| p)
            .collect();
        for projection in projections {
            projection.projector.destroy();
        }
    }
}
