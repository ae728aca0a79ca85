//! Cooperative per-frame task scheduler.
//!
//! The host calls [`FrameScheduler::tick`] once per rendered frame. Tasks are
//! plain callbacks; they run on the caller's thread and may schedule or cancel
//! tasks (including themselves) while the tick is in progress.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct TaskId;
}

type Task = Box<dyn FnMut()>;

#[derive(Default)]
struct SchedulerInner {
    // `None` while the task is executing.
    tasks: RefCell<SlotMap<TaskId, Option<Task>>>,
}

impl SchedulerInner {
    fn cancel(&self, id: TaskId) -> bool {
        self.tasks.borrow_mut().remove(id).is_some()
    }
}

/// Shared handle to a frame scheduler; clones drive the same task set.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<SchedulerInner>,
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("tasks", &self.len())
            .finish()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to run on every tick until cancelled.
    pub fn schedule(&self, task: impl FnMut() + 'static) -> TaskHandle {
        let id = self.inner.tasks.borrow_mut().insert(Some(Box::new(task)));
        TaskHandle {
            id,
            scheduler: Rc::downgrade(&self.inner),
        }
    }

    /// Run every task that was registered before this tick started.
    pub fn tick(&self) {
        let ids: Vec<TaskId> = self.inner.tasks.borrow().keys().collect();
        for id in ids {
            let task = self
                .inner
                .tasks
                .borrow_mut()
                .get_mut(id)
                .and_then(Option::take);
            let Some(mut task) = task else {
                continue;
            };
            task();
            let mut tasks = self.inner.tasks.borrow_mut();
            if let Some(slot) = tasks.get_mut(id) {
                *slot = Some(task);
                continue;
            }
            drop(tasks);
            // cancelled from inside its own run
            drop(task);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registered task.
    pub fn clear(&self) {
        let drained: Vec<_> = self.inner.tasks.borrow_mut().drain().collect();
        drop(drained);
    }
}

/// Cancellation handle for one scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    scheduler: Weak<SchedulerInner>,
}

impl TaskHandle {
    /// Cancel the task. Safe to call repeatedly and from inside the task.
    /// Returns whether this call removed it.
    pub fn cancel(&self) -> bool {
        match self.scheduler.upgrade() {
            Some(inner) => inner.cancel(self.id),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|inner| inner.tasks.borrow().contains_key(self.id))
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }
}
