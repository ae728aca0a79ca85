//! Single-threaded reactive primitives: notification signals and observable
//! values with whole-value replacement.
//!
//! Delivery is synchronous. Handlers run after the write they observe is
//! visible and may freely re-enter (read, write, connect, disconnect).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<T> = Rc<dyn Fn(&T)>;

trait Slots {
    fn remove(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

struct SignalInner<T> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(u64, Handler<T>)>>,
}

impl<T> Slots for SignalInner<T> {
    fn remove(&self, id: u64) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        before != handlers.len()
    }

    fn contains(&self, id: u64) -> bool {
        self.handlers.borrow().iter().any(|(h, _)| *h == id)
    }
}

/// Multi-subscriber notification channel.
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                next_id: Cell::new(0),
                handlers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn connect(&self, handler: impl Fn(&T) + 'static) -> Connection {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .handlers
            .borrow_mut()
            .push((id, Rc::new(handler)));
        let slots: Weak<dyn Slots> = Rc::downgrade(&self.inner) as Weak<dyn Slots>;
        Connection { id, slots }
    }

    /// Deliver `value` to every handler connected when the fire started and
    /// still connected when its turn comes.
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<(u64, Handler<T>)> = self.inner.handlers.borrow().clone();
        for (id, handler) in snapshot {
            if self.inner.contains(id) {
                handler(value);
            }
        }
    }

    pub fn disconnect_all(&self) {
        let drained = std::mem::take(&mut *self.inner.handlers.borrow_mut());
        drop(drained);
    }

    #[inline]
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }
}

/// Handle returned by `connect`/`subscribe`.
#[derive(Clone)]
pub struct Connection {
    id: u64,
    slots: Weak<dyn Slots>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Connection {
    /// Idempotent.
    pub fn disconnect(&self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.remove(self.id);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slots
            .upgrade()
            .is_some_and(|slots| slots.contains(self.id))
    }
}

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    changed: Signal<(T, T)>,
    // writes made by handlers wait here until the running delivery ends
    queued: RefCell<VecDeque<(T, T)>>,
    delivering: Cell<bool>,
}

/// Clears the delivery flag even if a handler unwinds.
struct DeliveryGuard<'a>(&'a Cell<bool>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Single-writer, multi-reader value cell.
///
/// Writers replace the whole value; subscribers receive `(next, prev)` only
/// when the two differ. A write made from inside a handler is delivered after
/// every subscriber has seen the change being handled, so each subscriber
/// observes changes in write order.
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.changed.handler_count())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                changed: Signal::new(),
                queued: RefCell::new(VecDeque::new()),
                delivering: Cell::new(false),
            }),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify if it changed.
    pub fn set(&self, next: T) {
        let prev = std::mem::replace(&mut *self.inner.value.borrow_mut(), next.clone());
        if prev == next {
            return;
        }
        self.inner.queued.borrow_mut().push_back((next, prev));
        if self.inner.delivering.replace(true) {
            return;
        }
        let _guard = DeliveryGuard(&self.inner.delivering);
        loop {
            let change = self.inner.queued.borrow_mut().pop_front();
            let Some(change) = change else {
                break;
            };
            self.inner.changed.fire(&change);
        }
    }

    /// Build the replacement from the current value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.value.borrow());
        self.set(next);
    }

    pub fn subscribe(&self, handler: impl Fn(&T, &T) + 'static) -> Connection {
        self.inner
            .changed
            .connect(move |change: &(T, T)| handler(&change.0, &change.1))
    }

    pub fn unsubscribe_all(&self) {
        self.inner.changed.disconnect_all();
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changed.handler_count()
    }
}
