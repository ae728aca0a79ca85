//! Time sources.
//!
//! All timestamps are seconds on a clock shared by the authority and every
//! renderer. Hosts normally align `SystemClock` to the authority with an
//! offset; tests drive a `ManualClock`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of the current time in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Monotonic wall clock: seconds since construction plus a fixed offset.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    offset: f64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::with_offset(0.0)
    }

    /// Clock reading `offset` at construction, e.g. the authority's time.
    pub fn with_offset(offset: f64) -> Self {
        Self {
            origin: Instant::now(),
            offset,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.offset + self.origin.elapsed().as_secs_f64()
    }
}

/// Settable clock; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
