//! Authority-side animation tracker.
//!
//! A tracker owns one [`PlaybackState`] and the static [`AnimationConfig`] of
//! its animation. Operations replace the state wholesale; a per-frame task on
//! the [`FrameScheduler`] derives progress from the clock, fires due markers
//! and handles end-of-cycle (loop or stop). After `stop`, the same task slot
//! hosts a one-shot fade-out watcher that emits `ended`.
//!
//! All operations are total: calls that make no sense in the current state
//! (e.g. `adjust_speed` while stopped) are no-ops.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use hashbrown::HashMap;
use log::{debug, trace};

use crate::clock::Clock;
use crate::config::Config;
use crate::data::{AnimationConfig, MarkerEvent, PendingMarker, TrackerRecord};
use crate::progress::{compute_speed_change, remaining_end_time};
use crate::reactive::{Connection, Observable, Signal};
use crate::scheduler::{FrameScheduler, TaskHandle};
use crate::state::{PlaybackState, Priority, TrackerPhase};

/// Optional arguments of [`AnimationTracker::play`]; unset fields fall back
/// to the tracker's [`Config`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayOptions {
    pub fade_time: Option<f64>,
    pub weight: Option<f64>,
    pub speed: Option<f64>,
}

impl PlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fade_time(mut self, fade_time: f64) -> Self {
        self.fade_time = Some(fade_time);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}

#[derive(Default)]
struct TrackerSignals {
    stopped: Signal<()>,
    ended: Signal<()>,
    did_loop: Signal<()>,
    marker_reached: Signal<MarkerEvent>,
    markers: RefCell<HashMap<String, Signal<String>>>,
    destroying: Signal<()>,
}

impl TrackerSignals {
    fn disconnect_all(&self) {
        self.stopped.disconnect_all();
        self.ended.disconnect_all();
        self.did_loop.disconnect_all();
        self.marker_reached.disconnect_all();
        self.destroying.disconnect_all();
        let markers: Vec<_> = self.markers.borrow_mut().drain().collect();
        for (_, signal) in markers {
            signal.disconnect_all();
        }
    }
}

struct TrackerInner {
    name: String,
    id: String,
    config: Arc<AnimationConfig>,
    defaults: Config,
    clock: Rc<dyn Clock>,
    scheduler: FrameScheduler,
    state: Observable<PlaybackState>,
    // ascending by required progress; fired entries are drained from the front
    pending: RefCell<Vec<PendingMarker>>,
    // cycle evaluator while playing, fade-out watcher after stop
    task: RefCell<Option<TaskHandle>>,
    // bumped on every play so stale marker batches can bail out
    cycle: Cell<u64>,
    signals: TrackerSignals,
    destroyed: Cell<bool>,
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel();
        }
    }
}

/// Shared handle to one tracked animation instance.
#[derive(Clone)]
pub struct AnimationTracker {
    inner: Rc<TrackerInner>,
}

impl fmt::Debug for AnimationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationTracker")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl AnimationTracker {
    /// Create a tracker for `record` with default playback settings.
    pub fn new(record: TrackerRecord, clock: Rc<dyn Clock>, scheduler: FrameScheduler) -> Self {
        Self::with_config(record, Config::default(), clock, scheduler)
    }

    /// Create a tracker for `record`. A record that is already mid-cycle is
    /// adopted: evaluation resumes and only markers ahead of the current
    /// progress stay pending.
    pub fn with_config(
        record: TrackerRecord,
        defaults: Config,
        clock: Rc<dyn Clock>,
        scheduler: FrameScheduler,
    ) -> Self {
        let TrackerRecord {
            name,
            id,
            config,
            state,
        } = record;
        let tracker = Self {
            inner: Rc::new(TrackerInner {
                name,
                id,
                config,
                defaults,
                clock,
                scheduler,
                state: Observable::new(state),
                pending: RefCell::new(Vec::new()),
                task: RefCell::new(None),
                cycle: Cell::new(0),
                signals: TrackerSignals::default(),
                destroyed: Cell::new(false),
            }),
        };
        if state.is_playing {
            let progress = state.progress_at(tracker.now());
            let mut pending = tracker.inner.config.pending_markers();
            pending.retain(|m| m.required_progress > progress);
            *tracker.inner.pending.borrow_mut() = pending;
            tracker.start_cycle_task();
        }
        tracker
    }

    #[inline]
    fn now(&self) -> f64 {
        self.inner.clock.now()
    }

    #[inline]
    fn duration(&self) -> f64 {
        self.inner.config.duration()
    }

    fn commit(&self, next: PlaybackState) {
        self.inner.state.set(next);
    }

    fn is_usable(&self, op: &str) -> bool {
        if self.inner.destroyed.get() {
            debug!("{op} ignored: tracker '{}' is destroyed", self.inner.id);
            return false;
        }
        true
    }

    fn replace_task(&self, next: Option<TaskHandle>) {
        let prev = std::mem::replace(&mut *self.inner.task.borrow_mut(), next);
        if let Some(prev) = prev {
            prev.cancel();
        }
    }

    fn start_cycle_task(&self) {
        let weak: Weak<TrackerInner> = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(move || {
            if let Some(inner) = weak.upgrade() {
                AnimationTracker { inner }.evaluate();
            }
        });
        self.replace_task(Some(handle));
    }

    fn start_fade_watch(&self, deadline: f64) {
        let weak: Weak<TrackerInner> = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let tracker = AnimationTracker { inner };
            if tracker.now() < deadline {
                return;
            }
            tracker.replace_task(None);
            debug!("'{}' ({}) ended", tracker.inner.name, tracker.inner.id);
            tracker.inner.signals.ended.fire(&());
        });
        self.replace_task(Some(handle));
    }

    /// Start a new cycle from progress 0. Legal while already playing.
    pub fn play(&self, options: PlayOptions) {
        if !self.is_usable("play") {
            return;
        }
        let defaults = self.inner.defaults;
        let fade_time = options.fade_time.unwrap_or(defaults.fade_time);
        let weight = options.weight.unwrap_or(defaults.weight);
        let speed = options.speed.unwrap_or(defaults.speed).max(0.0);

        let now = self.now();
        let end_time = if speed > 0.0 {
            remaining_end_time(now, self.duration(), 0.0, speed)
        } else {
            remaining_end_time(now, self.duration(), 0.0, 1.0)
        };

        *self.inner.pending.borrow_mut() = self.inner.config.pending_markers();
        self.inner.cycle.set(self.inner.cycle.get().wrapping_add(1));
        self.start_cycle_task();

        debug!(
            "play '{}' ({}) speed={speed} weight={weight} fade={fade_time}",
            self.inner.name, self.inner.id
        );
        let next = self
            .state()
            .with_playing(true)
            .with_speed(speed)
            .with_weight(weight)
            .with_fade_time(fade_time)
            .with_timing(0.0, now, end_time);
        self.commit(next);
    }

    /// Change the speed multiplier without a progress discontinuity.
    /// A speed of 0 pauses; negative speeds are clamped to 0.
    pub fn adjust_speed(&self, speed: f64) {
        if !self.is_usable("adjust_speed") {
            return;
        }
        let state = self.state();
        if !state.is_playing {
            return;
        }
        let speed = speed.max(0.0);
        if state.speed == 0.0 && speed == 0.0 {
            return;
        }

        let now = self.now();
        let duration = self.duration();
        let next = if state.speed == 0.0 {
            let end_time = remaining_end_time(now, duration, state.passed_progress, speed);
            state
                .with_speed(speed)
                .with_timing(state.passed_progress, now, end_time)
        } else if speed == 0.0 {
            let frozen = state.progress_at(now);
            let end_time = remaining_end_time(now, duration, frozen, 1.0);
            state.with_speed(0.0).with_timing(frozen, now, end_time)
        } else {
            let change = compute_speed_change(
                state.start_time,
                state.end_time,
                state.passed_progress,
                duration,
                speed,
                now,
            );
            state
                .with_speed(speed)
                .with_timing(change.passed_progress, now, change.end_time)
        };
        trace!(
            "'{}' ({}) speed {} -> {speed}",
            self.inner.name,
            self.inner.id,
            state.speed
        );
        self.commit(next);
    }

    /// Stop playback, emit `stopped`, and emit `ended` once the fade elapses.
    pub fn stop(&self, fade_time: Option<f64>) {
        if !self.is_usable("stop") {
            return;
        }
        let state = self.state();
        if !state.is_playing {
            return;
        }
        let fade_time = fade_time.unwrap_or(self.inner.defaults.fade_time).max(0.0);
        self.replace_task(None);

        let now = self.now();
        let frozen = state.progress_at(now);
        debug!(
            "stop '{}' ({}) at progress {frozen:.3} fade={fade_time}",
            self.inner.name, self.inner.id
        );
        self.commit(
            state
                .with_playing(false)
                .with_fade_time(fade_time)
                .with_timing(frozen, 0.0, 0.0),
        );
        self.inner.signals.stopped.fire(&());

        // a stopped handler may have restarted or destroyed us
        if self.inner.destroyed.get() || self.state().is_playing {
            return;
        }
        self.start_fade_watch(now + fade_time);
    }

    pub fn set_priority(&self, priority: Priority) {
        if !self.is_usable("set_priority") {
            return;
        }
        self.commit(self.state().with_priority(priority));
    }

    pub fn set_looped(&self, looped: bool) {
        if !self.is_usable("set_looped") {
            return;
        }
        self.commit(self.state().with_looped(looped));
    }

    /// One frame of cycle evaluation.
    fn evaluate(&self) {
        let state = self.state();
        if !state.is_playing || state.speed == 0.0 {
            return;
        }
        let progress = state.progress_at(self.now());
        let cycle = self.inner.cycle.get();

        let due: Vec<PendingMarker> = {
            let mut pending = self.inner.pending.borrow_mut();
            let reached = pending.partition_point(|m| m.required_progress <= progress);
            pending.drain(..reached).collect()
        };
        for marker in due {
            if !self.cycle_is_live(cycle) {
                return;
            }
            self.fire_marker(marker, cycle);
        }

        if progress < 1.0 {
            return;
        }
        // a marker handler already took over the tracker
        if self.inner.destroyed.get() || self.state() != state {
            return;
        }
        if state.looped {
            debug!("'{}' ({}) looped", self.inner.name, self.inner.id);
            self.inner.signals.did_loop.fire(&());
            if self.inner.destroyed.get() || self.state() != state {
                return;
            }
            self.play(PlayOptions {
                fade_time: Some(state.fade_time),
                weight: Some(state.weight),
                speed: Some(state.speed),
            });
        } else {
            // fade out over the fade the cycle was started with
            self.stop(Some(state.fade_time));
        }
    }

    /// Still the same playing, undestroyed cycle that `cycle` was read from.
    fn cycle_is_live(&self, cycle: u64) -> bool {
        !self.inner.destroyed.get()
            && self.inner.cycle.get() == cycle
            && self.inner.state.with(|s| s.is_playing)
    }

    fn fire_marker(&self, marker: PendingMarker, cycle: u64) {
        trace!(
            "'{}' ({}) marker '{}' = '{}'",
            self.inner.name,
            self.inner.id,
            marker.name,
            marker.value
        );
        let named = self.inner.signals.markers.borrow().get(&marker.name).cloned();
        if let Some(signal) = named {
            signal.fire(&marker.value);
            // a per-name handler may have stopped, replayed or destroyed us
            if !self.cycle_is_live(cycle) {
                return;
            }
        }
        self.inner.signals.marker_reached.fire(&MarkerEvent {
            name: marker.name,
            value: marker.value,
        });
    }

    /// Tear down: stop if playing, cancel all tasks, notify `destroying`,
    /// then drop every subscriber. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.get() {
            return;
        }
        self.stop(None);
        self.inner.destroyed.set(true);
        self.replace_task(None);
        self.inner.pending.borrow_mut().clear();
        debug!("destroy '{}' ({})", self.inner.name, self.inner.id);
        self.inner.signals.destroying.fire(&());
        self.inner.signals.disconnect_all();
        self.inner.state.unsubscribe_all();
    }

    // --- notifications ---

    /// Per-name marker stream carrying the marker value.
    pub fn marker_signal(&self, name: &str) -> Signal<String> {
        self.inner
            .signals
            .markers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Catch-all marker stream.
    pub fn marker_reached(&self) -> Signal<MarkerEvent> {
        self.inner.signals.marker_reached.clone()
    }

    pub fn stopped(&self) -> Signal<()> {
        self.inner.signals.stopped.clone()
    }

    pub fn ended(&self) -> Signal<()> {
        self.inner.signals.ended.clone()
    }

    pub fn did_loop(&self) -> Signal<()> {
        self.inner.signals.did_loop.clone()
    }

    /// Fired once from `destroy`, before subscribers are released.
    pub fn destroying(&self) -> Signal<()> {
        self.inner.signals.destroying.clone()
    }

    /// Observe committed state replacements as `(next, prev)`.
    pub fn subscribe(&self, handler: impl Fn(&PlaybackState, &PlaybackState) + 'static) -> Connection {
        self.inner.state.subscribe(handler)
    }

    /// The state cell itself, e.g. to project it locally.
    pub fn state_cell(&self) -> Observable<PlaybackState> {
        self.inner.state.clone()
    }

    // --- accessors ---

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.inner.state.get()
    }

    pub fn record(&self) -> TrackerRecord {
        TrackerRecord {
            name: self.inner.name.clone(),
            id: self.inner.id.clone(),
            config: self.inner.config.clone(),
            state: self.state(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn config(&self) -> &Arc<AnimationConfig> {
        &self.inner.config
    }

    pub fn phase(&self) -> TrackerPhase {
        self.state().phase()
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing
    }

    pub fn passed_progress(&self) -> f64 {
        self.state().passed_progress
    }

    pub fn start_time(&self) -> f64 {
        self.state().start_time
    }

    pub fn end_time(&self) -> f64 {
        self.state().end_time
    }

    pub fn weight(&self) -> f64 {
        self.state().weight
    }

    pub fn fade_time(&self) -> f64 {
        self.state().fade_time
    }

    pub fn speed(&self) -> f64 {
        self.state().speed
    }

    pub fn priority(&self) -> Priority {
        self.state().priority
    }

    pub fn looped(&self) -> bool {
        self.state().looped
    }

    /// Normalized progress right now.
    pub fn progress(&self) -> f64 {
        self.state().progress_at(self.now())
    }

    /// Playback position in seconds right now.
    pub fn time_position(&self) -> f64 {
        self.progress() * self.duration()
    }

    /// Markers still waiting to fire in the current cycle.
    pub fn pending_markers(&self) -> Vec<PendingMarker> {
        self.inner.pending.borrow().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }
}
