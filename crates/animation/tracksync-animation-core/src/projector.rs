//! Renderer-side projection of playback state onto a render target.
//!
//! The projector diffs consecutive states and only touches the target fields
//! that changed; restarting playback on a target is visibly disruptive.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, trace};

use crate::clock::Clock;
use crate::data::AnimationConfig;
use crate::progress::compute_progress;
use crate::reactive::{Connection, Observable};
use crate::state::PlaybackState;
use crate::target::RenderTarget;

/// Render target shared between a projector and its owner.
pub type SharedTarget = Rc<RefCell<dyn RenderTarget>>;

/// Start playback on `target` to match `state`.
fn apply_play(target: &mut dyn RenderTarget, state: &PlaybackState, duration: f64, now: f64) {
    debug!(
        "projector play speed={} weight={} fade={}",
        state.speed, state.weight, state.fade_time
    );
    target.play(state.fade_time, state.weight, state.speed);
    target.set_looped(state.looped);
    target.set_priority(state.priority);
    // a paused state sits at its frozen progress regardless of the interval
    target.set_time_position(state.progress_at(now) * duration);
}

/// Issue the minimal commands that move `target` from `prev` to `next`.
pub fn project_transition(
    target: &mut dyn RenderTarget,
    prev: &PlaybackState,
    next: &PlaybackState,
    duration: f64,
    now: f64,
) {
    if !next.is_playing {
        debug!("projector stop fade={}", next.fade_time);
        target.stop(next.fade_time);
        return;
    }
    if !prev.is_playing {
        apply_play(target, next, duration, now);
        return;
    }

    if next.passed_progress != prev.passed_progress || next.speed != prev.speed {
        target.set_speed(next.speed);
        let progress = if next.speed == 0.0 {
            next.passed_progress
        } else {
            compute_progress(next.start_time, next.end_time, next.passed_progress, now)
        };
        trace!("projector cursor -> {:.3}", progress * duration);
        target.set_time_position(progress * duration);
    }
    if next.looped != prev.looped {
        target.set_looped(next.looped);
    }
    if next.priority != prev.priority {
        target.set_priority(next.priority);
    }
    if next.weight != prev.weight {
        target.set_weight(next.weight);
    }
}

/// Keeps one render target in line with one observed playback state.
pub struct RenderProjector {
    state: Observable<PlaybackState>,
    target: SharedTarget,
    connection: Connection,
}

impl fmt::Debug for RenderProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderProjector")
            .field("state", &self.state.get())
            .field("active", &self.connection.is_connected())
            .finish()
    }
}

impl RenderProjector {
    /// Bind `target` to `state`. A state that is already playing is applied
    /// immediately.
    pub fn new(
        state: Observable<PlaybackState>,
        config: Arc<AnimationConfig>,
        target: SharedTarget,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let initial = state.get();
        if initial.is_playing {
            apply_play(
                &mut *target.borrow_mut(),
                &initial,
                config.duration(),
                clock.now(),
            );
        }

        let sub_target = target.clone();
        let connection = state.subscribe(move |next, prev| {
            project_transition(
                &mut *sub_target.borrow_mut(),
                prev,
                next,
                config.duration(),
                clock.now(),
            );
        });

        Self {
            state,
            target,
            connection,
        }
    }

    pub fn target(&self) -> &SharedTarget {
        &self.target
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.connection.is_connected()
    }

    /// Stop following the state. Idempotent.
    pub fn destroy(&self) {
        self.connection.disconnect();
    }
}

impl Drop for RenderProjector {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}
