use std::rc::Rc;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use tracksync_animation_core::{
    compute_progress, AnimationConfig, AnimationTracker, FrameScheduler, ManualClock,
    PlayOptions, PlaybackState, TrackerPhase, TrackerRecord,
};

fn mk_tracker(duration: f64) -> (AnimationTracker, ManualClock, FrameScheduler) {
    let clock = ManualClock::new(0.0);
    let sched = FrameScheduler::new();
    let config = AnimationConfig::new("test://anim".into(), duration, vec![]).expect("config");
    let record = TrackerRecord {
        name: "Anim".into(),
        id: "inst-1".into(),
        config: Arc::new(config),
        state: PlaybackState::default(),
    };
    let tracker = AnimationTracker::new(record, Rc::new(clock.clone()), sched.clone());
    (tracker, clock, sched)
}

#[test]
fn play_spans_zero_to_one() {
    for &(duration, speed) in &[(10.0, 1.0), (2.5, 0.5), (0.3, 4.0), (120.0, 1.7)] {
        let (tracker, clock, _sched) = mk_tracker(duration);
        clock.set(42.0);
        tracker.play(PlayOptions::new().speed(speed));
        let s = tracker.state();
        assert_eq!(s.start_time, 42.0);
        assert_abs_diff_eq!(s.end_time, 42.0 + duration / speed, epsilon = 1e-9);
        assert_eq!(
            compute_progress(s.start_time, s.end_time, s.passed_progress, s.start_time),
            0.0
        );
        assert_eq!(
            compute_progress(s.start_time, s.end_time, s.passed_progress, s.end_time),
            1.0
        );
    }
}

#[test]
fn speed_change_at_half_reanchors_interval() {
    let (tracker, clock, _sched) = mk_tracker(10.0);
    tracker.play(PlayOptions::new());
    clock.set(5.0);
    assert_abs_diff_eq!(tracker.progress(), 0.5);

    tracker.adjust_speed(2.0);
    let s = tracker.state();
    assert_abs_diff_eq!(s.passed_progress, 0.5);
    assert_eq!(s.start_time, 5.0);
    // the remaining half of a 10s clip at double speed takes 2.5s
    assert_abs_diff_eq!(s.end_time, 7.5);

    clock.set(6.25);
    assert_abs_diff_eq!(tracker.progress(), 0.75);
    assert_abs_diff_eq!(compute_progress(5.0, 10.0, 0.5, 7.5), 0.75);
}

#[test]
fn repeated_speed_changes_do_not_drift() {
    let (tracker, clock, _sched) = mk_tracker(30.0);
    tracker.play(PlayOptions::new());
    let steps = [(1.3, 2.0), (2.9, 0.25), (4.0, 3.5), (4.6, 1.0), (7.1, 0.8), (9.9, 5.0)];
    for &(t, speed) in &steps {
        clock.set(t);
        let before = tracker.progress();
        tracker.adjust_speed(speed);
        assert_abs_diff_eq!(tracker.passed_progress(), before, epsilon = 1e-12);
        assert_abs_diff_eq!(tracker.progress(), before, epsilon = 1e-12);
    }
}

#[test]
fn pause_resume_round_trip_has_no_jump() {
    let (tracker, clock, _sched) = mk_tracker(8.0);
    tracker.play(PlayOptions::new());
    clock.set(3.0);
    let at_pause = tracker.progress();
    tracker.adjust_speed(0.0);
    assert_eq!(tracker.phase(), TrackerPhase::Paused);
    assert_abs_diff_eq!(tracker.passed_progress(), at_pause);

    clock.set(50.0);
    assert_abs_diff_eq!(tracker.progress(), at_pause);
    assert_abs_diff_eq!(tracker.time_position(), at_pause * 8.0);

    tracker.adjust_speed(2.0);
    assert_eq!(tracker.phase(), TrackerPhase::Playing);
    assert_abs_diff_eq!(tracker.progress(), at_pause);
    let s = tracker.state();
    assert_eq!(s.start_time, 50.0);
    assert_abs_diff_eq!(s.end_time, 50.0 + 8.0 * (1.0 - at_pause) / 2.0);
}

#[test]
fn adjust_speed_is_idempotent_at_same_speed() {
    let (tracker, clock, _sched) = mk_tracker(10.0);
    tracker.play(PlayOptions::new().speed(1.5));
    clock.set(2.0);
    tracker.adjust_speed(1.5);
    let once = tracker.state();
    tracker.adjust_speed(1.5);
    assert_eq!(tracker.state(), once);

    tracker.adjust_speed(0.0);
    let paused = tracker.state();
    clock.set(4.0);
    tracker.adjust_speed(0.0);
    assert_eq!(tracker.state(), paused);
}

#[test]
fn adjust_speed_while_stopped_is_noop() {
    let (tracker, _clock, _sched) = mk_tracker(10.0);
    let before = tracker.state();
    tracker.adjust_speed(3.0);
    assert_eq!(tracker.state(), before);
}

#[test]
fn negative_speed_clamps_to_pause() {
    let (tracker, clock, _sched) = mk_tracker(10.0);
    tracker.play(PlayOptions::new());
    clock.set(1.0);
    tracker.adjust_speed(-4.0);
    assert_eq!(tracker.speed(), 0.0);
    assert!(tracker.state().is_paused());
    assert_abs_diff_eq!(tracker.passed_progress(), 0.1);
}

#[test]
fn stop_freezes_progress_and_clears_interval() {
    let (tracker, clock, _sched) = mk_tracker(4.0);
    tracker.play(PlayOptions::new());
    clock.set(1.0);
    tracker.stop(Some(0.25));
    let s = tracker.state();
    assert!(!s.is_playing);
    assert_eq!((s.start_time, s.end_time), (0.0, 0.0));
    assert_eq!(s.fade_time, 0.25);
    assert_abs_diff_eq!(s.passed_progress, 0.25);
    clock.set(3.0);
    assert_abs_diff_eq!(tracker.time_position(), 1.0);
}
