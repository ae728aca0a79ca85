use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use tracksync_animation_core::{
    parse_animation_asset_json, AnimationRef, AnimationTracker, Config, FrameScheduler,
    ManualClock, PlayOptions, PlaybackState, Priority, TrackerRecord,
};
use tracksync_test_fixtures::{animations, configs};

fn wave_record(state: PlaybackState) -> TrackerRecord {
    let asset = parse_animation_asset_json(&animations::json("wave").unwrap()).unwrap();
    TrackerRecord {
        name: "Wave".into(),
        id: "wave-1".into(),
        config: Arc::new(asset.into_config(AnimationRef::new("wave")).unwrap()),
        state,
    }
}

fn counter(signal: &tracksync_animation_core::Signal<()>) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    signal.connect(move |_| c.set(c.get() + 1));
    count
}

#[test]
fn play_uses_config_defaults() {
    let defaults = Config::from_json(&configs::json("slow-fade").unwrap()).unwrap();
    let clock = ManualClock::new(0.0);
    let tracker = AnimationTracker::with_config(
        wave_record(PlaybackState::default()),
        defaults,
        Rc::new(clock.clone()),
        FrameScheduler::new(),
    );
    tracker.play(PlayOptions::new());
    assert_eq!(tracker.fade_time(), 0.5);
    assert_eq!(tracker.weight(), 1.0);
    assert_eq!(tracker.speed(), 1.0);

    tracker.play(PlayOptions::new().fade_time(0.2).weight(0.4).speed(2.0));
    assert_eq!(tracker.fade_time(), 0.2);
    assert_eq!(tracker.weight(), 0.4);
    assert_abs_diff_eq!(tracker.end_time(), 5.0);
}

#[test]
fn stop_uses_default_fade_and_ignores_repeat() {
    let clock = ManualClock::new(0.0);
    let sched = FrameScheduler::new();
    let tracker = AnimationTracker::new(
        wave_record(PlaybackState::default()),
        Rc::new(clock.clone()),
        sched.clone(),
    );
    let stopped = counter(&tracker.stopped());
    let ended = counter(&tracker.ended());

    tracker.stop(None);
    assert_eq!(stopped.get(), 0);

    tracker.play(PlayOptions::new());
    clock.set(1.0);
    tracker.stop(None);
    tracker.stop(None);
    assert_eq!(stopped.get(), 1);
    assert_eq!(tracker.fade_time(), 0.1);

    clock.set(1.1);
    sched.tick();
    assert_eq!(ended.get(), 1);
}

#[test]
fn priority_and_loop_flags_replace_state() {
    let clock = ManualClock::new(0.0);
    let tracker = AnimationTracker::new(
        wave_record(PlaybackState::stopped(Priority::Action, false)),
        Rc::new(clock.clone()),
        FrameScheduler::new(),
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    tracker.subscribe(move |next, prev| s.borrow_mut().push((prev.priority, next.priority)));

    tracker.set_priority(Priority::Action3);
    tracker.set_priority(Priority::Action3);
    tracker.set_looped(true);
    assert_eq!(tracker.priority(), Priority::Action3);
    assert!(tracker.looped());
    assert_eq!(
        *seen.borrow(),
        vec![
            (Priority::Action, Priority::Action3),
            (Priority::Action3, Priority::Action3)
        ]
    );
}

#[test]
fn destroy_silences_everything() {
    let clock = ManualClock::new(0.0);
    let sched = FrameScheduler::new();
    let tracker = AnimationTracker::new(
        wave_record(PlaybackState::default()),
        Rc::new(clock.clone()),
        sched.clone(),
    );
    let stopped = counter(&tracker.stopped());
    let ended = counter(&tracker.ended());
    let destroying = counter(&tracker.destroying());
    let markers = Rc::new(Cell::new(0));
    let m = markers.clone();
    tracker.marker_reached().connect(move |_| m.set(m.get() + 1));

    tracker.play(PlayOptions::new());
    sched.tick();
    assert_eq!(markers.get(), 1);

    tracker.destroy();
    assert!(tracker.is_destroyed());
    assert!(!tracker.is_playing());
    assert_eq!(stopped.get(), 1);
    assert_eq!(destroying.get(), 1);
    assert!(sched.is_empty());

    tracker.play(PlayOptions::new());
    tracker.destroy();
    clock.set(20.0);
    sched.tick();
    assert!(!tracker.is_playing());
    assert_eq!(markers.get(), 1);
    assert_eq!(ended.get(), 0);
    assert_eq!(destroying.get(), 1);
    assert_eq!(tracker.stopped().handler_count(), 0);
}

#[test]
fn destroy_from_marker_handler_stops_the_batch() {
    let clock = ManualClock::new(0.0);
    let sched = FrameScheduler::new();
    let tracker = AnimationTracker::new(
        wave_record(PlaybackState::default()),
        Rc::new(clock.clone()),
        sched.clone(),
    );
    let names = Rc::new(RefCell::new(Vec::new()));
    let n = names.clone();
    tracker
        .marker_reached()
        .connect(move |ev| n.borrow_mut().push(ev.name.clone()));
    let t = tracker.clone();
    tracker.marker_signal("Peak").connect(move |_| t.destroy());

    tracker.play(PlayOptions::new());
    clock.set(10.0);
    sched.tick();
    assert_eq!(*names.borrow(), vec!["Start"]);
    assert!(tracker.is_destroyed());
}

#[test]
fn dropping_last_handle_cancels_its_task() {
    let clock = ManualClock::new(0.0);
    let sched = FrameScheduler::new();
    {
        let tracker = AnimationTracker::new(
            wave_record(PlaybackState::default()),
            Rc::new(clock.clone()),
            sched.clone(),
        );
        tracker.play(PlayOptions::new());
        assert_eq!(sched.len(), 1);
    }
    assert!(sched.is_empty());
    sched.tick();
}

#[test]
fn playing_record_is_adopted_mid_cycle() {
    let clock = ManualClock::new(6.0);
    let sched = FrameScheduler::new();
    let state = PlaybackState::default()
        .with_playing(true)
        .with_timing(0.0, 0.0, 10.0);
    let tracker = AnimationTracker::new(wave_record(state), Rc::new(clock.clone()), sched.clone());

    let names: Vec<_> = tracker
        .pending_markers()
        .into_iter()
        .map(|m| m.value)
        .collect();
    assert_eq!(names, vec!["swish", "end"]);

    let stopped = counter(&tracker.stopped());
    sched.tick();
    assert!(tracker.is_playing());
    clock.set(10.0);
    sched.tick();
    assert_eq!(stopped.get(), 1);
}
