use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use tracksync_animation_core::{
    Config, FrameScheduler, HeadlessTarget, ManualClock, PlayOptions, SharedTarget,
};
use tracksync_orchestrator::{
    apply_change, AnimationCache, ClientAnimator, CollectionChange, JsonDirectorySource,
    ServerAnimator, SharedCollection,
};

fn main() -> anyhow::Result<()> {
    let clock = ManualClock::new(0.0);
    let scheduler = FrameScheduler::new();
    let authority = SharedCollection::new();
    let replica = SharedCollection::new();

    // Serialize every change as it would travel over the wire
    let wire = replica.clone();
    authority.subscribe(move |change| {
        let Ok(json) = serde_json::to_string(change) else {
            return;
        };
        println!("wire: {json}");
        if let Ok(change) = serde_json::from_str::<CollectionChange>(&json) {
            apply_change(&wire, change);
        }
    });

    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/animations");
    let server = ServerAnimator::new(
        authority,
        AnimationCache::new(),
        Rc::new(JsonDirectorySource::new(dir)),
        Rc::new(clock.clone()),
        scheduler.clone(),
        Config::default(),
    );

    let target = Rc::new(RefCell::new(HeadlessTarget::new()));
    let bound = target.clone();
    let client = ClientAnimator::new(replica, Rc::new(clock.clone()), move |_| {
        let shared: SharedTarget = bound.clone();
        shared
    });
    client.start();

    let walk = server.load_animation("Walk", "walk")?;
    walk.marker_signal("Footstep")
        .connect(|foot| println!("marker: Footstep {foot}"));
    walk.ended().connect(|_| println!("ended"));
    walk.play(PlayOptions::new());

    // 60 fps until the fade-out has elapsed
    for frame in 0..120 {
        clock.set(frame as f64 / 60.0);
        scheduler.tick();
        if frame == 30 {
            walk.adjust_speed(0.5);
        }
    }

    for command in target.borrow().commands() {
        println!("target: {command:?}");
    }
    server.destroy();
    Ok(())
}
