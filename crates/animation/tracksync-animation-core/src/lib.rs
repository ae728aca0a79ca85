//! Tracksync Animation Core
//!
//! Playback state that can be replicated as a small value: the authority
//! commits absolute timestamps, and every reader recomputes progress from the
//! clock. This crate holds the progress math, the authority-side tracker
//! (play/pause/speed/loop/stop and marker events), and the renderer-side
//! projector that turns state diffs into render-target commands.

pub mod asset;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod progress;
pub mod projector;
pub mod reactive;
pub mod scheduler;
pub mod state;
pub mod target;
pub mod tracker;

// Re-exports for consumers (orchestrators, host adapters)
pub use asset::parse_animation_asset_json;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, DEFAULT_FADE_TIME};
pub use data::{
    AnimationAsset, AnimationConfig, AnimationRef, MarkerDef, MarkerEvent, PendingMarker,
    TrackerRecord,
};
pub use error::TrackSyncError;
pub use progress::{compute_progress, compute_speed_change, SpeedChange};
pub use projector::{project_transition, RenderProjector, SharedTarget};
pub use reactive::{Connection, Observable, Signal};
pub use scheduler::{FrameScheduler, TaskHandle, TaskId};
pub use state::{PlaybackState, Priority, TrackerPhase};
pub use target::{HeadlessTarget, RenderTarget, TargetCommand};
pub use tracker::{AnimationTracker, PlayOptions};

/// Result type for config construction and asset loading.
pub type Result<T> = core::result::Result<T, TrackSyncError>;
