//! Render target contract and an in-memory implementation.
//!
//! Hosts implement [`RenderTarget`] over their own animation track type.
//! [`HeadlessTarget`] keeps the same observable properties without rendering
//! anything and logs every command it receives.

use serde::{Deserialize, Serialize};

use crate::state::Priority;

/// Concrete animation track driven by a projector.
pub trait RenderTarget {
    fn play(&mut self, fade_time: f64, weight: f64, speed: f64);
    fn stop(&mut self, fade_time: f64);
    fn set_speed(&mut self, speed: f64);
    /// Current playback cursor in seconds.
    fn time_position(&self) -> f64;
    fn set_time_position(&mut self, seconds: f64);
    fn set_looped(&mut self, looped: bool);
    fn set_priority(&mut self, priority: Priority);
    fn set_weight(&mut self, weight: f64);
    fn is_playing(&self) -> bool;
}

/// One command received by a [`HeadlessTarget`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetCommand {
    Play {
        fade_time: f64,
        weight: f64,
        speed: f64,
    },
    Stop {
        fade_time: f64,
    },
    SetSpeed(f64),
    SetTimePosition(f64),
    SetLooped(bool),
    SetPriority(Priority),
    SetWeight(f64),
}

/// Render target without a renderer, for dedicated servers and tests.
/// The cursor only moves when set; it does not advance with time.
#[derive(Clone, Debug)]
pub struct HeadlessTarget {
    playing: bool,
    speed: f64,
    weight: f64,
    looped: bool,
    priority: Priority,
    time_position: f64,
    commands: Vec<TargetCommand>,
}

impl Default for HeadlessTarget {
    fn default() -> Self {
        Self {
            playing: false,
            speed: 1.0,
            weight: 1.0,
            looped: false,
            priority: Priority::default(),
            time_position: 0.0,
            commands: Vec::new(),
        }
    }
}

impl HeadlessTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[TargetCommand] {
        &self.commands
    }

    /// Return and clear the command log.
    pub fn take_commands(&mut self) -> Vec<TargetCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn looped(&self) -> bool {
        self.looped
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl RenderTarget for HeadlessTarget {
    fn play(&mut self, fade_time: f64, weight: f64, speed: f64) {
        self.playing = true;
        self.weight = weight;
        self.speed = speed;
        self.commands.push(TargetCommand::Play {
            fade_time,
            weight,
            speed,
        });
    }

    fn stop(&mut self, fade_time: f64) {
        self.playing = false;
        self.commands.push(TargetCommand::Stop { fade_time });
    }

    fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
        self.commands.push(TargetCommand::SetSpeed(speed));
    }

    fn time_position(&self) -> f64 {
        self.time_position
    }

    fn set_time_position(&mut self, seconds: f64) {
        self.time_position = seconds;
        self.commands.push(TargetCommand::SetTimePosition(seconds));
    }

    fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
        self.commands.push(TargetCommand::SetLooped(looped));
    }

    fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.commands.push(TargetCommand::SetPriority(priority));
    }

    fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
        self.commands.push(TargetCommand::SetWeight(weight));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
