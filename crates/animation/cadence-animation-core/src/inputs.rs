//! Input contracts for the core engine.
//!
//! Commands buffered by a host (possibly from another thread) are handed to
//! Engine::update_with_inputs() and applied in order before time advances.

use serde::{Deserialize, Serialize};

use crate::animation::{EndAction, LoopingMode};
use crate::ids::AnimationId;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default)]
    pub commands: Vec<AnimationCommand>,
}

impl Inputs {
    pub fn push(&mut self, command: AnimationCommand) -> &mut Self {
        self.commands.push(command);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnimationCommand {
    Play {
        animation: AnimationId,
    },
    PlayFrom {
        animation: AnimationId,
        progress: f32,
    },
    PlayAfter {
        animation: AnimationId,
        delay_seconds: f32,
    },
    Pause {
        animation: AnimationId,
    },
    Stop {
        animation: AnimationId,
    },
    Clear {
        animation: AnimationId,
    },
    SetSpeedFactor {
        animation: AnimationId,
        factor: f32,
    },
    SetLoopCount {
        animation: AnimationId,
        count: u32,
    },
    SetLoopingMode {
        animation: AnimationId,
        mode: LoopingMode,
    },
    SetPlayRange {
        animation: AnimationId,
        start: f32,
        end: f32,
    },
    SetCurrentProgress {
        animation: AnimationId,
        progress: f32,
    },
    SetEndAction {
        animation: AnimationId,
        action: EndAction,
    },
    SetDisconnectAction {
        animation: AnimationId,
        action: EndAction,
    },
    SetProgressNotification {
        animation: AnimationId,
        progress: f32,
    },
    SetBlendPoint {
        animation: AnimationId,
        progress: f32,
    },
    SetDuration {
        animation: AnimationId,
        seconds: f32,
    },
    /// Hand the animation to the registry: it is dropped once stopped and its
    /// pending notification has been delivered.
    Release {
        animation: AnimationId,
    },
}

impl AnimationCommand {
    pub fn animation(&self) -> AnimationId {
        use AnimationCommand::*;
        match self {
            Play { animation }
            | PlayFrom { animation, .. }
            | PlayAfter { animation, .. }
            | Pause { animation }
            | Stop { animation }
            | Clear { animation }
            | SetSpeedFactor { animation, .. }
            | SetLoopCount { animation, .. }
            | SetLoopingMode { animation, .. }
            | SetPlayRange { animation, .. }
            | SetCurrentProgress { animation, .. }
            | SetEndAction { animation, .. }
            | SetDisconnectAction { animation, .. }
            | SetProgressNotification { animation, .. }
            | SetBlendPoint { animation, .. }
            | SetDuration { animation, .. }
            | Release { animation } => *animation,
        }
    }
}
