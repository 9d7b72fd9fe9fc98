//! Output contracts from the core engine.
//!
//! Property values go straight to the sink; Outputs carries the semantic
//! events of the tick and a little bookkeeping for the driver.

use serde::{Deserialize, Serialize};

use crate::ids::AnimationId;

/// Discrete signals emitted while ticking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationEvent {
    /// A play session ended, naturally or through `stop`.
    Finished { animation: AnimationId },
    /// Playback crossed the progress notification marker.
    ProgressReached {
        animation: AnimationId,
        progress: f32,
    },
}

impl AnimationEvent {
    pub fn animation(&self) -> AnimationId {
        match self {
            AnimationEvent::Finished { animation }
            | AnimationEvent::ProgressReached { animation, .. } => *animation,
        }
    }
}

/// Outputs returned by Engine::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    /// Ordered by animation creation order within the tick.
    #[serde(default)]
    pub events: Vec<AnimationEvent>,
    /// Animator evaluations performed this tick.
    #[serde(default)]
    pub animators_applied: usize,
    /// False once nothing plays and every discarded property has settled.
    #[serde(default)]
    pub needs_update: bool,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.animators_applied = 0;
        self.needs_update = false;
    }

    #[inline]
    pub fn push_event(&mut self, event: AnimationEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True if `animation` finished this tick.
    pub fn finished(&self, animation: AnimationId) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, AnimationEvent::Finished { animation: a } if *a == animation))
    }
}
