//! Error types for authoring-time failures.
//!
//! Per-tick conditions (range exhaustion, loop completion, disconnects) are
//! never errors; they surface as state transitions and events.

use serde::{Deserialize, Serialize};

use crate::ids::{AnimationId, OwnerId};
use crate::ValueKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// A value's kind differs from the kind already established for the
    /// property or key-frame track.
    #[error("Value type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// The property kind has no defined interpolation.
    #[error("Property kind {kind} is not animatable")]
    NotAnimatable { kind: ValueKind },

    /// A time period whose total is negative or not finite.
    #[error("Invalid time period: delay {delay}, duration {duration}")]
    InvalidTimePeriod { delay: f32, duration: f32 },

    #[error("Key-frame track has no frames")]
    EmptyKeyFrames,

    /// A path needs two points and two control points per segment.
    #[error("Path is missing points or control points")]
    IncompletePath,

    #[error("Unknown property {index} on {owner}")]
    UnknownProperty { owner: OwnerId, index: u32 },

    #[error("Component {component} is not addressable on a {kind} property")]
    InvalidComponent { kind: ValueKind, component: u8 },

    #[error("Animation not found: {id}")]
    AnimationNotFound { id: AnimationId },
}

impl AnimationError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. }
            | Self::NotAnimatable { .. }
            | Self::InvalidComponent { .. } => "type",
            Self::InvalidTimePeriod { .. } => "time",
            Self::EmptyKeyFrames | Self::IncompletePath => "data",
            Self::UnknownProperty { .. } | Self::AnimationNotFound { .. } => "lookup",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnimationError>;
