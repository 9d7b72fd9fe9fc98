//! Cadence Animation Core (host-agnostic)
//!
//! Tick-driven animation timelines. An [`Animation`] owns animators that
//! drive typed properties towards targets, through key frames or along a
//! path; the [`Engine`] registry advances every animation by wall-clock
//! time and writes the resulting values into a [`PropertySink`].

pub mod accumulate;
pub mod alpha;
pub mod animation;
pub mod animator;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod keyframes;
pub mod outputs;
pub mod path;
pub mod property;
pub mod sampling;
pub mod time;

// Re-exports for hosts
pub use accumulate::Accumulator;
pub use alpha::{AlphaFunction, BuiltinAlpha};
pub use animation::{Animation, EndAction, LoopingMode, PlayState};
pub use animator::{Animator, AnimatorCfg, AnimatorSource};
pub use config::Config;
pub use engine::Engine;
pub use error::{AnimationError, Result};
pub use ids::{AnimationId, IdAllocator, OwnerId};
pub use inputs::{AnimationCommand, Inputs};
pub use interp::Interpolation;
pub use keyframes::{KeyFrame, KeyFrames};
pub use outputs::{AnimationEvent, Outputs};
pub use path::Path;
pub use property::{PropertyKey, PropertyRef, PropertySink, PropertyTable};
pub use sampling::sample_frames;
pub use time::{PlayRange, TimePeriod};
pub use cadence_api_core::{Value, ValueKind};
