//! Interpolation modes and helpers.
//!
//! Key-frame tracks blend linearly between bracketing frames, or with a
//! Catmull-Rom spline through the four nearest frames.

pub mod functions;

use serde::{Deserialize, Serialize};

/// How a key-frame track blends between frames.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Catmull-Rom through the neighbouring frames. Treated as linear for
    /// kinds without a numeric blend (bool, rotation) and on the end segments.
    Cubic,
}
