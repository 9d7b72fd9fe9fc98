//! Key-frame sampling.
//!
//! Model:
//! - Frames are ordered by progress in [0,1].
//! - Progress before the first frame holds the first value, after the last
//!   frame holds the last value (no extrapolation).
//! - Linear blends the bracketing pair; booleans step, integers round,
//!   rotations slerp.
//! - Cubic runs Catmull-Rom through the four nearest frames for numeric
//!   kinds and falls back to linear on the two end segments.

use crate::interp::functions::{cubic_value, linear_value};
use crate::interp::Interpolation;
use crate::keyframes::KeyFrame;
use cadence_api_core::Value;

/// Find the segment [i, i+1] that contains `u`, and return (i, i+1, local_t),
/// where local_t is normalized to [0, 1] between the two frames.
/// Edge cases:
/// - If u <= first.progress, returns (0, 0, 0) and caller should pick frames[0].
/// - If u >= last.progress, returns (last, last, 0) and caller should pick frames[last].
pub(crate) fn find_segment(frames: &[KeyFrame], u: f32) -> (usize, usize, f32) {
    let n = frames.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if n == 1 || u <= frames[0].progress {
        return (0, 0, 0.0);
    }
    if u >= frames[n - 1].progress {
        return (n - 1, n - 1, 0.0);
    }
    // First frame strictly after u; its predecessor starts the segment.
    let hi = frames.partition_point(|f| f.progress <= u);
    let lo = hi - 1;
    let t0 = frames[lo].progress;
    let t1 = frames[hi].progress;
    let denom = (t1 - t0).max(f32::EPSILON);
    (lo, hi, ((u - t0) / denom).clamp(0.0, 1.0))
}

/// Sample ordered frames at progress `u`. None only for an empty slice.
pub fn sample_frames(frames: &[KeyFrame], u: f32, interpolation: Interpolation) -> Option<Value> {
    let first = frames.first()?;
    let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
    let (i0, i1, lt) = find_segment(frames, u);
    if i0 == i1 {
        return Some(frames[i0].value.clone());
    }
    let left = &frames[i0].value;
    let right = &frames[i1].value;

    if interpolation == Interpolation::Cubic && first.value.kind().supports_cubic() {
        if i0 > 0 && i1 + 1 < frames.len() {
            let before = &frames[i0 - 1].value;
            let after = &frames[i1 + 1].value;
            if let Some(v) = cubic_value(before, left, right, after, lt) {
                return Some(v);
            }
        }
    }
    Some(linear_value(left, right, lt))
}
