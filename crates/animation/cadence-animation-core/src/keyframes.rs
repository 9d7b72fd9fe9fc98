//! Key-frame tracks: ordered (progress, value) pairs of one animatable kind.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};
use crate::interp::Interpolation;
use crate::sampling::sample_frames;
use cadence_api_core::blend::{blend_values, lerp_f, values_approx_eq};
use cadence_api_core::{Value, ValueKind};

/// Default tolerance used by [`KeyFrames::optimize_linear`].
pub const LINEAR_EPSILON: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    pub progress: f32,
    pub value: Value,
}

/// An ordered track of key frames. The first frame added fixes the kind.
///
/// Frames are kept sorted by progress: adding out of order inserts at the
/// right position, after any frames with the same progress.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFrames {
    frames: Vec<KeyFrame>,
}

impl KeyFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind established by the first frame, if any.
    pub fn kind(&self) -> Option<ValueKind> {
        self.frames.first().map(|f| f.value.kind())
    }

    /// Insert a frame. Progress is clamped to [0,1]; a non-finite progress is
    /// ignored with a warning.
    pub fn add(&mut self, progress: f32, value: Value) -> Result<()> {
        let kind = value.kind();
        if !kind.is_animatable() {
            return Err(AnimationError::NotAnimatable { kind });
        }
        if let Some(expected) = self.kind() {
            if expected != kind {
                return Err(AnimationError::TypeMismatch {
                    expected,
                    actual: kind,
                });
            }
        }
        if !progress.is_finite() {
            warn!("key frame at non-finite progress ignored");
            return Ok(());
        }
        if !(0.0..=1.0).contains(&progress) {
            warn!("key frame progress {progress} clamped to [0,1]");
        }
        let progress = progress.clamp(0.0, 1.0);
        let at = self.frames.partition_point(|f| f.progress <= progress);
        self.frames.insert(at, KeyFrame { progress, value });
        Ok(())
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(f32, &Value)> {
        self.frames.get(index).map(|f| (f.progress, &f.value))
    }

    pub fn frames(&self) -> &[KeyFrame] {
        &self.frames
    }

    /// Replace the value at `index`. A value of another kind is ignored.
    pub fn set(&mut self, index: usize, value: Value) {
        let expected = self.kind();
        match self.frames.get_mut(index) {
            Some(frame) if Some(value.kind()) == expected => frame.value = value,
            Some(_) => warn!(
                "key frame {index}: {} value ignored on a {} track",
                value.kind(),
                expected.map(|k| k.name()).unwrap_or("untyped")
            ),
            None => warn!("key frame {index} out of bounds ({} frames)", self.frames.len()),
        }
    }

    pub fn first_value(&self) -> Option<&Value> {
        self.frames.first().map(|f| &f.value)
    }

    pub fn last_value(&self) -> Option<&Value> {
        self.frames.last().map(|f| &f.value)
    }

    /// Value at `progress`, clamped to the first/last frame outside the track.
    pub fn sample(&self, progress: f32, interpolation: Interpolation) -> Option<Value> {
        sample_frames(&self.frames, progress, interpolation)
    }

    /// Remove interior frames that lie on the linear blend of their kept
    /// neighbours. Returns whether anything was removed.
    pub fn optimize_linear(&mut self) -> bool {
        self.optimize_linear_with(LINEAR_EPSILON)
    }

    pub fn optimize_linear_with(&mut self, epsilon: f32) -> bool {
        let n = self.frames.len();
        if n < 3 {
            return false;
        }
        let mut kept: Vec<KeyFrame> = Vec::with_capacity(n);
        kept.push(self.frames[0].clone());
        for i in 1..n - 1 {
            let candidate = &self.frames[i];
            let next = &self.frames[i + 1];
            let Some(prev) = kept.last() else {
                continue;
            };
            let span = next.progress - prev.progress;
            let redundant = span > 0.0 && {
                let t = (candidate.progress - prev.progress) / span;
                on_line(&prev.value, &next.value, &candidate.value, t, epsilon)
            };
            if !redundant {
                kept.push(candidate.clone());
            }
        }
        kept.push(self.frames[n - 1].clone());
        let changed = kept.len() != n;
        self.frames = kept;
        changed
    }
}

/// Whether `mid` is what blending `a` to `b` at `t` produces. Integers are
/// compared before rounding, so a frame that only rounds onto the line stays.
fn on_line(a: &Value, b: &Value, mid: &Value, t: f32, epsilon: f32) -> bool {
    match (a, b, mid) {
        (Value::Integer(a), Value::Integer(b), Value::Integer(mid)) => {
            (lerp_f(*a as f32, *b as f32, t) - *mid as f32).abs() <= epsilon
        }
        _ => blend_values(a, b, t)
            .map(|v| values_approx_eq(&v, mid, epsilon))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_fixes_kind() {
        let mut kf = KeyFrames::new();
        kf.add(0.0, Value::f(1.0)).unwrap();
        let err = kf.add(1.0, Value::vec2(0.0, 0.0)).unwrap_err();
        assert_eq!(
            err,
            AnimationError::TypeMismatch {
                expected: ValueKind::Float,
                actual: ValueKind::Vec2
            }
        );
        assert_eq!(kf.count(), 1);
    }

    #[test]
    fn non_animatable_rejected() {
        let mut kf = KeyFrames::new();
        let err = kf.add(0.0, Value::Text("x".into())).unwrap_err();
        assert!(matches!(err, AnimationError::NotAnimatable { .. }));
    }

    #[test]
    fn out_of_order_inserts_sorted() {
        let mut kf = KeyFrames::new();
        kf.add(1.0, Value::f(10.0)).unwrap();
        kf.add(0.0, Value::f(0.0)).unwrap();
        kf.add(0.5, Value::f(3.0)).unwrap();
        let order: Vec<f32> = kf.frames().iter().map(|f| f.progress).collect();
        assert_eq!(order, vec![0.0, 0.5, 1.0]);
    }
}
