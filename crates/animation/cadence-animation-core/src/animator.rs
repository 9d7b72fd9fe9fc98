//! Animators: one property bound to a value source over a window of the
//! parent animation's timeline.

use std::sync::Arc;

use crate::alpha::AlphaFunction;
use crate::error::{AnimationError, Result};
use crate::interp::Interpolation;
use crate::keyframes::KeyFrames;
use crate::path::{rotation_between, Path};
use crate::property::PropertyRef;
use crate::time::TimePeriod;
use cadence_api_core::blend::{blend_values, normalize_quat, quat_from_angle_axis, quat_mul, slerp};
use cadence_api_core::{Value, ValueKind};

const IDENTITY_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Where an animator's values come from.
#[derive(Clone, Debug)]
pub enum AnimatorSource {
    /// Blend from the running value to an absolute target.
    To(Value),
    /// Add an eased fraction of a relative value to the running value.
    By(Value),
    /// Spin by an angle about an axis; can exceed a half turn.
    RotateBy { radians: f32, axis: [f32; 3] },
    /// Sample a key-frame track; the running value is ignored.
    Between {
        key_frames: Arc<KeyFrames>,
        interpolation: Interpolation,
    },
    /// Position along a path.
    PathPosition(Arc<Path>),
    /// Orientation turning `forward` onto the path tangent.
    PathRotation { path: Arc<Path>, forward: [f32; 3] },
}

impl AnimatorSource {
    /// Kind of the values this source produces.
    pub fn kind(&self) -> Result<ValueKind> {
        match self {
            AnimatorSource::To(v) | AnimatorSource::By(v) => Ok(v.kind()),
            AnimatorSource::RotateBy { .. } | AnimatorSource::PathRotation { .. } => {
                Ok(ValueKind::Rotation)
            }
            AnimatorSource::Between { key_frames, .. } => {
                key_frames.kind().ok_or(AnimationError::EmptyKeyFrames)
            }
            AnimatorSource::PathPosition(_) => Ok(ValueKind::Vec3),
        }
    }

    /// Value at eased progress `alpha`, composed on `current`.
    pub fn evaluate(&self, current: &Value, alpha: f32) -> Option<Value> {
        match self {
            AnimatorSource::To(target) => blend_values(current, target, alpha),
            AnimatorSource::By(relative) => add_scaled(current, relative, alpha),
            AnimatorSource::RotateBy { radians, axis } => {
                let q = current.as_rotation()?;
                let step = quat_from_angle_axis(radians * alpha, *axis);
                Some(Value::Rotation(normalize_quat(quat_mul(q, step))))
            }
            AnimatorSource::Between {
                key_frames,
                interpolation,
            } => key_frames.sample(alpha, *interpolation),
            AnimatorSource::PathPosition(path) => path.sample_position(alpha).map(Value::Vec3),
            AnimatorSource::PathRotation { path, forward } => {
                let tangent = path.sample_tangent(alpha)?;
                Some(Value::Rotation(rotation_between(*forward, tangent)))
            }
        }
    }
}

/// `current + relative * alpha`; booleans OR in only once alpha reaches 1,
/// rotations compose the slerped fraction of `relative`.
fn add_scaled(current: &Value, relative: &Value, alpha: f32) -> Option<Value> {
    let out = match (current, relative) {
        (Value::Bool(c), Value::Bool(r)) => Value::Bool(if alpha >= 1.0 { *c || *r } else { *c }),
        (Value::Integer(c), Value::Integer(r)) => {
            Value::Integer((*c as f32 + *r as f32 * alpha).round() as i32)
        }
        (Value::Float(c), Value::Float(r)) => Value::Float(c + r * alpha),
        (Value::Vec2(c), Value::Vec2(r)) => Value::Vec2([c[0] + r[0] * alpha, c[1] + r[1] * alpha]),
        (Value::Vec3(c), Value::Vec3(r)) => Value::Vec3([
            c[0] + r[0] * alpha,
            c[1] + r[1] * alpha,
            c[2] + r[2] * alpha,
        ]),
        (Value::Vec4(c), Value::Vec4(r)) => Value::Vec4([
            c[0] + r[0] * alpha,
            c[1] + r[1] * alpha,
            c[2] + r[2] * alpha,
            c[3] + r[3] * alpha,
        ]),
        (Value::Rotation(c), Value::Rotation(r)) => {
            let step = slerp(IDENTITY_QUAT, *r, alpha);
            Value::Rotation(normalize_quat(quat_mul(*c, step)))
        }
        _ => return None,
    };
    Some(out)
}

/// Check that `source_kind` can drive `property`, whose baseline is `baseline`.
pub(crate) fn check_target(
    property: PropertyRef,
    baseline: &Value,
    source_kind: ValueKind,
) -> Result<()> {
    let kind = baseline.kind();
    let animated = match property.component {
        Some(component) => {
            if (component as usize) >= kind.component_count() {
                return Err(AnimationError::InvalidComponent { kind, component });
            }
            ValueKind::Float
        }
        None => kind,
    };
    if !animated.is_animatable() {
        return Err(AnimationError::NotAnimatable { kind: animated });
    }
    if source_kind != animated {
        return Err(AnimationError::TypeMismatch {
            expected: animated,
            actual: source_kind,
        });
    }
    Ok(())
}

/// Optional overrides for a new animator. Unset fields take the animation's
/// defaults: its default alpha function and a period covering its duration.
#[derive(Clone, Debug, Default)]
pub struct AnimatorCfg {
    pub alpha: Option<AlphaFunction>,
    pub period: Option<TimePeriod>,
    pub interpolation: Interpolation,
}

impl AnimatorCfg {
    pub fn with_alpha(mut self, alpha: impl Into<AlphaFunction>) -> Self {
        self.alpha = Some(alpha.into());
        self
    }

    pub fn with_period(mut self, period: TimePeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_delay(self, delay: f32, duration: f32) -> Self {
        self.with_period(TimePeriod::with_delay(delay, duration))
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Animator {
    property: PropertyRef,
    source: AnimatorSource,
    period: TimePeriod,
    alpha: AlphaFunction,
    /// Last progress this animator was applied at.
    pub(crate) current_progress: f32,
    /// Shift applied after reattaching, so a reconnected owner resumes where it froze.
    pub(crate) progress_offset: f32,
    /// Owner is out of the scene; the animator is skipped.
    pub(crate) detached: bool,
    /// Applied at least once since play started.
    pub(crate) applied: bool,
}

impl Animator {
    pub fn new(
        property: PropertyRef,
        source: AnimatorSource,
        period: TimePeriod,
        alpha: AlphaFunction,
    ) -> Self {
        Self {
            property,
            source,
            period,
            alpha,
            current_progress: 0.0,
            progress_offset: 0.0,
            detached: false,
            applied: false,
        }
    }

    #[inline]
    pub fn property(&self) -> PropertyRef {
        self.property
    }

    pub fn source(&self) -> &AnimatorSource {
        &self.source
    }

    #[inline]
    pub fn period(&self) -> TimePeriod {
        self.period
    }

    pub fn alpha(&self) -> &AlphaFunction {
        &self.alpha
    }

    #[inline]
    pub fn current_progress(&self) -> f32 {
        self.current_progress
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Progress at animation time `time`, or None before the delay.
    pub fn progress_at(&self, time: f32) -> Option<f32> {
        self.period
            .progress_at(time)
            .map(|p| (p + self.progress_offset).clamp(0.0, 1.0))
    }

    /// Value of the property at `progress` when its running value is `current`.
    pub fn apply(&self, current: &Value, progress: f32) -> Option<Value> {
        let alpha = self.alpha.evaluate(progress.clamp(0.0, 1.0));
        match self.property.component {
            Some(component) => {
                let index = component as usize;
                let part = Value::Float(current.component(index)?);
                let animated = self.source.evaluate(&part, alpha)?.as_float()?;
                current.with_component(index, animated)
            }
            None => self.source.evaluate(current, alpha),
        }
    }

    /// Value once complete, built on `base`; the property's cached target.
    pub fn final_value(&self, base: &Value) -> Option<Value> {
        match self.property.component {
            Some(component) => {
                let index = component as usize;
                let part = Value::Float(base.component(index)?);
                let animated = self.source.evaluate(&part, 1.0)?.as_float()?;
                base.with_component(index, animated)
            }
            None => self.source.evaluate(base, 1.0),
        }
    }

    pub(crate) fn reset_session(&mut self) {
        self.current_progress = 0.0;
        self.progress_offset = 0.0;
        self.applied = false;
    }
}
