//! Alpha functions: map linear time progress to eased progress.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::interp::functions::bezier_ease;

/// Built-in easing curves.
///
/// All of them map 0 to 0 and 1 to 1, except `Reverse`, `Bounce` and `Sin`,
/// which return to their starting value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinAlpha {
    /// Same curve as `Linear`.
    #[default]
    Default,
    Linear,
    /// 1 - t
    Reverse,
    EaseInSquare,
    EaseOutSquare,
    /// t^3
    EaseIn,
    /// (t - 1)^3 + 1
    EaseOut,
    /// t^2 (3 - 2t)
    EaseInOut,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    /// sin(pi t): out and back
    Bounce,
    /// A full sine cycle: out and back, easing at both ends.
    Sin,
    /// Overshoots the target before settling.
    EaseOutBack,
}

const BACK_OVERSHOOT: f32 = 1.70158;

impl BuiltinAlpha {
    pub fn evaluate(self, t: f32) -> f32 {
        match self {
            BuiltinAlpha::Default | BuiltinAlpha::Linear => t,
            BuiltinAlpha::Reverse => 1.0 - t,
            BuiltinAlpha::EaseInSquare => t * t,
            BuiltinAlpha::EaseOutSquare => 1.0 - (1.0 - t) * (1.0 - t),
            BuiltinAlpha::EaseIn => t * t * t,
            BuiltinAlpha::EaseOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            BuiltinAlpha::EaseInOut => t * t * (3.0 - 2.0 * t),
            BuiltinAlpha::EaseInSine => 1.0 - (t * FRAC_PI_2).cos(),
            BuiltinAlpha::EaseOutSine => (t * FRAC_PI_2).sin(),
            BuiltinAlpha::EaseInOutSine => -0.5 * ((PI * t).cos() - 1.0),
            BuiltinAlpha::Bounce => (t * PI).sin(),
            BuiltinAlpha::Sin => 0.5 - (t * 2.0 * PI).cos() * 0.5,
            BuiltinAlpha::EaseOutBack => {
                let u = t - 1.0;
                1.0 + u * u * ((BACK_OVERSHOOT + 1.0) * u + BACK_OVERSHOOT)
            }
        }
    }
}

/// A pure easing function over `[0, 1]`.
#[derive(Copy, Clone, Debug)]
pub enum AlphaFunction {
    Builtin(BuiltinAlpha),
    /// Caller supplied curve; not required to pin 0 and 1.
    Custom(fn(f32) -> f32),
    /// Cubic-bezier timing curve with control points (x1, y1, x2, y2).
    Bezier([f32; 4]),
}

impl Default for AlphaFunction {
    fn default() -> Self {
        AlphaFunction::Builtin(BuiltinAlpha::Default)
    }
}

impl From<BuiltinAlpha> for AlphaFunction {
    fn from(b: BuiltinAlpha) -> Self {
        AlphaFunction::Builtin(b)
    }
}

impl AlphaFunction {
    pub const LINEAR: AlphaFunction = AlphaFunction::Builtin(BuiltinAlpha::Linear);

    /// Bezier curve; x coordinates are clamped to [0,1] so the curve stays a function of time.
    pub fn bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        AlphaFunction::Bezier([x1.clamp(0.0, 1.0), y1, x2.clamp(0.0, 1.0), y2])
    }

    /// Evaluate at `t`. Callers clamp `t` to [0,1] first.
    #[inline]
    pub fn evaluate(&self, t: f32) -> f32 {
        match self {
            AlphaFunction::Builtin(b) => b.evaluate(t),
            AlphaFunction::Custom(f) => f(t),
            AlphaFunction::Bezier(ctrl) => bezier_ease(t, *ctrl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_pin_endpoints() {
        use BuiltinAlpha::*;
        for b in [
            Default,
            Linear,
            EaseInSquare,
            EaseOutSquare,
            EaseIn,
            EaseOut,
            EaseInOut,
            EaseInSine,
            EaseOutSine,
            EaseInOutSine,
            EaseOutBack,
        ] {
            assert!(b.evaluate(0.0).abs() < 1e-6, "{b:?} at 0");
            assert!((b.evaluate(1.0) - 1.0).abs() < 1e-6, "{b:?} at 1");
        }
    }

    #[test]
    fn custom_function_is_called() {
        fn half(t: f32) -> f32 {
            t * 0.5
        }
        assert_eq!(AlphaFunction::Custom(half).evaluate(1.0), 0.5);
    }
}
