//! Time periods, play ranges and loop-wrapping math.
//!
//! All times are in seconds on the owning animation's timeline.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};

/// Window of an animator inside its animation: starts after `delay`, lasts `duration`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub delay: f32,
    pub duration: f32,
}

impl TimePeriod {
    #[inline]
    pub fn new(duration: f32) -> Self {
        Self {
            delay: 0.0,
            duration,
        }
    }

    #[inline]
    pub fn with_delay(delay: f32, duration: f32) -> Self {
        Self { delay, duration }
    }

    /// Time at which the window closes.
    #[inline]
    pub fn end(&self) -> f32 {
        self.delay + self.duration
    }

    /// Reject periods that cannot be clamped meaningfully, clamp the rest.
    ///
    /// A negative or non-finite total is an error; a negative delay or
    /// duration with a non-negative total is clamped to 0.
    pub fn validated(self) -> Result<Self> {
        if !self.delay.is_finite() || !self.duration.is_finite() || self.end() < 0.0 {
            return Err(AnimationError::InvalidTimePeriod {
                delay: self.delay,
                duration: self.duration,
            });
        }
        let mut out = self;
        if out.delay < 0.0 {
            warn!("time period delay {} clamped to 0", out.delay);
            out.delay = 0.0;
        }
        if out.duration < 0.0 {
            warn!("time period duration {} clamped to 0", out.duration);
            out.duration = 0.0;
        }
        Ok(out)
    }

    /// Local progress for an animation time, or None before the delay.
    /// Instant periods jump straight to 1.
    pub fn progress_at(&self, time: f32) -> Option<f32> {
        if time < self.delay {
            return None;
        }
        if self.duration > 0.0 {
            Some(((time - self.delay) / self.duration).clamp(0.0, 1.0))
        } else {
            Some(1.0)
        }
    }
}

/// Sub-interval of `[0,1]` progress an animation plays within. Always ordered.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayRange {
    pub start: f32,
    pub end: f32,
}

impl Default for PlayRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl PlayRange {
    pub const FULL: PlayRange = PlayRange {
        start: 0.0,
        end: 1.0,
    };

    /// Clamp both ends to `[0,1]` and order them. Non-finite ends fall back to
    /// the matching end of the full range.
    pub fn normalized(a: f32, b: f32) -> Self {
        let a = if a.is_finite() { a.clamp(0.0, 1.0) } else { 0.0 };
        let b = if b.is_finite() { b.clamp(0.0, 1.0) } else { 1.0 };
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[inline]
    pub fn contains(&self, progress: f32) -> bool {
        progress >= self.start && progress <= self.end
    }

    /// Range bounds in seconds for an animation of `duration` seconds.
    #[inline]
    pub fn to_seconds(&self, duration: f32) -> (f32, f32) {
        (self.start * duration, self.end * duration)
    }
}

/// Floating modulo with the sign of the divisor; 0 when `b` is 0.
pub fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Number of loop boundaries crossed when a pass of length `span` is
/// overrun by `overshoot` seconds. A degenerate span counts one boundary.
pub fn wrap_count(overshoot: f32, span: f32) -> u32 {
    if overshoot <= 0.0 {
        return 0;
    }
    if span <= 0.0 {
        return 1;
    }
    let extra = (overshoot / span).floor();
    if extra >= (u32::MAX - 1) as f32 {
        u32::MAX
    } else {
        1 + extra as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_respects_delay_and_duration() {
        let p = TimePeriod::with_delay(1.0, 2.0);
        assert_eq!(p.progress_at(0.5), None);
        assert_eq!(p.progress_at(1.0), Some(0.0));
        assert_eq!(p.progress_at(2.0), Some(0.5));
        assert_eq!(p.progress_at(9.0), Some(1.0));
        assert_eq!(TimePeriod::with_delay(1.0, 0.0).progress_at(1.0), Some(1.0));
    }

    #[test]
    fn validation_clamps_or_rejects() {
        let ok = TimePeriod::with_delay(-0.5, 1.0).validated().unwrap();
        assert_eq!(ok, TimePeriod::with_delay(0.0, 1.0));
        assert!(TimePeriod::with_delay(0.0, -1.0).validated().is_err());
        assert!(TimePeriod::new(f32::NAN).validated().is_err());
    }

    #[test]
    fn range_is_ordered_and_clamped() {
        assert_eq!(
            PlayRange::normalized(0.8, -0.2),
            PlayRange {
                start: 0.0,
                end: 0.8
            }
        );
        assert_eq!(PlayRange::normalized(2.0, 0.5).to_seconds(4.0), (2.0, 4.0));
    }

    #[test]
    fn fmod_and_wraps() {
        assert!((fmod(2.5, 1.0) - 0.5).abs() < 1e-6);
        assert!((fmod(-0.25, 1.0) - 0.75).abs() < 1e-6);
        assert_eq!(wrap_count(0.0, 1.0), 0);
        assert_eq!(wrap_count(0.5, 1.0), 1);
        assert_eq!(wrap_count(2.5, 1.0), 3);
        assert_eq!(wrap_count(0.1, 0.0), 1);
    }
}
