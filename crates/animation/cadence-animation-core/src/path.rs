//! 3D paths made of cubic-bezier segments.
//!
//! Each segment between two consecutive points carries two control points.
//! Progress in [0,1] is split evenly across segments regardless of their length.

use serde::{Deserialize, Serialize};

use crate::interp::functions::{cubic_bezier, cubic_bezier_derivative};
use cadence_api_core::blend::normalize_quat;

pub type Vec3 = [f32; 3];

/// Below this local progress a segment samples exactly at its end points.
const SEGMENT_EPSILON: f32 = 1e-6;

#[inline]
fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn length(a: Vec3) -> f32 {
    dot(a, a).sqrt()
}

fn normalize(a: Vec3) -> Vec3 {
    let len = length(a);
    if len > 0.0 {
        scale(a, 1.0 / len)
    } else {
        a
    }
}

/// Shortest rotation turning direction `from` onto direction `to`, as (x,y,z,w).
pub fn rotation_between(from: Vec3, to: Vec3) -> [f32; 4] {
    let f = normalize(from);
    let t = normalize(to);
    let d = dot(f, t);
    if d >= 1.0 - 1e-6 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    if d <= -1.0 + 1e-6 {
        // Opposite directions: half turn about any axis perpendicular to `from`.
        let mut axis = cross([1.0, 0.0, 0.0], f);
        if length(axis) < 1e-6 {
            axis = cross([0.0, 1.0, 0.0], f);
        }
        let axis = normalize(axis);
        return [axis[0], axis[1], axis[2], 0.0];
    }
    let c = cross(f, t);
    normalize_quat([c[0], c[1], c[2], 1.0 + d])
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Vec3>,
    control_points: Vec<Vec3>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Vec3) {
        self.points.push(point);
    }

    pub fn add_control_point(&mut self, point: Vec3) {
        self.control_points.push(point);
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// At least one segment, and two control points for every segment.
    pub fn is_complete(&self) -> bool {
        let segments = self.segment_count();
        segments > 0 && self.control_points.len() >= 2 * segments
    }

    /// Replace the control points with smooth tangents through the points.
    /// `curvature` scales tangent length relative to each segment's length;
    /// 0.25 gives a gentle curve. Does nothing with fewer than two points.
    pub fn generate_control_points(&mut self, curvature: f32) {
        let segments = self.segment_count();
        if segments == 0 {
            return;
        }
        let mut controls = Vec::with_capacity(segments * 2);
        for i in 0..segments {
            let p1 = self.points[i];
            let p2 = self.points[i + 1];
            // Missing neighbours are extrapolated an eighth of the segment outward.
            let p0 = if i == 0 {
                sub(p1, scale(sub(p2, p1), 0.125))
            } else {
                self.points[i - 1]
            };
            let p3 = if i == segments - 1 {
                sub(p2, scale(sub(p1, p2), 0.125))
            } else {
                self.points[i + 2]
            };

            let p0p1 = sub(p1, p0);
            let p1p2 = sub(p2, p1);
            let p2p3 = sub(p3, p2);
            let seg_len = length(p1p2);

            let tangent_out = normalize(scale(
                add(scale(p0p1, seg_len), scale(p1p2, length(p0p1))),
                0.5,
            ));
            let tangent_in = normalize(scale(
                add(scale(p1p2, length(p2p3)), scale(p2p3, seg_len)),
                0.5,
            ));

            let reach = seg_len * curvature;
            controls.push(add(p1, scale(tangent_out, reach)));
            controls.push(sub(p2, scale(tangent_in, reach)));
        }
        self.control_points = controls;
    }

    fn segment_at(&self, t: f32) -> (usize, f32) {
        let segments = self.segment_count();
        if t <= 0.0 || segments == 0 {
            return (0, 0.0);
        }
        if t >= 1.0 {
            return (segments - 1, 1.0);
        }
        let n = segments as f32;
        let segment = ((t * n) as usize).min(segments - 1);
        (segment, (t - segment as f32 / n) * n)
    }

    /// Position and unit tangent at progress `t`, or None for an incomplete path.
    pub fn sample(&self, t: f32) -> Option<(Vec3, Vec3)> {
        if !self.is_complete() {
            return None;
        }
        let (segment, local) = self.segment_at(t);
        let p0 = self.points[segment];
        let p1 = self.points[segment + 1];
        let c0 = self.control_points[2 * segment];
        let c1 = self.control_points[2 * segment + 1];

        if local < SEGMENT_EPSILON {
            return Some((p0, normalize(scale(sub(c0, p0), 3.0))));
        }
        if 1.0 - local < SEGMENT_EPSILON {
            return Some((p1, normalize(scale(sub(p1, c1), 3.0))));
        }
        let mut position = [0.0; 3];
        let mut tangent = [0.0; 3];
        for axis in 0..3 {
            position[axis] = cubic_bezier(p0[axis], c0[axis], c1[axis], p1[axis], local);
            tangent[axis] = cubic_bezier_derivative(p0[axis], c0[axis], c1[axis], p1[axis], local);
        }
        Some((position, normalize(tangent)))
    }

    pub fn sample_position(&self, t: f32) -> Option<Vec3> {
        self.sample(t).map(|(p, _)| p)
    }

    pub fn sample_tangent(&self, t: f32) -> Option<Vec3> {
        self.sample(t).map(|(_, tangent)| tangent)
    }
}
