//! Interpolation helpers:
//! - linear_value (component-wise, integer rounding, quaternion slerp, boolean step)
//! - cubic_value (Catmull-Rom per component)
//! - bezier_ease (cubic-bezier timing curve solved by bisection)

use cadence_api_core::blend::blend_values;
use cadence_api_core::Value;

/// Catmull-Rom segment between `p1` and `p2`, with `p0`/`p3` as outer neighbours.
#[inline]
pub fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let a3 = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let a2 = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let a1 = -0.5 * (p0 - p2);
    a3 * t3 + a2 * t2 + a1 * t + p1
}

fn catmull_rom_array<const N: usize>(
    p0: &[f32; N],
    p1: &[f32; N],
    p2: &[f32; N],
    p3: &[f32; N],
    t: f32,
) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = catmull_rom(p0[i], p1[i], p2[i], p3[i], t);
    }
    out
}

/// Linear interpolation across Value kinds.
/// Fallback: if kinds mismatch, prefer left (fail-soft).
pub fn linear_value(a: &Value, b: &Value, t: f32) -> Value {
    blend_values(a, b, t).unwrap_or_else(|| a.clone())
}

/// Cubic interpolation between `p1` and `p2`. Returns None for kinds without
/// a numeric spline (bool, rotation) or mismatched neighbours.
pub fn cubic_value(p0: &Value, p1: &Value, p2: &Value, p3: &Value, t: f32) -> Option<Value> {
    let out = match (p0, p1, p2, p3) {
        (Value::Float(a), Value::Float(b), Value::Float(c), Value::Float(d)) => {
            Value::Float(catmull_rom(*a, *b, *c, *d, t))
        }
        (Value::Integer(a), Value::Integer(b), Value::Integer(c), Value::Integer(d)) => {
            let v = catmull_rom(*a as f32, *b as f32, *c as f32, *d as f32, t);
            Value::Integer(v.round() as i32)
        }
        (Value::Vec2(a), Value::Vec2(b), Value::Vec2(c), Value::Vec2(d)) => {
            Value::Vec2(catmull_rom_array(a, b, c, d, t))
        }
        (Value::Vec3(a), Value::Vec3(b), Value::Vec3(c), Value::Vec3(d)) => {
            Value::Vec3(catmull_rom_array(a, b, c, d, t))
        }
        (Value::Vec4(a), Value::Vec4(b), Value::Vec4(c), Value::Vec4(d)) => {
            Value::Vec4(catmull_rom_array(a, b, c, d, t))
        }
        _ => return None,
    };
    Some(out)
}

/// Cubic Bezier basis function
#[inline]
pub fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Derivative of [`cubic_bezier`] with respect to t.
#[inline]
pub fn cubic_bezier_derivative(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * (p1 - p0) + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
pub fn bezier_ease(t: f32, ctrl: [f32; 4]) -> f32 {
    let [x1, y1, x2, y2] = ctrl;
    let t = t.clamp(0.0, 1.0);
    // Near the ends the curve is pinned to 0 and 1.
    if t <= 1e-6 {
        return 0.0;
    }
    if 1.0 - t <= 1e-6 {
        return 1.0;
    }
    // Bezier(0,0,1,1) is exactly linear.
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}
