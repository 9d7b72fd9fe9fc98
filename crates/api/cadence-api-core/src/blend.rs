//! Blending utilities for Value types.
//! - f32 linear interpolation for floats and vector components
//! - integer interpolation in float space, rounded to nearest
//! - quaternion slerp (shortest-arc) and product
//! - relative composition used by "animate by" animators
//! - boolean snap: the right value only once t reaches 1

use crate::{Value, ValueKind};

/// Linear interpolation for f32. Exact at both ends: t = 0 yields `a`, t = 1 yields `b`.
#[inline]
pub fn lerp_f(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Lerp for fixed-size arrays
pub fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f(a[i], b[i], t);
    }
    out
}

fn add_array<const N: usize>(a: &[f32; N], b: &[f32; N]) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = a[i] + b[i];
    }
    out
}

/// Normalize a quaternion represented as [x,y,z,w]
pub fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let mag = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if mag == 0.0 {
        [0.0, 0.0, 0.0, 1.0]
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}

/// Slerp between two unit quaternions q1, q2
pub fn slerp(q1: [f32; 4], q2: [f32; 4], t: f32) -> [f32; 4] {
    let qa = normalize_quat(q1);
    let mut qb = normalize_quat(q2);

    let mut dot = qa[0] * qb[0] + qa[1] * qb[1] + qa[2] * qb[2] + qa[3] * qb[3];

    // Take the short path.
    if dot < 0.0 {
        qb = [-qb[0], -qb[1], -qb[2], -qb[3]];
        dot = -dot;
    }

    // Nearly parallel: lerp is stable and indistinguishable.
    const DOT_THRESHOLD: f32 = 0.9995;
    if dot > DOT_THRESHOLD {
        return normalize_quat(lerp_array(&qa, &qb, t));
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();

    let s0 = ((theta_0 - theta).sin()) / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;

    [
        s0 * qa[0] + s1 * qb[0],
        s0 * qa[1] + s1 * qb[1],
        s0 * qa[2] + s1 * qb[2],
        s0 * qa[3] + s1 * qb[3],
    ]
}

/// Hamilton product `a * b` (apply `b` first, then `a`).
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Quaternion for a rotation of `radians` around `axis`.
pub fn quat_from_angle_axis(radians: f32, axis: [f32; 3]) -> [f32; 4] {
    let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    if len == 0.0 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let half = radians * 0.5;
    let s = half.sin() / len;
    [axis[0] * s, axis[1] * s, axis[2] * s, half.cos()]
}

/// Blend two Values of the same kind. Returns None when kinds differ or the
/// kind is not animatable.
pub fn blend_values(a: &Value, b: &Value, t: f32) -> Option<Value> {
    let out = match (a, b) {
        (Value::Bool(av), Value::Bool(bv)) => Value::Bool(if t >= 1.0 { *bv } else { *av }),
        (Value::Integer(ai), Value::Integer(bi)) => {
            Value::Integer(lerp_f(*ai as f32, *bi as f32, t).round() as i32)
        }
        (Value::Float(af), Value::Float(bf)) => Value::Float(lerp_f(*af, *bf, t)),
        (Value::Vec2(aa), Value::Vec2(bb)) => Value::Vec2(lerp_array(aa, bb, t)),
        (Value::Vec3(aa), Value::Vec3(bb)) => Value::Vec3(lerp_array(aa, bb, t)),
        (Value::Vec4(aa), Value::Vec4(bb)) => Value::Vec4(lerp_array(aa, bb, t)),
        (Value::Rotation(aq), Value::Rotation(bq)) => Value::Rotation(slerp(*aq, *bq, t)),
        _ => return None,
    };
    Some(out)
}

/// Compose `relative` on top of `base`: OR for booleans, sums for numerics,
/// quaternion product for rotations.
pub fn add_relative(base: &Value, relative: &Value) -> Option<Value> {
    let out = match (base, relative) {
        (Value::Bool(b), Value::Bool(r)) => Value::Bool(*b || *r),
        (Value::Integer(b), Value::Integer(r)) => Value::Integer(b.saturating_add(*r)),
        (Value::Float(b), Value::Float(r)) => Value::Float(b + r),
        (Value::Vec2(b), Value::Vec2(r)) => Value::Vec2(add_array(b, r)),
        (Value::Vec3(b), Value::Vec3(r)) => Value::Vec3(add_array(b, r)),
        (Value::Vec4(b), Value::Vec4(r)) => Value::Vec4(add_array(b, r)),
        (Value::Rotation(b), Value::Rotation(r)) => Value::Rotation(normalize_quat(quat_mul(*b, *r))),
        _ => return None,
    };
    Some(out)
}

/// Component-wise comparison within `eps`. Rotations compare equal when they
/// describe the same orientation (q and -q).
pub fn values_approx_eq(a: &Value, b: &Value, eps: f32) -> bool {
    fn close(a: &[f32], b: &[f32], eps: f32) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= eps)
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => (x - y).abs() <= eps,
        (Value::Vec2(x), Value::Vec2(y)) => close(x, y, eps),
        (Value::Vec3(x), Value::Vec3(y)) => close(x, y, eps),
        (Value::Vec4(x), Value::Vec4(y)) => close(x, y, eps),
        (Value::Rotation(x), Value::Rotation(y)) => {
            let neg = [-y[0], -y[1], -y[2], -y[3]];
            close(x, y, eps) || close(x, &neg, eps)
        }
        (Value::Matrix(x), Value::Matrix(y)) => close(x, y, eps),
        (Value::Text(x), Value::Text(y)) => x == y,
        _ => false,
    }
}

/// Kind-preserving check used before composing or blending.
#[inline]
pub fn same_kind(a: &Value, b: &Value) -> bool {
    a.kind() == b.kind() && a.kind() != ValueKind::Text
}
