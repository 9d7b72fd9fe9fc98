//! Value: the typed payload of an animatable (or merely readable) property.
//! All numeric types use f32, integers use i32.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`], used for type checks and dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Rotation,
    Matrix,
    Text,
}

impl ValueKind {
    /// True for kinds that have a defined interpolation.
    #[inline]
    pub fn is_animatable(self) -> bool {
        matches!(
            self,
            ValueKind::Bool
                | ValueKind::Integer
                | ValueKind::Float
                | ValueKind::Vec2
                | ValueKind::Vec3
                | ValueKind::Vec4
                | ValueKind::Rotation
        )
    }

    /// Number of float components addressable by a component animator.
    /// Only plain vectors expose components.
    #[inline]
    pub fn component_count(self) -> usize {
        match self {
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            ValueKind::Vec4 => 4,
            _ => 0,
        }
    }

    /// Kinds where cubic interpolation has a numeric meaning.
    #[inline]
    pub fn supports_cubic(self) -> bool {
        matches!(
            self,
            ValueKind::Integer
                | ValueKind::Float
                | ValueKind::Vec2
                | ValueKind::Vec3
                | ValueKind::Vec4
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Vec4 => "vec4",
            ValueKind::Rotation => "rotation",
            ValueKind::Matrix => "matrix",
            ValueKind::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Boolean; snaps at completion, never in-between
    Bool(bool),

    /// Integer; interpolated in float space and rounded
    Integer(i32),

    /// Scalar float
    Float(f32),

    Vec2([f32; 2]),

    Vec3([f32; 3]),

    Vec4([f32; 4]),

    /// Rotation quaternion (x, y, z, w)
    Rotation([f32; 4]),

    /// 4x4 column-major matrix; readable but not animatable
    Matrix([f32; 16]),

    /// Text; readable but not animatable
    Text(String),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Rotation(_) => ValueKind::Rotation,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec2(x: f32, y: f32) -> Self {
        Value::Vec2([x, y])
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn vec4(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Vec4([x, y, z, w])
    }

    pub fn rotation_identity() -> Self {
        Value::Rotation([0.0, 0.0, 0.0, 1.0])
    }

    /// Rotation of `radians` around `axis` (normalized internally).
    pub fn rotation_from_angle_axis(radians: f32, axis: [f32; 3]) -> Self {
        Value::Rotation(crate::blend::quat_from_angle_axis(radians, axis))
    }

    /// The identity element of relative animation for a kind:
    /// `false`, `0`, the zero vector or the identity rotation.
    pub fn identity_for(kind: ValueKind) -> Option<Value> {
        match kind {
            ValueKind::Bool => Some(Value::Bool(false)),
            ValueKind::Integer => Some(Value::Integer(0)),
            ValueKind::Float => Some(Value::Float(0.0)),
            ValueKind::Vec2 => Some(Value::Vec2([0.0; 2])),
            ValueKind::Vec3 => Some(Value::Vec3([0.0; 3])),
            ValueKind::Vec4 => Some(Value::Vec4([0.0; 4])),
            ValueKind::Rotation => Some(Value::rotation_identity()),
            ValueKind::Matrix | ValueKind::Text => None,
        }
    }

    /// True when this value is the identity of relative animation for its kind.
    pub fn is_relative_identity(&self) -> bool {
        Value::identity_for(self.kind()).as_ref() == Some(self)
    }

    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_rotation(&self) -> Option<[f32; 4]> {
        match self {
            Value::Rotation(q) => Some(*q),
            _ => None,
        }
    }

    /// Read one float component of a vector value.
    pub fn component(&self, index: usize) -> Option<f32> {
        match self {
            Value::Vec2(v) => v.get(index).copied(),
            Value::Vec3(v) => v.get(index).copied(),
            Value::Vec4(v) => v.get(index).copied(),
            _ => None,
        }
    }

    /// Copy of this vector value with one component replaced.
    pub fn with_component(&self, index: usize, component: f32) -> Option<Value> {
        let mut out = self.clone();
        let slot = match &mut out {
            Value::Vec2(v) => v.get_mut(index),
            Value::Vec3(v) => v.get_mut(index),
            Value::Vec4(v) => v.get_mut(index),
            _ => None,
        }?;
        *slot = component;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animatable_kinds() {
        assert!(ValueKind::Rotation.is_animatable());
        assert!(ValueKind::Bool.is_animatable());
        assert!(!ValueKind::Matrix.is_animatable());
        assert!(!ValueKind::Text.is_animatable());
    }

    #[test]
    fn component_access() {
        let v = Value::vec3(1.0, 2.0, 3.0);
        assert_eq!(v.component(1), Some(2.0));
        assert_eq!(v.component(3), None);
        assert_eq!(v.with_component(2, 9.0), Some(Value::vec3(1.0, 2.0, 9.0)));
        assert_eq!(Value::f(1.0).with_component(0, 2.0), None);
    }

    #[test]
    fn relative_identity() {
        assert!(Value::Bool(false).is_relative_identity());
        assert!(Value::Integer(0).is_relative_identity());
        assert!(!Value::f(0.5).is_relative_identity());
        assert!(Value::rotation_identity().is_relative_identity());
    }

    #[test]
    fn serde_tagged_roundtrip() {
        let v = Value::vec2(1.0, -1.0);
        let s = serde_json::to_string(&v).unwrap();
        assert!(s.contains("\"type\":\"Vec2\""));
        let back: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v, back);
    }
}
