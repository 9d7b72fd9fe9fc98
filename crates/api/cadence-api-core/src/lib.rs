//! cadence-api-core: property values shared by the animation engine and hosts.

pub mod blend;
pub mod value;

pub use blend::{add_relative, blend_values, values_approx_eq};
pub use value::{Value, ValueKind};
