//! Interpolation helpers:
//! - ease_factor (reshape a normalized segment fraction per mode)
//! - lerp_f64 / lerp_vec2 (component-wise blend)
//! - blend_value (typed blend across KeyValue kinds)

use std::f64::consts::PI;

use super::Interpolation;
use crate::value::{KeyValue, Vec2};

/// Reshape a normalized fraction `u` in [0,1] according to the left key's mode.
#[inline]
pub fn ease_factor(mode: Interpolation, u: f64) -> f64 {
    match mode {
        Interpolation::Linear => u,
        Interpolation::EaseInOut => 0.5 * (1.0 - (u * PI).cos()),
        Interpolation::Hold => 0.0,
    }
}

#[inline]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    Vec2::new(lerp_f64(a.x, b.x, t), lerp_f64(a.y, b.y, t))
}

/// Blend two values with an already-eased factor. Text holds left; a kind
/// mismatch also falls back to the left value (fail-soft).
pub fn blend_value(a: &KeyValue, b: &KeyValue, t: f64) -> KeyValue {
    match (a, b) {
        (KeyValue::Scalar(va), KeyValue::Scalar(vb)) => KeyValue::Scalar(lerp_f64(*va, *vb, t)),
        (KeyValue::Vector2(va), KeyValue::Vector2(vb)) => KeyValue::Vector2(lerp_vec2(*va, *vb, t)),
        _ => a.clone(),
    }
}
