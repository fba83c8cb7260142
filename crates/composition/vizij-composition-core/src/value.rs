//! Keyframe value kinds and typed values.

use serde::{Deserialize, Serialize};

/// Plain `{x, y}` pair as stored in project files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for glam::DVec2 {
    fn from(v: Vec2) -> Self {
        glam::DVec2::new(v.x, v.y)
    }
}

impl From<glam::DVec2> for Vec2 {
    fn from(v: glam::DVec2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

/// Declared value type of a track.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Scalar,
    Vector2,
    DiscreteString,
}

impl ValueType {
    /// The value an empty track evaluates to.
    pub fn zero(self) -> KeyValue {
        match self {
            ValueType::Scalar => KeyValue::Scalar(0.0),
            ValueType::Vector2 => KeyValue::Vector2(Vec2::ZERO),
            ValueType::DiscreteString => KeyValue::Text(String::new()),
        }
    }
}

/// A keyframe value. Serialized untagged: a number, an `{x, y}` object or a string.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KeyValue {
    Scalar(f64),
    Vector2(Vec2),
    /// Step-only string value (no blending)
    Text(String),
}

impl KeyValue {
    #[inline]
    pub fn value_type(&self) -> ValueType {
        match self {
            KeyValue::Scalar(_) => ValueType::Scalar,
            KeyValue::Vector2(_) => ValueType::Vector2,
            KeyValue::Text(_) => ValueType::DiscreteString,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            KeyValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            KeyValue::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for KeyValue {
    fn from(v: f64) -> Self {
        KeyValue::Scalar(v)
    }
}

impl From<Vec2> for KeyValue {
    fn from(v: Vec2) -> Self {
        KeyValue::Vector2(v)
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::Text(s.to_string())
    }
}
