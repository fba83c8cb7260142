//! Per-property keyframe tracks.
//!
//! A track keeps its keys sorted ascending by time with at most one key per
//! frame. All stores go through [`snap`]; reads go through
//! [`sample_track`](crate::sampling::sample_track).

use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, Result};
use crate::ids::KeyframeId;
use crate::interp::Interpolation;
use crate::time::{same_frame, snap};
use crate::value::{KeyValue, ValueType};

/// A single timed sample.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    #[serde(default = "KeyframeId::fresh")]
    pub id: KeyframeId,
    /// Seconds, composition time.
    pub time: f64,
    pub value: KeyValue,
    /// Shapes the segment leaving this key.
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Keyframe {
    pub fn new(time: f64, value: KeyValue) -> Self {
        Self {
            id: KeyframeId::fresh(),
            time,
            value,
            interpolation: Interpolation::Linear,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// Optional bounds and UI step for scalar tracks.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl Constraints {
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            step: Some(1.0),
        }
    }

    pub fn step(step: f64) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    #[inline]
    pub fn clamp(&self, v: f64) -> f64 {
        let v = self.min.map_or(v, |m| v.max(m));
        self.max.map_or(v, |m| v.min(m))
    }
}

/// Timed value history for one animatable property.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub label: String,
    pub value_type: ValueType,
    pub keys: Vec<Keyframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    /// Vector2 only. Editors mirror X edits onto Y when set; evaluation ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked: Option<bool>,
}

impl Track {
    pub fn new(label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            label: label.into(),
            value_type,
            keys: Vec::new(),
            constraints: None,
            linked: None,
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_linked(mut self, linked: bool) -> Self {
        self.linked = Some(linked);
        self
    }

    /// Step used when scrubbing the value; defaults to 1.
    pub fn step(&self) -> f64 {
        self.constraints.and_then(|c| c.step).unwrap_or(1.0)
    }

    /// Check the value kind against the track and clamp scalars into constraints.
    pub fn conform(&self, label: &str, value: KeyValue) -> Result<KeyValue> {
        if value.value_type() != self.value_type {
            return Err(CompositionError::ValueTypeMismatch {
                property: label.to_string(),
                expected: self.value_type,
            });
        }
        Ok(match (value, self.constraints) {
            (KeyValue::Scalar(v), Some(c)) => KeyValue::Scalar(c.clamp(v)),
            (v, _) => v,
        })
    }

    /// Insert a key at the snapped time, or overwrite the value of the key already on that frame.
    pub fn upsert(&mut self, time: f64, value: KeyValue, fps: f64) -> Result<&Keyframe> {
        if !time.is_finite() {
            return Err(CompositionError::InvalidTime(time));
        }
        let value = self.conform(&self.label, value)?;
        let t = snap(time, fps);
        if let Some(idx) = self.keys.iter().position(|k| same_frame(k.time, t, fps)) {
            self.keys[idx].value = value;
            return Ok(&self.keys[idx]);
        }
        let key = Keyframe::new(t, value);
        let id = key.id.clone();
        self.keys.push(key);
        self.sort();
        let idx = self.index_of(&id).unwrap_or(0);
        Ok(&self.keys[idx])
    }

    /// Remove a key by identity.
    pub fn delete(&mut self, id: &KeyframeId) -> Option<Keyframe> {
        let idx = self.index_of(id)?;
        Some(self.keys.remove(idx))
    }

    pub fn key(&self, id: &KeyframeId) -> Option<&Keyframe> {
        self.keys.iter().find(|k| &k.id == id)
    }

    /// Key sitting on the same frame as `time`, if any.
    pub fn key_at(&self, time: f64, fps: f64) -> Option<&Keyframe> {
        let t = snap(time, fps);
        self.keys.iter().find(|k| same_frame(k.time, t, fps))
    }

    /// Replace the value of an existing key (clamped like an upsert).
    pub fn set_key_value(&mut self, id: &KeyframeId, value: KeyValue) -> Result<()> {
        let value = self.conform(&self.label, value)?;
        let idx = self.index_of(id).ok_or_else(|| CompositionError::KeyframeNotFound {
            property: self.label.clone(),
            key: id.clone(),
        })?;
        self.keys[idx].value = value;
        Ok(())
    }

    pub fn set_interpolation(&mut self, id: &KeyframeId, mode: Interpolation) -> Result<()> {
        let idx = self.index_of(id).ok_or_else(|| CompositionError::KeyframeNotFound {
            property: self.label.clone(),
            key: id.clone(),
        })?;
        self.keys[idx].interpolation = mode;
        Ok(())
    }

    /// Re-time one key to the snapped `time`.
    /// Returns `false` and leaves the track untouched when another key already occupies that frame.
    pub fn move_key(&mut self, id: &KeyframeId, time: f64, fps: f64) -> Result<bool> {
        let idx = self.index_of(id).ok_or_else(|| CompositionError::KeyframeNotFound {
            property: self.label.clone(),
            key: id.clone(),
        })?;
        let t = snap(time.max(0.0), fps);
        let occupied = self
            .keys
            .iter()
            .any(|k| &k.id != id && same_frame(k.time, t, fps));
        if occupied {
            return Ok(false);
        }
        self.keys[idx].time = t;
        self.sort();
        Ok(true)
    }

    /// Move every key by `delta` seconds, preserving spacing.
    pub fn shift(&mut self, delta: f64) {
        for k in &mut self.keys {
            k.time += delta;
        }
    }

    /// Put every key back on the frame grid.
    pub fn resnap(&mut self, fps: f64) {
        for k in &mut self.keys {
            k.time = snap(k.time, fps);
        }
        self.sort();
    }

    /// Restore ordering after keys were set directly: drop keys with non-finite
    /// times, fold keys sharing a frame into the first one (later values win),
    /// then sort. Returns how many keys were removed.
    pub fn normalize(&mut self, fps: f64) -> usize {
        let before = self.keys.len();
        let mut kept: Vec<Keyframe> = Vec::with_capacity(before);
        for key in self.keys.drain(..) {
            if !key.time.is_finite() {
                continue;
            }
            match kept.iter_mut().find(|k| same_frame(k.time, key.time, fps)) {
                Some(existing) => existing.value = key.value,
                None => kept.push(key),
            }
        }
        self.keys = kept;
        self.sort();
        before - self.keys.len()
    }

    #[inline]
    pub fn sort(&mut self) {
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Evaluate this track at `time` (see [`sample_track`](crate::sampling::sample_track)).
    #[inline]
    pub fn evaluate(&self, time: f64) -> KeyValue {
        crate::sampling::sample_track(self, time)
    }

    fn index_of(&self, id: &KeyframeId) -> Option<usize> {
        self.keys.iter().position(|k| &k.id == id)
    }
}
