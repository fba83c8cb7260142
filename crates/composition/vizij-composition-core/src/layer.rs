//! Layers: time-bounded, positioned instances of an asset inside a composition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, Result};
use crate::ids::{AssetId, LayerId};
use crate::time::snap;
use crate::track::{Constraints, Keyframe, Track};
use crate::value::{KeyValue, ValueType, Vec2};

/// Canonical property names of the standard tracks.
pub mod props {
    pub const POSITION: &str = "position";
    pub const SCALE: &str = "scale";
    pub const ROTATION: &str = "rotation";
    pub const OPACITY: &str = "opacity";
    pub const MOTION: &str = "motion";
}

/// Playback parameters of a layer that shows an animation clip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedLayerFields {
    pub clip_asset_id: AssetId,
    /// Composition time at which clip-local time is zero.
    pub start_time: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
}

/// Layer transform values sampled from its own tracks, before parenting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec2,
    /// Percent (100 = identity).
    pub scale: f64,
    /// Degrees.
    pub rotation: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub source_asset_id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_layer_id: Option<LayerId>,
    pub in_point: f64,
    pub out_point: f64,
    /// Property name -> track, in display order.
    pub tracks: IndexMap<String, Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated_layer_fields: Option<AnimatedLayerFields>,
}

fn seeded(track: Track, value: KeyValue) -> Track {
    let mut track = track;
    track.keys.push(Keyframe::new(0.0, value));
    track
}

impl Layer {
    /// A new layer spanning `[0, duration]` with the four standard tracks keyed at time 0.
    pub fn new(name: impl Into<String>, source: AssetId, canvas_center: Vec2, duration: f64) -> Self {
        let mut tracks = IndexMap::new();
        tracks.insert(
            props::POSITION.to_string(),
            seeded(
                Track::new("Position", ValueType::Vector2).with_linked(false),
                KeyValue::Vector2(canvas_center),
            ),
        );
        tracks.insert(
            props::SCALE.to_string(),
            seeded(
                Track::new("Scale", ValueType::Scalar).with_constraints(Constraints::step(1.0)),
                KeyValue::Scalar(100.0),
            ),
        );
        tracks.insert(
            props::ROTATION.to_string(),
            seeded(
                Track::new("Rotation", ValueType::Scalar).with_constraints(Constraints::step(1.0)),
                KeyValue::Scalar(0.0),
            ),
        );
        tracks.insert(
            props::OPACITY.to_string(),
            seeded(
                Track::new("Opacity", ValueType::Scalar).with_constraints(Constraints::range(0.0, 100.0)),
                KeyValue::Scalar(100.0),
            ),
        );
        Self {
            id: LayerId::fresh(),
            name: name.into(),
            source_asset_id: source,
            parent_layer_id: None,
            in_point: 0.0,
            out_point: duration.max(0.0),
            tracks,
            animated_layer_fields: None,
        }
    }

    /// Turn this into a clip-playing layer with a `motion` track keyed at time 0.
    pub fn with_animation(mut self, fields: AnimatedLayerFields, initial_motion: &str) -> Self {
        self.tracks.insert(
            props::MOTION.to_string(),
            seeded(
                Track::new("Motion", ValueType::DiscreteString),
                KeyValue::Text(initial_motion.to_string()),
            ),
        );
        self.animated_layer_fields = Some(fields);
        self
    }

    /// Visible while `in_point <= t <= out_point`.
    #[inline]
    pub fn is_visible(&self, t: f64) -> bool {
        self.in_point <= t && t <= self.out_point
    }

    pub fn track(&self, property: &str) -> Option<&Track> {
        self.tracks.get(property)
    }

    pub fn track_mut(&mut self, property: &str) -> Result<&mut Track> {
        let layer = self.id.clone();
        self.tracks
            .get_mut(property)
            .ok_or_else(|| CompositionError::TrackNotFound {
                layer,
                property: property.to_string(),
            })
    }

    /// Evaluate one property; `None` when the layer has no such track.
    pub fn evaluate(&self, property: &str, t: f64) -> Option<KeyValue> {
        self.tracks.get(property).map(|track| track.evaluate(t))
    }

    fn scalar_or(&self, property: &str, t: f64, fallback: f64) -> f64 {
        self.evaluate(property, t)
            .and_then(|v| v.as_scalar())
            .unwrap_or(fallback)
    }

    /// Sample position/scale/rotation from the layer's own tracks.
    pub fn local_transform(&self, t: f64) -> LocalTransform {
        let position = self
            .evaluate(props::POSITION, t)
            .and_then(|v| v.as_vec2())
            .unwrap_or(Vec2::ZERO);
        LocalTransform {
            position,
            scale: self.scalar_or(props::SCALE, t, 100.0),
            rotation: self.scalar_or(props::ROTATION, t, 0.0),
        }
    }

    /// Opacity as a 0..1 fraction.
    pub fn opacity(&self, t: f64) -> f64 {
        (self.scalar_or(props::OPACITY, t, 100.0) / 100.0).clamp(0.0, 1.0)
    }

    /// Motion name selected at `t`, for clip layers.
    pub fn motion(&self, t: f64) -> Option<String> {
        self.evaluate(props::MOTION, t)
            .and_then(|v| v.as_text().map(str::to_string))
    }

    /// Shift bounds and every key by `delta`, preserving spacing.
    /// Negative deltas stop where the in-point reaches zero. Returns the applied delta.
    pub fn shift_time(&mut self, delta: f64) -> f64 {
        let delta = delta.max(-self.in_point);
        self.in_point += delta;
        self.out_point += delta;
        if let Some(anim) = self.animated_layer_fields.as_mut() {
            anim.start_time += delta;
        }
        for track in self.tracks.values_mut() {
            track.shift(delta);
        }
        delta
    }

    /// Repair a layer read from disk: bounds ordered and non-negative, tracks sorted
    /// with one key per frame.
    pub fn normalize(&mut self, fps: f64) {
        let in_point = if self.in_point.is_finite() { self.in_point.max(0.0) } else { 0.0 };
        let out_point = if self.out_point.is_finite() { self.out_point } else { in_point };
        if in_point != self.in_point || out_point < in_point {
            log::warn!(
                "layer {} has bounds {}..{}; clamping",
                self.id,
                self.in_point,
                self.out_point
            );
        }
        self.in_point = in_point;
        self.out_point = out_point.max(in_point);
        for (name, track) in self.tracks.iter_mut() {
            let merged = track.normalize(fps);
            if merged > 0 {
                log::warn!("layer {} track {name}: dropped {merged} duplicate or invalid keys", self.id);
            }
        }
    }

    /// Put bounds and every key back on the frame grid.
    pub fn resnap(&mut self, fps: f64) {
        self.in_point = snap(self.in_point, fps);
        self.out_point = snap(self.out_point, fps).max(self.in_point);
        if let Some(anim) = self.animated_layer_fields.as_mut() {
            anim.start_time = snap(anim.start_time, fps);
        }
        for track in self.tracks.values_mut() {
            track.resnap(fps);
        }
    }
}
