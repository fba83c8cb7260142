//! Edit session: pointer-driven authoring interactions.
//!
//! At most one drag is active at a time. Entering a drag records the pointer
//! position and the pre-drag value; every update recomputes the effect from
//! the pointer delta against that reference; release commits and returns to
//! [`EditMode::Idle`]. There is no cancel.

use serde::{Deserialize, Serialize};

use crate::composition::Composition;
use crate::config::EngineConfig;
use crate::error::{CompositionError, Result};
use crate::ids::{KeyframeId, LayerId};
use crate::layer::{props, Layer};
use crate::playback::Playback;
use crate::value::{KeyValue, ValueType, Vec2};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    #[default]
    Idle,
    ScrubTime,
    DragKey,
    DragLayerIn,
    DragLayerOut,
    DragLayerMove,
    ScrubValue,
    ResizePanel,
}

/// What a pointer-down grabbed. Each variant implies its [`EditMode`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DragTarget {
    TimeRuler,
    Key {
        layer: LayerId,
        property: String,
        key: KeyframeId,
    },
    LayerIn(LayerId),
    LayerOut(LayerId),
    LayerBar(LayerId),
    Value {
        layer: LayerId,
        property: String,
    },
    Panel,
}

impl DragTarget {
    pub fn mode(&self) -> EditMode {
        match self {
            DragTarget::TimeRuler => EditMode::ScrubTime,
            DragTarget::Key { .. } => EditMode::DragKey,
            DragTarget::LayerIn(_) => EditMode::DragLayerIn,
            DragTarget::LayerOut(_) => EditMode::DragLayerOut,
            DragTarget::LayerBar(_) => EditMode::DragLayerMove,
            DragTarget::Value { .. } => EditMode::ScrubValue,
            DragTarget::Panel => EditMode::ResizePanel,
        }
    }
}

/// Pre-drag reference captured on entry.
#[derive(Clone, Debug, PartialEq)]
enum DragOrigin {
    Time(f64),
    Value(KeyValue),
    /// Whole layer as it was, so a move can be recomputed from scratch each update.
    Layer(Box<Layer>),
    PanelHeight(f64),
}

#[derive(Clone, Debug, PartialEq)]
struct ActiveDrag {
    target: DragTarget,
    start_pointer: Vec2,
    origin: DragOrigin,
}

/// Current selection in the editor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub layer: Option<LayerId>,
    /// (property, key)
    pub key: Option<(String, KeyframeId)>,
}

/// Everything the session mutates while processing a pointer event.
pub struct SessionScope<'a> {
    pub comp: &'a mut Composition,
    pub playback: &'a mut Playback,
    pub config: &'a EngineConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    drag: Option<ActiveDrag>,
    pub selection: Selection,
    pub panel_height: f64,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl EditSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            drag: None,
            selection: Selection::default(),
            panel_height: config.initial_panel_height,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.drag
            .as_ref()
            .map_or(EditMode::Idle, |d| d.target.mode())
    }

    /// Back to idle with nothing selected (composition switch).
    pub fn reset(&mut self) {
        self.drag = None;
        self.selection = Selection::default();
    }

    pub fn select(&mut self, layer: Option<LayerId>, key: Option<(String, KeyframeId)>) {
        self.selection = Selection { layer, key };
    }

    /// Enter a drag mode, recording the pointer and the value being dragged.
    pub fn begin(&mut self, scope: SessionScope<'_>, target: DragTarget, pointer: Vec2) -> Result<()> {
        if let Some(active) = &self.drag {
            return Err(CompositionError::SessionBusy(active.target.mode()));
        }
        let origin = match &target {
            DragTarget::TimeRuler => DragOrigin::Time(scope.playback.current_time),
            DragTarget::Key { layer, property, key } => {
                let track = scope
                    .comp
                    .require_layer(layer)?
                    .track(property)
                    .ok_or_else(|| CompositionError::TrackNotFound {
                        layer: layer.clone(),
                        property: property.clone(),
                    })?;
                let k = track.key(key).ok_or_else(|| CompositionError::KeyframeNotFound {
                    property: property.clone(),
                    key: key.clone(),
                })?;
                self.select(Some(layer.clone()), Some((property.clone(), key.clone())));
                DragOrigin::Time(k.time)
            }
            DragTarget::LayerIn(layer) => DragOrigin::Time(scope.comp.require_layer(layer)?.in_point),
            DragTarget::LayerOut(layer) => DragOrigin::Time(scope.comp.require_layer(layer)?.out_point),
            DragTarget::LayerBar(layer) => {
                DragOrigin::Layer(Box::new(scope.comp.require_layer(layer)?.clone()))
            }
            DragTarget::Value { layer, property } => {
                let t = scope.playback.current_time;
                let value = scope
                    .comp
                    .require_layer(layer)?
                    .evaluate(property, t)
                    .ok_or_else(|| CompositionError::TrackNotFound {
                        layer: layer.clone(),
                        property: property.clone(),
                    })?;
                DragOrigin::Value(value)
            }
            DragTarget::Panel => DragOrigin::PanelHeight(self.panel_height),
        };
        log::debug!("edit session: begin {:?}", target.mode());
        self.drag = Some(ActiveDrag {
            target,
            start_pointer: pointer,
            origin,
        });
        Ok(())
    }

    /// Apply the live pointer position. No-op while idle.
    pub fn update(&mut self, scope: SessionScope<'_>, pointer: Vec2) -> Result<()> {
        let Some(drag) = &self.drag else {
            return Ok(());
        };
        let delta = Vec2::new(pointer.x - drag.start_pointer.x, pointer.y - drag.start_pointer.y);
        let geometry = scope.config.timeline;
        let dt = delta.x / geometry.pixels_per_second;
        let fps = scope.comp.fps;

        match (&drag.target, &drag.origin) {
            (DragTarget::TimeRuler, DragOrigin::Time(t0)) => {
                scope.playback.seek(t0 + dt)?;
            }
            (DragTarget::Key { layer, property, key }, DragOrigin::Time(t0)) => {
                let track = scope.comp.require_layer_mut(layer)?.track_mut(property)?;
                // An occupied frame leaves the key where it was.
                track.move_key(key, t0 + dt, fps)?;
            }
            (DragTarget::LayerIn(layer), DragOrigin::Time(t0)) => {
                scope.comp.set_in_point(layer, t0 + dt)?;
            }
            (DragTarget::LayerOut(layer), DragOrigin::Time(t0)) => {
                scope.comp.set_out_point(layer, t0 + dt)?;
            }
            (DragTarget::LayerBar(layer), DragOrigin::Layer(original)) => {
                let live = scope.comp.require_layer_mut(layer)?;
                *live = (**original).clone();
                live.shift_time(dt);
            }
            (DragTarget::Value { layer, property }, DragOrigin::Value(start)) => {
                let step = scope
                    .comp
                    .require_layer(layer)?
                    .track(property)
                    .map_or(1.0, |t| t.step());
                let per_px = step / geometry.value_pixels_per_step;
                let value = match start {
                    KeyValue::Scalar(v) => KeyValue::Scalar(v + delta.x * per_px),
                    KeyValue::Vector2(v) => {
                        KeyValue::Vector2(Vec2::new(v.x + delta.x * per_px, v.y + delta.y * per_px))
                    }
                    KeyValue::Text(_) => return Ok(()),
                };
                let t = scope.playback.current_time;
                scope.comp.upsert_keyframe(layer, property, t, value)?;
            }
            (DragTarget::Panel, DragOrigin::PanelHeight(h0)) => {
                let (lo, hi) = scope.config.panel_height_range;
                self.panel_height = (h0 + delta.y).clamp(lo, hi.max(lo));
            }
            _ => {}
        }
        Ok(())
    }

    /// Pointer release: commit the drag's effect and return to idle.
    pub fn commit(&mut self, scope: SessionScope<'_>) -> Result<()> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        if let DragTarget::LayerBar(layer) = &drag.target {
            let fps = scope.comp.fps;
            scope.comp.require_layer_mut(layer)?.resnap(fps);
        }
        log::debug!("edit session: commit {:?}", drag.target.mode());
        Ok(())
    }
}

/// Parse inline numeric entry for a property.
///
/// - scalar: a plain number
/// - vector2: `"x,y"`
/// - rotation: a plain number of degrees or `"revolutions+degrees"` (e.g. `"1+45"` is 405)
/// - discrete string: the trimmed text
///
/// Returns `None` for malformed input.
pub fn parse_inline_value(property: &str, value_type: ValueType, text: &str) -> Option<KeyValue> {
    let text = text.trim();
    let number = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    match value_type {
        ValueType::Scalar => {
            if property == props::ROTATION {
                if let Some((revs, degs)) = text.split_once('+') {
                    if let (Some(r), Some(d)) = (number(revs), number(degs)) {
                        return Some(KeyValue::Scalar(r * 360.0 + d));
                    }
                }
            }
            number(text).map(KeyValue::Scalar)
        }
        ValueType::Vector2 => {
            let (x, y) = text.split_once(',')?;
            Some(KeyValue::Vector2(Vec2::new(number(x)?, number(y)?)))
        }
        ValueType::DiscreteString => (!text.is_empty()).then(|| KeyValue::Text(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_grammar() {
        assert_eq!(parse_inline_value("opacity", ValueType::Scalar, " 42.5 "), Some(KeyValue::Scalar(42.5)));
        assert_eq!(parse_inline_value("opacity", ValueType::Scalar, "abc"), None);
        assert_eq!(
            parse_inline_value("position", ValueType::Vector2, "10, -4"),
            Some(KeyValue::Vector2(Vec2::new(10.0, -4.0)))
        );
        assert_eq!(parse_inline_value("position", ValueType::Vector2, "10"), None);
        assert_eq!(parse_inline_value("rotation", ValueType::Scalar, "1+45"), Some(KeyValue::Scalar(405.0)));
        assert_eq!(parse_inline_value("rotation", ValueType::Scalar, "-90"), Some(KeyValue::Scalar(-90.0)));
        assert_eq!(parse_inline_value("rotation", ValueType::Scalar, "1e+2"), Some(KeyValue::Scalar(100.0)));
        assert_eq!(parse_inline_value("rotation", ValueType::Scalar, "x+45"), None);
        assert_eq!(parse_inline_value("motion", ValueType::DiscreteString, "  "), None);
    }

    #[test]
    fn drag_target_implies_mode() {
        assert_eq!(DragTarget::Panel.mode(), EditMode::ResizePanel);
        assert_eq!(DragTarget::LayerBar(LayerId::from("a")).mode(), EditMode::DragLayerMove);
        assert_eq!(EditSession::default().mode(), EditMode::Idle);
    }
}
