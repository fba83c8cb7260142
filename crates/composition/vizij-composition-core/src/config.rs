//! Engine configuration: composition defaults, timeline geometry and render guards.

use serde::{Deserialize, Serialize};

use crate::value::Vec2;

/// Maps pointer deltas (pixels) onto time and value deltas for drag interactions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineGeometry {
    /// Horizontal pixels per second of composition time.
    pub pixels_per_second: f64,
    /// Horizontal pixels per constraint step when scrubbing a value.
    pub value_pixels_per_step: f64,
}

impl Default for TimelineGeometry {
    fn default() -> Self {
        Self {
            pixels_per_second: 100.0,
            value_pixels_per_step: 1.0,
        }
    }
}

/// Configuration carried by an [`EngineContext`](crate::context::EngineContext).
/// Every field has a default so partial JSON configs are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub default_fps: f64,
    pub default_width: f64,
    pub default_height: f64,
    pub default_duration_seconds: f64,

    pub timeline: TimelineGeometry,

    /// Size of the box drawn for layers whose asset is missing or still loading.
    pub placeholder_size: Vec2,

    /// Nested compositions deeper than this render as placeholders.
    pub max_nesting_depth: usize,

    pub panel_height_range: (f64, f64),
    pub initial_panel_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_fps: 30.0,
            default_width: 1920.0,
            default_height: 1080.0,
            default_duration_seconds: 10.0,
            timeline: TimelineGeometry::default(),
            placeholder_size: Vec2::new(100.0, 100.0),
            max_nesting_depth: 8,
            panel_height_range: (80.0, 600.0),
            initial_panel_height: 240.0,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config; absent fields keep their defaults.
    pub fn from_json(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "defaultFps": 24, "timeline": { "pixelsPerSecond": 50 } }"#)
            .expect("config parses");
        assert_eq!(cfg.default_fps, 24.0);
        assert_eq!(cfg.timeline.pixels_per_second, 50.0);
        assert_eq!(cfg.timeline.value_pixels_per_step, 1.0);
        assert_eq!(cfg.max_nesting_depth, 8);
    }
}
