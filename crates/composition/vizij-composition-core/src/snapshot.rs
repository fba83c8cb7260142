//! Render-ready scene output.
//!
//! A snapshot carries only resolved values: world transforms, opacity, every
//! evaluated property and what to draw. Hosts draw `layers` in order
//! (back-to-front) and never reach into tracks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::FrameRect;
use crate::ids::{AssetId, LayerId};
use crate::transform::ResolvedTransform;
use crate::value::{KeyValue, Vec2};

/// Why a layer is drawn as a placeholder box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderReason {
    /// The referenced asset no longer exists.
    MissingAsset,
    /// The asset exists but the host has not finished loading it.
    Loading,
    /// The clip has no motion with the selected name.
    UnknownMotion,
    /// Folder sources or nesting beyond the configured depth.
    NotDrawable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayerContent {
    Image {
        asset: AssetId,
    },
    ClipFrame {
        asset: AssetId,
        motion: String,
        frame_index: usize,
        frame: FrameRect,
    },
    Composition {
        asset: AssetId,
        scene: Box<SceneSnapshot>,
    },
    Placeholder {
        reason: PlaceholderReason,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSnapshot {
    pub layer_id: LayerId,
    pub name: String,
    pub transform: ResolvedTransform,
    /// 0..1
    pub opacity: f64,
    /// Every track of the layer evaluated at the snapshot time.
    pub properties: IndexMap<String, KeyValue>,
    pub content: LayerContent,
    /// Content box size, centred on the layer origin.
    pub size: Vec2,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub time: f64,
    pub width: f64,
    pub height: f64,
    /// Back-to-front.
    pub layers: Vec<LayerSnapshot>,
}

impl SceneSnapshot {
    pub fn layer(&self, id: &LayerId) -> Option<&LayerSnapshot> {
        self.layers.iter().find(|l| &l.layer_id == id)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
