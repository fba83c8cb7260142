//! Asset data model: images, sprite-sheet clips, folders and compositions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::composition::Composition;
use crate::ids::AssetId;
use crate::value::Vec2;

/// Rectangular region of a sprite sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One named motion of an animation clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionClip {
    pub frames: Vec<FrameRect>,
    pub fps: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl MotionClip {
    /// Frame shown `local_time` seconds after the clip started, wrapped when
    /// `looping` and held on the last frame otherwise.
    /// `None` before the start or when the motion has no frames.
    pub fn frame_index(&self, local_time: f64, looping: bool) -> Option<usize> {
        let count = self.frames.len();
        if count == 0 || local_time < 0.0 || !local_time.is_finite() {
            return None;
        }
        let raw = (local_time * self.fps.max(0.0)).floor() as usize;
        Some(if looping { raw % count } else { raw.min(count - 1) })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AssetKind {
    Image {
        src: String,
        /// Natural size, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Vec2>,
    },
    AnimationClip {
        /// Sprite sheet location.
        src: String,
        motions: IndexMap<String, MotionClip>,
    },
    Folder {
        #[serde(default)]
        children: Vec<Asset>,
        /// Display-only disclosure state.
        #[serde(default)]
        expanded: bool,
    },
    Composition(Composition),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    #[serde(flatten)]
    pub kind: AssetKind,
}

impl Asset {
    pub fn image(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: AssetId::fresh(),
            name: name.into(),
            kind: AssetKind::Image {
                src: src.into(),
                size: None,
            },
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            id: AssetId::fresh(),
            name: name.into(),
            kind: AssetKind::Folder {
                children: Vec::new(),
                expanded: false,
            },
        }
    }

    pub fn animation_clip(
        name: impl Into<String>,
        src: impl Into<String>,
        motions: IndexMap<String, MotionClip>,
    ) -> Self {
        Self {
            id: AssetId::fresh(),
            name: name.into(),
            kind: AssetKind::AnimationClip {
                src: src.into(),
                motions,
            },
        }
    }

    pub fn composition(name: impl Into<String>, composition: Composition) -> Self {
        Self {
            id: AssetId::fresh(),
            name: name.into(),
            kind: AssetKind::Composition(composition),
        }
    }

    pub fn with_id(mut self, id: impl Into<AssetId>) -> Self {
        self.id = id.into();
        self
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, AssetKind::Folder { .. })
    }

    pub fn children(&self) -> &[Asset] {
        match &self.kind {
            AssetKind::Folder { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Asset>> {
        match &mut self.kind {
            AssetKind::Folder { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn as_composition(&self) -> Option<&Composition> {
        match &self.kind {
            AssetKind::Composition(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_composition_mut(&mut self) -> Option<&mut Composition> {
        match &mut self.kind {
            AssetKind::Composition(c) => Some(c),
            _ => None,
        }
    }

    pub fn motions(&self) -> Option<&IndexMap<String, MotionClip>> {
        match &self.kind {
            AssetKind::AnimationClip { motions, .. } => Some(motions),
            _ => None,
        }
    }

    /// Location a host must load before the asset can be drawn.
    pub fn source(&self) -> Option<&str> {
        match &self.kind {
            AssetKind::Image { src, .. } | AssetKind::AnimationClip { src, .. } => Some(src),
            _ => None,
        }
    }
}
