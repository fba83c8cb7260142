//! Error type shared by every fallible engine operation.

use crate::ids::{AssetId, KeyframeId, LayerId};

/// Errors surfaced by the asset store, composition model, edit session and project I/O.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum CompositionError {
    /// A move or reparent would make an item its own ancestor.
    #[error("cycle detected: '{item}' cannot be placed under '{target}'")]
    Cycle { item: String, target: String },

    #[error("asset not found: {0}")]
    AssetNotFound(AssetId),

    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("track '{property}' not found on layer {layer}")]
    TrackNotFound { layer: LayerId, property: String },

    #[error("keyframe {key} not found in track '{property}'")]
    KeyframeNotFound { property: String, key: KeyframeId },

    #[error("asset {0} is not a folder")]
    NotAFolder(AssetId),

    #[error("asset {0} is not a composition")]
    NotAComposition(AssetId),

    #[error("asset {0} is not an animation clip")]
    NotAnAnimationClip(AssetId),

    /// Project document has no `assets` array.
    #[error("project document is missing 'assets'")]
    MissingAssets,

    #[error("invalid project document: {0}")]
    InvalidProject(#[from] serde_json::Error),

    #[error("no active composition")]
    NoActiveComposition,

    #[error("value type mismatch on '{property}': expected {expected:?}")]
    ValueTypeMismatch {
        property: String,
        expected: crate::value::ValueType,
    },

    /// A drag was started while another interaction mode is still active.
    #[error("edit session busy in mode {0:?}")]
    SessionBusy(crate::session::EditMode),

    #[error("invalid time value: {0}")]
    InvalidTime(f64),
}

pub type Result<T> = std::result::Result<T, CompositionError>;
