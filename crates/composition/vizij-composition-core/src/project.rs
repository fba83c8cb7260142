//! Project file (JSON) format.
//!
//! Top level: `{ "activeCompositionId"?: string, "assets": [Asset...] }`.
//! Folders nest `children`; compositions embed their layers. Runtime-only
//! state (loaded bitmaps, readiness) is never written.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::{CompositionError, Result};
use crate::ids::AssetId;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_composition_id: Option<AssetId>,
    pub assets: Vec<Asset>,
}

/// Read shape: `assets` is optional here so its absence is reported as
/// [`CompositionError::MissingAssets`] rather than a generic parse error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    active_composition_id: Option<AssetId>,
    #[serde(default)]
    assets: Option<Vec<Asset>>,
}

impl ProjectDocument {
    pub fn new(active_composition_id: Option<AssetId>, assets: Vec<Asset>) -> Self {
        Self {
            active_composition_id,
            assets,
        }
    }

    /// Parse a project file. Nothing is applied anywhere; callers swap state only on `Ok`.
    pub fn from_json(s: &str) -> Result<Self> {
        let raw: RawProject = serde_json::from_str(s)?;
        let assets = raw.assets.ok_or(CompositionError::MissingAssets)?;
        Ok(Self {
            active_composition_id: raw.active_composition_id,
            assets,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_assets_is_reported() {
        let err = ProjectDocument::from_json(r#"{ "activeCompositionId": "c" }"#).unwrap_err();
        assert!(matches!(err, CompositionError::MissingAssets));
        let err = ProjectDocument::from_json(r#"{ "assets": null }"#).unwrap_err();
        assert!(matches!(err, CompositionError::MissingAssets));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = ProjectDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CompositionError::InvalidProject(_)));
    }

    #[test]
    fn empty_project_parses() {
        let doc = ProjectDocument::from_json(r#"{ "assets": [] }"#).unwrap();
        assert!(doc.assets.is_empty());
        assert_eq!(doc.active_composition_id, None);
    }
}
