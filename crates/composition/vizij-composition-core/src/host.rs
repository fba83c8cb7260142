//! Asset host trait and simple implementations.
//!
//! Loading images and sprite sheets is the one asynchronous boundary. The
//! engine never waits on it: it asks the host to (re)issue loads and checks
//! readiness when rendering, drawing a placeholder for anything not ready.

use hashbrown::{HashMap, HashSet};

use crate::asset::Asset;
use crate::ids::AssetId;
use crate::value::Vec2;

/// Adapters (editor/runtime) implement this and pass it into load and render calls.
pub trait AssetHost {
    /// Start a non-blocking load of the asset's source. Must return immediately.
    fn request_load(&mut self, asset: &Asset);

    /// Whether the asset's pixels are available for drawing.
    fn is_ready(&self, id: &AssetId) -> bool;

    /// Natural content size, once known.
    fn content_size(&self, _id: &AssetId) -> Option<Vec2> {
        None
    }
}

/// Host that treats every asset as loaded (headless playback, tests).
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReady;

impl AssetHost for AlwaysReady {
    fn request_load(&mut self, _asset: &Asset) {}

    fn is_ready(&self, _id: &AssetId) -> bool {
        true
    }
}

/// Records requested loads; readiness is flipped explicitly by the owner when a load finishes.
#[derive(Clone, Debug, Default)]
pub struct LoadTracker {
    requested: Vec<(AssetId, String)>,
    ready: HashSet<AssetId>,
    sizes: HashMap<AssetId, Vec2>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// (asset, source) pairs in request order.
    pub fn requested(&self) -> &[(AssetId, String)] {
        &self.requested
    }

    pub fn mark_ready(&mut self, id: AssetId, size: Option<Vec2>) {
        if let Some(size) = size {
            self.sizes.insert(id.clone(), size);
        }
        self.ready.insert(id);
    }

    pub fn clear(&mut self) {
        self.requested.clear();
        self.ready.clear();
        self.sizes.clear();
    }
}

impl AssetHost for LoadTracker {
    fn request_load(&mut self, asset: &Asset) {
        if let Some(src) = asset.source() {
            self.requested.push((asset.id.clone(), src.to_string()));
        }
    }

    fn is_ready(&self, id: &AssetId) -> bool {
        self.ready.contains(id)
    }

    fn content_size(&self, id: &AssetId) -> Option<Vec2> {
        self.sizes.get(id).copied()
    }
}
