//! Composition model: canvas, timing and the ordered layer stack.
//!
//! Index 0 of `layers` is the topmost layer. Drawing walks the stack in
//! reverse; picking walks it forwards. A `LayerId -> index` map is kept in
//! sync with every structural change so parent chains resolve without scans.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, Result};
use crate::ids::{AssetId, LayerId};
use crate::layer::Layer;
use crate::time::snap;
use crate::track::Keyframe;
use crate::transform::ResolvedTransform;
use crate::value::{KeyValue, Vec2};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CompositionRepr", into = "CompositionRepr")]
pub struct Composition {
    pub width: f64,
    pub height: f64,
    /// Seconds.
    pub duration: f64,
    pub fps: f64,
    layers: Vec<Layer>,
    index: HashMap<LayerId, usize>,
}

/// On-disk shape; the index is derived.
#[derive(Serialize, Deserialize)]
struct CompositionRepr {
    width: f64,
    height: f64,
    duration: f64,
    fps: f64,
    #[serde(default)]
    layers: Vec<Layer>,
}

impl From<Composition> for CompositionRepr {
    fn from(c: Composition) -> Self {
        Self {
            width: c.width,
            height: c.height,
            duration: c.duration,
            fps: c.fps,
            layers: c.layers,
        }
    }
}

impl TryFrom<CompositionRepr> for Composition {
    type Error = String;

    fn try_from(repr: CompositionRepr) -> std::result::Result<Self, Self::Error> {
        let mut comp = Composition {
            width: repr.width,
            height: repr.height,
            duration: repr.duration,
            fps: repr.fps,
            layers: repr.layers,
            index: HashMap::new(),
        };
        comp.rebuild_index();
        if comp.index.len() != comp.layers.len() {
            return Err("duplicate layer id in composition".into());
        }
        let known: HashSet<LayerId> = comp.index.keys().cloned().collect();
        let fps = comp.fps;
        for layer in &mut comp.layers {
            layer.normalize(fps);
            if let Some(parent) = &layer.parent_layer_id {
                if !known.contains(parent) {
                    log::warn!(
                        "layer {} references unknown parent {}; detaching",
                        layer.id,
                        parent
                    );
                    layer.parent_layer_id = None;
                }
            }
        }
        for layer in &comp.layers {
            if comp.parent_chain(&layer.id).is_none() {
                return Err(format!("parent cycle through layer {}", layer.id));
            }
        }
        Ok(comp)
    }
}

impl Composition {
    pub fn new(width: f64, height: f64, duration: f64, fps: f64) -> Self {
        Self {
            width,
            height,
            duration: duration.max(0.0),
            fps,
            layers: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn canvas_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Layers topmost-first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, layer) in self.layers.iter().enumerate() {
            self.index.insert(layer.id.clone(), i);
        }
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.index.get(id).map(|&i| &self.layers[i])
    }

    pub fn layer_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.index.get(id).map(|&i| &mut self.layers[i])
    }

    pub fn require_layer(&self, id: &LayerId) -> Result<&Layer> {
        self.layer(id)
            .ok_or_else(|| CompositionError::LayerNotFound(id.clone()))
    }

    pub fn require_layer_mut(&mut self, id: &LayerId) -> Result<&mut Layer> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.layers[i]),
            None => Err(CompositionError::LayerNotFound(id.clone())),
        }
    }

    /// Stack position of a layer (0 = topmost).
    pub fn stack_index(&self, id: &LayerId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Add a layer showing `source` on top of the stack, seeded with default keys.
    pub fn add_layer(&mut self, name: impl Into<String>, source: AssetId) -> &Layer {
        let layer = Layer::new(name, source, self.canvas_center(), self.duration);
        self.insert_layer(layer)
    }

    /// Put a prepared layer on top of the stack.
    pub fn insert_layer(&mut self, layer: Layer) -> &Layer {
        self.layers.insert(0, layer);
        self.rebuild_index();
        &self.layers[0]
    }

    /// Remove a layer. Its children become root layers.
    pub fn remove_layer(&mut self, id: &LayerId) -> Result<Layer> {
        let i = self
            .stack_index(id)
            .ok_or_else(|| CompositionError::LayerNotFound(id.clone()))?;
        let removed = self.layers.remove(i);
        for layer in &mut self.layers {
            if layer.parent_layer_id.as_ref() == Some(id) {
                layer.parent_layer_id = None;
            }
        }
        self.rebuild_index();
        Ok(removed)
    }

    /// Move a layer to `new_index` in the stack (clamped to the stack length).
    pub fn move_layer_in_stack(&mut self, id: &LayerId, new_index: usize) -> Result<()> {
        let i = self
            .stack_index(id)
            .ok_or_else(|| CompositionError::LayerNotFound(id.clone()))?;
        let layer = self.layers.remove(i);
        let at = new_index.min(self.layers.len());
        self.layers.insert(at, layer);
        self.rebuild_index();
        Ok(())
    }

    /// Layer ids from `id` up to its root, or `None` if the chain loops.
    fn parent_chain(&self, id: &LayerId) -> Option<Vec<usize>> {
        let mut chain = Vec::new();
        let mut cur = self.index.get(id).copied();
        while let Some(i) = cur {
            if chain.len() > self.layers.len() {
                return None;
            }
            chain.push(i);
            cur = self.layers[i]
                .parent_layer_id
                .as_ref()
                .and_then(|p| self.index.get(p).copied());
        }
        Some(chain)
    }

    /// Every ancestor of `id` (excluding itself).
    pub fn ancestors(&self, id: &LayerId) -> HashSet<LayerId> {
        self.parent_chain(id)
            .unwrap_or_default()
            .into_iter()
            .skip(1)
            .map(|i| self.layers[i].id.clone())
            .collect()
    }

    /// Parent `id` to `parent`, or make it a root layer with `None`.
    pub fn set_parent(&mut self, id: &LayerId, parent: Option<LayerId>) -> Result<()> {
        self.require_layer(id)?;
        if let Some(p) = &parent {
            self.require_layer(p)?;
            if p == id || self.ancestors(p).contains(id) {
                log::debug!("rejecting parent {p} for layer {id}: would form a cycle");
                return Err(CompositionError::Cycle {
                    item: id.to_string(),
                    target: p.to_string(),
                });
            }
        }
        self.require_layer_mut(id)?.parent_layer_id = parent;
        Ok(())
    }

    /// Set both bounds: snapped, kept within `[0, duration]`, out never before in.
    pub fn set_in_out(&mut self, id: &LayerId, in_point: f64, out_point: f64) -> Result<()> {
        let (fps, duration) = (self.fps, self.duration);
        let layer = self.require_layer_mut(id)?;
        let inp = snap(in_point, fps).clamp(0.0, duration);
        let out = snap(out_point, fps).clamp(0.0, duration).max(inp);
        layer.in_point = inp;
        layer.out_point = out;
        Ok(())
    }

    /// Trim the in-point; it never passes the current out-point.
    pub fn set_in_point(&mut self, id: &LayerId, t: f64) -> Result<()> {
        let fps = self.fps;
        let layer = self.require_layer_mut(id)?;
        layer.in_point = snap(t, fps).max(0.0).min(layer.out_point);
        Ok(())
    }

    /// Trim the out-point; it never precedes the current in-point.
    pub fn set_out_point(&mut self, id: &LayerId, t: f64) -> Result<()> {
        let (fps, duration) = (self.fps, self.duration);
        let layer = self.require_layer_mut(id)?;
        layer.out_point = snap(t, fps).min(duration).max(layer.in_point);
        Ok(())
    }

    /// Move a layer in time by `delta`, keeping key spacing, then re-snap to the frame grid.
    pub fn shift_layer(&mut self, id: &LayerId, delta: f64) -> Result<()> {
        let fps = self.fps;
        let layer = self.require_layer_mut(id)?;
        layer.shift_time(delta);
        layer.resnap(fps);
        Ok(())
    }

    /// Evaluate one property of a layer at composition time `t`.
    pub fn evaluate(&self, id: &LayerId, property: &str, t: f64) -> Option<KeyValue> {
        self.layer(id)?.evaluate(property, t)
    }

    /// Compose a layer's transform with its full parent chain.
    pub fn resolve_transform(&self, id: &LayerId, t: f64) -> Option<ResolvedTransform> {
        let chain = self.parent_chain(id)?;
        if chain.is_empty() {
            return None;
        }
        let resolved = chain
            .iter()
            .rev()
            .fold(ResolvedTransform::IDENTITY, |acc, &i| {
                acc.compose(&self.layers[i].local_transform(t))
            });
        Some(resolved)
    }

    /// Upsert a key on a layer's track using this composition's frame rate.
    pub fn upsert_keyframe(
        &mut self,
        id: &LayerId,
        property: &str,
        t: f64,
        value: KeyValue,
    ) -> Result<Keyframe> {
        let fps = self.fps;
        let track = self.require_layer_mut(id)?.track_mut(property)?;
        Ok(track.upsert(t, value, fps)?.clone())
    }

    pub fn delete_keyframe(
        &mut self,
        id: &LayerId,
        property: &str,
        key: &crate::ids::KeyframeId,
    ) -> Result<Keyframe> {
        let track = self.require_layer_mut(id)?.track_mut(property)?;
        track
            .delete(key)
            .ok_or_else(|| CompositionError::KeyframeNotFound {
                property: property.to_string(),
                key: key.clone(),
            })
    }

    /// Layers visible at `t`, back-to-front (draw order).
    pub fn draw_order(&self, t: f64) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev().filter(move |l| l.is_visible(t))
    }

    /// Topmost visible layer whose content box contains `point`.
    /// Content is centred on the layer origin; `size_of` supplies its size.
    pub fn pick<F>(&self, point: Vec2, t: f64, size_of: F) -> Option<LayerId>
    where
        F: Fn(&Layer) -> Vec2,
    {
        self.layers
            .iter()
            .filter(|l| l.is_visible(t))
            .find(|l| {
                let Some(local) = self
                    .resolve_transform(&l.id, t)
                    .and_then(|tr| tr.to_local(point))
                else {
                    return false;
                };
                let size = size_of(l);
                local.x.abs() <= size.x / 2.0 && local.y.abs() <= size.y / 2.0
            })
            .map(|l| l.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp() -> Composition {
        Composition::new(200.0, 100.0, 5.0, 10.0)
    }

    #[test]
    fn newest_layer_is_topmost() {
        let mut c = comp();
        let a = c.add_layer("A", AssetId::from("x")).id.clone();
        let b = c.add_layer("B", AssetId::from("x")).id.clone();
        assert_eq!(c.stack_index(&b), Some(0));
        assert_eq!(c.stack_index(&a), Some(1));
        let drawn: Vec<&LayerId> = c.draw_order(0.0).map(|l| &l.id).collect();
        assert_eq!(drawn, vec![&a, &b]);
    }

    #[test]
    fn remove_detaches_children() {
        let mut c = comp();
        let a = c.add_layer("A", AssetId::from("x")).id.clone();
        let b = c.add_layer("B", AssetId::from("x")).id.clone();
        c.set_parent(&b, Some(a.clone())).unwrap();
        c.remove_layer(&a).unwrap();
        assert_eq!(c.layer(&b).unwrap().parent_layer_id, None);
        assert_eq!(c.stack_index(&b), Some(0));
    }

    #[test]
    fn in_out_is_clamped() {
        let mut c = comp();
        let a = c.add_layer("A", AssetId::from("x")).id.clone();
        c.set_in_out(&a, 3.0, 1.0).unwrap();
        let l = c.layer(&a).unwrap();
        assert_eq!((l.in_point, l.out_point), (3.0, 3.0));
        c.set_in_out(&a, -1.0, 9.0).unwrap();
        let l = c.layer(&a).unwrap();
        assert_eq!((l.in_point, l.out_point), (0.0, 5.0));
        c.set_out_point(&a, 2.0).unwrap();
        c.set_in_point(&a, 4.0).unwrap();
        let l = c.layer(&a).unwrap();
        assert_eq!((l.in_point, l.out_point), (2.0, 2.0));
    }

    #[test]
    fn pick_prefers_topmost() {
        let mut c = comp();
        let bottom = c.add_layer("bottom", AssetId::from("x")).id.clone();
        let top = c.add_layer("top", AssetId::from("x")).id.clone();
        let size = |_: &Layer| Vec2::new(20.0, 20.0);
        assert_eq!(c.pick(Vec2::new(100.0, 50.0), 0.0, size), Some(top.clone()));
        c.set_in_out(&top, 1.0, 2.0).unwrap();
        assert_eq!(c.pick(Vec2::new(100.0, 50.0), 0.0, size), Some(bottom));
        assert_eq!(c.pick(Vec2::new(0.0, 0.0), 0.0, size), None);
    }

    #[test]
    fn json_with_parent_cycle_is_rejected() {
        let json = r#"{
            "width": 10, "height": 10, "duration": 1, "fps": 10,
            "layers": [
                {"id":"a","name":"a","sourceAssetId":"x","parentLayerId":"b","inPoint":0,"outPoint":1,"tracks":{}},
                {"id":"b","name":"b","sourceAssetId":"x","parentLayerId":"a","inPoint":0,"outPoint":1,"tracks":{}}
            ]
        }"#;
        assert!(serde_json::from_str::<Composition>(json).is_err());
    }

    #[test]
    fn json_with_unknown_parent_is_detached() {
        let json = r#"{
            "width": 10, "height": 10, "duration": 1, "fps": 10,
            "layers": [
                {"id":"a","name":"a","sourceAssetId":"x","parentLayerId":"ghost","inPoint":0,"outPoint":1,"tracks":{}}
            ]
        }"#;
        let c: Composition = serde_json::from_str(json).unwrap();
        assert_eq!(c.layer(&LayerId::from("a")).unwrap().parent_layer_id, None);
    }
}
