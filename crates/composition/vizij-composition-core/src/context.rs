//! Engine context: the asset store, the working composition, playback and the edit session.
//!
//! The active composition is checked out of the store into a working copy and
//! edited there. It is written back when another composition is opened and
//! before every export. All state is owned by one context; nothing is global.
//!
//! Input adapters translate pointer events into [`EditCommand`]s and
//! [`enqueue`](EngineContext::enqueue) them; [`tick`](EngineContext::tick)
//! drains the queue in order and then advances playback.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, MotionClip};
use crate::composition::Composition;
use crate::config::EngineConfig;
use crate::error::{CompositionError, Result};
use crate::host::AssetHost;
use crate::ids::{AssetId, KeyframeId, LayerId};
use crate::interp::Interpolation;
use crate::layer::{AnimatedLayerFields, Layer};
use crate::playback::{Playback, PlaybackEvent, SceneRenderer};
use crate::project::ProjectDocument;
use crate::session::{parse_inline_value, DragTarget, EditSession, SessionScope};
use crate::snapshot::SceneSnapshot;
use crate::store::AssetStore;
use crate::track::Keyframe;
use crate::transform::ResolvedTransform;
use crate::value::{KeyValue, Vec2};

/// Engine commands produced by input adapters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EditCommand {
    BeginDrag {
        target: DragTarget,
        pointer: Vec2,
    },
    UpdateDrag {
        pointer: Vec2,
    },
    CommitDrag,
    Select {
        layer: Option<LayerId>,
        key: Option<(String, KeyframeId)>,
    },
    ClearSelection,
    UpsertKey {
        layer: LayerId,
        property: String,
        time: f64,
        value: KeyValue,
    },
    DeleteKey {
        layer: LayerId,
        property: String,
        key: KeyframeId,
    },
    /// Text typed into a key's value field; malformed text is dropped.
    InlineEdit {
        layer: LayerId,
        property: String,
        key: KeyframeId,
        text: String,
    },
    SetInterpolation {
        layer: LayerId,
        property: String,
        key: KeyframeId,
        mode: Interpolation,
    },
    SetParent {
        layer: LayerId,
        parent: Option<LayerId>,
    },
    MoveAsset {
        asset: AssetId,
        parent: Option<AssetId>,
    },
    SetInOut {
        layer: LayerId,
        in_point: f64,
        out_point: f64,
    },
    ShiftLayer {
        layer: LayerId,
        delta: f64,
    },
    Seek {
        time: f64,
    },
    Play,
    Pause,
}

/// Outcome of one [`EngineContext::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<PlaybackEvent>,
    /// Commands that failed; the rest of the queue was still processed.
    pub errors: Vec<CompositionError>,
}

/// Checked-out working copy of a composition asset.
#[derive(Clone, Debug, PartialEq)]
struct ActiveComposition {
    id: AssetId,
    comp: Composition,
}

#[derive(Debug)]
pub struct EngineContext {
    pub config: EngineConfig,
    store: AssetStore,
    active: Option<ActiveComposition>,
    pub session: EditSession,
    pub playback: Playback,
    queue: VecDeque<EditCommand>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            session: EditSession::new(&config),
            playback: Playback::new(config.default_duration_seconds, config.default_fps),
            config,
            store: AssetStore::new(),
            active: None,
            queue: VecDeque::new(),
        }
    }

    /// The asset tree. The active composition's entry may lag its working copy
    /// until [`sync_active`](Self::sync_active).
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn active_composition_id(&self) -> Option<&AssetId> {
        self.active.as_ref().map(|a| &a.id)
    }

    pub fn active_composition(&self) -> Option<&Composition> {
        self.active.as_ref().map(|a| &a.comp)
    }

    fn comp(&self) -> Result<&Composition> {
        self.active_composition()
            .ok_or(CompositionError::NoActiveComposition)
    }

    fn comp_mut(&mut self) -> Result<&mut Composition> {
        self.active
            .as_mut()
            .map(|a| &mut a.comp)
            .ok_or(CompositionError::NoActiveComposition)
    }

    // ----- asset graph -----

    /// Write the working copy back into its store entry.
    pub fn sync_active(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        match self
            .store
            .find_mut(&active.id)
            .and_then(Asset::as_composition_mut)
        {
            Some(entry) => *entry = active.comp.clone(),
            None => log::warn!("active composition {} no longer in store", active.id),
        }
    }

    pub fn add_folder(&mut self, name: &str, parent: Option<&AssetId>) -> Result<AssetId> {
        let asset = Asset::folder(name);
        let id = asset.id.clone();
        self.store.add(asset, parent)?;
        Ok(id)
    }

    /// Import an image and start loading it.
    pub fn import_image(
        &mut self,
        name: &str,
        src: &str,
        parent: Option<&AssetId>,
        host: &mut dyn AssetHost,
    ) -> Result<AssetId> {
        let asset = Asset::image(name, src);
        let id = asset.id.clone();
        host.request_load(&asset);
        self.store.add(asset, parent)?;
        Ok(id)
    }

    pub fn create_animation_clip(
        &mut self,
        name: &str,
        src: &str,
        motions: IndexMap<String, MotionClip>,
        parent: Option<&AssetId>,
        host: &mut dyn AssetHost,
    ) -> Result<AssetId> {
        let asset = Asset::animation_clip(name, src, motions);
        let id = asset.id.clone();
        host.request_load(&asset);
        self.store.add(asset, parent)?;
        Ok(id)
    }

    /// Create a composition asset. It becomes active if none is.
    pub fn create_composition(
        &mut self,
        name: &str,
        width: f64,
        height: f64,
        duration: f64,
        fps: f64,
        parent: Option<&AssetId>,
    ) -> Result<AssetId> {
        let asset = Asset::composition(name, Composition::new(width, height, duration, fps));
        let id = asset.id.clone();
        self.store.add(asset, parent)?;
        if self.active.is_none() {
            self.open_composition(&id)?;
        }
        Ok(id)
    }

    /// Delete an asset. Layers still referencing it keep a dangling reference
    /// and render as placeholders.
    pub fn remove_asset(&mut self, id: &AssetId) -> Result<Asset> {
        self.sync_active();
        let referencing = self.store.referencing_layers(id);
        if !referencing.is_empty() {
            log::warn!(
                "removing asset {id} still referenced by {} layer(s)",
                referencing.len()
            );
        }
        let removed = self.store.remove(id)?;
        let active_gone = self
            .active
            .as_ref()
            .is_some_and(|a| !self.store.contains(&a.id));
        if active_gone {
            log::info!("active composition removed; closing it");
            self.active = None;
            self.session.reset();
            self.playback.stop();
        }
        Ok(removed)
    }

    pub fn move_asset(&mut self, id: &AssetId, parent: Option<&AssetId>) -> Result<()> {
        self.store.move_to(id, parent)
    }

    /// Check a composition out for editing, writing the current one back first.
    /// Resets the edit session and playback.
    pub fn open_composition(&mut self, id: &AssetId) -> Result<()> {
        let comp = self
            .store
            .require(id)?
            .as_composition()
            .cloned()
            .ok_or_else(|| CompositionError::NotAComposition(id.clone()))?;
        self.sync_active();
        log::info!("opening composition {id}");
        self.playback = Playback::for_composition(&comp);
        self.session.reset();
        self.active = Some(ActiveComposition {
            id: id.clone(),
            comp,
        });
        Ok(())
    }

    // ----- layers & keys -----

    /// Add a layer showing `source` on top of the active composition.
    /// Animation clip sources become clip layers keyed to their first motion.
    pub fn add_layer(&mut self, name: &str, source: &AssetId) -> Result<LayerId> {
        let asset = self.store.require(source)?;
        let clip = asset.motions().map(|motions| {
            let first = motions.iter().next();
            (
                first.map(|(n, _)| n.clone()).unwrap_or_default(),
                first.is_some_and(|(_, m)| m.looping),
            )
        });
        let comp = self.comp_mut()?;
        let mut layer = Layer::new(name, source.clone(), comp.canvas_center(), comp.duration);
        if let Some((motion, looping)) = clip {
            layer = layer.with_animation(
                AnimatedLayerFields {
                    clip_asset_id: source.clone(),
                    start_time: 0.0,
                    looping,
                },
                &motion,
            );
        }
        Ok(comp.insert_layer(layer).id.clone())
    }

    /// Point a layer at another animation clip and key `motion` at time 0.
    /// Existing timing (in/out, start time) is kept.
    pub fn set_layer_clip(&mut self, layer: &LayerId, clip: &AssetId, motion: &str) -> Result<()> {
        let looping = self
            .store
            .require(clip)?
            .motions()
            .ok_or_else(|| CompositionError::NotAnAnimationClip(clip.clone()))?
            .get(motion)
            .is_some_and(|m| m.looping);
        let target = self.comp_mut()?.require_layer_mut(layer)?;
        let start_time = target
            .animated_layer_fields
            .as_ref()
            .map_or(target.in_point, |f| f.start_time);
        let updated = target.clone().with_animation(
            AnimatedLayerFields {
                clip_asset_id: clip.clone(),
                start_time,
                looping,
            },
            motion,
        );
        *target = updated;
        Ok(())
    }

    pub fn remove_layer(&mut self, layer: &LayerId) -> Result<Layer> {
        let removed = self.comp_mut()?.remove_layer(layer)?;
        if self.session.selection.layer.as_ref() == Some(layer) {
            self.session.reset();
        }
        Ok(removed)
    }

    pub fn set_parent(&mut self, layer: &LayerId, parent: Option<LayerId>) -> Result<()> {
        self.comp_mut()?.set_parent(layer, parent)
    }

    pub fn set_in_out(&mut self, layer: &LayerId, in_point: f64, out_point: f64) -> Result<()> {
        self.comp_mut()?.set_in_out(layer, in_point, out_point)
    }

    pub fn shift_layer(&mut self, layer: &LayerId, delta: f64) -> Result<()> {
        self.comp_mut()?.shift_layer(layer, delta)
    }

    pub fn upsert_keyframe(
        &mut self,
        layer: &LayerId,
        property: &str,
        time: f64,
        value: KeyValue,
    ) -> Result<Keyframe> {
        self.comp_mut()?.upsert_keyframe(layer, property, time, value)
    }

    pub fn delete_keyframe(
        &mut self,
        layer: &LayerId,
        property: &str,
        key: &KeyframeId,
    ) -> Result<Keyframe> {
        let removed = self.comp_mut()?.delete_keyframe(layer, property, key)?;
        if self
            .session
            .selection
            .key
            .as_ref()
            .is_some_and(|(_, k)| k == key)
        {
            self.session.selection.key = None;
        }
        Ok(removed)
    }

    /// Commit inline text to a key. Malformed text leaves the key untouched.
    /// Returns whether the value changed.
    pub fn inline_edit(
        &mut self,
        layer: &LayerId,
        property: &str,
        key: &KeyframeId,
        text: &str,
    ) -> Result<bool> {
        let track = self.comp_mut()?.require_layer_mut(layer)?.track_mut(property)?;
        let Some(value) = parse_inline_value(property, track.value_type, text) else {
            log::debug!("dropping malformed inline entry {text:?} for '{property}'");
            return Ok(false);
        };
        track.set_key_value(key, value)?;
        Ok(true)
    }

    // ----- runtime API -----

    /// Value of one property of a layer in the active composition.
    pub fn evaluate(&self, layer: &LayerId, property: &str, time: f64) -> Result<KeyValue> {
        let l = self.comp()?.require_layer(layer)?;
        l.evaluate(property, time)
            .ok_or_else(|| CompositionError::TrackNotFound {
                layer: layer.clone(),
                property: property.to_string(),
            })
    }

    pub fn resolve_transform(&self, layer: &LayerId, time: f64) -> Result<ResolvedTransform> {
        self.comp()?
            .resolve_transform(layer, time)
            .ok_or_else(|| CompositionError::LayerNotFound(layer.clone()))
    }

    pub fn render_snapshot(&self, time: f64, host: &dyn AssetHost) -> Result<SceneSnapshot> {
        let comp = self.comp()?;
        Ok(SceneRenderer::new(&self.store, host, &self.config).render(comp, time))
    }

    /// Snapshot at the playback clock.
    pub fn render_current(&self, host: &dyn AssetHost) -> Result<SceneSnapshot> {
        self.render_snapshot(self.playback.current_time, host)
    }

    /// Topmost layer under `point` (composition space) at `time`.
    pub fn pick(&self, point: Vec2, time: f64, host: &dyn AssetHost) -> Result<Option<LayerId>> {
        let snapshot = self.render_snapshot(time, host)?;
        let sizes: HashMap<&LayerId, Vec2> = snapshot
            .layers
            .iter()
            .map(|l| (&l.layer_id, l.size))
            .collect();
        let comp = self.comp()?;
        Ok(comp.pick(point, time, |layer| {
            sizes.get(&layer.id).copied().unwrap_or(Vec2::ZERO)
        }))
    }

    pub fn seek(&mut self, time: f64) -> Result<f64> {
        self.playback.seek(time)
    }

    pub fn play(&mut self) -> Option<PlaybackEvent> {
        self.playback.play()
    }

    pub fn pause(&mut self) -> Option<PlaybackEvent> {
        self.playback.pause()
    }

    // ----- commands -----

    pub fn enqueue(&mut self, cmd: EditCommand) {
        self.queue.push_back(cmd);
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// One frame: process queued commands in order, then advance the clock.
    pub fn tick(&mut self, dt: f64) -> TickReport {
        let mut report = TickReport::default();
        while let Some(cmd) = self.queue.pop_front() {
            match self.apply(cmd) {
                Ok(Some(event)) => report.events.push(event),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("command failed: {err}");
                    report.errors.push(err);
                }
            }
        }
        if let Some(active) = &self.active {
            self.playback.retime(active.comp.duration, active.comp.fps);
        }
        report.events.extend(self.playback.tick(dt));
        report
    }

    /// Process one command immediately.
    pub fn apply(&mut self, cmd: EditCommand) -> Result<Option<PlaybackEvent>> {
        match cmd {
            EditCommand::BeginDrag { target, pointer } => {
                let active = self.active.as_mut().ok_or(CompositionError::NoActiveComposition)?;
                let scope = SessionScope {
                    comp: &mut active.comp,
                    playback: &mut self.playback,
                    config: &self.config,
                };
                self.session.begin(scope, target, pointer)?;
            }
            EditCommand::UpdateDrag { pointer } => {
                let active = self.active.as_mut().ok_or(CompositionError::NoActiveComposition)?;
                let scope = SessionScope {
                    comp: &mut active.comp,
                    playback: &mut self.playback,
                    config: &self.config,
                };
                self.session.update(scope, pointer)?;
            }
            EditCommand::CommitDrag => {
                let active = self.active.as_mut().ok_or(CompositionError::NoActiveComposition)?;
                let scope = SessionScope {
                    comp: &mut active.comp,
                    playback: &mut self.playback,
                    config: &self.config,
                };
                self.session.commit(scope)?;
            }
            EditCommand::Select { layer, key } => self.session.select(layer, key),
            EditCommand::ClearSelection => self.session.select(None, None),
            EditCommand::UpsertKey {
                layer,
                property,
                time,
                value,
            } => {
                self.upsert_keyframe(&layer, &property, time, value)?;
            }
            EditCommand::DeleteKey { layer, property, key } => {
                self.delete_keyframe(&layer, &property, &key)?;
            }
            EditCommand::InlineEdit {
                layer,
                property,
                key,
                text,
            } => {
                self.inline_edit(&layer, &property, &key, &text)?;
            }
            EditCommand::SetInterpolation {
                layer,
                property,
                key,
                mode,
            } => {
                self.comp_mut()?
                    .require_layer_mut(&layer)?
                    .track_mut(&property)?
                    .set_interpolation(&key, mode)?;
            }
            EditCommand::SetParent { layer, parent } => self.set_parent(&layer, parent)?,
            EditCommand::MoveAsset { asset, parent } => self.move_asset(&asset, parent.as_ref())?,
            EditCommand::SetInOut {
                layer,
                in_point,
                out_point,
            } => self.set_in_out(&layer, in_point, out_point)?,
            EditCommand::ShiftLayer { layer, delta } => self.shift_layer(&layer, delta)?,
            EditCommand::Seek { time } => {
                self.seek(time)?;
            }
            EditCommand::Play => return Ok(self.play()),
            EditCommand::Pause => return Ok(self.pause()),
        }
        Ok(None)
    }

    // ----- project I/O -----

    /// Replace the whole project from JSON. On error nothing changes.
    ///
    /// The active composition is `activeCompositionId` when it names a
    /// composition, else the first composition depth-first. Loads are
    /// re-issued for every asset a layer shows.
    pub fn load_project(&mut self, json: &str, host: &mut dyn AssetHost) -> Result<()> {
        let doc = ProjectDocument::from_json(json)?;
        let store = AssetStore::from_assets(doc.assets);

        let requested = doc
            .active_composition_id
            .filter(|id| store.find(id).is_some_and(|a| a.as_composition().is_some()));
        if requested.is_none() {
            log::debug!("active composition unset or unknown; falling back to first composition");
        }
        let active_id = requested.or_else(|| store.find_first_composition().map(|a| a.id.clone()));

        self.store = store;
        self.active = None;
        self.session.reset();
        self.playback = Playback::new(
            self.config.default_duration_seconds,
            self.config.default_fps,
        );
        if let Some(id) = &active_id {
            self.open_composition(id)?;
        }
        self.reissue_loads(host);
        log::info!(
            "loaded project with {} top-level assets",
            self.store.assets().len()
        );
        Ok(())
    }

    fn reissue_loads(&self, host: &mut dyn AssetHost) {
        let mut seen: HashSet<&AssetId> = HashSet::new();
        for asset in self.store.iter() {
            let Some(comp) = asset.as_composition() else {
                continue;
            };
            for layer in comp.layers() {
                let clip = layer.animated_layer_fields.as_ref().map(|f| &f.clip_asset_id);
                for id in std::iter::once(&layer.source_asset_id).chain(clip) {
                    if !seen.insert(id) {
                        continue;
                    }
                    if let Some(target) = self.store.find(id).filter(|a| a.source().is_some()) {
                        host.request_load(target);
                    }
                }
            }
        }
    }

    /// Project document with the working copy written back.
    pub fn project_document(&mut self) -> ProjectDocument {
        self.sync_active();
        ProjectDocument::new(
            self.active_composition_id().cloned(),
            self.store.assets().to_vec(),
        )
    }

    pub fn export_project(&mut self) -> Result<String> {
        let json = self.project_document().to_json_pretty()?;
        log::info!("exported project ({} bytes)", json.len());
        Ok(json)
    }
}
