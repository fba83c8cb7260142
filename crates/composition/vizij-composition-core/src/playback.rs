//! Playback controller and scene rendering.
//!
//! The clock loops over `[0, duration]`: once `tick` pushes the time past the
//! duration it wraps to 0. Pausing keeps the current time; stopping rewinds.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::AssetKind;
use crate::composition::Composition;
use crate::config::EngineConfig;
use crate::error::{CompositionError, Result};
use crate::host::AssetHost;
use crate::layer::Layer;
use crate::snapshot::{LayerContent, LayerSnapshot, PlaceholderReason, SceneSnapshot};
use crate::store::AssetStore;
use crate::time::snap;
use crate::value::Vec2;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Discrete signals emitted by the controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    Started,
    Paused,
    Stopped,
    /// The clock passed the end and wrapped to 0.
    Looped,
    TimeChanged { old_time: f64, new_time: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    pub state: PlaybackState,
    pub current_time: f64,
    duration: f64,
    fps: f64,
}

impl Playback {
    pub fn new(duration: f64, fps: f64) -> Self {
        Self {
            state: PlaybackState::Stopped,
            current_time: 0.0,
            duration: duration.max(0.0),
            fps,
        }
    }

    pub fn for_composition(comp: &Composition) -> Self {
        Self::new(comp.duration, comp.fps)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn play(&mut self) -> Option<PlaybackEvent> {
        if self.is_playing() {
            return None;
        }
        self.state = PlaybackState::Playing;
        Some(PlaybackEvent::Started)
    }

    /// Stop advancing but keep the current time.
    pub fn pause(&mut self) -> Option<PlaybackEvent> {
        if !self.is_playing() {
            return None;
        }
        self.state = PlaybackState::Stopped;
        Some(PlaybackEvent::Paused)
    }

    /// Stop and rewind to 0.
    pub fn stop(&mut self) -> PlaybackEvent {
        self.state = PlaybackState::Stopped;
        self.current_time = 0.0;
        PlaybackEvent::Stopped
    }

    pub fn toggle(&mut self) -> Option<PlaybackEvent> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Advance the clock by `dt` seconds while playing. Rewinding stops at 0.
    pub fn tick(&mut self, dt: f64) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if !self.is_playing() || !dt.is_finite() {
            return events;
        }
        let old_time = self.current_time;
        self.current_time = (self.current_time + dt).max(0.0);
        if self.current_time > self.duration {
            self.current_time = 0.0;
            events.push(PlaybackEvent::Looped);
        }
        if self.current_time != old_time {
            events.push(PlaybackEvent::TimeChanged {
                old_time,
                new_time: self.current_time,
            });
        }
        events
    }

    /// Jump to `time`, clamped into `[0, duration]` and snapped to the frame grid.
    pub fn seek(&mut self, time: f64) -> Result<f64> {
        if !time.is_finite() {
            return Err(CompositionError::InvalidTime(time));
        }
        self.current_time = snap(time.clamp(0.0, self.duration), self.fps).min(self.duration);
        Ok(self.current_time)
    }

    /// Adopt a composition's timing after it changed, keeping the time in range.
    pub fn retime(&mut self, duration: f64, fps: f64) {
        self.duration = duration.max(0.0);
        self.fps = fps;
        self.current_time = self.current_time.clamp(0.0, self.duration);
    }
}

/// Resolves a composition into a [`SceneSnapshot`] against the asset store and host.
pub struct SceneRenderer<'a> {
    pub store: &'a AssetStore,
    pub host: &'a dyn AssetHost,
    pub config: &'a EngineConfig,
}

impl<'a> SceneRenderer<'a> {
    pub fn new(store: &'a AssetStore, host: &'a dyn AssetHost, config: &'a EngineConfig) -> Self {
        Self {
            store,
            host,
            config,
        }
    }

    pub fn render(&self, comp: &Composition, time: f64) -> SceneSnapshot {
        self.render_at_depth(comp, time, 0)
    }

    fn render_at_depth(&self, comp: &Composition, time: f64, depth: usize) -> SceneSnapshot {
        let layers = comp
            .draw_order(time)
            .filter_map(|layer| self.render_layer(comp, layer, time, depth))
            .collect();
        SceneSnapshot {
            time,
            width: comp.width,
            height: comp.height,
            layers,
        }
    }

    fn placeholder(&self, reason: PlaceholderReason) -> (LayerContent, Vec2) {
        (LayerContent::Placeholder { reason }, self.config.placeholder_size)
    }

    fn render_layer(
        &self,
        comp: &Composition,
        layer: &Layer,
        time: f64,
        depth: usize,
    ) -> Option<LayerSnapshot> {
        let (content, size) = match &layer.animated_layer_fields {
            Some(anim) => self.clip_content(layer, anim, time)?,
            None => self.source_content(layer, time, depth),
        };
        let properties: IndexMap<_, _> = layer
            .tracks
            .iter()
            .map(|(name, track)| (name.clone(), track.evaluate(time)))
            .collect();
        Some(LayerSnapshot {
            layer_id: layer.id.clone(),
            name: layer.name.clone(),
            transform: comp.resolve_transform(&layer.id, time).unwrap_or_default(),
            opacity: layer.opacity(time),
            properties,
            content,
            size,
        })
    }

    /// `None` when the clip has not started yet or the motion has no frames.
    fn clip_content(
        &self,
        layer: &Layer,
        anim: &crate::layer::AnimatedLayerFields,
        time: f64,
    ) -> Option<(LayerContent, Vec2)> {
        let Some(asset) = self.store.find(&anim.clip_asset_id) else {
            log::debug!("layer {} references missing clip {}", layer.id, anim.clip_asset_id);
            return Some(self.placeholder(PlaceholderReason::MissingAsset));
        };
        let Some(motions) = asset.motions() else {
            return Some(self.placeholder(PlaceholderReason::NotDrawable));
        };
        if !self.host.is_ready(&asset.id) {
            return Some(self.placeholder(PlaceholderReason::Loading));
        }
        let local = time - anim.start_time;
        if local < 0.0 {
            return None;
        }
        let motion = layer.motion(time).unwrap_or_default();
        let Some(clip) = motions.get(&motion) else {
            return Some(self.placeholder(PlaceholderReason::UnknownMotion));
        };
        let frame_index = clip.frame_index(local, anim.looping)?;
        let frame = clip.frames[frame_index];
        Some((
            LayerContent::ClipFrame {
                asset: asset.id.clone(),
                motion,
                frame_index,
                frame,
            },
            Vec2::new(frame.w, frame.h),
        ))
    }

    fn source_content(&self, layer: &Layer, time: f64, depth: usize) -> (LayerContent, Vec2) {
        let Some(asset) = self.store.find(&layer.source_asset_id) else {
            log::debug!(
                "layer {} references missing asset {}; drawing placeholder",
                layer.id,
                layer.source_asset_id
            );
            return self.placeholder(PlaceholderReason::MissingAsset);
        };
        match &asset.kind {
            AssetKind::Image { size, .. } => {
                if !self.host.is_ready(&asset.id) {
                    return self.placeholder(PlaceholderReason::Loading);
                }
                let size = self
                    .host
                    .content_size(&asset.id)
                    .or(*size)
                    .unwrap_or(self.config.placeholder_size);
                (
                    LayerContent::Image {
                        asset: asset.id.clone(),
                    },
                    size,
                )
            }
            AssetKind::Composition(nested) => {
                if depth + 1 > self.config.max_nesting_depth {
                    log::warn!("nested composition {} exceeds depth limit", asset.id);
                    return self.placeholder(PlaceholderReason::NotDrawable);
                }
                let scene = self.render_at_depth(nested, time - layer.in_point, depth + 1);
                (
                    LayerContent::Composition {
                        asset: asset.id.clone(),
                        scene: Box::new(scene),
                    },
                    Vec2::new(nested.width, nested.height),
                )
            }
            AssetKind::AnimationClip { .. } | AssetKind::Folder { .. } => {
                self.placeholder(PlaceholderReason::NotDrawable)
            }
        }
    }
}
