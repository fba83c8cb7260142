//! Vizij Composition Core (engine-agnostic)
//!
//! Keyframe-driven 2D scene compositing: a tree of assets, compositions made of
//! stacked layers, per-property keyframe tracks, a frame-snapped time engine,
//! a looping playback controller and a pointer-driven edit session.
//!
//! Hosts (editor UI, runtime player) drive everything through [`EngineContext`]
//! and draw the [`SceneSnapshot`]s it produces. Loading pixels is delegated to
//! an [`AssetHost`].

pub mod asset;
pub mod composition;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod ids;
pub mod interp;
pub mod layer;
pub mod playback;
pub mod project;
pub mod sampling;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod time;
pub mod track;
pub mod transform;
pub mod value;

// Re-exports for consumers (adapters)
pub use asset::{Asset, AssetKind, FrameRect, MotionClip};
pub use composition::Composition;
pub use config::{EngineConfig, TimelineGeometry};
pub use context::{EditCommand, EngineContext, TickReport};
pub use error::{CompositionError, Result};
pub use host::{AlwaysReady, AssetHost, LoadTracker};
pub use ids::{AssetId, KeyframeId, LayerId};
pub use interp::{ease_factor, Interpolation};
pub use layer::{props, AnimatedLayerFields, Layer, LocalTransform};
pub use playback::{Playback, PlaybackEvent, PlaybackState, SceneRenderer};
pub use project::ProjectDocument;
pub use sampling::sample_track;
pub use session::{parse_inline_value, DragTarget, EditMode, EditSession, Selection};
pub use snapshot::{LayerContent, LayerSnapshot, PlaceholderReason, SceneSnapshot};
pub use store::AssetStore;
pub use time::{frame_of, same_frame, snap, time_of};
pub use track::{Constraints, Keyframe, Track};
pub use transform::ResolvedTransform;
pub use value::{KeyValue, ValueType, Vec2};
