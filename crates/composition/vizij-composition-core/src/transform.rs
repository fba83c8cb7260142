//! World-space transform composition.
//!
//! A layer's local transform is translate(position) * rotate(rotation) * scale(scale/100),
//! expressed in its parent's space. The parent's world matrix is applied first.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

use crate::layer::LocalTransform;
use crate::value::Vec2;

/// Final origin/rotation/scale of a layer after walking its parent chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransform {
    pub origin: Vec2,
    pub rotation_deg: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Full affine for renderers; maps layer-local points into composition space.
    pub matrix: DAffine2,
}

impl ResolvedTransform {
    /// The composition's own coordinate space.
    pub const IDENTITY: ResolvedTransform = ResolvedTransform {
        origin: Vec2::ZERO,
        rotation_deg: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        matrix: DAffine2::IDENTITY,
    };

    /// Apply `local` inside this transform's space.
    pub fn compose(&self, local: &LocalTransform) -> ResolvedTransform {
        let s = local.scale / 100.0;
        let local_matrix = DAffine2::from_scale_angle_translation(
            DVec2::splat(s),
            local.rotation.to_radians(),
            local.position.into(),
        );
        let matrix = self.matrix * local_matrix;
        ResolvedTransform {
            origin: matrix.translation.into(),
            rotation_deg: self.rotation_deg + local.rotation,
            scale_x: self.scale_x * s,
            scale_y: self.scale_y * s,
            matrix,
        }
    }

    /// Map a composition-space point into layer-local space.
    /// `None` when the transform is degenerate (zero scale).
    pub fn to_local(&self, point: Vec2) -> Option<Vec2> {
        if self.matrix.matrix2.determinant().abs() < f64::EPSILON {
            return None;
        }
        Some(self.matrix.inverse().transform_point2(point.into()).into())
    }
}

impl Default for ResolvedTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
