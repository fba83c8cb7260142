//! Interpolation modes and easing helpers.
//!
//! Each keyframe selects how the segment leaving it is shaped: straight
//! linear, a cosine ease-in-out, or a hold that keeps the left value until
//! the next key.

pub mod functions;

use serde::{Deserialize, Serialize};

/// Interpolation applied to the segment that starts at a keyframe.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Linear,
    EaseInOut,
    Hold,
}

pub use functions::ease_factor;
