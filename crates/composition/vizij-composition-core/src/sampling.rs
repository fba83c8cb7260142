//! Track sampling.
//!
//! Model:
//! - Keys are sorted ascending by time (seconds, composition time).
//! - Before the first key and after the last key the boundary value is held.
//! - Inside a segment [k1, k2) the fraction u = (t - k1.time) / (k2.time - k1.time)
//!   is reshaped by k1's interpolation mode, then values blend component-wise.
//! - Text values never blend; they hold k1 until k2 is reached.
//! - NaN and -inf read the first key, +inf reads the last.
//!
//! API:
//! - sample_track(&Track, t) where t is composition time in seconds.

use crate::interp::functions::{blend_value, ease_factor};
use crate::track::{Keyframe, Track};
use crate::value::{KeyValue, ValueType};

/// Find the segment [i, i+1] with keys[i].time <= t < keys[i+1].time and the raw fraction.
/// Returns None when `t` lies on or outside the boundary keys.
fn find_segment(keys: &[Keyframe], t: f64) -> Option<(usize, f64)> {
    let n = keys.len();
    if n < 2 || t <= keys[0].time || t >= keys[n - 1].time {
        return None;
    }
    // First key strictly after t; its predecessor opens the segment.
    let hi = keys.partition_point(|k| k.time <= t);
    if hi == 0 || hi >= n {
        return None;
    }
    let lo = hi - 1;
    let t0 = keys[lo].time;
    let t1 = keys[hi].time;
    let denom = t1 - t0;
    if denom <= 0.0 {
        return Some((lo, 0.0));
    }
    Some((lo, ((t - t0) / denom).clamp(0.0, 1.0)))
}

/// Sample a track at composition time `t`.
pub fn sample_track(track: &Track, t: f64) -> KeyValue {
    let keys = &track.keys;
    let n = keys.len();
    match n {
        0 => track.value_type.zero(),
        1 => keys[0].value.clone(),
        _ if !t.is_finite() => {
            if t == f64::INFINITY {
                keys[n - 1].value.clone()
            } else {
                keys[0].value.clone()
            }
        }
        _ => {
            if t <= keys[0].time {
                return keys[0].value.clone();
            }
            if t >= keys[n - 1].time {
                return keys[n - 1].value.clone();
            }
            let Some((i, u)) = find_segment(keys, t) else {
                return keys[n - 1].value.clone();
            };
            let left = &keys[i];
            let right = &keys[i + 1];
            if track.value_type == ValueType::DiscreteString {
                return left.value.clone();
            }
            blend_value(&left.value, &right.value, ease_factor(left.interpolation, u))
        }
    }
}
