//! Frame-grid time math.
//!
//! Stored times always sit on the composition's frame grid; reads never snap.

/// Quantize `time` to the nearest multiple of `1/fps`.
/// Non-positive or non-finite frame rates leave the time untouched.
#[inline]
pub fn snap(time: f64, fps: f64) -> f64 {
    if !(fps.is_finite() && fps > 0.0) {
        return time;
    }
    (time * fps).round() / fps
}

/// Frame number nearest to `time`.
#[inline]
pub fn frame_of(time: f64, fps: f64) -> i64 {
    if !(fps.is_finite() && fps > 0.0) {
        return 0;
    }
    (time * fps).round() as i64
}

/// Time of the start of `frame`.
#[inline]
pub fn time_of(frame: i64, fps: f64) -> f64 {
    if !(fps.is_finite() && fps > 0.0) {
        return 0.0;
    }
    frame as f64 / fps
}

/// True when both times land on the same frame.
#[inline]
pub fn same_frame(a: f64, b: f64, fps: f64) -> bool {
    frame_of(a, fps) == frame_of(b, fps)
}
