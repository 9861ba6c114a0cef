//! Per-frame crop interpolation.
//!
//! Given a pan path and an arbitrary media timestamp, produce the crop
//! rect for that instant. Position is interpolated linearly; size is held
//! from the earlier keyframe and changes only at keyframe boundaries.
//!
//! Every call is independent (a binary search over the path), so the
//! export pipeline may call it for samples in any order.

use panframe_project_model::geometry::{clamp_to_bounds, Rect};
use panframe_project_model::keyframe::KeyframeSequence;

/// Crop rect at `time_secs`, or `None` for an empty path.
///
/// Before the first keyframe the first rect is held; after the last
/// keyframe the last rect is held. The result is clamped to the path's
/// source bounds.
pub fn interpolate(sequence: &KeyframeSequence, time_secs: f64) -> Option<Rect> {
    let keyframes = &sequence.keyframes;
    let first = keyframes.first()?;
    let last = keyframes.last()?;
    let bounds = sequence.bounds;
    let clamp = |rect: Rect| clamp_to_bounds(rect, bounds.width, bounds.height);

    if time_secs.is_nan() || time_secs <= first.time_secs {
        return Some(clamp(first.rect));
    }
    if time_secs >= last.time_secs {
        return Some(clamp(last.rect));
    }

    // First keyframe strictly after `time_secs`; the range checks above
    // guarantee 1 <= idx < len.
    let idx = keyframes.partition_point(|kf| kf.time_secs <= time_secs);
    let prev = &keyframes[idx - 1];
    let next = &keyframes[idx];

    let span = next.time_secs - prev.time_secs;
    if span <= 0.0 {
        return Some(clamp(prev.rect));
    }

    let t = (time_secs - prev.time_secs) / span;
    Some(clamp(Rect::new(
        prev.rect.x + (next.rect.x - prev.rect.x) * t,
        prev.rect.y + (next.rect.y - prev.rect.y) * t,
        prev.rect.width,
        prev.rect.height,
    )))
}
