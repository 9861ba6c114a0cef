//! Pan-path smoothing.
//!
//! Removes hand jitter from a recorded pan path with a centered moving
//! average over the rect parameters. The filter is not idempotent:
//! re-smoothing an already smoothed path keeps flattening it.

use panframe_project_model::geometry::Rect;
use panframe_project_model::keyframe::{Keyframe, KeyframeSequence};

/// Moving-average smoother for keyframe sequences.
#[derive(Debug, Clone, Copy)]
pub struct PathSmoother {
    window: usize,
}

impl PathSmoother {
    /// Create a smoother averaging over `window` keyframes.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Smooth `sequence`, returning a new sequence.
    ///
    /// Sequences shorter than the window (and a zero window) come back
    /// unchanged. Otherwise each keyframe's x, y, width and height become
    /// the mean over `[i - window/2, i + window/2]`; the window shrinks at
    /// the ends instead of padding. Timestamps are preserved.
    pub fn smooth(&self, sequence: &KeyframeSequence) -> KeyframeSequence {
        let keyframes = &sequence.keyframes;
        if self.window == 0 || keyframes.len() < self.window {
            return sequence.clone();
        }

        let half = self.window / 2;
        let n = keyframes.len();
        let mut smoothed = Vec::with_capacity(n);

        for (i, kf) in keyframes.iter().enumerate() {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let count = (end - start) as f64;

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            let mut sum_w = 0.0;
            let mut sum_h = 0.0;
            for other in &keyframes[start..end] {
                sum_x += other.rect.x;
                sum_y += other.rect.y;
                sum_w += other.rect.width;
                sum_h += other.rect.height;
            }

            smoothed.push(Keyframe::new(
                kf.time_secs,
                Rect::new(sum_x / count, sum_y / count, sum_w / count, sum_h / count),
            ));
        }

        tracing::debug!(
            keyframes = n,
            window = self.window,
            "Pan path smoothed"
        );

        KeyframeSequence {
            bounds: sequence.bounds,
            keyframes: smoothed,
        }
    }
}

/// Smooth `sequence` with a centered moving average of `window` keyframes.
pub fn smooth(sequence: &KeyframeSequence, window: usize) -> KeyframeSequence {
    PathSmoother::new(window).smooth(sequence)
}
