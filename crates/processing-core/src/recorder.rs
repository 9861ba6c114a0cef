//! Pan-path recording.
//!
//! Captures a time-ordered sequence of crop rectangles while the user
//! drags (or steers a size-locked region) during playback.
//!
//! ```text
//! Idle ──start──▶ Recording ──lock_size──▶ LockedRecording
//!   ▲                 │   ◀──unlock_size──       │
//!   └──────stop/abandon───────────────────────────┘
//! ```

use panframe_common::error::{PanframeError, PanframeResult};
use panframe_project_model::geometry::{clamp_to_bounds, Rect, Size, MIN_RECT_DIMENSION};
use panframe_project_model::keyframe::KeyframeSequence;

/// Scale applied to the locked rect per wheel notch when zooming in.
pub const WHEEL_ZOOM_IN_FACTOR: f64 = 0.95;

/// Scale applied to the locked rect per wheel notch when zooming out.
pub const WHEEL_ZOOM_OUT_FACTOR: f64 = 1.05;

/// Observable recorder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No active sequence.
    Idle,
    /// Samples carry a full rectangle.
    Recording,
    /// Samples only move a fixed-size rectangle.
    LockedRecording,
}

/// Mouse wheel direction while steering a locked rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Shrink the rect (the output appears zoomed in).
    In,
    /// Grow the rect.
    Out,
}

impl ZoomDirection {
    fn factor(self) -> f64 {
        match self {
            ZoomDirection::In => WHEEL_ZOOM_IN_FACTOR,
            ZoomDirection::Out => WHEEL_ZOOM_OUT_FACTOR,
        }
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Recording { sequence: KeyframeSequence },
    Locked { sequence: KeyframeSequence, size: Size },
}

/// Keyframe recorder for one editing session.
#[derive(Debug)]
pub struct KeyframeRecorder {
    bounds: Size,
    phase: Phase,
}

impl KeyframeRecorder {
    /// Create an idle recorder for a source of the given size.
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            phase: Phase::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> RecorderState {
        match self.phase {
            Phase::Idle => RecorderState::Idle,
            Phase::Recording { .. } => RecorderState::Recording,
            Phase::Locked { .. } => RecorderState::LockedRecording,
        }
    }

    pub fn is_recording(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Source bounds used for clamping.
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Change the source bounds. Only allowed while idle.
    pub fn set_bounds(&mut self, bounds: Size) -> PanframeResult<()> {
        if self.is_recording() {
            return Err(PanframeError::recording(
                "Cannot change media bounds while recording",
            ));
        }
        self.bounds = bounds;
        Ok(())
    }

    /// The in-progress sequence, if recording.
    pub fn sequence(&self) -> Option<&KeyframeSequence> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Recording { sequence } | Phase::Locked { sequence, .. } => Some(sequence),
        }
    }

    /// Rectangle of the most recent keyframe, if recording.
    pub fn last_rect(&self) -> Option<Rect> {
        self.sequence()?.last().map(|kf| kf.rect)
    }

    /// Begin a new pan path at `time_secs` with `initial_rect`.
    pub fn start(&mut self, initial_rect: Rect, time_secs: f64) -> PanframeResult<()> {
        if self.is_recording() {
            return Err(PanframeError::recording("Recording already in progress"));
        }
        if !time_secs.is_finite() {
            return Err(PanframeError::recording(
                "Recording start time must be finite",
            ));
        }

        let mut sequence = KeyframeSequence::new(self.bounds);
        sequence.push(time_secs, initial_rect);
        tracing::debug!(
            time_secs,
            x = initial_rect.x,
            y = initial_rect.y,
            width = initial_rect.width,
            height = initial_rect.height,
            "Pan recording started"
        );
        self.phase = Phase::Recording { sequence };
        Ok(())
    }

    /// Append a sample if `time_secs` is strictly after the last keyframe.
    ///
    /// Samples that do not advance time (replays after a seek or a pause)
    /// are dropped silently. While size-locked, only the rect's center is
    /// used and the locked size is kept. Returns whether a keyframe was added.
    pub fn record_sample(&mut self, time_secs: f64, rect: Rect) -> bool {
        match &mut self.phase {
            Phase::Idle => false,
            Phase::Recording { sequence } => sequence.push(time_secs, rect),
            Phase::Locked { sequence, size } => {
                let (cx, cy) = rect.center();
                let locked = Rect::centered_at(cx, cy, size.width, size.height);
                sequence.push(time_secs, locked)
            }
        }
    }

    /// Size-locked sample: recentre the locked rect under the pointer.
    ///
    /// Ignored unless the size is locked.
    pub fn record_pointer(&mut self, time_secs: f64, px: f64, py: f64) -> bool {
        match &mut self.phase {
            Phase::Locked { sequence, size } => {
                let rect = Rect::centered_at(px, py, size.width, size.height);
                sequence.push(time_secs, rect)
            }
            _ => false,
        }
    }

    /// Freeze the current rect size; later samples only move it.
    pub fn lock_size(&mut self) -> PanframeResult<()> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Idle => Err(PanframeError::recording(
                "Cannot lock size while not recording",
            )),
            Phase::Recording { sequence } => {
                let size = sequence
                    .last()
                    .map(|kf| kf.rect.size())
                    .unwrap_or(self.bounds);
                tracing::debug!(width = size.width, height = size.height, "Pan size locked");
                self.phase = Phase::Locked { sequence, size };
                Ok(())
            }
            locked @ Phase::Locked { .. } => {
                self.phase = locked;
                Ok(())
            }
        }
    }

    /// Release a size lock. No-op unless locked.
    pub fn unlock_size(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Locked { sequence, .. } => Phase::Recording { sequence },
            other => other,
        };
    }

    /// The locked size, when locked.
    pub fn locked_size(&self) -> Option<Size> {
        match &self.phase {
            Phase::Locked { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// Scale the last keyframe's rect around the cursor.
    ///
    /// Each notch multiplies the size by 0.95 (in) or 1.05 (out); the point
    /// under the cursor keeps its relative position inside the rect. The
    /// result becomes the new locked size. Only available while locked.
    pub fn wheel_zoom(
        &mut self,
        direction: ZoomDirection,
        notches: u32,
        px: f64,
        py: f64,
    ) -> Option<Rect> {
        let bounds = self.bounds;
        let Phase::Locked { sequence, size } = &mut self.phase else {
            return None;
        };
        let last = sequence.last_mut()?;
        let rect = last.rect;

        let factor = direction.factor().powi(notches.max(1) as i32);
        let min_factor = (MIN_RECT_DIMENSION / rect.width.max(f64::EPSILON))
            .max(MIN_RECT_DIMENSION / rect.height.max(f64::EPSILON));
        let factor = factor.max(min_factor);

        let scaled = Rect::new(
            px - (px - rect.x) * factor,
            py - (py - rect.y) * factor,
            rect.width * factor,
            rect.height * factor,
        );
        let clamped = clamp_to_bounds(scaled, bounds.width, bounds.height);

        last.rect = clamped;
        *size = clamped.size();
        tracing::trace!(
            factor,
            width = clamped.width,
            height = clamped.height,
            "Wheel zoom applied"
        );
        Some(clamped)
    }

    /// Finish recording and hand back the frozen sequence.
    pub fn stop(&mut self) -> Option<KeyframeSequence> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Idle => None,
            Phase::Recording { sequence } | Phase::Locked { sequence, .. } => {
                tracing::debug!(
                    keyframes = sequence.len(),
                    dynamic = sequence.is_dynamic(),
                    "Pan recording stopped"
                );
                Some(sequence)
            }
        }
    }

    /// Drop the in-progress sequence without producing a path.
    pub fn abandon(&mut self) {
        if let Phase::Recording { sequence } | Phase::Locked { sequence, .. } = &self.phase {
            tracing::debug!(keyframes = sequence.len(), "Pan recording abandoned");
        }
        self.phase = Phase::Idle;
    }
}
