//! Pan-path keyframes.
//!
//! A keyframe sequence is the ordered list of `(time, rect)` samples
//! captured during one pan-recording session. Timestamps are media time in
//! seconds and strictly increase along the sequence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp_to_bounds, Rect, Size};

/// One timestamped crop rectangle on a pan path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Media time in seconds.
    pub time_secs: f64,
    /// Crop rectangle at this time (source pixels).
    pub rect: Rect,
}

impl Keyframe {
    pub fn new(time_secs: f64, rect: Rect) -> Self {
        Self { time_secs, rect }
    }
}

/// Ordered pan path plus the source bounds it was recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSequence {
    /// Source frame size used to clamp every rectangle.
    pub bounds: Size,
    /// Keyframes in chronological order.
    pub keyframes: Vec<Keyframe>,
}

impl KeyframeSequence {
    /// Empty sequence for a source of the given size.
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            keyframes: Vec::new(),
        }
    }

    /// Build a sequence from raw keyframes.
    ///
    /// Rectangles are clamped to `bounds`; keyframes whose timestamp does not
    /// advance past the previous one are dropped so the ordering invariant
    /// holds for hand-edited or imported paths.
    pub fn from_keyframes(bounds: Size, keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut sequence = Self::new(bounds);
        for kf in keyframes {
            sequence.push(kf.time_secs, kf.rect);
        }
        sequence
    }

    /// Append a keyframe if `time_secs` is strictly after the last one.
    ///
    /// Returns whether the keyframe was stored.
    pub fn push(&mut self, time_secs: f64, rect: Rect) -> bool {
        if !time_secs.is_finite() {
            return false;
        }
        if let Some(last) = self.keyframes.last() {
            if time_secs <= last.time_secs {
                return false;
            }
        }
        let rect = clamp_to_bounds(rect, self.bounds.width, self.bounds.height);
        self.keyframes.push(Keyframe::new(time_secs, rect));
        true
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.keyframes.first()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Keyframe> {
        self.keyframes.last_mut()
    }

    /// Whether the path varies over time (needs at least two keyframes).
    pub fn is_dynamic(&self) -> bool {
        self.keyframes.len() >= 2
    }

    /// Time span covered by the path, `None` when empty.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.first()?.time_secs, self.last()?.time_secs))
    }

    /// Largest width and largest height over all keyframes.
    pub fn max_size(&self) -> Option<Size> {
        if self.keyframes.is_empty() {
            return None;
        }
        let (w, h) = self
            .keyframes
            .iter()
            .fold((0.0f64, 0.0f64), |(w, h), kf| {
                (w.max(kf.rect.width), h.max(kf.rect.height))
            });
        Some(Size::new(w, h))
    }

    /// Re-clamp every rectangle against `bounds` and adopt them.
    ///
    /// Returns how many rectangles changed. A path recorded against one
    /// media file stays valid when exported against another of a
    /// different size.
    pub fn revalidate(&mut self, bounds: Size) -> usize {
        self.bounds = bounds;
        let mut changed = 0;
        for kf in &mut self.keyframes {
            let clamped = clamp_to_bounds(kf.rect, bounds.width, bounds.height);
            if clamped != kf.rect {
                kf.rect = clamped;
                changed += 1;
            }
        }
        changed
    }

    /// Read a sequence from a JSON file.
    pub fn load(path: &Path) -> Result<Self, KeyframeFileError> {
        let content = std::fs::read_to_string(path)?;
        let raw: KeyframeSequence = serde_json::from_str(&content)?;
        Ok(Self::from_keyframes(raw.bounds, raw.keyframes))
    }

    /// Write the sequence as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), KeyframeFileError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Errors reading or writing keyframe files.
#[derive(Debug, thiserror::Error)]
pub enum KeyframeFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid keyframe JSON: {0}")]
    Json(#[from] serde_json::Error),
}
