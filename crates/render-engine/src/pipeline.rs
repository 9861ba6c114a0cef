//! Media pipeline contract.
//!
//! The pipeline owns demux, decode and encode. The export orchestrator hands
//! it a [`TranscodePlan`] and, for dynamic crop modes, a [`SampleTransform`]
//! that is invoked once per decoded video sample.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;

use panframe_common::error::PanframeResult;
use panframe_common::timecode::frame_pts;
use panframe_processing_core::interpolate::interpolate;
use panframe_project_model::export::ExportFormat;
use panframe_project_model::geometry::{Rect, Size};
use panframe_project_model::keyframe::KeyframeSequence;

use crate::compositor::Compositor;
use crate::export::ExportProgress;

/// Fallback frame rate when the container does not report one.
pub const DEFAULT_FPS: f64 = 30.0;

/// Metadata of the primary video track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Coded width in pixels.
    pub width: u32,
    /// Coded height in pixels.
    pub height: u32,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Average frame rate.
    pub fps: f64,
    /// Whether an audio stream is present.
    pub has_audio: bool,
}

impl TrackInfo {
    /// Source bounds for clamping crop rects.
    pub fn bounds(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// How video samples are produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoProcessing {
    /// Re-encode the full frame, scaled to the output size.
    Passthrough,
    /// Fixed crop handled natively by the pipeline.
    NativeCrop(Rect),
    /// Every decoded sample goes through the sample transform.
    PerSample,
}

/// Everything the pipeline needs for one transcode.
#[derive(Debug, Clone)]
pub struct TranscodePlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start_secs: f64,
    pub end_secs: f64,
    pub source: TrackInfo,
    pub output_width: u32,
    pub output_height: u32,
    pub video: VideoProcessing,
    pub format: ExportFormat,
    pub video_bitrate_kbps: u32,
}

impl TranscodePlan {
    pub fn duration_secs(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }

    pub fn fps(&self) -> f64 {
        if self.source.fps.is_finite() && self.source.fps > 0.0 {
            self.source.fps
        } else {
            DEFAULT_FPS
        }
    }

    /// Number of output frames the plan should produce.
    pub fn total_frames(&self) -> u64 {
        (self.duration_secs() * self.fps()).ceil() as u64
    }

    /// Source presentation timestamp of output sample `index`.
    pub fn sample_time(&self, index: u64) -> f64 {
        frame_pts(self.start_secs, index, self.fps())
    }
}

/// Per-sample frame transform invoked by the pipeline.
///
/// Implementations must not depend on call order.
pub trait SampleTransform: Send + Sync {
    /// Transform `frame` decoded at source timestamp `timestamp_secs`.
    fn transform<'a>(&self, frame: &'a RgbaImage, timestamp_secs: f64) -> Cow<'a, RgbaImage>;
}

/// Interpolates the pan path and composites each sample.
#[derive(Debug, Clone)]
pub struct FrameTransform {
    sequence: KeyframeSequence,
    compositor: Compositor,
}

impl FrameTransform {
    pub fn new(sequence: KeyframeSequence, compositor: Compositor) -> Self {
        Self {
            sequence,
            compositor,
        }
    }
}

impl SampleTransform for FrameTransform {
    fn transform<'a>(&self, frame: &'a RgbaImage, timestamp_secs: f64) -> Cow<'a, RgbaImage> {
        let rect = interpolate(&self.sequence, timestamp_secs);
        self.compositor.composite(frame, rect)
    }
}

/// Shared cancellation flag for a running transcode.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The pipeline stops at the next sample.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Trait for media pipelines (ffmpeg, in-memory test doubles, ...).
pub trait MediaPipeline: Send + Sync {
    /// Pipeline name for logs.
    fn name(&self) -> &str;

    /// Check if this pipeline can run on the system.
    fn is_available(&self) -> bool;

    /// Read track metadata from `path`.
    fn probe(&self, path: &Path) -> PanframeResult<TrackInfo>;

    /// Execute `plan`, writing `plan.output`.
    ///
    /// `transform` is supplied exactly when `plan.video` is
    /// [`VideoProcessing::PerSample`]. Progress reports carry a fraction in
    /// `[0, 1]`. Returns [`PanframeError::Aborted`] once `abort` fires.
    ///
    /// [`PanframeError::Aborted`]: panframe_common::error::PanframeError::Aborted
    fn transcode(
        &self,
        plan: &TranscodePlan,
        transform: Option<&dyn SampleTransform>,
        progress: &dyn Fn(ExportProgress),
        abort: &AbortHandle,
    ) -> PanframeResult<()>;
}

/// Bring a transformed frame to the encoder canvas size.
///
/// Frames that are at least as large as the canvas are cropped from the
/// top-left (even-flooring drops at most one row/column); anything else is
/// rescaled.
pub fn conform_frame(frame: Cow<'_, RgbaImage>, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    let (fw, fh) = frame.dimensions();
    if (fw, fh) == (width, height) {
        return frame;
    }
    if fw >= width && fh >= height && fw - width <= 1 && fh - height <= 1 {
        return Cow::Owned(image::imageops::crop_imm(&*frame, 0, 0, width, height).to_image());
    }
    Cow::Owned(image::imageops::resize(
        &*frame,
        width,
        height,
        image::imageops::FilterType::Triangle,
    ))
}
