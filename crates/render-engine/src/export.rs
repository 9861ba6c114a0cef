//! Export orchestration: one export pass from request to finished file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use panframe_common::error::{PanframeError, PanframeResult};
use panframe_processing_core::smooth::smooth;
use panframe_project_model::export::{CropMode, ExportConfig};
use panframe_project_model::geometry::clamp_to_bounds;
use panframe_project_model::keyframe::KeyframeSequence;

use crate::compositor::{output_size_for, static_crop_rect, Compositor};
use crate::pipeline::{
    AbortHandle, FrameTransform, MediaPipeline, SampleTransform, TranscodePlan, VideoProcessing,
};

/// Progress callback for export rendering.
pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

impl ExportProgress {
    /// Report for a stage boundary.
    pub fn at_stage(stage: ExportStage, total_frames: u64) -> Self {
        let done = stage == ExportStage::Complete;
        Self {
            progress: if done { 1.0 } else { 0.0 },
            frames_rendered: if done { total_frames } else { 0 },
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }

    /// Rendering report for a completed `fraction` of the work.
    pub fn from_fraction(fraction: f64, total_frames: u64, elapsed_secs: f64) -> Self {
        let progress = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let eta_secs = if progress > 0.0 {
            (elapsed_secs / progress) - elapsed_secs
        } else {
            0.0
        }
        .max(0.0);

        Self {
            progress,
            frames_rendered: (progress * total_frames as f64).round() as u64,
            total_frames,
            eta_secs,
            stage: ExportStage::Rendering,
        }
    }

    /// Rendering report after `frames_rendered` of `total_frames` samples.
    pub fn from_frames(frames_rendered: u64, total_frames: u64, elapsed_secs: f64) -> Self {
        let fraction = if total_frames == 0 {
            0.0
        } else {
            frames_rendered as f64 / total_frames as f64
        };
        Self {
            frames_rendered: frames_rendered.min(total_frames),
            ..Self::from_fraction(fraction, total_frames, elapsed_secs)
        }
    }
}

/// One export pass.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Source media file.
    pub input: PathBuf,

    /// Output file path.
    pub output: PathBuf,

    /// Export configuration, immutable for the pass.
    pub config: ExportConfig,

    /// Recorded pan path, if any.
    pub sequence: Option<KeyframeSequence>,

    /// Cancels the pipeline when fired.
    pub abort: AbortHandle,
}

impl ExportRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, config: ExportConfig) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            config,
            sequence: None,
            abort: AbortHandle::new(),
        }
    }

    pub fn with_sequence(mut self, sequence: KeyframeSequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedClip {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub total_frames: u64,
    /// Crop mode actually applied (after fallbacks).
    pub crop_mode: CropMode,
    pub size_bytes: u64,
}

/// Crop mode actually used for `config` and `sequence`.
///
/// Dynamic modes need at least two keyframes; otherwise the export falls
/// back to a static crop (when a rect is available) or no crop at all.
pub fn effective_crop_mode(config: &ExportConfig, sequence: Option<&KeyframeSequence>) -> CropMode {
    let has_static_rect = static_crop_rect(config, sequence).is_some();
    match config.crop_mode {
        CropMode::None => CropMode::None,
        CropMode::Static if has_static_rect => CropMode::Static,
        CropMode::Static => CropMode::None,
        mode @ (CropMode::Spotlight | CropMode::MaxSize) => match sequence {
            Some(seq) if seq.is_dynamic() => mode,
            _ if has_static_rect => CropMode::Static,
            _ => CropMode::None,
        },
    }
}

/// Export one clip through `pipeline`.
///
/// Validation errors are returned before any pipeline work starts. When the
/// pipeline fails, is aborted, or produces an empty file, the partial output
/// is removed and a single terminal error is returned.
pub async fn export_clip(
    request: ExportRequest,
    pipeline: Arc<dyn MediaPipeline>,
    progress: Option<ProgressCallback>,
) -> PanframeResult<ExportedClip> {
    tracing::info!(
        input = %request.input.display(),
        output = %request.output.display(),
        crop_mode = request.config.crop_mode.as_str(),
        format = ?request.config.format,
        "Starting export"
    );

    let result = run_export(request, pipeline, progress.clone()).await;
    if let Err(err) = &result {
        tracing::error!(error = %err, "Export failed");
        if let Some(cb) = &progress {
            cb(ExportProgress::at_stage(ExportStage::Failed, 0));
        }
    }
    result
}

async fn run_export(
    request: ExportRequest,
    pipeline: Arc<dyn MediaPipeline>,
    progress: Option<ProgressCallback>,
) -> PanframeResult<ExportedClip> {
    let ExportRequest {
        input,
        output,
        config,
        sequence,
        abort,
    } = request;

    let pipeline_name = pipeline.name().to_string();
    if !pipeline.is_available() {
        return Err(PanframeError::unsupported(format!(
            "Media pipeline '{pipeline_name}' is not available"
        )));
    }
    if !input.exists() {
        return Err(PanframeError::FileNotFound { path: input });
    }

    let track = pipeline.probe(&input)?;
    if track.width == 0 || track.height == 0 {
        return Err(PanframeError::pipeline(
            "Source has no decodable video track",
        ));
    }
    let (start_secs, end_secs) = config
        .trim
        .resolve(track.duration_secs)
        .map_err(PanframeError::invalid_time_range)?;

    let bounds = track.bounds();
    let mut sequence = sequence;
    if let Some(seq) = sequence.as_mut() {
        let changed = seq.revalidate(bounds);
        if changed > 0 {
            tracing::warn!(
                changed,
                width = track.width,
                height = track.height,
                "Pan path clamped to source bounds"
            );
        }
    }

    let mode = effective_crop_mode(&config, sequence.as_ref());
    if mode != config.crop_mode {
        tracing::info!(
            requested = config.crop_mode.as_str(),
            effective = mode.as_str(),
            keyframes = sequence.as_ref().map_or(0, KeyframeSequence::len),
            "Crop mode fell back"
        );
    }

    if mode.is_dynamic() && config.smooth_path {
        sequence = sequence.map(|seq| smooth(&seq, config.smoothing_window));
    }

    let (output_width, output_height) = output_size_for(mode, &config, sequence.as_ref(), bounds);
    let video = match mode {
        CropMode::None => VideoProcessing::Passthrough,
        CropMode::Static => static_crop_rect(&config, sequence.as_ref())
            .map(|rect| VideoProcessing::NativeCrop(clamp_to_bounds(rect, bounds.width, bounds.height)))
            .unwrap_or(VideoProcessing::Passthrough),
        CropMode::Spotlight | CropMode::MaxSize => VideoProcessing::PerSample,
    };
    let transform = match (video, sequence) {
        (VideoProcessing::PerSample, Some(seq)) => Some(FrameTransform::new(
            seq,
            Compositor::new(&config, mode, output_width, output_height),
        )),
        _ => None,
    };

    let plan = TranscodePlan {
        input,
        output: output.clone(),
        start_secs,
        end_secs,
        source: track,
        output_width,
        output_height,
        video,
        format: config.format,
        video_bitrate_kbps: config.video_bitrate_kbps,
    };
    let total_frames = plan.total_frames();
    let duration_secs = plan.duration_secs();

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::info!(
        pipeline = %pipeline_name,
        start_secs,
        end_secs,
        width = output_width,
        height = output_height,
        frames = total_frames,
        video = ?plan.video,
        "Export plan built"
    );
    if let Some(cb) = &progress {
        cb(ExportProgress::at_stage(ExportStage::Preparing, total_frames));
    }

    let started = Instant::now();
    let task_progress = progress.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let report = |p: ExportProgress| {
            if let Some(cb) = &task_progress {
                cb(p);
            }
        };
        pipeline.transcode(
            &plan,
            transform.as_ref().map(|t| t as &dyn SampleTransform),
            &report,
            &abort,
        )
    })
    .await;

    let outcome = match joined {
        Ok(result) => result,
        Err(err) => Err(PanframeError::pipeline(format!("Export task failed: {err}"))),
    };
    if let Err(err) = outcome {
        discard_partial_output(&output);
        return Err(err);
    }

    if let Some(cb) = &progress {
        cb(ExportProgress::at_stage(ExportStage::Finalizing, total_frames));
    }

    let size_bytes = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    if size_bytes == 0 {
        discard_partial_output(&output);
        return Err(PanframeError::pipeline("Export produced an empty file"));
    }

    if let Some(cb) = &progress {
        cb(ExportProgress::at_stage(ExportStage::Complete, total_frames));
    }
    tracing::info!(
        output = %output.display(),
        size_bytes,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Export finished"
    );

    Ok(ExportedClip {
        path: output,
        duration_secs,
        width: output_width,
        height: output_height,
        total_frames,
        crop_mode: mode,
        size_bytes,
    })
}

fn discard_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial export output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove partial export output")
        }
    }
}
