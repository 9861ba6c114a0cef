//! Editing session: the context object that owns everything one open media
//! file needs (recorder, pointer editor, stored pan path, playlist).
//!
//! # Session Lifecycle
//!
//! ```text
//! open ──▶ editing ──start_recording──▶ recording ──stop_recording──▶ editing
//!             │                              │
//!             │                              └──abandon_recording──▶ editing
//!             └──export──▶ playlist entry
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use panframe_common::config::{AppConfig, ExportDefaults};
use panframe_common::error::{PanframeError, PanframeResult};
use panframe_common::timecode::{export_stamp, now_rfc3339};
use panframe_processing_core::interaction::PointerInteraction;
use panframe_processing_core::interpolate::interpolate;
use panframe_processing_core::recorder::{KeyframeRecorder, ZoomDirection};
use panframe_project_model::export::{CropMode, ExportConfig, ExportFormat, TrimRange};
use panframe_project_model::geometry::{Rect, Size};
use panframe_project_model::keyframe::KeyframeSequence;
use panframe_project_model::playlist::{Playlist, PlaylistEntry};

use crate::export::{export_clip, ExportRequest, ProgressCallback};
use crate::pipeline::{AbortHandle, MediaPipeline, TrackInfo};

/// Build an export configuration from the configured defaults.
pub fn export_config_from_defaults(
    defaults: &ExportDefaults,
    crop_mode: CropMode,
) -> PanframeResult<ExportConfig> {
    let format: ExportFormat = defaults.format.parse().map_err(PanframeError::config)?;
    Ok(ExportConfig {
        crop_mode,
        scale_with_aspect_ratio: defaults.scale_with_aspect_ratio,
        use_blurred_background: defaults.use_blurred_background,
        blur_radius_px: defaults.blur_radius_px,
        smooth_path: defaults.smooth_path,
        smoothing_window: defaults.smoothing_window,
        trim: TrimRange::FULL,
        static_rect: None,
        locked_size: None,
        format,
        video_bitrate_kbps: defaults.video_bitrate_kbps,
    })
}

/// One open media file and its editing state.
#[derive(Debug)]
pub struct EditSession {
    input: PathBuf,
    track: TrackInfo,
    recorder: KeyframeRecorder,
    pointer: PointerInteraction,
    pan_path: Option<KeyframeSequence>,
    locked_size: Option<Size>,
    defaults: ExportDefaults,
    output_dir: PathBuf,
    playlist: Playlist,
}

impl EditSession {
    /// Open `input`, probing it through `pipeline`.
    pub fn open(
        input: impl Into<PathBuf>,
        pipeline: &dyn MediaPipeline,
        config: &AppConfig,
    ) -> PanframeResult<Self> {
        let input = input.into();
        if !input.exists() {
            return Err(PanframeError::FileNotFound { path: input });
        }
        let track = pipeline.probe(&input)?;
        Ok(Self::new(input, track, config))
    }

    /// Session over already probed media.
    pub fn new(input: impl Into<PathBuf>, track: TrackInfo, config: &AppConfig) -> Self {
        let input = input.into();
        let bounds = track.bounds();
        tracing::info!(
            input = %input.display(),
            width = track.width,
            height = track.height,
            duration_secs = track.duration_secs,
            "Editing session opened"
        );
        Self {
            input,
            track,
            recorder: KeyframeRecorder::new(bounds),
            pointer: PointerInteraction::new(bounds, config.editor.handle_radius_px),
            pan_path: None,
            locked_size: None,
            defaults: config.export.clone(),
            output_dir: config.output_dir.clone(),
            playlist: Playlist::new(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    pub fn bounds(&self) -> Size {
        self.track.bounds()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = dir.into();
    }

    pub fn pointer(&self) -> &PointerInteraction {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerInteraction {
        &mut self.pointer
    }

    pub fn recorder(&self) -> &KeyframeRecorder {
        &self.recorder
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Begin recording a pan path at `time_secs`.
    pub fn start_recording(&mut self, rect: Rect, time_secs: f64) -> PanframeResult<()> {
        self.recorder.start(rect, time_secs)?;
        self.pointer.set_rect(Some(rect));
        Ok(())
    }

    pub fn record_sample(&mut self, time_secs: f64, rect: Rect) -> bool {
        let added = self.recorder.record_sample(time_secs, rect);
        if added {
            self.pointer.set_rect(self.recorder.last_rect());
        }
        added
    }

    pub fn record_pointer(&mut self, time_secs: f64, px: f64, py: f64) -> bool {
        let added = self.recorder.record_pointer(time_secs, px, py);
        if added {
            self.pointer.set_rect(self.recorder.last_rect());
        }
        added
    }

    pub fn lock_size(&mut self) -> PanframeResult<()> {
        self.recorder.lock_size()
    }

    pub fn unlock_size(&mut self) {
        self.recorder.unlock_size();
    }

    pub fn wheel_zoom(&mut self, direction: ZoomDirection, notches: u32, px: f64, py: f64) -> Option<Rect> {
        let rect = self.recorder.wheel_zoom(direction, notches, px, py)?;
        self.pointer.set_rect(Some(rect));
        Some(rect)
    }

    /// Stop recording and keep the path for export.
    pub fn stop_recording(&mut self) -> Option<&KeyframeSequence> {
        self.locked_size = self.recorder.locked_size();
        let sequence = self.recorder.stop()?;
        self.pan_path = Some(sequence);
        self.pan_path.as_ref()
    }

    /// Discard an in-progress recording; the stored path is kept.
    pub fn abandon_recording(&mut self) {
        self.recorder.abandon();
    }

    pub fn pan_path(&self) -> Option<&KeyframeSequence> {
        self.pan_path.as_ref()
    }

    /// Replace the stored path (e.g. one loaded from disk).
    pub fn set_pan_path(&mut self, sequence: Option<KeyframeSequence>) {
        self.pan_path = sequence.map(|mut seq| {
            seq.revalidate(self.track.bounds());
            seq
        });
        self.locked_size = None;
    }

    /// Crop rect to preview at `time_secs`: the pan path, else the editor rect.
    pub fn preview_rect(&self, time_secs: f64) -> Option<Rect> {
        self.pan_path
            .as_ref()
            .and_then(|seq| interpolate(seq, time_secs))
            .or_else(|| self.pointer.rect())
    }

    /// Export configuration for `crop_mode` from the session defaults.
    ///
    /// The editor rect becomes the static crop; a size locked during the last
    /// recording becomes the max-size canvas.
    pub fn export_config(&self, crop_mode: CropMode) -> PanframeResult<ExportConfig> {
        let mut config = export_config_from_defaults(&self.defaults, crop_mode)?;
        config.static_rect = self.pointer.rect();
        config.locked_size = self.locked_size;
        Ok(config)
    }

    /// Export the current media with `config` and append the result to the
    /// playlist. Refused while a recording is active. Firing `abort` stops
    /// the pipeline and discards the partial file.
    pub async fn export(
        &mut self,
        config: ExportConfig,
        pipeline: Arc<dyn MediaPipeline>,
        progress: Option<ProgressCallback>,
        abort: AbortHandle,
    ) -> PanframeResult<PlaylistEntry> {
        if self.recorder.is_recording() {
            return Err(PanframeError::session(
                "Stop recording before starting an export",
            ));
        }

        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());
        let name = self
            .playlist
            .unique_name(&format!("{stem}-{}", export_stamp()), config.format.extension());
        let output = self.output_dir.join(&name);

        let mut request = ExportRequest::new(&self.input, &output, config).with_abort(abort);
        if let Some(seq) = &self.pan_path {
            request = request.with_sequence(seq.clone());
        }

        let clip = export_clip(request, pipeline, progress).await?;

        let entry = PlaylistEntry {
            name,
            path: clip.path,
            duration_secs: clip.duration_secs,
            width: clip.width,
            height: clip.height,
            created_at: now_rfc3339(),
        };
        tracing::info!(
            name = %entry.name,
            duration_secs = entry.duration_secs,
            playlist_len = self.playlist.len() + 1,
            "Clip added to playlist"
        );
        self.playlist.push(entry.clone());
        Ok(entry)
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn playlist_mut(&mut self) -> &mut Playlist {
        &mut self.playlist
    }
}
