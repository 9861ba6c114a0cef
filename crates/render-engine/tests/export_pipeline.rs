use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};

use panframe_common::config::AppConfig;
use panframe_common::error::{PanframeError, PanframeResult};
use panframe_project_model::export::{CropMode, ExportConfig, TrimRange};
use panframe_project_model::geometry::{Rect, Size};
use panframe_project_model::keyframe::{Keyframe, KeyframeSequence};
use panframe_render_engine::pipeline::conform_frame;
use panframe_render_engine::{
    export_clip, AbortHandle, EditSession, ExportProgress, ExportRequest, ExportStage,
    MediaPipeline, ProgressCallback, SampleTransform, TrackInfo, TranscodePlan, VideoProcessing,
};

const SOURCE_W: u32 = 64;
const SOURCE_H: u32 = 36;

#[derive(Default)]
struct Behaviour {
    unavailable: bool,
    fail_at_frame: Option<u64>,
    empty_output: bool,
}

/// In-memory pipeline: synthesises frames, runs the transform and writes a
/// small fake container so the orchestrator can be tested without ffmpeg.
struct FakePipeline {
    info: TrackInfo,
    behaviour: Behaviour,
    plans: Mutex<Vec<TranscodePlan>>,
    samples: Mutex<Vec<(f64, (u32, u32))>>,
}

impl FakePipeline {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            info: TrackInfo {
                width: SOURCE_W,
                height: SOURCE_H,
                duration_secs: 2.0,
                fps: 10.0,
                has_audio: true,
            },
            behaviour,
            plans: Mutex::new(Vec::new()),
            samples: Mutex::new(Vec::new()),
        })
    }

    fn plans(&self) -> Vec<TranscodePlan> {
        self.plans.lock().unwrap().clone()
    }

    fn samples(&self) -> Vec<(f64, (u32, u32))> {
        self.samples.lock().unwrap().clone()
    }
}

impl MediaPipeline for FakePipeline {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_available(&self) -> bool {
        !self.behaviour.unavailable
    }

    fn probe(&self, _path: &Path) -> PanframeResult<TrackInfo> {
        Ok(self.info.clone())
    }

    fn transcode(
        &self,
        plan: &TranscodePlan,
        transform: Option<&dyn SampleTransform>,
        progress: &dyn Fn(ExportProgress),
        abort: &AbortHandle,
    ) -> PanframeResult<()> {
        self.plans.lock().unwrap().push(plan.clone());

        let mut bytes = Vec::new();
        let total = plan.total_frames();
        let source = RgbaImage::from_pixel(plan.source.width, plan.source.height, Rgba([90, 120, 150, 255]));

        for index in 0..total {
            if abort.is_aborted() {
                std::fs::write(&plan.output, &bytes)?;
                return Err(PanframeError::Aborted);
            }
            if self.behaviour.fail_at_frame == Some(index) {
                std::fs::write(&plan.output, &bytes)?;
                return Err(PanframeError::pipeline("encoder crashed"));
            }

            let t = plan.sample_time(index);
            let out = match (plan.video, transform) {
                (VideoProcessing::PerSample, Some(transform)) => conform_frame(
                    transform.transform(&source, t),
                    plan.output_width,
                    plan.output_height,
                ),
                _ => conform_frame(
                    std::borrow::Cow::Borrowed(&source),
                    plan.output_width,
                    plan.output_height,
                ),
            };
            self.samples.lock().unwrap().push((t, out.dimensions()));
            bytes.extend_from_slice(&out.as_raw()[..4]);
            progress(ExportProgress::from_frames(index + 1, total, 0.1));
        }

        if self.behaviour.empty_output {
            std::fs::write(&plan.output, b"")?;
        } else {
            std::fs::write(&plan.output, &bytes)?;
        }
        Ok(())
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("talk.mp4");
    std::fs::write(&input, b"not really a video").unwrap();
    let output = dir.path().join("out").join("clip.mp4");
    Workspace {
        input,
        output,
        _dir: dir,
    }
}

fn pan_path() -> KeyframeSequence {
    KeyframeSequence::from_keyframes(
        Size::new(SOURCE_W as f64, SOURCE_H as f64),
        vec![
            Keyframe::new(0.0, Rect::new(0.0, 0.0, 20.0, 10.0)),
            Keyframe::new(1.0, Rect::new(30.0, 10.0, 30.0, 16.0)),
        ],
    )
}

fn config(mode: CropMode) -> ExportConfig {
    ExportConfig {
        crop_mode: mode,
        use_blurred_background: false,
        ..ExportConfig::default()
    }
}

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ExportProgress>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let cb: ProgressCallback = Arc::new(move |p: ExportProgress| sink.lock().unwrap().push(p));
    (cb, reports)
}

#[tokio::test]
async fn spotlight_export_transforms_every_sample_in_order() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());
    let (cb, reports) = recorder();

    let request = ExportRequest::new(&ws.input, &ws.output, config(CropMode::Spotlight))
        .with_sequence(pan_path());
    let clip = export_clip(request, pipeline.clone(), Some(cb)).await.unwrap();

    assert_eq!(clip.crop_mode, CropMode::Spotlight);
    assert_eq!((clip.width, clip.height), (SOURCE_W, SOURCE_H));
    assert_eq!(clip.total_frames, 20);
    assert!(clip.size_bytes > 0);
    assert!(ws.output.exists());

    let samples = pipeline.samples();
    assert_eq!(samples.len(), 20);
    assert!(samples.windows(2).all(|w| w[1].0 > w[0].0));
    assert!(samples.iter().all(|(_, dims)| *dims == (SOURCE_W, SOURCE_H)));

    let reports = reports.lock().unwrap();
    assert!(reports.iter().all(|p| (0.0..=1.0).contains(&p.progress)));
    assert_eq!(reports.first().unwrap().stage, ExportStage::Preparing);
    let last = reports.last().unwrap();
    assert_eq!(last.stage, ExportStage::Complete);
    assert_eq!(last.progress, 1.0);
}

#[tokio::test]
async fn max_size_canvas_uses_largest_keyframe() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());

    let request = ExportRequest::new(&ws.input, &ws.output, config(CropMode::MaxSize))
        .with_sequence(pan_path());
    let clip = export_clip(request, pipeline.clone(), None).await.unwrap();

    assert_eq!((clip.width, clip.height), (30, 16));
    assert!(pipeline.samples().iter().all(|(_, dims)| *dims == (30, 16)));
}

#[tokio::test]
async fn trimmed_export_samples_source_timestamps() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());
    let cfg = ExportConfig {
        trim: TrimRange::new(0.5, Some(1.5)),
        ..config(CropMode::Spotlight)
    };

    let request = ExportRequest::new(&ws.input, &ws.output, cfg).with_sequence(pan_path());
    let clip = export_clip(request, pipeline.clone(), None).await.unwrap();

    assert!((clip.duration_secs - 1.0).abs() < 1e-9);
    let samples = pipeline.samples();
    assert_eq!(samples.len(), 10);
    assert!((samples[0].0 - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn invalid_trim_is_rejected_before_pipeline_work() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());

    for trim in [TrimRange::new(1.5, Some(0.5)), TrimRange::new(3.0, None)] {
        let cfg = ExportConfig {
            trim,
            ..config(CropMode::Spotlight)
        };
        let request = ExportRequest::new(&ws.input, &ws.output, cfg).with_sequence(pan_path());
        let err = export_clip(request, pipeline.clone(), None).await.unwrap_err();
        assert!(matches!(err, PanframeError::InvalidTimeRange { .. }), "{err}");
    }
    assert!(pipeline.plans().is_empty());
}

#[tokio::test]
async fn pipeline_failure_discards_partial_output() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour {
        fail_at_frame: Some(5),
        ..Behaviour::default()
    });
    let (cb, reports) = recorder();

    let request = ExportRequest::new(&ws.input, &ws.output, config(CropMode::Spotlight))
        .with_sequence(pan_path());
    let err = export_clip(request, pipeline, Some(cb)).await.unwrap_err();

    assert!(matches!(err, PanframeError::Pipeline { .. }));
    assert!(!ws.output.exists());
    assert_eq!(reports.lock().unwrap().last().unwrap().stage, ExportStage::Failed);
}

#[tokio::test]
async fn empty_output_is_an_error() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour {
        empty_output: true,
        ..Behaviour::default()
    });

    let request = ExportRequest::new(&ws.input, &ws.output, config(CropMode::None));
    let err = export_clip(request, pipeline, None).await.unwrap_err();
    assert!(matches!(err, PanframeError::Pipeline { .. }));
    assert!(!ws.output.exists());
}

#[tokio::test]
async fn aborted_export_discards_output() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());
    let abort = AbortHandle::new();
    abort.abort();

    let request = ExportRequest::new(&ws.input, &ws.output, config(CropMode::Spotlight))
        .with_sequence(pan_path())
        .with_abort(abort);
    let err = export_clip(request, pipeline, None).await.unwrap_err();
    assert!(matches!(err, PanframeError::Aborted));
    assert!(!ws.output.exists());
}

#[tokio::test]
async fn single_keyframe_falls_back_to_native_crop_within_bounds() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());
    // Recorded against a larger source than the one being exported.
    let seq = KeyframeSequence::from_keyframes(
        Size::new(400.0, 300.0),
        vec![Keyframe::new(0.0, Rect::new(200.0, 100.0, 40.0, 20.0))],
    );

    let request =
        ExportRequest::new(&ws.input, &ws.output, config(CropMode::MaxSize)).with_sequence(seq);
    let clip = export_clip(request, pipeline.clone(), None).await.unwrap();

    assert_eq!(clip.crop_mode, CropMode::Static);
    let plan = pipeline.plans().pop().unwrap();
    match plan.video {
        VideoProcessing::NativeCrop(rect) => {
            assert!(rect.right() <= SOURCE_W as f64);
            assert!(rect.bottom() <= SOURCE_H as f64);
        }
        other => panic!("expected native crop, got {other:?}"),
    }
    assert_eq!((clip.width, clip.height), (40, 20));
}

#[tokio::test]
async fn unavailable_pipeline_is_unsupported() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour {
        unavailable: true,
        ..Behaviour::default()
    });
    let request = ExportRequest::new(&ws.input, &ws.output, config(CropMode::None));
    let err = export_clip(request, pipeline, None).await.unwrap_err();
    assert!(matches!(err, PanframeError::Unsupported { .. }));
}

#[tokio::test]
async fn session_refuses_export_while_recording_and_appends_on_success() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour::default());
    let app = AppConfig {
        output_dir: ws.output.parent().unwrap().to_path_buf(),
        ..AppConfig::default()
    };
    let mut session = EditSession::open(&ws.input, pipeline.as_ref(), &app).unwrap();

    session
        .start_recording(Rect::new(0.0, 0.0, 20.0, 10.0), 0.0)
        .unwrap();
    let cfg = session.export_config(CropMode::Spotlight).unwrap();
    let err = session
        .export(cfg.clone(), pipeline.clone(), None, AbortHandle::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PanframeError::Session { .. }));
    assert!(session.playlist().is_empty());

    session.record_sample(1.0, Rect::new(30.0, 10.0, 20.0, 10.0));
    session.stop_recording().unwrap();

    let entry = session
        .export(cfg, pipeline.clone(), None, AbortHandle::new())
        .await
        .unwrap();
    assert_eq!(session.playlist().len(), 1);
    assert!(entry.path.exists());
    assert!(entry.name.starts_with("talk-"));
    assert!(entry.name.ends_with(".mp4"));
}

#[tokio::test]
async fn failed_session_export_leaves_playlist_untouched() {
    let ws = workspace();
    let pipeline = FakePipeline::new(Behaviour {
        fail_at_frame: Some(0),
        ..Behaviour::default()
    });
    let app = AppConfig {
        output_dir: ws.output.parent().unwrap().to_path_buf(),
        ..AppConfig::default()
    };
    let mut session = EditSession::open(&ws.input, pipeline.as_ref(), &app).unwrap();
    session.set_pan_path(Some(pan_path()));

    let cfg = session.export_config(CropMode::MaxSize).unwrap();
    let result = session.export(cfg, pipeline.clone(), None, AbortHandle::new()).await;
    assert!(result.is_err());
    assert!(session.playlist().is_empty());
}
