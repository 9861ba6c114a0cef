//! Export a cropped clip.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use panframe_common::config::AppConfig;
use panframe_common::timecode::export_stamp;
use panframe_project_model::export::{CropMode, ExportFormat, TrimRange};
use panframe_render_engine::{
    export_clip, export_config_from_defaults, AbortHandle, ExportProgress, ExportRequest,
    ExportStage, FfmpegPipeline, ProgressCallback,
};

use super::{load_path, parse_rect, parse_time};

pub struct ExportArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: String,
    pub path: Option<PathBuf>,
    pub rect: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub format: Option<String>,
    pub smooth: bool,
    pub no_blur: bool,
}

pub async fn run(app: &AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    let mode: CropMode = args.mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let mut config = export_config_from_defaults(&app.export, mode)?;

    if let Some(format) = &args.format {
        config.format = format
            .parse::<ExportFormat>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(rect) = &args.rect {
        config.static_rect = Some(parse_rect(rect)?);
    }
    let start_secs = args.start.as_deref().map(parse_time).transpose()?;
    let end_secs = args.end.as_deref().map(parse_time).transpose()?;
    config.trim = TrimRange::new(start_secs.unwrap_or(0.0), end_secs);
    config.smooth_path |= args.smooth;
    if args.no_blur {
        config.use_blurred_background = false;
    }

    let sequence = args.path.as_deref().map(load_path).transpose()?;
    if mode.is_dynamic() && sequence.is_none() {
        println!("No pan path given; {} falls back to a static or full-frame crop", mode.as_str());
    }

    let output = args.output.unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());
        app.output_dir
            .join(format!("{stem}-{}.{}", export_stamp(), config.format.extension()))
    });

    println!("Exporting: {}", args.input.display());
    println!("  Output: {}", output.display());
    println!("  Crop mode: {}", mode.as_str());
    println!("  Format: {:?}", config.format);

    let abort = AbortHandle::new();
    let ctrl_c_abort = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, aborting export");
            ctrl_c_abort.abort();
        }
    });

    let mut request = ExportRequest::new(&args.input, &output, config).with_abort(abort);
    if let Some(seq) = sequence {
        request = request.with_sequence(seq);
    }

    let progress_cb: ProgressCallback = Arc::new(|p: ExportProgress| {
        if p.stage == ExportStage::Rendering {
            print!(
                "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
                p.progress * 100.0,
                p.frames_rendered,
                p.total_frames,
                p.eta_secs,
            );
            std::io::stdout().flush().ok();
        }
    });

    let pipeline = Arc::new(FfmpegPipeline::new());
    match export_clip(request, pipeline, Some(progress_cb)).await {
        Ok(clip) => {
            println!("\nExport complete: {}", clip.path.display());
            println!(
                "  {}x{}, {:.2}s, {} frames, {} bytes ({})",
                clip.width,
                clip.height,
                clip.duration_secs,
                clip.total_frames,
                clip.size_bytes,
                clip.crop_mode.as_str()
            );
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}
