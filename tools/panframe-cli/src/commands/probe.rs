//! Show video track information.

use std::path::PathBuf;

use panframe_common::timecode::format_timecode;
use panframe_render_engine::{FfmpegPipeline, MediaPipeline};

pub fn run(input: PathBuf) -> anyhow::Result<()> {
    let pipeline = FfmpegPipeline::new();
    if !pipeline.is_available() {
        return Err(anyhow::anyhow!(
            "ffmpeg/ffprobe not found in PATH. Install ffmpeg to probe media."
        ));
    }

    let track = pipeline
        .probe(&input)
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", input.display()))?;

    println!("Media: {}", input.display());
    println!("  Resolution: {}x{}", track.width, track.height);
    println!(
        "  Duration: {} ({:.3}s)",
        format_timecode(track.duration_secs),
        track.duration_secs
    );
    println!("  Frame rate: {:.3} fps", track.fps);
    println!("  Audio: {}", if track.has_audio { "yes" } else { "no" });

    Ok(())
}
