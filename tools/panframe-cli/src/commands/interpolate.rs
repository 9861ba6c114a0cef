//! Print interpolated crop rects for a saved pan path.

use std::path::PathBuf;

use panframe_common::timecode::{format_timecode, frame_pts};
use panframe_processing_core::interpolate::interpolate;

use super::{load_path, parse_time};

pub fn run(path: PathBuf, at: Vec<String>, fps: Option<f64>) -> anyhow::Result<()> {
    let seq = load_path(&path)?;
    if seq.is_empty() {
        println!("Pan path {} has no keyframes", path.display());
        return Ok(());
    }

    let times = match fps {
        Some(fps) => {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(anyhow::anyhow!("--fps must be positive, got {fps}"));
            }
            let (start, end) = seq.time_range().unwrap_or((0.0, 0.0));
            let count = ((end - start) * fps).floor() as u64 + 1;
            (0..count).map(|i| frame_pts(start, i, fps)).collect()
        }
        None => at
            .iter()
            .map(|t| parse_time(t))
            .collect::<anyhow::Result<Vec<_>>>()?,
    };

    println!(
        "Pan path: {} ({} keyframes, bounds {}x{})",
        path.display(),
        seq.len(),
        seq.bounds.width,
        seq.bounds.height
    );
    for t in times {
        if let Some(r) = interpolate(&seq, t) {
            println!(
                "  {}  x={:.1} y={:.1} w={:.1} h={:.1}",
                format_timecode(t),
                r.x,
                r.y,
                r.width,
                r.height
            );
        }
    }

    Ok(())
}
