//! Smooth a saved pan path.

use std::path::PathBuf;

use anyhow::Context;
use panframe_processing_core::smooth::PathSmoother;

use super::load_path;

pub fn run(path: PathBuf, output: Option<PathBuf>, window: usize) -> anyhow::Result<()> {
    let seq = load_path(&path)?;
    let smoothed = PathSmoother::new(window).smooth(&seq);

    let output = output.unwrap_or_else(|| path.clone());
    smoothed
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if seq.len() < window {
        println!(
            "Pan path has {} keyframes, fewer than window {window}; written unchanged",
            seq.len()
        );
    }
    println!(
        "Smoothed {} keyframes (window {window}) -> {}",
        smoothed.len(),
        output.display()
    );
    Ok(())
}
