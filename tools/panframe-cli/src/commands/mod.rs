pub mod export;
pub mod interpolate;
pub mod probe;
pub mod smooth;

use std::path::Path;

use anyhow::Context;
use panframe_common::timecode::parse_timecode;
use panframe_project_model::geometry::Rect;
use panframe_project_model::keyframe::KeyframeSequence;

pub(crate) fn load_path(path: &Path) -> anyhow::Result<KeyframeSequence> {
    KeyframeSequence::load(path)
        .with_context(|| format!("Failed to load pan path {}", path.display()))
}

pub(crate) fn parse_time(value: &str) -> anyhow::Result<f64> {
    parse_timecode(value).ok_or_else(|| anyhow::anyhow!("Invalid time: {value}"))
}

/// Parse `x,y,width,height`.
pub(crate) fn parse_rect(value: &str) -> anyhow::Result<Rect> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Invalid rect {value}: {e}"))?;
    match parts.as_slice() {
        [x, y, w, h] if *w >= 0.0 && *h >= 0.0 => Ok(Rect::new(*x, *y, *w, *h)),
        _ => Err(anyhow::anyhow!(
            "Invalid rect {value}: expected x,y,width,height with non-negative size"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect() {
        assert_eq!(
            parse_rect("10, 20,300,200").unwrap(),
            Rect::new(10.0, 20.0, 300.0, 200.0)
        );
        assert!(parse_rect("10,20,300").is_err());
        assert!(parse_rect("10,20,-1,5").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("1:30").unwrap(), 90.0);
        assert!(parse_time("soon").is_err());
    }
}
