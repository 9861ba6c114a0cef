//! Export configuration types.
//!
//! An [`ExportConfig`] is built from editor state at the moment an export
//! starts and stays immutable for the duration of that export.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};

/// How the crop region is applied to output frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CropMode {
    /// Full frame, no crop.
    #[default]
    None,
    /// One fixed rectangle for the whole clip, cropped natively by the pipeline.
    Static,
    /// Full-size output; everything outside the moving rect is dimmed or blurred.
    Spotlight,
    /// Output sized to the largest keyframe rect; the moving crop is centered.
    MaxSize,
}

impl CropMode {
    /// Whether this mode needs the per-frame compositor.
    pub fn is_dynamic(self) -> bool {
        matches!(self, CropMode::Spotlight | CropMode::MaxSize)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CropMode::None => "none",
            CropMode::Static => "static",
            CropMode::Spotlight => "spotlight",
            CropMode::MaxSize => "max-size",
        }
    }
}

impl std::str::FromStr for CropMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CropMode::None),
            "static" => Ok(CropMode::Static),
            "spotlight" => Ok(CropMode::Spotlight),
            "max-size" | "max_size" | "maxsize" => Ok(CropMode::MaxSize),
            other => Err(format!(
                "Unknown crop mode: {other}. Use: none, static, spotlight, max-size"
            )),
        }
    }
}

/// Output container/codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "webm")]
    Webm,
}

impl ExportFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 => "mp4",
            ExportFormat::Webm => "webm",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4-h264" | "mp4" | "h264" => Ok(ExportFormat::Mp4H264),
            "webm" => Ok(ExportFormat::Webm),
            other => Err(format!("Unknown format: {other}. Use: mp4-h264, webm")),
        }
    }
}

/// Portion of the source media included in an export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start_secs: f64,
    /// `None` means "until the end of the media".
    pub end_secs: Option<f64>,
}

impl TrimRange {
    /// Whole media.
    pub const FULL: TrimRange = TrimRange {
        start_secs: 0.0,
        end_secs: None,
    };

    pub fn new(start_secs: f64, end_secs: Option<f64>) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    /// Resolve against a media duration.
    ///
    /// Fails when start is not before end, or either bound lies outside
    /// `[0, duration_secs]`.
    pub fn resolve(&self, duration_secs: f64) -> Result<(f64, f64), String> {
        let start = self.start_secs;
        let end = self.end_secs.unwrap_or(duration_secs);

        if !start.is_finite() || !end.is_finite() {
            return Err("trim bounds must be finite".to_string());
        }
        if start < 0.0 {
            return Err(format!("trim start {start:.3}s is negative"));
        }
        if start >= end {
            return Err(format!(
                "trim start {start:.3}s must be before trim end {end:.3}s"
            ));
        }
        if end > duration_secs + 1e-6 {
            return Err(format!(
                "trim end {end:.3}s exceeds media duration {duration_secs:.3}s"
            ));
        }
        Ok((start, end.min(duration_secs)))
    }
}

impl Default for TrimRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Settings for one export pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Requested crop mode.
    pub crop_mode: CropMode,

    /// Fit the crop into the canvas preserving its aspect ratio (max-size mode).
    pub scale_with_aspect_ratio: bool,

    /// Fill the background with a blurred copy of the frame instead of black.
    pub use_blurred_background: bool,

    /// Gaussian blur radius in pixels.
    pub blur_radius_px: f32,

    /// Run the moving-average smoother over the pan path before export.
    pub smooth_path: bool,

    /// Smoother window size (keyframes).
    pub smoothing_window: usize,

    /// Trim range.
    pub trim: TrimRange,

    /// Rectangle for static mode when no pan path is supplied.
    #[serde(default)]
    pub static_rect: Option<Rect>,

    /// Canvas size override for max-size mode when the pan size was locked.
    #[serde(default)]
    pub locked_size: Option<Size>,

    /// Output format.
    #[serde(default)]
    pub format: ExportFormat,

    /// Video bitrate in kbps (0 = encoder default).
    #[serde(default)]
    pub video_bitrate_kbps: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            crop_mode: CropMode::None,
            scale_with_aspect_ratio: true,
            use_blurred_background: true,
            blur_radius_px: 20.0,
            smooth_path: false,
            smoothing_window: 5,
            trim: TrimRange::FULL,
            static_rect: None,
            locked_size: None,
            format: ExportFormat::Mp4H264,
            video_bitrate_kbps: 8000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_mode_parse() {
        assert_eq!("max-size".parse::<CropMode>().unwrap(), CropMode::MaxSize);
        assert_eq!("Spotlight".parse::<CropMode>().unwrap(), CropMode::Spotlight);
        assert!("zoom".parse::<CropMode>().is_err());
        assert!(CropMode::Spotlight.is_dynamic());
        assert!(!CropMode::Static.is_dynamic());
    }

    #[test]
    fn test_crop_mode_serde_names() {
        let json = serde_json::to_string(&CropMode::MaxSize).unwrap();
        assert_eq!(json, "\"max-size\"");
    }

    #[test]
    fn test_trim_resolve_full() {
        assert_eq!(TrimRange::FULL.resolve(12.0), Ok((0.0, 12.0)));
    }

    #[test]
    fn test_trim_rejects_inverted_range() {
        assert!(TrimRange::new(5.0, Some(5.0)).resolve(10.0).is_err());
        assert!(TrimRange::new(6.0, Some(2.0)).resolve(10.0).is_err());
    }

    #[test]
    fn test_trim_rejects_out_of_media() {
        assert!(TrimRange::new(-1.0, Some(2.0)).resolve(10.0).is_err());
        assert!(TrimRange::new(1.0, Some(12.0)).resolve(10.0).is_err());
        assert!(TrimRange::new(11.0, None).resolve(10.0).is_err());
    }

    #[test]
    fn test_format_extension() {
        assert_eq!("webm".parse::<ExportFormat>().unwrap().extension(), "webm");
        assert_eq!(ExportFormat::default().extension(), "mp4");
    }
}
