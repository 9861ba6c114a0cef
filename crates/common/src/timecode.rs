//! Timecode utilities.
//!
//! Media time is carried as `f64` seconds everywhere in Panframe. This
//! module converts between seconds and human-readable timecodes and
//! derives frame presentation timestamps.

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_timecode(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parse `SS[.fff]`, `MM:SS[.fff]` or `HH:MM:SS[.fff]` into seconds.
///
/// Returns `None` for malformed or negative input.
pub fn parse_timecode(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let mut secs = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let value: f64 = part.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        // Only the last component may carry a fraction.
        if i + 1 < parts.len() && value.fract() != 0.0 {
            return None;
        }
        secs = secs * 60.0 + value;
    }
    Some(secs)
}

/// Presentation timestamp of the `index`-th frame after `start_secs`.
///
/// A non-positive or non-finite rate pins every frame to `start_secs`.
pub fn frame_pts(start_secs: f64, index: u64, fps: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        start_secs + index as f64 / fps
    } else {
        start_secs
    }
}

/// Compact local-time stamp used in generated clip names.
pub fn export_stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// RFC 3339 wall-clock timestamp.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timecode() {
        assert_eq!(format_timecode(0.0), "00:00:00.000");
        assert_eq!(format_timecode(83.25), "00:01:23.250");
        assert_eq!(format_timecode(3723.5), "01:02:03.500");
        assert_eq!(format_timecode(-4.0), "00:00:00.000");
    }

    #[test]
    fn test_parse_timecode_forms() {
        assert_eq!(parse_timecode("12.5"), Some(12.5));
        assert_eq!(parse_timecode("1:30"), Some(90.0));
        assert_eq!(parse_timecode("01:02:03.5"), Some(3723.5));
    }

    #[test]
    fn test_parse_timecode_rejects_garbage() {
        assert_eq!(parse_timecode(""), None);
        assert_eq!(parse_timecode("abc"), None);
        assert_eq!(parse_timecode("-3"), None);
        assert_eq!(parse_timecode("1.5:30"), None);
        assert_eq!(parse_timecode("1:2:3:4"), None);
    }

    #[test]
    fn test_frame_pts() {
        assert!((frame_pts(2.0, 30, 30.0) - 3.0).abs() < 1e-9);
        assert_eq!(frame_pts(1.5, 5, 0.0), 1.5);
        assert_eq!(frame_pts(1.5, 5, f64::NAN), 1.5);
    }

    #[test]
    fn test_frame_pts_below_one_fps() {
        assert!((frame_pts(0.0, 4, 0.5) - 8.0).abs() < 1e-9);
        assert!((frame_pts(1.0, 3, 0.25) - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_export_stamp_shape() {
        let stamp = export_stamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "-");
    }
}
