//! Frame compositor: turns one decoded source frame plus the interpolated
//! crop rect into the output frame for that sample.
//!
//! The compositor knows nothing about the media pipeline; it works on plain
//! RGBA buffers so it can be exercised without ffmpeg.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use panframe_project_model::export::{CropMode, ExportConfig};
use panframe_project_model::geometry::{clamp_to_bounds, Rect, Size};
use panframe_project_model::keyframe::KeyframeSequence;

const BACKGROUND_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Background blur runs on a copy downscaled by this factor.
const BLUR_DOWNSCALE: u32 = 4;

/// Per-sample compositor for one export.
#[derive(Debug, Clone)]
pub struct Compositor {
    mode: CropMode,
    canvas_width: u32,
    canvas_height: u32,
    scale_with_aspect_ratio: bool,
    use_blurred_background: bool,
    blur_radius_px: f32,
}

impl Compositor {
    /// Build a compositor for `mode` drawing into a `canvas_width` x
    /// `canvas_height` canvas. The canvas only matters for max-size mode;
    /// spotlight always keeps the source frame size.
    pub fn new(config: &ExportConfig, mode: CropMode, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            mode,
            canvas_width: canvas_width.max(1),
            canvas_height: canvas_height.max(1),
            scale_with_aspect_ratio: config.scale_with_aspect_ratio,
            use_blurred_background: config.use_blurred_background,
            blur_radius_px: config.blur_radius_px,
        }
    }

    pub fn mode(&self) -> CropMode {
        self.mode
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Produce the output frame for `frame` cropped around `rect`.
    ///
    /// A missing rect, or one that is empty after clamping to the frame,
    /// returns the source frame untouched. Static and none modes never
    /// composite (the pipeline crops natively) and also pass through.
    pub fn composite<'a>(&self, frame: &'a RgbaImage, rect: Option<Rect>) -> Cow<'a, RgbaImage> {
        let Some(rect) = rect else {
            return Cow::Borrowed(frame);
        };
        let Some(region) = PixelRegion::from_rect(&rect, frame.width(), frame.height()) else {
            tracing::trace!(
                x = rect.x,
                y = rect.y,
                width = rect.width,
                height = rect.height,
                "Degenerate crop rect, passing frame through"
            );
            return Cow::Borrowed(frame);
        };

        match self.mode {
            CropMode::Spotlight => Cow::Owned(self.spotlight(frame, region)),
            CropMode::MaxSize => Cow::Owned(self.max_size(frame, region)),
            CropMode::None | CropMode::Static => Cow::Borrowed(frame),
        }
    }

    fn spotlight(&self, frame: &RgbaImage, region: PixelRegion) -> RgbaImage {
        let mut canvas = if self.use_blurred_background {
            blurred(frame, self.blur_radius_px)
        } else {
            RgbaImage::from_pixel(frame.width(), frame.height(), BACKGROUND_FILL)
        };

        let sharp =
            imageops::crop_imm(frame, region.x, region.y, region.width, region.height).to_image();
        imageops::replace(&mut canvas, &sharp, region.x as i64, region.y as i64);
        canvas
    }

    fn max_size(&self, frame: &RgbaImage, region: PixelRegion) -> RgbaImage {
        let (cw, ch) = (self.canvas_width, self.canvas_height);

        let mut canvas = if self.use_blurred_background {
            blurred(&cover_scaled(frame, cw, ch), self.blur_radius_px)
        } else {
            RgbaImage::from_pixel(cw, ch, BACKGROUND_FILL)
        };

        let crop =
            imageops::crop_imm(frame, region.x, region.y, region.width, region.height).to_image();

        let placed = if self.scale_with_aspect_ratio {
            let (w, h) = fit_within(region.width, region.height, cw, ch);
            if (w, h) == (region.width, region.height) {
                crop
            } else {
                imageops::resize(&crop, w, h, FilterType::Triangle)
            }
        } else {
            crop
        };

        let x = (cw as i64 - placed.width() as i64) / 2;
        let y = (ch as i64 - placed.height() as i64) / 2;
        imageops::replace(&mut canvas, &placed, x, y);
        canvas
    }
}

/// Integer crop window inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl PixelRegion {
    fn from_rect(rect: &Rect, frame_width: u32, frame_height: u32) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        let clamped = clamp_to_bounds(*rect, frame_width as f64, frame_height as f64);

        let x = (clamped.x.round() as u32).min(frame_width - 1);
        let y = (clamped.y.round() as u32).min(frame_height - 1);
        let width = (clamped.width.round() as u32).min(frame_width - x);
        let height = (clamped.height.round() as u32).min(frame_height - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// Largest size with the aspect ratio of `width` x `height` that fits the canvas.
fn fit_within(width: u32, height: u32, canvas_width: u32, canvas_height: u32) -> (u32, u32) {
    let scale = (canvas_width as f64 / width as f64).min(canvas_height as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, canvas_width);
    let h = ((height as f64 * scale).round() as u32).clamp(1, canvas_height);
    (w, h)
}

/// Scale `frame` to cover the canvas and crop the overflow evenly.
fn cover_scaled(frame: &RgbaImage, canvas_width: u32, canvas_height: u32) -> RgbaImage {
    let (fw, fh) = frame.dimensions();
    let scale = (canvas_width as f64 / fw as f64).max(canvas_height as f64 / fh as f64);
    let sw = ((fw as f64 * scale).ceil() as u32).max(canvas_width);
    let sh = ((fh as f64 * scale).ceil() as u32).max(canvas_height);

    let scaled = imageops::resize(frame, sw, sh, FilterType::Triangle);
    imageops::crop_imm(
        &scaled,
        (sw - canvas_width) / 2,
        (sh - canvas_height) / 2,
        canvas_width,
        canvas_height,
    )
    .to_image()
}

/// Gaussian blur approximated on a downscaled copy.
fn blurred(image: &RgbaImage, radius_px: f32) -> RgbaImage {
    if radius_px <= 0.0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let small_w = (w / BLUR_DOWNSCALE).max(1);
    let small_h = (h / BLUR_DOWNSCALE).max(1);

    let small = imageops::resize(image, small_w, small_h, FilterType::Triangle);
    let sigma = (radius_px / BLUR_DOWNSCALE as f32).max(0.5);
    let small = imageops::blur(&small, sigma);
    imageops::resize(&small, w, h, FilterType::Triangle)
}

/// Rect used for a static crop: the configured rect, else the first keyframe.
pub fn static_crop_rect(config: &ExportConfig, sequence: Option<&KeyframeSequence>) -> Option<Rect> {
    config
        .static_rect
        .or_else(|| sequence.and_then(|seq| seq.first()).map(|kf| kf.rect))
        .filter(|rect| !rect.is_degenerate())
}

/// Encoder canvas size for `mode`, always even in both dimensions.
pub fn output_size_for(
    mode: CropMode,
    config: &ExportConfig,
    sequence: Option<&KeyframeSequence>,
    source: Size,
) -> (u32, u32) {
    let size = match mode {
        CropMode::None | CropMode::Spotlight => source,
        CropMode::Static => static_crop_rect(config, sequence)
            .map(|rect| clamp_to_bounds(rect, source.width, source.height).size())
            .unwrap_or(source),
        // Never smaller than the largest keyframe, even after a wheel zoom
        // shrank the locked size.
        CropMode::MaxSize => match (config.locked_size, sequence.and_then(KeyframeSequence::max_size)) {
            (Some(locked), Some(largest)) => Size::new(
                locked.width.max(largest.width),
                locked.height.max(largest.height),
            ),
            (Some(size), None) | (None, Some(size)) => size,
            (None, None) => source,
        },
    };
    size.to_even_pixels()
}
