//! Rectangle and coordinate utilities for crop regions.
//!
//! All rectangles are expressed in source-pixel coordinates: `(0, 0)` is
//! the top-left pixel of the decoded video frame.

use serde::{Deserialize, Serialize};

/// Smallest width or height (source pixels) a resize may produce.
pub const MIN_RECT_DIMENSION: f64 = 20.0;

/// A crop rectangle in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two arbitrary corner points.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (ax - bx).abs(),
            height: (ay - by).abs(),
        }
    }

    /// Rectangle of the given size centered at `(cx, cy)`. Not clamped.
    pub fn centered_at(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// The center point of this rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the rectangle covers at least one pixel in both directions.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Corner positions in handle order `[nw, ne, sw, se]`.
    pub fn corners(&self) -> [(Handle, f64, f64); 4] {
        [
            (Handle::Nw, self.x, self.y),
            (Handle::Ne, self.right(), self.y),
            (Handle::Sw, self.x, self.bottom()),
            (Handle::Se, self.right(), self.bottom()),
        ]
    }
}

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions rounded down to even numbers, at least 2×2.
    pub fn to_even_pixels(&self) -> (u32, u32) {
        (even_floor_f64(self.width), even_floor_f64(self.height))
    }
}

/// Corner resize handle of a crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
    None,
}

/// Translate/clip `rect` so it lies within `[0, bounds_width] × [0, bounds_height]`.
///
/// Width and height are preserved unless they exceed the bounds, in which
/// case they are capped to the bounds. Negative or NaN sizes collapse to 0.
pub fn clamp_to_bounds(rect: Rect, bounds_width: f64, bounds_height: f64) -> Rect {
    let bounds_width = non_negative(bounds_width);
    let bounds_height = non_negative(bounds_height);

    let width = non_negative(rect.width).min(bounds_width);
    let height = non_negative(rect.height).min(bounds_height);
    let x = finite_or_zero(rect.x).clamp(0.0, bounds_width - width);
    let y = finite_or_zero(rect.y).clamp(0.0, bounds_height - height);

    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Nearest corner handle within `handle_radius_px` of `(px, py)`.
///
/// Ties go to the first handle in `[nw, ne, sw, se]` order.
pub fn hit_test_handle(px: f64, py: f64, rect: &Rect, handle_radius_px: f64) -> Handle {
    let mut best = Handle::None;
    let mut best_dist = f64::INFINITY;

    for (handle, cx, cy) in rect.corners() {
        let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        if dist <= handle_radius_px && dist < best_dist {
            best = handle;
            best_dist = dist;
        }
    }

    best
}

/// Inclusive containment test.
pub fn point_in_rect(px: f64, py: f64, rect: &Rect) -> bool {
    px >= rect.x && px <= rect.right() && py >= rect.y && py <= rect.bottom()
}

/// Move the edges touched by `handle` by `(dx, dy)`.
///
/// Moved edges stop at the bounds, so the edges the handle does not touch
/// stay put. When an edge would shrink a dimension below
/// [`MIN_RECT_DIMENSION`], the opposite edge stays where it was and the
/// dimension is pinned to the minimum. The result is clamped to `bounds`.
pub fn resize(handle: Handle, dx: f64, dy: f64, original: &Rect, bounds: Size) -> Rect {
    let mut left = original.x;
    let mut top = original.y;
    let mut right = original.right();
    let mut bottom = original.bottom();

    match handle {
        Handle::Nw => {
            left += dx;
            top += dy;
        }
        Handle::Ne => {
            right += dx;
            top += dy;
        }
        Handle::Sw => {
            left += dx;
            bottom += dy;
        }
        Handle::Se => {
            right += dx;
            bottom += dy;
        }
        Handle::None => return clamp_to_bounds(*original, bounds.width, bounds.height),
    }

    match handle {
        Handle::Nw | Handle::Sw => left = left.max(0.0),
        _ => right = right.min(bounds.width),
    }
    match handle {
        Handle::Nw | Handle::Ne => top = top.max(0.0),
        _ => bottom = bottom.min(bounds.height),
    }

    if right - left < MIN_RECT_DIMENSION {
        match handle {
            Handle::Nw | Handle::Sw => left = right - MIN_RECT_DIMENSION,
            _ => right = left + MIN_RECT_DIMENSION,
        }
    }
    if bottom - top < MIN_RECT_DIMENSION {
        match handle {
            Handle::Nw | Handle::Ne => top = bottom - MIN_RECT_DIMENSION,
            _ => bottom = top + MIN_RECT_DIMENSION,
        }
    }

    clamp_to_bounds(
        Rect::new(left, top, right - left, bottom - top),
        bounds.width,
        bounds.height,
    )
}

/// Mapping between display (on-screen canvas) pixels and source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    scale_x: f64,
    scale_y: f64,
}

impl DisplayScale {
    /// Build the mapping for a source frame shown at `display` size.
    pub fn new(source: Size, display: Size) -> Self {
        let scale = |s: f64, d: f64| if d > 0.0 { s / d } else { 1.0 };
        Self {
            scale_x: scale(source.width, display.width),
            scale_y: scale(source.height, display.height),
        }
    }

    /// Identity mapping.
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn to_source_point(&self, px: f64, py: f64) -> (f64, f64) {
        (px * self.scale_x, py * self.scale_y)
    }

    pub fn to_display_point(&self, px: f64, py: f64) -> (f64, f64) {
        (px / self.scale_x, py / self.scale_y)
    }

    pub fn to_source_rect(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x * self.scale_x,
            rect.y * self.scale_y,
            rect.width * self.scale_x,
            rect.height * self.scale_y,
        )
    }

    pub fn to_display_rect(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x / self.scale_x,
            rect.y / self.scale_y,
            rect.width / self.scale_x,
            rect.height / self.scale_y,
        )
    }
}

/// Round down to the nearest even number, never below 2.
pub fn even_floor(value: u32) -> u32 {
    (value & !1).max(2)
}

fn even_floor_f64(value: f64) -> u32 {
    even_floor(non_negative(value).floor().min(u32::MAX as f64) as u32)
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BOUNDS: Size = Size::new(1920.0, 1080.0);

    #[test]
    fn test_clamp_translates_inside() {
        let r = clamp_to_bounds(Rect::new(1900.0, -10.0, 100.0, 50.0), 1920.0, 1080.0);
        assert_eq!(r, Rect::new(1820.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_clamp_caps_oversized() {
        let r = clamp_to_bounds(Rect::new(-5.0, 3.0, 4000.0, 2000.0), 1920.0, 1080.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 1920.0, 1080.0));
    }

    #[test]
    fn test_clamp_negative_size_collapses() {
        let r = clamp_to_bounds(Rect::new(10.0, 10.0, -4.0, f64::NAN), 100.0, 100.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 0.0);
        assert!(r.is_degenerate());
    }

    #[test]
    fn test_hit_test_corners() {
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0);
        assert_eq!(hit_test_handle(102.0, 98.0, &rect, 10.0), Handle::Nw);
        assert_eq!(hit_test_handle(300.0, 100.0, &rect, 10.0), Handle::Ne);
        assert_eq!(hit_test_handle(95.0, 205.0, &rect, 10.0), Handle::Sw);
        assert_eq!(hit_test_handle(299.0, 199.0, &rect, 10.0), Handle::Se);
        assert_eq!(hit_test_handle(200.0, 150.0, &rect, 10.0), Handle::None);
    }

    #[test]
    fn test_hit_test_tie_prefers_first() {
        // Tiny rect: the point is equidistant from nw and ne.
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert_eq!(hit_test_handle(2.0, 0.0, &rect, 10.0), Handle::Nw);
    }

    #[test]
    fn test_hit_test_picks_nearest() {
        let rect = Rect::new(0.0, 0.0, 6.0, 6.0);
        assert_eq!(hit_test_handle(5.0, 5.0, &rect, 10.0), Handle::Se);
    }

    #[test]
    fn test_point_in_rect_inclusive() {
        let rect = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(point_in_rect(10.0, 10.0, &rect));
        assert!(point_in_rect(20.0, 20.0, &rect));
        assert!(!point_in_rect(20.01, 15.0, &rect));
    }

    #[test]
    fn test_resize_se_enforces_minimum() {
        let r = resize(
            Handle::Se,
            -90.0,
            0.0,
            &Rect::new(0.0, 0.0, 100.0, 100.0),
            BOUNDS,
        );
        assert_eq!(r, Rect::new(0.0, 0.0, 20.0, 100.0));
    }

    #[test]
    fn test_resize_nw_locks_opposite_edge() {
        let original = Rect::new(100.0, 100.0, 100.0, 100.0);
        let r = resize(Handle::Nw, 500.0, 95.0, &original, BOUNDS);
        assert_eq!(r, Rect::new(180.0, 180.0, 20.0, 20.0));
        assert_eq!(r.right(), original.right());
        assert_eq!(r.bottom(), original.bottom());
    }

    #[test]
    fn test_resize_ne_grows() {
        let r = resize(
            Handle::Ne,
            50.0,
            -20.0,
            &Rect::new(100.0, 100.0, 100.0, 100.0),
            BOUNDS,
        );
        assert_eq!(r, Rect::new(100.0, 80.0, 150.0, 120.0));
    }

    #[test]
    fn test_resize_clamps_to_bounds() {
        let r = resize(
            Handle::Se,
            5000.0,
            0.0,
            &Rect::new(100.0, 0.0, 100.0, 100.0),
            BOUNDS,
        );
        assert_eq!(r, Rect::new(100.0, 0.0, 1820.0, 100.0));
    }

    #[test]
    fn test_resize_past_left_edge_keeps_right_edge() {
        let original = Rect::new(100.0, 200.0, 300.0, 100.0);
        let r = resize(Handle::Nw, -500.0, -50.0, &original, BOUNDS);
        assert_eq!(r, Rect::new(0.0, 150.0, 400.0, 150.0));
        assert_eq!(r.right(), original.right());

        let r = resize(Handle::Sw, -500.0, 2000.0, &original, BOUNDS);
        assert_eq!(r, Rect::new(0.0, 200.0, 400.0, 880.0));
        assert_eq!(r.right(), original.right());
        assert_eq!(r.y, original.y);
    }

    #[test]
    fn test_display_scale_roundtrip() {
        let scale = DisplayScale::new(Size::new(1920.0, 1080.0), Size::new(960.0, 540.0));
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        let source = scale.to_source_rect(&rect);
        assert_eq!(source, Rect::new(20.0, 40.0, 200.0, 100.0));
        assert_eq!(scale.to_display_rect(&source), rect);
        assert_eq!(scale.to_source_point(1.0, 1.0), (2.0, 2.0));
        assert_eq!(scale.to_display_point(40.0, 30.0), (20.0, 15.0));
    }

    #[test]
    fn test_display_scale_zero_display_is_identity() {
        let scale = DisplayScale::new(Size::new(1920.0, 1080.0), Size::new(0.0, 0.0));
        assert_eq!(scale, DisplayScale::identity());
    }

    #[test]
    fn test_even_floor() {
        assert_eq!(even_floor(201), 200);
        assert_eq!(even_floor(150), 150);
        assert_eq!(even_floor(1), 2);
        assert_eq!(Size::new(199.7, 151.2).to_even_pixels(), (198, 150));
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners(50.0, 10.0, 20.0, 40.0);
        assert_eq!(r, Rect::new(20.0, 10.0, 30.0, 30.0));
    }

    proptest! {
        #[test]
        fn clamp_always_inside_bounds(
            x in -5000.0f64..5000.0,
            y in -5000.0f64..5000.0,
            w in -100.0f64..5000.0,
            h in -100.0f64..5000.0,
            bw in 0.0f64..4000.0,
            bh in 0.0f64..4000.0,
        ) {
            let r = clamp_to_bounds(Rect::new(x, y, w, h), bw, bh);
            prop_assert!(r.x >= 0.0);
            prop_assert!(r.y >= 0.0);
            prop_assert!(r.width >= 0.0 && r.height >= 0.0);
            prop_assert!(r.x + r.width <= bw + 1e-9);
            prop_assert!(r.y + r.height <= bh + 1e-9);
        }

        #[test]
        fn resize_respects_minimum_when_room(
            dx in -500.0f64..500.0,
            dy in -500.0f64..500.0,
            handle_idx in 0usize..4,
        ) {
            let handle = [Handle::Nw, Handle::Ne, Handle::Sw, Handle::Se][handle_idx];
            let original = Rect::new(800.0, 400.0, 200.0, 200.0);
            let r = resize(handle, dx, dy, &original, BOUNDS);
            prop_assert!(r.width >= MIN_RECT_DIMENSION - 1e-9);
            prop_assert!(r.height >= MIN_RECT_DIMENSION - 1e-9);
        }
    }
}
