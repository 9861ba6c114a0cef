//! Pointer interaction state machine for the crop editor.
//!
//! A press either starts drawing a new rect, dragging the existing one, or
//! resizing it from a corner handle. Each state carries only the data it
//! needs, so combinations such as "resizing while drawing" cannot exist.

use panframe_project_model::geometry::{
    clamp_to_bounds, hit_test_handle, point_in_rect, resize, Handle, Rect, Size,
    MIN_RECT_DIMENSION,
};

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerState {
    Idle,
    Drawing {
        origin: (f64, f64),
        previous: Option<Rect>,
    },
    Dragging {
        /// Pointer offset from the rect's top-left corner at press time.
        grab_offset: (f64, f64),
        original: Rect,
    },
    Resizing {
        handle: Handle,
        start: (f64, f64),
        original: Rect,
    },
}

/// Lightweight label for the current state (cursor styling, logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Idle,
    Drawing,
    Dragging,
    Resizing,
}

/// Crop-rect editor driven by pointer events in source-pixel coordinates.
#[derive(Debug, Clone)]
pub struct PointerInteraction {
    state: PointerState,
    rect: Option<Rect>,
    bounds: Size,
    handle_radius_px: f64,
}

impl PointerInteraction {
    pub fn new(bounds: Size, handle_radius_px: f64) -> Self {
        Self {
            state: PointerState::Idle,
            rect: None,
            bounds,
            handle_radius_px,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn kind(&self) -> InteractionKind {
        match self.state {
            PointerState::Idle => InteractionKind::Idle,
            PointerState::Drawing { .. } => InteractionKind::Drawing,
            PointerState::Dragging { .. } => InteractionKind::Dragging,
            PointerState::Resizing { .. } => InteractionKind::Resizing,
        }
    }

    /// Current crop rect, if one has been drawn.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Replace the crop rect (e.g. from an interpolated pan position).
    ///
    /// Ignored while a gesture is in progress.
    pub fn set_rect(&mut self, rect: Option<Rect>) {
        if self.state == PointerState::Idle {
            self.rect = rect.map(|r| clamp_to_bounds(r, self.bounds.width, self.bounds.height));
        }
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Change the source bounds, re-clamping the current rect.
    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
        self.rect = self
            .rect
            .map(|r| clamp_to_bounds(r, bounds.width, bounds.height));
        self.state = PointerState::Idle;
    }

    /// Begin a gesture. Returns the resulting kind; presses while a gesture
    /// is already active are ignored.
    pub fn pointer_down(&mut self, px: f64, py: f64) -> InteractionKind {
        if self.state != PointerState::Idle {
            return self.kind();
        }

        self.state = match self.rect {
            Some(rect) => match hit_test_handle(px, py, &rect, self.handle_radius_px) {
                Handle::None if point_in_rect(px, py, &rect) => PointerState::Dragging {
                    grab_offset: (px - rect.x, py - rect.y),
                    original: rect,
                },
                Handle::None => PointerState::Drawing {
                    origin: (px, py),
                    previous: Some(rect),
                },
                handle => PointerState::Resizing {
                    handle,
                    start: (px, py),
                    original: rect,
                },
            },
            None => PointerState::Drawing {
                origin: (px, py),
                previous: None,
            },
        };
        self.kind()
    }

    /// Update the gesture. Returns the live rect while a gesture is active.
    pub fn pointer_move(&mut self, px: f64, py: f64) -> Option<Rect> {
        let bounds = self.bounds;
        let next = match self.state {
            PointerState::Idle => return None,
            PointerState::Drawing { origin, .. } => clamp_to_bounds(
                Rect::from_corners(origin.0, origin.1, px, py),
                bounds.width,
                bounds.height,
            ),
            PointerState::Dragging {
                grab_offset,
                original,
            } => clamp_to_bounds(
                Rect::new(
                    px - grab_offset.0,
                    py - grab_offset.1,
                    original.width,
                    original.height,
                ),
                bounds.width,
                bounds.height,
            ),
            PointerState::Resizing {
                handle,
                start,
                original,
            } => resize(handle, px - start.0, py - start.1, &original, bounds),
        };
        self.rect = Some(next);
        Some(next)
    }

    /// Finish the gesture and return to idle.
    ///
    /// A drawn rect smaller than the minimum dimension is discarded and the
    /// previous rect restored.
    pub fn pointer_up(&mut self, px: f64, py: f64) -> Option<Rect> {
        let finished = self.pointer_move(px, py);
        if let PointerState::Drawing { previous, .. } = self.state {
            let too_small = finished
                .map(|r| r.width < MIN_RECT_DIMENSION || r.height < MIN_RECT_DIMENSION)
                .unwrap_or(true);
            if too_small {
                self.rect = previous;
            }
        }
        self.state = PointerState::Idle;
        self.rect
    }

    /// Abort the gesture, restoring the rect from before the press.
    pub fn cancel(&mut self) {
        self.rect = match self.state {
            PointerState::Idle => self.rect,
            PointerState::Drawing { previous, .. } => previous,
            PointerState::Dragging { original, .. } | PointerState::Resizing { original, .. } => {
                Some(original)
            }
        };
        self.state = PointerState::Idle;
    }
}
