//! Panframe Processing Core
//!
//! Turns live pointer input into pan paths and pan paths into per-frame crops:
//! - **Recorder:** Capture timestamped crop rects while the media plays
//! - **Interaction:** Draw, drag and resize the crop rect with the pointer
//! - **Smoothing:** Moving-average filter over a recorded path
//! - **Interpolation:** Crop rect for an arbitrary media timestamp
//!
//! Pure computation; no I/O and no media dependencies.

pub mod interaction;
pub mod interpolate;
pub mod recorder;
pub mod smooth;

pub use interaction::{InteractionKind, PointerInteraction, PointerState};
pub use interpolate::interpolate;
pub use recorder::{KeyframeRecorder, RecorderState, ZoomDirection};
pub use smooth::{smooth, PathSmoother};
