//! Panframe Render Engine
//!
//! Re-encodes source media with a dynamic crop applied per output frame.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ──▶ probe ──▶ trim / re-validate pan path ──▶ smooth (once)
//!                                                             │
//!                 ┌───────────────────────────────────────────┘
//!                 ▼
//!   static / none ──▶ ffmpeg crop+scale ─────────────────┐
//!   spotlight / max-size ──▶ decode RGBA                  │
//!                              │ interpolate(t)           │
//!                              ▼                          ▼
//!                           Compositor ──▶ encode ──▶ output.mp4 ──▶ playlist
//! ```

pub mod compositor;
pub mod export;
pub mod ffmpeg;
pub mod pipeline;
pub mod session;

pub use compositor::{output_size_for, static_crop_rect, Compositor};
pub use export::*;
pub use ffmpeg::FfmpegPipeline;
pub use pipeline::{
    AbortHandle, FrameTransform, MediaPipeline, SampleTransform, TrackInfo, TranscodePlan,
    VideoProcessing,
};
pub use session::{export_config_from_defaults, EditSession};
