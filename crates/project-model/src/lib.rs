//! Panframe Project Model
//!
//! Defines the core data contracts for dynamic-crop editing:
//! - **Geometry:** Crop rectangles, resize handles, display/source scaling
//! - **Keyframes:** Timestamped crop samples forming a pan path
//! - **Export:** Crop mode, trim range, and per-export settings
//! - **Playlist:** In-memory list of finished clips
//!
//! All rectangles are in source-pixel coordinates of the decoded video.

pub mod export;
pub mod geometry;
pub mod keyframe;
pub mod playlist;

pub use export::*;
pub use geometry::*;
pub use keyframe::*;
pub use playlist::*;
