//! Panframe Common Utilities
//!
//! Shared infrastructure for all Panframe crates:
//! - Error types and result aliases
//! - Timecode formatting and parsing
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
