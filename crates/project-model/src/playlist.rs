//! In-memory playlist of exported clips.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A finished export that made it into the playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Display name (file name without directory).
    pub name: String,
    /// Location of the encoded file.
    pub path: PathBuf,
    /// Clip duration in seconds.
    pub duration_secs: f64,
    /// Encoded frame width.
    pub width: u32,
    /// Encoded frame height.
    pub height: u32,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Ordered list of exported clips. Only successful exports are added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PlaylistEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the entry with the given name.
    pub fn remove(&mut self, name: &str) -> Option<PlaylistEntry> {
        let idx = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(idx))
    }

    /// Total playable duration of all entries.
    pub fn total_duration_secs(&self) -> f64 {
        self.entries.iter().map(|e| e.duration_secs).sum()
    }

    /// A name not yet used by any entry, derived from `base`.
    pub fn unique_name(&self, base: &str, extension: &str) -> String {
        let candidate = format!("{base}.{extension}");
        if !self.entries.iter().any(|e| e.name == candidate) {
            return candidate;
        }
        (2..)
            .map(|n| format!("{base}-{n}.{extension}"))
            .find(|name| !self.entries.iter().any(|e| &e.name == name))
            .unwrap_or(candidate)
    }
}
