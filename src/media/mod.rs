//! Media manifest reconciliation.
//!
//! A media tree is a directory whose immediate subdirectories are media
//! groups (one per drug). The manifest (`media.json`) lists, per group, the
//! image, video and audio files the site should show, plus external
//! YouTube links.
//!
//! # Reconciliation
//!
//! 1. **Discovery**: list the group folders under the media root
//! 2. **Scan**: classify each folder's files by extension, when needed
//! 3. **Normalize**: rewrite declared paths as `media/<folder>/<basename>`
//! 4. **Merge**: keep manifest-only groups, sort keys, write back

pub mod discovery;
pub mod manifest;
pub mod reconcile;

pub use discovery::{discover_folders, scan_folder, ScannedMedia};
pub use manifest::{Manifest, ManifestError, MediaEntry};
pub use reconcile::{reconcile, run, ReconcileReport};

use std::path::Path;

use crate::config::ExtensionSets;

/// Kind of media a file is classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Kinds in manifest field order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Image, MediaKind::Video, MediaKind::Audio];

    /// Manifest field name holding this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audio",
        }
    }

    /// Classify a file by its extension, case-insensitively.
    ///
    /// Images are checked first, then audio, then video. Files without an
    /// extension or with an unrecognized one return `None` and are dropped.
    pub fn classify(path: &Path, extensions: &ExtensionSets) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();

        if extensions.image.contains(&ext) {
            Some(MediaKind::Image)
        } else if extensions.audio.contains(&ext) {
            Some(MediaKind::Audio)
        } else if extensions.video.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}
