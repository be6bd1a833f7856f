//! Manifest parsing and serialization.
//!
//! `media.json` maps a folder name to the media listed for it:
//!
//! ```json
//! {
//!   "drug1": {
//!     "images": ["media/drug1/front.png"],
//!     "videos": [],
//!     "audio": ["media/drug1/dosage.mp3"],
//!     "youtube": ["https://youtu.be/abc"]
//!   }
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::MediaKind;

/// One manifest record.
///
/// Missing and `null` lists both read as empty; every list is always
/// written, so the output never omits a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub videos: Vec<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub audio: Vec<String>,

    /// External links, passed through untouched
    #[serde(default, deserialize_with = "null_as_empty")]
    pub youtube: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MediaEntry {
    /// Items listed for a kind.
    pub fn items(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
            MediaKind::Audio => &self.audio,
        }
    }

    /// Replace the items listed for a kind.
    pub fn set_items(&mut self, kind: MediaKind, items: Vec<String>) {
        match kind {
            MediaKind::Image => self.images = items,
            MediaKind::Video => self.videos = items,
            MediaKind::Audio => self.audio = items,
        }
    }
}

/// The whole manifest, keyed by folder name.
///
/// Keys are kept in a `BTreeMap`, so serialization is always sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: BTreeMap<String, MediaEntry>,
}

impl Manifest {
    /// Parse manifest JSON. `source` is only used for error messages.
    pub fn parse(content: &str, source: &Path) -> Result<Self, ManifestError> {
        serde_json::from_str(content).map_err(|e| ManifestError::Parse {
            path: source.to_path_buf(),
            source: e,
        })
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::ManifestNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    pub fn get(&self, key: &str) -> Option<&MediaEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: MediaEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Pretty JSON with two-space indentation and no trailing newline.
    /// Non-ASCII text is written as-is.
    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)
    }

    /// Write the manifest to `path`, replacing its contents.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Manifest reconciliation errors.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Media directory not found: {}", .0.display())]
    MediaDirNotFound(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to read/parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Serialize(serde_json::Error),

    #[error("Failed to back up {}: {source}", path.display())]
    Backup { path: PathBuf, source: io::Error },
}
