//! Media folder discovery - scanning the media root for group folders and
//! classifying the files inside them.

use std::fs;
use std::path::Path;

use super::{ManifestError, MediaKind};
use crate::config::ExtensionSets;

/// File names found in one folder, split by kind, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedMedia {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub audio: Vec<String>,
}

impl ScannedMedia {
    /// File names found for a kind.
    pub fn names(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
            MediaKind::Audio => &self.audio,
        }
    }
}

/// List the immediate subdirectories of the media root, sorted by name.
///
/// Plain files in the root are ignored. Folder names that are not valid
/// UTF-8 cannot become manifest keys and are skipped with a warning.
pub fn discover_folders(media_dir: &Path) -> Result<Vec<String>, ManifestError> {
    if !media_dir.is_dir() {
        return Err(ManifestError::MediaDirNotFound(media_dir.to_path_buf()));
    }

    let entries = fs::read_dir(media_dir).map_err(|e| ManifestError::Io {
        path: media_dir.to_path_buf(),
        source: e,
    })?;

    let mut folders = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ManifestError::Io {
            path: media_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => folders.push(name),
            Err(name) => {
                tracing::warn!("Skipping media folder with non UTF-8 name: {:?}", name);
            }
        }
    }

    folders.sort();
    Ok(folders)
}

/// Classify the regular files of one folder by extension.
///
/// Files are visited in name order. Subdirectories and files with an
/// unrecognized extension are dropped silently.
pub fn scan_folder(
    dir: &Path,
    extensions: &ExtensionSets,
) -> Result<ScannedMedia, ManifestError> {
    let entries = fs::read_dir(dir).map_err(|e| ManifestError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ManifestError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => {
                tracing::warn!(
                    "Skipping file with non UTF-8 name in {}: {:?}",
                    dir.display(),
                    name
                );
            }
        }
    }
    names.sort();

    let mut scanned = ScannedMedia::default();
    for name in names {
        match MediaKind::classify(Path::new(&name), extensions) {
            Some(MediaKind::Image) => scanned.images.push(name),
            Some(MediaKind::Video) => scanned.videos.push(name),
            Some(MediaKind::Audio) => scanned.audio.push(name),
            None => tracing::debug!("Ignoring unrecognized file {}/{}", dir.display(), name),
        }
    }

    Ok(scanned)
}
