//! Test utilities for project trees.
//!
//! Builds a throwaway project root laid out the way the tools expect
//! (`media.json`, `media/<folder>/...`, `drugs.json`), so tests exercise
//! the real filesystem code paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{QrConfig, ReconcileConfig};
use crate::paths;

/// Temporary project root with an empty `media/` directory.
///
/// Everything is removed when the value is dropped.
pub struct TestTree {
    /// Temporary directory (kept alive for the lifetime of the tree)
    pub temp: TempDir,
}

impl TestTree {
    /// Create a project root containing an empty media directory.
    pub fn new() -> io::Result<Self> {
        let temp = TempDir::new()?;
        fs::create_dir(paths::media_dir(temp.path()))?;
        Ok(Self { temp })
    }

    /// Create a project root with nothing in it.
    pub fn empty() -> io::Result<Self> {
        Ok(Self {
            temp: TempDir::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Write `media.json` with the given contents.
    pub fn write_manifest(&self, json: &str) -> io::Result<()> {
        fs::write(paths::media_json_path(self.root()), json)
    }

    /// Current contents of `media.json`.
    pub fn manifest_text(&self) -> io::Result<String> {
        fs::read_to_string(paths::media_json_path(self.root()))
    }

    /// Create `media/<name>/` and return its path.
    pub fn add_folder(&self, name: &str) -> io::Result<PathBuf> {
        let dir = paths::media_dir(self.root()).join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Create `media/<folder>/<name>` (and the folder if needed).
    pub fn add_file(&self, folder: &str, name: &str) -> io::Result<()> {
        let dir = self.add_folder(folder)?;
        fs::write(dir.join(name), b"test")
    }

    /// Write `drugs.json` with the given contents.
    pub fn write_drugs(&self, json: &str) -> io::Result<()> {
        fs::write(paths::drugs_json_path(self.root()), json)
    }

    /// Reconciler defaults for this root.
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig::for_root(self.root())
    }

    /// QR defaults for this root.
    pub fn qr_config(&self) -> QrConfig {
        QrConfig::for_root(self.root())
    }
}
