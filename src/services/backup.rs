//! Backup copies of files about to be overwritten.
//!
//! A backup is a byte-for-byte copy placed next to the original, named by
//! appending a suffix to the full file name:
//!
//! ```text
//! media.json      # rewritten
//! media.json.bak  # previous contents
//! ```
//!
//! An existing backup is replaced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths;

/// Copy `path` to its backup location and return that location.
pub fn create_backup(path: &Path, suffix: &str) -> io::Result<PathBuf> {
    let backup = paths::backup_path(path, suffix);
    fs::copy(path, &backup)?;
    tracing::info!("Backup created: {}", backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_backup_copies_bytes() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("media.json");
        fs::write(&original, "{\"a\": {}}\u{00e9}").unwrap();

        let backup = create_backup(&original, ".bak").unwrap();

        assert_eq!(backup, temp.path().join("media.json.bak"));
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&original).unwrap());
    }

    #[test]
    fn test_create_backup_replaces_previous() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("media.json");
        fs::write(temp.path().join("media.json.bak"), "old").unwrap();
        fs::write(&original, "new").unwrap();

        create_backup(&original, ".bak").unwrap();

        let backup = fs::read_to_string(temp.path().join("media.json.bak")).unwrap();
        assert_eq!(backup, "new");
    }

    #[test]
    fn test_create_backup_missing_source() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("media.json");

        assert!(create_backup(&original, ".bak").is_err());
        assert!(!temp.path().join("media.json.bak").exists());
    }
}
