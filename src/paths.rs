//! Project path functions - single source of truth for all file paths.
//!
//! Every default location is resolved against a project root. The root is
//! the working directory unless overridden.
//!
//! ## Environment Variables
//!
//! - `PROJECT_ROOT`: Override the project root (default: ".")
//!
//! The `--root` flag takes priority over the environment variable:
//! ```bash
//! PROJECT_ROOT=site cargo run -- media
//! cargo run -- --root site qr
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Lazily initialized project root from PROJECT_ROOT env var
static PROJECT_ROOT_VALUE: OnceLock<String> = OnceLock::new();

/// Get the default project root (from PROJECT_ROOT env var or ".")
pub fn project_root() -> &'static str {
    PROJECT_ROOT_VALUE
        .get_or_init(|| env::var("PROJECT_ROOT").unwrap_or_else(|_| ".".to_string()))
}

/// Optional TOML config file name, looked up in the project root
pub const CONFIG_FILE: &str = "config.toml";

/// Drug identifier list file name
pub const DRUGS_JSON: &str = "drugs.json";

/// Media manifest file name
pub const MEDIA_JSON: &str = "media.json";

/// Media root directory name
pub const MEDIA_DIR: &str = "media";

// ==================== Rooted Paths ====================

/// Config file path under a root
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Drug identifier list path under a root
pub fn drugs_json_path(root: &Path) -> PathBuf {
    root.join(DRUGS_JSON)
}

/// QR output directory (the root itself, like the identifier list)
pub fn qr_output_dir(root: &Path) -> PathBuf {
    root.to_path_buf()
}

/// Media manifest path under a root
pub fn media_json_path(root: &Path) -> PathBuf {
    root.join(MEDIA_JSON)
}

/// Media root directory under a root
pub fn media_dir(root: &Path) -> PathBuf {
    root.join(MEDIA_DIR)
}

/// Backup path for a file: the full file name with `suffix` appended.
///
/// `media.json` + `.bak` becomes `media.json.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Output file name for a generated QR code
pub fn qr_filename(identifier: &str) -> String {
    format!("{identifier}_qrcode.png")
}

// ==================== Tests ====================
