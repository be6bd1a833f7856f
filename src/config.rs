//! Application configuration.
//!
//! Defaults reproduce the fixed values the tools have always used. Each
//! value can be overridden with priority: CLI flag > config.toml > .env /
//! environment > default. CLI flags are applied by the binary on top of
//! the structures built here.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

// ==================== QR Configuration ====================

/// URL prefix every identifier is appended to
pub const DEFAULT_BASE_URL: &str = "https://SamarthBabanagar.github.io/Drug/drug.html?id=";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "QR_BASE_URL";

/// Pixel size of one QR module
pub const QR_MODULE_PIXELS: u32 = 10;

// ==================== Media Configuration ====================

/// Recognized image extensions (lowercase, no dot)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Recognized audio extensions (lowercase, no dot)
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "ogg", "m4a", "flac"];

/// Recognized video extensions (lowercase, no dot)
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "webm", "mov", "mkv", "avi"];

/// Suffix appended to the manifest file name for the backup copy
pub const BACKUP_SUFFIX: &str = ".bak";

/// First segment of every path written into the manifest
pub const PATH_PREFIX: &str = "media";

/// Extension sets used to classify files found in media folders.
///
/// Entries are stored lowercase without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSets {
    pub image: Vec<String>,
    pub audio: Vec<String>,
    pub video: Vec<String>,
}

impl Default for ExtensionSets {
    fn default() -> Self {
        Self {
            image: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            audio: AUDIO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            video: VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ExtensionSets {
    /// Build a set list from user input, accepting `.PNG`, `png`, `Png`, ...
    pub fn normalize(list: &[String]) -> Vec<String> {
        list.iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Settings for the QR generator.
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Prefix the identifier is appended to
    pub base_url: String,
    /// JSON file listing the identifiers
    pub identifiers_path: PathBuf,
    /// Directory the PNG files are written to
    pub output_dir: PathBuf,
}

impl QrConfig {
    /// Defaults for a project root.
    pub fn for_root(root: &Path) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            identifiers_path: paths::drugs_json_path(root),
            output_dir: paths::qr_output_dir(root),
        }
    }
}

/// Settings for the media manifest reconciler.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Manifest read and rewritten in place
    pub manifest_path: PathBuf,
    /// Directory whose immediate subdirectories are media groups
    pub media_dir: PathBuf,
    /// Suffix for the backup copy of the manifest
    pub backup_suffix: String,
    /// Prefix of every normalized path (`<prefix>/<folder>/<basename>`)
    pub path_prefix: String,
    pub extensions: ExtensionSets,
}

impl ReconcileConfig {
    /// Defaults for a project root.
    pub fn for_root(root: &Path) -> Self {
        Self {
            manifest_path: paths::media_json_path(root),
            media_dir: paths::media_dir(root),
            backup_suffix: BACKUP_SUFFIX.to_string(),
            path_prefix: PATH_PREFIX.to_string(),
            extensions: ExtensionSets::default(),
        }
    }
}

// ==================== config.toml ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    qr: Option<QrSection>,
    media: Option<MediaSection>,
}

#[derive(Debug, Default, Deserialize)]
struct QrSection {
    base_url: Option<String>,
    input: Option<String>,
    output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaSection {
    manifest: Option<String>,
    media_dir: Option<String>,
    backup_suffix: Option<String>,
    path_prefix: Option<String>,
    extensions: Option<ExtensionSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtensionSection {
    image: Option<Vec<String>>,
    audio: Option<Vec<String>>,
    video: Option<Vec<String>>,
}

/// Read config.toml if present. A missing file is not an error; an
/// unparseable one is reported and ignored.
fn read_app_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return AppConfig::default(),
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => {
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("Ignoring invalid {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

/// Resolve a configured path against the project root.
fn rooted(root: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Load QR settings with priority: config.toml > environment > default.
///
/// `config_file` defaults to `<root>/config.toml`.
pub fn load_qr_config(root: &Path, config_file: Option<&Path>) -> QrConfig {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::config_path(root));
    let section = read_app_config(&file).qr.unwrap_or_default();

    let mut config = QrConfig::for_root(root);

    // config.toml first, then environment
    if let Some(base_url) = section.base_url {
        tracing::info!("Using base URL from {}: {}", file.display(), base_url);
        config.base_url = base_url;
    } else if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        tracing::info!("Using base URL from {} env: {}", BASE_URL_ENV, base_url);
        config.base_url = base_url;
    }

    if let Some(input) = section.input {
        config.identifiers_path = rooted(root, &input);
    }
    if let Some(output_dir) = section.output_dir {
        config.output_dir = rooted(root, &output_dir);
    }

    config
}

/// Load reconciler settings with priority: config.toml > default.
///
/// `config_file` defaults to `<root>/config.toml`.
pub fn load_reconcile_config(root: &Path, config_file: Option<&Path>) -> ReconcileConfig {
    let file = config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::config_path(root));
    let section = read_app_config(&file).media.unwrap_or_default();

    let mut config = ReconcileConfig::for_root(root);

    if let Some(manifest) = section.manifest {
        config.manifest_path = rooted(root, &manifest);
    }
    if let Some(media_dir) = section.media_dir {
        config.media_dir = rooted(root, &media_dir);
    }
    if let Some(suffix) = section.backup_suffix.filter(|s| !s.is_empty()) {
        config.backup_suffix = suffix;
    }
    if let Some(prefix) = section.path_prefix {
        config.path_prefix = prefix.trim_matches('/').to_string();
    }
    if let Some(ext) = section.extensions {
        if let Some(image) = ext.image {
            config.extensions.image = ExtensionSets::normalize(&image);
        }
        if let Some(audio) = ext.audio {
            config.extensions.audio = ExtensionSets::normalize(&audio);
        }
        if let Some(video) = ext.video {
            config.extensions.video = ExtensionSets::normalize(&video);
        }
    }

    config
}
