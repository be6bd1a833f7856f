//! QR code generation for drug label links.
//!
//! Every identifier in `drugs.json` becomes a PNG named
//! `<identifier>_qrcode.png` encoding `<base_url><identifier>`:
//!
//! ```text
//! drugs.json            {"D001": {...}, "D002": {...}}
//! D001_qrcode.png  ->   https://.../drug.html?id=D001
//! D002_qrcode.png  ->   https://.../drug.html?id=D002
//! ```
//!
//! Identifiers are used verbatim in the URL and in the file name. The run
//! stops at the first failure; files already written are left in place.

use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{QrConfig, QR_MODULE_PIXELS};
use crate::paths;

/// Grayscale QR raster.
pub type QrImage = ImageBuffer<Luma<u8>, Vec<u8>>;

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub identifier: String,
    pub url: String,
    pub path: PathBuf,
}

/// Result of a generation run.
#[derive(Debug, Clone, Default)]
pub struct QrReport {
    pub generated: Vec<GeneratedCode>,
}

impl QrReport {
    pub fn count(&self) -> usize {
        self.generated.len()
    }
}

/// URL encoded for an identifier.
pub fn qr_url(base_url: &str, identifier: &str) -> String {
    format!("{base_url}{identifier}")
}

/// Read the identifier list.
///
/// Accepts a JSON object (its keys, in file order) or an array of strings.
pub fn load_identifiers(path: &Path) -> Result<Vec<String>, QrError> {
    if !path.is_file() {
        return Err(QrError::InputNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| QrError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_identifiers(&content, path)
}

/// Parse identifier JSON. `source` is only used for error messages.
pub fn parse_identifiers(content: &str, source: &Path) -> Result<Vec<String>, QrError> {
    let value: Value = serde_json::from_str(content).map_err(|e| QrError::Parse {
        path: source.to_path_buf(),
        source: e,
    })?;

    match value {
        Value::Object(map) => Ok(map.into_iter().map(|(key, _)| key).collect()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Ok(id),
                other => Err(QrError::InvalidIdentifier {
                    path: source.to_path_buf(),
                    value: other.to_string(),
                }),
            })
            .collect(),
        other => Err(QrError::UnsupportedFormat {
            path: source.to_path_buf(),
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rasterize `data` as a QR code.
///
/// Error correction level M, 10 pixel modules and a 4 module quiet zone,
/// black on white.
pub fn render_qr(data: &str) -> Result<QrImage, QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M).map_err(|e| {
        QrError::Encode {
            data: data.to_string(),
            source: e,
        }
    })?;

    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(QR_MODULE_PIXELS, QR_MODULE_PIXELS)
        .build())
}

/// Write one PNG per identifier into `output_dir`, overwriting existing
/// files. Stops at the first failure.
pub fn write_qr_codes(
    identifiers: &[String],
    base_url: &str,
    output_dir: &Path,
) -> Result<QrReport, QrError> {
    fs::create_dir_all(output_dir).map_err(|e| QrError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut report = QrReport::default();
    for identifier in identifiers {
        let url = qr_url(base_url, identifier);
        let filename = paths::qr_filename(identifier);
        let path = output_dir.join(&filename);

        let image = render_qr(&url)?;
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| QrError::Write {
                path: path.clone(),
                source: e,
            })?;

        tracing::info!("Generated {} → {}", filename, url);
        report.generated.push(GeneratedCode {
            identifier: identifier.clone(),
            url,
            path,
        });
    }

    Ok(report)
}

/// Generate QR codes for every identifier in the configured list.
pub fn generate_qr_codes(config: &QrConfig) -> Result<QrReport, QrError> {
    let identifiers = load_identifiers(&config.identifiers_path)?;
    tracing::debug!(
        "Loaded {} identifiers from {}",
        identifiers.len(),
        config.identifiers_path.display()
    );

    write_qr_codes(&identifiers, &config.base_url, &config.output_dir)
}

/// QR generation errors.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("Identifier list not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to read/parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Expected a JSON object or array in {}, found {found}", path.display())]
    UnsupportedFormat { path: PathBuf, found: &'static str },

    #[error("Identifier in {} is not a string: {value}", path.display())]
    InvalidIdentifier { path: PathBuf, value: String },

    #[error("Failed to encode QR code for {data}: {source}")]
    Encode {
        data: String,
        source: qrcode::types::QrError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
}
