//! Source and payload format detection.

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where an OCR document reference points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// An object in a Google Cloud Storage bucket (`gs://bucket/object`).
    GoogleStorage {
        /// Bucket name
        bucket: String,
        /// Object path inside the bucket
        object: String,
    },
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Local(path) => write!(f, "{}", path.display()),
            SourceKind::GoogleStorage { bucket, object } => write!(f, "gs://{}/{}", bucket, object),
        }
    }
}

/// Layout of a stored OCR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Already normalized pages with flat word lists.
    Normalized,
    /// Raw Google Vision `AnnotateImageResponse` list.
    Vision,
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadFormat::Normalized => write!(f, "normalized"),
            PayloadFormat::Vision => write!(f, "google-vision"),
        }
    }
}

/// Gzip magic bytes
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

const GCS_SCHEME: &str = "gs://";

/// Classify a document reference.
///
/// # Example
/// ```
/// use labscan::detect::{detect_source, SourceKind};
///
/// let kind = detect_source("gs://reports/2024/cbc.pdf").unwrap();
/// assert!(matches!(kind, SourceKind::GoogleStorage { .. }));
/// ```
pub fn detect_source(uri: &str) -> Result<SourceKind> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(Error::UnsupportedSource("empty source reference".to_string()));
    }

    if let Some(rest) = uri.strip_prefix(GCS_SCHEME) {
        let (bucket, object) = rest
            .split_once('/')
            .ok_or_else(|| Error::UnsupportedSource(format!("missing object path: {}", uri)))?;
        if bucket.is_empty() || object.is_empty() {
            return Err(Error::UnsupportedSource(format!("invalid storage uri: {}", uri)));
        }
        return Ok(SourceKind::GoogleStorage {
            bucket: bucket.to_string(),
            object: object.to_string(),
        });
    }

    if let Some((scheme, _)) = uri.split_once("://") {
        return Err(Error::UnsupportedSource(format!("unsupported scheme: {}", scheme)));
    }

    Ok(SourceKind::Local(PathBuf::from(uri)))
}

/// Detect the payload format of an already parsed JSON document.
pub fn detect_payload_format(value: &Value) -> Result<PayloadFormat> {
    match value {
        Value::Array(_) => Ok(PayloadFormat::Vision),
        Value::Object(map) if map.contains_key("responses") => Ok(PayloadFormat::Vision),
        Value::Object(map) if map.contains_key("pages") => Ok(PayloadFormat::Normalized),
        _ => Err(Error::UnknownFormat),
    }
}

/// Detect the payload format from raw (already decompressed) bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PayloadFormat> {
    let first = data
        .iter()
        .copied()
        .find(|b| !b.is_ascii_whitespace() && *b != 0xEF && *b != 0xBB && *b != 0xBF);
    if !matches!(first, Some(b'{') | Some(b'[')) {
        return Err(Error::UnknownFormat);
    }

    let value: Value = serde_json::from_slice(data).map_err(|_| Error::UnknownFormat)?;
    detect_payload_format(&value)
}

/// Detect the payload format of a file, decompressing gzip if needed.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PayloadFormat> {
    let data = crate::ocr::read_payload(path)?;
    detect_format_from_bytes(&data)
}

/// Check if bytes start with the gzip magic.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(GZIP_MAGIC)
}
