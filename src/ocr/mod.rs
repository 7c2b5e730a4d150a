//! OCR provider boundary.
//!
//! Providers turn a document reference into normalized [`Page`]s. The
//! bundled [`FileProvider`] reads OCR output that was stored on disk, either
//! raw Google Vision responses or already normalized pages, optionally
//! gzip-compressed.

mod normalized;
mod vision;

pub use normalized::parse_normalized;
pub use vision::normalize_vision_responses;

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::detect::{detect_payload_format, detect_source, is_gzip, PayloadFormat, SourceKind};
use crate::error::{Error, Result};
use crate::model::Page;

/// Pages produced by an OCR provider.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Normalized pages, in document order
    pub pages: Vec<Page>,
    /// Provider-specific metadata carried into the report
    pub metadata: Value,
}

/// A source of OCR pages.
pub trait OcrProvider: Send + Sync {
    /// Run (or load) OCR for the referenced document.
    fn scan_pages(&self, source: &str) -> Result<ScanResult>;
}

/// Loads stored OCR output from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileProvider;

impl FileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl OcrProvider for FileProvider {
    fn scan_pages(&self, source: &str) -> Result<ScanResult> {
        match detect_source(source)? {
            SourceKind::Local(path) => {
                let data = read_payload(&path)?;
                let mut scan = scan_bytes(&data)?;
                if let Value::Object(map) = &mut scan.metadata {
                    map.insert("file".to_string(), Value::String(path.display().to_string()));
                }
                Ok(scan)
            }
            kind @ SourceKind::GoogleStorage { .. } => Err(Error::UnsupportedSource(format!(
                "{} requires a cloud OCR provider",
                kind
            ))),
        }
    }
}

/// Read a payload file, transparently decompressing gzip.
pub fn read_payload<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let data = fs::read(path.as_ref())?;
    decompress(data)
}

fn decompress(data: Vec<u8>) -> Result<Vec<u8>> {
    if !is_gzip(&data) {
        return Ok(data);
    }
    let mut decoder = GzDecoder::new(data.as_slice());
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    log::debug!("Decompressed OCR payload: {} -> {} bytes", data.len(), out.len());
    Ok(out)
}

/// Normalize an OCR payload held in memory (JSON, optionally gzipped).
pub fn scan_bytes(data: &[u8]) -> Result<ScanResult> {
    let data = decompress(data.to_vec())?;
    let value: Value = serde_json::from_slice(&data)?;
    scan_value(value)
}

/// Normalize an already parsed OCR payload.
pub fn scan_value(value: Value) -> Result<ScanResult> {
    let format = detect_payload_format(&value)?;
    log::debug!("OCR payload format: {}", format);

    let (pages, mut metadata) = match format {
        PayloadFormat::Vision => (normalize_vision_responses(value)?, Value::Null),
        PayloadFormat::Normalized => parse_normalized(value)?,
    };

    let mut map = match metadata.take() {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("provider".to_string(), other);
            map
        }
    };
    map.insert("format".to_string(), Value::String(format.to_string()));

    Ok(ScanResult {
        pages,
        metadata: Value::Object(map),
    })
}

/// Round a confidence to three decimals.
pub(crate) fn round_confidence(confidence: f32) -> f32 {
    (confidence * 1000.0).round() / 1000.0
}
