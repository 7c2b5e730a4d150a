//! Error types for labscan library.

use std::io;
use thiserror::Error;

/// Result type alias for labscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading and analyzing lab reports.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A report was constructed without any page.
    #[error("Report has no pages")]
    EmptyReport,

    /// Page number is out of range.
    #[error("Page {0} is out of range (report has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The payload is not a recognized OCR format.
    #[error("Unknown format: not a recognized OCR payload")]
    UnknownFormat,

    /// The document reference cannot be handled by the provider.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The OCR service reported an error for a page.
    #[error("OCR service error: {0}")]
    OcrService(String),

    /// The OCR response is missing expected fields or has invalid values.
    #[error("Malformed OCR response: {0}")]
    MalformedOcr(String),

    /// The biomarker dictionary could not be loaded.
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    /// Error during rendering (HTML, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
