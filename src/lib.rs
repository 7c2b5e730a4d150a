//! # labscan
//!
//! Biomarker extraction from OCR-scanned laboratory reports.
//!
//! This library takes the words an OCR service recognized on the pages of a
//! lab report, groups them into printed lines and turns lines such as
//! `Glucose  95  mg/dL  (70-100)` into structured measurements normalized to
//! a canonical unit, with data-quality warnings for what could not be read.
//!
//! ## Quick Start
//!
//! ```no_run
//! use labscan::{analyze_file, render};
//!
//! fn main() -> labscan::Result<()> {
//!     // Load stored OCR output and detect biomarkers
//!     let report = analyze_file("report.json")?;
//!
//!     for m in report.measurements() {
//!         println!("{}: {} {}", m.biomarker_id, m.value, m.unit);
//!     }
//!
//!     // Inspect what OCR saw on the first page
//!     let html = render::to_html(&report, 1, &render::HtmlOptions::default())?;
//!     std::fs::write("page1.html", html)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **OCR input**: Google Vision responses or normalized word lists, gzip aware
//! - **Layout**: word cleanup, phrase merging and line grouping
//! - **Matching**: pluggable biomarker, unit, value and range classifiers
//! - **Unit conversion**: values and ranges normalized to canonical units
//! - **Warnings**: unprocessed biomarker names (E001), missing units (E002)
//! - **Parallel processing**: Uses Rayon for multi-page reports

pub mod analyze;
pub mod detect;
pub mod error;
pub mod layout;
pub mod matcher;
pub mod model;
pub mod ocr;
pub mod render;

// Re-export commonly used types
pub use analyze::{Analysis, AnalyzeOptions, Analyzer, BiomarkerDetector};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_gzip, PayloadFormat};
pub use error::{Error, Result};
pub use layout::{get_bounding_box_alignments, LayoutOptions};
pub use matcher::{
    BiomarkerMatch, BiomarkerMatcher, Dictionary, Matchers, NumericParser, ParsedValue,
    RangeParser, UnitMatch, UnitMatcher, ValueParser,
};
pub use model::{
    merge_bounding_boxes, Alignment, Biomarker, BoundingBox, Line, Measurement, Metadata, Page,
    Point, Range, Report, TextBreak, UnitConversion, Warning, WarningCode, Word,
};
pub use ocr::{FileProvider, OcrProvider, ScanResult};
pub use render::{HtmlOptions, JsonFormat};

use std::path::Path;

/// Load stored OCR output without analyzing it.
///
/// # Example
///
/// ```no_run
/// use labscan::load_file;
///
/// let report = load_file("report.json").unwrap();
/// println!("Pages: {}", report.page_count());
/// ```
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Report> {
    Analyzer::new().from_file(path, false)
}

/// Load stored OCR output and detect biomarkers with the built-in dictionary.
///
/// # Example
///
/// ```no_run
/// use labscan::analyze_file;
///
/// let report = analyze_file("report.json.gz").unwrap();
/// println!("Found {} measurements", report.measurements().len());
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<Report> {
    Analyzer::new().from_file(path, true)
}

/// Load stored OCR output and detect biomarkers with custom options.
pub fn analyze_file_with_options<P: AsRef<Path>>(
    path: P,
    options: AnalyzeOptions,
) -> Result<Report> {
    Analyzer::new().with_options(options).from_file(path, true)
}

/// Analyze an in-memory OCR payload.
///
/// # Example
///
/// ```no_run
/// use labscan::analyze_bytes;
///
/// let data = std::fs::read("report.json").unwrap();
/// let report = analyze_bytes(&data).unwrap();
/// ```
pub fn analyze_bytes(data: &[u8]) -> Result<Report> {
    Analyzer::new().from_bytes(data, true)
}

/// Analyze already normalized pages.
pub fn analyze_pages(pages: Vec<Page>) -> Result<Report> {
    let mut report = Report::new(pages)?;
    Analyzer::new().analyze(&mut report);
    Ok(report)
}

/// Analyze stored OCR output and render the report as JSON.
///
/// # Example
///
/// ```no_run
/// use labscan::{to_json, JsonFormat};
///
/// let json = to_json("report.json", JsonFormat::Pretty).unwrap();
/// std::fs::write("measurements.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let report = analyze_file(path)?;
    render::to_json(&report, format)
}

/// Analyze stored OCR output and summarize it as plain text.
pub fn to_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let report = analyze_file(path)?;
    render::to_text(&report)
}

/// Builder for loading and analyzing lab reports.
///
/// # Example
///
/// ```no_run
/// use labscan::Labscan;
///
/// let json = Labscan::new()
///     .with_dictionary_path("biomarkers.json")?
///     .sequential()
///     .open("report.json")?
///     .to_json(labscan::JsonFormat::Pretty)?;
/// # Ok::<(), labscan::Error>(())
/// ```
pub struct Labscan {
    analyzer: Analyzer,
    options: AnalyzeOptions,
    analyze: bool,
}

impl Labscan {
    /// Create a new builder with the built-in dictionary.
    pub fn new() -> Self {
        Self {
            analyzer: Analyzer::new(),
            options: AnalyzeOptions::default(),
            analyze: true,
        }
    }

    /// Use a custom dictionary.
    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.analyzer = self.analyzer.with_dictionary(dictionary);
        self
    }

    /// Load a custom dictionary from a JSON file.
    pub fn with_dictionary_path<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let dictionary = Dictionary::from_path(path)?;
        Ok(self.with_dictionary(dictionary))
    }

    /// Use custom matchers.
    pub fn with_matchers(mut self, matchers: Matchers) -> Self {
        self.analyzer = self.analyzer.with_matchers(matchers);
        self
    }

    /// Set analysis options.
    pub fn with_options(mut self, options: AnalyzeOptions) -> Self {
        self.options = options;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.with_parallel(false);
        self
    }

    /// Only load and normalize pages; skip biomarker detection.
    pub fn load_only(mut self) -> Self {
        self.analyze = false;
        self
    }

    /// Load stored OCR output from a file.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<LabscanResult> {
        let report = self
            .analyzer
            .with_options(self.options)
            .from_file(path, self.analyze)?;
        Ok(LabscanResult { report })
    }

    /// Load an in-memory OCR payload.
    pub fn open_bytes(self, data: &[u8]) -> Result<LabscanResult> {
        let report = self
            .analyzer
            .with_options(self.options)
            .from_bytes(data, self.analyze)?;
        Ok(LabscanResult { report })
    }

    /// Load from an OCR provider.
    pub fn scan(self, provider: &dyn OcrProvider, source: &str) -> Result<LabscanResult> {
        let report = self
            .analyzer
            .with_options(self.options)
            .from_source(provider, source, self.analyze)?;
        Ok(LabscanResult { report })
    }
}

impl Default for Labscan {
    fn default() -> Self {
        Self::new()
    }
}

/// A loaded report with rendering shortcuts.
pub struct LabscanResult {
    /// The loaded report
    pub report: Report,
}

impl LabscanResult {
    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.report, format)
    }

    /// Summarize as plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.report)
    }

    /// Render the debug view of a page (1-indexed).
    pub fn to_html(&self, page_number: u32, options: &HtmlOptions) -> Result<String> {
        render::to_html(&self.report, page_number, options)
    }

    /// Get the report.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Take the report.
    pub fn into_report(self) -> Report {
        self.report
    }
}
