//! Biomarker analysis of OCR reports.

mod engine;
mod options;

pub use engine::{BiomarkerDetector, PageDetection};
pub use options::AnalyzeOptions;

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;

use crate::error::Result;
use crate::matcher::{Dictionary, Matchers};
use crate::model::{Measurement, Page, PageAlignments, Report, Warning};
use crate::ocr::{FileProvider, OcrProvider};

/// Result of analyzing a set of pages.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub measurements: Vec<Measurement>,
    pub warnings: Vec<Warning>,
    pub alignments: Vec<PageAlignments>,
}

/// Loads OCR reports and detects biomarker measurements in them.
///
/// # Example
///
/// ```no_run
/// use labscan::Analyzer;
///
/// let analyzer = Analyzer::new();
/// let report = analyzer.from_file("report.json", true)?;
/// for m in report.measurements() {
///     println!("{} = {} {}", m.biomarker_id, m.value, m.unit);
/// }
/// # Ok::<(), labscan::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    matchers: Matchers,
    options: AnalyzeOptions,
}

impl Analyzer {
    /// Create an analyzer with the built-in dictionary and default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom matchers.
    pub fn with_matchers(mut self, matchers: Matchers) -> Self {
        self.matchers = matchers;
        self
    }

    /// Use a custom dictionary for names and units.
    pub fn with_dictionary(self, dictionary: Dictionary) -> Self {
        self.with_matchers(Matchers::from_dictionary(dictionary))
    }

    /// Set analysis options.
    pub fn with_options(mut self, options: AnalyzeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn matchers(&self) -> &Matchers {
        &self.matchers
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Preprocess all pages in place.
    pub fn preprocess(&self, pages: &mut [Page]) {
        let layout = &self.options.layout;
        if self.options.parallel {
            pages.par_iter_mut().for_each(|page| page.preprocess(layout));
        } else {
            pages.iter_mut().for_each(|page| page.preprocess(layout));
        }
    }

    /// Detect measurements on preprocessed pages without touching a report.
    ///
    /// Measurements and warnings are concatenated in page order.
    pub fn analyze_pages(&self, pages: &[Page]) -> Analysis {
        let detections = BiomarkerDetector::new(&self.matchers, &self.options).detect_pages(pages);

        let mut analysis = Analysis::default();
        for detection in detections {
            analysis.measurements.extend(detection.measurements);
            analysis.warnings.extend(detection.warnings);
            analysis.alignments.push(detection.alignments);
        }
        analysis
    }

    /// Analyze a report in place.
    ///
    /// Pages are preprocessed first (once; later calls reuse the grouping).
    /// Previous results are replaced, so analyzing twice yields the same
    /// measurements and warnings.
    pub fn analyze(&self, report: &mut Report) {
        let start = Instant::now();

        self.preprocess(&mut report.pages);
        let analysis = self.analyze_pages(&report.pages);

        log::info!(
            "Analyzed {} pages: {} measurements, {} warnings in {:.2?}",
            report.pages.len(),
            analysis.measurements.len(),
            analysis.warnings.len(),
            start.elapsed()
        );

        report.measurements = Some(analysis.measurements);
        report.metadata.warnings = Some(analysis.warnings).filter(|w| !w.is_empty());
        report.metadata.alignments = if self.options.compute_alignments {
            Some(analysis.alignments)
        } else {
            None
        };
        report.metadata.page_count = report.pages.len() as u32;
        report.metadata.analyzed_at = Some(Utc::now());
    }

    /// Build a report from an OCR provider, optionally analyzing it.
    pub fn from_source(
        &self,
        provider: &dyn OcrProvider,
        source: &str,
        analyze: bool,
    ) -> Result<Report> {
        let scan = provider.scan_pages(source).inspect_err(|e| {
            log::error!("OCR failed for {}: {}", source, e);
        })?;

        let mut report = Report::with_metadata(scan.pages, scan.metadata)?.with_source(source);
        if analyze {
            self.analyze(&mut report);
        }
        Ok(report)
    }

    /// Build a report from OCR output stored in a file.
    pub fn from_file<P: AsRef<Path>>(&self, path: P, analyze: bool) -> Result<Report> {
        let source = path.as_ref().to_string_lossy();
        self.from_source(&FileProvider::new(), &source, analyze)
    }

    /// Build a report from an in-memory OCR payload.
    pub fn from_bytes(&self, data: &[u8], analyze: bool) -> Result<Report> {
        let scan = crate::ocr::scan_bytes(data)?;
        let mut report = Report::with_metadata(scan.pages, scan.metadata)?;
        if analyze {
            self.analyze(&mut report);
        }
        Ok(report)
    }

    /// Build a report from a stored OCR file without blocking the runtime.
    #[cfg(feature = "async")]
    pub async fn from_source_async<P: AsRef<Path>>(&self, path: P, analyze: bool) -> Result<Report> {
        let source = path.as_ref().to_string_lossy().into_owned();
        let data = tokio::fs::read(path.as_ref()).await?;

        let analyzer = self.clone();
        let report = tokio::task::spawn_blocking(move || -> Result<Report> {
            let report = analyzer.from_bytes(&data, analyze)?;
            Ok(report.with_source(source))
        })
        .await
        .map_err(|e| crate::Error::Other(format!("analysis task failed: {}", e)))??;

        Ok(report)
    }
}

impl Report {
    /// Analyze this report with the built-in dictionary and default options.
    pub fn analyze(&mut self) {
        Analyzer::new().analyze(self);
    }
}
