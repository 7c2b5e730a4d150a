//! Report-level types.

use super::{Alignment, BoundingBox, Measurement, Page};
use crate::error::{Error, Result};
use crate::render::{self, HtmlOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scanned lab report: OCR pages plus the measurements found on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Pages in the report (never empty)
    pub pages: Vec<Page>,

    /// Measurements detected by analysis, absent until analyzed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Vec<Measurement>>,

    /// Report metadata
    pub metadata: Metadata,
}

impl Report {
    /// Create a report from OCR pages.
    ///
    /// Fails with [`Error::EmptyReport`] when `pages` is empty.
    pub fn new(pages: Vec<Page>) -> Result<Self> {
        Self::with_metadata(pages, Value::Null)
    }

    /// Create a report carrying extra metadata from the OCR provider.
    pub fn with_metadata(pages: Vec<Page>, extras: Value) -> Result<Self> {
        if pages.is_empty() {
            return Err(Error::EmptyReport);
        }

        let metadata = Metadata {
            page_count: pages.len() as u32,
            extras,
            ..Default::default()
        };

        Ok(Self {
            pages,
            measurements: None,
            metadata,
        })
    }

    /// Set the document reference the report was scanned from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    /// Get the number of pages in the report.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Check if analysis has run on this report.
    pub fn is_analyzed(&self) -> bool {
        self.measurements.is_some()
    }

    /// Detected measurements (empty before analysis).
    pub fn measurements(&self) -> &[Measurement] {
        self.measurements.as_deref().unwrap_or_default()
    }

    /// Data-quality warnings collected during analysis.
    pub fn warnings(&self) -> &[Warning] {
        self.metadata.warnings.as_deref().unwrap_or_default()
    }

    /// First measurement for a biomarker id.
    pub fn measurement(&self, biomarker_id: &str) -> Option<&Measurement> {
        self.measurements()
            .iter()
            .find(|m| m.biomarker_id == biomarker_id)
    }

    /// Warnings with the given code.
    pub fn warnings_with_code(&self, code: WarningCode) -> impl Iterator<Item = &Warning> {
        self.warnings().iter().filter(move |w| w.code == code)
    }

    /// Render an HTML page with the word boxes of one page (1-indexed).
    ///
    /// Fails with [`Error::PageOutOfRange`] if the page does not exist.
    pub fn render_debug_view(&self, page_number: u32) -> Result<String> {
        render::to_html(self, page_number, &HtmlOptions::default())
    }
}

/// Report metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document reference the OCR was run on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// When analysis last ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,

    /// Total number of pages
    pub page_count: u32,

    /// Data-quality warnings, present only when analysis produced some
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<Warning>>,

    /// Column alignments per page, computed during analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignments: Option<Vec<PageAlignments>>,

    /// Extra metadata reported by the OCR provider
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extras: Value,
}

/// Warning codes reported by analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCode {
    /// A word looked like a biomarker name but produced no measurement
    #[serde(rename = "E001")]
    UnprocessedBiomarker,
    /// A measurement was produced without a recognizable unit
    #[serde(rename = "E002")]
    MissingUnit,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::UnprocessedBiomarker => "E001",
            WarningCode::MissingUnit => "E002",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal data-quality issue found during analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Warning code
    pub code: WarningCode,

    /// Human readable message, prefixed with the code
    pub message: String,

    /// Page the issue was found on (1-indexed)
    pub page_number: u32,

    /// Region of the offending word
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Biomarker the warning refers to, if one was identified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomarker_id: Option<String>,
}

impl Warning {
    /// A word that matched a biomarker name but was never consumed.
    pub fn unprocessed_biomarker(text: &str, page_number: u32, bbox: BoundingBox) -> Self {
        Self {
            code: WarningCode::UnprocessedBiomarker,
            message: format!(
                "E001: '{}' sounded like a biomarker but could not be processed",
                text
            ),
            page_number,
            bbox: Some(bbox),
            biomarker_id: None,
        }
    }

    /// A measurement whose line carried no recognizable unit.
    pub fn missing_unit(
        biomarker_id: &str,
        text: &str,
        page_number: u32,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            code: WarningCode::MissingUnit,
            message: format!(
                "E002: Can't find units for biomarker: {}, text: {}",
                biomarker_id, text
            ),
            page_number,
            bbox: Some(bbox),
            biomarker_id: Some(biomarker_id.to_string()),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {}: {}", self.page_number, self.message)
    }
}

/// Column alignments of the word pools on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAlignments {
    pub page_number: u32,
    pub biomarkers: Alignment,
    pub units: Alignment,
    pub values: Alignment,
    pub ranges: Alignment,
}
