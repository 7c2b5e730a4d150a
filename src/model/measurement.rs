//! Biomarker measurements and reference ranges.

use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// A closed reference interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower bound (inclusive)
    pub low: f64,
    /// Upper bound (inclusive)
    pub high: f64,
    /// Unit the bounds are expressed in, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Range {
    /// Create a range without a unit.
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            unit: None,
        }
    }

    /// Set the range unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Convert the bounds in place by dividing them by `factor`.
    ///
    /// Uses the same convention as measurement values: a factor maps the
    /// canonical unit to the printed unit.
    pub fn convert(&mut self, factor: f64) {
        if factor != 0.0 && factor != 1.0 {
            self.low /= factor;
            self.high /= factor;
        }
    }

    /// Check if a value lies within the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// OCR text used for each role of a measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrEvidence {
    /// Anchor text as printed (before prefix stripping)
    pub name: String,
    /// Word the value was read from
    pub value: String,
    /// Word the reference range was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Word the unit was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Conversion factor applied, omitted when 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<f64>,
}

/// Indices of the page words consumed by a measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRefs {
    pub anchor: usize,
    pub value: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<usize>,
}

/// Provenance of a measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementMetadata {
    /// Display name of the matched biomarker
    pub name: String,
    /// Confidence of the biomarker name match
    pub confidence: f32,
    /// OCR snippets per role
    pub ocr: OcrEvidence,
    /// Word indices per role
    pub words: WordRefs,
}

/// A biomarker reading found on a report line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Identifier of the biomarker
    pub biomarker_id: String,

    /// Value in the canonical unit
    pub value: f64,

    /// Value text exactly as parsed from OCR
    pub text: String,

    /// Canonical unit of the biomarker
    pub unit: String,

    /// Reference range, in the canonical unit when a unit was matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,

    /// Page the measurement was found on (1-indexed)
    pub page_number: u32,

    /// Index of the originating line on the page
    pub line_index: usize,

    /// Region covering the whole originating line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// OCR evidence and match details
    pub metadata: MeasurementMetadata,
}

impl Measurement {
    /// Conversion factor that was applied to the printed value.
    pub fn conversion(&self) -> f64 {
        self.metadata.ocr.conversion.unwrap_or(1.0)
    }

    /// Check if a unit was found on the originating line.
    pub fn has_unit(&self) -> bool {
        self.metadata.ocr.unit.is_some()
    }

    /// Whether the value lies within the reference range, if there is one.
    pub fn is_in_range(&self) -> Option<bool> {
        self.range.as_ref().map(|r| r.contains(self.value))
    }
}
