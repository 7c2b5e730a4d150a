//! Role classifiers for OCR words.
//!
//! Analysis asks four questions of every word: does it name a biomarker, is
//! it a measurement unit, a numeric value, or a reference range? Each
//! question is answered by a trait object so dictionaries and parsers can be
//! swapped or mocked. [`Dictionary`] and [`NumericParser`] are the bundled
//! implementations.

mod dictionary;
mod numeric;
mod text;

pub use dictionary::Dictionary;
pub use numeric::NumericParser;
pub use text::{normalize_name, normalize_unit, similarity};

use std::sync::Arc;

use crate::model::{Biomarker, Range};

/// A biomarker candidate for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomarkerMatch {
    /// The matched biomarker
    pub item: Arc<Biomarker>,
    /// Match confidence (0.0-1.0)
    pub confidence: f32,
}

/// A unit candidate for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitMatch {
    /// Unit symbol as defined in the dictionary
    pub unit: String,
    /// Factor from the canonical unit to this unit (1.0 when unknown)
    pub conversion: f64,
    /// Match confidence (0.0-1.0)
    pub confidence: f32,
}

/// A numeric value read from text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedValue {
    /// Parsed number
    pub value: f64,
    /// Text the number was read from
    pub text: String,
}

/// Looks up biomarker names.
pub trait BiomarkerMatcher: Send + Sync {
    /// Candidates for `text`, ranked by descending confidence.
    fn search_biomarkers(&self, text: &str) -> Vec<BiomarkerMatch>;
}

/// Looks up measurement units.
pub trait UnitMatcher: Send + Sync {
    /// Units `text` could denote, regardless of biomarker.
    fn search_units(&self, text: &str) -> Vec<UnitMatch>;

    /// Best unit of `biomarker` that `text` denotes, with its conversion.
    fn parse_units(&self, text: &str, biomarker: &Biomarker) -> Option<UnitMatch>;
}

/// Parses bare numeric values.
pub trait ValueParser: Send + Sync {
    fn parse_value(&self, text: &str) -> Option<ParsedValue>;
}

/// Parses numeric reference ranges.
pub trait RangeParser: Send + Sync {
    fn parse_range(&self, text: &str) -> Option<Range>;
}

/// The set of role classifiers used by analysis.
#[derive(Clone)]
pub struct Matchers {
    pub biomarkers: Arc<dyn BiomarkerMatcher>,
    pub units: Arc<dyn UnitMatcher>,
    pub values: Arc<dyn ValueParser>,
    pub ranges: Arc<dyn RangeParser>,
}

impl Matchers {
    /// Assemble matchers from individual classifiers.
    pub fn new(
        biomarkers: Arc<dyn BiomarkerMatcher>,
        units: Arc<dyn UnitMatcher>,
        values: Arc<dyn ValueParser>,
        ranges: Arc<dyn RangeParser>,
    ) -> Self {
        Self {
            biomarkers,
            units,
            values,
            ranges,
        }
    }

    /// Use a dictionary for names and units, and the numeric parser for
    /// values and ranges.
    pub fn from_dictionary(dictionary: Dictionary) -> Self {
        let dictionary = Arc::new(dictionary);
        let numeric = Arc::new(NumericParser::new());
        Self {
            biomarkers: dictionary.clone(),
            units: dictionary,
            values: numeric.clone(),
            ranges: numeric,
        }
    }

    /// Matchers backed by the built-in dictionary.
    pub fn builtin() -> Self {
        Self::from_dictionary(Dictionary::builtin())
    }

    /// Replace the biomarker name matcher.
    pub fn with_biomarkers(mut self, matcher: Arc<dyn BiomarkerMatcher>) -> Self {
        self.biomarkers = matcher;
        self
    }

    /// Replace the unit matcher.
    pub fn with_units(mut self, matcher: Arc<dyn UnitMatcher>) -> Self {
        self.units = matcher;
        self
    }

    /// Replace the value parser.
    pub fn with_values(mut self, parser: Arc<dyn ValueParser>) -> Self {
        self.values = parser;
        self
    }

    /// Replace the range parser.
    pub fn with_ranges(mut self, parser: Arc<dyn RangeParser>) -> Self {
        self.ranges = parser;
        self
    }
}

impl Default for Matchers {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Matchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matchers").finish_non_exhaustive()
    }
}
