//! Analysis options.

use crate::layout::LayoutOptions;

/// Options controlling biomarker detection.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Word cleanup and line grouping options
    pub layout: LayoutOptions,

    /// Prefixes stripped from the first word of a line before name lookup,
    /// applied in order (e.g. "Sg-" for serum tests)
    pub anchor_prefixes: Vec<String>,

    /// Analyze pages in parallel
    pub parallel: bool,

    /// Decimal places measurement values and ranges are rounded to
    pub precision: Option<u32>,

    /// Compute column alignments of the word pools
    pub compute_alignments: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            anchor_prefixes: vec!["Sg-".to_string(), "P-".to_string(), "S-".to_string()],
            parallel: true,
            precision: Some(4),
            compute_alignments: true,
        }
    }
}

impl AnalyzeOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set layout options.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the anchor prefixes.
    pub fn with_anchor_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anchor_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable parallel page analysis.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Round values to `digits` decimals.
    pub fn with_precision(mut self, digits: u32) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Keep values at full precision.
    pub fn without_rounding(mut self) -> Self {
        self.precision = None;
        self
    }

    /// Enable or disable alignment computation.
    pub fn with_alignments(mut self, compute: bool) -> Self {
        self.compute_alignments = compute;
        self
    }

    /// Strip the configured prefixes from an anchor text.
    ///
    /// Each prefix is tried once, in order, on the result of the previous
    /// step.
    pub fn strip_prefixes<'a>(&self, text: &'a str) -> &'a str {
        self.anchor_prefixes
            .iter()
            .fold(text, |acc, prefix| acc.strip_prefix(prefix.as_str()).unwrap_or(acc))
    }

    /// Apply the configured rounding.
    pub fn round(&self, value: f64) -> f64 {
        match self.precision {
            Some(digits) => {
                let factor = 10f64.powi(digits.min(15) as i32);
                (value * factor).round() / factor
            }
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = AnalyzeOptions::default();
        assert_eq!(options.anchor_prefixes, vec!["Sg-", "P-", "S-"]);
        assert!(options.parallel);
        assert_eq!(options.precision, Some(4));
    }

    #[test]
    fn test_builder() {
        let options = AnalyzeOptions::new()
            .with_parallel(false)
            .with_precision(2)
            .with_anchor_prefixes(["U-"])
            .with_alignments(false);
        assert!(!options.parallel);
        assert_eq!(options.precision, Some(2));
        assert_eq!(options.anchor_prefixes, vec!["U-"]);
        assert!(!options.compute_alignments);
    }

    #[test]
    fn test_strip_prefixes() {
        let options = AnalyzeOptions::default();
        assert_eq!(options.strip_prefixes("Sg-ERITROCITI"), "ERITROCITI");
        assert_eq!(options.strip_prefixes("P-Glucose"), "Glucose");
        assert_eq!(options.strip_prefixes("S-Creatinina"), "Creatinina");
        assert_eq!(options.strip_prefixes("Glucose"), "Glucose");
        // sequential: "P-" is stripped first, then "S-"
        assert_eq!(options.strip_prefixes("P-S-Ferro"), "Ferro");
    }

    #[test]
    fn test_round() {
        let options = AnalyzeOptions::default();
        assert_eq!(options.round(70.270270270), 70.2703);
        assert_eq!(options.without_rounding().round(1.23456789), 1.23456789);
    }
}
