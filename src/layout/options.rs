//! Preprocessing thresholds.

/// Options for word cleanup, merging and line grouping.
///
/// Distances are expressed relative to word height, so they hold for any
/// scan resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Words below this OCR confidence are dropped
    pub min_confidence: f32,

    /// Words narrower than this (normalized) are dropped
    pub min_width: f32,

    /// Words shorter than this (normalized) are dropped
    pub min_height: f32,

    /// Words whose top edge is tilted more than this are dropped
    pub max_skew_degrees: f32,

    /// Whether adjacent fragments are merged into phrases
    pub merge_words: bool,

    /// Maximum horizontal gap between merged fragments (fraction of height)
    pub merge_gap_factor: f32,

    /// Gap under which fragments without a reported break are glued
    /// without a space (fraction of height)
    pub glue_gap_factor: f32,

    /// Maximum vertical distance between word centers on one line
    /// (fraction of height)
    pub line_tolerance_factor: f32,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence floor.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Set the minimum word size.
    pub fn with_min_size(mut self, width: f32, height: f32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    /// Set the maximum tolerated skew.
    pub fn with_max_skew(mut self, degrees: f32) -> Self {
        self.max_skew_degrees = degrees;
        self
    }

    /// Enable or disable fragment merging.
    pub fn with_merge_words(mut self, merge: bool) -> Self {
        self.merge_words = merge;
        self
    }

    /// Set the merge gap factor.
    pub fn with_merge_gap(mut self, factor: f32) -> Self {
        self.merge_gap_factor = factor;
        self
    }

    /// Set the line tolerance factor.
    pub fn with_line_tolerance(mut self, factor: f32) -> Self {
        self.line_tolerance_factor = factor;
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            min_width: 0.002,
            min_height: 0.002,
            max_skew_degrees: 15.0,
            merge_words: true,
            merge_gap_factor: 0.6,
            glue_gap_factor: 0.15,
            line_tolerance_factor: 0.5,
        }
    }
}
