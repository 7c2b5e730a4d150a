//! Report model types.
//!
//! This module defines the normalized representation OCR output is converted
//! into at the boundary: words with geometry, grouped into lines and pages,
//! plus the measurements and warnings produced by analysis.

mod biomarker;
mod geometry;
mod measurement;
mod page;
mod report;
mod word;

pub use biomarker::{Biomarker, UnitConversion};
pub use geometry::{
    merge_bounding_boxes, Alignment, AlignmentEdge, BoundingBox, ColumnAlignment, Point,
};
pub use measurement::{Measurement, MeasurementMetadata, OcrEvidence, Range, WordRefs};
pub use page::Page;
pub use report::{Metadata, PageAlignments, Report, Warning, WarningCode};
pub use word::{Line, TextBreak, Word};
