//! Page layout preprocessing.
//!
//! Turns the unordered bag of OCR words of a page into cleaned, merged words
//! grouped into printed lines, and detects column alignments among sets of
//! word boxes.

mod alignment;
mod options;
mod preprocess;

pub use alignment::{
    get_bounding_box_alignments, get_bounding_box_alignments_with_config, AlignmentConfig,
};
pub use options::LayoutOptions;
pub use preprocess::{cleanup_words, group_words_into_lines, merge_words, sort_words};
