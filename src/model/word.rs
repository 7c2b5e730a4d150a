//! OCR words and text lines.

use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// Break detected by OCR after a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBreak {
    /// Regular space between words
    Space,
    /// Wide space, usually a column gap
    SureSpace,
    /// Wide space at the end of a line
    EolSureSpace,
    /// Line break
    LineBreak,
    /// Hyphenated line break
    Hyphen,
}

impl TextBreak {
    /// Parse a Google Vision `detectedBreak.type` value.
    pub fn from_vision(kind: &str) -> Option<Self> {
        match kind {
            "SPACE" => Some(TextBreak::Space),
            "SURE_SPACE" => Some(TextBreak::SureSpace),
            "EOL_SURE_SPACE" => Some(TextBreak::EolSureSpace),
            "LINE_BREAK" => Some(TextBreak::LineBreak),
            "HYPHEN" => Some(TextBreak::Hyphen),
            _ => None,
        }
    }

    /// Whether the break separates phrases rather than words of one phrase.
    pub fn ends_phrase(self) -> bool {
        !matches!(self, TextBreak::Space)
    }
}

/// A single word recognized by OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Recognized text
    pub text: String,

    /// Word outline in normalized page coordinates
    pub bbox: BoundingBox,

    /// Recognition confidence (0.0-1.0)
    pub confidence: f32,

    /// Break detected after the word, if reported by OCR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_after: Option<TextBreak>,
}

impl Word {
    /// Create a new word.
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
            break_after: None,
        }
    }

    /// Set the break that follows this word.
    pub fn with_break(mut self, text_break: TextBreak) -> Self {
        self.break_after = Some(text_break);
        self
    }

    /// Check if the word has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Words on the same printed line, ordered left to right.
///
/// Words are referenced by their index in [`Page::words`](super::Page::words).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Indices of the words in reading order
    pub words: Vec<usize>,
}

impl Line {
    /// Create a line from word indices.
    pub fn new(words: Vec<usize>) -> Self {
        Self { words }
    }

    /// Index of the first word, the anchor for biomarker detection.
    pub fn first(&self) -> Option<usize> {
        self.words.first().copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
