//! Page-level types.

use super::{Line, Word};
use crate::layout::{self, LayoutOptions};
use serde::{Deserialize, Serialize};

/// A single scanned page with its OCR words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in pixels as reported by OCR
    pub width: u32,

    /// Page height in pixels as reported by OCR
    pub height: u32,

    /// Full page text, if reported by OCR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Detected languages (BCP-47 codes), most likely first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,

    /// All words on the page
    pub words: Vec<Word>,

    /// Words grouped into printed lines, top to bottom
    #[serde(default)]
    pub lines: Vec<Line>,

    /// Whether cleanup, merging and line grouping already ran
    #[serde(default)]
    pub preprocessed: bool,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(number: u32, width: u32, height: u32) -> Self {
        Self {
            number,
            width,
            height,
            text: None,
            languages: Vec::new(),
            words: Vec::new(),
            lines: Vec::new(),
            preprocessed: false,
        }
    }

    /// Set the page words.
    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    /// Set an externally computed line grouping.
    ///
    /// The page is then treated as preprocessed and left untouched by
    /// [`Page::preprocess`].
    pub fn with_lines(mut self, lines: Vec<Line>) -> Self {
        self.lines = lines;
        self.preprocessed = true;
        self
    }

    /// Add a word to the page.
    pub fn add_word(&mut self, word: Word) {
        self.words.push(word);
    }

    /// Get a word by index.
    pub fn word(&self, index: usize) -> Option<&Word> {
        self.words.get(index)
    }

    /// Iterate the words of a line in reading order.
    pub fn line_words<'a>(&'a self, line: &'a Line) -> impl Iterator<Item = (usize, &'a Word)> + 'a {
        line.words
            .iter()
            .filter_map(move |&idx| self.words.get(idx).map(|w| (idx, w)))
    }

    /// Text of a line with words separated by single spaces.
    pub fn line_text(&self, line: &Line) -> String {
        self.line_words(line)
            .map(|(_, w)| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Clean, merge, sort and group the words into lines.
    ///
    /// Does nothing if the page was already preprocessed.
    pub fn preprocess(&mut self, options: &LayoutOptions) {
        if self.preprocessed {
            return;
        }

        let words = std::mem::take(&mut self.words);
        let mut words = layout::cleanup_words(words, options);
        if options.merge_words {
            words = layout::merge_words(words, options);
        }
        layout::sort_words(&mut words);

        self.lines = layout::group_words_into_lines(&words, options);
        self.words = words;
        self.preprocessed = true;
    }

    /// Get the number of words on the page.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Get the number of grouped lines on the page.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Check if the page has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn word(text: &str, left: f32, top: f32, right: f32) -> Word {
        Word::new(text, BoundingBox::from_coords(left, top, right, top + 0.02), 0.95)
    }

    #[test]
    fn test_page_new() {
        let page = Page::new(1, 1240, 1754);
        assert_eq!(page.number, 1);
        assert_eq!(page.dimensions(), (1240, 1754));
        assert!(page.is_empty());
        assert!(!page.is_landscape());
        assert!(!page.preprocessed);
    }

    #[test]
    fn test_line_words_and_text() {
        let page = Page::new(1, 100, 100)
            .with_words(vec![word("Glucose", 0.1, 0.1, 0.2), word("95", 0.5, 0.1, 0.55)])
            .with_lines(vec![Line::new(vec![0, 1])]);

        let line = &page.lines[0];
        let texts: Vec<_> = page.line_words(line).map(|(_, w)| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Glucose", "95"]);
        assert_eq!(page.line_text(line), "Glucose 95");
    }

    #[test]
    fn test_preprocess_groups_lines() {
        let mut page = Page::new(1, 100, 100).with_words(vec![
            word("95", 0.5, 0.3, 0.55),
            word("Glucose", 0.1, 0.3, 0.2),
            word("Report", 0.1, 0.1, 0.2),
        ]);
        page.preprocess(&LayoutOptions::default());

        assert!(page.preprocessed);
        assert_eq!(page.line_count(), 2);
        assert_eq!(page.line_text(&page.lines[0]), "Report");
        assert_eq!(page.line_text(&page.lines[1]), "Glucose 95");
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let mut page = Page::new(1, 100, 100).with_words(vec![
            word("Glucose", 0.1, 0.3, 0.2),
            word("95", 0.5, 0.3, 0.55),
        ]);
        page.preprocess(&LayoutOptions::default());
        let snapshot = page.clone();
        page.preprocess(&LayoutOptions::default());
        assert_eq!(page, snapshot);
    }
}
