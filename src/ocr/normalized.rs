//! Stored normalized annotations.
//!
//! This is the format OCR output is persisted in after normalization: a
//! `pages` array of flat word lists. Word texts may still carry the trailing
//! break characters OCR reported (`" "`, `"\n"`); they are turned back into
//! [`TextBreak`]s on import.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::round_confidence;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Page, Point, TextBreak, Word};

#[derive(Debug, Deserialize)]
struct NormalizedAnnotations {
    pages: Vec<NormalizedPage>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedPage {
    #[serde(default, alias = "number")]
    page_number: Option<u32>,
    width: u32,
    height: u32,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "languages")]
    detected_languages: Vec<Language>,
    #[serde(default)]
    words: Vec<NormalizedWord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Language {
    Code(String),
    #[serde(rename_all = "camelCase")]
    Detected {
        language_code: String,
    },
}

impl Language {
    fn into_code(self) -> String {
        match self {
            Language::Code(code) => code,
            Language::Detected { language_code } => language_code,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedWord {
    text: String,
    #[serde(alias = "bbox")]
    bounding_box: Vec<Point>,
    #[serde(default = "full_confidence", deserialize_with = "number_or_string")]
    confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

/// Confidences were stored as fixed-point strings by older writers.
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f32>().map_err(serde::de::Error::custom),
    }
}

/// Parse stored normalized annotations into pages and provider metadata.
pub fn parse_normalized(value: Value) -> Result<(Vec<Page>, Value)> {
    let annotations: NormalizedAnnotations = serde_json::from_value(value)?;
    if annotations.pages.is_empty() {
        return Err(Error::MalformedOcr("no pages".to_string()));
    }

    let mut pages = Vec::with_capacity(annotations.pages.len());
    for (idx, page) in annotations.pages.into_iter().enumerate() {
        pages.push(normalize_page(page, idx as u32 + 1)?);
    }

    log::info!("Loaded {} normalized pages", pages.len());

    Ok((pages, annotations.metadata))
}

fn normalize_page(page: NormalizedPage, fallback_number: u32) -> Result<Page> {
    let number = page.page_number.filter(|n| *n > 0).unwrap_or(fallback_number);
    if page.width == 0 || page.height == 0 {
        return Err(Error::MalformedOcr(format!(
            "page {} has zero dimensions",
            number
        )));
    }

    let words = page
        .words
        .into_iter()
        .map(|w| normalize_word(w, number))
        .collect::<Result<Vec<_>>>()?;
    if words.is_empty() {
        log::warn!("Normalized page {} has no words", number);
    }

    let mut normalized = Page::new(number, page.width, page.height).with_words(words);
    normalized.text = page.text.filter(|t| !t.is_empty());
    normalized.languages = page
        .detected_languages
        .into_iter()
        .map(Language::into_code)
        .filter(|code| !code.is_empty())
        .take(3)
        .collect();
    Ok(normalized)
}

fn normalize_word(word: NormalizedWord, page_number: u32) -> Result<Word> {
    let bbox = BoundingBox::from_slice(&word.bounding_box).ok_or_else(|| {
        Error::MalformedOcr(format!(
            "word '{}' on page {} has {} vertices, expected 4",
            word.text.trim(),
            page_number,
            word.bounding_box.len()
        ))
    })?;

    let text_break = trailing_break(&word.text);
    let mut normalized = Word::new(word.text.trim(), bbox, round_confidence(word.confidence));
    normalized.break_after = text_break;
    Ok(normalized)
}

fn trailing_break(text: &str) -> Option<TextBreak> {
    let trimmed = text.trim_end();
    let tail = &text[trimmed.len()..];
    if tail.contains('\n') {
        Some(TextBreak::LineBreak)
    } else if tail.chars().count() > 1 || tail.contains('\t') {
        Some(TextBreak::SureSpace)
    } else if tail == " " {
        Some(TextBreak::Space)
    } else {
        None
    }
}
