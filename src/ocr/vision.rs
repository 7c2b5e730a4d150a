//! Google Vision document text detection responses.

use serde::Deserialize;
use serde_json::Value;

use super::round_confidence;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Page, Point, TextBreak, Word};

/// Languages kept per page.
const MAX_LANGUAGES: usize = 3;

#[derive(Debug, Deserialize)]
struct AnnotateFileResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    context: Option<ImageContext>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    #[serde(default)]
    page_number: u32,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<VisionPage>,
}

#[derive(Debug, Deserialize)]
struct VisionPage {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    property: Option<TextProperty>,
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextProperty {
    #[serde(default)]
    detected_languages: Vec<DetectedLanguage>,
    detected_break: Option<DetectedBreak>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedLanguage {
    #[serde(default)]
    language_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedBreak {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    is_prefix: bool,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    words: Vec<VisionWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionWord {
    bounding_box: Option<BoundingPoly>,
    #[serde(default)]
    symbols: Vec<Symbol>,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingPoly {
    #[serde(default)]
    normalized_vertices: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    #[serde(default)]
    text: String,
    property: Option<TextProperty>,
}

/// Convert Google Vision responses into normalized pages.
///
/// Accepts the list of per-page `AnnotateImageResponse`s, an
/// `AnnotateFileResponse` wrapping it, or a batch response whose first file
/// holds it. Each response must carry exactly one page with positive
/// dimensions and no error status.
pub fn normalize_vision_responses(value: Value) -> Result<Vec<Page>> {
    let responses = image_responses(value)?;
    if responses.is_empty() {
        return Err(malformed("no page responses"));
    }

    let mut pages = Vec::with_capacity(responses.len());
    for (idx, response) in responses.into_iter().enumerate() {
        pages.push(normalize_page(response, idx as u32 + 1)?);
    }

    log::info!(
        "Normalized {} Vision pages ({} words)",
        pages.len(),
        pages.iter().map(Page::word_count).sum::<usize>()
    );

    Ok(pages)
}

fn image_responses(value: Value) -> Result<Vec<AnnotateImageResponse>> {
    let responses = match value {
        Value::Object(mut map) => map
            .remove("responses")
            .ok_or_else(|| malformed("missing 'responses'"))?,
        other => other,
    };

    let is_batch = responses
        .as_array()
        .and_then(|list| list.first())
        .is_some_and(|first| first.get("responses").is_some());

    if is_batch {
        let files: Vec<AnnotateFileResponse> = serde_json::from_value(responses)?;
        let file = files
            .into_iter()
            .next()
            .ok_or_else(|| malformed("empty batch response"))?;
        Ok(file.responses)
    } else {
        Ok(serde_json::from_value(responses)?)
    }
}

fn normalize_page(response: AnnotateImageResponse, fallback_number: u32) -> Result<Page> {
    if let Some(status) = response.error.filter(|s| s.code != 0 || !s.message.is_empty()) {
        log::error!(
            "Vision reported an error on page {}: {} {}",
            fallback_number,
            status.code,
            status.message
        );
        return Err(Error::OcrService(format!(
            "code {}: {}",
            status.code, status.message
        )));
    }

    let number = response
        .context
        .map(|c| c.page_number)
        .filter(|n| *n > 0)
        .unwrap_or(fallback_number);

    let annotation = response
        .full_text_annotation
        .ok_or_else(|| malformed(format!("page {} has no text annotation", number)))?;

    if annotation.pages.len() != 1 {
        return Err(malformed(format!(
            "page {} has {} annotation pages, expected 1",
            number,
            annotation.pages.len()
        )));
    }
    let Some(vision_page) = annotation.pages.into_iter().next() else {
        return Err(malformed(format!("page {} has no annotation page", number)));
    };

    if vision_page.width == 0 || vision_page.height == 0 {
        return Err(malformed(format!("page {} has zero dimensions", number)));
    }

    let languages: Vec<String> = vision_page
        .property
        .map(|p| p.detected_languages)
        .unwrap_or_default()
        .into_iter()
        .map(|l| l.language_code)
        .filter(|code| !code.is_empty())
        .take(MAX_LANGUAGES)
        .collect();

    let mut words = Vec::new();
    for word in vision_page
        .blocks
        .into_iter()
        .flat_map(|b| b.paragraphs)
        .flat_map(|p| p.words)
    {
        words.push(normalize_word(word, number)?);
    }

    if words.is_empty() {
        log::warn!("Vision page {} has no words", number);
    }

    let mut page = Page::new(number, vision_page.width, vision_page.height).with_words(words);
    page.text = Some(annotation.text).filter(|t| !t.is_empty());
    page.languages = languages;
    Ok(page)
}

fn normalize_word(word: VisionWord, page_number: u32) -> Result<Word> {
    let bbox = word
        .bounding_box
        .and_then(|poly| BoundingBox::from_slice(&poly.normalized_vertices))
        .ok_or_else(|| malformed(format!("word on page {} has no 4-point box", page_number)))?;

    let mut text = String::new();
    let mut text_break = None;
    for symbol in word.symbols {
        text.push_str(&symbol.text);
        if let Some(detected) = symbol.property.and_then(|p| p.detected_break) {
            if !detected.is_prefix {
                text_break = TextBreak::from_vision(&detected.kind);
            }
        }
    }

    let mut normalized = Word::new(text, bbox, round_confidence(word.confidence));
    normalized.break_after = text_break;
    Ok(normalized)
}

fn malformed(message: impl Into<String>) -> Error {
    let message = message.into();
    log::error!("Malformed Vision response: {}", message);
    Error::MalformedOcr(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn symbol(text: &str, brk: Option<&str>) -> Value {
        match brk {
            Some(kind) => json!({"text": text, "property": {"detectedBreak": {"type": kind}}}),
            None => json!({"text": text}),
        }
    }

    fn vision_word(symbols: Vec<Value>, left: f32, top: f32, right: f32) -> Value {
        json!({
            "boundingBox": {"normalizedVertices": [
                {"x": left, "y": top}, {"x": right, "y": top},
                {"x": right, "y": top + 0.02}, {"x": left, "y": top + 0.02}
            ]},
            "symbols": symbols,
            "confidence": 0.98765
        })
    }

    fn response(page_number: u32, words: Vec<Value>) -> Value {
        json!({
            "fullTextAnnotation": {
                "text": "Glucose 95\n",
                "pages": [{
                    "width": 1240,
                    "height": 1754,
                    "property": {"detectedLanguages": [
                        {"languageCode": "it"}, {"languageCode": "en"},
                        {"languageCode": "fr"}, {"languageCode": "de"}
                    ]},
                    "blocks": [{"paragraphs": [{"words": words}]}]
                }]
            },
            "context": {"pageNumber": page_number}
        })
    }

    #[test]
    fn test_normalize_words() {
        let words = vec![
            vision_word(
                vec![symbol("G", None), symbol("l", None), symbol("u", Some("SPACE"))],
                0.1,
                0.1,
                0.2,
            ),
            vision_word(vec![symbol("9", None), symbol("5", Some("LINE_BREAK"))], 0.5, 0.1, 0.55),
        ];
        let pages = normalize_vision_responses(json!([response(1, words)])).unwrap();

        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.number, 1);
        assert_eq!((page.width, page.height), (1240, 1754));
        assert_eq!(page.languages, vec!["it", "en", "fr"]);
        assert_eq!(page.words[0].text, "Glu");
        assert_eq!(page.words[0].break_after, Some(TextBreak::Space));
        assert_eq!(page.words[0].confidence, 0.988);
        assert_eq!(page.words[1].text, "95");
        assert_eq!(page.words[1].break_after, Some(TextBreak::LineBreak));
        assert!(!page.preprocessed);
    }

    #[test]
    fn test_wrapped_and_batch_responses() {
        let words = vec![vision_word(vec![symbol("A", None)], 0.1, 0.1, 0.2)];
        let wrapped = json!({"responses": [response(1, words.clone()), response(2, words.clone())]});
        assert_eq!(normalize_vision_responses(wrapped).unwrap().len(), 2);

        let batch = json!({"responses": [{"responses": [response(3, words)]}]});
        let pages = normalize_vision_responses(batch).unwrap();
        assert_eq!(pages[0].number, 3);
    }

    #[test]
    fn test_error_status() {
        let payload = json!([{"error": {"code": 3, "message": "Bad image data"}}]);
        assert!(matches!(
            normalize_vision_responses(payload),
            Err(Error::OcrService(_))
        ));
    }

    #[test]
    fn test_missing_annotation() {
        let payload = json!([{"context": {"pageNumber": 1}}]);
        assert!(matches!(
            normalize_vision_responses(payload),
            Err(Error::MalformedOcr(_))
        ));
    }

    #[test]
    fn test_zero_dimensions() {
        let mut page = response(1, vec![]);
        page["fullTextAnnotation"]["pages"][0]["width"] = json!(0);
        assert!(matches!(
            normalize_vision_responses(json!([page])),
            Err(Error::MalformedOcr(_))
        ));
    }

    #[test]
    fn test_multiple_annotation_pages() {
        let mut page = response(1, vec![]);
        let inner = page["fullTextAnnotation"]["pages"][0].clone();
        page["fullTextAnnotation"]["pages"] = json!([inner.clone(), inner]);
        assert!(matches!(
            normalize_vision_responses(json!([page])),
            Err(Error::MalformedOcr(_))
        ));
    }

    #[test]
    fn test_empty_responses() {
        assert!(normalize_vision_responses(json!([])).is_err());
    }
}
