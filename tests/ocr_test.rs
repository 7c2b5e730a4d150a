//! Integration tests for loading stored OCR output.

use std::fs;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tempfile::TempDir;

use labscan::detect::{detect_source, SourceKind};
use labscan::ocr::{scan_value, FileProvider, OcrProvider, ScanResult};
use labscan::{
    detect_format_from_path, Analyzer, BoundingBox, Error, Page, PayloadFormat, Result, Word,
};

fn vertices(left: f64, top: f64, right: f64, bottom: f64) -> Value {
    json!([
        {"x": left, "y": top}, {"x": right, "y": top},
        {"x": right, "y": bottom}, {"x": left, "y": bottom}
    ])
}

fn normalized_payload() -> Value {
    json!({
        "pages": [{
            "pageNumber": 1,
            "width": 1240,
            "height": 1754,
            "detectedLanguages": [{"languageCode": "en"}],
            "words": [
                {"text": "Glucose ", "boundingBox": vertices(0.1, 0.3, 0.18, 0.315), "confidence": 0.99},
                {"text": "95 ", "boundingBox": vertices(0.4, 0.3, 0.43, 0.315), "confidence": "0.97"},
                {"text": "mg/dL ", "boundingBox": vertices(0.55, 0.3, 0.61, 0.315), "confidence": 0.98},
                {"text": "70-100\n", "boundingBox": vertices(0.7, 0.3, 0.76, 0.315), "confidence": 0.96}
            ]
        }],
        "metadata": {"lab": "Acme Labs"}
    })
}

fn vision_word(text: &str, left: f64, top: f64, right: f64, brk: &str) -> Value {
    let chars: Vec<char> = text.chars().collect();
    let symbols: Vec<Value> = chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i + 1 == chars.len() {
                json!({"text": c.to_string(), "property": {"detectedBreak": {"type": brk}}})
            } else {
                json!({"text": c.to_string()})
            }
        })
        .collect();
    json!({
        "boundingBox": {"normalizedVertices": vertices(left, top, right, top + 0.015)},
        "symbols": symbols,
        "confidence": 0.9876
    })
}

fn vision_payload() -> Value {
    json!([{
        "fullTextAnnotation": {
            "text": "Sg-ERITROCITI 4.8\n",
            "pages": [{
                "width": 1240,
                "height": 1754,
                "property": {"detectedLanguages": [{"languageCode": "it"}]},
                "blocks": [{"paragraphs": [{"words": [
                    vision_word("Sg-ERITROCITI", 0.1, 0.2, 0.25, "SURE_SPACE"),
                    vision_word("4.8", 0.4, 0.2, 0.43, "LINE_BREAK")
                ]}]}]
            }]
        },
        "context": {"pageNumber": 1}
    }])
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path
}

fn write_gzip(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(value).unwrap()).unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();
    path
}

#[test]
fn test_load_normalized_file() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "report.json", &normalized_payload());

    assert_eq!(detect_format_from_path(&path).unwrap(), PayloadFormat::Normalized);

    let report = Analyzer::new().from_file(&path, true).unwrap();
    assert_eq!(report.page_count(), 1);
    assert_eq!(report.metadata.extras["lab"], "Acme Labs");
    assert_eq!(report.metadata.extras["format"], "normalized");
    assert_eq!(report.metadata.source.as_deref(), Some(path.to_str().unwrap()));

    let m = report.measurement("glucose").unwrap();
    assert_eq!(m.value, 95.0);
    assert_eq!(m.range.as_ref().unwrap().high, 100.0);
    assert!(report.warnings().is_empty());
}

#[test]
fn test_load_gzipped_file() {
    let dir = TempDir::new().unwrap();
    let path = write_gzip(&dir, "report.json.gz", &normalized_payload());

    assert_eq!(detect_format_from_path(&path).unwrap(), PayloadFormat::Normalized);
    let report = labscan::analyze_file(&path).unwrap();
    assert_eq!(report.measurements().len(), 1);
}

#[test]
fn test_load_vision_file() {
    let dir = TempDir::new().unwrap();
    let path = write_gzip(&dir, "vision.json.gz", &vision_payload());

    assert_eq!(detect_format_from_path(&path).unwrap(), PayloadFormat::Vision);

    let report = labscan::load_file(&path).unwrap();
    assert!(!report.is_analyzed());
    let page = &report.pages[0];
    assert_eq!(page.languages, vec!["it"]);
    assert_eq!(page.words[0].text, "Sg-ERITROCITI");
    assert_eq!(page.words[0].confidence, 0.988);
    assert_eq!(page.text.as_deref(), Some("Sg-ERITROCITI 4.8\n"));

    let report = labscan::analyze_file(&path).unwrap();
    let m = report.measurement("erythrocytes").unwrap();
    assert_eq!(m.value, 4.8);
    assert_eq!(report.warnings().len(), 1);
    assert!(report.warnings()[0].message.starts_with("E002"));
}

#[test]
fn test_vision_error_response() {
    let payload = json!([{"error": {"code": 3, "message": "Bad image data."}}]);
    assert!(matches!(scan_value(payload), Err(Error::OcrService(_))));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = Analyzer::new().from_file(dir.path().join("missing.json"), true);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_unknown_payload() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "other.json", &json!({"kind": "invoice"}));
    assert!(matches!(
        labscan::load_file(&path),
        Err(Error::UnknownFormat)
    ));
}

#[test]
fn test_storage_sources_need_a_cloud_provider() {
    assert_eq!(
        detect_source("gs://labs/2024/cbc.pdf").unwrap(),
        SourceKind::GoogleStorage {
            bucket: "labs".to_string(),
            object: "2024/cbc.pdf".to_string(),
        }
    );
    assert!(matches!(
        FileProvider::new().scan_pages("gs://labs/2024/cbc.pdf"),
        Err(Error::UnsupportedSource(_))
    ));
}

/// Provider serving fixed pages, standing in for a cloud OCR service.
struct StaticProvider {
    pages: Vec<Page>,
}

impl OcrProvider for StaticProvider {
    fn scan_pages(&self, source: &str) -> Result<ScanResult> {
        if !source.starts_with("gs://") {
            return Err(Error::UnsupportedSource(source.to_string()));
        }
        Ok(ScanResult {
            pages: self.pages.clone(),
            metadata: json!({"provider": "static"}),
        })
    }
}

#[test]
fn test_custom_provider() {
    let mut page = Page::new(1, 1000, 1000);
    page.add_word(Word::new("TSH", BoundingBox::from_coords(0.1, 0.1, 0.14, 0.115), 0.95));
    page.add_word(Word::new("2.1", BoundingBox::from_coords(0.4, 0.1, 0.43, 0.115), 0.95));
    page.add_word(Word::new("mIU/L", BoundingBox::from_coords(0.55, 0.1, 0.6, 0.115), 0.95));

    let provider = StaticProvider { pages: vec![page] };
    let analyzer = Analyzer::new();

    let report = analyzer
        .from_source(&provider, "gs://labs/thyroid.pdf", true)
        .unwrap();
    assert_eq!(report.metadata.source.as_deref(), Some("gs://labs/thyroid.pdf"));
    assert_eq!(report.metadata.extras["provider"], "static");
    assert_eq!(report.measurement("tsh").unwrap().value, 2.1);

    let unanalyzed = analyzer
        .from_source(&provider, "gs://labs/thyroid.pdf", false)
        .unwrap();
    assert!(unanalyzed.measurements.is_none());

    assert!(analyzer.from_source(&provider, "local.json", true).is_err());
}

#[test]
fn test_provider_without_pages() {
    let provider = StaticProvider { pages: vec![] };
    assert!(matches!(
        Analyzer::new().from_source(&provider, "gs://labs/empty.pdf", true),
        Err(Error::EmptyReport)
    ));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_from_source_async() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "report.json", &normalized_payload());

    let report = Analyzer::new().from_source_async(&path, true).await.unwrap();
    assert_eq!(report.measurements().len(), 1);
}
