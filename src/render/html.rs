//! HTML debug view of a scanned page.
//!
//! Draws every OCR word box of a page as an SVG polygon, scaled to the page
//! pixel size, with the recognized text as tooltip. Useful to check what OCR
//! saw and which lines produced measurements.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::model::{BoundingBox, Page, Report};

const STYLE: &str = ".word {fill: red; fill-opacity: .1; stroke: green; stroke-width: 1; stroke-opacity: .5;}\n\
.line {fill: none; stroke: blue; stroke-width: 1; stroke-opacity: .3; stroke-dasharray: 4 2;}\n\
.measurement {fill: yellow; fill-opacity: .15; stroke: orange; stroke-width: 2;}";

/// Options for the HTML debug view.
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Outline the lines that produced measurements
    pub highlight_measurements: bool,
    /// Outline every grouped line
    pub show_lines: bool,
}

impl HtmlOptions {
    /// Create new options with defaults (word boxes only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Outline the lines that produced measurements.
    pub fn with_measurements(mut self, highlight: bool) -> Self {
        self.highlight_measurements = highlight;
        self
    }

    /// Outline every grouped line.
    pub fn with_lines(mut self, show: bool) -> Self {
        self.show_lines = show;
        self
    }
}

/// Render the debug view of one page (1-indexed).
pub fn to_html(report: &Report, page_number: u32, options: &HtmlOptions) -> Result<String> {
    let page = report
        .get_page(page_number)
        .ok_or_else(|| Error::PageOutOfRange(page_number, report.page_count()))?;

    let mut html = String::new();
    write_page(&mut html, report, page, options)
        .map_err(|e| Error::Render(format!("HTML formatting error: {}", e)))?;
    Ok(html)
}

fn write_page(
    out: &mut String,
    report: &Report,
    page: &Page,
    options: &HtmlOptions,
) -> std::fmt::Result {
    let (width, height) = (page.width as f32, page.height as f32);

    write!(
        out,
        "<html><head><style>{}</style></head><body><svg height='{}' width='{}'>",
        STYLE, page.height, page.width
    )?;

    for word in &page.words {
        write_polygon(out, &word.bbox, "word", &word.text, width, height)?;
    }

    if options.show_lines {
        for line in &page.lines {
            let boxes: Vec<BoundingBox> = page.line_words(line).map(|(_, w)| w.bbox).collect();
            if let Some(bbox) = crate::model::merge_bounding_boxes(&boxes) {
                write_polygon(out, &bbox, "line", &page.line_text(line), width, height)?;
            }
        }
    }

    if options.highlight_measurements {
        for m in report
            .measurements()
            .iter()
            .filter(|m| m.page_number == page.number)
        {
            if let Some(bbox) = &m.bbox {
                let title = format!("{}: {} {}", m.biomarker_id, m.value, m.unit);
                write_polygon(out, bbox, "measurement", &title, width, height)?;
            }
        }
    }

    out.push_str("</svg></body></html>");
    Ok(())
}

fn write_polygon(
    out: &mut String,
    bbox: &BoundingBox,
    class: &str,
    title: &str,
    width: f32,
    height: f32,
) -> std::fmt::Result {
    let points = bbox
        .points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x * width, p.y * height))
        .collect::<Vec<_>>()
        .join(" ");

    writeln!(
        out,
        "<polygon points='{}' class='{}'><title>{}</title></polygon>",
        points,
        class,
        html_escape::encode_safe(title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Word;

    fn report() -> Report {
        let mut page = Page::new(1, 1000, 2000);
        page.add_word(Word::new(
            "<b>&",
            BoundingBox::from_coords(0.1, 0.1, 0.2, 0.12),
            0.9,
        ));
        Report::new(vec![page, Page::new(2, 10, 10)]).unwrap()
    }

    #[test]
    fn test_to_html() {
        let html = to_html(&report(), 1, &HtmlOptions::default()).unwrap();
        assert!(html.starts_with("<html><head><style>.word {fill: red;"));
        assert!(html.contains("<svg height='2000' width='1000'>"));
        assert!(html.contains("points='100.00,200.00 200.00,200.00 200.00,240.00 100.00,240.00'"));
        assert!(html.contains("<title>&lt;b&gt;&amp;</title>"));
        assert!(html.ends_with("</svg></body></html>"));
    }

    #[test]
    fn test_page_out_of_range() {
        let report = report();
        assert!(matches!(
            to_html(&report, 0, &HtmlOptions::default()),
            Err(Error::PageOutOfRange(0, 2))
        ));
        assert!(matches!(
            to_html(&report, 3, &HtmlOptions::default()),
            Err(Error::PageOutOfRange(3, 2))
        ));
    }

    #[test]
    fn test_empty_page() {
        let html = to_html(&report(), 2, &HtmlOptions::default()).unwrap();
        assert!(!html.contains("<polygon"));
    }

    #[test]
    fn test_show_lines() {
        let mut report = report();
        report.pages[0].preprocess(&Default::default());
        let html = to_html(&report, 1, &HtmlOptions::new().with_lines(true)).unwrap();
        assert!(html.contains("class='line'"));
    }
}
