//! Per-page biomarker detection.
//!
//! Detection runs in three passes over a preprocessed page:
//!
//! 1. Every word is classified into candidate pools (biomarker names, units,
//!    values, ranges) and the column alignment of each pool is measured.
//! 2. Each line whose first word names a biomarker becomes a measurement when
//!    a value can be found among its other words. Units and ranges on the
//!    same line are attached when present.
//! 3. Biomarker candidates that no measurement consumed are reported.

use std::collections::HashSet;

use rayon::prelude::*;

use super::AnalyzeOptions;
use crate::layout::get_bounding_box_alignments;
use crate::matcher::{Matchers, UnitMatch};
use crate::model::{
    merge_bounding_boxes, BoundingBox, Line, Measurement, MeasurementMetadata, OcrEvidence,
    Page, PageAlignments, Range, Warning, WordRefs,
};

/// Measurements and warnings found on one page.
#[derive(Debug, Clone, Default)]
pub struct PageDetection {
    pub page_number: u32,
    pub measurements: Vec<Measurement>,
    pub warnings: Vec<Warning>,
    pub alignments: PageAlignments,
}

/// Word indices classified by role.
#[derive(Debug, Default)]
struct WordPools {
    biomarkers: Vec<usize>,
    units: Vec<usize>,
    values: Vec<usize>,
    ranges: Vec<usize>,
}

/// A measurement built from one line.
struct LineMatch {
    measurement: Measurement,
    anchor_bbox: BoundingBox,
}

/// Detects biomarker measurements on preprocessed pages.
pub struct BiomarkerDetector<'a> {
    matchers: &'a Matchers,
    options: &'a AnalyzeOptions,
}

impl<'a> BiomarkerDetector<'a> {
    pub fn new(matchers: &'a Matchers, options: &'a AnalyzeOptions) -> Self {
        Self { matchers, options }
    }

    /// Detect measurements on all pages.
    ///
    /// Results are ordered by page number regardless of whether pages were
    /// processed in parallel.
    pub fn detect_pages(&self, pages: &[Page]) -> Vec<PageDetection> {
        let mut detections: Vec<PageDetection> = if self.options.parallel && pages.len() > 1 {
            pages.par_iter().map(|page| self.detect_page(page)).collect()
        } else {
            pages.iter().map(|page| self.detect_page(page)).collect()
        };
        detections.sort_by_key(|d| d.page_number);
        detections
    }

    /// Detect measurements on one page.
    ///
    /// The page is expected to be preprocessed; a page without lines yields
    /// no measurements.
    pub fn detect_page(&self, page: &Page) -> PageDetection {
        let pools = self.classify_words(page);

        let alignments = if self.options.compute_alignments {
            self.pool_alignments(page, &pools)
        } else {
            PageAlignments {
                page_number: page.number,
                ..Default::default()
            }
        };

        let mut consumed: HashSet<usize> = HashSet::new();
        let mut measurements = Vec::new();
        let mut warnings = Vec::new();

        for (line_index, line) in page.lines.iter().enumerate() {
            let Some(found) = self.match_line(page, line_index, line) else {
                continue;
            };

            let measurement = found.measurement;
            if !measurement.has_unit() {
                warnings.push(Warning::missing_unit(
                    &measurement.biomarker_id,
                    &measurement.metadata.ocr.name,
                    page.number,
                    found.anchor_bbox,
                ));
            }
            consumed.insert(measurement.metadata.words.anchor);
            measurements.push(measurement);
        }

        for &idx in &pools.biomarkers {
            if consumed.contains(&idx) {
                continue;
            }
            if let Some(word) = page.word(idx) {
                warnings.push(Warning::unprocessed_biomarker(
                    &word.text,
                    page.number,
                    word.bbox,
                ));
            }
        }

        log::debug!(
            "page {}: {} lines, {} biomarker candidates, {} measurements, {} warnings",
            page.number,
            page.line_count(),
            pools.biomarkers.len(),
            measurements.len(),
            warnings.len()
        );

        PageDetection {
            page_number: page.number,
            measurements,
            warnings,
            alignments,
        }
    }

    /// Sort every word of the page into the pools it is a candidate for.
    ///
    /// Pools may overlap: a word can be both a unit and a value candidate.
    fn classify_words(&self, page: &Page) -> WordPools {
        let mut pools = WordPools::default();

        for (idx, word) in page.words.iter().enumerate() {
            let text = word.text.trim();
            if text.is_empty() {
                continue;
            }
            if !self.matchers.biomarkers.search_biomarkers(text).is_empty() {
                pools.biomarkers.push(idx);
            }
            if !self.matchers.units.search_units(text).is_empty() {
                pools.units.push(idx);
            }
            if self.matchers.values.parse_value(text).is_some() {
                pools.values.push(idx);
            }
            if self.matchers.ranges.parse_range(text).is_some() {
                pools.ranges.push(idx);
            }
        }

        pools
    }

    fn pool_alignments(&self, page: &Page, pools: &WordPools) -> PageAlignments {
        let boxes = |indices: &[usize]| -> Vec<BoundingBox> {
            indices
                .iter()
                .filter_map(|&idx| page.word(idx).map(|w| w.bbox))
                .collect()
        };

        PageAlignments {
            page_number: page.number,
            biomarkers: get_bounding_box_alignments(&boxes(&pools.biomarkers)),
            units: get_bounding_box_alignments(&boxes(&pools.units)),
            values: get_bounding_box_alignments(&boxes(&pools.values)),
            ranges: get_bounding_box_alignments(&boxes(&pools.ranges)),
        }
    }

    /// Build a measurement from a line anchored on its first word.
    fn match_line(&self, page: &Page, line_index: usize, line: &Line) -> Option<LineMatch> {
        let (&anchor_idx, rest) = line.words.split_first()?;
        let anchor = page.word(anchor_idx)?;

        let name = self.options.strip_prefixes(anchor.text.trim());
        let best = self
            .matchers
            .biomarkers
            .search_biomarkers(name)
            .into_iter()
            .next()?;
        let biomarker = best.item;

        let others: Vec<(usize, &str)> = rest
            .iter()
            .filter_map(|&idx| page.word(idx).map(|w| (idx, w.text.trim())))
            .collect();

        // Highest confidence wins, the leftmost on ties
        let mut unit: Option<(usize, &str, UnitMatch)> = None;
        for &(idx, text) in &others {
            if let Some(candidate) = self.matchers.units.parse_units(text, &biomarker) {
                let better = unit
                    .as_ref()
                    .map_or(true, |(_, _, best)| candidate.confidence > best.confidence);
                if better {
                    unit = Some((idx, text, candidate));
                }
            }
        }

        let conversion = unit
            .as_ref()
            .map(|(_, _, u)| u.conversion)
            .filter(|c| c.is_finite() && *c > 0.0)
            .unwrap_or(1.0);

        let range: Option<(usize, &str, Range)> = others.iter().find_map(|&(idx, text)| {
            self.matchers.ranges.parse_range(text).map(|mut r| {
                if unit.is_some() {
                    r.convert(conversion);
                    r.unit = Some(biomarker.unit.clone());
                }
                r.low = self.options.round(r.low);
                r.high = self.options.round(r.high);
                (idx, text, r)
            })
        });
        let range_idx = range.as_ref().map(|(idx, _, _)| *idx);

        let Some((value_idx, value_text, parsed)) = others
            .iter()
            .filter(|(idx, _)| Some(*idx) != range_idx)
            .find_map(|&(idx, text)| {
                self.matchers
                    .values
                    .parse_value(text)
                    .map(|parsed| (idx, text, parsed))
            })
        else {
            log::debug!(
                "page {} line {}: '{}' matched {} but has no value",
                page.number,
                line_index,
                anchor.text,
                biomarker.id
            );
            return None;
        };

        let line_boxes: Vec<BoundingBox> = page.line_words(line).map(|(_, w)| w.bbox).collect();

        let ocr = OcrEvidence {
            name: anchor.text.clone(),
            value: value_text.to_string(),
            range: range.as_ref().map(|(_, text, _)| text.to_string()),
            unit: unit.as_ref().map(|(_, text, _)| text.to_string()),
            conversion: (conversion != 1.0).then_some(conversion),
        };
        let words = WordRefs {
            anchor: anchor_idx,
            value: value_idx,
            range: range_idx,
            unit: unit.as_ref().map(|(idx, _, _)| *idx),
        };

        let measurement = Measurement {
            biomarker_id: biomarker.id.clone(),
            value: self.options.round(parsed.value / conversion),
            text: parsed.text,
            unit: biomarker.unit.clone(),
            range: range.map(|(_, _, r)| r),
            page_number: page.number,
            line_index,
            bbox: merge_bounding_boxes(&line_boxes),
            metadata: MeasurementMetadata {
                name: biomarker.name.clone(),
                confidence: best.confidence,
                ocr,
                words,
            },
        };

        Some(LineMatch {
            measurement,
            anchor_bbox: anchor.bbox,
        })
    }
}
