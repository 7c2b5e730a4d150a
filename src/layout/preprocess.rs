//! Word cleanup, merging, ordering and line grouping.

use std::cmp::Ordering;

use crate::model::{Line, TextBreak, Word};

use super::LayoutOptions;

/// Drop words that are blank, unreliable, degenerate or not upright.
pub fn cleanup_words(words: Vec<Word>, options: &LayoutOptions) -> Vec<Word> {
    let total = words.len();

    let cleaned: Vec<Word> = words
        .into_iter()
        .filter(|w| !w.is_blank())
        .filter(|w| w.confidence >= options.min_confidence)
        .filter(|w| w.bbox.width() >= options.min_width && w.bbox.height() >= options.min_height)
        .filter(|w| w.bbox.is_horizontal(options.max_skew_degrees))
        .map(|mut w| {
            let trimmed = w.text.trim();
            if trimmed.len() != w.text.len() {
                w.text = trimmed.to_string();
            }
            w
        })
        .collect();

    log::debug!(
        "cleanup_words: kept {} of {} words",
        cleaned.len(),
        total
    );

    cleaned
}

/// Coalesce adjacent fragments on the same line into short phrases.
///
/// Two neighbours are merged when OCR reported no phrase-ending break between
/// them and the horizontal gap is small relative to their height. Fragments
/// with no reported break and almost no gap are glued without a space, which
/// rebuilds tokens such as `mg/dL` that OCR splits on punctuation.
pub fn merge_words(words: Vec<Word>, options: &LayoutOptions) -> Vec<Word> {
    if words.len() < 2 {
        return words;
    }

    let mut words = words;
    sort_words(&mut words);
    let lines = group_words_into_lines(&words, options);

    let mut slots: Vec<Option<Word>> = words.into_iter().map(Some).collect();
    let mut merged: Vec<Word> = Vec::with_capacity(slots.len());

    for line in lines {
        let mut current: Option<Word> = None;

        for idx in line.words {
            let Some(word) = slots[idx].take() else {
                continue;
            };

            current = match current.take() {
                Some(prev) => match join_separator(&prev, &word, options) {
                    Some(separator) => Some(merge_pair(prev, word, separator)),
                    None => {
                        merged.push(prev);
                        Some(word)
                    }
                },
                None => Some(word),
            };
        }

        if let Some(word) = current {
            merged.push(word);
        }
    }

    log::debug!("merge_words: {} words after merging", merged.len());

    merged
}

/// Decide whether two neighbours belong to one phrase and how to join them.
fn join_separator(prev: &Word, next: &Word, options: &LayoutOptions) -> Option<&'static str> {
    if prev.break_after.is_some_and(TextBreak::ends_phrase) {
        return None;
    }

    if prev.bbox.vertical_overlap(&next.bbox) < 0.5 {
        return None;
    }

    // A number never joins the word printed next to it ("95" "mg/dL")
    if is_numeric_fragment(&prev.text) != is_numeric_fragment(&next.text) {
        return None;
    }

    let height = prev.bbox.height().max(next.bbox.height());
    let gap = next.bbox.left() - prev.bbox.right();

    if gap < -0.5 * height || gap > options.merge_gap_factor * height {
        return None;
    }

    if prev.break_after.is_none() && gap <= options.glue_gap_factor * height {
        Some("")
    } else {
        Some(" ")
    }
}

/// Digits, separators, signs, dashes and brackets only: a value, a range or
/// a piece of one.
fn is_numeric_fragment(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.chars().all(|c| {
            c.is_ascii_digit() || c.is_whitespace() || ".,+-–—()[]<>≤≥=*".contains(c)
        })
}

fn merge_pair(prev: Word, next: Word, separator: &str) -> Word {
    let prev_chars = prev.text.chars().count().max(1) as f32;
    let next_chars = next.text.chars().count().max(1) as f32;
    let confidence =
        (prev.confidence * prev_chars + next.confidence * next_chars) / (prev_chars + next_chars);

    Word {
        text: format!("{}{}{}", prev.text.trim_end(), separator, next.text.trim_start()),
        bbox: prev.bbox.union(&next.bbox),
        confidence,
        break_after: next.break_after,
    }
}

/// Sort words top to bottom, then left to right.
pub fn sort_words(words: &mut [Word]) {
    words.sort_by(|a, b| {
        let y_cmp = a
            .bbox
            .top()
            .partial_cmp(&b.bbox.top())
            .unwrap_or(Ordering::Equal);
        if y_cmp == Ordering::Equal {
            a.bbox
                .left()
                .partial_cmp(&b.bbox.left())
                .unwrap_or(Ordering::Equal)
        } else {
            y_cmp
        }
    });
}

/// Group words into lines by vertical proximity.
///
/// Lines are returned top to bottom, with word indices ordered left to right.
pub fn group_words_into_lines(words: &[Word], options: &LayoutOptions) -> Vec<Line> {
    if words.is_empty() {
        return vec![];
    }

    let mut order: Vec<usize> = (0..words.len()).collect();
    order.sort_by(|&a, &b| {
        words[a]
            .bbox
            .center_y()
            .partial_cmp(&words[b].bbox.center_y())
            .unwrap_or(Ordering::Equal)
    });

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_y = 0.0f32;
    let mut current_height = 0.0f32;

    for idx in order {
        let bbox = &words[idx].bbox;
        let y = bbox.center_y();
        let height = bbox.height();

        if current.is_empty() {
            current_y = y;
            current_height = height;
            current.push(idx);
            continue;
        }

        let tolerance = options.line_tolerance_factor * current_height.max(height);
        if (y - current_y).abs() <= tolerance {
            // Running averages keep slightly slanted lines together
            let n = current.len() as f32;
            current_y = (current_y * n + y) / (n + 1.0);
            current_height = (current_height * n + height) / (n + 1.0);
            current.push(idx);
        } else {
            groups.push(std::mem::take(&mut current));
            current_y = y;
            current_height = height;
            current.push(idx);
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .map(|mut group| {
            group.sort_by(|&a, &b| {
                words[a]
                    .bbox
                    .left()
                    .partial_cmp(&words[b].bbox.left())
                    .unwrap_or(Ordering::Equal)
            });
            Line::new(group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Point};

    fn make_word(text: &str, left: f32, top: f32, right: f32) -> Word {
        Word::new(text, BoundingBox::from_coords(left, top, right, top + 0.02), 0.95)
    }

    fn texts(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn test_cleanup_drops_noise() {
        let options = LayoutOptions::default();
        let rotated = Word::new(
            "vertical",
            BoundingBox::new([
                Point::new(0.9, 0.1),
                Point::new(0.9, 0.4),
                Point::new(0.88, 0.4),
                Point::new(0.88, 0.1),
            ]),
            0.99,
        );
        let words = vec![
            make_word(" Glucose ", 0.1, 0.1, 0.2),
            make_word("   ", 0.3, 0.1, 0.4),
            Word::new("blurry", BoundingBox::from_coords(0.1, 0.2, 0.2, 0.22), 0.1),
            Word::new(".", BoundingBox::from_coords(0.1, 0.3, 0.1005, 0.3005), 0.9),
            rotated,
        ];

        let cleaned = cleanup_words(words, &options);
        assert_eq!(texts(&cleaned), vec!["Glucose"]);
    }

    #[test]
    fn test_sort_words() {
        let mut words = vec![
            make_word("c", 0.1, 0.5, 0.2),
            make_word("b", 0.5, 0.1, 0.6),
            make_word("a", 0.1, 0.1, 0.2),
        ];
        sort_words(&mut words);
        assert_eq!(texts(&words), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_group_words_into_lines() {
        let words = vec![
            make_word("95", 0.5, 0.302, 0.55),
            make_word("Glucose", 0.1, 0.3, 0.2),
            make_word("Header", 0.1, 0.1, 0.3),
            make_word("mg/dL", 0.7, 0.299, 0.8),
        ];
        let lines = group_words_into_lines(&words, &LayoutOptions::default());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].words, vec![2]);
        assert_eq!(lines[1].words, vec![1, 0, 3]);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_words_into_lines(&[], &LayoutOptions::default()).is_empty());
    }

    #[test]
    fn test_merge_spaced_phrase() {
        let words = vec![
            make_word("Total", 0.10, 0.3, 0.15).with_break(TextBreak::Space),
            make_word("cholesterol", 0.158, 0.3, 0.25),
            make_word("210", 0.6, 0.3, 0.65),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(texts(&merged), vec!["Total cholesterol", "210"]);
        assert!((merged[0].bbox.left() - 0.10).abs() < 1e-6);
        assert!((merged[0].bbox.right() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_merge_glues_fragments() {
        let words = vec![
            make_word("mg", 0.70, 0.3, 0.72),
            make_word("/", 0.7205, 0.3, 0.725),
            make_word("dL", 0.7255, 0.3, 0.74),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(texts(&merged), vec!["mg/dL"]);
    }

    #[test]
    fn test_merge_respects_wide_breaks() {
        let words = vec![
            make_word("Glucose", 0.10, 0.3, 0.18).with_break(TextBreak::SureSpace),
            make_word("95", 0.185, 0.3, 0.2),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(texts(&merged), vec!["Glucose", "95"]);
    }

    #[test]
    fn test_merge_keeps_value_and_unit_apart() {
        let words = vec![
            make_word("95", 0.40, 0.3, 0.43).with_break(TextBreak::Space),
            make_word("mg/dL", 0.436, 0.3, 0.49).with_break(TextBreak::Space),
            make_word("fasting", 0.496, 0.3, 0.55),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(texts(&merged), vec!["95", "mg/dL fasting"]);

        let words = vec![
            make_word("g/dL", 0.40, 0.3, 0.44).with_break(TextBreak::Space),
            make_word("13.5", 0.446, 0.3, 0.48),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(texts(&merged), vec!["g/dL", "13.5"]);
    }

    #[test]
    fn test_merge_spaced_range() {
        let words = vec![
            make_word("70", 0.60, 0.3, 0.62).with_break(TextBreak::Space),
            make_word("-", 0.626, 0.3, 0.63).with_break(TextBreak::Space),
            make_word("100", 0.636, 0.3, 0.66),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(texts(&merged), vec!["70 - 100"]);
    }

    #[test]
    fn test_numeric_fragment() {
        assert!(is_numeric_fragment("95"));
        assert!(is_numeric_fragment("4,8"));
        assert!(is_numeric_fragment("(70-100)"));
        assert!(is_numeric_fragment("-"));
        assert!(!is_numeric_fragment("mg/dL"));
        assert!(!is_numeric_fragment("10^6/uL"));
        assert!(!is_numeric_fragment(""));
    }

    #[test]
    fn test_merge_keeps_columns_apart() {
        let words = vec![
            make_word("Glucose", 0.1, 0.3, 0.2),
            make_word("95", 0.5, 0.3, 0.55),
            make_word("mg/dL", 0.7, 0.3, 0.8),
        ];
        let merged = merge_words(words, &LayoutOptions::default());
        assert_eq!(merged.len(), 3);
    }
}
