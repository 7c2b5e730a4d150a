//! Text normalization shared by the dictionary lookups.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a biomarker name for comparison.
///
/// Strips diacritics, lowercases, trims surrounding punctuation and
/// collapses whitespace: `" Glucosio:"` becomes `"glucosio"`.
pub fn normalize_name(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a unit symbol for comparison.
///
/// Maps micro signs to `u`, lowercases, drops whitespace and surrounding
/// brackets: `"(µmol / L)"` becomes `"umol/l"`.
pub fn normalize_unit(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            'µ' | 'μ' => 'u',
            _ => c,
        })
        .collect::<String>()
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace())
        .collect();

    folded
        .trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | ',' | ';' | ':'))
        .to_string()
}

/// Similarity of two strings from their edit distance (1.0 = identical).
pub fn similarity(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(a, b) as f32
}
