//! Numeric value and reference range parsing.

use std::sync::OnceLock;

use regex::Regex;

use super::{ParsedValue, RangeParser, ValueParser};
use crate::model::Range;

static VALUE_RE: OnceLock<Regex> = OnceLock::new();
static RANGE_RE: OnceLock<Regex> = OnceLock::new();

fn value_regex() -> &'static Regex {
    VALUE_RE.get_or_init(|| {
        // Optional comparator, signed decimal with either separator, then an
        // optional single suffix: a flag such as "H" or "*", or a unit ("mg/dL")
        Regex::new(r"^(?:[<>≤≥]=?\s*)?([+-]?\d+(?:[.,]\d+)?)\s*(?:\*{1,2}|[A-Za-zµμ%]\S*)?$")
            .expect("value regex is valid")
    })
}

fn range_regex() -> &'static Regex {
    RANGE_RE.get_or_init(|| {
        Regex::new(r"^[(\[]?\s*(\d+(?:[.,]\d+)?)\s*[-–—]\s*(\d+(?:[.,]\d+)?)\s*[)\]]?$")
            .expect("range regex is valid")
    })
}

fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parser for the numbers printed on lab reports.
///
/// Values accept either decimal separator and tolerate a leading comparator
/// (`<5`) or a trailing out-of-range flag or unit (`112 H`, `120mg/dL`); the
/// whole token is kept as the value text. Ranges are two
/// non-negative numbers joined by a dash, optionally bracketed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericParser;

impl NumericParser {
    pub fn new() -> Self {
        Self
    }
}

impl ValueParser for NumericParser {
    fn parse_value(&self, text: &str) -> Option<ParsedValue> {
        let trimmed = text.trim();
        let caps = value_regex().captures(trimmed)?;
        let value = parse_number(caps.get(1)?.as_str())?;
        Some(ParsedValue {
            value,
            text: trimmed.to_string(),
        })
    }
}

impl RangeParser for NumericParser {
    fn parse_range(&self, text: &str) -> Option<Range> {
        let caps = range_regex().captures(text.trim())?;
        let low = parse_number(caps.get(1)?.as_str())?;
        let high = parse_number(caps.get(2)?.as_str())?;
        (low <= high).then(|| Range::new(low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        let parser = NumericParser::new();
        assert_eq!(parser.parse_value("95").unwrap().value, 95.0);
        assert_eq!(parser.parse_value("4,8").unwrap().value, 4.8);
        assert_eq!(parser.parse_value(" 5.5 ").unwrap().text, "5.5");
        assert_eq!(parser.parse_value("<0.5").unwrap().value, 0.5);
        assert_eq!(parser.parse_value("112 H").unwrap().value, 112.0);
        assert_eq!(parser.parse_value("-3").unwrap().value, -3.0);
    }

    #[test]
    fn test_parse_value_with_unit_suffix() {
        let parser = NumericParser::new();
        let parsed = parser.parse_value("120mg/dL").unwrap();
        assert_eq!(parsed.value, 120.0);
        assert_eq!(parsed.text, "120mg/dL");
        assert_eq!(parser.parse_value("95 mg/dL").unwrap().value, 95.0);
        assert_eq!(parser.parse_value("5,4%").unwrap().value, 5.4);
        assert_eq!(parser.parse_value("4.8 µmol/L").unwrap().value, 4.8);
    }

    #[test]
    fn test_parse_value_rejects() {
        let parser = NumericParser::new();
        assert!(parser.parse_value("Glucose").is_none());
        assert!(parser.parse_value("mg/dL").is_none());
        assert!(parser.parse_value("70-100").is_none());
        assert!(parser.parse_value("(70-100)").is_none());
        assert!(parser.parse_value("").is_none());
        assert!(parser.parse_value("10^6/uL").is_none());
        assert!(parser.parse_value("2024/05/01").is_none());
        assert!(parser.parse_value("95 mg/dL fasting").is_none());
    }

    #[test]
    fn test_parse_range() {
        let parser = NumericParser::new();
        assert_eq!(parser.parse_range("70-100"), Some(Range::new(70.0, 100.0)));
        assert_eq!(parser.parse_range("(70-100)"), Some(Range::new(70.0, 100.0)));
        assert_eq!(parser.parse_range("[3,9 – 5,5]"), Some(Range::new(3.9, 5.5)));
        assert_eq!(parser.parse_range("0.27 - 4.2"), Some(Range::new(0.27, 4.2)));
    }

    #[test]
    fn test_parse_range_rejects() {
        let parser = NumericParser::new();
        assert!(parser.parse_range("95").is_none());
        assert!(parser.parse_range("100-70").is_none());
        assert!(parser.parse_range("mg/dL").is_none());
    }
}
