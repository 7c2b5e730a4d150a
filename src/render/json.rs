//! JSON rendering for analyzed reports.

use crate::error::{Error, Result};
use crate::model::Report;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a report to JSON.
pub fn to_json(report: &Report, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(report),
        JsonFormat::Compact => serde_json::to_string(report),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;

    #[test]
    fn test_to_json_pretty() {
        let report = Report::new(vec![Page::new(1, 100, 200)])
            .unwrap()
            .with_source("cbc.json");

        let json = to_json(&report, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"source\""));
        assert!(json.contains("cbc.json"));
        assert!(json.contains('\n'));
        // not analyzed yet
        assert!(!json.contains("\"measurements\""));
    }

    #[test]
    fn test_to_json_compact() {
        let report = Report::new(vec![Page::new(1, 100, 200)]).unwrap();
        let json = to_json(&report, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }
}
