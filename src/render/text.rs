//! Plain text summary of an analyzed report.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::model::{Measurement, Report};

/// Summarize a report: one line per measurement, then the warnings.
///
/// Returns an empty string for a report that has not been analyzed.
pub fn to_text(report: &Report) -> Result<String> {
    let mut output = String::new();
    write_summary(&mut output, report)
        .map_err(|e| Error::Render(format!("text formatting error: {}", e)))?;
    Ok(output.trim_end().to_string())
}

fn write_summary(out: &mut String, report: &Report) -> std::fmt::Result {
    for m in report.measurements() {
        writeln!(out, "{}", measurement_line(m))?;
    }

    let warnings = report.warnings();
    if !warnings.is_empty() {
        if !report.measurements().is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "Warnings:")?;
        for warning in warnings {
            writeln!(out, "  {}", warning)?;
        }
    }
    Ok(())
}

fn measurement_line(m: &Measurement) -> String {
    let mut line = format!("{}\t{} {}", m.biomarker_id, m.value, m.unit);
    if let Some(range) = &m.range {
        let _ = write!(line, "\t[{} - {}]", range.low, range.high);
        if m.is_in_range() == Some(false) {
            line.push_str(" *");
        }
    }
    let _ = write!(line, "\tp{}", m.page_number);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, MeasurementMetadata, Page, Range, Warning};

    fn measurement(value: f64) -> Measurement {
        Measurement {
            biomarker_id: "glucose".to_string(),
            value,
            text: value.to_string(),
            unit: "mg/dL".to_string(),
            range: Some(Range::new(70.0, 100.0)),
            page_number: 1,
            line_index: 0,
            bbox: None,
            metadata: MeasurementMetadata::default(),
        }
    }

    #[test]
    fn test_to_text() {
        let mut report = Report::new(vec![Page::new(1, 100, 100)]).unwrap();
        report.measurements = Some(vec![measurement(95.0), measurement(120.0)]);
        report.metadata.warnings = Some(vec![Warning::unprocessed_biomarker(
            "HDL",
            1,
            BoundingBox::from_coords(0.0, 0.0, 0.1, 0.1),
        )]);

        let text = to_text(&report).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "glucose\t95 mg/dL\t[70 - 100]\tp1");
        assert_eq!(lines[1], "glucose\t120 mg/dL\t[70 - 100] *\tp1");
        assert_eq!(lines[3], "Warnings:");
        assert!(lines[4].contains("E001: 'HDL'"));
    }

    #[test]
    fn test_unanalyzed_report() {
        let report = Report::new(vec![Page::new(1, 100, 100)]).unwrap();
        assert_eq!(to_text(&report).unwrap(), "");
    }
}
