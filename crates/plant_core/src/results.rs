//! Reading a results table back for display.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{PredictionResult, RunSummary, TestCase};

const REQUIRED_COLUMNS: [&str; 5] = [
    "test_id",
    "expected_label",
    "predicted_label",
    "confidence",
    "pass",
];

/// Valid records plus how many rows had to be dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResults {
    pub records: Vec<PredictionResult>,
    pub skipped: usize,
}

impl ParsedResults {
    pub fn summary(&self) -> RunSummary {
        RunSummary::compute(&self.records)
    }
}

/// Parse results table text. Columns are located by header name, so older
/// tables with a different column order or without the optional columns
/// still load. Rows with the wrong field count, a non-numeric confidence or
/// an unreadable pass flag are skipped and counted.
pub fn parse_results(text: &str) -> Result<ParsedResults> {
    if text.trim().is_empty() {
        return Err(Error::EmptyTable);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name, idx))
        .collect();
    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            return Err(Error::MissingColumn(required));
        }
    }

    let mut parsed = ParsedResults::default();
    for (idx, record) in rdr.records().enumerate() {
        let row_no = idx + 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("skipping results row {row_no}: {e}");
                parsed.skipped += 1;
                continue;
            }
        };
        if record.len() != headers.len() {
            tracing::warn!(
                "skipping results row {row_no}: expected {} fields, found {}",
                headers.len(),
                record.len()
            );
            parsed.skipped += 1;
            continue;
        }
        let field = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
                .to_string()
        };

        let confidence = match parse_optional_f64(&field("confidence")) {
            Some(value) => value,
            None => {
                tracing::warn!("skipping results row {row_no}: confidence is not a number");
                parsed.skipped += 1;
                continue;
            }
        };
        let Some(pass) = parse_flag(&field("pass")) else {
            tracing::warn!("skipping results row {row_no}: unreadable pass flag");
            parsed.skipped += 1;
            continue;
        };
        // latency is informational; a bad value just drops it
        let latency_secs = parse_optional_f64(&field("latency_s")).flatten();

        let error = field("error");
        let timestamp = field("timestamp");
        parsed.records.push(PredictionResult {
            case: TestCase {
                test_id: field("test_id"),
                crop: field("crop"),
                disease: field("disease"),
                image_path: field("image_path"),
                expected_label: field("expected_label"),
                severity: field("severity"),
                area: field("area"),
                focus: field("focus"),
                image_quality: field("image_quality"),
                lighting: field("lighting"),
                visibility: field("visibility"),
                weather_season: field("weather_season"),
            },
            predicted_label: field("predicted_label"),
            confidence,
            pass,
            error: (!error.trim().is_empty()).then_some(error),
            latency_secs,
            timestamp: (!timestamp.trim().is_empty()).then_some(timestamp),
        });
    }

    if parsed.skipped > 0 {
        tracing::warn!("skipped {} malformed result rows", parsed.skipped);
    }
    Ok(parsed)
}

/// `Some(None)` for an empty field, `None` when the field is not a finite number.
fn parse_optional_f64(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Some(v)),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ResultsWriter;
    use anyhow::Result;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const HEADER: &str = "test_id,crop,disease,image_path,expected_label,predicted_label,confidence,pass";

    #[test]
    fn parses_valid_rows_and_summarises() -> Result<()> {
        let text = format!(
            "{HEADER}\n\
             TC01,Tomato,Early Blight,images/a.jpg,Fungi,Fungi,0.87,true\n\
             TC02,Tomato,Early Blight,images/b.jpg,Fungi,Bacteria,0.65,False\n"
        );
        let parsed = parse_results(&text)?;
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].case.crop, "Tomato");
        assert!(parsed.records[0].pass);
        assert!(!parsed.records[1].pass);

        let summary = parsed.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_relative_eq!(summary.accuracy, 0.5, epsilon = 1e-9);
        assert_relative_eq!(summary.avg_confidence.unwrap(), 0.76, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() -> Result<()> {
        let text = format!(
            "{HEADER}\n\
             TC01,Tomato,Blight,a.jpg,Fungi,Fungi,0.87,true\n\
             TC02,Tomato,Blight,b.jpg,Fungi\n\
             TC03,Tomato,Blight,c.jpg,Fungi,Fungi,high,true\n\
             TC04,Tomato,Blight,d.jpg,Fungi,Fungi,0.5,maybe\n\
             TC05,Tomato,Blight,e.jpg,Fungi,Fungi,0.5,true,extra\n"
        );
        let parsed = parse_results(&text)?;
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].case.test_id, "TC01");
        assert_eq!(parsed.skipped, 4);
        Ok(())
    }

    #[test]
    fn empty_confidence_is_kept_but_not_averaged() -> Result<()> {
        let text = format!(
            "{HEADER}\n\
             TC01,,,a.jpg,Fungi,,,false\n\
             TC02,,,b.jpg,Fungi,Fungi,0.9,true\n"
        );
        let parsed = parse_results(&text)?;
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].confidence, None);
        assert_relative_eq!(parsed.summary().avg_confidence.unwrap(), 0.9, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn header_only_gives_empty_view() -> Result<()> {
        let parsed = parse_results(&format!("{HEADER}\n"))?;
        assert!(parsed.records.is_empty());
        let summary = parsed.summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.accuracy, 0.0);
        Ok(())
    }

    #[rstest]
    #[case("")]
    #[case("  \n\n")]
    fn empty_text_is_an_error(#[case] text: &str) {
        assert!(matches!(parse_results(text), Err(Error::EmptyTable)));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = parse_results("test_id,expected_label,predicted_label,pass\nTC01,a,a,true\n")
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn("confidence")));
    }

    #[test]
    fn reads_back_what_the_writer_produced() -> Result<()> {
        let mut writer = ResultsWriter::new(Vec::new())?;
        writer.append(&PredictionResult {
            case: TestCase {
                test_id: "TC01".into(),
                image_path: "a.jpg".into(),
                expected_label: "Fungi".into(),
                lighting: "Bright".into(),
                ..TestCase::default()
            },
            predicted_label: String::new(),
            confidence: Some(0.0),
            pass: false,
            error: Some("request failed: connection refused".into()),
            latency_secs: Some(0.25),
            timestamp: Some("2025-06-01T10:00:00+02:00".into()),
        })?;
        let text = String::from_utf8(writer.into_inner()?)?;

        let parsed = parse_results(&text)?;
        assert_eq!(parsed.skipped, 0);
        let record = &parsed.records[0];
        assert_eq!(record.case.lighting, "Bright");
        assert_eq!(
            record.error.as_deref(),
            Some("request failed: connection refused")
        );
        assert_eq!(record.latency_secs, Some(0.25));
        // failed requests do not drag the average down
        assert_eq!(parsed.summary().avg_confidence, None);
        Ok(())
    }
}
