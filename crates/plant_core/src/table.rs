//! Test case input table and results output table.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{PredictionResult, TestCase};

/// Default input table name, relative to the working directory.
pub const TEST_CASES_CSV: &str = "plant_ai_test_cases.csv";
/// Default output table name, relative to the working directory.
pub const RESULTS_CSV: &str = "plant_ai_test_results.csv";

/// Header of the results table: the input columns followed by the outcome.
pub const RESULT_COLUMNS: [&str; 18] = [
    "test_id",
    "crop",
    "disease",
    "image_path",
    "expected_label",
    "severity",
    "area",
    "focus",
    "image_quality",
    "lighting",
    "visibility",
    "weather_season",
    "predicted_label",
    "confidence",
    "pass",
    "error",
    "latency_s",
    "timestamp",
];

/// Load test cases from a CSV file with a header row.
pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<TestCase>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    read_cases(File::open(path)?)
}

/// Read test cases from any CSV source.
///
/// Optional columns may be absent and short rows are padded with empty fields,
/// so one ragged row never costs the rest of the table. Only a missing
/// `image_path` column is fatal; an empty path is left for the runner to report
/// as a failed case. An empty `test_id` becomes `TC{n:02}` and an empty
/// `expected_label` falls back to "crop disease" in lowercase.
pub fn read_cases<R: io::Read>(reader: R) -> Result<Vec<TestCase>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if !headers.iter().any(|h| h == "image_path") {
        return Err(Error::MissingColumn("image_path"));
    }

    let mut cases = Vec::new();
    for (idx, row) in rdr.records().enumerate() {
        let row_no = idx + 1;
        let invalid = |e: csv::Error| Error::InvalidTestCase {
            row: row_no,
            reason: e.to_string(),
        };
        let mut record = row.map_err(invalid)?;
        if record.len() != headers.len() {
            tracing::warn!(
                "test case row {row_no} has {} fields, header has {}",
                record.len(),
                headers.len()
            );
        }
        while record.len() < headers.len() {
            record.push_field("");
        }
        let mut case: TestCase = record.deserialize(Some(&headers)).map_err(invalid)?;
        if case.test_id.trim().is_empty() {
            case.test_id = format!("TC{row_no:02}");
        }
        if case.expected_label.trim().is_empty()
            && !case.crop.is_empty()
            && !case.disease.is_empty()
        {
            case.expected_label =
                format!("{} {}", case.crop.to_lowercase(), case.disease.to_lowercase());
        }
        cases.push(case);
    }
    Ok(cases)
}

/// Appends results to the output table one row at a time, flushing after each
/// row so an interrupted run still leaves every finished case on disk.
pub struct ResultsWriter<W: io::Write> {
    wtr: csv::Writer<W>,
}

impl ResultsWriter<File> {
    /// Create (or truncate) the results file and write the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: io::Write> ResultsWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut wtr = csv::Writer::from_writer(inner);
        wtr.write_record(RESULT_COLUMNS)?;
        wtr.flush()?;
        Ok(Self { wtr })
    }

    pub fn append(&mut self, result: &PredictionResult) -> Result<()> {
        let case = &result.case;
        let confidence = result
            .confidence
            .map(|c| format!("{c}"))
            .unwrap_or_default();
        let latency = result
            .latency_secs
            .map(|l| format!("{l:.3}"))
            .unwrap_or_default();

        self.wtr.write_record([
            case.test_id.as_str(),
            case.crop.as_str(),
            case.disease.as_str(),
            case.image_path.as_str(),
            case.expected_label.as_str(),
            case.severity.as_str(),
            case.area.as_str(),
            case.focus.as_str(),
            case.image_quality.as_str(),
            case.lighting.as_str(),
            case.visibility.as_str(),
            case.weather_season.as_str(),
            result.predicted_label.as_str(),
            confidence.as_str(),
            if result.pass { "true" } else { "false" },
            result.error.as_deref().unwrap_or(""),
            latency.as_str(),
            result.timestamp.as_deref().unwrap_or(""),
        ])?;
        self.wtr.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| Error::Io(io::Error::other(e.to_string())))
    }
}
