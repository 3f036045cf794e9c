//! Error types for plant_core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run or a dashboard load.
///
/// Per-case failures during a run are not represented here; they are recorded
/// on the [`crate::PredictionResult`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The test case table does not exist
    #[error("Test case file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// A test case row could not be coerced into the schema
    #[error("Invalid test case on row {row}: {reason}")]
    InvalidTestCase {
        /// 1-based data row number
        row: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The results table has no header line at all
    #[error("Results table is empty")]
    EmptyTable,

    /// A table header lacks a column that is required to read it
    #[error("Table is missing required column `{0}`")]
    MissingColumn(&'static str),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Results source error
    #[error(transparent)]
    Source(#[from] crate::source::SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_mentions_path() {
        let err = Error::MissingInput(PathBuf::from("plant_ai_test_cases.csv"));
        assert!(err.to_string().contains("plant_ai_test_cases.csv"));
    }

    #[test]
    fn invalid_test_case_mentions_row() {
        let err = Error::InvalidTestCase {
            row: 3,
            reason: "missing field `image_path`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("image_path"));
    }

    #[test]
    fn missing_column_names_the_column() {
        let err = Error::MissingColumn("confidence");
        assert_eq!(
            err.to_string(),
            "Table is missing required column `confidence`"
        );
    }
}
