//! Plant disease API test harness: test case tables, the identification API
//! client, the sequential runner, and the results dashboard model.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod labels;
pub mod model;
pub mod results;
pub mod runner;
pub mod source;
pub mod table;

pub use client::{ClassifyError, DiseaseClassifier, Identification, PlantIdClient};
pub use config::{ApiKey, ConfigError, RunnerConfig};
pub use dashboard::{Dashboard, DashboardState, DashboardView};
pub use error::{Error, Result};
pub use labels::{Candidate, NOT_A_PLANT, labels_match, normalize_label, top_candidate};
pub use model::{PredictionResult, RunSummary, TestCase};
pub use results::{ParsedResults, parse_results};
pub use runner::Runner;
pub use source::{FileSource, HttpSource, ResultsSource, SourceError, select_source};
pub use table::{RESULT_COLUMNS, RESULTS_CSV, ResultsWriter, TEST_CASES_CSV, load_cases, read_cases};
