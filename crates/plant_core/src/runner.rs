//! Sequential test runner: one API call per case, in input order.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::client::{ClassifyError, DiseaseClassifier, Identification};
use crate::error::Result;
use crate::labels::{NOT_A_PLANT, labels_match, top_candidate};
use crate::model::{PredictionResult, TestCase};
use crate::table::ResultsWriter;

pub struct Runner<C> {
    classifier: C,
    image_root: PathBuf,
}

impl<C: DiseaseClassifier> Runner<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            image_root: PathBuf::from("."),
        }
    }

    /// Resolve relative `image_path` values against `root` instead of the
    /// working directory.
    pub fn with_image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = root.into();
        self
    }

    /// Evaluate a single case. Failures become a failed result, never an error.
    pub fn run_case(&self, case: &TestCase) -> PredictionResult {
        let image = self.resolve_image(&case.image_path);
        tracing::info!(
            test_id = %case.test_id,
            subject = %case.subject(),
            image = %image.display(),
            "running test case"
        );

        let start = Instant::now();
        let outcome = if image.is_file() {
            self.classifier.identify(&image)
        } else {
            Err(ClassifyError::ImageNotFound(image.clone()))
        };
        let latency = start.elapsed().as_secs_f64();
        let timestamp = chrono::Local::now().to_rfc3339();

        match outcome.and_then(predicted) {
            Ok((label, confidence)) => {
                let pass = labels_match(&case.expected_label, &label);
                tracing::info!(
                    test_id = %case.test_id,
                    expected = %case.expected_label,
                    predicted = %label,
                    confidence,
                    pass,
                    "test case finished"
                );
                PredictionResult {
                    case: case.clone(),
                    predicted_label: label,
                    confidence: Some(confidence),
                    pass,
                    error: None,
                    latency_secs: Some(latency),
                    timestamp: Some(timestamp),
                }
            }
            Err(err) => {
                tracing::warn!(test_id = %case.test_id, "test case failed: {err}");
                PredictionResult {
                    case: case.clone(),
                    predicted_label: String::new(),
                    confidence: Some(0.0),
                    pass: false,
                    error: Some(err.to_string()),
                    latency_secs: Some(latency),
                    timestamp: Some(timestamp),
                }
            }
        }
    }

    /// Run every case in order, reporting `(done, total, result)` after each.
    pub fn run_with_progress<F>(
        &self,
        cases: &[TestCase],
        mut progress: F,
    ) -> Vec<PredictionResult>
    where
        F: FnMut(usize, usize, &PredictionResult),
    {
        let total = cases.len();
        let mut results = Vec::with_capacity(total);
        for (idx, case) in cases.iter().enumerate() {
            let result = self.run_case(case);
            progress(idx + 1, total, &result);
            results.push(result);
        }
        results
    }

    pub fn run(&self, cases: &[TestCase]) -> Vec<PredictionResult> {
        self.run_with_progress(cases, |_, _, _| {})
    }

    /// Run every case and append each result to `writer` as soon as it is known.
    /// Only write failures abort the run.
    pub fn run_into<W, F>(
        &self,
        cases: &[TestCase],
        writer: &mut ResultsWriter<W>,
        mut progress: F,
    ) -> Result<Vec<PredictionResult>>
    where
        W: io::Write,
        F: FnMut(usize, usize, &PredictionResult),
    {
        let total = cases.len();
        let mut results = Vec::with_capacity(total);
        for (idx, case) in cases.iter().enumerate() {
            let result = self.run_case(case);
            writer.append(&result)?;
            progress(idx + 1, total, &result);
            results.push(result);
        }
        Ok(results)
    }

    /// Run every case, writing the results table at `path` incrementally.
    pub fn run_to_csv<F>(
        &self,
        cases: &[TestCase],
        path: impl AsRef<Path>,
        progress: F,
    ) -> Result<Vec<PredictionResult>>
    where
        F: FnMut(usize, usize, &PredictionResult),
    {
        let mut writer = ResultsWriter::create(path)?;
        self.run_into(cases, &mut writer, progress)
    }

    fn resolve_image(&self, image_path: &str) -> PathBuf {
        let path = Path::new(image_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.image_root.join(path)
        }
    }
}

fn predicted(identification: Identification) -> std::result::Result<(String, f64), ClassifyError> {
    match identification {
        Identification::NotAPlant { .. } => Ok((NOT_A_PLANT.to_string(), 0.0)),
        Identification::Candidates(candidates) => top_candidate(&candidates)
            .map(|best| (best.label.clone(), best.confidence))
            .ok_or(ClassifyError::NoSuggestions),
    }
}
