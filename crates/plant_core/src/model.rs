use serde::{Deserialize, Serialize};

/// One configured input: an image, the label we expect back, and the
/// conditions the photo was taken under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub test_id: String,
    #[serde(default)]
    pub crop: String,
    #[serde(default)]
    pub disease: String,
    /// Path of the image, relative to the working directory.
    pub image_path: String,
    #[serde(default)]
    pub expected_label: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub image_quality: String,
    #[serde(default)]
    pub lighting: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub weather_season: String,
}

impl TestCase {
    /// Non-empty test-condition metadata as display pairs, in a fixed order.
    pub fn conditions(&self) -> Vec<(&'static str, &str)> {
        [
            ("Severity", self.severity.as_str()),
            ("Area", self.area.as_str()),
            ("Focus", self.focus.as_str()),
            ("Image Quality", self.image_quality.as_str()),
            ("Lighting", self.lighting.as_str()),
            ("Visibility", self.visibility.as_str()),
            ("Weather/Season", self.weather_season.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }

    /// "Crop / Disease", skipping whichever half is empty.
    pub fn subject(&self) -> String {
        match (self.crop.trim(), self.disease.trim()) {
            ("", "") => String::new(),
            (crop, "") => crop.to_string(),
            ("", disease) => disease.to_string(),
            (crop, disease) => format!("{crop} / {disease}"),
        }
    }
}

/// Recorded outcome of running one [`TestCase`] against the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub case: TestCase,
    /// Top label returned by the API; empty on failure.
    pub predicted_label: String,
    /// Confidence in [0,1]. Always set by the runner; may be absent in a
    /// results table read back from disk.
    pub confidence: Option<f64>,
    pub pass: bool,
    /// Human-readable cause when the case could not be evaluated.
    pub error: Option<String>,
    pub latency_secs: Option<f64>,
    /// RFC 3339 time the result was recorded.
    pub timestamp: Option<String>,
}

impl PredictionResult {
    /// Whether the API call resolved with a usable prediction.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics over a result set. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// `passed / total`, or 0 for an empty set.
    pub accuracy: f64,
    /// Mean confidence over successful results that carry one.
    pub avg_confidence: Option<f64>,
}

impl RunSummary {
    pub fn compute(results: &[PredictionResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.pass).count();
        let accuracy = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64
        };

        let confidences: Vec<f64> = results
            .iter()
            .filter(|r| r.succeeded())
            .filter_map(|r| r.confidence)
            .collect();
        let avg_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
        };

        Self {
            total,
            passed,
            failed: total - passed,
            accuracy,
            avg_confidence,
        }
    }
}
