//! Disease identification API client.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{ApiKey, RunnerConfig};
use crate::labels::Candidate;

/// Below this `is_plant` probability the image is treated as not a plant.
const PLANT_PROBABILITY_THRESHOLD: f64 = 0.5;
/// How much of an error body is kept in the error message.
const ERROR_BODY_LIMIT: usize = 240;

/// What the API concluded about one image.
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    /// The API does not think the image shows a plant.
    NotAPlant { probability: f64 },
    /// Ranked label suggestions, in the order the API returned them.
    Candidates(Vec<Candidate>),
}

/// Per-image failures. These never abort a run.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("could not read image {}: {source}", .path.display())]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Request(String),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("no disease suggestions returned")]
    NoSuggestions,
}

/// Anything that can turn an image into label suggestions.
pub trait DiseaseClassifier {
    fn identify(&self, image: &Path) -> Result<Identification, ClassifyError>;
}

impl<T: DiseaseClassifier + ?Sized> DiseaseClassifier for &T {
    fn identify(&self, image: &Path) -> Result<Identification, ClassifyError> {
        (**self).identify(image)
    }
}

/// Client for the Plant.id health assessment endpoint.
pub struct PlantIdClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: ApiKey,
}

impl PlantIdClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, ClassifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifyError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(cfg: &RunnerConfig) -> Result<Self, ClassifyError> {
        Self::new(cfg.endpoint.clone(), cfg.api_key.clone(), cfg.timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DiseaseClassifier for PlantIdClient {
    fn identify(&self, image: &Path) -> Result<Identification, ClassifyError> {
        let data_url = encode_image(image)?;
        tracing::debug!(
            endpoint = %self.endpoint,
            image = %image.display(),
            api_key = ?self.api_key,
            "sending health assessment request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", self.api_key.expose())
            .json(&serde_json::json!({ "images": [data_url] }))
            .send()
            .map_err(|e| ClassifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "health assessment request rejected");
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let body = response
            .text()
            .map_err(|e| ClassifyError::Request(e.to_string()))?;
        let payload: HealthAssessment = serde_json::from_str(&body)
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;
        interpret(payload)
    }
}

#[derive(Debug, Default, Deserialize)]
struct HealthAssessment {
    #[serde(default)]
    result: Option<AssessmentResult>,
}

#[derive(Debug, Default, Deserialize)]
struct AssessmentResult {
    #[serde(default)]
    is_plant: Option<IsPlant>,
    #[serde(default)]
    disease: Option<DiseaseBlock>,
}

#[derive(Debug, Deserialize)]
struct IsPlant {
    #[serde(default = "default_true")]
    binary: bool,
    #[serde(default = "default_one")]
    probability: f64,
}

#[derive(Debug, Default, Deserialize)]
struct DiseaseBlock {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(default)]
    name: String,
    #[serde(default)]
    probability: f64,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn interpret(payload: HealthAssessment) -> Result<Identification, ClassifyError> {
    let result = payload.result.unwrap_or_default();

    if let Some(is_plant) = result.is_plant {
        tracing::debug!(
            binary = is_plant.binary,
            probability = is_plant.probability,
            "plant detection"
        );
        if !is_plant.binary || is_plant.probability < PLANT_PROBABILITY_THRESHOLD {
            tracing::warn!("image does not appear to be a plant");
            return Ok(Identification::NotAPlant {
                probability: is_plant.probability,
            });
        }
    }

    let suggestions = result.disease.unwrap_or_default().suggestions;
    if suggestions.is_empty() {
        return Err(ClassifyError::NoSuggestions);
    }

    let candidates: Vec<Candidate> = suggestions
        .into_iter()
        .map(|s| Candidate {
            label: s.name,
            confidence: s.probability,
        })
        .collect();
    for (idx, c) in candidates.iter().enumerate() {
        tracing::debug!("suggestion {}: {} ({:.4})", idx + 1, c.label, c.confidence);
    }
    Ok(Identification::Candidates(candidates))
}

/// Read an image and encode it as a base64 data URL.
fn encode_image(path: &Path) -> Result<String, ClassifyError> {
    if !path.is_file() {
        return Err(ClassifyError::ImageNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| ClassifyError::ImageUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!(
        "data:{};base64,{}",
        mime_type(path),
        BASE64.encode(bytes)
    ))
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
