//! Runner configuration: an optional `plant_ai.toml` plus the API key from the
//! environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::table::{RESULTS_CSV, TEST_CASES_CSV};

pub const CONFIG_FILE: &str = "plant_ai.toml";
pub const API_KEY_ENV: &str = "PLANT_ID_API_KEY";
pub const DEFAULT_ENDPOINT: &str = "https://plant.id/api/v3/health_assessment";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured; set PLANT_ID_API_KEY or `api_key` in plant_ai.toml")]
    MissingApiKey,

    #[error("API key contains whitespace or control characters")]
    InvalidApiKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse plant_ai.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Static credential for the identification API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Validate a raw key as read from config or the environment.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::InvalidApiKey);
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Keys accepted in `plant_ai.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_key: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    test_cases: Option<PathBuf>,
    results: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub api_key: ApiKey,
    pub endpoint: String,
    pub timeout: Duration,
    pub test_cases_path: PathBuf,
    pub results_path: PathBuf,
    /// Directory that relative `image_path` values are resolved against.
    pub image_root: PathBuf,
}

impl RunnerConfig {
    /// Load from `dir/plant_ai.toml` (if present) and `PLANT_ID_API_KEY`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE);
        let file = if path.is_file() {
            let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            Some(text)
        } else {
            None
        };
        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::from_sources(dir, file.as_deref(), env_key.as_deref())
    }

    /// Build from already-read sources; the environment key wins over the file.
    pub fn from_sources(
        dir: &Path,
        file: Option<&str>,
        env_key: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let file: FileConfig = match file {
            Some(text) => toml::from_str(text)?,
            None => FileConfig::default(),
        };

        let raw_key = env_key
            .filter(|k| !k.trim().is_empty())
            .map(str::to_string)
            .or(file.api_key)
            .ok_or(ConfigError::MissingApiKey)?;
        let api_key = ApiKey::parse(&raw_key)?;

        let timeout_secs = file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".to_string()));
        }

        let endpoint = file
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL: {endpoint}"
            )));
        }

        Ok(Self {
            api_key,
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
            test_cases_path: dir.join(file.test_cases.unwrap_or_else(|| TEST_CASES_CSV.into())),
            results_path: dir.join(file.results.unwrap_or_else(|| RESULTS_CSV.into())),
            image_root: dir.to_path_buf(),
        })
    }
}
