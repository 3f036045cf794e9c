//! Where the dashboard gets its results table (and the images it references).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use crate::table::RESULTS_CSV;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no results source selected")]
    NotSelected,

    #[error("results file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("fetch of {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// A results table plus the images it points at.
pub trait ResultsSource {
    /// Short human-readable description (a path or URL).
    fn describe(&self) -> String;

    /// Fetch the raw table text.
    fn fetch(&self) -> Result<String, SourceError>;

    /// Load the bytes of an image referenced by a result's `image_path`.
    fn load_image(&self, image_path: &str) -> Result<Vec<u8>, SourceError>;
}

/// Results table on the local filesystem. Relative image paths resolve
/// against the directory holding the table, which is where the runner wrote it.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn resolve_image(&self, image_path: &str) -> PathBuf {
        let image = Path::new(image_path);
        if image.is_absolute() {
            return image.to_path_buf();
        }
        self.path
            .parent()
            .map(|dir| dir.join(image))
            .unwrap_or_else(|| image.to_path_buf())
    }
}

impl ResultsSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String, SourceError> {
        if !self.path.is_file() {
            return Err(SourceError::NotFound(self.path.clone()));
        }
        fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn load_image(&self, image_path: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve_image(image_path);
        fs::read(&path).map_err(|source| SourceError::Read { path, source })
    }
}

/// Results table served over HTTP. Image paths are joined onto the table URL.
pub struct HttpSource {
    url: Url,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self, SourceError> {
        let url = Url::parse(url).map_err(|e| SourceError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Fetch(e.to_string()))?;
        Ok(Self { url, client })
    }

    fn get(&self, url: Url) -> Result<reqwest::blocking::Response, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| SourceError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

impl ResultsSource for HttpSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    fn fetch(&self) -> Result<String, SourceError> {
        self.get(self.url.clone())?
            .text()
            .map_err(|e| SourceError::Fetch(e.to_string()))
    }

    fn load_image(&self, image_path: &str) -> Result<Vec<u8>, SourceError> {
        let url = self
            .url
            .join(image_path)
            .map_err(|e| SourceError::InvalidUrl {
                url: image_path.to_string(),
                reason: e.to_string(),
            })?;
        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|e| SourceError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Pick a source from the launch context: an `http(s)://` argument is fetched,
/// any other argument is a file, and with no argument the default results file
/// in `cwd` is used when it exists.
pub fn select_source(
    arg: Option<&str>,
    cwd: &Path,
) -> Result<Option<Box<dyn ResultsSource>>, SourceError> {
    match arg.map(str::trim).filter(|a| !a.is_empty()) {
        Some(arg) if arg.starts_with("http://") || arg.starts_with("https://") => {
            Ok(Some(Box::new(HttpSource::new(arg)?)))
        }
        Some(arg) => {
            let path = Path::new(arg);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            Ok(Some(Box::new(FileSource::new(path))))
        }
        None => {
            let default = cwd.join(RESULTS_CSV);
            Ok(default
                .is_file()
                .then(|| Box::new(FileSource::new(default)) as Box<dyn ResultsSource>))
        }
    }
}
