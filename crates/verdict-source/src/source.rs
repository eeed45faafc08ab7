//! Where case data comes from: an HTTP data host or a local directory.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// A missing file is an expected outcome (shard numbering is sparse).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read-only text fetches by data-root-relative path.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError>;
}

/// Pick a source for a `--data` argument: URLs go over HTTP, anything else
/// is a local directory.
pub fn source_for(location: &str) -> Arc<dyn DataSource> {
    #[cfg(feature = "http")]
    if location.starts_with("http://") || location.starts_with("https://") {
        return Arc::new(HttpSource::new(location.to_string()));
    }
    Arc::new(DirSource::new(location))
}

// ── HTTP ──

/// Fetches data files from a static web host.
#[cfg(feature = "http")]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpSource {
    /// `base_url` should be like `https://example.org/game` (a trailing
    /// slash is dropped).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url(path);
        debug!(url = %url, "fetching");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}

// ── Local directory ──

/// Reads data files from a directory laid out like the web host.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for DirSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let full = self.root.join(path.trim_start_matches('/'));
        debug!(path = %full.display(), "reading");
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(full.display().to_string()))
            }
            Err(source) => Err(FetchError::Io { path: full, source }),
        }
    }
}

// ── In memory ──

/// Fixed set of files held in memory; records every fetch it serves.
///
/// Each fetch yields to the scheduler once before answering so that
/// concurrent callers genuinely overlap.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
    failing: HashSet<String>,
    log: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    /// Make fetches of `path` fail with a server error.
    pub fn with_failure(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Total fetches served, including misses and failures.
    pub fn fetch_count(&self) -> usize {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn fetches_of(&self, path: &str) -> usize {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|p| *p == path)
            .count()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        tokio::task::yield_now().await;
        if self.failing.contains(path) {
            return Err(FetchError::Server {
                status: 500,
                body: "internal error".into(),
            });
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
