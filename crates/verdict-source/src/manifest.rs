//! Per-region shard counts.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::shard::PoolKind;
use crate::source::{DataSource, FetchError};

/// Number of shard files a region has in each pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "p", default)]
    pub perfect: u32,
    #[serde(rename = "f", default)]
    pub standard: u32,
}

impl ManifestEntry {
    pub fn count(&self, pool: PoolKind) -> u32 {
        match pool {
            PoolKind::Perfect => self.perfect,
            PoolKind::Standard => self.standard,
        }
    }
}

/// Region code → shard counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    regions: HashMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Counts for a region; unknown regions have no shards in either pool.
    pub fn entry(&self, region: &str) -> ManifestEntry {
        self.regions.get(region).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Loads the manifest once and hands out the shared copy afterwards.
///
/// A failed load is not remembered: the caller gets an empty manifest and
/// the next call tries again.
pub struct ManifestResolver {
    source: Arc<dyn DataSource>,
    path: String,
    manifest: OnceCell<Arc<Manifest>>,
}

impl ManifestResolver {
    pub fn new(source: Arc<dyn DataSource>, path: impl Into<String>) -> Self {
        Self {
            source,
            path: path.into(),
            manifest: OnceCell::new(),
        }
    }

    pub async fn load(&self) -> Arc<Manifest> {
        let loaded = self
            .manifest
            .get_or_try_init(|| async {
                let text = self.source.fetch_text(&self.path).await?;
                let manifest = Manifest::from_json(&text)?;
                info!(path = %self.path, regions = manifest.len(), "loaded shard manifest");
                Ok::<_, FetchError>(Arc::new(manifest))
            })
            .await;
        match loaded {
            Ok(manifest) => Arc::clone(manifest),
            Err(e) => {
                warn!(path = %self.path, error = %e, "shard manifest unavailable");
                Arc::new(Manifest::default())
            }
        }
    }
}
