//! Data layout under the data root.

use serde::{Deserialize, Serialize};

use crate::shard::{PoolKind, ShardId};

/// Paths of the manifest, shard directories, and charge catalogue relative
/// to the data root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub manifest_path: String,
    pub perfect_dir: String,
    pub standard_dir: String,
    pub shard_extension: String,
    pub charges_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            manifest_path: "data/blocks_manifest.json".into(),
            perfect_dir: "data/perfect".into(),
            standard_dir: "data".into(),
            shard_extension: "csv".into(),
            charges_path: "crimes.json".into(),
        }
    }
}

impl SourceConfig {
    /// Path of a shard file, e.g. `data/perfect/110101_perfect_03.csv`.
    pub fn shard_path(&self, shard: &ShardId) -> String {
        let dir = match shard.pool {
            PoolKind::Perfect => &self.perfect_dir,
            PoolKind::Standard => &self.standard_dir,
        };
        let name = shard.file_stem();
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{name}.{}", self.shard_extension)
        } else {
            format!("{dir}/{name}.{}", self.shard_extension)
        }
    }
}
