//! Shard identification, parsing, and the per-session shard cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use verdict_core::RawRow;

use crate::config::SourceConfig;
use crate::source::{DataSource, FetchError};

const BOM: char = '\u{feff}';

/// Quality tier of a shard pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Curated cases with no known data-quality issues.
    Perfect,
    /// Filtered but less curated cases.
    Standard,
}

impl PoolKind {
    /// Tag used in shard file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Standard => "filtered",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perfect => f.write_str("perfect"),
            Self::Standard => f.write_str("standard"),
        }
    }
}

/// One shard file of one pool of one region. Indices start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardId {
    pub region: String,
    pub pool: PoolKind,
    pub index: u32,
}

impl ShardId {
    pub fn new(region: impl Into<String>, pool: PoolKind, index: u32) -> Self {
        Self {
            region: region.into(),
            pool,
            index,
        }
    }

    /// `{region}_{perfect|filtered}_{index:02}`
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{:02}", self.region, self.pool.file_tag(), self.index)
    }
}

/// Parse header-driven tabular text into rows.
///
/// A leading byte-order mark is dropped, header names are trimmed, short
/// rows simply lack the missing columns, and rows whose cells are all blank
/// are skipped.
pub fn parse_rows(text: &str) -> Result<Vec<RawRow>, csv::Error> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

type ShardSlot = Arc<OnceCell<Arc<Vec<RawRow>>>>;

/// Parsed shards keyed by shard path, owned by one session.
///
/// Concurrent requests for the same shard share a single fetch. Successful
/// parses are kept for the cache's lifetime; misses and failures are not,
/// so a later request tries again.
pub struct ShardCache {
    source: Arc<dyn DataSource>,
    config: SourceConfig,
    slots: Mutex<HashMap<String, ShardSlot>>,
}

impl ShardCache {
    pub fn new(source: Arc<dyn DataSource>, config: SourceConfig) -> Self {
        Self {
            source,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Rows of a shard, or no rows if it is missing or unreadable.
    pub async fn fetch_shard(&self, shard: &ShardId) -> Arc<Vec<RawRow>> {
        let path = self.config.shard_path(shard);
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(slots.entry(path.clone()).or_default())
        };

        let loaded = slot
            .get_or_try_init(|| async {
                let text = self.source.fetch_text(&path).await?;
                let rows = parse_rows(&text)?;
                info!(shard = %path, rows = rows.len(), "loaded shard");
                Ok::<_, FetchError>(Arc::new(rows))
            })
            .await;

        match loaded {
            Ok(rows) => Arc::clone(rows),
            Err(e) if e.is_not_found() => {
                debug!(shard = %path, "shard not present");
                Arc::default()
            }
            Err(e) => {
                warn!(shard = %path, error = %e, "shard unavailable");
                Arc::default()
            }
        }
    }

    /// Number of shards currently held.
    pub fn cached(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    const SHARD: &str = "data/perfect/110101_perfect_01.csv";

    fn cache(source: &Arc<MemorySource>) -> ShardCache {
        ShardCache::new(source.clone(), SourceConfig::default())
    }

    fn perfect(index: u32) -> ShardId {
        ShardId::new("110101", PoolKind::Perfect, index)
    }

    #[test]
    fn file_stems_are_zero_padded() {
        assert_eq!(perfect(7).file_stem(), "110101_perfect_07");
        assert_eq!(
            ShardId::new("3101", PoolKind::Standard, 10).file_stem(),
            "3101_filtered_10"
        );
    }

    #[test]
    fn parse_strips_bom_and_blank_rows() {
        let text = "\u{feff} 案号 ,姓名\nA-1,张某\n,\n  ,  \nA-2,李某\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["案号"], "A-1");
        assert_eq!(rows[1]["姓名"], "李某");
    }

    #[test]
    fn parse_tolerates_short_rows_and_quoted_newlines() {
        let text = "案号,姓名,SECTION_5_经审理查明的犯罪事实\nA-1\nA-2,王某,\"第一行\n第二行\"\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("姓名"));
        assert_eq!(rows[1]["SECTION_5_经审理查明的犯罪事实"], "第一行\n第二行");
    }

    #[tokio::test]
    async fn cache_hit_does_no_io() {
        let source = Arc::new(MemorySource::new().with_file(SHARD, "案号\nA-1\n"));
        let cache = cache(&source);
        let first = cache.fetch_shard(&perfect(1)).await;
        let second = cache.fetch_shard(&perfect(1)).await;
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches_of(SHARD), 1);
        assert_eq!(cache.cached(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_fetch() {
        let source = Arc::new(MemorySource::new().with_file(SHARD, "案号\nA-1\n"));
        let cache = cache(&source);
        let (first, second) = (perfect(1), perfect(1));
        let (a, b) = tokio::join!(cache.fetch_shard(&first), cache.fetch_shard(&second));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.fetches_of(SHARD), 1);
    }

    #[tokio::test]
    async fn missing_shard_is_empty_and_not_cached() {
        let source = Arc::new(MemorySource::new());
        let cache = cache(&source);
        assert!(cache.fetch_shard(&perfect(2)).await.is_empty());
        assert!(cache.fetch_shard(&perfect(2)).await.is_empty());
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(cache.cached(), 0);
    }

    #[tokio::test]
    async fn server_error_is_empty() {
        let source = Arc::new(MemorySource::new().with_failure(SHARD));
        let cache = cache(&source);
        assert!(cache.fetch_shard(&perfect(1)).await.is_empty());
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let source = Arc::new(MemorySource::new().with_file(SHARD, "案号\nA-1\n"));
        let cache = cache(&source);
        cache.fetch_shard(&perfect(1)).await;
        cache.clear();
        cache.fetch_shard(&perfect(1)).await;
        assert_eq!(source.fetches_of(SHARD), 2);
    }
}
