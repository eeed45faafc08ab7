//! Non-repeating case selection across a region's shard pools.
//!
//! Selection order, first hit wins:
//!
//! 1. perfect pool, unplayed cases only
//! 2. standard pool, unplayed cases only
//! 3. perfect pool, any case
//! 4. standard pool, any case
//!
//! Within a pool, shards are visited in a fresh random order and the first
//! shard holding a candidate supplies a uniformly chosen row. Once every case
//! in the region has been played, steps 3 and 4 recycle old cases instead of
//! blocking the player.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};
use verdict_core::{CaseRecord, RawRow, is_valid_row, row_case_id, shuffled_indices};
use verdict_store::PlayHistory;

use crate::config::SourceConfig;
use crate::manifest::ManifestResolver;
use crate::shard::{PoolKind, ShardCache, ShardId};
use crate::source::DataSource;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("no case available for region {region}")]
    NoCaseAvailable { region: String },
}

const PLAN: [(PoolKind, bool); 4] = [
    (PoolKind::Perfect, false),
    (PoolKind::Standard, false),
    (PoolKind::Perfect, true),
    (PoolKind::Standard, true),
];

/// Draws cases for a region, remembering what the player has already seen.
pub struct CaseSampler {
    manifest: ManifestResolver,
    shards: ShardCache,
    history: PlayHistory,
    rng: Mutex<StdRng>,
    // One sample at a time per session: the played-id read and the
    // record-as-played write must not interleave with another sample.
    in_flight: tokio::sync::Mutex<()>,
}

impl CaseSampler {
    pub fn new(source: Arc<dyn DataSource>, config: SourceConfig, history: PlayHistory) -> Self {
        Self {
            manifest: ManifestResolver::new(Arc::clone(&source), config.manifest_path.clone()),
            shards: ShardCache::new(source, config),
            history,
            rng: Mutex::new(StdRng::from_entropy()),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the random source with a seeded one for reproducible draws.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn history(&self) -> &PlayHistory {
        &self.history
    }

    /// Run `f` with the sampler's random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }

    /// Draw one case for `region` and mark it as played.
    pub async fn sample_case(&self, region: &str) -> Result<CaseRecord, SampleError> {
        let _guard = self.in_flight.lock().await;

        let played: HashSet<String> = self.history.played_case_ids().into_iter().collect();
        let entry = self.manifest.load().await.entry(region);
        debug!(
            region,
            perfect = entry.perfect,
            standard = entry.standard,
            played = played.len(),
            "sampling case"
        );

        for (step, &(pool, ignore_played)) in PLAN.iter().enumerate() {
            let count = entry.count(pool);
            if count == 0 {
                continue;
            }
            if step == 2 {
                info!(region, "every case in region played, recycling");
            }
            if let Some(row) = self.try_pool(region, pool, count, &played, ignore_played).await {
                let case = CaseRecord::from_row(&row);
                debug!(region, pool = %pool, case_id = %case.id, "sampled case");
                return Ok(case);
            }
        }

        warn!(region, "no usable case in any shard");
        Err(SampleError::NoCaseAvailable {
            region: region.to_string(),
        })
    }

    async fn try_pool(
        &self,
        region: &str,
        pool: PoolKind,
        count: u32,
        played: &HashSet<String>,
        ignore_played: bool,
    ) -> Option<RawRow> {
        let order = self.with_rng(|rng| shuffled_indices(count, rng));

        for index in order {
            let rows = self
                .shards
                .fetch_shard(&ShardId::new(region, pool, index))
                .await;
            let candidates: Vec<&RawRow> = rows
                .iter()
                .filter(|row| is_valid_row(row))
                .filter(|row| {
                    ignore_played || !row_case_id(row).is_some_and(|id| played.contains(id))
                })
                .collect();
            if candidates.is_empty() {
                continue;
            }

            let pick = self.with_rng(|rng| rng.gen_range(0..candidates.len()));
            let row = candidates[pick].clone();
            if !ignore_played && let Some(id) = row_case_id(&row) {
                self.history.record_played_case(id);
            }
            return Some(row);
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::source::MemorySource;
    use verdict_store::{MemoryStore, Persistence};

    pub(crate) const MANIFEST: &str = "data/blocks_manifest.json";
    const HEADER: &str = "案号,AdCode,姓名,SECTION_5_经审理查明的犯罪事实,罪名,主刑,刑期_年,刑期_月,罚金";

    pub(crate) fn shard_text(region: &str, ids: &[&str]) -> String {
        let mut text = format!("{HEADER}\n");
        for id in ids {
            text.push_str(&format!("{id},{region},被告人{id},事实{id},盗窃罪,有期徒刑,1,6,2000\n"));
        }
        text
    }

    pub(crate) fn history() -> PlayHistory {
        PlayHistory::new(Persistence::new(Arc::new(MemoryStore::new()), "test"))
    }

    /// Region 110101: two perfect shards (P1..P4) and two standard shard
    /// slots where only 01 exists (S1, S2). Region 310101: one standard shard.
    pub(crate) fn fixture() -> MemorySource {
        MemorySource::new()
            .with_file(
                MANIFEST,
                r#"{"110101": {"p": 2, "f": 2}, "310101": {"p": 0, "f": 1}, "440101": {"p": 1, "f": 0}}"#,
            )
            .with_file(
                "data/perfect/110101_perfect_01.csv",
                shard_text("110101", &["P1", "P2"]),
            )
            .with_file(
                "data/perfect/110101_perfect_02.csv",
                shard_text("110101", &["P3", "P4"]),
            )
            .with_file("data/110101_filtered_01.csv", shard_text("110101", &["S1", "S2"]))
            .with_file("data/310101_filtered_01.csv", shard_text("310101", &["H1", "H2", "H3"]))
            .with_file(
                "data/perfect/440101_perfect_01.csv",
                "案号,法院\n,某法院\n,另一法院\n",
            )
    }

    fn sampler(source: Arc<MemorySource>, seed: u64) -> CaseSampler {
        CaseSampler::new(source, SourceConfig::default(), history()).with_seed(seed)
    }

    #[tokio::test]
    async fn no_repeats_until_region_exhausted() {
        let sampler = sampler(Arc::new(fixture()), 1);
        let mut seen = HashSet::new();
        for _ in 0..6 {
            let case = sampler.sample_case("110101").await.unwrap();
            assert!(seen.insert(case.id.clone()), "repeated {}", case.id);
        }
        let expected: HashSet<String> = ["P1", "P2", "P3", "P4", "S1", "S2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn perfect_pool_drains_first() {
        let sampler = sampler(Arc::new(fixture()), 2);
        for _ in 0..4 {
            let case = sampler.sample_case("110101").await.unwrap();
            assert!(case.id.starts_with('P'), "got {} before perfect pool drained", case.id);
        }
        let case = sampler.sample_case("110101").await.unwrap();
        assert!(case.id.starts_with('S'));
    }

    #[tokio::test]
    async fn recycles_after_exhaustion() {
        let sampler = sampler(Arc::new(fixture()), 3);
        for _ in 0..6 {
            sampler.sample_case("110101").await.unwrap();
        }
        let recycled = sampler.sample_case("110101").await.unwrap();
        assert!(recycled.id.starts_with('P'), "reset should prefer the perfect pool");
        assert_eq!(sampler.history().played_case_ids().len(), 6);
    }

    #[tokio::test]
    async fn sampled_cases_are_recorded_as_played() {
        let sampler = sampler(Arc::new(fixture()), 4);
        let case = sampler.sample_case("310101").await.unwrap();
        assert_eq!(sampler.history().played_case_ids(), vec![case.id.clone()]);
        assert_eq!(case.region, "310101");
        assert_eq!(case.actual.charge, "盗窃罪");
    }

    #[tokio::test]
    async fn respects_previously_played_history() {
        let sampler = sampler(Arc::new(fixture()), 5);
        for id in ["H1", "H3"] {
            sampler.history().record_played_case(id);
        }
        let case = sampler.sample_case("310101").await.unwrap();
        assert_eq!(case.id, "H2");
    }

    #[tokio::test]
    async fn sparse_shard_numbering_is_tolerated() {
        let source = Arc::new(fixture());
        let sampler = sampler(source.clone(), 6);
        // Drain both perfect shards, then the standard pool must skip the
        // absent 02 shard and find 01.
        for _ in 0..4 {
            sampler.sample_case("110101").await.unwrap();
        }
        for _ in 0..2 {
            let case = sampler.sample_case("110101").await.unwrap();
            assert!(case.id.starts_with('S'));
        }
    }

    #[tokio::test]
    async fn unknown_region_has_no_case() {
        let sampler = sampler(Arc::new(fixture()), 7);
        assert_eq!(
            sampler.sample_case("000000").await,
            Err(SampleError::NoCaseAvailable {
                region: "000000".into()
            })
        );
    }

    #[tokio::test]
    async fn invalid_rows_only_means_no_case() {
        let sampler = sampler(Arc::new(fixture()), 8);
        assert!(sampler.sample_case("440101").await.is_err());
    }

    #[tokio::test]
    async fn missing_manifest_means_no_case() {
        let sampler = sampler(Arc::new(MemorySource::new()), 9);
        assert!(sampler.sample_case("110101").await.is_err());
    }

    #[tokio::test]
    async fn failing_shard_is_skipped() {
        let source = MemorySource::new()
            .with_file(MANIFEST, r#"{"1": {"p": 2, "f": 0}}"#)
            .with_failure("data/perfect/1_perfect_01.csv")
            .with_file("data/perfect/1_perfect_02.csv", shard_text("1", &["OK"]));
        let sampler = sampler(Arc::new(source), 10);
        assert_eq!(sampler.sample_case("1").await.unwrap().id, "OK");
    }

    #[tokio::test]
    async fn shards_are_fetched_once_per_session() {
        let source = Arc::new(fixture());
        let sampler = sampler(source.clone(), 11);
        for _ in 0..12 {
            sampler.sample_case("110101").await.unwrap();
        }
        assert_eq!(source.fetches_of("data/perfect/110101_perfect_01.csv"), 1);
        assert_eq!(source.fetches_of("data/perfect/110101_perfect_02.csv"), 1);
        assert_eq!(source.fetches_of(MANIFEST), 1);
    }

    #[tokio::test]
    async fn concurrent_samples_never_pick_the_same_case() {
        let sampler = Arc::new(sampler(Arc::new(fixture()), 12));
        let (a, b) = tokio::join!(sampler.sample_case("110101"), sampler.sample_case("110101"));

        let spawned = {
            let sampler = Arc::clone(&sampler);
            tokio::spawn(async move { sampler.sample_case("110101").await })
        };
        let c = sampler.sample_case("110101").await.unwrap();
        let d = spawned.await.unwrap().unwrap();

        let ids: HashSet<String> = [a.unwrap(), b.unwrap(), c, d]
            .into_iter()
            .map(|case| case.id)
            .collect();
        assert_eq!(ids.len(), 4);
    }
}
