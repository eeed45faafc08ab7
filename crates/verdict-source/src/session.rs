//! One player's game session: load a case, judge it, move up the ladder.
//!
//! After each submission the next case for the same region is sampled in the
//! background while the player reads the feedback. Loading a case for that
//! region picks the prefetched one up; switching regions discards it.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use verdict_core::{
    CaseRecord, ChargeCatalog, PlayHistoryRecord, PlayerJudgment, RankStanding, RankTable,
    RankUpdate, ScoreBreakdown, score,
};
use verdict_store::{PlayHistory, Statistics};

use crate::sampler::{CaseSampler, SampleError};
use crate::source::DataSource;

/// Region used when a case does not say where it came from.
pub const DEFAULT_REGION: &str = "110101";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no case is loaded")]
    NoCase,
    #[error("the current case has already been judged")]
    AlreadySubmitted,
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Feedback for one submitted judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub case_id: String,
    pub breakdown: ScoreBreakdown,
    pub rank: RankUpdate,
}

impl Verdict {
    pub fn score(&self) -> u32 {
        self.breakdown.total()
    }
}

struct Prefetch {
    region: String,
    handle: JoinHandle<Result<CaseRecord, SampleError>>,
}

pub struct GameSession {
    sampler: Arc<CaseSampler>,
    ranks: RankTable,
    charges: ChargeCatalog,
    current: Option<CaseRecord>,
    judged: bool,
    judgment: PlayerJudgment,
    prefetch: Option<Prefetch>,
}

impl GameSession {
    pub fn new(sampler: Arc<CaseSampler>, ranks: RankTable) -> Self {
        Self {
            sampler,
            ranks,
            charges: ChargeCatalog::default(),
            current: None,
            judged: false,
            judgment: PlayerJudgment::default(),
            prefetch: None,
        }
    }

    pub fn with_charges(mut self, charges: ChargeCatalog) -> Self {
        self.charges = charges;
        self
    }

    pub fn history(&self) -> &PlayHistory {
        self.sampler.history()
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    pub fn current_case(&self) -> Option<&CaseRecord> {
        self.current.as_ref()
    }

    /// Whether the current case has been submitted.
    pub fn is_judged(&self) -> bool {
        self.judged
    }

    pub fn judgment(&self) -> &PlayerJudgment {
        &self.judgment
    }

    pub fn judgment_mut(&mut self) -> &mut PlayerJudgment {
        &mut self.judgment
    }

    pub fn total_score(&self) -> i64 {
        self.history().total_score()
    }

    pub fn standing(&self) -> RankStanding<'_> {
        self.ranks.tier_for(self.total_score())
    }

    pub fn statistics(&self) -> Statistics {
        self.history().statistics()
    }

    /// Whether a background sample is pending for `region`.
    pub fn has_prefetch_for(&self, region: &str) -> bool {
        self.prefetch.as_ref().is_some_and(|p| p.region == region)
    }

    /// Shuffled charge choices for the current case.
    pub fn charge_options(&self) -> Vec<String> {
        let correct = self
            .current
            .as_ref()
            .map(|c| c.actual.charge.as_str())
            .unwrap_or_default();
        self.sampler
            .with_rng(|rng| self.charges.options(correct, rng))
    }

    /// Make a case for `region` current and reset the player's judgment.
    ///
    /// The previous case is dropped first, so on failure no case is loaded.
    pub async fn load_case(&mut self, region: &str) -> Result<&CaseRecord, SessionError> {
        self.current = None;
        self.judged = false;
        self.judgment = PlayerJudgment::default();
        let case = match self.take_prefetch(region).await {
            Some(case) => case,
            None => self.sampler.sample_case(region).await?,
        };
        info!(region, case_id = %case.id, "case loaded");
        Ok(&*self.current.insert(case))
    }

    async fn take_prefetch(&mut self, region: &str) -> Option<CaseRecord> {
        let prefetch = self.prefetch.take()?;
        if prefetch.region != region {
            debug!(
                stale = %prefetch.region,
                region,
                "discarding prefetch for another region"
            );
            prefetch.handle.abort();
            return None;
        }
        match prefetch.handle.await {
            Ok(Ok(case)) => Some(case),
            Ok(Err(e)) => {
                warn!(region, error = %e, "prefetch found no case");
                None
            }
            Err(e) => {
                warn!(region, error = %e, "prefetch task failed");
                None
            }
        }
    }

    /// Score the current judgment, update rank and history, and start
    /// prefetching the next case.
    ///
    /// Each loaded case can be submitted once. Outside a Tokio runtime the
    /// prefetch is skipped.
    pub fn submit(&mut self) -> Result<Verdict, SessionError> {
        let case = self.current.as_ref().ok_or(SessionError::NoCase)?;
        if self.judged {
            return Err(SessionError::AlreadySubmitted);
        }
        let breakdown = score(case, &self.judgment);
        let total = breakdown.total();

        let history = self.sampler.history();
        let rank = self.ranks.apply(total, history.total_score());
        history.save_total_score(rank.total);
        history.record_judgment(PlayHistoryRecord::now(
            case.id.clone(),
            total,
            rank.delta,
            case.region.clone(),
            case.cause.clone(),
        ));
        info!(
            case_id = %case.id,
            score = total,
            delta = rank.delta,
            total = rank.total,
            "judgment recorded"
        );

        self.judged = true;

        let verdict = Verdict {
            case_id: case.id.clone(),
            breakdown,
            rank,
        };
        let region = if case.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            case.region.clone()
        };
        self.start_prefetch(region);
        Ok(verdict)
    }

    fn start_prefetch(&mut self, region: String) {
        if self.prefetch.is_some() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(region = %region, "no runtime, skipping prefetch");
            return;
        };
        debug!(region = %region, "prefetching next case");
        let sampler = Arc::clone(&self.sampler);
        let target = region.clone();
        let handle = runtime.spawn(async move { sampler.sample_case(&target).await });
        self.prefetch = Some(Prefetch { region, handle });
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        if let Some(prefetch) = self.prefetch.take() {
            prefetch.handle.abort();
        }
    }
}

/// Load the charge catalogue, or an empty one if it cannot be read.
pub async fn load_charge_catalog(source: &dyn DataSource, path: &str) -> ChargeCatalog {
    let loaded = match source.fetch_text(path).await {
        Ok(text) => ChargeCatalog::from_json(&text).map_err(crate::FetchError::from),
        Err(e) => Err(e),
    };
    match loaded {
        Ok(catalog) => {
            info!(path, charges = catalog.entries.len(), "loaded charge catalogue");
            catalog
        }
        Err(e) => {
            warn!(path, error = %e, "charge catalogue unavailable");
            ChargeCatalog::default()
        }
    }
}
