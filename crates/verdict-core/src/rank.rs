//! Judge rank ladder and cumulative-score progression.
//!
//! Each tier has a minimum cumulative score and a benchmark: a judgment
//! scoring above the current tier's benchmark raises the cumulative score,
//! one scoring below lowers it. The cumulative score never drops below 0.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale applied to `judgment_score - benchmark`.
pub const SCORE_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("rank table is empty")]
    Empty,
    #[error("rank table must start at a minimum score of 0, got {0}")]
    NonZeroFloor(i64),
    #[error("tier {id} is out of order: ids and minimum scores must strictly increase")]
    OutOfOrder { id: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTier {
    pub id: u32,
    pub name: String,
    pub min_score: i64,
    pub benchmark: u32,
}

/// Where a cumulative score sits on the ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankStanding<'a> {
    pub current: &'a RankTier,
    pub next: Option<&'a RankTier>,
    /// Progress from `current` towards `next`, 0–100 (100 at the top tier).
    pub progress: f64,
}

/// Outcome of applying one judgment to the cumulative score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdate {
    pub delta: i64,
    pub previous: i64,
    pub total: i64,
    pub previous_tier: u32,
    pub tier: u32,
}

impl RankUpdate {
    pub fn promoted(&self) -> bool {
        self.tier > self.previous_tier
    }

    pub fn demoted(&self) -> bool {
        self.tier < self.previous_tier
    }
}

/// Ordered, validated list of rank tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankTable {
    tiers: Vec<RankTier>,
}

impl RankTable {
    /// Validate and wrap a list of tiers.
    ///
    /// The first tier must start at 0 and both ids and minimum scores must
    /// strictly increase.
    pub fn new(tiers: Vec<RankTier>) -> Result<Self, RankError> {
        let first = tiers.first().ok_or(RankError::Empty)?;
        if first.min_score != 0 {
            return Err(RankError::NonZeroFloor(first.min_score));
        }
        for pair in tiers.windows(2) {
            if pair[1].id <= pair[0].id || pair[1].min_score <= pair[0].min_score {
                return Err(RankError::OutOfOrder { id: pair[1].id });
            }
        }
        Ok(Self { tiers })
    }

    /// Load a table from a JSON array of tiers.
    pub fn from_json(json: &str) -> Result<Self, RankTableLoadError> {
        let tiers: Vec<RankTier> = serde_json::from_str(json)?;
        Ok(Self::new(tiers)?)
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// Locate the tier for a cumulative score.
    pub fn tier_for(&self, cumulative: i64) -> RankStanding<'_> {
        // Scan from the top so the first hit is the highest qualifying tier.
        for (i, tier) in self.tiers.iter().enumerate().rev() {
            if cumulative >= tier.min_score {
                let next = self.tiers.get(i + 1);
                let progress = match next {
                    Some(next) => {
                        (cumulative - tier.min_score) as f64
                            / (next.min_score - tier.min_score) as f64
                            * 100.0
                    }
                    None => 100.0,
                };
                return RankStanding {
                    current: tier,
                    next,
                    progress,
                };
            }
        }
        RankStanding {
            current: &self.tiers[0],
            next: self.tiers.get(1),
            progress: 0.0,
        }
    }

    /// Change in cumulative score earned by one judgment.
    pub fn score_delta(&self, judgment_score: u32, cumulative: i64) -> i64 {
        let benchmark = self.tier_for(cumulative).current.benchmark;
        let diff = f64::from(judgment_score) - f64::from(benchmark);
        // Half-up rounding, so -2.5 becomes -2 rather than -3.
        (diff * SCORE_MULTIPLIER + 0.5).floor() as i64
    }

    /// Apply a judgment score, clamping the new cumulative score at 0.
    pub fn apply(&self, judgment_score: u32, cumulative: i64) -> RankUpdate {
        let delta = self.score_delta(judgment_score, cumulative);
        let total = (cumulative + delta).max(0);
        RankUpdate {
            delta,
            previous: cumulative,
            total,
            previous_tier: self.tier_for(cumulative).current.id,
            tier: self.tier_for(total).current.id,
        }
    }
}

impl Default for RankTable {
    /// The standard thirteen-tier judicial ladder.
    fn default() -> Self {
        const LADDER: [(&str, i64, u32); 13] = [
            ("见习法官", 0, 60),
            ("五级法官", 100, 65),
            ("四级法官", 800, 70),
            ("三级法官", 1400, 75),
            ("二级法官", 1900, 80),
            ("一级法官", 2300, 82),
            ("四级高级法官", 2660, 85),
            ("三级高级法官", 2960, 88),
            ("二级高级法官", 3200, 90),
            ("一级高级法官", 3400, 92),
            ("二级大法官", 3560, 94),
            ("一级大法官", 3680, 96),
            ("首席大法官", 3760, 98),
        ];
        let tiers = LADDER
            .iter()
            .zip(0u32..)
            .map(|(&(name, min_score, benchmark), id)| RankTier {
                id,
                name: name.to_string(),
                min_score,
                benchmark,
            })
            .collect();
        Self { tiers }
    }
}

#[derive(Debug, Error)]
pub enum RankTableLoadError {
    #[error("rank table JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] RankError),
}
