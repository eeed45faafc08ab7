//! Charge catalogue and multiple-choice charge options.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::shuffle::shuffle;

/// Number of choices offered to the player, the correct charge included.
pub const OPTION_COUNT: usize = 8;

/// A charge name with its frequency in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeFrequency {
    pub name: String,
    pub count: u64,
}

/// All known charges, usually sorted by descending frequency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargeCatalog {
    pub entries: Vec<ChargeFrequency>,
}

impl ChargeCatalog {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the shuffled option list for a case: the correct charge plus up
    /// to seven distractors.
    ///
    /// Distractors are drawn with probability proportional to their corpus
    /// frequency, so common charges show up more often. When seven or fewer
    /// distractors are available they are all used.
    pub fn options<R: Rng + ?Sized>(&self, correct: &str, rng: &mut R) -> Vec<String> {
        let mut options = vec![correct.to_string()];
        let wanted = OPTION_COUNT - 1;

        let mut seen = HashSet::new();
        let pool: Vec<&ChargeFrequency> = self
            .entries
            .iter()
            .filter(|c| c.name != correct && seen.insert(c.name.as_str()))
            .collect();

        let weighted: Vec<&ChargeFrequency> =
            pool.iter().copied().filter(|c| c.count > 0).collect();

        if pool.len() <= wanted {
            options.extend(pool.iter().map(|c| c.name.clone()));
        } else if weighted.len() <= wanted {
            // Not enough weight to draw from; take what carries weight, then
            // top up in catalogue order.
            options.extend(weighted.iter().map(|c| c.name.clone()));
            for c in pool.iter().filter(|c| c.count == 0) {
                if options.len() == OPTION_COUNT {
                    break;
                }
                options.push(c.name.clone());
            }
        } else {
            options.extend(weighted_sample(&weighted, wanted, rng));
        }

        shuffle(&mut options, rng);
        options
    }
}

/// Draw `n` distinct entries without replacement, weighted by count.
fn weighted_sample<R: Rng + ?Sized>(
    pool: &[&ChargeFrequency],
    n: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut remaining: Vec<&ChargeFrequency> = pool.to_vec();
    let mut picked = Vec::with_capacity(n);
    while picked.len() < n && !remaining.is_empty() {
        let total: u64 = remaining.iter().map(|c| c.count).sum();
        let mut target = rng.gen_range(0..total);
        let idx = remaining
            .iter()
            .position(|c| {
                if target < c.count {
                    true
                } else {
                    target -= c.count;
                    false
                }
            })
            .unwrap_or(remaining.len() - 1);
        picked.push(remaining.swap_remove(idx).name.clone());
    }
    picked
}
