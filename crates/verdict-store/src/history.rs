//! Player progress: cumulative rank score, played cases, and judgment history.

use serde::{Deserialize, Serialize};
use tracing::debug;
use verdict_core::PlayHistoryRecord;

use crate::Persistence;

/// Judgment records kept, oldest evicted first.
pub const HISTORY_CAP: usize = 100;
/// Played case ids kept, oldest evicted first.
pub const PLAYED_CAP: usize = 1000;

pub mod keys {
    pub const TOTAL_SCORE: &str = "judge_total_score";
    pub const PLAYED_CASE_IDS: &str = "played_case_ids";
    pub const GAME_HISTORY: &str = "judge_game_history";
    pub const TOTAL_CASES: &str = "judge_total_cases";
    pub const SCORE_SUM: &str = "judge_score_sum";
    pub const BEST_SCORE: &str = "judge_best_score";
}

/// Aggregate statistics over every judgment ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_cases: u64,
    pub average_score: f64,
    pub best_score: u32,
}

/// Reads and writes player progress through the persistence port.
#[derive(Clone)]
pub struct PlayHistory {
    port: Persistence,
}

impl PlayHistory {
    pub fn new(port: Persistence) -> Self {
        Self { port }
    }

    pub fn total_score(&self) -> i64 {
        self.port.get(keys::TOTAL_SCORE, 0)
    }

    pub fn save_total_score(&self, score: i64) {
        self.port.set(keys::TOTAL_SCORE, &score);
    }

    pub fn played_case_ids(&self) -> Vec<String> {
        self.port.get(keys::PLAYED_CASE_IDS, Vec::new())
    }

    /// Remember a case as played. Empty and already-known ids are ignored.
    pub fn record_played_case(&self, case_id: &str) {
        if case_id.is_empty() {
            return;
        }
        let mut played = self.played_case_ids();
        if played.iter().any(|id| id == case_id) {
            return;
        }
        played.push(case_id.to_string());
        evict_oldest(&mut played, PLAYED_CAP);
        debug!(case_id, played = played.len(), "recorded played case");
        self.port.set(keys::PLAYED_CASE_IDS, &played);
    }

    /// Append a judgment, mark its case played, and fold it into the
    /// running statistics.
    pub fn record_judgment(&self, record: PlayHistoryRecord) {
        self.record_played_case(&record.case_id);

        let total_cases: u64 = self.port.get(keys::TOTAL_CASES, 0);
        let score_sum: u64 = self.port.get(keys::SCORE_SUM, 0);
        let best: u32 = self.port.get(keys::BEST_SCORE, 0);
        self.port.set(keys::TOTAL_CASES, &(total_cases + 1));
        self.port
            .set(keys::SCORE_SUM, &(score_sum + u64::from(record.score)));
        self.port.set(keys::BEST_SCORE, &best.max(record.score));

        let mut history = self.history();
        history.push(record);
        evict_oldest(&mut history, HISTORY_CAP);
        self.port.set(keys::GAME_HISTORY, &history);
    }

    /// Recent judgments, oldest first.
    pub fn history(&self) -> Vec<PlayHistoryRecord> {
        self.port.get(keys::GAME_HISTORY, Vec::new())
    }

    pub fn statistics(&self) -> Statistics {
        let total_cases: u64 = self.port.get(keys::TOTAL_CASES, 0);
        let score_sum: u64 = self.port.get(keys::SCORE_SUM, 0);
        let average_score = if total_cases == 0 {
            0.0
        } else {
            score_sum as f64 / total_cases as f64
        };
        Statistics {
            total_cases,
            average_score,
            best_score: self.port.get(keys::BEST_SCORE, 0),
        }
    }

    /// Forget everything: score, played cases, history, and statistics.
    pub fn reset(&self) {
        self.port.clear();
    }
}

fn evict_oldest<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Arc;

    fn history() -> PlayHistory {
        PlayHistory::new(Persistence::new(Arc::new(MemoryStore::new()), "test"))
    }

    fn record(case_id: &str, score: u32) -> PlayHistoryRecord {
        PlayHistoryRecord::now(case_id, score, 0, "110101", "盗窃")
    }

    #[test]
    fn total_score_defaults_to_zero() {
        let h = history();
        assert_eq!(h.total_score(), 0);
        h.save_total_score(250);
        assert_eq!(h.total_score(), 250);
    }

    #[test]
    fn played_ids_are_deduplicated() {
        let h = history();
        h.record_played_case("a");
        h.record_played_case("b");
        h.record_played_case("a");
        h.record_played_case("");
        assert_eq!(h.played_case_ids(), vec!["a", "b"]);
    }

    #[test]
    fn played_ids_never_exceed_cap() {
        let h = history();
        for i in 0..PLAYED_CAP + 25 {
            h.record_played_case(&format!("case-{i}"));
        }
        let played = h.played_case_ids();
        assert_eq!(played.len(), PLAYED_CAP);
        assert_eq!(played[0], "case-25");
        assert_eq!(played.last().unwrap(), &format!("case-{}", PLAYED_CAP + 24));
    }

    #[test]
    fn history_never_exceeds_cap() {
        let h = history();
        for i in 0..HISTORY_CAP + 10 {
            h.record_judgment(record(&format!("c{i}"), 50));
        }
        let records = h.history();
        assert_eq!(records.len(), HISTORY_CAP);
        assert_eq!(records[0].case_id, "c10");
        assert_eq!(h.statistics().total_cases, (HISTORY_CAP + 10) as u64);
    }

    #[test]
    fn judgment_marks_case_played() {
        let h = history();
        h.record_judgment(record("x-9", 80));
        assert_eq!(h.played_case_ids(), vec!["x-9"]);
    }

    #[test]
    fn statistics_track_average_and_best() {
        let h = history();
        assert_eq!(
            h.statistics(),
            Statistics {
                total_cases: 0,
                average_score: 0.0,
                best_score: 0
            }
        );
        h.record_judgment(record("a", 60));
        h.record_judgment(record("b", 90));
        h.record_judgment(record("c", 75));
        let stats = h.statistics();
        assert_eq!(stats.total_cases, 3);
        assert!((stats.average_score - 75.0).abs() < 1e-9);
        assert_eq!(stats.best_score, 90);
    }

    #[test]
    fn reset_clears_progress() {
        let h = history();
        h.save_total_score(900);
        h.record_judgment(record("a", 60));
        h.reset();
        assert_eq!(h.total_score(), 0);
        assert!(h.history().is_empty());
        assert!(h.played_case_ids().is_empty());
        assert_eq!(h.statistics().total_cases, 0);
    }
}
