//! Core game model: case records, player judgments, scoring, and rank ladder.

pub mod case;
pub mod charges;
pub mod judgment;
pub mod rank;
pub mod record;
pub mod scoring;
pub mod shuffle;

pub use case::{
    ActualJudgment, CaseRecord, Defendant, PhysiologicalStatus, RawRow, SentencingFactors,
    is_valid_row, row_case_id,
};
pub use charges::{ChargeCatalog, ChargeFrequency};
pub use judgment::{FactorKind, PenaltyKind, PlayerJudgment, SelectedFactors};
pub use rank::{
    RankError, RankStanding, RankTable, RankTableLoadError, RankTier, RankUpdate, SCORE_MULTIPLIER,
};
pub use record::PlayHistoryRecord;
pub use scoring::{Deviation, ScoreBreakdown, score};
pub use shuffle::{shuffle, shuffled_indices};
