//! Verdict scoring: the player's judgment against the court's.
//!
//! The 100 points split as follows:
//!
//! | Component    | Points | Rule                                           |
//! |--------------|--------|------------------------------------------------|
//! | charge       | 50     | exact string match                             |
//! | penalty type | 20     | same main penalty kind                         |
//! | duration     | 0–20   | symmetric term ratio, only when the kind matches |
//! | fine         | 0–10   | flag match, then symmetric amount ratio        |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::case::{ActualJudgment, CaseRecord};
use crate::judgment::PlayerJudgment;

pub const CHARGE_POINTS: u32 = 50;
pub const PENALTY_TYPE_POINTS: u32 = 20;
pub const DURATION_POINTS: u32 = 20;
pub const FINE_POINTS: u32 = 10;

/// How far the player's term is from the court's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deviation {
    WrongPenaltyType,
    Exact,
    TooSevere { years: u64, months: u64 },
    TooLenient { years: u64, months: u64 },
}

impl Deviation {
    fn between(player: &PlayerJudgment, actual: &ActualJudgment) -> Self {
        if Some(player.main_penalty) != actual.main_penalty {
            return Self::WrongPenaltyType;
        }
        let player_months = player.scored_months();
        let actual_months = actual.total_months();
        let diff = player_months.abs_diff(actual_months);
        let (years, months) = (diff / 12, diff % 12);
        match player_months.cmp(&actual_months) {
            std::cmp::Ordering::Equal => Self::Exact,
            std::cmp::Ordering::Greater => Self::TooSevere { years, months },
            std::cmp::Ordering::Less => Self::TooLenient { years, months },
        }
    }
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPenaltyType => f.write_str("wrong penalty type"),
            Self::Exact => f.write_str("exact"),
            Self::TooSevere { years, months } => write!(f, "too severe by {years}y {months}m"),
            Self::TooLenient { years, months } => write!(f, "too lenient by {years}y {months}m"),
        }
    }
}

/// Per-component result of scoring one judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub charge: u32,
    pub charge_correct: bool,
    pub penalty_type: u32,
    pub duration: u32,
    pub fine: u32,
    pub fine_flag_correct: bool,
    pub deviation: Deviation,
}

impl ScoreBreakdown {
    /// Sum of all components, always within 0..=100.
    pub fn total(&self) -> u32 {
        self.charge + self.penalty_type + self.duration + self.fine
    }

    /// Points for the main penalty (type plus duration).
    pub fn penalty(&self) -> u32 {
        self.penalty_type + self.duration
    }
}

/// Score a player's judgment against the case's actual verdict.
pub fn score(case: &CaseRecord, player: &PlayerJudgment) -> ScoreBreakdown {
    let actual = &case.actual;

    let charge_correct = player.charge == actual.charge;
    let charge = if charge_correct { CHARGE_POINTS } else { 0 };

    let (penalty_type, duration) = match actual.main_penalty {
        Some(kind) if kind == player.main_penalty => {
            let duration = if kind.has_term() {
                ratio_points(
                    actual.total_months(),
                    player.scored_months(),
                    DURATION_POINTS,
                )
            } else {
                DURATION_POINTS
            };
            (PENALTY_TYPE_POINTS, duration)
        }
        _ => (0, 0),
    };

    let fine_flag_correct = player.has_fine == actual.has_fine;
    let fine = match (fine_flag_correct, actual.has_fine) {
        (false, _) => 0,
        (true, false) => FINE_POINTS,
        (true, true) => ratio_points(actual.fine_amount, player.fine_amount, FINE_POINTS),
    };

    ScoreBreakdown {
        charge,
        charge_correct,
        penalty_type,
        duration,
        fine,
        fine_flag_correct,
        deviation: Deviation::between(player, actual),
    }
}

/// Symmetric closeness of two quantities scaled to `max` points.
///
/// Order matters: equal values (including 0 vs 0) score full marks before
/// the one-sided-zero check, which scores nothing; otherwise the smaller of
/// the two ratios is scaled and rounded.
fn ratio_points(actual: u64, player: u64, max: u32) -> u32 {
    if actual == player {
        return max;
    }
    if actual == 0 || player == 0 {
        return 0;
    }
    let (a, p) = (actual as f64, player as f64);
    let ratio = (a / p).min(p / a);
    (ratio * f64::from(max)).round() as u32
}
