//! The player's side of a verdict.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::case::ActualJudgment;

/// The five principal penalties of the criminal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltyKind {
    #[serde(rename = "有期徒刑")]
    FixedTerm,
    #[serde(rename = "拘役")]
    ShortDetention,
    #[serde(rename = "管制")]
    Supervision,
    #[serde(rename = "无期徒刑")]
    Life,
    #[serde(rename = "死刑")]
    Death,
}

impl PenaltyKind {
    pub const ALL: [PenaltyKind; 5] = [
        Self::FixedTerm,
        Self::ShortDetention,
        Self::Supervision,
        Self::Life,
        Self::Death,
    ];

    /// The label used in the corpus and on screen.
    pub fn label(self) -> &'static str {
        match self {
            Self::FixedTerm => "有期徒刑",
            Self::ShortDetention => "拘役",
            Self::Supervision => "管制",
            Self::Life => "无期徒刑",
            Self::Death => "死刑",
        }
    }

    /// Parse a corpus label. Anything outside the five kinds is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label.trim())
    }

    /// Life imprisonment and death have no numeric term.
    pub fn has_term(self) -> bool {
        !matches!(self, Self::Life | Self::Death)
    }
}

impl fmt::Display for PenaltyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Aggravating,
    Mitigating,
}

/// Sentencing factors the player ticked while deliberating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFactors {
    pub aggravating: BTreeSet<String>,
    pub mitigating: BTreeSet<String>,
}

/// Player-editable verdict for the current case.
///
/// Range limits (years ≤ 25, months ≤ 11) belong to the input surface; the
/// scorer accepts any values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJudgment {
    pub charge: String,
    pub main_penalty: PenaltyKind,
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub has_fine: bool,
    pub fine_amount: u64,
    pub factors: SelectedFactors,
}

impl Default for PlayerJudgment {
    fn default() -> Self {
        Self {
            charge: String::new(),
            main_penalty: PenaltyKind::FixedTerm,
            years: 0,
            months: 0,
            days: 0,
            has_fine: false,
            fine_amount: 0,
            factors: SelectedFactors::default(),
        }
    }
}

impl PlayerJudgment {
    /// Mirror a court verdict as a player judgment.
    ///
    /// Dispositions outside the five main kinds map to the default kind.
    pub fn from_actual(actual: &ActualJudgment) -> Self {
        Self {
            charge: actual.charge.clone(),
            main_penalty: actual.main_penalty.unwrap_or(PenaltyKind::FixedTerm),
            years: actual.years,
            months: actual.months,
            days: actual.days,
            has_fine: actual.has_fine,
            fine_amount: actual.fine_amount,
            factors: SelectedFactors::default(),
        }
    }

    /// Term in months as scored (days excluded).
    pub fn scored_months(&self) -> u64 {
        u64::from(self.years) * 12 + u64::from(self.months)
    }

    /// Term in fractional months for display, counting a day as 1/30 month.
    pub fn total_months(&self) -> f64 {
        self.scored_months() as f64 + f64::from(self.days) / 30.0
    }

    /// Add the factor if absent, remove it if present.
    pub fn toggle_factor(&mut self, kind: FactorKind, id: &str) {
        let set = match kind {
            FactorKind::Aggravating => &mut self.factors.aggravating,
            FactorKind::Mitigating => &mut self.factors.mitigating,
        };
        if !set.remove(id) {
            set.insert(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for kind in PenaltyKind::ALL {
            assert_eq!(PenaltyKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(PenaltyKind::from_label("免予刑事处罚"), None);
        assert_eq!(PenaltyKind::from_label(""), None);
    }

    #[test]
    fn serde_uses_corpus_labels() {
        let json = serde_json::to_string(&PenaltyKind::ShortDetention).unwrap();
        assert_eq!(json, "\"拘役\"");
        let kind: PenaltyKind = serde_json::from_str("\"死刑\"").unwrap();
        assert_eq!(kind, PenaltyKind::Death);
    }

    #[test]
    fn default_judgment_is_fixed_term() {
        let j = PlayerJudgment::default();
        assert_eq!(j.main_penalty, PenaltyKind::FixedTerm);
        assert_eq!(j.scored_months(), 0);
        assert!(!j.has_fine);
    }

    #[test]
    fn toggle_factor_adds_then_removes() {
        let mut j = PlayerJudgment::default();
        j.toggle_factor(FactorKind::Mitigating, "surrender");
        j.toggle_factor(FactorKind::Aggravating, "recidivist");
        assert!(j.factors.mitigating.contains("surrender"));
        assert!(j.factors.aggravating.contains("recidivist"));

        j.toggle_factor(FactorKind::Mitigating, "surrender");
        assert!(j.factors.mitigating.is_empty());
        assert_eq!(j.factors.aggravating.len(), 1);
    }

    #[test]
    fn total_months_counts_days_for_display_only() {
        let j = PlayerJudgment {
            years: 1,
            months: 2,
            days: 15,
            ..PlayerJudgment::default()
        };
        assert_eq!(j.scored_months(), 14);
        assert!((j.total_months() - 14.5).abs() < f64::EPSILON);
    }
}
