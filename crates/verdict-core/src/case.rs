//! Case records built from raw shard rows.
//!
//! Shards are header-driven tables whose column names are the Chinese field
//! labels of the judgment corpus. A [`CaseRecord`] is built once from such a
//! row and never mutated afterwards; every missing or malformed field falls
//! back to a display default instead of failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::judgment::PenaltyKind;

/// One parsed shard row: column header → cell text.
pub type RawRow = HashMap<String, String>;

// ── Column names ──

pub mod columns {
    pub const CASE_ID: &str = "案号";
    pub const REGION: &str = "AdCode";
    pub const COURT: &str = "法院";
    pub const CAUSE: &str = "案由";
    pub const PROCEDURE: &str = "审理程序";
    pub const ORGANIZATION: &str = "审判组织形式";
    pub const IS_OPEN: &str = "是否公开审理";

    pub const MENTAL_STATE: &str = "精神状态";
    pub const PHYSICAL_STATE: &str = "特殊身体状况";
    pub const NAME: &str = "姓名";
    pub const GENDER: &str = "性别";
    pub const BIRTH_DATE: &str = "出生日期";
    pub const EDUCATION: &str = "文化程度";
    pub const OCCUPATION: &str = "职业";
    pub const CRIMINAL_RECORD: &str = "刑事前科";
    pub const AGE: &str = "年龄";
    pub const IS_MINOR: &str = "是否未成年";

    pub const FACTS: &str = "SECTION_5_经审理查明的犯罪事实";
    pub const EVIDENCE: &str = "SECTION_6_证据列举";
    pub const REASONING: &str = "SECTION_7_罪名认定理由";
    pub const VERDICT: &str = "SECTION_10_判决主文";

    pub const RECIDIVIST: &str = "是否累犯";
    pub const ATTEMPT: &str = "是否未遂";
    pub const SURRENDER: &str = "是否自首";
    pub const MERITORIOUS: &str = "是否立功";
    pub const CONFESSED: &str = "是否如实供述";
    pub const PLEA: &str = "是否认罪认罚";
    pub const RESTITUTION: &str = "是否退赃";
    pub const FORGIVENESS: &str = "是否取得谅解";
    pub const SURRENDER_TYPE: &str = "surrender_type";
    pub const ROLE: &str = "主从犯身份";

    pub const CHARGE: &str = "罪名";
    pub const MAIN_PENALTY: &str = "主刑";
    pub const YEARS: &str = "刑期_年";
    pub const MONTHS: &str = "刑期_月";
    pub const DAYS: &str = "刑期_日";
    pub const FINE: &str = "罚金";
    pub const DECISION_DATE: &str = "判决日期";
}

const UNKNOWN: &str = "不详";
const NORMAL: &str = "正常";
const YES: &str = "是";
const FLAG_SET: &str = "1";

/// Whether a raw row carries enough to be shown as a case at all.
///
/// A row is usable when any of the case number, the defendant name, or the
/// facts narrative is non-empty.
pub fn is_valid_row(row: &RawRow) -> bool {
    [columns::CASE_ID, columns::NAME, columns::FACTS]
        .iter()
        .any(|col| row.get(*col).is_some_and(|v| !v.is_empty()))
}

/// The case number of a raw row, if present and non-empty.
pub fn row_case_id(row: &RawRow) -> Option<&str> {
    row.get(columns::CASE_ID)
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
}

/// Defendant physiological status, derived from the free-text mental and
/// physical condition columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysiologicalStatus {
    Normal,
    MentalIllness,
    Blind,
    DeafMute,
    OtherDisability,
}

impl PhysiologicalStatus {
    /// First match wins: mental > blind > deaf-mute > disability > normal.
    pub fn derive(mental: &str, physical: &str) -> Self {
        if mental.contains("精神") || mental.contains("限制刑事责任能力") {
            Self::MentalIllness
        } else if physical.contains('盲') {
            Self::Blind
        } else if physical.contains("聋哑") {
            Self::DeafMute
        } else if physical.contains("残疾") {
            Self::OtherDisability
        } else {
            Self::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "正常",
            Self::MentalIllness => "精神病",
            Self::Blind => "盲人",
            Self::DeafMute => "聋哑",
            Self::OtherDisability => "残疾",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defendant {
    pub name: String,
    pub gender: String,
    pub birth_date: String,
    pub age: u32,
    pub education: String,
    pub occupation: String,
    pub criminal_record: String,
    pub is_minor: bool,
    pub physiological_status: PhysiologicalStatus,
}

/// Statutory sentencing circumstances recorded for the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentencingFactors {
    pub is_recidivist: bool,
    pub is_attempt: bool,
    pub is_surrender: bool,
    pub is_meritorious: bool,
    pub is_confessed: bool,
    pub is_plea_accepted: bool,
    /// Restitution made or victim forgiveness obtained.
    pub is_repented: bool,
    pub surrender_type: String,
    pub role: String,
}

/// The verdict the court actually handed down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualJudgment {
    pub charge: String,
    /// `None` when the corpus records a disposition outside the five main
    /// penalty kinds (or nothing at all).
    pub main_penalty: Option<PenaltyKind>,
    pub main_penalty_text: String,
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub has_fine: bool,
    pub fine_amount: u64,
    pub date: String,
}

impl ActualJudgment {
    /// Total term in months. Days are display-only and not counted.
    pub fn total_months(&self) -> u64 {
        u64::from(self.years) * 12 + u64::from(self.months)
    }

    /// Human-readable penalty, e.g. `有期徒刑 3年 6个月`.
    ///
    /// Life imprisonment and death carry no term and render as the bare kind.
    pub fn formatted_penalty(&self) -> String {
        if self.main_penalty.is_some_and(|k| !k.has_term()) {
            return self.main_penalty_text.clone();
        }
        let mut out = self.main_penalty_text.clone();
        if self.years > 0 {
            out.push_str(&format!(" {}年", self.years));
        }
        if self.months > 0 {
            out.push_str(&format!(" {}个月", self.months));
        }
        if self.days > 0 {
            out.push_str(&format!(" {}日", self.days));
        }
        out
    }
}

/// An immutable case drawn from a region's shards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub region: String,
    pub court: String,
    pub cause: String,
    pub procedure: String,
    pub organization: String,
    pub is_open: bool,
    pub defendant: Defendant,
    pub facts: String,
    pub evidence: String,
    pub legal_reasoning: String,
    pub verdict_text: String,
    pub factors: SentencingFactors,
    pub actual: ActualJudgment,
}

impl CaseRecord {
    /// Build a case from a raw shard row.
    pub fn from_row(row: &RawRow) -> Self {
        use columns as c;

        let mental = text_or(row, c::MENTAL_STATE, NORMAL);
        let physical = text_or(row, c::PHYSICAL_STATE, NORMAL);

        let defendant = Defendant {
            name: text_or(row, c::NAME, UNKNOWN),
            gender: text_or(row, c::GENDER, UNKNOWN),
            birth_date: text_or(row, c::BIRTH_DATE, ""),
            age: lenient_u32(row.get(c::AGE)),
            education: text_or(row, c::EDUCATION, UNKNOWN),
            occupation: text_or(row, c::OCCUPATION, UNKNOWN),
            criminal_record: text_or(row, c::CRIMINAL_RECORD, "无"),
            is_minor: flag(row, c::IS_MINOR),
            physiological_status: PhysiologicalStatus::derive(&mental, &physical),
        };

        let factors = SentencingFactors {
            is_recidivist: flag(row, c::RECIDIVIST),
            is_attempt: flag(row, c::ATTEMPT),
            is_surrender: flag(row, c::SURRENDER),
            is_meritorious: flag(row, c::MERITORIOUS),
            is_confessed: flag(row, c::CONFESSED),
            is_plea_accepted: flag(row, c::PLEA),
            is_repented: flag(row, c::RESTITUTION) || flag(row, c::FORGIVENESS),
            surrender_type: text_or(row, c::SURRENDER_TYPE, "0"),
            role: text_or(row, c::ROLE, "主犯"),
        };

        let main_penalty_text = text_or(row, c::MAIN_PENALTY, "");
        let fine_amount = lenient_u64(row.get(c::FINE));
        let actual = ActualJudgment {
            charge: text_or(row, c::CHARGE, ""),
            main_penalty: PenaltyKind::from_label(&main_penalty_text),
            main_penalty_text,
            years: lenient_u32(row.get(c::YEARS)),
            months: lenient_u32(row.get(c::MONTHS)),
            days: lenient_u32(row.get(c::DAYS)),
            has_fine: fine_amount > 0,
            fine_amount,
            date: text_or(row, c::DECISION_DATE, ""),
        };

        Self {
            id: text_or(row, c::CASE_ID, ""),
            region: text_or(row, c::REGION, ""),
            court: text_or(row, c::COURT, ""),
            cause: text_or(row, c::CAUSE, ""),
            procedure: text_or(row, c::PROCEDURE, ""),
            organization: text_or(row, c::ORGANIZATION, ""),
            is_open: row.get(c::IS_OPEN).is_some_and(|v| v == YES),
            defendant,
            facts: text_or(row, c::FACTS, ""),
            evidence: text_or(row, c::EVIDENCE, ""),
            legal_reasoning: text_or(row, c::REASONING, ""),
            verdict_text: text_or(row, c::VERDICT, ""),
            factors,
            actual,
        }
    }
}

// ── Field coercion ──

fn text_or(row: &RawRow, col: &str, default: &str) -> String {
    match row.get(col) {
        Some(v) if !v.is_empty() => v.clone(),
        _ => default.to_string(),
    }
}

fn flag(row: &RawRow, col: &str) -> bool {
    row.get(col).is_some_and(|v| v == FLAG_SET)
}

/// Parse the leading integer of a cell, the way loose spreadsheet exports
/// need it: surrounding whitespace is ignored, trailing junk after the digits
/// is dropped (`"3年"` → 3), and anything without leading digits is 0.
pub fn lenient_int(raw: &str) -> i64 {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().unwrap_or(0);
    if negative { -value } else { value }
}

fn lenient_u32(raw: Option<&String>) -> u32 {
    raw.map(|s| lenient_int(s).clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

fn lenient_u64(raw: Option<&String>) -> u64 {
    raw.map(|s| lenient_int(s).max(0) as u64).unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub(crate) fn sample_row() -> RawRow {
        row(&[
            (columns::CASE_ID, "(2021)京0101刑初123号"),
            (columns::REGION, "110101"),
            (columns::COURT, "北京市东城区人民法院"),
            (columns::CAUSE, "盗窃"),
            (columns::IS_OPEN, "是"),
            (columns::NAME, "张某"),
            (columns::AGE, "34"),
            (columns::IS_MINOR, "0"),
            (columns::FACTS, "被告人张某于2021年..."),
            (columns::SURRENDER, "1"),
            (columns::FORGIVENESS, "1"),
            (columns::CHARGE, "盗窃罪"),
            (columns::MAIN_PENALTY, "有期徒刑"),
            (columns::YEARS, "3"),
            (columns::MONTHS, "6"),
            (columns::FINE, "5000"),
            (columns::DECISION_DATE, "2021-06-01"),
        ])
    }

    #[test]
    fn builds_case_from_row() {
        let case = CaseRecord::from_row(&sample_row());
        assert_eq!(case.id, "(2021)京0101刑初123号");
        assert_eq!(case.region, "110101");
        assert!(case.is_open);
        assert_eq!(case.defendant.name, "张某");
        assert_eq!(case.defendant.age, 34);
        assert!(!case.defendant.is_minor);
        assert!(case.factors.is_surrender);
        assert!(case.factors.is_repented);
        assert!(!case.factors.is_recidivist);
        assert_eq!(case.actual.charge, "盗窃罪");
        assert_eq!(case.actual.main_penalty, Some(PenaltyKind::FixedTerm));
        assert_eq!(case.actual.total_months(), 42);
        assert!(case.actual.has_fine);
        assert_eq!(case.actual.fine_amount, 5000);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let case = CaseRecord::from_row(&row(&[(columns::CASE_ID, "X-1")]));
        assert_eq!(case.defendant.name, "不详");
        assert_eq!(case.defendant.gender, "不详");
        assert_eq!(case.defendant.criminal_record, "无");
        assert_eq!(case.factors.surrender_type, "0");
        assert_eq!(case.factors.role, "主犯");
        assert_eq!(case.defendant.physiological_status, PhysiologicalStatus::Normal);
        assert_eq!(case.actual.main_penalty, None);
        assert!(!case.actual.has_fine);
        assert!(!case.is_open);
    }

    #[test]
    fn is_open_requires_literal_yes() {
        let case = CaseRecord::from_row(&row(&[(columns::IS_OPEN, "否")]));
        assert!(!case.is_open);
        let case = CaseRecord::from_row(&row(&[(columns::IS_OPEN, "1")]));
        assert!(!case.is_open);
    }

    #[test]
    fn physiological_status_priority() {
        use PhysiologicalStatus::*;
        assert_eq!(PhysiologicalStatus::derive("限制刑事责任能力", "盲"), MentalIllness);
        assert_eq!(PhysiologicalStatus::derive("正常", "双目失明 盲人"), Blind);
        assert_eq!(PhysiologicalStatus::derive("正常", "聋哑 残疾"), DeafMute);
        assert_eq!(PhysiologicalStatus::derive("正常", "肢体残疾"), OtherDisability);
        assert_eq!(PhysiologicalStatus::derive("正常", "正常"), Normal);
    }

    #[test]
    fn malformed_numbers_coerce_to_zero() {
        let case = CaseRecord::from_row(&row(&[
            (columns::YEARS, "三"),
            (columns::MONTHS, "-4"),
            (columns::FINE, "n/a"),
            (columns::AGE, ""),
        ]));
        assert_eq!(case.actual.years, 0);
        assert_eq!(case.actual.months, 0);
        assert_eq!(case.actual.fine_amount, 0);
        assert!(!case.actual.has_fine);
        assert_eq!(case.defendant.age, 0);
    }

    #[test]
    fn lenient_int_takes_leading_digits() {
        assert_eq!(lenient_int("3年"), 3);
        assert_eq!(lenient_int("  12 "), 12);
        assert_eq!(lenient_int("2.9"), 2);
        assert_eq!(lenient_int("-7"), -7);
        assert_eq!(lenient_int(""), 0);
        assert_eq!(lenient_int("abc"), 0);
    }

    #[test]
    fn row_validity() {
        assert!(is_valid_row(&row(&[(columns::NAME, "李某")])));
        assert!(is_valid_row(&row(&[(columns::FACTS, "事实")])));
        assert!(!is_valid_row(&row(&[(columns::COURT, "某法院")])));
        assert!(!is_valid_row(&row(&[(columns::CASE_ID, "")])));
    }

    #[test]
    fn formatted_penalty() {
        let mut case = CaseRecord::from_row(&sample_row());
        assert_eq!(case.actual.formatted_penalty(), "有期徒刑 3年 6个月");
        case.actual.days = 15;
        case.actual.years = 0;
        assert_eq!(case.actual.formatted_penalty(), "有期徒刑 6个月 15日");

        let life = CaseRecord::from_row(&row(&[
            (columns::MAIN_PENALTY, "无期徒刑"),
            (columns::YEARS, "20"),
        ]));
        assert_eq!(life.actual.formatted_penalty(), "无期徒刑");
    }
}
