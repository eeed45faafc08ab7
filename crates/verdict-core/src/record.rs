//! Persisted per-judgment history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One judged case, as kept in the player's rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayHistoryRecord {
    pub case_id: String,
    pub score: u32,
    pub score_delta: i64,
    pub region: String,
    pub cause: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl PlayHistoryRecord {
    /// Record stamped with the current time.
    pub fn now(
        case_id: impl Into<String>,
        score: u32,
        score_delta: i64,
        region: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            score,
            score_delta,
            region: region.into(),
            cause: cause.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_serialises_as_epoch_millis() {
        let record = PlayHistoryRecord {
            case_id: "A-1".into(),
            score: 72,
            score_delta: 24,
            region: "110101".into(),
            cause: "盗窃".into(),
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        let parsed: PlayHistoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
