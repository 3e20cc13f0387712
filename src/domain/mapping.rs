// Mapping from persisted JSON blobs to domain models

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use super::juz;
use super::models::{ResumePosition, TrackerState};

/// Keeps the unique integers in 1..=30. `None` when the value is not an array.
pub fn sanitize_juz_list(value: &Value) -> Option<BTreeSet<u8>> {
    let arr = value.as_array()?;
    Some(
        arr.iter()
            .filter_map(as_integer)
            .filter(|n| juz::is_valid_juz(*n))
            .map(|n| n as u8)
            .collect(),
    )
}

fn as_integer(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

/// Best effort decode of a `khatma_progress_<year>` record.
///
/// Bad juz entries are dropped, missing or ill-typed scalars fall back to
/// their initial values, and anything that is not an object with a
/// `completedJuz` array yields the initial state.
pub fn progress_from_json(raw: &str, year: i32) -> TrackerState {
    let initial = TrackerState::initial(year);
    let record: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable progress record, starting fresh");
            return initial;
        }
    };
    let Some(completed_juz) = record.get("completedJuz").and_then(sanitize_juz_list) else {
        tracing::debug!("progress record has no juz list, starting fresh");
        return initial;
    };

    let last_progress_date = record
        .get("lastProgressDate")
        .and_then(|v| v.as_str())
        .and_then(parse_iso_date);
    let current_round = record
        .get("currentRound")
        .and_then(as_integer)
        .filter(|r| *r >= 1)
        .and_then(|r| u32::try_from(r).ok())
        .unwrap_or(1);
    let completed_rounds = record
        .get("completedRounds")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(as_integer).collect())
        .unwrap_or_default();
    let streak_count = record
        .get("streakCount")
        .and_then(as_integer)
        .and_then(|s| u32::try_from(s).ok())
        .unwrap_or(0);

    TrackerState {
        is_complete: completed_juz.len() >= juz::JUZ_COUNT as usize,
        completed_juz,
        year,
        last_progress_date,
        current_round,
        completed_rounds,
        streak_count,
    }
}

/// Accepts a plain `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

pub fn position_from_json(raw: &str) -> Option<ResumePosition> {
    match serde_json::from_str(raw) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::debug!(error = %e, "malformed resume position ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn corrupt_juz_list_is_sanitized() {
        let raw = json!({
            "completedJuz": [1, 1, 99, "x"],
            "year": 2025,
            "isComplete": true,
            "currentRound": 2,
            "completedRounds": [1700000000000i64],
            "streakCount": 3
        })
        .to_string();
        let state = progress_from_json(&raw, 2025);
        assert_eq!(state.completed_juz.iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(!state.is_complete);
        assert_eq!(state.current_round, 2);
        assert_eq!(state.completed_rounds.len(), 1);
        assert_eq!(state.streak_count, 3);
    }

    #[test]
    fn maxed_out_streak_saturates() {
        let raw = json!({
            "completedJuz": [1],
            "lastProgressDate": "2025-06-08",
            "streakCount": 4294967295u64
        })
        .to_string();
        let mut state = progress_from_json(&raw, 2025);
        assert_eq!(state.streak_count, u32::MAX);

        let today = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(state.streak_days(today), u32::MAX);
        assert!(state.mark(2, today));
        assert_eq!(state.streak_count, u32::MAX);
    }

    #[test]
    fn non_array_juz_list_falls_back_to_initial() {
        let raw = json!({ "completedJuz": "1,2,3", "currentRound": 4 }).to_string();
        assert_eq!(progress_from_json(&raw, 2025), TrackerState::initial(2025));
        assert_eq!(progress_from_json("not json", 2025), TrackerState::initial(2025));
    }

    #[test]
    fn whole_floats_count_as_integers() {
        let set = sanitize_juz_list(&json!([2.0, 2.5, -1, 30])).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![2, 30]);
    }

    #[test]
    fn dates_accept_both_forms() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert_eq!(parse_iso_date("2025-06-09"), Some(d));
        assert_eq!(parse_iso_date("2025-06-09T10:11:12.000Z"), Some(d));
        assert_eq!(parse_iso_date("yesterday"), None);
    }

    #[test]
    fn positions_decode_or_vanish() {
        let p = position_from_json(r#"{"surah":2,"verse":150,"timestamp":5}"#).unwrap();
        assert_eq!((p.surah, p.verse, p.timestamp), (2, 150, 5));
        assert!(position_from_json(r#"{"surah":"two"}"#).is_none());
    }
}
