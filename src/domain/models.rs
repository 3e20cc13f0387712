// Domain models for khatma progress, independent of storage and transport

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::juz::{self, JUZ_COUNT};
use crate::clock::days_between;

/// Progress of one user through the 30 juz for one calendar year.
///
/// Serializes to the persisted `khatma_progress_<year>` record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    #[serde(rename = "completedJuz")]
    pub completed_juz: BTreeSet<u8>,
    pub year: i32,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_progress_date: Option<NaiveDate>,
    pub current_round: u32,
    /// Epoch milliseconds, one per finished round, in completion order.
    pub completed_rounds: Vec<i64>,
    pub streak_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    InProgress,
    RoundComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JuzProgress {
    pub is_complete: bool,
}

/// Last reading position inside a juz that is not finished yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePosition {
    pub surah: u16,
    pub verse: u16,
    /// Epoch milliseconds of the save.
    pub timestamp: i64,
}

impl TrackerState {
    pub fn initial(year: i32) -> Self {
        TrackerState {
            completed_juz: BTreeSet::new(),
            year,
            is_complete: false,
            last_progress_date: None,
            current_round: 1,
            completed_rounds: Vec::new(),
            streak_count: 0,
        }
    }

    pub fn status(&self) -> RoundStatus {
        if self.is_complete {
            RoundStatus::RoundComplete
        } else {
            RoundStatus::InProgress
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        self.completed_juz.contains(&number)
    }

    /// Adds a juz. Returns false (and leaves the state untouched) when the
    /// number is out of range or already completed.
    pub fn mark(&mut self, number: u8, today: NaiveDate) -> bool {
        if !juz::is_valid_juz(number as i64) || !self.completed_juz.insert(number) {
            return false;
        }
        self.record_activity(today);
        true
    }

    /// Removes a juz. Un-completing always drops the round back to in-progress.
    pub fn unmark(&mut self, number: u8, today: NaiveDate) -> bool {
        if !self.completed_juz.remove(&number) {
            return false;
        }
        self.record_activity(today);
        true
    }

    pub fn toggle(&mut self, number: u8, today: NaiveDate) -> bool {
        if self.contains(number) {
            self.unmark(number, today)
        } else {
            self.mark(number, today)
        }
    }

    /// Closes the current round whatever its progress: partial progress is discarded.
    pub fn advance_round(&mut self, now_ms: i64) {
        self.completed_rounds.push(now_ms);
        self.completed_juz.clear();
        self.is_complete = false;
        self.current_round += 1;
    }

    pub fn reset(&mut self) {
        *self = TrackerState::initial(self.year);
    }

    pub fn juz_progress(&self, number: u8) -> JuzProgress {
        JuzProgress {
            is_complete: self.contains(number),
        }
    }

    pub fn total_pages_read(&self) -> u32 {
        juz::pages_for(self.completed_juz.iter().copied())
    }

    /// Live streak relative to `today`; decays to zero after a missed day.
    pub fn streak_days(&self, today: NaiveDate) -> u32 {
        let Some(last) = self.last_progress_date else {
            return 0;
        };
        match days_between(last, today) {
            d if d <= 0 => self.streak_count.max(1),
            1 => self.streak_count.saturating_add(1),
            _ => 0,
        }
    }

    fn record_activity(&mut self, today: NaiveDate) {
        self.streak_count = match self.last_progress_date.map(|last| days_between(last, today)) {
            Some(d) if d <= 0 => self.streak_count.max(1),
            Some(1) => self.streak_count.saturating_add(1),
            _ => 1,
        };
        self.last_progress_date = Some(today);
        self.is_complete = self.completed_juz.len() >= JUZ_COUNT as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn mark_is_idempotent_and_bounded() {
        let mut state = TrackerState::initial(2025);
        assert!(state.mark(4, day(1)));
        let once = state.clone();
        assert!(!state.mark(4, day(1)));
        assert_eq!(state, once);
        assert!(!state.mark(0, day(1)));
        assert!(!state.mark(31, day(1)));
        assert_eq!(state.completed_juz.iter().copied().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn unmark_absent_is_noop() {
        let mut state = TrackerState::initial(2025);
        assert!(!state.unmark(7, day(1)));
        assert_eq!(state, TrackerState::initial(2025));
    }

    #[test]
    fn thirtieth_juz_completes_and_unmark_reopens() {
        let mut state = TrackerState::initial(2025);
        for n in 1..=29 {
            state.mark(n, day(1));
        }
        assert_eq!(state.status(), RoundStatus::InProgress);
        state.mark(30, day(1));
        assert!(state.is_complete);
        assert_eq!(state.status(), RoundStatus::RoundComplete);

        assert!(state.toggle(30, day(1)));
        assert!(!state.is_complete);
        assert!(state.toggle(30, day(1)));
        assert!(state.is_complete);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let mut state = TrackerState::initial(2025);
        state.mark(1, day(1));
        assert_eq!(state.streak_count, 1);
        state.mark(2, day(1));
        assert_eq!(state.streak_count, 1);
        state.mark(3, day(2));
        assert_eq!(state.streak_count, 2);
        state.unmark(3, day(3));
        assert_eq!(state.streak_count, 3);
        state.mark(4, day(6));
        assert_eq!(state.streak_count, 1);
    }

    #[test]
    fn streak_read_time_decay() {
        let mut state = TrackerState::initial(2025);
        assert_eq!(state.streak_days(day(10)), 0);

        state.streak_count = 5;
        state.last_progress_date = Some(day(8));
        assert_eq!(state.streak_days(day(10)), 0);
        state.last_progress_date = Some(day(9));
        assert_eq!(state.streak_days(day(10)), 6);

        state.streak_count = 0;
        state.last_progress_date = Some(day(10));
        assert_eq!(state.streak_days(day(10)), 1);
    }

    #[test]
    fn advance_round_discards_partial_progress() {
        let mut state = TrackerState::initial(2025);
        state.mark(12, day(1));
        state.advance_round(1_700_000_000_000);
        assert!(state.completed_juz.is_empty());
        assert_eq!(state.current_round, 2);
        assert_eq!(state.completed_rounds, vec![1_700_000_000_000]);
        assert_eq!(state.last_progress_date, Some(day(1)));
    }

    #[test]
    fn persisted_shape_is_camel_case() {
        let mut state = TrackerState::initial(2025);
        state.mark(2, day(1));
        state.mark(1, day(1));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["completedJuz"], serde_json::json!([1, 2]));
        assert_eq!(value["lastProgressDate"], "2025-03-01");
        assert_eq!(value["currentRound"], 1);
        assert_eq!(value["streakCount"], 1);
        assert!(value.get("completedRounds").is_some());

        let fresh = serde_json::to_value(TrackerState::initial(2025)).unwrap();
        assert!(fresh.get("lastProgressDate").is_none());
    }
}
