// 🎯 Slot Matcher - assign punches to required slots for one (employee, day)
//
// Greedy, slot-order dependent, one pass:
//   - candidates are punches inside [required - tolerance, required + tolerance]
//     not yet consumed by an earlier slot of the same day
//   - within one clock minute only the first candidate is considered
//   - the candidate closest to the required instant wins; ties go to the one
//     seen first
//   - the winner is consumed (keyed by its exact timestamp)

use crate::slots::RequiredSlot;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

// ============================================================================
// TOLERANCE WINDOW
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ToleranceWindow {
    pub fn around(instant: NaiveDateTime, tolerance: Duration) -> Self {
        ToleranceWindow {
            start: instant - tolerance,
            end: instant + tolerance,
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }

    pub fn display(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

// ============================================================================
// SLOT MATCH
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched {
        punch: NaiveDateTime,
        /// actual - required; negative when early
        delay_seconds: i64,
    },
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMatch {
    pub slot: RequiredSlot,
    pub window: ToleranceWindow,
    pub outcome: MatchOutcome,
}

impl SlotMatch {
    pub fn is_matched(&self) -> bool {
        matches!(self.outcome, MatchOutcome::Matched { .. })
    }

    pub fn matched_punch(&self) -> Option<NaiveDateTime> {
        match self.outcome {
            MatchOutcome::Matched { punch, .. } => Some(punch),
            MatchOutcome::Unmatched => None,
        }
    }

    pub fn delay_seconds(&self) -> Option<i64> {
        match self.outcome {
            MatchOutcome::Matched { delay_seconds, .. } => Some(delay_seconds),
            MatchOutcome::Unmatched => None,
        }
    }

    pub fn delay_minutes(&self) -> Option<f64> {
        self.delay_seconds().map(|s| s as f64 / 60.0)
    }

    /// Seconds of lateness beyond tolerance, or None when not late
    pub fn late_seconds(&self, tolerance: Duration) -> Option<i64> {
        let delay = self.delay_seconds()?;
        let allowed = tolerance.num_seconds();
        (delay > allowed).then(|| delay - allowed)
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// Match punches to slots. `punches` should be in chronological order; that
/// order decides ties.
pub fn match_slots(
    punches: &[NaiveDateTime],
    slots: &[RequiredSlot],
    tolerance: Duration,
) -> Vec<SlotMatch> {
    // Scoped to this one day's fold
    let mut consumed: HashSet<NaiveDateTime> = HashSet::new();
    let mut matches = Vec::with_capacity(slots.len());

    for slot in slots {
        let required = slot.instant();
        let window = ToleranceWindow::around(required, tolerance);

        let mut minutes_seen: HashSet<(NaiveDate, u32, u32)> = HashSet::new();
        let best = punches
            .iter()
            .copied()
            .filter(|ts| window.contains(*ts) && !consumed.contains(ts))
            .filter(|ts| minutes_seen.insert((ts.date(), ts.hour(), ts.minute())))
            .min_by_key(|ts| (*ts - required).num_seconds().abs());

        let outcome = match best {
            Some(punch) => {
                consumed.insert(punch);
                let delay_seconds = (punch - required).num_seconds();
                debug!(
                    "slot {} ({}) matched {} ({:+.1} min)",
                    slot.display_time(),
                    slot.label,
                    punch.format("%H:%M"),
                    delay_seconds as f64 / 60.0
                );
                MatchOutcome::Matched {
                    punch,
                    delay_seconds,
                }
            }
            None => {
                debug!(
                    "slot {} ({}) not matched, no punch in [{}]",
                    slot.display_time(),
                    slot.label,
                    window.display()
                );
                MatchOutcome::Unmatched
            }
        };

        matches.push(SlotMatch {
            slot: slot.clone(),
            window,
            outcome,
        });
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendanceConfig;
    use crate::records::ShiftDay;
    use crate::slots::generate_slots;

    fn ts(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn default_slots() -> Vec<RequiredSlot> {
        let day = ShiftDay::new("Ahmad", NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        generate_slots(&day, &AttendanceConfig::default()).unwrap()
    }

    fn thirty() -> Duration {
        Duration::minutes(30)
    }

    #[test]
    fn test_scenario_five_of_six_matched() {
        let punches = vec![
            ts("2023-01-15 08:05:00"),
            ts("2023-01-15 12:10:00"),
            ts("2023-01-15 14:55:00"),
            ts("2023-01-15 20:05:00"),
            ts("2023-01-15 22:58:00"),
        ];

        let matches = match_slots(&punches, &default_slots(), thirty());

        let matched: Vec<bool> = matches.iter().map(|m| m.is_matched()).collect();
        assert_eq!(matched, vec![true, true, true, true, true, false]);
        assert_eq!(matches[2].delay_seconds(), Some(-300));
        assert_eq!(matches[5].matched_punch(), None);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let punches = vec![ts("2023-01-15 07:30:00"), ts("2023-01-15 12:30:00")];

        let matches = match_slots(&punches, &default_slots(), thirty());

        assert!(matches[0].is_matched());
        assert!(matches[1].is_matched());
        assert_eq!(matches[1].delay_minutes(), Some(30.0));
    }

    #[test]
    fn test_punch_just_outside_window_unmatched() {
        let punches = vec![ts("2023-01-15 08:30:01")];
        let matches = match_slots(&punches, &default_slots(), thirty());
        assert!(!matches[0].is_matched());
    }

    #[test]
    fn test_closest_candidate_wins() {
        let punches = vec![ts("2023-01-15 07:40:00"), ts("2023-01-15 08:02:00")];

        let matches = match_slots(&punches, &default_slots(), thirty());

        assert_eq!(matches[0].matched_punch(), Some(ts("2023-01-15 08:02:00")));
    }

    #[test]
    fn test_equal_distance_tie_goes_to_first_seen() {
        let punches = vec![ts("2023-01-15 07:50:00"), ts("2023-01-15 08:10:00")];

        let matches = match_slots(&punches, &default_slots(), thirty());

        assert_eq!(matches[0].matched_punch(), Some(ts("2023-01-15 07:50:00")));
    }

    #[test]
    fn test_punch_never_reused_across_slots() {
        // One punch sits inside two overlapping windows
        let config = AttendanceConfig::new()
            .with_times(&[("08:00", "A"), ("08:20", "B"), ("08:00", "Next")]);
        let day = ShiftDay::new("Ahmad", NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        let slots = generate_slots(&day, &config).unwrap();

        let matches = match_slots(&[ts("2023-01-15 08:10:00")], &slots, thirty());

        assert!(matches[0].is_matched());
        assert!(!matches[1].is_matched());
    }

    #[test]
    fn test_same_minute_keeps_first_candidate() {
        // 08:00:50 is closer to 08:01 but shares its minute with 08:00:10
        let config = AttendanceConfig::new().with_times(&[("08:01", "A"), ("08:00", "Next")]);
        let day = ShiftDay::new("Ahmad", NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        let slots = generate_slots(&day, &config).unwrap();

        let punches = vec![ts("2023-01-15 08:00:10"), ts("2023-01-15 08:00:50")];
        let matches = match_slots(&punches, &slots, thirty());

        assert_eq!(matches[0].matched_punch(), Some(ts("2023-01-15 08:00:10")));
    }

    #[test]
    fn test_overflow_slot_matches_next_day_punch() {
        let punches = vec![ts("2023-01-16 07:55:00")];
        let matches = match_slots(&punches, &default_slots(), thirty());

        assert!(!matches[0].is_matched());
        assert!(matches[5].is_matched());
    }

    #[test]
    fn test_late_seconds_only_beyond_tolerance() {
        let punches = vec![ts("2023-01-15 08:30:00"), ts("2023-01-15 12:20:00")];
        let matches = match_slots(&punches, &default_slots(), Duration::minutes(45));

        // 30 min late with 45 tolerance: not late
        assert_eq!(matches[0].late_seconds(Duration::minutes(45)), None);
        assert_eq!(matches[0].late_seconds(Duration::minutes(20)), Some(600));
        assert_eq!(matches[2].late_seconds(Duration::minutes(45)), None);
    }

    #[test]
    fn test_window_display() {
        let window = ToleranceWindow::around(ts("2023-01-15 08:00:00"), thirty());
        assert_eq!(window.display(), "07:30 - 08:30");
    }
}
