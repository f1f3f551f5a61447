// 🕗 Required-Slot Generator - the instants an employee must punch near on a shift day

use crate::config::{default_label, AttendanceConfig};
use crate::records::{parse_time_of_day, ShiftDay};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Instant used when a configured time string does not parse
pub fn fallback_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSlot {
    /// Position in the configured list (0-based)
    pub index: usize,
    pub time: NaiveTime,
    /// Shift date, or the day after for the overflow slot
    pub date: NaiveDate,
    pub label: String,
    pub is_next_day: bool,
}

impl RequiredSlot {
    pub fn instant(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date, self.time)
    }

    /// "HH:MM", with "(+1d)" for the overflow slot
    pub fn display_time(&self) -> String {
        if self.is_next_day {
            format!("{} (+1d)", self.time.format("%H:%M"))
        } else {
            self.time.format("%H:%M").to_string()
        }
    }
}

/// Build the ordered required slots for one shift day.
///
/// Returns None when the next-day anchor does not exist in the calendar.
pub fn generate_slots(shift: &ShiftDay, config: &AttendanceConfig) -> Option<Vec<RequiredSlot>> {
    let next_day = shift.date.succ_opt();
    let mut slots = Vec::with_capacity(config.required_slots.len());

    for (index, def) in config.required_slots.iter().enumerate() {
        let time = parse_time_of_day(&def.time).unwrap_or_else(|| {
            debug!(
                "slot {} has malformed time '{}', using 08:00",
                index + 1,
                def.time
            );
            fallback_time()
        });

        let date = if def.is_next_day { next_day? } else { shift.date };

        let label = if def.label.trim().is_empty() {
            default_label(index)
        } else {
            def.label.clone()
        };

        slots.push(RequiredSlot {
            index,
            time,
            date,
            label,
            is_next_day: def.is_next_day,
        });
    }

    Some(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotDefinition;

    fn shift(date: &str) -> ShiftDay {
        ShiftDay::new("Ahmad", NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
    }

    #[test]
    fn test_default_slots_last_lands_next_day() {
        let slots = generate_slots(&shift("2023-01-15"), &AttendanceConfig::default()).unwrap();

        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0].instant().to_string(), "2023-01-15 08:00:00");
        assert_eq!(slots[4].instant().to_string(), "2023-01-15 23:00:00");
        assert_eq!(slots[5].instant().to_string(), "2023-01-16 08:00:00");
        assert_eq!(slots[5].display_time(), "08:00 (+1d)");
        assert_eq!(slots[2].label, "Start of shift");
    }

    #[test]
    fn test_overflow_crosses_month_end() {
        let slots = generate_slots(&shift("2024-02-29"), &AttendanceConfig::default()).unwrap();
        assert_eq!(slots[5].date.to_string(), "2024-03-01");
    }

    #[test]
    fn test_short_list_still_anchors_last_to_next_day() {
        let config = AttendanceConfig::new().with_times(&[("09:00", "In"), ("17:00", "Out")]);
        let slots = generate_slots(&shift("2023-01-15"), &config).unwrap();

        assert_eq!(slots[0].date.to_string(), "2023-01-15");
        assert_eq!(slots[1].instant().to_string(), "2023-01-16 17:00:00");
    }

    #[test]
    fn test_malformed_time_falls_back_to_eight() {
        let mut config = AttendanceConfig::default();
        config.required_slots[1] = SlotDefinition::new("noon", "");

        let slots = generate_slots(&shift("2023-01-15"), &config).unwrap();

        assert_eq!(slots[1].time, fallback_time());
        assert_eq!(slots[1].label, "End of morning");
    }

    #[test]
    fn test_last_calendar_day_cannot_anchor_overflow() {
        let day = ShiftDay::new("Ahmad", NaiveDate::MAX);
        assert!(generate_slots(&day, &AttendanceConfig::default()).is_none());
    }
}
