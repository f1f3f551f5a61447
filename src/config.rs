// ⚙️ Configuration - required slots, tolerance and absence bucketing as data
// Loaded from JSON; every field is optional and falls back to the defaults below

use crate::error::{AttendanceError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// SLOT DEFINITION
// ============================================================================

/// One configured check-in instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Time of day, "HH:MM". Malformed values fall back to 08:00 at generation time.
    pub time: String,

    /// Human-readable label shown in reports
    #[serde(default)]
    pub label: String,

    /// Anchored to the day after the shift date (overnight check-out)
    #[serde(default)]
    pub is_next_day: bool,
}

impl SlotDefinition {
    pub fn new(time: &str, label: &str) -> Self {
        SlotDefinition {
            time: time.to_string(),
            label: label.to_string(),
            is_next_day: false,
        }
    }

    pub fn next_day(time: &str, label: &str) -> Self {
        SlotDefinition {
            is_next_day: true,
            ..SlotDefinition::new(time, label)
        }
    }
}

/// Labels used when a slot has none; indexed by slot position
pub const DEFAULT_SLOT_LABELS: [&str; 6] = [
    "Start of work",
    "End of morning",
    "Start of shift",
    "End of shift",
    "End of night",
    "End of duty (next day)",
];

/// Upper bound for every minute-valued window; nothing wider than a day is meaningful
pub const MAX_WINDOW_MINUTES: i64 = 24 * 60;

pub fn default_label(index: usize) -> String {
    DEFAULT_SLOT_LABELS
        .get(index)
        .map(|l| l.to_string())
        .unwrap_or_else(|| format!("Check {}", index + 1))
}

// ============================================================================
// ATTENDANCE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Required check-ins, in matching order
    pub required_slots: Vec<SlotDefinition>,

    /// ± minutes around each required instant (default: 30)
    pub tolerance_minutes: i64,

    /// ± minutes a punch may sit from a slot and still match it. Unset means the
    /// tolerance itself; widen it to see lateness beyond tolerance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_window_minutes: Option<i64>,

    /// Missing punches that add up to one absence day (default: 3)
    pub absence_threshold: u32,

    /// Punches closer than this to the previous kept punch collapse (default: 10)
    pub collision_window_minutes: i64,

    /// Raw time string → corrected time string, for known device mis-encodings
    pub time_normalization: BTreeMap<String, String>,

    /// Log per-run diagnostic counts at info level
    pub verbose: bool,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        AttendanceConfig {
            required_slots: vec![
                SlotDefinition::new("08:00", DEFAULT_SLOT_LABELS[0]),
                SlotDefinition::new("12:00", DEFAULT_SLOT_LABELS[1]),
                SlotDefinition::new("15:00", DEFAULT_SLOT_LABELS[2]),
                SlotDefinition::new("20:00", DEFAULT_SLOT_LABELS[3]),
                SlotDefinition::new("23:00", DEFAULT_SLOT_LABELS[4]),
                SlotDefinition::next_day("08:00", DEFAULT_SLOT_LABELS[5]),
            ],
            tolerance_minutes: 30,
            match_window_minutes: None,
            absence_threshold: 3,
            collision_window_minutes: 10,
            time_normalization: BTreeMap::from([
                ("03:00".to_string(), "15:00".to_string()),
                ("03:00:00".to_string(), "15:00".to_string()),
            ]),
            verbose: false,
        }
    }
}

impl AttendanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build slots from a bare (time, label) list.
    ///
    /// The last entry becomes the next-day slot, whatever its time value.
    pub fn with_times(mut self, times: &[(&str, &str)]) -> Self {
        let last = times.len().saturating_sub(1);
        self.required_slots = times
            .iter()
            .enumerate()
            .map(|(i, (time, label))| SlotDefinition {
                time: time.to_string(),
                label: label.to_string(),
                is_next_day: i == last,
            })
            .collect();
        self
    }

    pub fn with_tolerance(mut self, minutes: i64) -> Self {
        self.tolerance_minutes = minutes;
        self
    }

    pub fn with_match_window(mut self, minutes: i64) -> Self {
        self.match_window_minutes = Some(minutes);
        self
    }

    pub fn with_absence_threshold(mut self, threshold: u32) -> Self {
        self.absence_threshold = threshold;
        self
    }

    pub fn with_time_normalization(mut self, map: BTreeMap<String, String>) -> Self {
        self.time_normalization = map;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: AttendanceConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject configurations the engine cannot evaluate
    pub fn validate(&self) -> Result<()> {
        if self.required_slots.is_empty() {
            return Err(AttendanceError::invalid_config(
                "at least one required slot must be configured",
            ));
        }

        if self.absence_threshold == 0 {
            return Err(AttendanceError::invalid_config(
                "absence_threshold must be at least 1",
            ));
        }

        if self.tolerance_minutes < 0 {
            return Err(AttendanceError::invalid_config(format!(
                "tolerance_minutes must not be negative (got {})",
                self.tolerance_minutes
            )));
        }

        for (field, value) in [
            ("tolerance_minutes", Some(self.tolerance_minutes)),
            ("match_window_minutes", self.match_window_minutes),
            ("collision_window_minutes", Some(self.collision_window_minutes)),
        ] {
            if let Some(minutes) = value {
                if minutes > MAX_WINDOW_MINUTES {
                    return Err(AttendanceError::invalid_config(format!(
                        "{} must be at most {} (got {})",
                        field, MAX_WINDOW_MINUTES, minutes
                    )));
                }
            }
        }

        if let Some(window) = self.match_window_minutes {
            if window < self.tolerance_minutes {
                return Err(AttendanceError::invalid_config(format!(
                    "match_window_minutes ({}) must not be smaller than tolerance_minutes ({})",
                    window, self.tolerance_minutes
                )));
            }
        }

        if self.collision_window_minutes < 0 {
            return Err(AttendanceError::invalid_config(format!(
                "collision_window_minutes must not be negative (got {})",
                self.collision_window_minutes
            )));
        }

        // Slots are matched in list order, so next-day slots must close the list
        let first_next_day = self.required_slots.iter().position(|s| s.is_next_day);
        if let Some(pos) = first_next_day {
            if let Some(offset) = self.required_slots[pos..]
                .iter()
                .position(|s| !s.is_next_day)
            {
                return Err(AttendanceError::invalid_config(format!(
                    "same-day slot {} ('{}') follows a next-day slot",
                    pos + offset + 1,
                    self.required_slots[pos + offset].time
                )));
            }
        }

        Ok(())
    }

    /// Apply the remap table; unmapped strings pass through unchanged
    pub fn normalize_time<'a>(&'a self, raw: &'a str) -> &'a str {
        self.time_normalization
            .get(raw)
            .map(|s| s.as_str())
            .unwrap_or(raw)
    }

    pub fn tolerance(&self) -> Duration {
        Duration::minutes(self.tolerance_minutes)
    }

    /// Half-width of the matching window around each required instant
    pub fn match_window(&self) -> Duration {
        Duration::minutes(self.match_window_minutes.unwrap_or(self.tolerance_minutes))
    }

    pub fn collision_window(&self) -> Duration {
        Duration::minutes(self.collision_window_minutes)
    }
}
