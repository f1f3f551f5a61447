// 🏷️ Day Classifier - slot matches + "punched on the shift date" → DayResult
//
// Status precedence:
//   1. no punch on the shift's own calendar date → Absent (the overflow day alone
//      never rescues a day)
//   2. every slot matched → Complete
//   3. otherwise → Incomplete(missing)
// Lateness is a separate metric and never changes the status.

use crate::matcher::SlotMatch;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// DAY STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    Absent,
    Incomplete { missing: usize },
    Complete,
}

impl DayStatus {
    pub fn is_absent(&self) -> bool {
        matches!(self, DayStatus::Absent)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DayStatus::Complete)
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, DayStatus::Incomplete { .. })
    }

    /// Complete and Incomplete days both count as present
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayStatus::Absent => write!(f, "Absent"),
            DayStatus::Incomplete { missing } => write!(f, "Incomplete ({})", missing),
            DayStatus::Complete => write!(f, "Complete"),
        }
    }
}

// ============================================================================
// DAY RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub employee_id: String,
    pub department: String,
    pub date: NaiveDate,

    /// One entry per required slot, in slot order
    pub matches: Vec<SlotMatch>,

    pub status: DayStatus,

    pub required_count: usize,
    pub matched_count: usize,
    /// Always required_count - matched_count
    pub missing_count: usize,

    pub late_count: usize,
    /// Minutes beyond tolerance, summed over late slots
    pub late_minutes: f64,

    /// matched / required × 100, two decimals
    pub compliance_rate: f64,
}

impl DayResult {
    pub fn unmatched(&self) -> impl Iterator<Item = &SlotMatch> {
        self.matches.iter().filter(|m| !m.is_matched())
    }
}

// ============================================================================
// DAY CLASSIFIER
// ============================================================================

pub struct DayClassifier {
    /// Lateness up to this much is absorbed
    pub tolerance: Duration,
}

impl DayClassifier {
    pub fn new(tolerance: Duration) -> Self {
        DayClassifier { tolerance }
    }

    pub fn classify(
        &self,
        employee_id: &str,
        department: &str,
        date: NaiveDate,
        matches: Vec<SlotMatch>,
        has_punch_on_shift_date: bool,
    ) -> DayResult {
        let required_count = matches.len();
        let matched_count = matches.iter().filter(|m| m.is_matched()).count();
        let missing_count = required_count - matched_count;

        let status = if !has_punch_on_shift_date {
            DayStatus::Absent
        } else if matched_count == required_count {
            DayStatus::Complete
        } else {
            DayStatus::Incomplete {
                missing: missing_count,
            }
        };

        let mut late_count = 0;
        let mut late_seconds = 0i64;
        for m in &matches {
            if let Some(beyond) = m.late_seconds(self.tolerance) {
                late_count += 1;
                late_seconds += beyond;
            }
        }

        DayResult {
            employee_id: employee_id.to_string(),
            department: department.to_string(),
            date,
            matches,
            status,
            required_count,
            matched_count,
            missing_count,
            late_count,
            late_minutes: late_seconds as f64 / 60.0,
            compliance_rate: compliance_rate(matched_count, required_count),
        }
    }
}

/// actual / required × 100 rounded to two decimals; 0 when nothing was required
pub fn compliance_rate(actual: usize, required: usize) -> f64 {
    if required == 0 {
        return 0.0;
    }
    let rate = actual as f64 / required as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}
