// 📊 Aggregator - fold daily results into one summary per (employee, department)
//
// Two absence dimensions live side by side:
//   - absent_status_days: days classified Absent (no punch on the shift date)
//   - absent_days: missing_checks / absence_threshold, bucketed over every
//     missing punch of the employee
// final_status only looks at incomplete_days and the bucketed absent_days.

use crate::classifier::{compliance_rate, DayResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    Compliant,
    NonCompliant,
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalStatus::Compliant => write!(f, "Compliant"),
            FinalStatus::NonCompliant => write!(f, "Non-compliant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub employee_id: String,
    pub department: String,

    /// Scheduled shift days, whether or not they produced a result
    pub total_working_days: usize,

    pub present_days: usize,
    pub complete_days: usize,
    pub incomplete_days: usize,

    /// Bucketed: missing_checks / absence_threshold
    pub absent_days: usize,
    /// Days whose own status was Absent
    pub absent_status_days: usize,

    pub late_count: usize,
    pub late_minutes: f64,

    pub required_checks: usize,
    pub actual_checks: usize,
    pub missing_checks: usize,

    /// From summed totals, not an average of daily rates
    pub compliance_rate: f64,

    pub absence_reason: String,
    pub final_status: FinalStatus,
}

impl EmployeeSummary {
    pub fn is_compliant(&self) -> bool {
        self.final_status == FinalStatus::Compliant
    }
}

/// Explanation carried next to the bucketed absent_days
pub fn absence_reason(missing_checks: usize, absence_threshold: u32) -> String {
    if missing_checks == 0 {
        return "No missing punches".to_string();
    }

    if missing_checks / absence_threshold as usize > 0 {
        format!(
            "Missing punches: {}, every {} missing punches = 1 absence day",
            missing_checks, absence_threshold
        )
    } else {
        format!(
            "Missing punches: {} (below absence threshold of {})",
            missing_checks, absence_threshold
        )
    }
}

#[derive(Default)]
struct Totals {
    present_days: usize,
    complete_days: usize,
    incomplete_days: usize,
    absent_status_days: usize,
    late_count: usize,
    late_minutes: f64,
    required_checks: usize,
    actual_checks: usize,
    missing_checks: usize,
}

pub struct Aggregator {
    /// Missing punches per absence day; validated >= 1 by the config
    pub absence_threshold: u32,
}

impl Aggregator {
    pub fn new(absence_threshold: u32) -> Self {
        Aggregator {
            absence_threshold: absence_threshold.max(1),
        }
    }

    /// Fold daily results. `shift_counts` maps employee → number of scheduled
    /// shift days and is authoritative for total_working_days.
    pub fn aggregate(
        &self,
        days: &[DayResult],
        shift_counts: &BTreeMap<String, usize>,
    ) -> Vec<EmployeeSummary> {
        let mut groups: BTreeMap<(&str, &str), Totals> = BTreeMap::new();

        for day in days {
            let totals = groups
                .entry((day.employee_id.as_str(), day.department.as_str()))
                .or_default();

            if day.status.is_present() {
                totals.present_days += 1;
            }
            if day.status.is_complete() {
                totals.complete_days += 1;
            }
            if day.status.is_incomplete() {
                totals.incomplete_days += 1;
            }
            if day.status.is_absent() {
                totals.absent_status_days += 1;
            }
            totals.late_count += day.late_count;
            totals.late_minutes += day.late_minutes;
            totals.required_checks += day.required_count;
            totals.actual_checks += day.matched_count;
            totals.missing_checks += day.missing_count;
        }

        groups
            .into_iter()
            .map(|((employee_id, department), t)| {
                let absent_days = t.missing_checks / self.absence_threshold as usize;
                let final_status = if t.incomplete_days == 0 && absent_days == 0 {
                    FinalStatus::Compliant
                } else {
                    FinalStatus::NonCompliant
                };

                EmployeeSummary {
                    employee_id: employee_id.to_string(),
                    department: department.to_string(),
                    total_working_days: shift_counts.get(employee_id).copied().unwrap_or(0),
                    present_days: t.present_days,
                    complete_days: t.complete_days,
                    incomplete_days: t.incomplete_days,
                    absent_days,
                    absent_status_days: t.absent_status_days,
                    late_count: t.late_count,
                    late_minutes: t.late_minutes,
                    required_checks: t.required_checks,
                    actual_checks: t.actual_checks,
                    missing_checks: t.missing_checks,
                    compliance_rate: compliance_rate(t.actual_checks, t.required_checks),
                    absence_reason: absence_reason(t.missing_checks, self.absence_threshold),
                    final_status,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DayStatus;
    use chrono::NaiveDate;

    fn day_result(employee: &str, day: u32, required: usize, matched: usize, status: DayStatus) -> DayResult {
        DayResult {
            employee_id: employee.to_string(),
            department: "Admin".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            matches: Vec::new(),
            status,
            required_count: required,
            matched_count: matched,
            missing_count: required - matched,
            late_count: 0,
            late_minutes: 0.0,
            compliance_rate: compliance_rate(matched, required),
        }
    }

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_bucketing_twelve_missing_is_four_days() {
        let days = vec![
            day_result("Ahmad", 15, 6, 0, DayStatus::Absent),
            day_result("Ahmad", 16, 6, 0, DayStatus::Absent),
        ];

        let summaries = Aggregator::new(3).aggregate(&days, &counts(&[("Ahmad", 2)]));

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].missing_checks, 12);
        assert_eq!(summaries[0].absent_days, 4);
        assert_eq!(summaries[0].absent_status_days, 2);
        assert_eq!(summaries[0].final_status, FinalStatus::NonCompliant);
    }

    #[test]
    fn test_bucketing_two_missing_is_zero_days() {
        let days = vec![day_result("Ahmad", 15, 6, 4, DayStatus::Incomplete { missing: 2 })];

        let summaries = Aggregator::new(3).aggregate(&days, &counts(&[("Ahmad", 1)]));

        assert_eq!(summaries[0].absent_days, 0);
        assert_eq!(summaries[0].incomplete_days, 1);
        assert!(summaries[0].absence_reason.contains("below absence threshold"));
        // Incomplete alone is enough to be non-compliant
        assert_eq!(summaries[0].final_status, FinalStatus::NonCompliant);
    }

    #[test]
    fn test_all_complete_is_compliant() {
        let days = vec![
            day_result("Ahmad", 15, 6, 6, DayStatus::Complete),
            day_result("Ahmad", 16, 6, 6, DayStatus::Complete),
        ];

        let summaries = Aggregator::new(3).aggregate(&days, &counts(&[("Ahmad", 2)]));

        assert!(summaries[0].is_compliant());
        assert_eq!(summaries[0].compliance_rate, 100.0);
        assert_eq!(summaries[0].absence_reason, "No missing punches");
    }

    #[test]
    fn test_compliance_from_totals_not_daily_average() {
        // Daily rates 100% (1/1) and 0% (0/3) average to 50%; totals give 25%
        let days = vec![
            day_result("Ahmad", 15, 1, 1, DayStatus::Complete),
            day_result("Ahmad", 16, 3, 0, DayStatus::Absent),
        ];

        let summaries = Aggregator::new(3).aggregate(&days, &counts(&[("Ahmad", 2)]));
        assert_eq!(summaries[0].compliance_rate, 25.0);
    }

    #[test]
    fn test_total_working_days_comes_from_schedule() {
        let days = vec![day_result("Ahmad", 15, 6, 6, DayStatus::Complete)];

        let summaries = Aggregator::new(3).aggregate(&days, &counts(&[("Ahmad", 5)]));
        assert_eq!(summaries[0].total_working_days, 5);
    }

    #[test]
    fn test_one_row_per_employee_department_sorted() {
        let mut other = day_result("Fatima", 15, 6, 6, DayStatus::Complete);
        other.department = "Accounting".to_string();
        let days = vec![other, day_result("Ahmad", 15, 6, 6, DayStatus::Complete)];

        let summaries = Aggregator::new(3).aggregate(&days, &counts(&[("Ahmad", 1), ("Fatima", 1)]));

        let names: Vec<&str> = summaries.iter().map(|s| s.employee_id.as_str()).collect();
        assert_eq!(names, vec!["Ahmad", "Fatima"]);
        assert_eq!(summaries[1].department, "Accounting");
    }

    #[test]
    fn test_absence_reason_texts() {
        assert_eq!(absence_reason(0, 3), "No missing punches");
        assert_eq!(
            absence_reason(12, 3),
            "Missing punches: 12, every 3 missing punches = 1 absence day"
        );
        assert_eq!(
            absence_reason(2, 3),
            "Missing punches: 2 (below absence threshold of 3)"
        );
    }
}
