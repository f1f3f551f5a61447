// 🔎 Review Views - flat tables derived from a finished report
//
// Pure functions; nothing here recomputes matching or classification. Every row
// type is flat so it can go straight to CSV.

use crate::classifier::compliance_rate;
use crate::engine::AttendanceReport;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RESULT_MATCHED: &str = "Matched";
pub const RESULT_NOT_MATCHED: &str = "Not matched";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateEntry {
    pub employee_id: String,
    pub department: String,
    pub date: NaiveDate,
    pub slot_label: String,
    pub required: NaiveDateTime,
    pub actual: NaiveDateTime,
    /// Beyond tolerance only
    pub late_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingLogEntry {
    pub employee_id: String,
    pub date: NaiveDate,
    pub slot_label: String,
    pub required: NaiveDateTime,
    pub actual: Option<NaiveDateTime>,
    pub delay_minutes: Option<f64>,
    pub window: String,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPunch {
    pub employee_id: String,
    pub department: String,
    pub date: NaiveDate,
    pub slot_label: String,
    pub required: NaiveDateTime,
    pub window: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentTotals {
    pub department: String,
    pub employees: usize,
    pub compliant_employees: usize,
    pub required_checks: usize,
    pub actual_checks: usize,
    pub missing_checks: usize,
    pub compliance_rate: f64,
}

/// Matched slots whose delay exceeds the tolerance
pub fn late_entries(report: &AttendanceReport, tolerance: Duration) -> Vec<LateEntry> {
    report
        .daily
        .iter()
        .flat_map(|day| {
            day.matches.iter().filter_map(move |m| {
                let late = m.late_seconds(tolerance)?;
                Some(LateEntry {
                    employee_id: day.employee_id.clone(),
                    department: day.department.clone(),
                    date: day.date,
                    slot_label: m.slot.label.clone(),
                    required: m.slot.instant(),
                    actual: m.matched_punch()?,
                    late_minutes: late as f64 / 60.0,
                })
            })
        })
        .collect()
}

/// One row per required slot of every evaluated day
pub fn matching_log(report: &AttendanceReport) -> Vec<MatchingLogEntry> {
    report
        .daily
        .iter()
        .flat_map(|day| {
            day.matches.iter().map(move |m| MatchingLogEntry {
                employee_id: day.employee_id.clone(),
                date: day.date,
                slot_label: m.slot.label.clone(),
                required: m.slot.instant(),
                actual: m.matched_punch(),
                delay_minutes: m.delay_minutes(),
                window: m.window.display(),
                result: if m.is_matched() {
                    RESULT_MATCHED
                } else {
                    RESULT_NOT_MATCHED
                }
                .to_string(),
            })
        })
        .collect()
}

pub fn missing_punches(report: &AttendanceReport) -> Vec<MissingPunch> {
    report
        .daily
        .iter()
        .flat_map(|day| {
            day.unmatched().map(move |m| MissingPunch {
                employee_id: day.employee_id.clone(),
                department: day.department.clone(),
                date: day.date,
                slot_label: m.slot.label.clone(),
                required: m.slot.instant(),
                window: m.window.display(),
            })
        })
        .collect()
}

/// Per-department sums over the employee summaries, sorted by department
pub fn department_totals(report: &AttendanceReport) -> Vec<DepartmentTotals> {
    let mut groups: BTreeMap<&str, DepartmentTotals> = BTreeMap::new();

    for summary in &report.summaries {
        let totals = groups
            .entry(summary.department.as_str())
            .or_insert_with(|| DepartmentTotals {
                department: summary.department.clone(),
                employees: 0,
                compliant_employees: 0,
                required_checks: 0,
                actual_checks: 0,
                missing_checks: 0,
                compliance_rate: 0.0,
            });

        totals.employees += 1;
        if summary.is_compliant() {
            totals.compliant_employees += 1;
        }
        totals.required_checks += summary.required_checks;
        totals.actual_checks += summary.actual_checks;
        totals.missing_checks += summary.missing_checks;
    }

    groups
        .into_values()
        .map(|mut t| {
            t.compliance_rate = compliance_rate(t.actual_checks, t.required_checks);
            t
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendanceConfig;
    use crate::engine::AttendanceEngine;
    use crate::records::RawTable;

    fn report() -> AttendanceReport {
        let punches = RawTable::from_records(
            &["Name", "Department", "Date", "Time"],
            &[
                &["Ahmad", "Admin", "2023-01-15", "08:05"],
                &["Ahmad", "Admin", "2023-01-15", "12:20"],
                &["Fatima", "Accounting", "2023-01-15", "08:00"],
            ],
        );
        let shifts = RawTable::from_records(
            &["Name", "Shift Date"],
            &[&["Ahmad", "2023-01-15"], &["Fatima", "2023-01-15"]],
        );
        AttendanceEngine::new(AttendanceConfig::default())
            .unwrap()
            .calculate(&punches, &shifts)
            .unwrap()
    }

    #[test]
    fn test_matching_log_has_row_per_slot() {
        let log = matching_log(&report());

        assert_eq!(log.len(), 12);
        assert_eq!(log[0].result, "Matched");
        assert_eq!(log[0].window, "07:30 - 08:30");
        assert_eq!(log[0].delay_minutes, Some(5.0));
        assert_eq!(log[2].result, "Not matched");
        assert_eq!(log[2].actual, None);
    }

    #[test]
    fn test_missing_punches_match_unmatched_slots() {
        let report = report();
        let missing = missing_punches(&report);

        let expected: usize = report.daily.iter().map(|d| d.missing_count).sum();
        assert_eq!(missing.len(), expected);
        assert_eq!(missing[0].slot_label, "Start of shift");
        assert_eq!(missing[0].department, "Admin");
    }

    #[test]
    fn test_late_entries_use_tolerance() {
        let report = report();

        assert!(late_entries(&report, Duration::minutes(30)).is_empty());

        let late = late_entries(&report, Duration::minutes(10));
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].slot_label, "End of morning");
        assert_eq!(late[0].late_minutes, 10.0);
    }

    #[test]
    fn test_department_totals_sorted() {
        let totals = department_totals(&report());

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].department, "Accounting");
        assert_eq!(totals[1].department, "Admin");
        assert_eq!(totals[1].actual_checks, 2);
        assert_eq!(totals[1].compliance_rate, 33.33);
        assert_eq!(totals[0].compliant_employees, 0);
    }
}
