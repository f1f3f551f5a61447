// 📤 Export - write report tables to CSV and the whole report to JSON

use crate::engine::AttendanceReport;
use crate::views::{department_totals, late_entries, matching_log, missing_punches};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DAILY_FILE: &str = "daily_results.csv";
pub const SUMMARY_FILE: &str = "employee_summary.csv";
pub const LATE_FILE: &str = "late_entries.csv";
pub const MATCHING_LOG_FILE: &str = "matching_log.csv";
pub const MISSING_FILE: &str = "missing_punches.csv";
pub const DEPARTMENT_FILE: &str = "department_totals.csv";
pub const REPORT_FILE: &str = "report.json";

/// DayResult without its nested slot matches
#[derive(Debug, Serialize)]
struct DailyRow<'a> {
    employee_id: &'a str,
    department: &'a str,
    date: NaiveDate,
    status: String,
    required_count: usize,
    matched_count: usize,
    missing_count: usize,
    late_count: usize,
    late_minutes: f64,
    compliance_rate: f64,
}

/// Write any sequence of flat rows as CSV with a header
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_daily(path: &Path, report: &AttendanceReport) -> Result<()> {
    let rows: Vec<DailyRow> = report
        .daily
        .iter()
        .map(|d| DailyRow {
            employee_id: &d.employee_id,
            department: &d.department,
            date: d.date,
            status: d.status.to_string(),
            required_count: d.required_count,
            matched_count: d.matched_count,
            missing_count: d.missing_count,
            late_count: d.late_count,
            late_minutes: d.late_minutes,
            compliance_rate: d.compliance_rate,
        })
        .collect();
    write_csv(path, &rows)
}

pub fn write_summaries(path: &Path, report: &AttendanceReport) -> Result<()> {
    write_csv(path, &report.summaries)
}

pub fn write_late_entries(path: &Path, report: &AttendanceReport, tolerance: Duration) -> Result<()> {
    write_csv(path, &late_entries(report, tolerance))
}

pub fn write_matching_log(path: &Path, report: &AttendanceReport) -> Result<()> {
    write_csv(path, &matching_log(report))
}

pub fn write_missing_punches(path: &Path, report: &AttendanceReport) -> Result<()> {
    write_csv(path, &missing_punches(report))
}

pub fn write_department_totals(path: &Path, report: &AttendanceReport) -> Result<()> {
    write_csv(path, &department_totals(report))
}

/// Whole report, slot matches and diagnostics included
pub fn write_json(path: &Path, report: &AttendanceReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write every table into `dir`, creating it if needed. Returns the written paths.
pub fn write_all(dir: &Path, report: &AttendanceReport, tolerance: Duration) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = |name: &str| dir.join(name);

    write_daily(&path(DAILY_FILE), report)?;
    write_summaries(&path(SUMMARY_FILE), report)?;
    write_late_entries(&path(LATE_FILE), report, tolerance)?;
    write_matching_log(&path(MATCHING_LOG_FILE), report)?;
    write_missing_punches(&path(MISSING_FILE), report)?;
    write_department_totals(&path(DEPARTMENT_FILE), report)?;
    write_json(&path(REPORT_FILE), report)?;

    let written: Vec<PathBuf> = [
        DAILY_FILE,
        SUMMARY_FILE,
        LATE_FILE,
        MATCHING_LOG_FILE,
        MISSING_FILE,
        DEPARTMENT_FILE,
        REPORT_FILE,
    ]
    .iter()
    .map(|name| path(name))
    .collect();

    info!("wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendanceConfig;
    use crate::engine::AttendanceEngine;
    use crate::records::RawTable;
    use tempfile::TempDir;

    fn report() -> AttendanceReport {
        let punches = RawTable::from_records(
            &["Name", "Department", "Date", "Time"],
            &[&["Ahmad", "Admin", "2023-01-15", "08:05"]],
        );
        let shifts = RawTable::from_records(&["Name", "Shift Date"], &[&["Ahmad", "2023-01-15"]]);
        AttendanceEngine::new(AttendanceConfig::default())
            .unwrap()
            .calculate(&punches, &shifts)
            .unwrap()
    }

    #[test]
    fn test_write_all_creates_every_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        let written = write_all(&out, &report(), Duration::minutes(30)).unwrap();

        assert_eq!(written.len(), 7);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_daily_csv_has_display_status() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DAILY_FILE);

        write_daily(&path, &report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("employee_id,department,date,status"));
        assert!(lines.next().unwrap().contains("Incomplete (5)"));
    }

    #[test]
    fn test_json_report_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REPORT_FILE);
        let report = report();

        write_json(&path, &report).unwrap();

        let loaded: AttendanceReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.digest().unwrap(), report.digest().unwrap());
    }
}
