// ✅ Data Validation - pre-flight checks over the raw batches and configuration
//
// Runs before a calculation and never modifies anything. A report is valid when
// it holds no Critical issue; warnings describe rows the normalizer will drop or
// repair on its own.

use crate::config::AttendanceConfig;
use crate::records::{
    parse_date, parse_time_of_day, RawTable, COL_DATE, COL_NAME, COL_SHIFT_DATE, COL_TIME,
    PUNCH_COLUMNS, SHIFT_COLUMNS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

// ============================================================================
// VALIDATION ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // The run cannot produce meaningful results
    Warning,  // Rows will be dropped or repaired
    Info,
}

/// Which input an issue was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckArea {
    Punches,
    Shifts,
    Consistency,
    Configuration,
}

impl fmt::Display for CheckArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckArea::Punches => "punches",
            CheckArea::Shifts => "shifts",
            CheckArea::Consistency => "consistency",
            CheckArea::Configuration => "configuration",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub dataset: CheckArea,
    pub message: String,
}

impl ValidationIssue {
    pub fn critical(dataset: CheckArea, message: impl Into<String>) -> Self {
        ValidationIssue {
            severity: Severity::Critical,
            dataset,
            message: message.into(),
        }
    }

    pub fn warning(dataset: CheckArea, message: impl Into<String>) -> Self {
        ValidationIssue {
            severity: Severity::Warning,
            dataset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let is_valid = !issues.iter().any(|i| i.severity == Severity::Critical);
        ValidationReport { is_valid, issues }
    }

    pub fn critical_count(&self) -> usize {
        self.count(Severity::Critical)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} issue(s) ({} critical, {} warning)",
            if self.is_valid { "Valid" } else { "Invalid" },
            self.issues.len(),
            self.critical_count(),
            self.warning_count()
        )
    }
}

// ============================================================================
// DATA VALIDATOR
// ============================================================================

pub struct DataValidator<'a> {
    config: &'a AttendanceConfig,
}

impl<'a> DataValidator<'a> {
    pub fn new(config: &'a AttendanceConfig) -> Self {
        DataValidator { config }
    }

    /// Run every check over both batches and the configuration
    pub fn validate(&self, punches: &RawTable, shifts: &RawTable) -> ValidationReport {
        let mut issues = Vec::new();
        issues.extend(self.validate_punches(punches));
        issues.extend(self.validate_shifts(shifts));
        issues.extend(check_consistency(punches, shifts));
        issues.extend(self.validate_config());
        ValidationReport::from_issues(issues)
    }

    pub fn validate_punches(&self, table: &RawTable) -> Vec<ValidationIssue> {
        let missing = table.missing_columns(&PUNCH_COLUMNS);
        if !missing.is_empty() {
            return vec![ValidationIssue::critical(
                CheckArea::Punches,
                format!("Missing required column(s): {}", missing.join(", ")),
            )];
        }

        let mut issues = empty_cell_warnings(table, &PUNCH_COLUMNS, CheckArea::Punches);

        if let Some(issue) = invalid_dates(table, COL_DATE, CheckArea::Punches) {
            issues.push(issue);
        }

        let time_col = table.column_index(COL_TIME);
        let mut bad_times = (0..table.len())
            .filter_map(|row| time_col.map(|col| table.cell(row, col)))
            .filter(|raw| !raw.is_empty())
            .filter(|raw| parse_time_of_day(self.config.normalize_time(raw)).is_none());

        if let Some(first) = bad_times.next() {
            let count = 1 + bad_times.count();
            issues.push(ValidationIssue::critical(
                CheckArea::Punches,
                format!(
                    "Invalid time format '{}' (expected HH:MM or HH:MM:SS), {} row(s) affected",
                    first, count
                ),
            ));
        }

        issues
    }

    pub fn validate_shifts(&self, table: &RawTable) -> Vec<ValidationIssue> {
        let missing = table.missing_columns(&SHIFT_COLUMNS);
        if !missing.is_empty() {
            return vec![ValidationIssue::critical(
                CheckArea::Shifts,
                format!("Missing required column(s): {}", missing.join(", ")),
            )];
        }

        let mut issues = empty_cell_warnings(table, &SHIFT_COLUMNS, CheckArea::Shifts);

        if let Some(issue) = invalid_dates(table, COL_SHIFT_DATE, CheckArea::Shifts) {
            issues.push(issue);
        }

        let (Some(name_col), Some(date_col)) = (
            table.column_index(COL_NAME),
            table.column_index(COL_SHIFT_DATE),
        ) else {
            return issues;
        };

        let mut seen = HashSet::new();
        let duplicates = (0..table.len())
            .filter(|&row| !seen.insert((table.cell(row, name_col), table.cell(row, date_col))))
            .count();
        if duplicates > 0 {
            issues.push(ValidationIssue::warning(
                CheckArea::Shifts,
                format!("{} duplicate (Name, Shift Date) row(s) will be ignored", duplicates),
            ));
        }

        issues
    }

    pub fn validate_config(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if let Err(e) = self.config.validate() {
            issues.push(ValidationIssue::critical(CheckArea::Configuration, e.to_string()));
        }

        for (i, slot) in self.config.required_slots.iter().enumerate() {
            if parse_time_of_day(&slot.time).is_none() {
                issues.push(ValidationIssue::warning(
                    CheckArea::Configuration,
                    format!("Slot {} time '{}' is malformed, 08:00 will be used", i + 1, slot.time),
                ));
            }
            if slot.label.trim().is_empty() {
                issues.push(ValidationIssue::warning(
                    CheckArea::Configuration,
                    format!("Slot {} has no label", i + 1),
                ));
            }
        }

        issues
    }
}

/// Employees scheduled without punches, and punching without a schedule
pub fn check_consistency(punches: &RawTable, shifts: &RawTable) -> Vec<ValidationIssue> {
    let (Some(punch_names), Some(shift_names)) = (names(punches), names(shifts)) else {
        return Vec::new();
    };

    let mut issues = Vec::new();

    let unpunched: Vec<&str> = shift_names.difference(&punch_names).copied().collect();
    if !unpunched.is_empty() {
        issues.push(ValidationIssue::warning(
            CheckArea::Consistency,
            format!(
                "{} employee(s) have shifts but no punches: {}",
                unpunched.len(),
                unpunched.join(", ")
            ),
        ));
    }

    let unscheduled: Vec<&str> = punch_names.difference(&shift_names).copied().collect();
    if !unscheduled.is_empty() {
        issues.push(ValidationIssue::warning(
            CheckArea::Consistency,
            format!(
                "{} employee(s) have punches but no shifts: {}",
                unscheduled.len(),
                unscheduled.join(", ")
            ),
        ));
    }

    issues
}

fn names(table: &RawTable) -> Option<BTreeSet<&str>> {
    let col = table.column_index(COL_NAME)?;
    Some(
        (0..table.len())
            .map(|row| table.cell(row, col))
            .filter(|name| !name.is_empty())
            .collect(),
    )
}

fn empty_cell_warnings(table: &RawTable, columns: &[&str], area: CheckArea) -> Vec<ValidationIssue> {
    columns
        .iter()
        .filter_map(|column| {
            let col = table.column_index(column)?;
            let empty = (0..table.len()).filter(|&row| table.cell(row, col).is_empty()).count();
            (empty > 0).then(|| {
                ValidationIssue::warning(area, format!("{} empty value(s) in column '{}'", empty, column))
            })
        })
        .collect()
}

fn invalid_dates(table: &RawTable, column: &str, area: CheckArea) -> Option<ValidationIssue> {
    let col = table.column_index(column)?;
    let mut bad = (0..table.len())
        .map(|row| table.cell(row, col))
        .filter(|raw| !raw.is_empty() && parse_date(raw).is_none());

    let first = bad.next()?;
    let count = 1 + bad.count();
    Some(ValidationIssue::critical(
        area,
        format!(
            "{} row(s) have an invalid '{}' (expected YYYY-MM-DD), e.g. '{}'",
            count, column, first
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotDefinition;

    fn punches(rows: &[&[&str]]) -> RawTable {
        RawTable::from_records(&["Name", "Department", "Date", "Time"], rows)
    }

    fn shifts(rows: &[&[&str]]) -> RawTable {
        RawTable::from_records(&["Name", "Shift Date"], rows)
    }

    #[test]
    fn test_clean_batches_are_valid() {
        let config = AttendanceConfig::default();
        let report = DataValidator::new(&config).validate(
            &punches(&[&["Ahmad", "Admin", "2023-01-15", "08:00"]]),
            &shifts(&[&["Ahmad", "2023-01-15"]]),
        );

        assert!(report.is_valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_missing_column_is_critical() {
        let config = AttendanceConfig::default();
        let table = RawTable::from_records(&["Name", "Date", "Time"], &[]);

        let issues = DataValidator::new(&config).validate_punches(&table);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert!(issues[0].message.contains("Department"));
    }

    #[test]
    fn test_invalid_dates_counted() {
        let config = AttendanceConfig::default();
        let table = punches(&[
            &["Ahmad", "Admin", "15/01/2023", "08:00"],
            &["Ahmad", "Admin", "not a date", "12:00"],
            &["Ahmad", "Admin", "2023-01-15", "15:00"],
        ]);

        let issues = DataValidator::new(&config).validate_punches(&table);

        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.starts_with("2 row(s)"));
        assert!(issues[0].message.contains("15/01/2023"));
    }

    #[test]
    fn test_remapped_time_is_not_flagged() {
        // "03:00" is remapped by the default normalization table; "8am" is not
        let config = AttendanceConfig::default();
        let table = punches(&[
            &["Ahmad", "Admin", "2023-01-15", "03:00"],
            &["Ahmad", "Admin", "2023-01-15", "8am"],
        ]);

        let issues = DataValidator::new(&config).validate_punches(&table);

        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("'8am'"));
    }

    #[test]
    fn test_empty_cells_are_warnings() {
        let config = AttendanceConfig::default();
        let table = punches(&[&["", "Admin", "2023-01-15", "08:00"]]);

        let report = ValidationReport::from_issues(DataValidator::new(&config).validate_punches(&table));

        assert!(report.is_valid);
        assert_eq!(report.warning_count(), 1);
        assert!(report.issues[0].message.contains("'Name'"));
    }

    #[test]
    fn test_duplicate_shift_rows_warned() {
        let config = AttendanceConfig::default();
        let table = shifts(&[
            &["Ahmad", "2023-01-15"],
            &["Ahmad", "2023-01-15"],
            &["Ahmad", "2023-01-16"],
        ]);

        let issues = DataValidator::new(&config).validate_shifts(&table);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].message.starts_with("1 duplicate"));
    }

    #[test]
    fn test_consistency_lists_sorted_names() {
        let issues = check_consistency(
            &punches(&[
                &["Ahmad", "Admin", "2023-01-15", "08:00"],
                &["Zaid", "Admin", "2023-01-15", "08:00"],
            ]),
            &shifts(&[&["Omar", "2023-01-15"], &["Fatima", "2023-01-15"], &["Ahmad", "2023-01-15"]]),
        );

        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.ends_with("no punches: Fatima, Omar"));
        assert!(issues[1].message.ends_with("no shifts: Zaid"));
    }

    #[test]
    fn test_config_warnings_and_errors() {
        let mut config = AttendanceConfig::default();
        config.required_slots[0] = SlotDefinition::new("8 o'clock", "");
        let issues = DataValidator::new(&config).validate_config();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));

        let config = AttendanceConfig::default().with_absence_threshold(0);
        let report = ValidationReport::from_issues(DataValidator::new(&config).validate_config());
        assert!(!report.is_valid);
    }
}
