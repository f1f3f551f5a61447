// 📋 Records - raw input batches and the cleaned punch / shift types
//
// Both batches arrive as untyped tables (header row + string cells) so the
// engine can tell a structurally broken batch apart from bad individual rows.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const COL_NAME: &str = "Name";
pub const COL_DEPARTMENT: &str = "Department";
pub const COL_DATE: &str = "Date";
pub const COL_TIME: &str = "Time";
pub const COL_SHIFT_DATE: &str = "Shift Date";

/// Columns every punch batch must carry
pub const PUNCH_COLUMNS: [&str; 4] = [COL_NAME, COL_DEPARTMENT, COL_DATE, COL_TIME];

/// Columns every shift batch must carry
pub const SHIFT_COLUMNS: [&str; 2] = [COL_NAME, COL_SHIFT_DATE];

/// Department used when an employee never punched
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

// ============================================================================
// RAW TABLE
// ============================================================================

/// RawTable - one loaded batch before any cleanup
///
/// Rows may be shorter than the header; missing cells read as "".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    /// Convenience constructor for literal data
    pub fn from_records(headers: &[&str], rows: &[&[&str]]) -> Self {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name, ignoring surrounding whitespace and tabs
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Required columns that are not present, in the order they were asked for
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|col| self.column_index(col).is_none())
            .map(|col| col.to_string())
            .collect()
    }

    /// Trimmed cell value; "" when the row is short
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.trim())
            .unwrap_or("")
    }
}

// ============================================================================
// CLEANED RECORDS
// ============================================================================

/// PunchEvent - one biometric check-in after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchEvent {
    pub employee_id: String,

    /// Informational only, never part of identity
    pub department: String,

    pub date: NaiveDate,

    /// Time string after the remap table was applied
    pub time: String,

    pub timestamp: NaiveDateTime,
}

/// ShiftDay - one scheduled working day; unique per (employee_id, date)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftDay {
    pub employee_id: String,
    pub date: NaiveDate,
}

impl ShiftDay {
    pub fn new(employee_id: impl Into<String>, date: NaiveDate) -> Self {
        ShiftDay {
            employee_id: employee_id.into(),
            date,
        }
    }
}

// ============================================================================
// PARSING HELPERS
// ============================================================================

/// Parse a calendar date (YYYY-MM-DD, optionally followed by a midnight time
/// as spreadsheet exports tend to write it)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    None
}

/// Parse a time of day: HH:MM or HH:MM:SS
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();

    if let Ok(time) = NaiveTime::parse_from_str(value, "%H:%M:%S") {
        return Some(time);
    }

    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Combine date and time strings into a timestamp
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    Some(NaiveDateTime::new(parse_date(date)?, parse_time_of_day(time)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup_ignores_tabs_and_spaces() {
        let table = RawTable::from_records(&["Name\t", " Department", "Date ", "\tTime"], &[]);

        assert_eq!(table.column_index("Name"), Some(0));
        assert_eq!(table.column_index("Time"), Some(3));
        assert!(table.missing_columns(&PUNCH_COLUMNS).is_empty());
    }

    #[test]
    fn test_missing_columns_reported_in_requested_order() {
        let table = RawTable::from_records(&["Name", "Date"], &[]);

        assert_eq!(
            table.missing_columns(&PUNCH_COLUMNS),
            vec!["Department".to_string(), "Time".to_string()]
        );
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let table = RawTable::from_records(&["Name", "Shift Date"], &[&["Ahmad"]]);
        assert_eq!(table.cell(0, 0), "Ahmad");
        assert_eq!(table.cell(0, 1), "");
        assert_eq!(table.cell(5, 0), "");
    }

    #[test]
    fn test_parse_time_accepts_seconds() {
        assert_eq!(
            parse_time_of_day("08:05"),
            NaiveTime::from_hms_opt(8, 5, 0)
        );
        assert_eq!(
            parse_time_of_day("08:05:30"),
            NaiveTime::from_hms_opt(8, 5, 30)
        );
        assert_eq!(parse_time_of_day("8.05"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn test_parse_date_accepts_spreadsheet_midnight() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15);
        assert_eq!(parse_date("2023-01-15"), expected);
        assert_eq!(parse_date("2023-01-15 00:00:00"), expected);
        assert_eq!(parse_date("15/01/2023"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2023-01-15", "22:58").unwrap();
        assert_eq!(ts.to_string(), "2023-01-15 22:58:00");
        assert!(parse_timestamp("2023-01-15", "xx").is_none());
    }
}
