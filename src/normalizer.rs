// 🧹 Record Normalizer - strip, deduplicate and collapse raw punch / shift rows
//
// Punch pipeline, in order:
//   1. header whitespace is ignored (RawTable::column_index), cells are trimmed
//   2. exact duplicate rows removed
//   3. duplicates on (Name, Date, Time) removed, first occurrence kept
//   4. near duplicates collapsed: per employee, chronologically, any punch closer
//      than the collision window to the previous kept punch is removed
//   5. time strings remapped through the configured normalization table
//   6. rows whose timestamp still does not parse are dropped

use crate::config::AttendanceConfig;
use crate::error::{AttendanceError, Dataset, Result};
use crate::records::{
    parse_date, parse_timestamp, PunchEvent, RawTable, ShiftDay, COL_DATE, COL_DEPARTMENT,
    COL_NAME, COL_SHIFT_DATE, COL_TIME, PUNCH_COLUMNS, SHIFT_COLUMNS,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

// ============================================================================
// NORMALIZATION STATS
// ============================================================================

/// Counts of everything the normalizer dropped or rewrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub punch_rows_in: usize,
    pub exact_duplicates: usize,
    pub key_duplicates: usize,
    pub near_duplicates: usize,
    pub remapped_times: usize,
    pub unparseable_punches: usize,
    pub blank_keys: usize,

    pub shift_rows_in: usize,
    pub shift_exact_duplicates: usize,
    pub shift_key_duplicates: usize,
    pub invalid_shift_dates: usize,
}

impl NormalizationStats {
    /// Punch rows that did not survive normalization
    pub fn punches_dropped(&self) -> usize {
        self.exact_duplicates
            + self.key_duplicates
            + self.near_duplicates
            + self.unparseable_punches
    }

    pub fn summary(&self) -> String {
        format!(
            "punches: {} in, {} exact dup, {} key dup, {} within collision window, {} unparseable, {} remapped | shifts: {} in, {} exact dup, {} key dup, {} invalid dates | {} blank keys",
            self.punch_rows_in,
            self.exact_duplicates,
            self.key_duplicates,
            self.near_duplicates,
            self.unparseable_punches,
            self.remapped_times,
            self.shift_rows_in,
            self.shift_exact_duplicates,
            self.shift_key_duplicates,
            self.invalid_shift_dates,
            self.blank_keys,
        )
    }
}

/// Output of a full normalization pass
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub punches: Vec<PunchEvent>,
    pub shifts: Vec<ShiftDay>,
    pub stats: NormalizationStats,
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Normalize both batches. Fails only when required columns are missing.
pub fn normalize(
    punches: &RawTable,
    shifts: &RawTable,
    config: &AttendanceConfig,
) -> Result<NormalizedBatch> {
    ensure_columns(punches, &PUNCH_COLUMNS, Dataset::Punches)?;
    ensure_columns(shifts, &SHIFT_COLUMNS, Dataset::Shifts)?;

    let mut stats = NormalizationStats::default();
    let punches = normalize_punches(punches, config, &mut stats)?;
    let shifts = normalize_shifts(shifts, &mut stats)?;

    debug!("normalization: {}", stats.summary());

    Ok(NormalizedBatch {
        punches,
        shifts,
        stats,
    })
}

fn ensure_columns(table: &RawTable, required: &[&str], dataset: Dataset) -> Result<()> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AttendanceError::MissingColumns {
            dataset,
            columns: missing,
        })
    }
}

/// Row view used while cleaning punches
struct PunchRow<'a> {
    name: &'a str,
    department: &'a str,
    date: &'a str,
    time: &'a str,
    raw_timestamp: Option<NaiveDateTime>,
}

pub fn normalize_punches(
    table: &RawTable,
    config: &AttendanceConfig,
    stats: &mut NormalizationStats,
) -> Result<Vec<PunchEvent>> {
    ensure_columns(table, &PUNCH_COLUMNS, Dataset::Punches)?;

    // Presence checked above
    let name_col = table.column_index(COL_NAME).unwrap_or_default();
    let dept_col = table.column_index(COL_DEPARTMENT).unwrap_or_default();
    let date_col = table.column_index(COL_DATE).unwrap_or_default();
    let time_col = table.column_index(COL_TIME).unwrap_or_default();

    stats.punch_rows_in += table.len();

    let mut seen_rows: HashSet<Vec<&str>> = HashSet::new();
    let mut seen_keys: HashSet<(&str, &str, &str)> = HashSet::new();
    let mut rows: Vec<PunchRow> = Vec::with_capacity(table.len());

    for i in 0..table.len() {
        let full_row: Vec<&str> = (0..table.headers.len()).map(|c| table.cell(i, c)).collect();
        if !seen_rows.insert(full_row) {
            stats.exact_duplicates += 1;
            continue;
        }

        let name = table.cell(i, name_col);
        let date = table.cell(i, date_col);
        let time = table.cell(i, time_col);

        if !seen_keys.insert((name, date, time)) {
            stats.key_duplicates += 1;
            continue;
        }

        if name.is_empty() {
            stats.blank_keys += 1;
            continue;
        }

        rows.push(PunchRow {
            name,
            department: table.cell(i, dept_col),
            date,
            time,
            raw_timestamp: parse_timestamp(date, time),
        });
    }

    let rows = collapse_near_duplicates(rows, config, stats);

    let mut punches = Vec::with_capacity(rows.len());
    for row in rows {
        let time = config.normalize_time(row.time);
        if time != row.time {
            stats.remapped_times += 1;
        }

        let date = parse_date(row.date);
        let timestamp = parse_timestamp(row.date, time);

        match (date, timestamp) {
            (Some(date), Some(timestamp)) => punches.push(PunchEvent {
                employee_id: row.name.to_string(),
                department: row.department.to_string(),
                date,
                time: time.to_string(),
                timestamp,
            }),
            _ => {
                debug!(
                    "dropping punch for {} with unparseable timestamp '{} {}'",
                    row.name, row.date, time
                );
                stats.unparseable_punches += 1;
            }
        }
    }

    Ok(punches)
}

/// Single forward sweep per employee over chronologically sorted rows.
///
/// The anchor is the last kept punch; removed punches never become anchors, so a
/// run of closely spaced punches collapses to its first member. Rows whose raw
/// timestamp does not parse are neither anchors nor removed.
fn collapse_near_duplicates<'a>(
    mut rows: Vec<PunchRow<'a>>,
    config: &AttendanceConfig,
    stats: &mut NormalizationStats,
) -> Vec<PunchRow<'a>> {
    // Stable: equal (name, timestamp) keep input order; unparseable rows sort last
    rows.sort_by(|a, b| {
        a.name.cmp(b.name).then_with(|| match (a.raw_timestamp, b.raw_timestamp) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
    });

    let window = config.collision_window();
    let mut kept = Vec::with_capacity(rows.len());
    let mut anchor: Option<(&str, NaiveDateTime)> = None;

    for row in rows {
        let Some(ts) = row.raw_timestamp else {
            kept.push(row);
            continue;
        };

        if let Some((anchor_name, anchor_ts)) = anchor {
            if anchor_name == row.name && ts - anchor_ts < window {
                stats.near_duplicates += 1;
                continue;
            }
        }

        anchor = Some((row.name, ts));
        kept.push(row);
    }

    kept
}

pub fn normalize_shifts(table: &RawTable, stats: &mut NormalizationStats) -> Result<Vec<ShiftDay>> {
    ensure_columns(table, &SHIFT_COLUMNS, Dataset::Shifts)?;

    let name_col = table.column_index(COL_NAME).unwrap_or_default();
    let date_col = table.column_index(COL_SHIFT_DATE).unwrap_or_default();

    stats.shift_rows_in += table.len();

    let mut seen_rows: HashSet<Vec<&str>> = HashSet::new();
    let mut seen_keys: HashSet<(&str, &str)> = HashSet::new();
    let mut seen_days: HashSet<ShiftDay> = HashSet::new();
    let mut shifts = Vec::new();

    for i in 0..table.len() {
        let full_row: Vec<&str> = (0..table.headers.len()).map(|c| table.cell(i, c)).collect();
        if !seen_rows.insert(full_row) {
            stats.shift_exact_duplicates += 1;
            continue;
        }

        let name = table.cell(i, name_col);
        let raw_date = table.cell(i, date_col);

        if !seen_keys.insert((name, raw_date)) {
            stats.shift_key_duplicates += 1;
            continue;
        }

        if name.is_empty() {
            stats.blank_keys += 1;
            continue;
        }

        let Some(date) = parse_date(raw_date) else {
            warn!("skipping shift for {}: invalid shift date '{}'", name, raw_date);
            stats.invalid_shift_dates += 1;
            continue;
        };

        // Different spellings of the same day still count once
        let day = ShiftDay::new(name, date);
        if seen_days.insert(day.clone()) {
            shifts.push(day);
        } else {
            stats.shift_key_duplicates += 1;
        }
    }

    Ok(shifts)
}
