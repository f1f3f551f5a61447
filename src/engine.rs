// ⚙️ Attendance Engine - raw batches → daily results → employee summaries
//
//   RawTable ×2 → normalize → per employee:
//       per shift day: generate slots → match punches → classify
//       fold days → summaries
//
// Each employee fold reads only that employee's punches and shift days, and the
// consumed-punch set lives inside a single day's match, so folds are independent
// and their outputs are simply concatenated in employee order.

use crate::aggregator::{Aggregator, EmployeeSummary};
use crate::classifier::{DayClassifier, DayResult};
use crate::config::AttendanceConfig;
use crate::error::Result;
use crate::matcher::match_slots;
use crate::normalizer::{normalize, NormalizationStats, NormalizedBatch};
use crate::records::{PunchEvent, RawTable, ShiftDay, UNKNOWN_DEPARTMENT};
use crate::slots::generate_slots;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed,
    /// Inputs were structurally fine but nothing could be evaluated
    NoResults,
}

/// A shift day that could not be evaluated; the run carries on without it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub employee_id: String,
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub normalization: NormalizationStats,
    pub employees_evaluated: usize,
    pub days_evaluated: usize,
    pub skipped_days: Vec<SkippedDay>,
}

impl RunDiagnostics {
    pub fn summary(&self) -> String {
        format!(
            "{} employees, {} days evaluated, {} days skipped | {}",
            self.employees_evaluated,
            self.days_evaluated,
            self.skipped_days.len(),
            self.normalization.summary()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub outcome: RunOutcome,
    /// Sorted by (employee, date)
    pub daily: Vec<DayResult>,
    /// Sorted by (employee, department)
    pub summaries: Vec<EmployeeSummary>,
    pub diagnostics: RunDiagnostics,
}

impl AttendanceReport {
    fn no_results(diagnostics: RunDiagnostics) -> Self {
        AttendanceReport {
            outcome: RunOutcome::NoResults,
            daily: Vec::new(),
            summaries: Vec::new(),
            diagnostics,
        }
    }

    pub fn has_results(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn daily_for<'a>(&'a self, employee_id: &'a str) -> impl Iterator<Item = &'a DayResult> {
        self.daily.iter().filter(move |d| d.employee_id == employee_id)
    }

    pub fn summary_for(&self, employee_id: &str) -> Option<&EmployeeSummary> {
        self.summaries.iter().find(|s| s.employee_id == employee_id)
    }

    /// SHA-256 over the canonical JSON of the daily and summary tables.
    /// Identical inputs and configuration always give the same digest.
    pub fn digest(&self) -> serde_json::Result<String> {
        let canonical = serde_json::to_vec(&(&self.daily, &self.summaries))?;
        let mut hasher = Sha256::new();
        hasher.update(canonical);
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn summary(&self) -> String {
        let compliant = self.summaries.iter().filter(|s| s.is_compliant()).count();
        format!(
            "{} daily results, {} employee summaries ({} compliant)",
            self.daily.len(),
            self.summaries.len(),
            compliant
        )
    }
}

/// Output of one employee's fold
#[derive(Debug, Clone, Default)]
pub struct EmployeeFold {
    pub days: Vec<DayResult>,
    pub summaries: Vec<EmployeeSummary>,
    pub skipped: Vec<SkippedDay>,
}

// ============================================================================
// ATTENDANCE ENGINE
// ============================================================================

pub struct AttendanceEngine {
    config: AttendanceConfig,
}

impl AttendanceEngine {
    /// Create engine; rejects configurations it cannot evaluate
    pub fn new(config: AttendanceConfig) -> Result<Self> {
        config.validate()?;
        Ok(AttendanceEngine { config })
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Run the whole pipeline over two raw batches.
    ///
    /// Fails only on structural problems (missing columns). Bad rows and days
    /// that cannot be evaluated are dropped and counted in the diagnostics.
    pub fn calculate(&self, punches: &RawTable, shifts: &RawTable) -> Result<AttendanceReport> {
        let batch = normalize(punches, shifts, &self.config)?;
        Ok(self.evaluate(batch))
    }

    /// Evaluate an already normalized batch
    pub fn evaluate(&self, batch: NormalizedBatch) -> AttendanceReport {
        let NormalizedBatch {
            punches,
            shifts,
            stats,
        } = batch;

        let mut diagnostics = RunDiagnostics {
            normalization: stats,
            ..Default::default()
        };

        if punches.is_empty() || shifts.is_empty() {
            info!(
                "no results: {} punches, {} shift days after normalization",
                punches.len(),
                shifts.len()
            );
            return AttendanceReport::no_results(diagnostics);
        }

        let mut punches_by_employee: BTreeMap<&str, Vec<&PunchEvent>> = BTreeMap::new();
        for punch in &punches {
            punches_by_employee
                .entry(punch.employee_id.as_str())
                .or_default()
                .push(punch);
        }
        for list in punches_by_employee.values_mut() {
            list.sort_by_key(|p| p.timestamp);
        }

        let mut shifts_by_employee: BTreeMap<&str, Vec<&ShiftDay>> = BTreeMap::new();
        for shift in &shifts {
            shifts_by_employee
                .entry(shift.employee_id.as_str())
                .or_default()
                .push(shift);
        }

        let mut daily = Vec::new();
        let mut summaries = Vec::new();

        for (employee_id, employee_shifts) in &shifts_by_employee {
            let employee_punches = punches_by_employee
                .get(employee_id)
                .map(|v| v.as_slice())
                .unwrap_or(&[]);

            let fold = self.evaluate_employee(employee_id, employee_punches, employee_shifts);

            diagnostics.employees_evaluated += 1;
            diagnostics.days_evaluated += fold.days.len();
            diagnostics.skipped_days.extend(fold.skipped);
            daily.extend(fold.days);
            summaries.extend(fold.summaries);
        }

        if self.config.verbose {
            info!("attendance run: {}", diagnostics.summary());
        } else {
            debug!("attendance run: {}", diagnostics.summary());
        }

        if daily.is_empty() {
            return AttendanceReport::no_results(diagnostics);
        }

        AttendanceReport {
            outcome: RunOutcome::Completed,
            daily,
            summaries,
            diagnostics,
        }
    }

    /// Evaluate every shift day of one employee and fold the results.
    ///
    /// `punches` must be that employee's punches in chronological order.
    /// A day's department is taken from its first punch on D or D+1; a day with
    /// neither falls back to the employee's earliest punch overall, and only an
    /// employee who never punched is reported under "Unknown".
    pub fn evaluate_employee(
        &self,
        employee_id: &str,
        punches: &[&PunchEvent],
        shifts: &[&ShiftDay],
    ) -> EmployeeFold {
        let classifier = DayClassifier::new(self.config.tolerance());
        let aggregator = Aggregator::new(self.config.absence_threshold);

        // Used for days without any punch of their own
        let employee_department = punches
            .first()
            .map(|p| p.department.as_str())
            .unwrap_or(UNKNOWN_DEPARTMENT);

        let mut fold = EmployeeFold::default();

        let mut ordered: Vec<&ShiftDay> = shifts.to_vec();
        ordered.sort_by_key(|s| s.date);

        for shift in ordered {
            let Some(slots) = generate_slots(shift, &self.config) else {
                warn!(
                    "skipping {} on {}: next-day slot falls outside the calendar",
                    employee_id, shift.date
                );
                fold.skipped.push(SkippedDay {
                    employee_id: employee_id.to_string(),
                    date: shift.date,
                    reason: "next-day slot falls outside the calendar".to_string(),
                });
                continue;
            };

            let next_day = shift.date.succ_opt();
            let window: Vec<&PunchEvent> = punches
                .iter()
                .copied()
                .filter(|p| p.date == shift.date || Some(p.date) == next_day)
                .collect();

            let has_punch_on_shift_date = window.iter().any(|p| p.date == shift.date);
            let department = window
                .first()
                .map(|p| p.department.as_str())
                .unwrap_or(employee_department);

            let timestamps: Vec<NaiveDateTime> = window.iter().map(|p| p.timestamp).collect();
            let matches = match_slots(&timestamps, &slots, self.config.match_window());

            let day = classifier.classify(
                employee_id,
                department,
                shift.date,
                matches,
                has_punch_on_shift_date,
            );

            debug!(
                "{} {}: {} ({}/{} matched)",
                employee_id, shift.date, day.status, day.matched_count, day.required_count
            );

            fold.days.push(day);
        }

        let shift_counts = BTreeMap::from([(employee_id.to_string(), shifts.len())]);
        fold.summaries = aggregator.aggregate(&fold.days, &shift_counts);
        fold
    }
}
