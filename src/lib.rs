// Attendance Ledger - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod records;
pub mod normalizer;  // Cleaning: dedup, near-duplicate collapse, remap
pub mod slots;       // Required-slot generation per shift day
pub mod matcher;     // Greedy punch → slot matching
pub mod classifier;  // Day status
pub mod aggregator;  // Per-employee summaries
pub mod engine;
pub mod validation;  // Pre-flight checks
pub mod views;       // Review tables derived from a report
pub mod import;
pub mod export;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{AttendanceError, Dataset, Result};
pub use config::{AttendanceConfig, SlotDefinition};
pub use records::{PunchEvent, RawTable, ShiftDay};
pub use normalizer::{normalize, NormalizationStats, NormalizedBatch};
pub use slots::{generate_slots, RequiredSlot};
pub use matcher::{match_slots, MatchOutcome, SlotMatch, ToleranceWindow};
pub use classifier::{DayClassifier, DayResult, DayStatus};
pub use aggregator::{Aggregator, EmployeeSummary, FinalStatus};
pub use engine::{AttendanceEngine, AttendanceReport, RunDiagnostics, RunOutcome, SkippedDay};
pub use validation::{DataValidator, Severity, ValidationIssue, ValidationReport};
pub use views::{DepartmentTotals, LateEntry, MatchingLogEntry, MissingPunch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
