// ⚠️ Error types - structural failures that abort a whole run
// Per-row and per-day problems never show up here, they are counted in RunDiagnostics

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which input batch a structural failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dataset {
    Punches,
    Shifts,
}

impl Dataset {
    pub fn name(&self) -> &str {
        match self {
            Dataset::Punches => "punch records",
            Dataset::Shifts => "shift schedule",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    /// Required columns absent from an input batch. Fatal for the whole run.
    #[error("Missing required column(s) in {dataset}: {}", .columns.join(", "))]
    MissingColumns {
        dataset: Dataset,
        columns: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AttendanceError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        AttendanceError::InvalidConfig(msg.into())
    }

    /// True for failures caused by the shape of the input batches
    pub fn is_structural(&self) -> bool {
        matches!(self, AttendanceError::MissingColumns { .. })
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
