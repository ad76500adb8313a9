//! Report data model: columns, tasks and parsed report results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One column of a named report
///
/// `kind` is the executable's attribute identifier (`due`, `description.count`, ...),
/// `label` the header text configured for the report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
}

impl Column {
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
        }
    }
}

/// Task status as printed by the `status.short` column format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Deleted,
    Recurring,
    Waiting,
}

impl TaskStatus {
    /// Parse the single-letter short form
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(Self::Pending),
            "C" => Some(Self::Completed),
            "D" => Some(Self::Deleted),
            "R" => Some(Self::Recurring),
            "W" => Some(Self::Waiting),
            _ => None,
        }
    }

    /// The single-letter short form
    pub fn code(self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Completed => "C",
            Self::Deleted => "D",
            Self::Recurring => "R",
            Self::Waiting => "W",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::Recurring => "recurring",
            Self::Waiting => "waiting",
        };
        write!(f, "{}", name)
    }
}

/// A task row from a report
///
/// `data[i]` lines up with `Report::printed_columns[i]`. Cells wrapped by the
/// executable are joined with `"\n\t"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: String,
    pub status: TaskStatus,
    pub data: Vec<String>,
}

/// A parsed report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Full schema of the named report
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
    /// Columns actually printed by this invocation, in print order
    pub printed_columns: Vec<Column>,
}

impl Report {
    /// A report with a schema and no matching tasks
    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            tasks: Vec::new(),
            printed_columns: Vec::new(),
        }
    }
}

/// A report together with the moment it was fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub report: Report,
    pub fetched_at: DateTime<Utc>,
}
