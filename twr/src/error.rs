//! Error types for the task report engine

use thiserror::Error;

/// Failure to run the task executable
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Command exited with {}: {stderr}", exit_label(.code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("Failed to read command output: {0}")]
    Output(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "signal".to_string(),
    }
}

impl ProcessError {
    /// Exit status if the process ran and failed
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Exit { code, .. } => *code,
            _ => None,
        }
    }

    /// True when the executable could not be started at all
    pub fn is_spawn(&self) -> bool {
        matches!(self, ProcessError::Spawn { .. })
    }
}

/// Failure to resolve a report's column schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Error trying to get {what} for report '{report}': {source}")]
    Query {
        report: String,
        what: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("Report '{report}' declares column '{kind}' at position {index} without a label")]
    MissingLabel { report: String, kind: String, index: usize },
}

/// Report output that does not agree with the resolved schema
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Report output has no label and ruler lines")]
    MissingHeader,

    #[error("Report ruler has {cells} column(s), expected at least the uuid and status columns")]
    MissingIdentityColumns { cells: usize },

    #[error("Printed label '{0}' does not match any column of the report")]
    UnknownLabel(String),

    #[error("Printed label '{0}' matches more than one column of the report")]
    AmbiguousLabel(String),

    #[error("Task {uuid} has unknown status code '{code}'")]
    UnknownStatus { uuid: String, code: String },

    #[error("Continuation on line {line} has no task row before it")]
    OrphanContinuation { line: usize },

    #[error("Continuation on line {line} has a status, columns are misaligned")]
    StatusOnContinuation { line: usize },
}

/// Failure to fetch a report
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid report name '{0}': expected letters, digits, '_', '.' or '-'")]
    InvalidReportName(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Parse failures mean the schema and the report output diverged
    pub fn is_fault(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }
}

/// Failure of a task mutation or query
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("No task created")]
    NoTaskCreated { output: String },

    #[error("Assertion failed: multiple tasks created ({})", .ids.join(", "))]
    MultipleTasksCreated { ids: Vec<String> },

    #[error("Task {0} has no uuid")]
    UnknownTask(String),
}

impl TaskError {
    /// Invariant violations that should abort the operation loudly
    pub fn is_fault(&self) -> bool {
        matches!(self, TaskError::MultipleTasksCreated { .. })
    }
}
