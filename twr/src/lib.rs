//! TaskReport - typed client for the Taskwarrior command line
//!
//! Runs named reports with a forced, parseable layout and turns their
//! fixed-width output into structured [`Report`]s. Mutations (add, modify,
//! done, delete, undo) go through the same executable and announce themselves
//! on an [`EventBus`] so views know when to reload.
//!
//! # Architecture
//!
//! ```text
//! TaskHandler
//!   ├── SchemaResolver ── ColumnCache      (_get rc.report.<name>.{labels,columns})
//!   ├── ReportFetcher ── parse_report      (<name> <filter> rc.report.<name>.columns:...)
//!   ├── TaskCommands ── EventBus::emit     (add / modify / done / undo)
//!   └── SuggestionCache                    (_tags / _projects, cleared on Refresh)
//! ```
//!
//! # Modules
//!
//! - [`sanitize`] - argument quoting and free-form text tokenizing
//! - [`process`] - spawning the executable
//! - [`schema`] - report column resolution
//! - [`table`] - fixed-width output parser
//! - [`report`] - report fetching
//! - [`mutations`] - task commands and queries
//! - [`handler`] - caches and events wired together
//! - [`render`] - plain-text tables
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod handler;
pub mod mutations;
pub mod process;
pub mod render;
pub mod report;
pub mod sanitize;
pub mod schema;
pub mod table;

pub use config::Config;
pub use domain::{Column, Report, ReportSnapshot, Task, TaskStatus};
pub use error::{FetchError, ParseError, ProcessError, SchemaError, TaskError};
pub use events::{EventBus, TaskEvent};
pub use handler::TaskHandler;
pub use process::{CommandRunner, Invocation, TaskBinary};

/// Executable looked up on PATH when none is configured
pub const DEFAULT_TASK_BINARY: &str = "task";

/// Report shown when none is named
pub const DEFAULT_REPORT: &str = "next";

/// Interval tick period (10s)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10_000;
