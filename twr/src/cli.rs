//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// TaskReport - Taskwarrior report client
#[derive(Parser, Debug)]
#[command(
    name = "twr",
    about = "Fetch, watch and edit Taskwarrior reports",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Task executable to run instead of the configured one
    #[arg(short, long, global = true)]
    pub binary: Option<String>,

    /// Log every command line and its raw output
    #[arg(long = "debug-commands", global = true)]
    pub debug_commands: bool,

    /// Resolve report columns on every fetch
    #[arg(long = "no-cache", global = true)]
    pub no_cache: bool,

    /// Subcommand to execute (defaults to showing the default report)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        debug!("Cli::apply: called");
        if let Some(binary) = &self.binary {
            config.task_binary = binary.clone();
        }
        if self.debug_commands {
            config.debug_commands = true;
        }
        if self.no_cache {
            config.cache_columns = false;
        }
    }
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a report
    Report {
        /// Report name (defaults to the configured report)
        name: Option<String>,

        /// Filter text passed to the report
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the columns a report is configured with
    Columns {
        /// Report name
        name: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a task
    Add {
        /// Description and attributes, as for `task add`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Modify a task
    Modify {
        uuid: String,

        /// Attributes, as for `task modify`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Mark a task done
    Done { uuid: String },

    /// Delete a task
    Delete { uuid: String },

    /// Set a task's status back to pending
    Restore { uuid: String },

    /// Revert the last change recorded by the executable
    Undo,

    /// Remove a tag from a task
    Untag { uuid: String, tag: String },

    /// List tags, globally or for one task
    Tags { uuid: Option<String> },

    /// List projects
    Projects,

    /// Show everything known about a task
    Info {
        uuid: String,

        /// Wrap width passed to the executable
        #[arg(short, long)]
        width: Option<u16>,
    },

    /// Show a report and re-render it on every tick until Ctrl-C
    Watch {
        /// Report name (defaults to the configured report)
        name: Option<String>,

        /// Filter text passed to the report
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },

    /// Drop cached report columns
    ClearCache,
}

/// Output format for report and column listings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Join command-line words back into free-form text
///
/// Words that contain spaces were quoted by the user's shell and are quoted
/// again so the tokenizer keeps them whole.
pub fn join_words(words: &[String]) -> String {
    words
        .iter()
        .map(|w| {
            if w.contains(' ') && !w.contains('"') {
                format!("\"{}\"", w)
            } else {
                w.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskreport")
        .join("logs")
        .join("twr.log")
}

/// Help footer naming the log file
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}
