//! twr - Taskwarrior report client
//!
//! CLI entry point for showing, watching and editing reports.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use taskreport::cli::{Cli, Command, OutputFormat, generate_after_help, join_words};
use taskreport::config::Config;
use taskreport::events::spawn_event_logger;
use taskreport::render::{format_columns, format_report};
use taskreport::{ReportSnapshot, TaskHandler};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskreport")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("twr.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    info!(binary = %config.task_binary, cache_columns = config.cache_columns, "twr loaded config");

    let handler = TaskHandler::from_config(&config);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_report(&handler, &config.default_report, &[], OutputFormat::Text).await,
        Some(Command::Report { name, filter, format }) => {
            let name = name.unwrap_or_else(|| config.default_report.clone());
            cmd_report(&handler, &name, &filter, format).await
        }
        Some(Command::Columns { name, format }) => cmd_columns(&handler, &name, format).await,
        Some(Command::Add { text }) => {
            let uuid = handler.create_task(&join_words(&text)).await?;
            println!("{} Created task {}", "✓".green(), uuid.cyan());
            Ok(())
        }
        Some(Command::Modify { uuid, text }) => {
            handler.modify_task(&uuid, &join_words(&text)).await?;
            println!("{} Modified task {}", "✓".green(), uuid.cyan());
            Ok(())
        }
        Some(Command::Done { uuid }) => {
            handler.complete_task(&uuid).await?;
            println!("{} Completed task {}", "✓".green(), uuid.cyan());
            Ok(())
        }
        Some(Command::Delete { uuid }) => {
            handler.delete_task(&uuid).await?;
            println!("{} Deleted task {}", "✓".green(), uuid.cyan());
            Ok(())
        }
        Some(Command::Restore { uuid }) => {
            handler.undo_task(&uuid).await?;
            println!("{} Restored task {} to pending", "✓".green(), uuid.cyan());
            Ok(())
        }
        Some(Command::Undo) => {
            handler.undo_last().await?;
            println!("{} Reverted last change", "✓".green());
            Ok(())
        }
        Some(Command::Untag { uuid, tag }) => {
            handler.remove_tag(&uuid, &tag).await?;
            println!("{} Removed tag {} from {}", "✓".green(), tag.yellow(), uuid.cyan());
            Ok(())
        }
        Some(Command::Tags { uuid }) => {
            print_list(&handler.tags(uuid.as_deref()).await?, "No tags found");
            Ok(())
        }
        Some(Command::Projects) => {
            print_list(&handler.projects().await?, "No projects found");
            Ok(())
        }
        Some(Command::Info { uuid, width }) => {
            print!("{}", handler.get_task_details(&uuid, width).await?);
            Ok(())
        }
        Some(Command::Watch { name, filter }) => {
            let name = name.unwrap_or_else(|| config.default_report.clone());
            cmd_watch(&handler, &config, &name, &filter).await
        }
        Some(Command::ClearCache) => {
            let cleared = handler.clear_column_cache();
            println!("{} Cleared {} cached report schema(s)", "✓".green(), cleared);
            Ok(())
        }
    }
}

fn filter_text(filter: &[String]) -> Option<String> {
    Some(join_words(filter)).filter(|f| !f.trim().is_empty())
}

async fn cmd_report(handler: &TaskHandler, name: &str, filter: &[String], format: OutputFormat) -> Result<()> {
    debug!(%name, %format, "cmd_report: called");
    let filter = filter_text(filter);
    let snapshot = handler
        .get_tasks(name, filter.as_deref())
        .await
        .context(format!("Failed to fetch report '{}'", name))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => print_snapshot(name, &snapshot),
    }
    Ok(())
}

async fn cmd_columns(handler: &TaskHandler, name: &str, format: OutputFormat) -> Result<()> {
    debug!(%name, %format, "cmd_columns: called");
    let columns = handler.resolve_columns(name).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&columns)?),
        OutputFormat::Text if columns.is_empty() => println!("Report '{}' has no columns", name),
        OutputFormat::Text => println!("{}", format_columns(&columns)),
    }
    Ok(())
}

async fn cmd_watch(handler: &TaskHandler, config: &Config, name: &str, filter: &[String]) -> Result<()> {
    debug!(%name, "cmd_watch: called");
    let filter = filter_text(filter);
    let bus = handler.bus();
    let mut rx = bus.subscribe();
    let logger = spawn_event_logger(&bus);
    let ticker = handler.start_ticker(config.tick_interval());

    render_watch(handler, name, filter.as_deref()).await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("cmd_watch: interrupted");
                break;
            }
            event = rx.recv() => match event {
                Ok(event) => {
                    debug!(%event, "cmd_watch: re-rendering");
                    render_watch(handler, name, filter.as_deref()).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "cmd_watch: lagged behind events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    ticker.abort();
    logger.abort();
    Ok(())
}

async fn render_watch(handler: &TaskHandler, name: &str, filter: Option<&str>) {
    // Clear the screen and home the cursor
    print!("\x1B[2J\x1B[H");
    match handler.get_tasks(name, filter).await {
        Ok(snapshot) => print_snapshot(name, &snapshot),
        Err(e) => eprintln!("{} {}", "✗".red(), e),
    }
}

fn print_snapshot(name: &str, snapshot: &ReportSnapshot) {
    let table = format_report(&snapshot.report);
    let mut lines = table.lines();
    match lines.next() {
        Some(header) => {
            println!("{}", header.bold());
            for line in lines {
                println!("{}", line);
            }
        }
        None => println!("No matching tasks"),
    }
    println!(
        "{}",
        format!(
            "{} task(s) in '{}' at {}",
            snapshot.report.tasks.len(),
            name,
            snapshot.fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        )
        .dimmed()
    );
}

fn print_list(items: &[String], empty: &str) {
    if items.is_empty() {
        println!("{}", empty);
    } else {
        for item in items {
            println!("{}", item);
        }
    }
}
