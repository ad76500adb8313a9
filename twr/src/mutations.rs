//! Task mutations and read-only queries
//!
//! Every successful mutation emits [`TaskEvent::Refresh`]. Failed mutations
//! return the error and emit nothing.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info};

use crate::error::TaskError;
use crate::events::{EventBus, TaskEvent};
use crate::process::{CommandRunner, Invocation};
use crate::sanitize::{sanitize, sanitize_single_argument};

static CREATED_TASK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"task (\d+)").expect("valid regex"));

/// Status values written by the status-only mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusChange {
    Pending,
    Deleted,
}

impl StatusChange {
    fn as_str(self) -> &'static str {
        match self {
            StatusChange::Pending => "pending",
            StatusChange::Deleted => "deleted",
        }
    }
}

/// Numeric task ids announced on the first line of `add` output
pub fn created_task_ids(output: &str) -> Vec<String> {
    let first = output.trim().lines().next().unwrap_or_default();
    CREATED_TASK
        .captures_iter(first)
        .map(|c| c[1].to_string())
        .collect()
}

/// Split enumeration output into trimmed, non-empty lines
fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Issues task commands against the executable
pub struct TaskCommands {
    runner: Arc<dyn CommandRunner>,
    bus: Arc<EventBus>,
}

impl TaskCommands {
    pub fn new(runner: Arc<dyn CommandRunner>, bus: Arc<EventBus>) -> Self {
        debug!("TaskCommands::new: called");
        Self { runner, bus }
    }

    async fn mutate(&self, invocation: Invocation) -> Result<String, TaskError> {
        let output = self.runner.run(&invocation).await?;
        self.bus.emit(TaskEvent::Refresh);
        Ok(output)
    }

    /// Create a task from free-form `add` arguments, returning its uuid
    ///
    /// Numeric ids shift as tasks change, so the new id is resolved to a uuid
    /// before returning. Refresh is emitted as soon as `add` reports a created
    /// task, even if resolving its uuid then fails.
    pub async fn create_task(&self, command: &str) -> Result<String, TaskError> {
        debug!("TaskCommands::create_task: called");
        let output = self
            .runner
            .run(&Invocation::line(format!("add {}", sanitize(command))))
            .await?;

        let mut ids = created_task_ids(&output);
        if ids.is_empty() {
            return Err(TaskError::NoTaskCreated { output });
        }
        self.bus.emit(TaskEvent::Refresh);
        if ids.len() > 1 {
            return Err(TaskError::MultipleTasksCreated { ids });
        }

        let id = ids.remove(0);
        let uuid = self.uuid_of(&id).await?;
        info!(%id, %uuid, "Created task");
        Ok(uuid)
    }

    /// Apply free-form `modify` arguments to a task
    pub async fn modify_task(&self, uuid: &str, command: &str) -> Result<(), TaskError> {
        debug!(%uuid, "TaskCommands::modify_task: called");
        self.mutate(Invocation::line(format!(
            "{} modify {}",
            sanitize_single_argument(uuid),
            sanitize(command)
        )))
        .await?;
        Ok(())
    }

    /// Remove one tag from a task
    pub async fn remove_tag(&self, uuid: &str, tag: &str) -> Result<(), TaskError> {
        debug!(%uuid, %tag, "TaskCommands::remove_tag: called");
        let tag = tag.trim_start_matches('+');
        self.mutate(Invocation::args([uuid.to_string(), "modify".to_string(), format!("-{}", tag)]))
            .await?;
        Ok(())
    }

    /// Mark a task done
    pub async fn complete_task(&self, uuid: &str) -> Result<(), TaskError> {
        debug!(%uuid, "TaskCommands::complete_task: called");
        self.mutate(Invocation::args([uuid, "done"])).await?;
        Ok(())
    }

    /// Set a task's status to deleted
    pub async fn delete_task(&self, uuid: &str) -> Result<(), TaskError> {
        debug!(%uuid, "TaskCommands::delete_task: called");
        self.set_status(uuid, StatusChange::Deleted).await
    }

    /// Set a task's status back to pending
    ///
    /// Only the status changes; other attribute edits are not reverted. See
    /// [`TaskCommands::undo_last`] for the executable's own undo.
    pub async fn undo_task(&self, uuid: &str) -> Result<(), TaskError> {
        debug!(%uuid, "TaskCommands::undo_task: called");
        self.set_status(uuid, StatusChange::Pending).await
    }

    /// Revert the executable's last recorded change, without prompting
    pub async fn undo_last(&self) -> Result<(), TaskError> {
        debug!("TaskCommands::undo_last: called");
        self.mutate(Invocation::args(["rc.confirmation:off", "undo"])).await?;
        Ok(())
    }

    async fn set_status(&self, uuid: &str, status: StatusChange) -> Result<(), TaskError> {
        self.mutate(Invocation::args([
            uuid.to_string(),
            "modify".to_string(),
            format!("status:{}", status.as_str()),
        ]))
        .await?;
        Ok(())
    }

    /// Resolve a numeric id to the task's uuid
    pub async fn uuid_of(&self, id: &str) -> Result<String, TaskError> {
        debug!(%id, "TaskCommands::uuid_of: called");
        let uuid = self
            .runner
            .run(&Invocation::args(["_get".to_string(), format!("{}.uuid", id)]))
            .await?
            .trim()
            .to_string();
        if uuid.is_empty() {
            return Err(TaskError::UnknownTask(id.to_string()));
        }
        Ok(uuid)
    }

    /// All tags, or the tags of one task
    pub async fn get_tags(&self, uuid: Option<&str>) -> Result<Vec<String>, TaskError> {
        debug!(?uuid, "TaskCommands::get_tags: called");
        let invocation = match uuid {
            Some(uuid) => Invocation::args([uuid, "_tags"]),
            None => Invocation::args(["_tags"]),
        };
        Ok(split_lines(&self.runner.run(&invocation).await?))
    }

    /// All project names
    pub async fn get_projects(&self) -> Result<Vec<String>, TaskError> {
        debug!("TaskCommands::get_projects: called");
        Ok(split_lines(&self.runner.run(&Invocation::args(["_projects"])).await?))
    }

    /// The executable's `information` dump for a task
    pub async fn get_task_details(&self, uuid: &str, width: Option<u16>) -> Result<String, TaskError> {
        debug!(%uuid, ?width, "TaskCommands::get_task_details: called");
        let mut args = Vec::new();
        if let Some(width) = width {
            args.push(format!("rc.defaultwidth:{}", width));
        }
        args.push(uuid.to_string());
        args.push("information".to_string());
        Ok(self.runner.run(&Invocation::Args(args)).await?)
    }
}
