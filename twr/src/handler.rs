//! Task handler - wires the runner, caches, event bus and commands together
//!
//! One [`TaskHandler`] owns a single [`EventBus`]. Every successful mutation
//! emits [`TaskEvent::Refresh`] on it, which drops the cached tag and project
//! suggestions. Report schemas survive refreshes and are only dropped by
//! [`TaskHandler::clear_column_cache`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{ColumnCache, SuggestionCache};
use crate::config::Config;
use crate::domain::{Column, Report, ReportSnapshot};
use crate::error::{FetchError, SchemaError, TaskError};
use crate::events::{EventBus, ListenerError, ListenerId, TaskEvent, spawn_interval_ticker};
use crate::mutations::TaskCommands;
use crate::process::{CommandRunner, TaskBinary};
use crate::report::ReportFetcher;
use crate::schema::SchemaResolver;

/// Cache and event coordinator for one task executable
pub struct TaskHandler {
    schema: Arc<SchemaResolver>,
    fetcher: ReportFetcher,
    commands: TaskCommands,
    suggestions: Arc<SuggestionCache>,
    bus: Arc<EventBus>,
    refresh_listener: ListenerId,
}

impl TaskHandler {
    /// Build a handler around any runner
    pub fn new(runner: Arc<dyn CommandRunner>, cache_columns: bool) -> Self {
        debug!(cache_columns, "TaskHandler::new: called");
        let bus = Arc::new(EventBus::default());
        let schema = Arc::new(SchemaResolver::new(
            runner.clone(),
            Arc::new(ColumnCache::new()),
            cache_columns,
        ));
        let suggestions = Arc::new(SuggestionCache::new());

        let cleared = suggestions.clone();
        let refresh_listener = bus.on(TaskEvent::Refresh, move |_| {
            cleared.clear();
            Ok(())
        });

        Self {
            fetcher: ReportFetcher::new(runner.clone(), schema.clone()),
            commands: TaskCommands::new(runner, bus.clone()),
            schema,
            suggestions,
            bus,
            refresh_listener,
        }
    }

    /// Build a handler that runs the configured executable
    pub fn from_config(config: &Config) -> Self {
        debug!(binary = %config.task_binary, "TaskHandler::from_config: called");
        let runner = TaskBinary::new(config.task_binary.clone(), config.debug_commands);
        Self::new(Arc::new(runner), config.cache_columns)
    }

    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// Ordered columns of `report`
    pub async fn resolve_columns(&self, report: &str) -> Result<Vec<Column>, SchemaError> {
        self.schema.resolve_columns(report).await
    }

    /// Forget every cached report schema, returning how many there were
    pub fn clear_column_cache(&self) -> usize {
        let cleared = self.schema.clear_cache();
        info!(cleared, "Cleared report column cache");
        cleared
    }

    pub async fn fetch_report(&self, report: &str, filter: Option<&str>) -> Result<Report, FetchError> {
        self.fetcher.fetch_report(report, filter).await
    }

    /// Fetch `report` and stamp it with the fetch time
    ///
    /// Failures are logged here before being returned.
    pub async fn get_tasks(&self, report: &str, filter: Option<&str>) -> Result<ReportSnapshot, FetchError> {
        debug!(%report, "TaskHandler::get_tasks: called");
        match self.fetcher.fetch_report(report, filter).await {
            Ok(report) => Ok(ReportSnapshot {
                report,
                fetched_at: Utc::now(),
            }),
            Err(e) => {
                error!(%report, fault = e.is_fault(), error = %e, "Failed to fetch report");
                Err(e)
            }
        }
    }

    /// Ask every view to reload, without changing anything
    pub fn refresh(&self) -> Vec<ListenerError> {
        debug!("TaskHandler::refresh: called");
        self.bus.emit(TaskEvent::Refresh)
    }

    /// Emit [`TaskEvent::IntervalTick`] every `period` until the handle is aborted
    pub fn start_ticker(&self, period: Duration) -> JoinHandle<()> {
        spawn_interval_ticker(self.bus.clone(), period)
    }

    /// Tag suggestions, globally or for one task, cached until the next refresh
    pub async fn tags(&self, uuid: Option<&str>) -> Result<Vec<String>, TaskError> {
        debug!(?uuid, "TaskHandler::tags: called");
        let cached = match uuid {
            Some(uuid) => self.suggestions.task_tags(uuid),
            None => self.suggestions.tags(),
        };
        if let Some(tags) = cached {
            return Ok(tags);
        }

        // A refresh while the query runs makes this result stale
        let generation = self.suggestions.generation();
        let tags = self.commands.get_tags(uuid).await?;
        match uuid {
            Some(uuid) => self.suggestions.set_task_tags(generation, uuid, tags.clone()),
            None => self.suggestions.set_tags(generation, tags.clone()),
        };
        Ok(tags)
    }

    /// Project suggestions, cached until the next refresh
    pub async fn projects(&self) -> Result<Vec<String>, TaskError> {
        debug!("TaskHandler::projects: called");
        if let Some(projects) = self.suggestions.projects() {
            return Ok(projects);
        }
        let generation = self.suggestions.generation();
        let projects = self.commands.get_projects().await?;
        self.suggestions.set_projects(generation, projects.clone());
        Ok(projects)
    }

    pub async fn create_task(&self, command: &str) -> Result<String, TaskError> {
        self.commands.create_task(command).await
    }

    pub async fn modify_task(&self, uuid: &str, command: &str) -> Result<(), TaskError> {
        self.commands.modify_task(uuid, command).await
    }

    pub async fn remove_tag(&self, uuid: &str, tag: &str) -> Result<(), TaskError> {
        self.commands.remove_tag(uuid, tag).await
    }

    pub async fn complete_task(&self, uuid: &str) -> Result<(), TaskError> {
        self.commands.complete_task(uuid).await
    }

    pub async fn delete_task(&self, uuid: &str) -> Result<(), TaskError> {
        self.commands.delete_task(uuid).await
    }

    pub async fn undo_task(&self, uuid: &str) -> Result<(), TaskError> {
        self.commands.undo_task(uuid).await
    }

    pub async fn undo_last(&self) -> Result<(), TaskError> {
        self.commands.undo_last().await
    }

    pub async fn get_task_details(&self, uuid: &str, width: Option<u16>) -> Result<String, TaskError> {
        self.commands.get_task_details(uuid, width).await
    }
}

impl Drop for TaskHandler {
    fn drop(&mut self) {
        self.bus.off(self.refresh_listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::process::Invocation;
    use crate::process::mock::{MockRunner, key};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Notify, Semaphore};

    /// Holds the first `_tags` query until released; later ones see the new tag
    struct GatedRunner {
        entered: Notify,
        gate: Semaphore,
        tag_queries: AtomicUsize,
    }

    impl GatedRunner {
        fn new() -> Self {
            Self {
                entered: Notify::new(),
                gate: Semaphore::new(0),
                tag_queries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for GatedRunner {
        async fn run(&self, invocation: &Invocation) -> Result<String, ProcessError> {
            if key(invocation) != "_tags" {
                return Ok(String::new());
            }
            if self.tag_queries.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                let _permit = self.gate.acquire().await;
                return Ok("home\n".to_string());
            }
            Ok("home\nnewtag\n".to_string())
        }
    }

    const UUID: &str = "5c2b8a2e-1f3d-4c9a-9e2b-7d6f0a1b2c3d";

    fn handler(runner: MockRunner) -> (TaskHandler, Arc<MockRunner>) {
        let runner = Arc::new(runner);
        (TaskHandler::new(runner.clone(), true), runner)
    }

    fn next_schema(runner: MockRunner) -> MockRunner {
        runner
            .on("_get rc.report.next.labels", "Description")
            .on("_get rc.report.next.columns", "description")
    }

    #[tokio::test]
    async fn test_suggestions_cached_until_refresh() {
        let (handler, runner) = handler(
            MockRunner::new()
                .on("_tags", "home\nwork\n")
                .on("_projects", "garden\n")
                .on(&format!("{} _tags", UUID), "home\n"),
        );

        assert_eq!(handler.tags(None).await.unwrap(), vec!["home", "work"]);
        assert_eq!(handler.tags(None).await.unwrap(), vec!["home", "work"]);
        assert_eq!(handler.tags(Some(UUID)).await.unwrap(), vec!["home"]);
        assert_eq!(handler.projects().await.unwrap(), vec!["garden"]);
        assert_eq!(handler.projects().await.unwrap(), vec!["garden"]);
        assert_eq!(runner.call_count(), 3);

        assert!(handler.refresh().is_empty());
        handler.tags(None).await.unwrap();
        handler.projects().await.unwrap();
        assert_eq!(runner.call_count(), 5);
    }

    #[tokio::test]
    async fn test_mutation_clears_suggestions_but_not_schema() {
        let (handler, runner) = handler(next_schema(MockRunner::new().on("_tags", "home\n").on(UUID, "")));

        handler.resolve_columns("next").await.unwrap();
        handler.tags(None).await.unwrap();
        handler.complete_task(UUID).await.unwrap();

        handler.tags(None).await.unwrap();
        handler.resolve_columns("next").await.unwrap();

        assert_eq!(runner.count("_tags"), 2);
        assert_eq!(runner.count("_get rc.report.next"), 2);
    }

    #[tokio::test]
    async fn test_clear_column_cache_forces_requery() {
        let (handler, runner) = handler(next_schema(MockRunner::new()));

        handler.resolve_columns("next").await.unwrap();
        assert_eq!(handler.clear_column_cache(), 1);
        assert_eq!(handler.clear_column_cache(), 0);
        handler.resolve_columns("next").await.unwrap();

        assert_eq!(runner.count("_get rc.report.next"), 4);
    }

    #[tokio::test]
    async fn test_get_tasks_stamps_snapshot() {
        let output = "_tw_uuid _tw_status Description\n-------- ---------- -----------\n11111111 P          Buy milk\n";
        let (handler, _) = handler(next_schema(MockRunner::new()).on("\"next\"", output));

        let before = Utc::now();
        let snapshot = handler.get_tasks("next", None).await.unwrap();
        assert!(snapshot.fetched_at >= before);
        assert_eq!(snapshot.report.tasks.len(), 1);
        assert_eq!(snapshot.report.tasks[0].data, vec!["Buy milk"]);
    }

    #[tokio::test]
    async fn test_get_tasks_returns_fetch_errors() {
        let (handler, _) = handler(MockRunner::new().fail("_get", 1, "boom"));
        assert!(handler.get_tasks("next", None).await.is_err());
    }

    #[test]
    fn test_drop_unregisters_refresh_listener() {
        let (handler, _) = handler(MockRunner::new());
        let bus = handler.bus();
        assert_eq!(bus.listener_count(TaskEvent::Refresh), 1);
        drop(handler);
        assert_eq!(bus.listener_count(TaskEvent::Refresh), 0);
    }

    #[tokio::test]
    async fn test_refresh_during_lookup_discards_stale_tags() {
        let runner = Arc::new(GatedRunner::new());
        let handler = Arc::new(TaskHandler::new(runner.clone(), true));

        let h = handler.clone();
        let lookup = tokio::spawn(async move { h.tags(None).await });
        runner.entered.notified().await;

        handler.modify_task("abc", "+newtag").await.unwrap();
        runner.gate.add_permits(1);

        // The in-flight caller still gets what it queried
        assert_eq!(lookup.await.unwrap().unwrap(), vec!["home"]);
        assert_eq!(handler.tags(None).await.unwrap(), vec!["home", "newtag"]);
        assert_eq!(runner.tag_queries.load(Ordering::SeqCst), 2);
    }
}
