//! Report schema resolution
//!
//! A report's schema is read from the executable's configuration store with two
//! `_get` queries, `rc.report.<name>.labels` and `rc.report.<name>.columns`, run
//! concurrently. Both values are comma separated and zipped by position.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::ColumnCache;
use crate::domain::Column;
use crate::error::{ProcessError, SchemaError};
use crate::process::{CommandRunner, Invocation};

/// Resolves and caches report schemas
pub struct SchemaResolver {
    runner: Arc<dyn CommandRunner>,
    cache: Arc<ColumnCache>,
    caching: bool,
}

impl SchemaResolver {
    pub fn new(runner: Arc<dyn CommandRunner>, cache: Arc<ColumnCache>, caching: bool) -> Self {
        debug!(caching, "SchemaResolver::new: called");
        Self { runner, cache, caching }
    }

    /// Ordered columns of `report`
    ///
    /// Slots whose column type is blank are skipped. Nothing is cached unless
    /// both queries succeed.
    pub async fn resolve_columns(&self, report: &str) -> Result<Vec<Column>, SchemaError> {
        debug!(%report, "SchemaResolver::resolve_columns: called");
        if self.caching
            && let Some(columns) = self.cache.get(report)
        {
            debug!(%report, "SchemaResolver::resolve_columns: cache hit");
            return Ok(columns);
        }

        let labels_query = Invocation::args(["_get".to_string(), format!("rc.report.{}.labels", report)]);
        let columns_query = Invocation::args(["_get".to_string(), format!("rc.report.{}.columns", report)]);

        let (labels, kinds) = tokio::join!(self.runner.run(&labels_query), self.runner.run(&columns_query));
        let labels = labels.map_err(|source| query_error(report, "labels", source))?;
        let kinds = kinds.map_err(|source| query_error(report, "columns", source))?;

        let columns = zip_columns(report, &labels, &kinds)?;
        info!(%report, count = columns.len(), "Resolved report columns");

        if self.caching {
            self.cache.insert(report, columns.clone());
        }
        Ok(columns)
    }

    /// Forget every cached schema, returning how many there were
    pub fn clear_cache(&self) -> usize {
        debug!("SchemaResolver::clear_cache: called");
        self.cache.clear()
    }
}

fn query_error(report: &str, what: &'static str, source: ProcessError) -> SchemaError {
    debug!(%report, what, "SchemaResolver: query failed");
    SchemaError::Query {
        report: report.to_string(),
        what,
        source,
    }
}

fn config_list(value: &str) -> Vec<&str> {
    value.trim().split(',').map(str::trim).collect()
}

fn zip_columns(report: &str, labels: &str, kinds: &str) -> Result<Vec<Column>, SchemaError> {
    let labels = config_list(labels);
    let mut columns = Vec::new();

    for (index, kind) in config_list(kinds).into_iter().enumerate() {
        if kind.is_empty() {
            continue;
        }
        match labels.get(index) {
            Some(label) if !label.is_empty() => columns.push(Column::new(kind, *label)),
            _ => {
                return Err(SchemaError::MissingLabel {
                    report: report.to_string(),
                    kind: kind.to_string(),
                    index,
                });
            }
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockRunner;

    fn next_runner() -> MockRunner {
        MockRunner::new()
            .on("_get rc.report.next.labels", "ID,Description,Due\n")
            .on("_get rc.report.next.columns", "id,description.count,due.relative\n")
    }

    #[tokio::test]
    async fn test_resolve_zips_labels_and_types() {
        let runner = Arc::new(next_runner());
        let resolver = SchemaResolver::new(runner.clone(), Arc::new(ColumnCache::new()), false);

        let columns = resolver.resolve_columns("next").await.unwrap();
        assert_eq!(
            columns,
            vec![
                Column::new("id", "ID"),
                Column::new("description.count", "Description"),
                Column::new("due.relative", "Due"),
            ]
        );
        assert_eq!(runner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_type_slots_are_dropped() {
        let runner = Arc::new(
            MockRunner::new()
                .on("_get rc.report.sparse.labels", "ID,,Project")
                .on("_get rc.report.sparse.columns", "id, ,project"),
        );
        let resolver = SchemaResolver::new(runner, Arc::new(ColumnCache::new()), false);

        let columns = resolver.resolve_columns("sparse").await.unwrap();
        assert_eq!(columns, vec![Column::new("id", "ID"), Column::new("project", "Project")]);
    }

    #[tokio::test]
    async fn test_empty_schema_is_valid() {
        let runner = Arc::new(
            MockRunner::new()
                .on("_get rc.report.blank.labels", "\n")
                .on("_get rc.report.blank.columns", "\n"),
        );
        let resolver = SchemaResolver::new(runner, Arc::new(ColumnCache::new()), true);

        assert!(resolver.resolve_columns("blank").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_label_is_an_error() {
        let runner = Arc::new(
            MockRunner::new()
                .on("_get rc.report.short.labels", "ID")
                .on("_get rc.report.short.columns", "id,due"),
        );
        let resolver = SchemaResolver::new(runner, Arc::new(ColumnCache::new()), false);

        let err = resolver.resolve_columns("short").await.unwrap_err();
        assert!(matches!(err, SchemaError::MissingLabel { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_query_failure_is_not_cached() {
        let runner = Arc::new(
            MockRunner::new()
                .on("_get rc.report.next.labels", "ID")
                .fail("_get rc.report.next.columns", 2, "boom"),
        );
        let cache = Arc::new(ColumnCache::new());
        let resolver = SchemaResolver::new(runner, cache.clone(), true);

        let err = resolver.resolve_columns("next").await.unwrap_err();
        assert!(matches!(err, SchemaError::Query { what: "columns", .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cache_avoids_second_query_pair() {
        let runner = Arc::new(next_runner());
        let cache = Arc::new(ColumnCache::new());
        let resolver = SchemaResolver::new(runner.clone(), cache.clone(), true);

        let first = resolver.resolve_columns("next").await.unwrap();
        let second = resolver.resolve_columns("next").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(runner.call_count(), 2);

        assert_eq!(resolver.clear_cache(), 1);
        resolver.resolve_columns("next").await.unwrap();
        assert_eq!(runner.call_count(), 4);
    }

    #[tokio::test]
    async fn test_caching_disabled_always_queries() {
        let runner = Arc::new(next_runner());
        let cache = Arc::new(ColumnCache::new());
        let resolver = SchemaResolver::new(runner.clone(), cache.clone(), false);

        resolver.resolve_columns("next").await.unwrap();
        resolver.resolve_columns("next").await.unwrap();
        assert_eq!(runner.call_count(), 4);
        assert!(cache.is_empty());
    }
}
