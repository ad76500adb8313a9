//! Schema and suggestion caches
//!
//! Both caches are owned by the [`TaskHandler`](crate::TaskHandler). Entries are
//! replaced whole under a short lock that is never held across an await.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::domain::Column;

/// Resolved report schemas keyed by report name
///
/// Entries live until [`ColumnCache::clear`] is called; refresh events do not
/// touch this cache.
#[derive(Debug, Default)]
pub struct ColumnCache {
    entries: RwLock<HashMap<String, Vec<Column>>>,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, report: &str) -> Option<Vec<Column>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(report).cloned()
    }

    pub fn insert(&self, report: &str, columns: Vec<Column>) {
        debug!(%report, count = columns.len(), "ColumnCache::insert: called");
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(report.to_string(), columns);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, returning how many there were
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let count = entries.len();
        entries.clear();
        debug!(count, "ColumnCache::clear: cleared");
        count
    }
}

#[derive(Debug, Default)]
struct Suggestions {
    generation: u64,
    tags: Option<Vec<String>>,
    projects: Option<Vec<String>>,
    task_tags: HashMap<String, Vec<String>>,
}

/// Tag and project lists used for completion, cleared on every refresh
///
/// Each clear starts a new generation. A lookup reads [`generation`] before
/// querying the executable and passes it to the setter, which drops the value
/// if a clear happened in between.
///
/// [`generation`]: SuggestionCache::generation
#[derive(Debug, Default)]
pub struct SuggestionCache {
    inner: RwLock<Suggestions>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).generation
    }

    pub fn tags(&self) -> Option<Vec<String>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).tags.clone()
    }

    /// Store `tags` if no clear happened since `generation`; true if stored
    pub fn set_tags(&self, generation: u64, tags: Vec<String>) -> bool {
        self.store(generation, |s| s.tags = Some(tags))
    }

    pub fn projects(&self) -> Option<Vec<String>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).projects.clone()
    }

    pub fn set_projects(&self, generation: u64, projects: Vec<String>) -> bool {
        self.store(generation, |s| s.projects = Some(projects))
    }

    pub fn task_tags(&self, uuid: &str) -> Option<Vec<String>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.task_tags.get(uuid).cloned()
    }

    pub fn set_task_tags(&self, generation: u64, uuid: &str, tags: Vec<String>) -> bool {
        self.store(generation, |s| {
            s.task_tags.insert(uuid.to_string(), tags);
        })
    }

    fn store(&self, generation: u64, apply: impl FnOnce(&mut Suggestions)) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "SuggestionCache: dropping stale value");
            return false;
        }
        apply(&mut inner);
        true
    }

    pub fn clear(&self) {
        debug!("SuggestionCache::clear: called");
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = Suggestions {
            generation: inner.generation.wrapping_add(1),
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_cache_clear_returns_count() {
        let cache = ColumnCache::new();
        assert!(cache.is_empty());

        cache.insert("next", vec![Column::new("description", "Description")]);
        cache.insert("list", vec![]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("list"), Some(vec![]));
        assert!(cache.get("minimal").is_none());

        assert_eq!(cache.clear(), 2);
        assert!(cache.get("next").is_none());
        assert_eq!(cache.clear(), 0);
    }

    #[test]
    fn test_suggestion_cache_clear() {
        let cache = SuggestionCache::new();
        assert!(cache.tags().is_none());

        let generation = cache.generation();
        assert!(cache.set_tags(generation, vec!["home".to_string()]));
        assert!(cache.set_projects(generation, vec!["garden".to_string()]));
        assert!(cache.set_task_tags(generation, "abc", vec!["work".to_string()]));

        assert_eq!(cache.tags(), Some(vec!["home".to_string()]));
        assert_eq!(cache.projects(), Some(vec!["garden".to_string()]));
        assert_eq!(cache.task_tags("abc"), Some(vec!["work".to_string()]));
        assert!(cache.task_tags("def").is_none());

        cache.clear();
        assert!(cache.tags().is_none());
        assert!(cache.projects().is_none());
        assert!(cache.task_tags("abc").is_none());
    }

    #[test]
    fn test_suggestion_set_after_clear_is_dropped() {
        let cache = SuggestionCache::new();
        let before = cache.generation();
        cache.clear();

        assert!(!cache.set_tags(before, vec!["stale".to_string()]));
        assert!(!cache.set_projects(before, vec!["stale".to_string()]));
        assert!(!cache.set_task_tags(before, "abc", vec!["stale".to_string()]));
        assert!(cache.tags().is_none());
        assert!(cache.projects().is_none());
        assert!(cache.task_tags("abc").is_none());

        assert!(cache.set_tags(cache.generation(), vec!["fresh".to_string()]));
        assert_eq!(cache.tags(), Some(vec!["fresh".to_string()]));
    }
}
