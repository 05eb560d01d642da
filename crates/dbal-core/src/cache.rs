//! Explicit table metadata cache.
//!
//! Owned by whoever needs it (a reader, a row mapper) and passed in; there
//! is no process-wide instance.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::schema::TableDescriptor;

/// Table descriptors keyed by `(database, table)`, expiring after a TTL.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    ttl: Duration,
    entries: HashMap<(String, String), (Instant, TableDescriptor)>,
}

impl MetadataCache {
    /// Creates a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a fresh entry.
    #[must_use]
    pub fn get(&self, database: &str, table: &str) -> Option<&TableDescriptor> {
        self.entries
            .get(&(database.to_string(), table.to_string()))
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, descriptor)| descriptor)
    }

    /// Stores (or refreshes) an entry.
    pub fn insert(&mut self, database: &str, descriptor: TableDescriptor) {
        self.entries.insert(
            (database.to_string(), descriptor.name.clone()),
            (Instant::now(), descriptor),
        );
    }

    /// Returns the cached entry, or loads and stores it.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; nothing is cached in that case.
    pub fn get_or_load<E>(
        &mut self,
        database: &str,
        table: &str,
        load: impl FnOnce() -> Result<TableDescriptor, E>,
    ) -> Result<TableDescriptor, E> {
        if let Some(hit) = self.get(database, table) {
            trace!(database, table, "Metadata cache hit");
            return Ok(hit.clone());
        }
        let descriptor = load()?;
        self.entries.insert(
            (database.to_string(), table.to_string()),
            (Instant::now(), descriptor.clone()),
        );
        Ok(descriptor)
    }

    /// Drops one entry.
    pub fn invalidate(&mut self, database: &str, table: &str) {
        self.entries
            .remove(&(database.to_string(), table.to_string()));
    }

    /// Drops every entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_once_until_invalidated() {
        let mut cache = MetadataCache::new(Duration::from_secs(60));
        let mut loads = 0;
        for _ in 0..3 {
            let table = cache
                .get_or_load("app", "users", || {
                    loads += 1;
                    Ok::<_, ()>(TableDescriptor::new("users"))
                })
                .unwrap();
            assert_eq!(table.name, "users");
        }
        assert_eq!(loads, 1);

        cache.invalidate("app", "users");
        assert!(cache.get("app", "users").is_none());
        cache
            .get_or_load("app", "users", || {
                loads += 1;
                Ok::<_, ()>(TableDescriptor::new("users"))
            })
            .unwrap();
        assert_eq!(loads, 2);
    }

    #[test]
    fn entries_expire() {
        let mut cache = MetadataCache::new(Duration::ZERO);
        cache.insert("app", TableDescriptor::new("users"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("app", "users").is_none());
    }

    #[test]
    fn keys_include_the_database() {
        let mut cache = MetadataCache::new(Duration::from_secs(60));
        cache.insert("a", TableDescriptor::new("t"));
        assert!(cache.get("a", "t").is_some());
        assert!(cache.get("b", "t").is_none());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache = MetadataCache::new(Duration::from_secs(60));
        let err = cache
            .get_or_load("app", "users", || Err::<TableDescriptor, _>("boom"))
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.is_empty());
    }
}
