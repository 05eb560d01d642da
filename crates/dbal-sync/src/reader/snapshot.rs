use std::path::PathBuf;

use dbal_core::schema::DatabaseDescriptor;
use regex::Regex;
use tracing::{info, warn};

use super::StructureReader;
use crate::error::Result;
use crate::snapshot::read_snapshot;

/// Reads structure from a snapshot file.
///
/// A missing file reads as an empty database, so a first sync into a fresh
/// snapshot inserts everything.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    path: PathBuf,
    information_tables: Option<Regex>,
}

impl SnapshotReader {
    /// Creates a reader for the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            information_tables: None,
        }
    }

    /// Keeps only captured rows of tables matching `pattern`; without a
    /// pattern no rows are kept.
    #[must_use]
    pub fn information_tables(mut self, pattern: Option<Regex>) -> Self {
        self.information_tables = pattern;
        self
    }
}

impl StructureReader for SnapshotReader {
    fn read(&mut self) -> Result<DatabaseDescriptor> {
        let Some(mut database) = read_snapshot(&self.path)? else {
            info!(path = %self.path.display(), "Snapshot not found, starting empty");
            return Ok(DatabaseDescriptor::default());
        };

        let before = database.data.len();
        match &self.information_tables {
            Some(pattern) => database.retain_data(|table| pattern.is_match(table)),
            None => database.data.clear(),
        }
        let dropped = before - database.data.len();
        if dropped > 0 {
            warn!(
                path = %self.path.display(),
                tables = dropped,
                "Ignoring captured rows of tables outside the information pattern"
            );
        }

        info!(
            path = %self.path.display(),
            tables = database.tables.len(),
            "Read snapshot structure"
        );
        Ok(database)
    }
}
