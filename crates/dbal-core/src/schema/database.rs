//! Whole-database descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::connection::Row;

use super::table::TableDescriptor;

/// Database-level options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseMeta {
    /// Engine name the structure was read from, e.g. `mysql`.
    pub driver: String,
    /// Default character set.
    pub charset: Option<String>,
    /// Default collation.
    pub collation: Option<String>,
}

/// Canonical description of a whole database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    /// Database-level options.
    pub meta: DatabaseMeta,
    /// Tables keyed by name.
    pub tables: IndexMap<String, TableDescriptor>,
    /// Stored procedure definitions keyed by name.
    pub procedures: IndexMap<String, String>,
    /// Scheduled event definitions keyed by name.
    pub events: IndexMap<String, String>,
    /// View definitions keyed by name.
    pub views: IndexMap<String, String>,
    /// Captured rows of reference ("information") tables.
    #[serde(default)]
    pub data: IndexMap<String, Vec<Row>>,
}

impl DatabaseDescriptor {
    /// Creates an empty descriptor for the given engine.
    #[must_use]
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            meta: DatabaseMeta {
                driver: driver.into(),
                ..DatabaseMeta::default()
            },
            ..Self::default()
        }
    }

    /// Returns `true` if the descriptor holds no structure and no data.
    ///
    /// Meta is not considered: an empty database still has a driver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.procedures.is_empty()
            && self.events.is_empty()
            && self.views.is_empty()
            && self.data.is_empty()
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: TableDescriptor) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Drops captured data for tables the predicate rejects.
    pub fn retain_data(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.data.retain(|table, _| keep(table));
    }
}
