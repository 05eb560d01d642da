//! Change-set types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::connection::Row;
use crate::schema::{
    ColumnDescriptor, ConstraintDescriptor, DatabaseMeta, IndexDescriptor, TableDescriptor,
    TableMeta,
};

/// A table entry in a change tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableChange {
    /// The whole table is created or dropped.
    Whole(TableDescriptor),
    /// Entities inside a table present on both sides.
    Partial(TableDelta),
}

impl TableChange {
    /// Number of leaf entities carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Whole(_) => 1,
            Self::Partial(delta) => delta.len(),
        }
    }

    /// Returns `true` for a partial change carrying nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entity-level changes inside one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDelta {
    /// Replacement table options (update tree only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TableMeta>,
    /// Columns keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub columns: IndexMap<String, ColumnDescriptor>,
    /// Indexes keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub indexes: IndexMap<String, IndexDescriptor>,
    /// Foreign keys keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: IndexMap<String, ConstraintDescriptor>,
    /// Trigger definitions keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub triggers: IndexMap<String, String>,
}

impl TableDelta {
    /// Number of entities carried; table options count as one.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.meta.is_some())
            + self.columns.len()
            + self.indexes.len()
            + self.constraints.len()
            + self.triggers.len()
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One branch of a change-set: a sparse copy of a database descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaChanges {
    /// Database options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DatabaseMeta>,
    /// Tables keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tables: IndexMap<String, TableChange>,
    /// Procedure definitions keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub procedures: IndexMap<String, String>,
    /// Event definitions keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub events: IndexMap<String, String>,
    /// View definitions keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub views: IndexMap<String, String>,
    /// Captured reference rows, replaced per table.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, Vec<Row>>,
}

impl SchemaChanges {
    /// Returns `true` if the branch carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.is_none()
            && self.tables.is_empty()
            && self.procedures.is_empty()
            && self.events.is_empty()
            && self.views.is_empty()
            && self.data.is_empty()
    }

    /// Number of entities carried, counting table contents.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.meta.is_some())
            + self.tables.values().map(TableChange::len).sum::<usize>()
            + self.procedures.len()
            + self.events.len()
            + self.views.len()
            + self.data.len()
    }
}

/// The result of comparing two database descriptors.
///
/// `insert` holds what only the source has, `delete` what only the target
/// has, and `update` the source's version of everything present on both
/// sides with a different value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Entities to create.
    pub insert: SchemaChanges,
    /// Entities to redefine.
    pub update: SchemaChanges,
    /// Entities to remove.
    pub delete: SchemaChanges,
}

/// Entity counts per branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    /// Entities inserted.
    pub inserted: usize,
    /// Entities updated.
    pub updated: usize,
    /// Entities deleted.
    pub deleted: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to insert, {} to update, {} to delete",
            self.inserted, self.updated, self.deleted
        )
    }
}

impl ChangeSet {
    /// Returns `true` if the two descriptors were equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Counts the entities in each branch.
    #[must_use]
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            inserted: self.insert.len(),
            updated: self.update.len(),
            deleted: self.delete.len(),
        }
    }
}
