//! Descriptor comparison.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::{DatabaseDescriptor, TableDescriptor};

use super::changeset::{ChangeSet, SchemaChanges, TableChange, TableDelta};

/// Key-set and value differences between two mappings.
struct MapDiff<V> {
    inserted: IndexMap<String, V>,
    updated: IndexMap<String, V>,
    deleted: IndexMap<String, V>,
}

/// Entries only in `source` are inserted, entries in both with different
/// values are updated to the source's value, and entries only in `target`
/// are deleted unless `merge` is set.
fn diff_map<V: Clone + PartialEq>(
    source: &IndexMap<String, V>,
    target: &IndexMap<String, V>,
    merge: bool,
) -> MapDiff<V> {
    let mut diff = MapDiff {
        inserted: IndexMap::new(),
        updated: IndexMap::new(),
        deleted: IndexMap::new(),
    };
    for (name, value) in source {
        match target.get(name) {
            None => {
                diff.inserted.insert(name.clone(), value.clone());
            }
            Some(existing) if existing != value => {
                diff.updated.insert(name.clone(), value.clone());
            }
            Some(_) => {}
        }
    }
    if !merge {
        for (name, value) in target {
            if !source.contains_key(name) {
                diff.deleted.insert(name.clone(), value.clone());
            }
        }
    }
    diff
}

/// The three per-branch deltas for one table present on both sides.
fn diff_table(
    source: &TableDescriptor,
    target: &TableDescriptor,
    merge: bool,
) -> (TableDelta, TableDelta, TableDelta) {
    let mut insert = TableDelta::default();
    let mut update = TableDelta::default();
    let mut delete = TableDelta::default();

    if source.meta != target.meta {
        update.meta = Some(source.meta.clone());
    }

    let columns = diff_map(&source.columns, &target.columns, merge);
    insert.columns = columns.inserted;
    update.columns = columns.updated;
    delete.columns = columns.deleted;

    let indexes = diff_map(&source.indexes, &target.indexes, merge);
    insert.indexes = indexes.inserted;
    update.indexes = indexes.updated;
    delete.indexes = indexes.deleted;

    let constraints = diff_map(&source.constraints, &target.constraints, merge);
    insert.constraints = constraints.inserted;
    update.constraints = constraints.updated;
    delete.constraints = constraints.deleted;

    let triggers = diff_map(&source.triggers, &target.triggers, merge);
    insert.triggers = triggers.inserted;
    update.triggers = triggers.updated;
    delete.triggers = triggers.deleted;

    (insert, update, delete)
}

fn push_partial(branch: &mut SchemaChanges, table: &str, delta: TableDelta) {
    if !delta.is_empty() {
        branch
            .tables
            .insert(table.to_string(), TableChange::Partial(delta));
    }
}

/// Computes the change-set turning `target` into `source`.
///
/// An empty target receives the whole source as insertions. With `merge`
/// set, nothing present only in the target is ever deleted, at any level.
///
/// # Errors
///
/// Returns [`Error::EngineMismatch`] if both sides hold structure read from
/// different drivers.
pub fn compare(
    source: &DatabaseDescriptor,
    target: &DatabaseDescriptor,
    merge: bool,
) -> Result<ChangeSet> {
    let mut changes = ChangeSet::default();

    if target.is_empty() {
        if source.meta != target.meta {
            changes.insert.meta = Some(source.meta.clone());
        }
        changes.insert.tables = source
            .tables
            .iter()
            .map(|(name, table)| (name.clone(), TableChange::Whole(table.clone())))
            .collect();
        changes.insert.procedures = source.procedures.clone();
        changes.insert.events = source.events.clone();
        changes.insert.views = source.views.clone();
        changes.insert.data = source.data.clone();
        info!(summary = %changes.summary(), "Target is empty, inserting everything");
        return Ok(changes);
    }

    if source.meta.driver != target.meta.driver {
        return Err(Error::EngineMismatch {
            source_driver: source.meta.driver.clone(),
            target_driver: target.meta.driver.clone(),
        });
    }

    if source.meta != target.meta {
        changes.update.meta = Some(source.meta.clone());
    }

    let tables = diff_map(&source.tables, &target.tables, merge);
    for (name, table) in tables.inserted {
        changes.insert.tables.insert(name, TableChange::Whole(table));
    }
    for (name, table) in tables.deleted {
        changes.delete.tables.insert(name, TableChange::Whole(table));
    }
    for name in tables.updated.keys() {
        let (Some(src), Some(dst)) = (source.tables.get(name), target.tables.get(name)) else {
            continue;
        };
        let (insert, update, delete) = diff_table(src, dst, merge);
        debug!(
            table = %name,
            inserted = insert.len(),
            updated = update.len(),
            deleted = delete.len(),
            "Table differs"
        );
        push_partial(&mut changes.insert, name, insert);
        push_partial(&mut changes.update, name, update);
        push_partial(&mut changes.delete, name, delete);
    }

    let procedures = diff_map(&source.procedures, &target.procedures, merge);
    changes.insert.procedures = procedures.inserted;
    changes.update.procedures = procedures.updated;
    changes.delete.procedures = procedures.deleted;

    let events = diff_map(&source.events, &target.events, merge);
    changes.insert.events = events.inserted;
    changes.update.events = events.updated;
    changes.delete.events = events.deleted;

    let views = diff_map(&source.views, &target.views, merge);
    changes.insert.views = views.inserted;
    changes.update.views = views.updated;
    changes.delete.views = views.deleted;

    let data = diff_map(&source.data, &target.data, merge);
    changes.insert.data = data.inserted;
    changes.update.data = data.updated;
    changes.delete.data = data.deleted;

    info!(summary = %changes.summary(), merge, "Compared descriptors");
    Ok(changes)
}
