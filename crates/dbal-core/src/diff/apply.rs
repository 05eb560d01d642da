//! Applying a change-set to an in-memory descriptor.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::{DatabaseDescriptor, TableDescriptor};

use super::changeset::{ChangeSet, SchemaChanges, TableChange, TableDelta};

/// Mutates `database` the way a live writer would mutate a server:
/// deletions first, then updates, then insertions.
///
/// # Errors
///
/// Returns [`Error::InvalidDescriptor`] if a partial change targets a table
/// the descriptor does not have.
pub fn apply_change_set(database: &mut DatabaseDescriptor, changes: &ChangeSet) -> Result<()> {
    remove(database, &changes.delete);
    merge(database, &changes.update)?;
    merge(database, &changes.insert)?;
    Ok(())
}

fn remove_keys<V, W>(map: &mut IndexMap<String, V>, keys: &IndexMap<String, W>) {
    for key in keys.keys() {
        map.shift_remove(key);
    }
}

fn remove(database: &mut DatabaseDescriptor, branch: &SchemaChanges) {
    for (name, change) in &branch.tables {
        match change {
            TableChange::Whole(_) => {
                database.tables.shift_remove(name);
            }
            TableChange::Partial(delta) => {
                if let Some(table) = database.tables.get_mut(name) {
                    remove_keys(&mut table.triggers, &delta.triggers);
                    remove_keys(&mut table.constraints, &delta.constraints);
                    remove_keys(&mut table.indexes, &delta.indexes);
                    remove_keys(&mut table.columns, &delta.columns);
                }
            }
        }
    }
    remove_keys(&mut database.procedures, &branch.procedures);
    remove_keys(&mut database.events, &branch.events);
    remove_keys(&mut database.views, &branch.views);
    remove_keys(&mut database.data, &branch.data);
}

fn overlay<V: Clone>(map: &mut IndexMap<String, V>, entries: &IndexMap<String, V>) {
    for (key, value) in entries {
        map.insert(key.clone(), value.clone());
    }
}

fn merge_delta(table: &mut TableDescriptor, delta: &TableDelta) {
    if let Some(meta) = &delta.meta {
        table.meta = meta.clone();
    }
    overlay(&mut table.columns, &delta.columns);
    overlay(&mut table.indexes, &delta.indexes);
    overlay(&mut table.constraints, &delta.constraints);
    overlay(&mut table.triggers, &delta.triggers);
}

fn merge(database: &mut DatabaseDescriptor, branch: &SchemaChanges) -> Result<()> {
    if let Some(meta) = &branch.meta {
        database.meta = meta.clone();
    }
    for (name, change) in &branch.tables {
        match change {
            TableChange::Whole(table) => {
                database.tables.insert(name.clone(), table.clone());
            }
            TableChange::Partial(delta) => {
                let table =
                    database
                        .tables
                        .get_mut(name)
                        .ok_or_else(|| Error::InvalidDescriptor {
                            name: name.clone(),
                            message: String::from("change targets a table that does not exist"),
                        })?;
                merge_delta(table, delta);
            }
        }
    }
    overlay(&mut database.procedures, &branch.procedures);
    overlay(&mut database.events, &branch.events);
    overlay(&mut database.views, &branch.views);
    overlay(&mut database.data, &branch.data);
    Ok(())
}
