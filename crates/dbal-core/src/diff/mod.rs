//! Structural comparison of database descriptors.
//!
//! [`compare`] produces a three-branch [`ChangeSet`]; [`apply_change_set`]
//! replays one onto an in-memory descriptor. Live application lives with the
//! writers in `dbal-sync`.

mod apply;
mod changeset;
mod compare;

pub use apply::apply_change_set;
pub use changeset::{ChangeSet, ChangeSummary, SchemaChanges, TableChange, TableDelta};
pub use compare::compare;
