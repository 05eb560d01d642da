//! Canonical metadata model.
//!
//! Plain descriptors for columns, tables and whole databases. Every dialect
//! normalizes its catalog output into these types, and the diff engine and
//! snapshot files work exclusively on them. Mappings are [`IndexMap`]s so
//! declaration order survives a round trip.
//!
//! [`IndexMap`]: indexmap::IndexMap

mod column;
mod database;
mod table;

pub use column::{CanonicalType, ColumnDescriptor, DefaultValue};
pub use database::{DatabaseDescriptor, DatabaseMeta};
pub use table::{
    ConstraintDescriptor, ForeignKeyAction, IndexDescriptor, IndexKind, PRIMARY_INDEX,
    TableDescriptor, TableMeta,
};
