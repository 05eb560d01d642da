//! Structure writers.
//!
//! A writer applies a [`ChangeSet`] to its side: a live database receives
//! DDL and data statements, a snapshot file receives the patched descriptor.

mod live;
mod snapshot;

pub use live::{LiveDatabaseWriter, Planner};
pub use snapshot::SnapshotWriter;

use std::path::PathBuf;

use dbal_core::ChangeSet;

use crate::error::Result;
use crate::reader::StructureReader;

/// What a write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteReport {
    /// SQL statements, in execution order (planned only, on a dry run).
    Statements(Vec<String>),
    /// Snapshot file that was rewritten.
    Snapshot(PathBuf),
}

impl WriteReport {
    /// Statements issued, empty for a snapshot write.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        match self {
            Self::Statements(statements) => statements,
            Self::Snapshot(_) => &[],
        }
    }
}

/// Something a change-set can be applied to.
pub trait StructureWriter {
    /// Applies `changes`.
    fn write(&mut self, changes: &ChangeSet) -> Result<WriteReport>;
}

impl<W: StructureWriter + ?Sized> StructureWriter for Box<W> {
    fn write(&mut self, changes: &ChangeSet) -> Result<WriteReport> {
        (**self).write(changes)
    }
}

/// An endpoint that can be both read and written: a synchronization target.
pub trait StructureStore: StructureReader + StructureWriter {}

impl<T: StructureReader + StructureWriter + ?Sized> StructureStore for T {}
