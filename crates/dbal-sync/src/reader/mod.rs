//! Structure readers.
//!
//! A reader produces a fresh [`DatabaseDescriptor`] on every call; nothing
//! is cached between calls unless a [`MetadataCache`](dbal_core::MetadataCache)
//! is handed in explicitly.

mod live;
mod snapshot;

pub use live::LiveDatabaseReader;
pub use snapshot::SnapshotReader;

use dbal_core::schema::DatabaseDescriptor;

use crate::error::Result;

/// Something a database structure can be read from.
pub trait StructureReader {
    /// Reads the complete structure.
    fn read(&mut self) -> Result<DatabaseDescriptor>;
}

impl<R: StructureReader + ?Sized> StructureReader for Box<R> {
    fn read(&mut self) -> Result<DatabaseDescriptor> {
        (**self).read()
    }
}
