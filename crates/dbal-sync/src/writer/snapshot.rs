use std::path::PathBuf;

use dbal_core::{ChangeSet, apply_change_set};
use tracing::info;

use super::{StructureWriter, WriteReport};
use crate::error::Result;
use crate::snapshot::{read_snapshot, write_snapshot};

/// Applies change-sets to a snapshot file.
///
/// The stored descriptor is patched in place of its replayed DDL, so a
/// snapshot target always ends up equal to the source it was synced from.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    dry_run: bool,
}

impl SnapshotWriter {
    /// Creates a writer for the snapshot at `path`; the file is created on
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dry_run: false,
        }
    }

    /// Enables dry-run mode (the file is left untouched).
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

impl StructureWriter for SnapshotWriter {
    fn write(&mut self, changes: &ChangeSet) -> Result<WriteReport> {
        let mut database = read_snapshot(&self.path)?.unwrap_or_default();
        apply_change_set(&mut database, changes)?;
        if self.dry_run {
            info!(path = %self.path.display(), "Dry run, snapshot left untouched");
        } else {
            write_snapshot(&self.path, &database)?;
            info!(
                path = %self.path.display(),
                tables = database.tables.len(),
                "Snapshot updated"
            );
        }
        Ok(WriteReport::Snapshot(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbal_core::compare;
    use dbal_core::schema::{CanonicalType, ColumnDescriptor, DatabaseDescriptor, TableDescriptor};

    fn source() -> DatabaseDescriptor {
        DatabaseDescriptor::new("mysql").table(
            TableDescriptor::new("users")
                .column(ColumnDescriptor::new("id", "int(11)", CanonicalType::Int)),
        )
    }

    #[test]
    fn first_write_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.snapshot");
        let changes = compare(&source(), &DatabaseDescriptor::default(), false).unwrap();

        let report = SnapshotWriter::new(&path).write(&changes).unwrap();
        assert_eq!(report, WriteReport::Snapshot(path.clone()));
        assert_eq!(read_snapshot(&path).unwrap().unwrap(), source());
    }

    #[test]
    fn dry_run_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.snapshot");
        let changes = compare(&source(), &DatabaseDescriptor::default(), false).unwrap();

        SnapshotWriter::new(&path).dry_run(true).write(&changes).unwrap();
        assert!(!path.exists());
    }
}
