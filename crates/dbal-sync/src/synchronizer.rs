//! Orchestrates one synchronization run.

use dbal_core::schema::DatabaseDescriptor;
use dbal_core::{ChangeSet, compare};
use tracing::info;

use crate::error::{Result, SyncError};
use crate::reader::StructureReader;
use crate::writer::{StructureStore, StructureWriter, WriteReport};

/// Moves a target's structure toward a source's.
///
/// The synchronizer only sees the reader and store capabilities; whether
/// either side is live or a snapshot is decided when the endpoints are
/// opened.
#[derive(Default)]
pub struct Synchronizer {
    source: Option<Box<dyn StructureReader>>,
    target: Option<Box<dyn StructureStore>>,
}

impl Synchronizer {
    /// Creates a synchronizer with no endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the side whose structure is authoritative.
    #[must_use]
    pub fn source(mut self, source: impl StructureReader + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets the side that receives the changes.
    #[must_use]
    pub fn target(mut self, target: impl StructureStore + 'static) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    /// Reads the source structure.
    pub fn read_source(&mut self) -> Result<DatabaseDescriptor> {
        self.source
            .as_mut()
            .ok_or_else(|| SyncError::Config("no source endpoint configured".into()))?
            .read()
    }

    /// Reads the target structure.
    pub fn read_target(&mut self) -> Result<DatabaseDescriptor> {
        self.target_mut()?.read()
    }

    fn target_mut(&mut self) -> Result<&mut Box<dyn StructureStore>> {
        self.target
            .as_mut()
            .ok_or_else(|| SyncError::Config("no target endpoint configured".into()))
    }

    /// Reads both sides and computes the change-set turning the target into
    /// the source. With `merge`, nothing is ever deleted.
    pub fn compare(&mut self, merge: bool) -> Result<ChangeSet> {
        let source = self.read_source()?;
        let target = self.read_target()?;
        let changes = compare(&source, &target, merge)?;
        info!(merge, summary = %changes.summary(), "Compared structures");
        Ok(changes)
    }

    /// Compares and applies the change-set to the target.
    pub fn sync(&mut self, merge: bool) -> Result<WriteReport> {
        let changes = self.compare(merge)?;
        if changes.is_empty() {
            info!("Target already matches source");
        }
        self.target_mut()?.write(&changes)
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("source", &self.source.is_some())
            .field("target", &self.target.is_some())
            .finish()
    }
}
