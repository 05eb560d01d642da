//! Schema synchronization between live databases and snapshot files.
//!
//! `dbal-sync` reads a database structure from one side, compares it with
//! another and moves the second toward the first:
//!
//! - **Readers** produce a canonical [`DatabaseDescriptor`](dbal_core::schema::DatabaseDescriptor)
//!   from a live connection or a snapshot file
//! - **Writers** apply a [`ChangeSet`](dbal_core::ChangeSet) as ordered SQL
//!   or by patching the snapshot
//! - The **Synchronizer** wires one reader and one store together
//!
//! Which kind of endpoint a side is gets decided once, by
//! [`Endpoint::from_config`](endpoint::Endpoint::from_config).
//!
//! # Example
//!
//! ```rust,ignore
//! use dbal_sync::prelude::*;
//!
//! let options = SyncOptions::default();
//! let source = Endpoint::from_config(&EndpointConfig::url("mysql://root@dev/app"))?;
//! let target = Endpoint::from_config(&EndpointConfig::snapshot("app.snapshot"))?;
//!
//! let report = Synchronizer::new()
//!     .source(source.open(&options)?)
//!     .target(target.open(&options)?)
//!     .sync(false)?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Show what differs
//! dbal-sync --source-url mysql://root@dev/app --target-url mysql://root@prod/app diff
//!
//! # Print the SQL a sync would run
//! dbal-sync --source-url mysql://root@dev/app --target-url mysql://root@prod/app plan
//!
//! # Capture the source into a snapshot file
//! dbal-sync --source-url mysql://root@dev/app snapshot --out app.snapshot
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod mysql;
pub mod reader;
pub mod snapshot;
pub mod synchronizer;
pub mod writer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{EndpointConfig, SyncOptions};
    pub use crate::endpoint::{Endpoint, LiveStore, SnapshotStore};
    pub use crate::error::{Result, SyncError};
    pub use crate::mysql::MySqlClient;
    pub use crate::reader::{LiveDatabaseReader, SnapshotReader, StructureReader};
    pub use crate::snapshot::{read_snapshot, write_snapshot};
    pub use crate::synchronizer::Synchronizer;
    pub use crate::writer::{
        LiveDatabaseWriter, Planner, SnapshotWriter, StructureStore, StructureWriter, WriteReport,
    };
}
