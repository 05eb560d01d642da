//! Opening configured endpoints as readable, writable stores.

use std::path::PathBuf;
use std::sync::Arc;

use dbal_core::dialect::{Dialect, DialectRegistry};
use dbal_core::schema::DatabaseDescriptor;
use dbal_core::{ChangeSet, Connection, Error};
use regex::Regex;
use tracing::info;

use crate::config::{EndpointConfig, SyncOptions};
use crate::error::{Result, SyncError};
use crate::mysql::MySqlClient;
use crate::reader::{LiveDatabaseReader, SnapshotReader, StructureReader};
use crate::writer::{
    LiveDatabaseWriter, SnapshotWriter, StructureStore, StructureWriter, WriteReport,
};

/// A live database endpoint.
#[derive(Debug)]
pub struct LiveStore<C: Connection> {
    conn: C,
    dialect: Arc<dyn Dialect>,
    schema: Option<String>,
    information_tables: Option<Regex>,
    dry_run: bool,
}

impl<C: Connection> LiveStore<C> {
    /// Wraps `conn`, resolving its dialect from the driver and server
    /// version.
    pub fn connect(
        mut conn: C,
        registry: &DialectRegistry,
        options: &SyncOptions,
    ) -> Result<Self> {
        let version = conn.server_version().map_err(|source| Error::Query {
            statement: String::from("server version"),
            source,
        })?;
        let dialect = registry.resolve(conn.driver(), &version)?;
        info!(driver = dialect.name(), version = %version, "Resolved dialect");
        Self::new(conn, dialect, options)
    }

    /// Wraps `conn` with an explicit dialect.
    pub fn new(conn: C, dialect: Arc<dyn Dialect>, options: &SyncOptions) -> Result<Self> {
        Ok(Self {
            conn,
            dialect,
            schema: options.schema.clone(),
            information_tables: options.information_pattern()?,
            dry_run: options.dry_run,
        })
    }
}

impl<C: Connection> StructureReader for LiveStore<C> {
    fn read(&mut self) -> Result<DatabaseDescriptor> {
        LiveDatabaseReader::new(&mut self.conn, Arc::clone(&self.dialect))
            .schema(self.schema.clone())
            .information_tables(self.information_tables.clone())
            .read()
    }
}

impl<C: Connection> StructureWriter for LiveStore<C> {
    fn write(&mut self, changes: &ChangeSet) -> Result<WriteReport> {
        LiveDatabaseWriter::new(&mut self.conn, Arc::clone(&self.dialect))
            .dry_run(self.dry_run)
            .write(changes)
    }
}

/// A snapshot file endpoint.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    reader: SnapshotReader,
    writer: SnapshotWriter,
    path: PathBuf,
}

impl SnapshotStore {
    /// Opens the snapshot at `path`; it need not exist yet.
    pub fn new(path: impl Into<PathBuf>, options: &SyncOptions) -> Result<Self> {
        let path = path.into();
        Ok(Self {
            reader: SnapshotReader::new(&path).information_tables(options.information_pattern()?),
            writer: SnapshotWriter::new(&path).dry_run(options.dry_run),
            path,
        })
    }

    /// The snapshot file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StructureReader for SnapshotStore {
    fn read(&mut self) -> Result<DatabaseDescriptor> {
        self.reader.read()
    }
}

impl StructureWriter for SnapshotStore {
    fn write(&mut self, changes: &ChangeSet) -> Result<WriteReport> {
        self.writer.write(changes)
    }
}

/// One side of a synchronization, resolved from its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A live database reached through a connection URL.
    Live(String),
    /// A snapshot file.
    Snapshot(PathBuf),
}

impl Endpoint {
    /// Decides between a live database and a snapshot: a URL wins over a
    /// snapshot path.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        if let Some(url) = &config.url {
            return Ok(Self::Live(url.clone()));
        }
        if let Some(path) = &config.snapshot {
            return Ok(Self::Snapshot(path.clone()));
        }
        Err(SyncError::Config(
            "endpoint needs a connection URL or a snapshot path".into(),
        ))
    }

    /// Opens the store.
    ///
    /// `mysql://` and `mariadb://` URLs are served by [`MySqlClient`]; other
    /// engines need a caller-supplied [`Connection`] wrapped in a
    /// [`LiveStore`].
    pub fn open(&self, options: &SyncOptions) -> Result<Box<dyn StructureStore>> {
        match self {
            Self::Live(url) => {
                let (scheme, rest) = url
                    .split_once("://")
                    .ok_or_else(|| SyncError::Config(format!("not a connection URL: {url}")))?;
                match scheme.to_ascii_lowercase().as_str() {
                    "mysql" | "mariadb" => {
                        let client = MySqlClient::connect(&format!("mysql://{rest}"))?;
                        let registry = DialectRegistry::with_defaults();
                        Ok(Box::new(LiveStore::connect(client, &registry, options)?))
                    }
                    other => Err(SyncError::UnsupportedEndpoint(other.to_string())),
                }
            }
            Self::Snapshot(path) => Ok(Box::new(SnapshotStore::new(path, options)?)),
        }
    }
}
