//! Snapshot file codec.
//!
//! A snapshot is gzip-compressed JSON of a versioned envelope around a
//! [`DatabaseDescriptor`]. Mappings keep their insertion order.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use dbal_core::schema::DatabaseDescriptor;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SyncError};

/// Envelope version written by this crate.
pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format: u32,
    created_at: DateTime<Utc>,
    database: DatabaseDescriptor,
}

fn invalid(path: &Path, message: impl Into<String>) -> SyncError {
    SyncError::Snapshot {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Reads a snapshot; `None` if the file does not exist.
pub fn read_snapshot(path: &Path) -> Result<Option<DatabaseDescriptor>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut json = Vec::new();
    GzDecoder::new(BufReader::new(file))
        .read_to_end(&mut json)
        .map_err(|e| invalid(path, format!("not a gzip stream: {e}")))?;
    let envelope: Envelope =
        serde_json::from_slice(&json).map_err(|e| invalid(path, e.to_string()))?;
    if envelope.format != SNAPSHOT_FORMAT {
        return Err(invalid(
            path,
            format!("unsupported format version {}", envelope.format),
        ));
    }
    debug!(
        path = %path.display(),
        created_at = %envelope.created_at,
        tables = envelope.database.tables.len(),
        "Read snapshot"
    );
    Ok(Some(envelope.database))
}

/// Writes a snapshot, replacing the file only once the new one is complete.
pub fn write_snapshot(path: &Path, database: &DatabaseDescriptor) -> Result<()> {
    let envelope = Envelope {
        format: SNAPSHOT_FORMAT,
        created_at: Utc::now(),
        database: database.clone(),
    };
    let partial = path.with_extension("partial");
    {
        let file = File::create(&partial)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, &envelope)?;
        encoder.finish()?.flush()?;
    }
    fs::rename(&partial, path)?;
    debug!(path = %path.display(), tables = database.tables.len(), "Wrote snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbal_core::schema::{CanonicalType, ColumnDescriptor, TableDescriptor};

    #[test]
    fn round_trip_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.snapshot");
        let table = TableDescriptor::new("t")
            .column(ColumnDescriptor::new("z", "int", CanonicalType::Int))
            .column(ColumnDescriptor::new("a", "int", CanonicalType::Int));
        let db = DatabaseDescriptor::new("mysql").table(table);

        write_snapshot(&path, &db).unwrap();
        let back = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(back, db);
        let order: Vec<&String> = back.tables["t"].columns.keys().collect();
        assert_eq!(order, ["z", "a"]);
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_snapshot(&dir.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.snapshot");
        fs::write(&path, b"plain text").unwrap();
        assert!(matches!(read_snapshot(&path), Err(SyncError::Snapshot { .. })));
    }

    #[test]
    fn future_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.snapshot");
        let json = serde_json::json!({
            "format": 99,
            "created_at": "2024-01-01T00:00:00Z",
            "database": DatabaseDescriptor::new("mysql"),
        });
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.to_string().as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();
        let err = read_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported format version 99"));
    }
}
