//! Persistence sinks for completed queries: a SQLite history table and an
//! append-only CSV audit file.
//!
//! Both sinks open their backing file per call and release it on every
//! exit path, so no handle outlives an operation and the files stay
//! readable between calls. The sinks are independent on purpose: one
//! failing must never block the other.

use chrono::{DateTime, Utc};
use cq_core::{QueryRecord, RecordSink, SinkError};
use rusqlite::{params, Connection};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::debug;

/// SQLite-backed query history. The schema is ensured on every open, so
/// first use against a fresh path creates the table.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(&self.path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS consultas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fecha TIMESTAMP,
                producto TEXT,
                resultado TEXT
            )",
            [],
        )?;
        Ok(conn)
    }

    /// Most recent queries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<QueryRecord>, SinkError> {
        let conn = self.open().map_err(storage_error)?;
        let mut stmt = conn
            .prepare(
                "SELECT fecha, producto, resultado FROM consultas
                 ORDER BY id DESC LIMIT ?1",
            )
            .map_err(storage_error)?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(storage_error)?;

        let mut records = Vec::new();
        for row in rows {
            let (fecha, producto, resultado) = row.map_err(storage_error)?;
            let queried_at = DateTime::parse_from_rfc3339(&fecha)
                .map_err(|err| SinkError::Storage(format!("bad timestamp {fecha:?}: {err}")))?
                .with_timezone(&Utc);
            records.push(QueryRecord {
                queried_at,
                product: producto,
                result: resultado,
            });
        }
        Ok(records)
    }
}

impl RecordSink for RecordStore {
    fn name(&self) -> &'static str {
        "record store"
    }

    fn record(&self, record: &QueryRecord) -> Result<(), SinkError> {
        let conn = self.open().map_err(storage_error)?;
        conn.execute(
            "INSERT INTO consultas (fecha, producto, resultado) VALUES (?1, ?2, ?3)",
            params![
                record.queried_at.to_rfc3339(),
                record.product,
                record.result
            ],
        )
        .map_err(storage_error)?;
        debug!("inserted query for {:?}", record.product);
        Ok(())
    }
}

fn storage_error(err: rusqlite::Error) -> SinkError {
    SinkError::Storage(err.to_string())
}

/// Append-only CSV audit trail: one row per record, columns
/// (timestamp, product, result), no header, default delimiters.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSink for AuditLog {
    fn name(&self) -> &'static str {
        "audit log"
    }

    fn record(&self, record: &QueryRecord) -> Result<(), SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| SinkError::Io(err.to_string()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record([
                record.queried_at.to_rfc3339().as_str(),
                record.product.as_str(),
                record.result.as_str(),
            ])
            .map_err(|err| SinkError::Io(err.to_string()))?;
        writer
            .flush()
            .map_err(|err| SinkError::Io(err.to_string()))?;
        debug!("appended query for {:?}", record.product);
        Ok(())
    }
}
