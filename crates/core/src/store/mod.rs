pub mod schema;

use std::path::Path;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OpenFlags, Row, ToSql};

use crate::domain::*;
use crate::error::{Error, Result};

/// Append-only SQLite table of processed files.
pub struct MetadataStore {
    conn: Connection,
}

impl MetadataStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing store read-only. The schema is left untouched, so
    /// reporting never modifies the database.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::StoreNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert one record and commit it immediately. Returns the new id.
    pub fn append(&self, record: &NewRecord) -> Result<i64> {
        insert(&self.conn, record)
    }

    /// Insert `record`, run `finalize`, and commit only if `finalize` succeeds.
    /// On failure the insert is rolled back and the error is returned.
    pub fn append_then<T, F>(&mut self, record: &NewRecord, finalize: F) -> Result<(i64, T)>
    where
        F: FnOnce() -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let id = insert(&tx, record)?;
        let value = finalize()?;
        tx.commit()?;
        Ok((id, value))
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM img_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Row counts grouped by status, ordered by status text.
    pub fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT validation_status, COUNT(*) FROM img_data
             GROUP BY validation_status
             ORDER BY validation_status",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok(StatusCount {
                    status: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    pub fn summary(&self) -> Result<StoreSummary> {
        Ok(StoreSummary {
            total: self.count()?,
            by_status: self.count_by_status()?,
        })
    }

    /// All records in insertion order, optionally restricted to one status.
    pub fn list_records(&self, status: Option<ValidationStatus>) -> Result<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, width, height, size_kb, format,
                    validation_status, notes, processed_timestamp
             FROM img_data
             WHERE ?1 IS NULL OR validation_status = ?1
             ORDER BY id",
        )?;
        let records = stmt
            .query_map(params![status], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn get_record(&self, id: i64) -> Result<Option<ImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, width, height, size_kb, format,
                    validation_status, notes, processed_timestamp
             FROM img_data WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_record)?;
        let record = rows.next().transpose()?;
        Ok(record)
    }
}

fn insert(conn: &Connection, record: &NewRecord) -> Result<i64> {
    let meta = record.metadata.as_ref();
    conn.execute(
        "INSERT INTO img_data
            (filename, width, height, size_kb, format, validation_status, notes, processed_timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.filename,
            meta.map(|m| m.width),
            meta.map(|m| m.height),
            meta.map(|m| m.size_kb),
            meta.map(|m| m.format.as_str()),
            record.status,
            record.notes,
            record.processed_timestamp,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        width: row.get(2)?,
        height: row.get(3)?,
        size_kb: row.get(4)?,
        format: row.get(5)?,
        status: row.get(6)?,
        notes: row.get(7)?,
        processed_timestamp: row.get(8)?,
    })
}

impl ToSql for ValidationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ValidationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}
