pub mod content;
pub mod feed;
pub mod graph;
pub mod migrations;
pub mod models;

use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OpenFlags, TransactionBehavior};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

const READER_POOL_SIZE: usize = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite handle with one writer connection and a small pool of read-only
/// connections. Every access goes through a transaction: `write` opens
/// `BEGIN IMMEDIATE` on the writer, `read` opens a deferred transaction so
/// the closure sees one WAL snapshot.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Private in-memory database. Reads share the writer connection.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            writer: Mutex::new(conn),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Run `f` inside an immediate write transaction. Commits when `f`
    /// returns `Ok`, rolls back otherwise.
    pub fn write<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = lock(&self.writer);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside a read transaction on a pooled reader.
    pub fn read<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = if self.readers.is_empty() {
            lock(&self.writer)
        } else {
            let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
            lock(&self.readers[idx])
        };
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

// A panic inside a closure drops its transaction, which rolls back, so the
// connection behind a poisoned lock is still usable.
fn lock(m: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Lock contention that a retry can resolve.
pub fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

/// A UNIQUE or PRIMARY KEY constraint rejected the statement.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn failed_write_rolls_back() {
        let db = Database::open_in_memory().unwrap();

        let res: rusqlite::Result<()> = db.write(|conn| {
            graph::insert_user(conn, "a", "key-a", Utc::now())?;
            Err(rusqlite::Error::QueryReturnedNoRows)
        });
        assert!(res.is_err());

        let count: i64 = db.read(|conn| graph::count_users(conn)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn duplicate_credential_is_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        db.write(|conn| graph::insert_user(conn, "a", "same", Utc::now()))
            .unwrap();

        let err = db
            .write(|conn| graph::insert_user(conn, "b", "same", Utc::now()))
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(!is_transient(&err));
    }

    #[test]
    fn file_database_reads_through_reader_pool() {
        let dir = std::env::temp_dir().join(format!("chirp_db_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pool.db");
        let _ = std::fs::remove_file(&path);

        let db = Database::open(&path).unwrap();
        let id = db
            .write(|conn| graph::insert_user(conn, "pooled", "k", Utc::now()))
            .unwrap();

        for _ in 0..READER_POOL_SIZE + 1 {
            let user = db.read(|conn| graph::get_user(conn, id)).unwrap();
            assert_eq!(user.map(|u| u.name), Some("pooled".to_string()));
        }

        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
