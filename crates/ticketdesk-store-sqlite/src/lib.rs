//! SQLite-backed storage for ticketdesk.

mod error;
mod tags;
mod tickets;

pub use error::StoreError;

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use tracing::info;

const SCHEMA: &str = r"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tickets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  description TEXT,
  is_completed INTEGER NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tickets_updated_at ON tickets(updated_at DESC, id DESC);

CREATE TABLE IF NOT EXISTS tags (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE COLLATE NOCASE,
  color TEXT,
  created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ticket_tags (
  ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
  tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
  created_at INTEGER NOT NULL,
  PRIMARY KEY (ticket_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_ticket_tags_tag ON ticket_tags(tag_id);
";

/// Ticket and tag storage in a single SQLite database.
///
/// Timestamps are stored as microseconds since the Unix epoch. Every write
/// draws its timestamp from a per-store clock that never repeats a value, so
/// "most recently updated" is a strict order even for writes landing in the
/// same microsecond.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    conn: Connection,
    last_micros: i64,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and install the schema.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created or SQLite
    /// fails to open the file or apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened ticket database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite fails to apply the schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        let last_micros: i64 = conn.query_row(
            "SELECT MAX(
               COALESCE((SELECT MAX(updated_at) FROM tickets), 0),
               COALESCE((SELECT MAX(created_at) FROM tags), 0)
             )",
            [],
            |row| row.get(0),
        )?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner { conn, last_micros })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Next write timestamp, strictly greater than every earlier one.
    fn next_timestamp(&mut self) -> Result<i64, StoreError> {
        let now = now_micros()?;
        self.last_micros = now.max(self.last_micros.saturating_add(1));
        Ok(self.last_micros)
    }
}

fn now_micros() -> Result<i64, StoreError> {
    let micros = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000;
    i64::try_from(micros).map_err(|_| StoreError::ClockOutOfRange)
}

fn from_micros(micros: i64) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000)
        .map_err(|_| StoreError::Timestamp(micros))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn timestamps_are_strictly_increasing() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        let mut inner = store.lock();
        let first = inner.next_timestamp()?;
        let second = inner.next_timestamp()?;
        assert!(second > first);
        Ok(())
    }

    #[test]
    fn micros_convert_back_to_utc() -> Result<()> {
        let ts = from_micros(1_700_000_000_123_456)?;
        assert_eq!(ts.unix_timestamp(), 1_700_000_000);
        assert_eq!(ts.microsecond(), 123_456);
        Ok(())
    }

    #[test]
    fn open_creates_parent_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("tickets.db");
        SqliteStore::open(&path)?;
        assert!(path.exists());
        Ok(())
    }
}
