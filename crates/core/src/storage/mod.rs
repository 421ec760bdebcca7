//! Local key-value storage
//!
//! Session state is kept under a handful of fixed string keys. The SQLite
//! backend persists them across runs; the memory backend is for tests and
//! throwaway sessions.

mod kv;
mod memory;
mod migrations;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::instrument;

use crate::error::{Error, Result};

pub use memory::MemoryStore;

/// Key-value store operations
///
/// Implementations must be shareable across async tasks. Removing a key that
/// does not exist is not an error.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value
    fn remove(&self, key: &str) -> Result<()>;
}

/// Main database handle
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&*self.lock()?)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.lock()
            .ok()
            .and_then(|conn| migrations::user_version(&conn).ok())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::LockPoisoned("database connection"))
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        kv::KvStore::new(&conn).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        kv::KvStore::new(&conn).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        kv::KvStore::new(&conn).remove(key)
    }
}
