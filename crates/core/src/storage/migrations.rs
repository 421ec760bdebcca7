//! Schema setup
//!
//! The schema version is kept in SQLite's `user_version` pragma.

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Version written once the schema below is in place
pub const SCHEMA_VERSION: u32 = 1;

const KV_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// Version recorded in the database file, 0 when never initialized
pub fn user_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Bring the schema up to [`SCHEMA_VERSION`]. Newer files are left alone.
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = user_version(conn)?;
    if current >= SCHEMA_VERSION {
        debug!(current, "Schema up to date");
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(KV_TABLE)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    info!(from = current, to = SCHEMA_VERSION, "Session store schema updated");
    Ok(())
}
