//! Durable key-value store backed by SQLite. Holds the persistent cache
//! tier and the rate-limit timestamp. Entries never expire; reads and
//! writes degrade to misses and dropped writes on database failure.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::store::KeyValueStore;

/// SQLite-backed store. One table, one row per key.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = Self::init(conn)?;
        info!(path = %db_path.display(), "translation store opened");
        Ok(store)
    }

    /// In-memory database for tests and ephemeral embedders.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                store_key TEXT PRIMARY KEY,
                store_value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock();
        match conn
            .query_row(
                "SELECT store_value FROM kv_store WHERE store_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(value) => {
                if value.is_some() {
                    debug!("durable store hit");
                }
                value
            }
            Err(e) => {
                warn!(error = %e, "store read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let conn = self.conn.lock();
        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO kv_store (store_key, store_value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, now_unix()],
        ) {
            warn!(error = %e, "store write failed");
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "store open failed: {e}"),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl std::error::Error for StoreError {}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
