use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Stored timestamp out of range: {0}")]
    BadTimestamp(i64),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// One cached upstream response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Fresh means strictly younger than the TTL
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.is_fresh_at(Utc::now(), ttl)
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Key-value store for upstream payloads
///
/// Freshness is the caller's call: `get` hands back whatever is stored,
/// however old. Nothing in here ever deletes an entry.
pub trait ResponseStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Upsert `payload` under `key`, stamped with the current time
    fn put(&self, key: &str, payload: &serde_json::Value) -> Result<()>;
}

/// Response cache on top of SQLite
///
/// One row per key, overwritten in place on every re-fetch. The connection
/// sits behind a mutex so the manager can be shared across tasks; every
/// operation is a single statement, which keeps upserts atomic per key.
pub struct CacheManager {
    conn: Mutex<Connection>,
}

impl CacheManager {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    /// Throwaway cache, mostly for tests and one-shot CLI runs
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Upsert with an explicit fetch time
    pub fn put_at(
        &self,
        key: &str,
        payload: &serde_json::Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;

        conn.execute(
            "INSERT INTO responses (key, payload, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                fetched_at = excluded.fetched_at",
            params![key, body, fetched_at.timestamp_millis()],
        )?;

        // keys are full request URLs and may carry API keys
        debug!("Cached response ({} bytes)", body.len());
        Ok(())
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ResponseStore for CacheManager {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row: Option<(String, i64)> = {
            let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
            conn.query_row(
                "SELECT payload, fetched_at FROM responses WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
        };

        let Some((body, millis)) = row else {
            return Ok(None);
        };

        let fetched_at =
            DateTime::<Utc>::from_timestamp_millis(millis).ok_or(CacheError::BadTimestamp(millis))?;

        Ok(Some(CacheEntry {
            key: key.to_string(),
            payload: serde_json::from_str(&body)?,
            fetched_at,
        }))
    }

    fn put(&self, key: &str, payload: &serde_json::Value) -> Result<()> {
        self.put_at(key, payload, Utc::now())
    }
}
