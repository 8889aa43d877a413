//! SQLite-based persistence.
//!
//! Provides:
//! - a key-value store holding the session state blob
//! - a log of completed workouts with simple statistics

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, Result, StorageError};
use crate::timer::StateStore;

/// Key under which the session state blob is stored.
pub const STATE_KEY: &str = "training-timer-state";

/// Aggregate workout counters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkoutStats {
    pub total_workouts: u64,
    pub total_work_secs: u64,
    pub today_workouts: u64,
    pub today_work_secs: u64,
}

/// SQLite database for session state and workout history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/repset/repset.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(data_dir()?.join("repset.db"))
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS workouts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                finished_at TEXT NOT NULL,
                timer_count INTEGER NOT NULL,
                work_secs   INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_finished_at ON workouts(finished_at);",
        )?;
        Ok(())
    }

    /// Record a completed workout.
    pub fn record_workout(
        &self,
        finished_at: DateTime<Utc>,
        timer_count: usize,
        work_secs: u64,
    ) -> Result<i64, StorageError> {
        self.conn
            .execute(
                "INSERT INTO workouts (finished_at, timer_count, work_secs)
                 VALUES (?1, ?2, ?3)",
                params![finished_at.to_rfc3339(), timer_count as i64, work_secs],
            )
            .map_err(StorageError::from)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All-time and today's workout counters.
    pub fn stats(&self) -> Result<WorkoutStats, StorageError> {
        let mut stats = WorkoutStats::default();
        let (total, total_secs) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(work_secs), 0) FROM workouts",
                [],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
            )
            .map_err(StorageError::from)?;
        stats.total_workouts = total;
        stats.total_work_secs = total_secs;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_count, today_secs) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(work_secs), 0) FROM workouts
                 WHERE finished_at >= ?1",
                params![format!("{today}T00:00:00+00:00")],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
            )
            .map_err(StorageError::from)?;
        stats.today_workouts = today_count;
        stats.today_work_secs = today_secs;

        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(StorageError::from)?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }
}

impl StateStore for Database {
    fn load(&self) -> Result<Option<String>, CoreError> {
        self.kv_get(STATE_KEY).map_err(CoreError::from)
    }

    fn save(&self, blob: &str) -> Result<(), CoreError> {
        self.kv_set(STATE_KEY, blob).map_err(CoreError::from)
    }
}
