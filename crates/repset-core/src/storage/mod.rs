pub mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, WorkoutStats, STATE_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/repset[-dev]/` based on REPSET_ENV.
///
/// Set REPSET_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("REPSET_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("repset-dev")
    } else {
        base_dir.join("repset")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
