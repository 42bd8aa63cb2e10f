mod config;
pub mod documents;
pub mod migrations;
pub mod sqlite;

pub use config::{validate_remote_url, Config, SyncConfig};
pub use documents::{DocumentStore, MemoryDocumentStore};
pub use sqlite::SqliteDocumentStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/boxkeeper[-dev]/` based on BOXKEEPER_ENV.
///
/// Set BOXKEEPER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or_else(|| ConfigError::DataDir("home directory not found".into()))?
        .join(".config");

    let env = std::env::var("BOXKEEPER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("boxkeeper-dev")
    } else {
        base_dir.join("boxkeeper")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
