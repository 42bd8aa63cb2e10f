//! Core error types for boxkeeper-core.
//!
//! Errors are grouped by concern: document storage, configuration, remote
//! synchronization, command delivery, and user-facing validation
//! ([`Rejection`]). [`CoreError`] wraps all of them for callers that only
//! need a single type.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{BoxId, ItemId};

/// Core error type for boxkeeper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Document store errors
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote synchronization errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Command delivery errors
    #[error("Command channel error: {0}")]
    Channel(#[from] ChannelError),

    /// An action was refused by validation
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open document store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Document store migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Document store is locked")]
    Locked,

    /// A box still owns item documents
    #[error("Box '{id}' still holds {count} item(s)")]
    BoxNotEmpty { id: BoxId, count: usize },

    /// A stored row could not be decoded
    #[error("Corrupt document '{id}': {message}")]
    Corrupt { id: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable home or data directory
    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

/// Remote synchronization errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No remote URL or source configured
    #[error("Remote synchronization is not configured")]
    NotConfigured,

    /// Synchronization is paused by the user
    #[error("Synchronization is paused")]
    Paused,

    /// The remote answered with an error
    #[error("Remote error: {0}")]
    Remote(String),

    /// Local document store failed while applying remote changes
    #[error("Failed to apply remote changes: {0}")]
    Apply(#[from] StoreError),
}

/// Errors returned by a command channel when a command cannot be delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The receiving end has gone away
    #[error("Command channel disconnected")]
    Disconnected,

    /// The receiver refused the command
    #[error("Command refused: {0}")]
    Refused(String),
}

/// Validation failures raised by the action layer.
///
/// A rejected action leaves the state untouched and emits no command. The
/// caller decides how to surface it to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Name is unchanged")]
    UnchangedName,

    #[error("A box named '{0}' already exists")]
    DuplicateBoxName(String),

    #[error("Item '{0}' not found")]
    ItemNotFound(ItemId),

    #[error("Box '{0}' not found")]
    BoxNotFound(BoxId),

    #[error("Box '{id}' still holds {count} item(s)")]
    BoxNotEmpty { id: BoxId, count: usize },

    #[error("The last remaining box cannot be deleted")]
    LastBox,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_converts_into_core_error() {
        let err: CoreError = Rejection::LastBox.into();
        assert!(matches!(err, CoreError::Rejected(Rejection::LastBox)));
        assert_eq!(err.to_string(), "Rejected: The last remaining box cannot be deleted");
    }

    #[test]
    fn sqlite_errors_map_to_query_failed() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::QueryFailed(_)));
    }
}
