//! # Boxkeeper Core Library
//!
//! State synchronization and command replication for the Boxkeeper
//! inventory, where items live in boxes. The UI side keeps an in-memory
//! store; the main process owns the document store and the remote sync.
//!
//! ## Architecture
//!
//! - **State**: normalized items and boxes behind a reducer and a
//!   subscribable [`Store`]
//! - **Actions**: validated, optimistic mutations that emit at most one
//!   [`Command`] for local changes and none for replayed remote ones
//! - **Sync**: replays change-feed batches into the store and publishes a
//!   short-lived summary
//! - **Storage**: SQLite document store and TOML configuration, driven by
//!   the [`CommandHandler`]
//!
//! The store is single-threaded and advanced by the caller: invoke
//! [`Store::tick`] periodically so expired sync summaries are cleared.

pub mod actions;
pub mod bridge;
pub mod channel;
pub mod error;
pub mod handler;
pub mod messages;
pub mod model;
pub mod state;
pub mod storage;
pub mod sync;

pub use actions::Actions;
pub use bridge::handle_ui_message;
pub use channel::{Command, CommandChannel, RecordingChannel};
pub use error::{ChannelError, ConfigError, CoreError, Rejection, StoreError, SyncError};
pub use handler::CommandHandler;
pub use messages::{InitializeStore, SettingsView, UiMessage};
pub use model::{BoxDocument, ChangeOrigin, Item, ItemBox, ItemDocument};
pub use state::{AppState, StateAction, Store};
pub use storage::{Config, DocumentStore, MemoryDocumentStore, SqliteDocumentStore};
pub use sync::{apply_changes, BatchReport, ChangeRecord, QueuedRemote, RemoteSource};
