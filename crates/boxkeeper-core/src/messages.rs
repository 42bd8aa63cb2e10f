//! Messages sent from the main process to the UI process.
//!
//! The set is closed: every kind the UI reacts to is a variant of
//! [`UiMessage`], matched exhaustively by [`crate::bridge`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{BoxId, Item, ItemId};
use crate::storage::Config;
use crate::sync::ChangeRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl AppInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The settings values the UI displays, passed through unchanged.
///
/// The access token itself never reaches the UI; only whether one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsView {
    pub language: String,
    pub remote_url: String,
    pub sync_interval_secs: u64,
    pub sync_paused: bool,
    pub has_personal_access_token: bool,
    #[serde(default)]
    pub app_info: AppInfo,
    /// Localized UI strings keyed by message id.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
}

impl SettingsView {
    pub fn from_config(config: &Config, app_info: AppInfo) -> Self {
        Self {
            language: config.language.clone(),
            remote_url: config.sync.remote_url.clone(),
            sync_interval_secs: config.sync.interval_secs,
            sync_paused: config.sync.paused,
            has_personal_access_token: !config.sync.personal_access_token.is_empty(),
            app_info,
            messages: BTreeMap::new(),
        }
    }
}

/// Bootstrap payload for the UI store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeStore {
    pub items: BTreeMap<ItemId, Item>,
    /// Box id to ordered member item ids.
    pub boxes: BTreeMap<BoxId, Vec<ItemId>>,
    /// Display names for boxes whose name differs from their id.
    #[serde(default)]
    pub box_names: BTreeMap<BoxId, String>,
    pub settings: SettingsView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum UiMessage {
    InitializeStore(InitializeStore),
    SyncStart,
    /// A batch of change-feed records to replay.
    UpdateInfo { changes: Vec<ChangeRecord> },
    SyncError { message: String },
    SyncPaused,
    SyncResumed,
    SettingsUpdated { settings: SettingsView },
    TestSyncResult { succeeded: bool, message: Option<String> },
}

impl UiMessage {
    pub fn name(&self) -> &'static str {
        match self {
            UiMessage::InitializeStore(_) => "initialize-store",
            UiMessage::SyncStart => "sync-start",
            UiMessage::UpdateInfo { .. } => "update-info",
            UiMessage::SyncError { .. } => "sync-error",
            UiMessage::SyncPaused => "sync-paused",
            UiMessage::SyncResumed => "sync-resumed",
            UiMessage::SettingsUpdated { .. } => "settings-updated",
            UiMessage::TestSyncResult { .. } => "test-sync-result",
        }
    }
}
