//! The command channel: UI-to-main persistence and control requests.
//!
//! Commands are fire-and-forget. [`CommandChannel::send`] reports whether the
//! command was handed off, not whether it was persisted; the action layer
//! never waits for or rolls back on the outcome. Delivery is at most once.

use std::cell::RefCell;
use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::model::{BoxDocument, BoxId, ItemDocument, ItemId};
use chrono::{DateTime, Utc};

/// Wire shape: `{ "action": "<command-name>", "data": <payload> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum Command {
    #[serde(rename = "db-item-add")]
    ItemAdd(ItemDocument),
    #[serde(rename = "db-item-update")]
    ItemUpdate(ItemDocument),
    #[serde(rename = "db-item-delete")]
    ItemDelete { id: ItemId },
    #[serde(rename = "db-box-add")]
    BoxAdd(BoxDocument),
    #[serde(rename = "db-box-name-update")]
    BoxNameUpdate {
        id: BoxId,
        name: String,
        modified_at: DateTime<Utc>,
    },
    #[serde(rename = "db-box-delete")]
    BoxDelete { id: BoxId },
    /// Restore a box document whose deletion is being undone.
    ///
    /// Main-process entry point only: the action layer never builds it, so
    /// it reaches the handler from a host that kept the deleted document.
    #[serde(rename = "db-box-delete-revert")]
    BoxDeleteRevert(BoxDocument),
    #[serde(rename = "db-exec-sync")]
    ExecSync,
    #[serde(rename = "db-sync-remote-url-update")]
    SyncRemoteUrlUpdate { url: String },
    #[serde(rename = "db-sync-personal-access-token-update")]
    SyncPersonalAccessTokenUpdate { token: String },
    #[serde(rename = "db-sync-interval-update")]
    SyncIntervalUpdate { interval_secs: u64 },
    #[serde(rename = "db-test-sync")]
    TestSync,
    #[serde(rename = "db-pause-sync")]
    PauseSync,
    #[serde(rename = "db-resume-sync")]
    ResumeSync,
    #[serde(rename = "db-language-update")]
    LanguageUpdate { language: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ItemAdd(_) => "db-item-add",
            Command::ItemUpdate(_) => "db-item-update",
            Command::ItemDelete { .. } => "db-item-delete",
            Command::BoxAdd(_) => "db-box-add",
            Command::BoxNameUpdate { .. } => "db-box-name-update",
            Command::BoxDelete { .. } => "db-box-delete",
            Command::BoxDeleteRevert(_) => "db-box-delete-revert",
            Command::ExecSync => "db-exec-sync",
            Command::SyncRemoteUrlUpdate { .. } => "db-sync-remote-url-update",
            Command::SyncPersonalAccessTokenUpdate { .. } => "db-sync-personal-access-token-update",
            Command::SyncIntervalUpdate { .. } => "db-sync-interval-update",
            Command::TestSync => "db-test-sync",
            Command::PauseSync => "db-pause-sync",
            Command::ResumeSync => "db-resume-sync",
            Command::LanguageUpdate { .. } => "db-language-update",
        }
    }
}

/// Sending half of the command channel.
pub trait CommandChannel {
    fn send(&self, command: Command) -> Result<(), ChannelError>;
}

impl CommandChannel for mpsc::Sender<Command> {
    fn send(&self, command: Command) -> Result<(), ChannelError> {
        mpsc::Sender::send(self, command).map_err(|_| ChannelError::Disconnected)
    }
}

/// Buffers commands in order until the host drains them.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: RefCell<Vec<Command>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every command recorded so far, oldest first.
    pub fn take(&self) -> Vec<Command> {
        self.sent.take()
    }

    pub fn len(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.borrow().is_empty()
    }
}

impl CommandChannel for RecordingChannel {
    fn send(&self, command: Command) -> Result<(), ChannelError> {
        self.sent.borrow_mut().push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_shape() {
        let json = serde_json::to_value(Command::ItemDelete { id: "i1".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "db-item-delete", "data": { "id": "i1" } }));

        let json = serde_json::to_value(Command::PauseSync).unwrap();
        assert_eq!(json["action"], "db-pause-sync");
    }

    #[test]
    fn command_names_match_wire_tags() {
        let commands = vec![
            Command::ItemDelete { id: "i".into() },
            Command::BoxDelete { id: "b".into() },
            Command::ExecSync,
            Command::SyncIntervalUpdate { interval_secs: 60 },
            Command::LanguageUpdate { language: "ja".into() },
        ];
        for command in commands {
            let json = serde_json::to_value(&command).unwrap();
            assert_eq!(json["action"], command.name());
        }
    }

    #[test]
    fn recording_channel_keeps_order() {
        let channel = RecordingChannel::new();
        channel.send(Command::PauseSync).unwrap();
        channel.send(Command::ResumeSync).unwrap();
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.take(), vec![Command::PauseSync, Command::ResumeSync]);
        assert!(channel.is_empty());
    }

    #[test]
    fn disconnected_sender_reports_error() {
        let (tx, rx) = mpsc::channel::<Command>();
        drop(rx);
        assert_eq!(CommandChannel::send(&tx, Command::ExecSync), Err(ChannelError::Disconnected));
    }
}
