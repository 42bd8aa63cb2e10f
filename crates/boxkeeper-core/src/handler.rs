//! Main-process side of the command channel.
//!
//! [`CommandHandler`] applies each [`Command`] to the document store and the
//! configuration and returns the UI messages to forward, in order. It is the
//! only writer of persisted state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::channel::Command;
use crate::error::{ConfigError, CoreError, StoreError, SyncError};
use crate::messages::{AppInfo, SettingsView, UiMessage};
use crate::model::{BoxDocument, ItemBox};
use crate::storage::{validate_remote_url, Config, DocumentStore};
use crate::sync::{ChangeOperation, ChangeRecord, RemoteSource};

pub struct CommandHandler<D: DocumentStore> {
    documents: D,
    config: Config,
    /// Where configuration changes are written. `None` keeps them in memory.
    config_path: Option<PathBuf>,
    remote: Option<Box<dyn RemoteSource>>,
}

impl<D: DocumentStore> CommandHandler<D> {
    pub fn new(documents: D, config: Config) -> Self {
        Self {
            documents,
            config,
            config_path: None,
            remote: None,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_remote(mut self, remote: Box<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn set_remote(&mut self, remote: Box<dyn RemoteSource>) {
        self.remote = Some(remote);
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn settings_view(&self) -> SettingsView {
        SettingsView::from_config(&self.config, AppInfo::current())
    }

    /// The bootstrap message for a fresh UI store.
    pub fn initialize_message(&self) -> Result<UiMessage, CoreError> {
        let snapshot = self.documents.load_snapshot(self.settings_view())?;
        Ok(UiMessage::InitializeStore(snapshot))
    }

    /// Apply `commands` in order, passing every reply to `on_reply`.
    ///
    /// Stops at the first error. The remaining commands are dropped with a
    /// warning and never retried.
    pub fn handle_in_order(
        &mut self,
        commands: impl IntoIterator<Item = Command>,
        mut on_reply: impl FnMut(UiMessage),
    ) -> Result<(), CoreError> {
        let mut pending = commands.into_iter();
        while let Some(command) = pending.next() {
            let name = command.name();
            match self.handle(command) {
                Ok(replies) => replies.into_iter().for_each(&mut on_reply),
                Err(err) => {
                    warn!(command = name, error = %err, "command failed");
                    for dropped in pending {
                        warn!(command = dropped.name(), "dropping command after earlier failure");
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Apply one command and return the UI messages it produces.
    ///
    /// # Errors
    /// Returns an error when the document store or configuration cannot be
    /// updated. Sync failures are reported as `sync-error` messages instead.
    pub fn handle(&mut self, command: Command) -> Result<Vec<UiMessage>, CoreError> {
        let name = command.name();
        let messages = match command {
            Command::ItemAdd(doc) | Command::ItemUpdate(doc) => {
                self.ensure_box(&doc.box_id, doc.modified_at)?;
                self.documents.put_item(doc)?;
                Vec::new()
            }
            Command::ItemDelete { id } => {
                if !self.documents.delete_item(&id)? {
                    debug!(item_id = %id, "delete for unknown item document");
                }
                Vec::new()
            }
            Command::BoxAdd(doc) | Command::BoxDeleteRevert(doc) => {
                self.documents.put_box(doc)?;
                Vec::new()
            }
            Command::BoxNameUpdate { id, name, modified_at } => {
                let doc = match self.documents.get_box(&id)? {
                    Some(existing) => BoxDocument {
                        name,
                        modified_at,
                        ..existing
                    },
                    None => BoxDocument::from_box(&ItemBox::new(id, name, modified_at)),
                };
                self.documents.put_box(doc)?;
                Vec::new()
            }
            Command::BoxDelete { id } => {
                let count = self.documents.items_in_box(&id)?.len();
                if count > 0 {
                    return Err(StoreError::BoxNotEmpty { id, count }.into());
                }
                self.documents.delete_box(&id)?;
                Vec::new()
            }
            Command::ExecSync => self.exec_sync(Utc::now()),
            Command::TestSync => vec![self.test_sync()],
            Command::PauseSync => {
                self.config.sync.paused = true;
                self.save_config()?;
                vec![UiMessage::SyncPaused]
            }
            Command::ResumeSync => {
                self.config.sync.paused = false;
                self.save_config()?;
                vec![UiMessage::SyncResumed]
            }
            Command::SyncRemoteUrlUpdate { url } => {
                validate_remote_url(&url)?;
                self.config.sync.remote_url = url;
                self.settings_changed()?
            }
            Command::SyncPersonalAccessTokenUpdate { token } => {
                self.config.sync.personal_access_token = token;
                self.settings_changed()?
            }
            Command::SyncIntervalUpdate { interval_secs } => {
                if interval_secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "sync.interval_secs".into(),
                        message: "must be greater than zero".into(),
                    }
                    .into());
                }
                self.config.sync.interval_secs = interval_secs;
                self.settings_changed()?
            }
            Command::LanguageUpdate { language } => {
                if language.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "language".into(),
                        message: "must not be empty".into(),
                    }
                    .into());
                }
                self.config.language = language;
                self.settings_changed()?
            }
        };
        info!(command = name, replies = messages.len(), "handled command");
        Ok(messages)
    }

    fn exec_sync(&mut self, now: DateTime<Utc>) -> Vec<UiMessage> {
        if self.config.sync.paused {
            return vec![UiMessage::SyncError {
                message: SyncError::Paused.to_string(),
            }];
        }
        let Some(remote) = self.remote.as_mut() else {
            return vec![UiMessage::SyncError {
                message: SyncError::NotConfigured.to_string(),
            }];
        };

        let changes = match remote.fetch_changes() {
            Ok(changes) => changes,
            Err(err) => {
                warn!(error = %err, "fetching remote changes failed");
                return vec![
                    UiMessage::SyncStart,
                    UiMessage::SyncError {
                        message: err.to_string(),
                    },
                ];
            }
        };

        if let Err(err) = self.apply_remote(&changes, now) {
            let err = SyncError::Apply(err);
            warn!(error = %err, "persisting remote changes failed");
            return vec![
                UiMessage::SyncStart,
                UiMessage::SyncError {
                    message: err.to_string(),
                },
            ];
        }
        vec![UiMessage::SyncStart, UiMessage::UpdateInfo { changes }]
    }

    /// Mirror a change batch into the document store the way the UI replays
    /// it, so the next bootstrap matches the replayed state.
    fn apply_remote(&mut self, changes: &[ChangeRecord], now: DateTime<Utc>) -> Result<(), StoreError> {
        for record in changes {
            let id = record.id();
            match record.operation.base() {
                ChangeOperation::Delete => {
                    self.documents.delete_item(id)?;
                }
                _ => {
                    let Some(change) = &record.data.doc else {
                        continue;
                    };
                    let previous = self.documents.get_item(id)?;
                    if previous.is_none() && record.operation.base() == ChangeOperation::Update {
                        continue;
                    }
                    let mut doc = change.to_document(id, now);
                    if let (Some(previous), None) = (&previous, change.created_at) {
                        doc.created_at = previous.created_at;
                    }
                    self.ensure_box(&doc.box_id, doc.modified_at)?;
                    let vacated = previous.map(|p| p.box_id).filter(|old| *old != doc.box_id);
                    self.documents.put_item(doc)?;

                    if let Some(old) = vacated {
                        if self.documents.items_in_box(&old)?.is_empty() {
                            self.documents.delete_box(&old)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn test_sync(&mut self) -> UiMessage {
        let result = match self.remote.as_mut() {
            Some(remote) => remote.test_connection(),
            None => Err(SyncError::NotConfigured),
        };
        match result {
            Ok(()) => UiMessage::TestSyncResult {
                succeeded: true,
                message: None,
            },
            Err(err) => UiMessage::TestSyncResult {
                succeeded: false,
                message: Some(err.to_string()),
            },
        }
    }

    fn ensure_box(&mut self, box_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if self.documents.get_box(box_id)?.is_none() {
            self.documents
                .put_box(BoxDocument::from_box(&ItemBox::new(box_id, box_id, at)))?;
        }
        Ok(())
    }

    fn settings_changed(&mut self) -> Result<Vec<UiMessage>, CoreError> {
        self.save_config()?;
        Ok(vec![UiMessage::SettingsUpdated {
            settings: self.settings_view(),
        }])
    }

    fn save_config(&self) -> Result<(), ConfigError> {
        match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemDocument};
    use crate::storage::MemoryDocumentStore;
    use crate::sync::{ChangeDoc, QueuedRemote};

    fn handler() -> CommandHandler<MemoryDocumentStore> {
        CommandHandler::new(MemoryDocumentStore::new(), Config::default())
    }

    fn item_doc(id: &str, box_id: &str) -> ItemDocument {
        ItemDocument::from_item(&Item::new(id, "Cup", Utc::now()), box_id)
    }

    fn change(name: &str, box_id: &str) -> ChangeDoc {
        ChangeDoc {
            name: name.into(),
            takeout: false,
            created_at: None,
            modified_at: None,
            box_id: box_id.into(),
        }
    }

    #[test]
    fn item_add_creates_missing_box_document() {
        let mut h = handler();
        let replies = h.handle(Command::ItemAdd(item_doc("i1", "kitchen"))).unwrap();
        assert!(replies.is_empty());
        assert_eq!(h.documents().get_box("kitchen").unwrap().unwrap().name, "kitchen");
        assert_eq!(h.documents().items_in_box("kitchen").unwrap().len(), 1);
    }

    #[test]
    fn box_delete_refused_while_items_remain() {
        let mut h = handler();
        h.handle(Command::ItemAdd(item_doc("i1", "kitchen"))).unwrap();
        let err = h.handle(Command::BoxDelete { id: "kitchen".into() }).unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::BoxNotEmpty { count: 1, .. })));

        h.handle(Command::ItemDelete { id: "i1".into() }).unwrap();
        h.handle(Command::BoxDelete { id: "kitchen".into() }).unwrap();
        assert!(h.documents().get_box("kitchen").unwrap().is_none());
    }

    #[test]
    fn commands_after_a_failure_are_dropped() {
        let mut h = handler();
        h.handle(Command::ItemAdd(item_doc("i1", "kitchen"))).unwrap();

        let mut replies = Vec::new();
        let err = h
            .handle_in_order(
                [
                    Command::BoxDelete { id: "kitchen".into() },
                    Command::ItemAdd(item_doc("i2", "garage")),
                ],
                |msg| replies.push(msg),
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::Store(StoreError::BoxNotEmpty { .. })));
        assert!(h.documents().get_item("i2").unwrap().is_none());
        assert!(h.documents().get_box("garage").unwrap().is_none());
        assert!(replies.is_empty());
    }

    #[test]
    fn handle_in_order_forwards_replies() {
        let mut h = handler();
        let mut replies = Vec::new();
        h.handle_in_order([Command::PauseSync, Command::ResumeSync], |msg| replies.push(msg))
            .unwrap();
        assert_eq!(replies, vec![UiMessage::SyncPaused, UiMessage::SyncResumed]);
    }

    #[test]
    fn box_delete_revert_restores_document() {
        let mut h = handler();
        let doc = BoxDocument::from_box(&ItemBox::new("b1", "Garage", Utc::now()));
        h.handle(Command::BoxAdd(doc.clone())).unwrap();
        h.handle(Command::BoxDelete { id: "b1".into() }).unwrap();
        h.handle(Command::BoxDeleteRevert(doc.clone())).unwrap();
        assert_eq!(h.documents().get_box("b1").unwrap(), Some(doc));
    }

    #[test]
    fn box_rename_keeps_creation_time() {
        let mut h = handler();
        let doc = BoxDocument::from_box(&ItemBox::new("b1", "Garage", Utc::now()));
        h.handle(Command::BoxAdd(doc.clone())).unwrap();
        h.handle(Command::BoxNameUpdate {
            id: "b1".into(),
            name: "Shed".into(),
            modified_at: Utc::now(),
        })
        .unwrap();
        let renamed = h.documents().get_box("b1").unwrap().unwrap();
        assert_eq!(renamed.name, "Shed");
        assert_eq!(renamed.created_at, doc.created_at);
    }

    #[test]
    fn exec_sync_without_remote_reports_error() {
        let mut h = handler();
        let replies = h.handle(Command::ExecSync).unwrap();
        assert!(matches!(replies.as_slice(), [UiMessage::SyncError { .. }]));
    }

    #[test]
    fn exec_sync_while_paused_reports_error() {
        let mut h = handler().with_remote(Box::new(QueuedRemote::new()));
        assert_eq!(h.handle(Command::PauseSync).unwrap(), vec![UiMessage::SyncPaused]);
        let replies = h.handle(Command::ExecSync).unwrap();
        assert_eq!(
            replies,
            vec![UiMessage::SyncError {
                message: SyncError::Paused.to_string()
            }]
        );
        assert_eq!(h.handle(Command::ResumeSync).unwrap(), vec![UiMessage::SyncResumed]);
    }

    #[test]
    fn exec_sync_persists_and_forwards_batch() {
        let mut remote = QueuedRemote::new();
        let batch = vec![
            ChangeRecord::create("x", change("Cup", "B2")),
            ChangeRecord::update("ghost", change("Nope", "B2")),
        ];
        remote.push_batch(batch.clone());
        let mut h = handler().with_remote(Box::new(remote));

        let replies = h.handle(Command::ExecSync).unwrap();
        assert_eq!(
            replies,
            vec![UiMessage::SyncStart, UiMessage::UpdateInfo { changes: batch }]
        );
        assert_eq!(h.documents().get_item("x").unwrap().unwrap().box_id, "B2");
        assert!(h.documents().get_item("ghost").unwrap().is_none());
        assert!(h.documents().get_box("B2").unwrap().is_some());
    }

    #[test]
    fn exec_sync_drops_box_vacated_by_move() {
        let mut remote = QueuedRemote::new();
        remote.push_batch(vec![ChangeRecord::update("i1", change("Cup", "B3"))]);
        let mut h = handler().with_remote(Box::new(remote));
        h.handle(Command::ItemAdd(item_doc("i1", "B1"))).unwrap();

        h.handle(Command::ExecSync).unwrap();
        assert!(h.documents().get_box("B1").unwrap().is_none());
        assert_eq!(h.documents().get_item("i1").unwrap().unwrap().box_id, "B3");
    }

    #[test]
    fn exec_sync_remote_failure_surfaces_after_start() {
        let mut remote = QueuedRemote::new();
        remote.disconnect("offline");
        let mut h = handler().with_remote(Box::new(remote));
        let replies = h.handle(Command::ExecSync).unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], UiMessage::SyncStart);
        assert!(matches!(&replies[1], UiMessage::SyncError { message } if message.contains("offline")));
    }

    #[test]
    fn test_sync_reports_reachability() {
        let mut h = handler();
        assert!(matches!(
            h.handle(Command::TestSync).unwrap().as_slice(),
            [UiMessage::TestSyncResult { succeeded: false, .. }]
        ));

        h.set_remote(Box::new(QueuedRemote::new()));
        assert_eq!(
            h.handle(Command::TestSync).unwrap(),
            vec![UiMessage::TestSyncResult {
                succeeded: true,
                message: None
            }]
        );
    }

    #[test]
    fn settings_updates_are_validated_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut h = handler().with_config_path(&path);

        assert!(h
            .handle(Command::SyncRemoteUrlUpdate {
                url: "gopher://old".into()
            })
            .is_err());
        assert!(h.handle(Command::SyncIntervalUpdate { interval_secs: 0 }).is_err());

        let replies = h
            .handle(Command::SyncRemoteUrlUpdate {
                url: "https://sync.example.com".into(),
            })
            .unwrap();
        match replies.as_slice() {
            [UiMessage::SettingsUpdated { settings }] => {
                assert_eq!(settings.remote_url, "https://sync.example.com")
            }
            other => panic!("unexpected replies {other:?}"),
        }

        h.handle(Command::SyncPersonalAccessTokenUpdate { token: "t0k".into() })
            .unwrap();
        h.handle(Command::LanguageUpdate { language: "ja".into() }).unwrap();

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.sync.remote_url, "https://sync.example.com");
        assert_eq!(saved.sync.personal_access_token, "t0k");
        assert_eq!(saved.language, "ja");
    }

    #[test]
    fn initialize_message_reflects_documents() {
        let mut h = handler();
        h.handle(Command::ItemAdd(item_doc("i1", "kitchen"))).unwrap();
        match h.initialize_message().unwrap() {
            UiMessage::InitializeStore(payload) => {
                assert_eq!(payload.boxes["kitchen"], vec!["i1".to_string()]);
                assert_eq!(payload.settings.language, "en");
            }
            other => panic!("unexpected message {}", other.name()),
        }
    }
}
