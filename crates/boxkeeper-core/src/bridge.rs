//! Routes main-process messages into the UI store.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::actions::Actions;
use crate::channel::CommandChannel;
use crate::messages::UiMessage;
use crate::sync::{apply_changes, BatchReport};

/// Apply one [`UiMessage`] through the action layer.
///
/// Returns the replay report for `update-info`; every other message yields
/// `None`. None of these paths emit commands.
pub fn handle_ui_message<C>(actions: &mut Actions<'_, C>, message: UiMessage, now: DateTime<Utc>) -> Option<BatchReport>
where
    C: CommandChannel + ?Sized,
{
    match message {
        UiMessage::InitializeStore(payload) => {
            info!(items = payload.items.len(), boxes = payload.boxes.len(), "initializing store");
            actions.initialize(payload);
            None
        }
        UiMessage::SyncStart => {
            actions.begin_sync();
            None
        }
        UiMessage::UpdateInfo { changes } => Some(apply_changes(actions, &changes, now)),
        UiMessage::SyncError { message } => {
            warn!(%message, "sync failed");
            actions.end_sync();
            None
        }
        UiMessage::SyncPaused | UiMessage::SyncResumed => {
            let paused = matches!(message, UiMessage::SyncPaused);
            let mut settings = actions.state().settings.clone();
            settings.sync_paused = paused;
            actions.apply_settings(settings);
            actions.end_sync();
            None
        }
        UiMessage::SettingsUpdated { settings } => {
            actions.apply_settings(settings);
            None
        }
        UiMessage::TestSyncResult { succeeded, message } => {
            if succeeded {
                info!("sync connection test succeeded");
            } else {
                warn!(message = message.as_deref().unwrap_or(""), "sync connection test failed");
            }
            None
        }
    }
}
