//! State transitions.
//!
//! Every change to [`AppState`] is expressed as a [`StateAction`] and applied
//! by [`reduce`]. Timestamps travel inside the action so a transition depends
//! only on the state and the action.
//!
//! Transitions do not enforce cross-entity bookkeeping beyond refusing
//! obviously invalid attachments: deleting an item does not detach it, and
//! deleting a box does not check that it is empty. The action layer
//! sequences those steps.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::work::{SyncNotice, WorkStatus};
use super::AppState;
use crate::messages::SettingsView;
use crate::model::{BoxId, ChangeOrigin, Item, ItemBox, ItemId, ItemPatch};

#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    /// Replace the whole model with a bootstrap snapshot.
    Initialize {
        items: Vec<Item>,
        boxes: Vec<ItemBox>,
        settings: SettingsView,
    },
    SettingsUpdate {
        settings: SettingsView,
    },
    /// Insert an item. A no-op when the id is already present.
    ItemAdd {
        item: Item,
    },
    ItemUpdate {
        id: ItemId,
        patch: ItemPatch,
        at: DateTime<Utc>,
    },
    /// Overwrite an existing item verbatim.
    ItemReplace {
        item: Item,
    },
    ItemDelete {
        id: ItemId,
    },
    BoxAdd {
        id: BoxId,
        name: String,
        at: DateTime<Utc>,
    },
    BoxItemAdd {
        box_id: BoxId,
        item_id: ItemId,
        at: DateTime<Utc>,
    },
    BoxItemDelete {
        box_id: BoxId,
        item_id: ItemId,
        at: DateTime<Utc>,
    },
    BoxNameUpdate {
        id: BoxId,
        name: String,
        at: DateTime<Utc>,
    },
    BoxDelete {
        id: BoxId,
    },
    CurrentBoxUpdate {
        id: Option<BoxId>,
    },
    SyncingUpdate {
        syncing: bool,
    },
    SyncNoticeUpdate {
        notice: SyncNotice,
    },
    SyncNoticeClear,
    LatestChangeFrom {
        origin: ChangeOrigin,
    },
    StatusUpdate {
        status: WorkStatus,
    },
}

impl StateAction {
    pub fn kind(&self) -> &'static str {
        match self {
            StateAction::Initialize { .. } => "initialize",
            StateAction::SettingsUpdate { .. } => "settings-update",
            StateAction::ItemAdd { .. } => "item-add",
            StateAction::ItemUpdate { .. } => "item-update",
            StateAction::ItemReplace { .. } => "item-replace",
            StateAction::ItemDelete { .. } => "item-delete",
            StateAction::BoxAdd { .. } => "box-add",
            StateAction::BoxItemAdd { .. } => "box-item-add",
            StateAction::BoxItemDelete { .. } => "box-item-delete",
            StateAction::BoxNameUpdate { .. } => "box-name-update",
            StateAction::BoxDelete { .. } => "box-delete",
            StateAction::CurrentBoxUpdate { .. } => "current-box-update",
            StateAction::SyncingUpdate { .. } => "syncing-update",
            StateAction::SyncNoticeUpdate { .. } => "sync-notice-update",
            StateAction::SyncNoticeClear => "sync-notice-clear",
            StateAction::LatestChangeFrom { .. } => "latest-change-from",
            StateAction::StatusUpdate { .. } => "status-update",
        }
    }
}

/// Result of applying one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The target was absent or the transition changed nothing.
    Unchanged,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }

    fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }
}

/// Apply `action` to `state`.
pub fn reduce(state: &mut AppState, action: &StateAction) -> Outcome {
    match action {
        StateAction::Initialize {
            items,
            boxes,
            settings,
        } => {
            state.items = items
                .iter()
                .map(|item| (item.id.clone(), Arc::new(item.clone())))
                .collect();
            state.boxes = boxes
                .iter()
                .map(|b| (b.id.clone(), Arc::new(b.clone())))
                .collect();
            state.settings = settings.clone();
            state.work = Default::default();
            Outcome::Applied
        }
        StateAction::SettingsUpdate { settings } => {
            let changed = state.settings != *settings;
            state.settings = settings.clone();
            Outcome::from_changed(changed)
        }
        StateAction::ItemAdd { item } => {
            if state.items.contains_key(&item.id) {
                return Outcome::Unchanged;
            }
            state.items.insert(item.id.clone(), Arc::new(item.clone()));
            Outcome::Applied
        }
        StateAction::ItemUpdate { id, patch, at } => match state.items.get_mut(id) {
            Some(item) => {
                if patch.is_empty() {
                    return Outcome::Unchanged;
                }
                let mut next = (**item).clone();
                let changed = next.apply_patch(patch, *at);
                if changed {
                    *item = Arc::new(next);
                }
                Outcome::from_changed(changed)
            }
            None => Outcome::Unchanged,
        },
        StateAction::ItemReplace { item } => match state.items.get_mut(&item.id) {
            Some(existing) if **existing != *item => {
                *existing = Arc::new(item.clone());
                Outcome::Applied
            }
            _ => Outcome::Unchanged,
        },
        StateAction::ItemDelete { id } => Outcome::from_changed(state.items.remove(id).is_some()),
        StateAction::BoxAdd { id, name, at } => {
            if state.boxes.contains_key(id) {
                return Outcome::Unchanged;
            }
            state
                .boxes
                .insert(id.clone(), Arc::new(ItemBox::new(id.clone(), name.clone(), *at)));
            Outcome::Applied
        }
        StateAction::BoxItemAdd {
            box_id,
            item_id,
            at,
        } => {
            // Exclusive ownership: the item must exist and must not be in any box yet.
            if !state.items.contains_key(item_id) || state.boxes.values().any(|b| b.contains(item_id)) {
                return Outcome::Unchanged;
            }
            match state.boxes.get_mut(box_id) {
                Some(b) => {
                    let b = Arc::make_mut(b);
                    b.items.push(item_id.clone());
                    b.modified_at = *at;
                    Outcome::Applied
                }
                None => Outcome::Unchanged,
            }
        }
        StateAction::BoxItemDelete {
            box_id,
            item_id,
            at,
        } => match state.boxes.get_mut(box_id) {
            Some(b) if b.contains(item_id) => {
                let b = Arc::make_mut(b);
                b.items.retain(|id| id != item_id);
                b.modified_at = *at;
                Outcome::Applied
            }
            _ => Outcome::Unchanged,
        },
        StateAction::BoxNameUpdate { id, name, at } => match state.boxes.get_mut(id) {
            Some(b) if b.name != *name => {
                let b = Arc::make_mut(b);
                b.name = name.clone();
                b.modified_at = *at;
                Outcome::Applied
            }
            _ => Outcome::Unchanged,
        },
        StateAction::BoxDelete { id } => Outcome::from_changed(state.boxes.remove(id).is_some()),
        StateAction::CurrentBoxUpdate { id } => {
            let changed = state.work.current_box_id != *id;
            state.work.current_box_id = id.clone();
            Outcome::from_changed(changed)
        }
        StateAction::SyncingUpdate { syncing } => {
            let changed = state.work.syncing != *syncing;
            state.work.syncing = *syncing;
            Outcome::from_changed(changed)
        }
        StateAction::SyncNoticeUpdate { notice } => {
            state.work.sync_notice = Some(*notice);
            Outcome::Applied
        }
        StateAction::SyncNoticeClear => Outcome::from_changed(state.work.sync_notice.take().is_some()),
        StateAction::LatestChangeFrom { origin } => {
            let changed = state.work.latest_change_from != *origin;
            state.work.latest_change_from = *origin;
            Outcome::from_changed(changed)
        }
        StateAction::StatusUpdate { status } => {
            let changed = state.work.status != *status;
            state.work.status = *status;
            Outcome::from_changed(changed)
        }
    }
}
