//! The action layer.
//!
//! Each operation validates against the current snapshot, applies all of its
//! transitions through one [`Store::dispatch_all`], then, for local-origin
//! actions only, emits a single command describing the change. Remote-origin
//! actions replay changes that are already persisted at their source and
//! never emit.
//!
//! A [`Rejection`] means nothing happened: no transition was applied and no
//! command was sent.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::channel::{Command, CommandChannel};
use crate::error::Rejection;
use crate::messages::{InitializeStore, SettingsView};
use crate::model::{
    generate_id, BoxDocument, BoxId, ChangeOrigin, Item, ItemBox, ItemDocument, ItemId, ItemPatch,
};
use crate::state::selectors::{box_of_item, boxes_by_name, find_box_by_name};
use crate::state::{AppState, Outcome, StateAction, Store, SyncInfo, SyncNotice, WorkStatus};

pub struct Actions<'a, C: CommandChannel + ?Sized> {
    store: &'a mut Store,
    channel: &'a C,
}

impl<'a, C: CommandChannel + ?Sized> Actions<'a, C> {
    pub fn new(store: &'a mut Store, channel: &'a C) -> Self {
        Self { store, channel }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.store.state()
    }

    /// Seed the store from the main process bootstrap payload.
    ///
    /// Member ids that reference no item, or that a previous box already
    /// claimed, are dropped so the seeded state keeps exclusive ownership.
    /// The first box in name order becomes current.
    pub fn initialize(&mut self, payload: InitializeStore) {
        let now = Utc::now();
        let InitializeStore {
            items,
            boxes,
            box_names,
            settings,
        } = payload;

        let mut claimed: HashSet<ItemId> = HashSet::new();
        let mut seeded = Vec::with_capacity(boxes.len());
        for (box_id, member_ids) in boxes {
            let name = box_names.get(&box_id).cloned().unwrap_or_else(|| box_id.clone());
            let mut item_box = ItemBox::new(box_id, name, now);
            for item_id in member_ids {
                if !items.contains_key(&item_id) {
                    warn!(box_id = %item_box.id, %item_id, "dropping dangling member id");
                } else if !claimed.insert(item_id.clone()) {
                    warn!(box_id = %item_box.id, %item_id, "dropping item already owned by another box");
                } else {
                    item_box.items.push(item_id);
                }
            }
            seeded.push(item_box);
        }

        let current = seeded
            .iter()
            .min_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)))
            .map(|b| b.id.clone());

        self.store.dispatch_all([
            StateAction::Initialize {
                items: items.into_values().collect(),
                boxes: seeded,
                settings,
            },
            StateAction::CurrentBoxUpdate { id: current },
        ]);
    }

    pub fn apply_settings(&mut self, settings: SettingsView) {
        self.store.dispatch(StateAction::SettingsUpdate { settings });
    }

    // ── Items ────────────────────────────────────────────────────────

    /// Create an item named `name` inside `box_id`, creating the box when
    /// it does not exist yet.
    pub fn add_item(&mut self, box_id: &str, name: &str, origin: ChangeOrigin) -> Result<ItemId, Rejection> {
        let name = non_empty(name)?;
        let now = Utc::now();
        let item = Item::new(generate_id(), name, now);
        self.insert_with_origin(item.clone(), box_id, origin, now);
        self.emit(origin, Command::ItemAdd(ItemDocument::from_item(&item, box_id)));
        Ok(item.id)
    }

    /// Replay a remote creation verbatim, keeping the supplied id and
    /// timestamps. Never emits.
    pub fn insert_item(&mut self, item: Item, box_id: &str) -> Outcome {
        self.insert_with_origin(item, box_id, ChangeOrigin::Remote, Utc::now())
    }

    /// Replay a remote update by overwriting the item fields. Never emits.
    pub fn replace_item(&mut self, item: Item) -> Result<(), Rejection> {
        if !self.store.state().items.contains_key(&item.id) {
            return Err(Rejection::ItemNotFound(item.id));
        }
        self.store.dispatch_all([
            StateAction::LatestChangeFrom {
                origin: ChangeOrigin::Remote,
            },
            StateAction::ItemReplace { item },
        ]);
        Ok(())
    }

    /// Detach the item from every box that lists it, then delete it.
    pub fn delete_item(&mut self, id: &str, origin: ChangeOrigin) -> Result<(), Rejection> {
        let state = self.store.state();
        if !state.items.contains_key(id) {
            return Err(Rejection::ItemNotFound(id.to_string()));
        }
        let now = Utc::now();

        let mut steps = vec![StateAction::LatestChangeFrom { origin }];
        steps.extend(
            state
                .boxes
                .values()
                .filter(|b| b.contains(id))
                .map(|b| StateAction::BoxItemDelete {
                    box_id: b.id.clone(),
                    item_id: id.to_string(),
                    at: now,
                }),
        );
        steps.push(StateAction::ItemDelete { id: id.to_string() });
        steps.push(StateAction::StatusUpdate {
            status: WorkStatus::ItemDeleted,
        });
        self.store.dispatch_all(steps);

        self.emit(origin, Command::ItemDelete { id: id.to_string() });
        Ok(())
    }

    pub fn rename_item(&mut self, id: &str, name: &str, origin: ChangeOrigin) -> Result<(), Rejection> {
        let name = non_empty(name)?;
        let state = self.store.state();
        let item = state
            .items
            .get(id)
            .ok_or_else(|| Rejection::ItemNotFound(id.to_string()))?;
        if item.name == name {
            return Err(Rejection::UnchangedName);
        }
        self.update_item(id, ItemPatch::name(name), origin);
        Ok(())
    }

    pub fn toggle_takeout(&mut self, id: &str, origin: ChangeOrigin) -> Result<bool, Rejection> {
        let state = self.store.state();
        let item = state
            .items
            .get(id)
            .ok_or_else(|| Rejection::ItemNotFound(id.to_string()))?;
        let takeout = !item.takeout;
        self.update_item(id, ItemPatch::takeout(takeout), origin);
        Ok(takeout)
    }

    // ── Boxes ────────────────────────────────────────────────────────

    pub fn add_box(&mut self, name: &str, origin: ChangeOrigin) -> Result<BoxId, Rejection> {
        let name = non_empty(name)?;
        if find_box_by_name(&self.store.state(), name).is_some() {
            return Err(Rejection::DuplicateBoxName(name.to_string()));
        }
        let now = Utc::now();
        let item_box = ItemBox::new(generate_id(), name, now);
        self.store.dispatch_all([
            StateAction::LatestChangeFrom { origin },
            StateAction::BoxAdd {
                id: item_box.id.clone(),
                name: item_box.name.clone(),
                at: now,
            },
            StateAction::StatusUpdate {
                status: WorkStatus::BoxAdded,
            },
        ]);
        self.emit(origin, Command::BoxAdd(BoxDocument::from_box(&item_box)));
        Ok(item_box.id)
    }

    /// Rename `id`, or create it under `name` when it does not exist.
    pub fn rename_box(&mut self, id: &str, name: &str, origin: ChangeOrigin) -> Result<(), Rejection> {
        let name = non_empty(name)?;
        let now = Utc::now();
        let existing = self.store.state().boxes.get(id).map(|b| b.name.clone());

        match existing {
            None => {
                self.store.dispatch_all([
                    StateAction::LatestChangeFrom { origin },
                    StateAction::BoxAdd {
                        id: id.to_string(),
                        name: name.to_string(),
                        at: now,
                    },
                    StateAction::StatusUpdate {
                        status: WorkStatus::BoxAdded,
                    },
                ]);
                self.emit(
                    origin,
                    Command::BoxAdd(BoxDocument::from_box(&ItemBox::new(id, name, now))),
                );
            }
            Some(current) if current == name => return Err(Rejection::UnchangedName),
            Some(_) => {
                self.store.dispatch_all([
                    StateAction::LatestChangeFrom { origin },
                    StateAction::BoxNameUpdate {
                        id: id.to_string(),
                        name: name.to_string(),
                        at: now,
                    },
                    StateAction::StatusUpdate {
                        status: WorkStatus::BoxRenamed,
                    },
                ]);
                self.emit(
                    origin,
                    Command::BoxNameUpdate {
                        id: id.to_string(),
                        name: name.to_string(),
                        modified_at: now,
                    },
                );
            }
        }
        Ok(())
    }

    /// Delete an empty box that is not the last one.
    ///
    /// Returns the id of the box that becomes current: the box preceding
    /// `id` in name order, or the following one when `id` sorts first. The
    /// current box only moves when it was the deleted box.
    pub fn delete_box(&mut self, id: &str, origin: ChangeOrigin) -> Result<BoxId, Rejection> {
        let state = self.store.state();
        let target = state
            .boxes
            .get(id)
            .ok_or_else(|| Rejection::BoxNotFound(id.to_string()))?;
        if !target.is_empty() {
            return Err(Rejection::BoxNotEmpty {
                id: id.to_string(),
                count: target.items.len(),
            });
        }
        if state.boxes.len() <= 1 {
            return Err(Rejection::LastBox);
        }

        let ordered = boxes_by_name(&state);
        let position = ordered.iter().position(|b| b.id == id).unwrap_or(0);
        let fallback = if position > 0 {
            ordered[position - 1].id.clone()
        } else {
            ordered[position + 1].id.clone()
        };

        let mut steps = vec![
            StateAction::LatestChangeFrom { origin },
            StateAction::BoxDelete { id: id.to_string() },
        ];
        let current = state.work.current_box_id.as_deref();
        if current.is_none() || current == Some(id) {
            steps.push(StateAction::CurrentBoxUpdate {
                id: Some(fallback.clone()),
            });
        }
        steps.push(StateAction::StatusUpdate {
            status: WorkStatus::BoxDeleted,
        });
        self.store.dispatch_all(steps);

        self.emit(origin, Command::BoxDelete { id: id.to_string() });
        Ok(fallback)
    }

    /// Switch the current box. Pure navigation: nothing is persisted.
    pub fn select_box(&mut self, id: &str) -> Result<(), Rejection> {
        if !self.store.state().boxes.contains_key(id) {
            return Err(Rejection::BoxNotFound(id.to_string()));
        }
        self.store.dispatch(StateAction::CurrentBoxUpdate {
            id: Some(id.to_string()),
        });
        Ok(())
    }

    /// Replay a box rename observed at the source through one of its items.
    ///
    /// The item moves from `from` (its current owner, if any) to `to` and
    /// takes the replayed fields. `to` is created when absent. When the move
    /// leaves `from` empty the old box has been fully renamed and is dropped;
    /// if it was current, `to` becomes current. Never emits.
    pub fn replay_box_rename(&mut self, item: Item, from: Option<&str>, to: &str) -> Result<(), Rejection> {
        let state = self.store.state();
        if !state.items.contains_key(&item.id) {
            return Err(Rejection::ItemNotFound(item.id));
        }
        let now = Utc::now();
        let item_id = item.id.clone();

        let mut steps = vec![StateAction::LatestChangeFrom {
            origin: ChangeOrigin::Remote,
        }];
        if !state.boxes.contains_key(to) {
            steps.push(StateAction::BoxAdd {
                id: to.to_string(),
                name: to.to_string(),
                at: now,
            });
        }
        if let Some(from) = from {
            steps.push(StateAction::BoxItemDelete {
                box_id: from.to_string(),
                item_id: item_id.clone(),
                at: now,
            });
        }
        steps.push(StateAction::BoxItemAdd {
            box_id: to.to_string(),
            item_id: item_id.clone(),
            at: now,
        });
        steps.push(StateAction::ItemReplace { item });

        let vacated = from.filter(|from| {
            *from != to
                && state
                    .boxes
                    .get(*from)
                    .is_some_and(|b| b.items.iter().all(|id| *id == item_id))
        });
        if let Some(from) = vacated {
            steps.push(StateAction::BoxDelete { id: from.to_string() });
            if state.work.current_box_id.as_deref() == Some(from) {
                steps.push(StateAction::CurrentBoxUpdate {
                    id: Some(to.to_string()),
                });
            }
        }
        steps.push(StateAction::StatusUpdate {
            status: WorkStatus::BoxRenamed,
        });
        self.store.dispatch_all(steps);
        Ok(())
    }

    // ── Sync status ──────────────────────────────────────────────────

    pub fn begin_sync(&mut self) {
        self.store.dispatch(StateAction::SyncingUpdate { syncing: true });
    }

    pub fn end_sync(&mut self) {
        self.store.dispatch(StateAction::SyncingUpdate { syncing: false });
    }

    /// Show `info` until `now` plus the display interval. Publishing again
    /// before expiry restarts the interval.
    pub fn publish_sync_info(&mut self, info: SyncInfo, now: DateTime<Utc>) {
        self.store.dispatch_all([
            StateAction::SyncingUpdate { syncing: false },
            StateAction::SyncNoticeUpdate {
                notice: SyncNotice::new(info, now),
            },
            StateAction::StatusUpdate {
                status: WorkStatus::Synced,
            },
        ]);
    }

    /// Send a control command (sync or settings) to the main process.
    pub fn request(&self, command: Command) {
        self.send(command);
    }

    // ── Internals ────────────────────────────────────────────────────

    fn insert_with_origin(&mut self, item: Item, box_id: &str, origin: ChangeOrigin, now: DateTime<Utc>) -> Outcome {
        let mut steps = vec![StateAction::LatestChangeFrom { origin }];
        if !self.store.state().boxes.contains_key(box_id) {
            steps.push(StateAction::BoxAdd {
                id: box_id.to_string(),
                name: box_id.to_string(),
                at: now,
            });
        }
        let item_id = item.id.clone();
        let add_index = steps.len();
        steps.push(StateAction::ItemAdd { item });
        steps.push(StateAction::BoxItemAdd {
            box_id: box_id.to_string(),
            item_id,
            at: now,
        });
        steps.push(StateAction::StatusUpdate {
            status: WorkStatus::ItemAdded,
        });
        self.store.dispatch_all(steps)[add_index]
    }

    fn update_item(&mut self, id: &str, patch: ItemPatch, origin: ChangeOrigin) {
        let now = Utc::now();
        self.store.dispatch_all([
            StateAction::LatestChangeFrom { origin },
            StateAction::ItemUpdate {
                id: id.to_string(),
                patch,
                at: now,
            },
            StateAction::StatusUpdate {
                status: WorkStatus::ItemUpdated,
            },
        ]);

        if !origin.is_local() {
            return;
        }
        let state = self.store.state();
        let (Some(item), Some(owner)) = (state.items.get(id), box_of_item(&state, id)) else {
            warn!(item_id = id, "updated item has no owning box; not persisted");
            return;
        };
        self.send(Command::ItemUpdate(ItemDocument::from_item(item, owner.id.clone())));
    }

    fn emit(&self, origin: ChangeOrigin, command: Command) {
        if origin.is_local() {
            self.send(command);
        } else {
            debug!(command = command.name(), "remote origin; not emitted");
        }
    }

    fn send(&self, command: Command) {
        let name = command.name();
        if let Err(err) = self.channel.send(command) {
            warn!(command = name, error = %err, "command not delivered; local state kept");
        }
    }
}

fn non_empty(name: &str) -> Result<&str, Rejection> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(Rejection::EmptyName)
    } else {
        Ok(trimmed)
    }
}
