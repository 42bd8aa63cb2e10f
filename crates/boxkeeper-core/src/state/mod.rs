//! UI-side state: the normalized model, the reducer, and the store.

mod reducer;
pub mod selectors;
mod store;
pub mod work;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::messages::SettingsView;
use crate::model::{BoxId, Item, ItemBox, ItemId};

pub use reducer::{reduce, Outcome, StateAction};
pub use store::{Store, SubscriberId};
pub use work::{SyncInfo, SyncNotice, WorkState, WorkStatus};

/// Canonical in-memory snapshot held by [`Store`].
///
/// Entities are shared so cloning a snapshot copies only the maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub items: BTreeMap<ItemId, Arc<Item>>,
    pub boxes: BTreeMap<BoxId, Arc<ItemBox>>,
    pub work: WorkState,
    pub settings: SettingsView,
}
