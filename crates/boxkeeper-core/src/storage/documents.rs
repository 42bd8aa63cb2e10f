//! Document store: the main-process record of items and boxes.
//!
//! Membership is stored on the item side (each item document names its
//! box), so a box's contents are derived by query rather than kept in a
//! list that could drift.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::messages::{InitializeStore, SettingsView};
use crate::model::{BoxDocument, BoxId, ItemDocument, ItemId};

pub trait DocumentStore {
    /// Insert or overwrite an item document.
    fn put_item(&mut self, doc: ItemDocument) -> Result<(), StoreError>;
    fn get_item(&self, id: &str) -> Result<Option<ItemDocument>, StoreError>;
    /// Returns whether a document was removed.
    fn delete_item(&mut self, id: &str) -> Result<bool, StoreError>;

    /// Insert or overwrite a box document.
    fn put_box(&mut self, doc: BoxDocument) -> Result<(), StoreError>;
    fn get_box(&self, id: &str) -> Result<Option<BoxDocument>, StoreError>;
    /// Returns whether a document was removed. Item documents are untouched.
    fn delete_box(&mut self, id: &str) -> Result<bool, StoreError>;

    /// All item documents, oldest first (ties by id).
    fn items(&self) -> Result<Vec<ItemDocument>, StoreError>;
    /// All box documents, by id.
    fn boxes(&self) -> Result<Vec<BoxDocument>, StoreError>;

    /// Item documents naming `box_id`, oldest first.
    fn items_in_box(&self, box_id: &str) -> Result<Vec<ItemDocument>, StoreError> {
        Ok(self.items()?.into_iter().filter(|doc| doc.box_id == box_id).collect())
    }

    /// Build the `initialize-store` payload.
    ///
    /// Boxes referenced by item documents but lacking a box document are
    /// included under their id. Member order is not stored: each box lists
    /// its items by creation time, oldest first, whatever order they arrived
    /// in.
    fn load_snapshot(&self, settings: SettingsView) -> Result<InitializeStore, StoreError> {
        let mut snapshot = InitializeStore {
            settings,
            ..InitializeStore::default()
        };
        for doc in self.boxes()? {
            if doc.name != doc.id {
                snapshot.box_names.insert(doc.id.clone(), doc.name);
            }
            snapshot.boxes.insert(doc.id, Vec::new());
        }
        for doc in self.items()? {
            snapshot
                .boxes
                .entry(doc.box_id.clone())
                .or_default()
                .push(doc.id.clone());
            snapshot.items.insert(doc.id.clone(), doc.to_item());
        }
        Ok(snapshot)
    }
}

/// Non-persistent store, used by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    items: BTreeMap<ItemId, ItemDocument>,
    boxes: BTreeMap<BoxId, BoxDocument>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn put_item(&mut self, doc: ItemDocument) -> Result<(), StoreError> {
        self.items.insert(doc.id.clone(), doc);
        Ok(())
    }

    fn get_item(&self, id: &str) -> Result<Option<ItemDocument>, StoreError> {
        Ok(self.items.get(id).cloned())
    }

    fn delete_item(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.items.remove(id).is_some())
    }

    fn put_box(&mut self, doc: BoxDocument) -> Result<(), StoreError> {
        self.boxes.insert(doc.id.clone(), doc);
        Ok(())
    }

    fn get_box(&self, id: &str) -> Result<Option<BoxDocument>, StoreError> {
        Ok(self.boxes.get(id).cloned())
    }

    fn delete_box(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.boxes.remove(id).is_some())
    }

    fn items(&self) -> Result<Vec<ItemDocument>, StoreError> {
        let mut docs: Vec<ItemDocument> = self.items.values().cloned().collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(docs)
    }

    fn boxes(&self) -> Result<Vec<BoxDocument>, StoreError> {
        Ok(self.boxes.values().cloned().collect())
    }
}
