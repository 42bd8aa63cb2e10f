//! Domain entities and their document shapes.
//!
//! [`Item`] and [`ItemBox`] are the normalized entities held by the UI-side
//! store. Box membership lives on the box: an item never records which box
//! owns it. The document shapes ([`ItemDocument`], [`BoxDocument`]) are what
//! crosses the command channel and what the document store persists; there
//! the relationship is inverted and each item document names its box.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = String;
pub type BoxId = String;

/// Generate a fresh entity id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Which side a change came from.
///
/// Local changes are persisted through the command channel; remote changes
/// were already persisted at their source and must not be sent back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOrigin {
    #[default]
    Local,
    Remote,
}

impl ChangeOrigin {
    pub fn is_local(self) -> bool {
        self == ChangeOrigin::Local
    }
}

/// A single tracked inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub takeout: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            takeout: false,
            created_at: now,
            modified_at: now,
        }
    }

    /// Merge the fields present in `patch`.
    ///
    /// Returns `false` when the patch would not change anything, in which
    /// case `modified_at` is left alone too.
    pub fn apply_patch(&mut self, patch: &ItemPatch, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(name) = &patch.name {
            if *name != self.name {
                self.name = name.clone();
                changed = true;
            }
        }
        if let Some(takeout) = patch.takeout {
            if takeout != self.takeout {
                self.takeout = takeout;
                changed = true;
            }
        }
        if changed {
            self.modified_at = now;
        }
        changed
    }
}

/// Partial update for an [`Item`]. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub takeout: Option<bool>,
}

impl ItemPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn takeout(takeout: bool) -> Self {
        Self {
            takeout: Some(takeout),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.takeout.is_none()
    }
}

/// A named, ordered collection of items. Exclusive owner of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBox {
    pub id: BoxId,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ItemBox {
    pub fn new(id: impl Into<BoxId>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|id| id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Persisted form of an item: the item fields plus the id of its box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub takeout: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(rename = "box")]
    pub box_id: BoxId,
}

impl ItemDocument {
    pub fn from_item(item: &Item, box_id: impl Into<BoxId>) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            takeout: item.takeout,
            created_at: item.created_at,
            modified_at: item.modified_at,
            box_id: box_id.into(),
        }
    }

    pub fn to_item(&self) -> Item {
        Item {
            id: self.id.clone(),
            name: self.name.clone(),
            takeout: self.takeout,
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }
}

/// Persisted form of a box. Membership is derived from item documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxDocument {
    pub id: BoxId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl BoxDocument {
    pub fn from_box(item_box: &ItemBox) -> Self {
        Self {
            id: item_box.id.clone(),
            name: item_box.name.clone(),
            created_at: item_box.created_at,
            modified_at: item_box.modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_refreshes_modified_at_only_on_change() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(5);
        let mut item = Item::new("i1", "Pen", t0);

        assert!(!item.apply_patch(&ItemPatch::name("Pen"), t1));
        assert_eq!(item.modified_at, t0);

        assert!(item.apply_patch(&ItemPatch::takeout(true), t1));
        assert!(item.takeout);
        assert_eq!(item.modified_at, t1);
        assert_eq!(item.created_at, t0);
    }

    #[test]
    fn item_document_uses_box_key() {
        let item = Item::new("i1", "Cup", Utc::now());
        let doc = ItemDocument::from_item(&item, "kitchen");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["box"], "kitchen");
        assert_eq!(doc.to_item(), item);
    }

    #[test]
    fn change_origin_defaults_to_local() {
        assert_eq!(ChangeOrigin::default(), ChangeOrigin::Local);
        assert_eq!(serde_json::to_string(&ChangeOrigin::Remote).unwrap(), "\"remote\"");
    }
}
