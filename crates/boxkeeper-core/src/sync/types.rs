//! Change-feed record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BoxId, Item, ItemDocument, ItemId};

/// Operation carried by a change record.
///
/// The `-merge` variants come from merges performed at the source; they are
/// replayed and counted exactly like their base operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
    CreateMerge,
    UpdateMerge,
}

impl ChangeOperation {
    /// The operation with any merge suffix stripped.
    pub fn base(self) -> ChangeOperation {
        match self {
            ChangeOperation::CreateMerge => ChangeOperation::Create,
            ChangeOperation::UpdateMerge => ChangeOperation::Update,
            other => other,
        }
    }
}

/// Document body of a change: item fields plus the owning box id.
///
/// Timestamps are optional on the wire; missing ones are filled in at replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDoc {
    pub name: String,
    #[serde(default)]
    pub takeout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(rename = "box")]
    pub box_id: BoxId,
}

impl ChangeDoc {
    pub fn to_item(&self, id: &str, now: DateTime<Utc>) -> Item {
        let created_at = self.created_at.unwrap_or(now);
        Item {
            id: id.to_string(),
            name: self.name.clone(),
            takeout: self.takeout,
            created_at,
            modified_at: self.modified_at.unwrap_or(created_at),
        }
    }

    pub fn to_document(&self, id: &str, now: DateTime<Utc>) -> ItemDocument {
        ItemDocument::from_item(&self.to_item(id, now), self.box_id.clone())
    }
}

impl From<&ItemDocument> for ChangeDoc {
    fn from(doc: &ItemDocument) -> Self {
        Self {
            name: doc.name.clone(),
            takeout: doc.takeout,
            created_at: Some(doc.created_at),
            modified_at: Some(doc.modified_at),
            box_id: doc.box_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeData {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<ChangeDoc>,
}

/// One entry of the change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub operation: ChangeOperation,
    pub data: ChangeData,
}

impl ChangeRecord {
    pub fn create(id: impl Into<ItemId>, doc: ChangeDoc) -> Self {
        Self {
            operation: ChangeOperation::Create,
            data: ChangeData {
                id: id.into(),
                doc: Some(doc),
            },
        }
    }

    pub fn update(id: impl Into<ItemId>, doc: ChangeDoc) -> Self {
        Self {
            operation: ChangeOperation::Update,
            data: ChangeData {
                id: id.into(),
                doc: Some(doc),
            },
        }
    }

    pub fn delete(id: impl Into<ItemId>) -> Self {
        Self {
            operation: ChangeOperation::Delete,
            data: ChangeData {
                id: id.into(),
                doc: None,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }
}
