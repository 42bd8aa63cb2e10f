//! Replays change-feed batches into the local store.
//!
//! Every record becomes a remote-origin action, so replay never produces
//! command traffic. Records are applied strictly in the order received:
//! later records may rely on box membership established by earlier ones.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::types::{ChangeDoc, ChangeOperation, ChangeRecord};
use crate::actions::Actions;
use crate::channel::CommandChannel;
use crate::model::{ChangeOrigin, ItemId};
use crate::state::selectors::box_of_item;
use crate::state::SyncInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// A create or update arrived without a document body.
    MissingDoc,
    /// An update or delete referenced an item the store does not know.
    UnknownItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub id: ItemId,
    pub operation: ChangeOperation,
    pub reason: SkipReason,
}

/// Outcome of replaying one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub info: SyncInfo,
    pub skipped: Vec<SkippedRecord>,
}

/// Replay `changes` in order and publish the resulting summary.
///
/// Malformed records are skipped and logged; they never abort the batch and
/// are not counted. A create for an item that already exists is replayed as
/// an update so a repeated create leaves exactly one item.
pub fn apply_changes<C>(actions: &mut Actions<'_, C>, changes: &[ChangeRecord], now: DateTime<Utc>) -> BatchReport
where
    C: CommandChannel + ?Sized,
{
    let mut report = BatchReport::default();

    for record in changes {
        let id = record.id();
        let operation = record.operation;
        let skip = |reason: SkipReason| {
            warn!(item_id = id, ?operation, ?reason, "skipping change record");
            SkippedRecord {
                id: id.to_string(),
                operation,
                reason,
            }
        };

        match operation {
            ChangeOperation::Create | ChangeOperation::CreateMerge => {
                let Some(doc) = &record.data.doc else {
                    report.skipped.push(skip(SkipReason::MissingDoc));
                    continue;
                };
                if actions.state().items.contains_key(id) {
                    replay_update(actions, id, doc, now);
                    report.info.updated += 1;
                } else {
                    actions.insert_item(doc.to_item(id, now), &doc.box_id);
                    report.info.created += 1;
                }
            }
            ChangeOperation::Update | ChangeOperation::UpdateMerge => {
                let Some(doc) = &record.data.doc else {
                    report.skipped.push(skip(SkipReason::MissingDoc));
                    continue;
                };
                if !actions.state().items.contains_key(id) {
                    report.skipped.push(skip(SkipReason::UnknownItem));
                    continue;
                }
                replay_update(actions, id, doc, now);
                report.info.updated += 1;
            }
            ChangeOperation::Delete => match actions.delete_item(id, ChangeOrigin::Remote) {
                Ok(()) => report.info.deleted += 1,
                Err(_) => report.skipped.push(skip(SkipReason::UnknownItem)),
            },
        }
    }

    info!(
        created = report.info.created,
        updated = report.info.updated,
        deleted = report.info.deleted,
        skipped = report.skipped.len(),
        "replayed change batch"
    );
    actions.publish_sync_info(report.info, now);
    report
}

/// Replace the item in place, or replay a box rename when the record puts
/// it in a different box than the one that holds it locally.
fn replay_update<C>(actions: &mut Actions<'_, C>, id: &str, doc: &ChangeDoc, now: DateTime<Utc>)
where
    C: CommandChannel + ?Sized,
{
    let state = actions.state();
    let item = match state.items.get(id) {
        Some(existing) => {
            let mut item = doc.to_item(id, now);
            if doc.created_at.is_none() {
                item.created_at = existing.created_at;
            }
            item
        }
        None => doc.to_item(id, now),
    };
    let owner = box_of_item(&state, id).map(|b| b.id.clone());

    let result = if owner.as_deref() == Some(doc.box_id.as_str()) {
        actions.replace_item(item)
    } else {
        actions.replay_box_rename(item, owner.as_deref(), &doc.box_id)
    };
    if let Err(err) = result {
        warn!(item_id = id, error = %err, "replayed update did not apply");
    }
}
