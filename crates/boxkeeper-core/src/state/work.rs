//! Session scratch state. Never persisted, reset on process start.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BoxId, ChangeOrigin};

/// How long a sync summary stays visible.
pub const SYNC_INFO_DISPLAY_SECS: i64 = 3;

pub fn sync_info_display() -> Duration {
    Duration::seconds(SYNC_INFO_DISPLAY_SECS)
}

/// Marker for the last completed action, used by the UI for transient cues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    #[default]
    Idle,
    ItemAdded,
    ItemUpdated,
    ItemDeleted,
    BoxAdded,
    BoxRenamed,
    BoxDeleted,
    Synced,
}

/// Counters produced by one replayed change batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfo {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncInfo {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "created {}, updated {}, deleted {}",
            self.created, self.updated, self.deleted
        )
    }
}

/// A published sync summary and the instant it should disappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncNotice {
    pub info: SyncInfo,
    pub clear_at: DateTime<Utc>,
}

impl SyncNotice {
    pub fn new(info: SyncInfo, now: DateTime<Utc>) -> Self {
        Self {
            info,
            clear_at: now + sync_info_display(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.clear_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkState {
    /// Non-owning reference to the box shown in the UI.
    pub current_box_id: Option<BoxId>,
    pub syncing: bool,
    pub sync_notice: Option<SyncNotice>,
    pub latest_change_from: ChangeOrigin,
    pub status: WorkStatus,
}

impl WorkState {
    pub fn sync_info(&self) -> Option<SyncInfo> {
        self.sync_notice.map(|n| n.info)
    }
}
