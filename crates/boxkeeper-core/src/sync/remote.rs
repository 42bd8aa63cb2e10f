//! Source of remote change batches.

use std::collections::VecDeque;

use super::types::ChangeRecord;
use crate::error::SyncError;

/// A remote synchronization endpoint as seen by the main process.
pub trait RemoteSource {
    /// Pull every change recorded remotely since the previous fetch.
    fn fetch_changes(&mut self) -> Result<Vec<ChangeRecord>, SyncError>;

    /// Check that the endpoint is reachable and the credentials work.
    fn test_connection(&mut self) -> Result<(), SyncError>;
}

/// Serves pre-loaded batches in order. An empty queue yields empty batches.
#[derive(Debug, Default)]
pub struct QueuedRemote {
    batches: VecDeque<Vec<ChangeRecord>>,
    unreachable: Option<String>,
}

impl QueuedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&mut self, batch: Vec<ChangeRecord>) {
        self.batches.push_back(batch);
    }

    /// Make every call fail with `message` until [`QueuedRemote::reconnect`].
    pub fn disconnect(&mut self, message: impl Into<String>) {
        self.unreachable = Some(message.into());
    }

    pub fn reconnect(&mut self) {
        self.unreachable = None;
    }

    pub fn pending(&self) -> usize {
        self.batches.len()
    }

    fn check(&self) -> Result<(), SyncError> {
        match &self.unreachable {
            Some(message) => Err(SyncError::Remote(message.clone())),
            None => Ok(()),
        }
    }
}

impl RemoteSource for QueuedRemote {
    fn fetch_changes(&mut self) -> Result<Vec<ChangeRecord>, SyncError> {
        self.check()?;
        Ok(self.batches.pop_front().unwrap_or_default())
    }

    fn test_connection(&mut self) -> Result<(), SyncError> {
        self.check()
    }
}
