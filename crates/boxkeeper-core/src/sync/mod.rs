//! Remote synchronization: change-feed types, the replay reconciler, and
//! the remote source seam used by the main process.

pub mod reconciler;
pub mod remote;
pub mod types;


pub use reconciler::{apply_changes, BatchReport, SkipReason, SkippedRecord};
pub use remote::{QueuedRemote, RemoteSource};
pub use types::{ChangeData, ChangeDoc, ChangeOperation, ChangeRecord};
