//! Sync commands.
//!
//! `apply` stands in for a remote endpoint: the batch file is served as the
//! next fetch, then the regular `db-exec-sync` path persists and replays it.

use std::path::PathBuf;

use boxkeeper_core::{ChangeRecord, Command, QueuedRemote};
use clap::Subcommand;

use super::print_json;
use crate::session::{Paths, Session};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Replay a change batch (JSON array of change records)
    Apply {
        /// Path to the batch file
        batch: PathBuf,
    },
    /// Pause remote synchronization
    Pause,
    /// Resume remote synchronization
    Resume,
    /// Show sync settings
    Status,
}

pub fn run(paths: &Paths, action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(paths)?;
    match action {
        SyncAction::Apply { batch } => {
            let content = std::fs::read_to_string(&batch)?;
            let changes: Vec<ChangeRecord> = serde_json::from_str(&content)?;
            let mut remote = QueuedRemote::new();
            remote.push_batch(changes);
            session.handler_mut().set_remote(Box::new(remote));

            session.run(|actions| {
                actions.request(Command::ExecSync);
                Ok(())
            })?;
            let state = session.state();
            match session.take_reports().pop() {
                Some(report) => print_json(&serde_json::json!({
                    "summary": report.info.summary(),
                    "info": report.info,
                    "skipped": report.skipped,
                    "status": state.work.status,
                }))?,
                None => return Err("sync did not run (paused or not configured)".into()),
            }
        }
        SyncAction::Pause => {
            session.run(|actions| {
                actions.request(Command::PauseSync);
                Ok(())
            })?;
            println!("sync paused");
        }
        SyncAction::Resume => {
            session.run(|actions| {
                actions.request(Command::ResumeSync);
                Ok(())
            })?;
            println!("sync resumed");
        }
        SyncAction::Status => {
            let state = session.state();
            print_json(&serde_json::json!({
                "paused": state.settings.sync_paused,
                "remote_url": state.settings.remote_url,
                "interval_secs": state.settings.sync_interval_secs,
                "syncing": state.work.syncing,
            }))?;
        }
    }
    Ok(())
}
