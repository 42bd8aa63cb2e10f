//! One CLI invocation acting as both processes.
//!
//! The session bootstraps a UI store from the document store, runs a single
//! action against it, then hands every emitted command to the handler in
//! order and routes the handler's replies back into the store.

use std::path::PathBuf;

use boxkeeper_core::state::selectors::find_box_by_name;
use boxkeeper_core::{
    handle_ui_message, Actions, AppState, BatchReport, CommandHandler, Config, CoreError, RecordingChannel,
    Rejection, SqliteDocumentStore, Store,
};
use chrono::Utc;
use tracing::debug;

/// Paths given on the command line; `None` means the data directory default.
pub struct Paths {
    pub db: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl Paths {
    pub fn config_path(&self) -> Result<PathBuf, CoreError> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::default_path()?),
        }
    }

    pub fn load_config(&self) -> Result<(Config, PathBuf), CoreError> {
        let path = self.config_path()?;
        Ok((Config::load_from(&path)?, path))
    }
}

pub struct Session {
    store: Store,
    handler: CommandHandler<SqliteDocumentStore>,
    reports: Vec<BatchReport>,
}

impl Session {
    pub fn open(paths: &Paths) -> Result<Self, CoreError> {
        let (config, config_path) = paths.load_config()?;
        let documents = match &paths.db {
            Some(path) => SqliteDocumentStore::open(path)?,
            None => SqliteDocumentStore::open_default()?,
        };
        let handler = CommandHandler::new(documents, config).with_config_path(config_path);

        let mut session = Self {
            store: Store::new(),
            handler,
            reports: Vec::new(),
        };
        let bootstrap = session.handler.initialize_message()?;
        let channel = RecordingChannel::new();
        handle_ui_message(&mut Actions::new(&mut session.store, &channel), bootstrap, Utc::now());
        Ok(session)
    }

    pub fn state(&self) -> std::sync::Arc<AppState> {
        self.store.state()
    }

    /// Clear an expired sync summary.
    pub fn tick(&mut self) -> bool {
        self.store.tick(Utc::now())
    }

    pub fn handler_mut(&mut self) -> &mut CommandHandler<SqliteDocumentStore> {
        &mut self.handler
    }

    /// Run one action and replicate whatever it emitted.
    pub fn run<T>(
        &mut self,
        action: impl FnOnce(&mut Actions<'_, RecordingChannel>) -> Result<T, Rejection>,
    ) -> Result<T, CoreError> {
        let channel = RecordingChannel::new();
        let value = action(&mut Actions::new(&mut self.store, &channel))?;
        self.flush(&channel)?;
        Ok(value)
    }

    /// Replay reports collected from `update-info` replies.
    pub fn take_reports(&mut self) -> Vec<BatchReport> {
        std::mem::take(&mut self.reports)
    }

    /// Resolve a box argument given either as an id or as a name.
    pub fn resolve_box(&self, key: &str) -> Option<String> {
        let state = self.store.state();
        if state.boxes.contains_key(key) {
            return Some(key.to_string());
        }
        find_box_by_name(&state, key).map(|b| b.id.clone())
    }

    /// Forward recorded commands in order and route the replies back.
    fn flush(&mut self, channel: &RecordingChannel) -> Result<(), CoreError> {
        let commands = channel.take();
        debug!(count = commands.len(), "forwarding commands");
        let store = &mut self.store;
        let reports = &mut self.reports;
        self.handler.handle_in_order(commands, |message| {
            let mut actions = Actions::new(store, channel);
            if let Some(report) = handle_ui_message(&mut actions, message, Utc::now()) {
                reports.push(report);
            }
        })
    }
}
