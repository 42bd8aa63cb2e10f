//! Box commands.

use boxkeeper_core::state::selectors::{boxes_by_name, current_box};
use boxkeeper_core::ChangeOrigin;
use clap::Subcommand;

use super::print_json;
use crate::session::{Paths, Session};

#[derive(Subcommand)]
pub enum BoxAction {
    /// Create a box
    Add {
        /// Box name (must be unique)
        name: String,
    },
    /// Rename a box
    Rename {
        /// Box id or current name
        key: String,
        /// New name
        name: String,
    },
    /// Delete an empty box
    Delete {
        /// Box id or name
        key: String,
    },
    /// List boxes in name order
    List,
}

pub fn run(paths: &Paths, action: BoxAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(paths)?;
    match action {
        BoxAction::Add { name } => {
            let id = session.run(|actions| actions.add_box(&name, ChangeOrigin::Local))?;
            print_json(&serde_json::json!({ "id": id, "name": name.trim() }))?;
        }
        BoxAction::Rename { key, name } => {
            let id = session.resolve_box(&key).unwrap_or(key);
            session.run(|actions| actions.rename_box(&id, &name, ChangeOrigin::Local))?;
            print_json(&session.state().boxes.get(&id))?;
        }
        BoxAction::Delete { key } => {
            let id = session.resolve_box(&key).unwrap_or(key);
            let fallback = session.run(|actions| actions.delete_box(&id, ChangeOrigin::Local))?;
            print_json(&serde_json::json!({ "deleted": id, "current": fallback }))?;
        }
        BoxAction::List => {
            let state = session.state();
            let current = current_box(&state).map(|b| b.id.as_str());
            let rows: Vec<serde_json::Value> = boxes_by_name(&state)
                .into_iter()
                .map(|b| {
                    serde_json::json!({
                        "id": b.id,
                        "name": b.name,
                        "items": b.items.len(),
                        "current": current == Some(b.id.as_str()),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
    }
    Ok(())
}
