//! Item commands.

use boxkeeper_core::state::selectors::current_box;
use boxkeeper_core::ChangeOrigin;
use clap::Subcommand;

use super::print_json;
use crate::session::{Paths, Session};

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add an item to a box (created when it does not exist)
    Add {
        /// Item name
        name: String,
        /// Box id or name (default: current box)
        #[arg(long = "box")]
        box_key: Option<String>,
    },
    /// Delete an item
    Delete {
        /// Item ID
        id: String,
    },
    /// Rename an item
    Rename {
        /// Item ID
        id: String,
        /// New name
        name: String,
    },
    /// Toggle the takeout flag of an item
    Takeout {
        /// Item ID
        id: String,
    },
}

pub fn run(paths: &Paths, action: ItemAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(paths)?;
    match action {
        ItemAction::Add { name, box_key } => {
            let box_id = match box_key {
                Some(key) => session.resolve_box(&key).unwrap_or(key),
                None => current_box(&session.state())
                    .map(|b| b.id.clone())
                    .ok_or("no box exists yet; pass --box")?,
            };
            let id = session.run(|actions| actions.add_item(&box_id, &name, ChangeOrigin::Local))?;
            let state = session.state();
            print_json(&serde_json::json!({ "id": id, "box": box_id, "item": state.items.get(&id) }))?;
        }
        ItemAction::Delete { id } => {
            session.run(|actions| actions.delete_item(&id, ChangeOrigin::Local))?;
            println!("deleted {id}");
        }
        ItemAction::Rename { id, name } => {
            session.run(|actions| actions.rename_item(&id, &name, ChangeOrigin::Local))?;
            print_json(&session.state().items.get(&id))?;
        }
        ItemAction::Takeout { id } => {
            let takeout = session.run(|actions| actions.toggle_takeout(&id, ChangeOrigin::Local))?;
            print_json(&serde_json::json!({ "id": id, "takeout": takeout }))?;
        }
    }
    Ok(())
}
