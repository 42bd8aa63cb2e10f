use boxkeeper_core::Config;
use clap::Subcommand;

use crate::session::Paths;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-path key (e.g. "language", "sync.interval_secs")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-path key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(paths: &Paths, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let (config, _) = paths.load_config()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let (mut config, path) = paths.load_config()?;
            config.set(&key, &value)?;
            config.save_to(&path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let (config, _) = paths.load_config()?;
            for (key, value) in config.entries() {
                if key == "sync.personal_access_token" && !value.is_empty() {
                    println!("{key} = <set>");
                } else {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            let path = paths.config_path()?;
            Config::default().save_to(&path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
