use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod session;

use session::Paths;

#[derive(Parser)]
#[command(name = "boxkeeper-cli", version, about = "Boxkeeper CLI")]
struct Cli {
    /// Document store file (default: ~/.config/boxkeeper/boxkeeper.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Configuration file (default: ~/.config/boxkeeper/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Item management
    Item {
        #[command(subcommand)]
        action: commands::item::ItemAction,
    },
    /// Box management
    #[command(name = "box")]
    Boxes {
        #[command(subcommand)]
        action: commands::boxes::BoxAction,
    },
    /// Remote synchronization
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Print the bootstrapped store state as JSON
    State,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BOXKEEPER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let paths = Paths {
        db: cli.db,
        config: cli.config,
    };
    let result = match cli.command {
        Commands::Item { action } => commands::item::run(&paths, action),
        Commands::Boxes { action } => commands::boxes::run(&paths, action),
        Commands::Sync { action } => commands::sync::run(&paths, action),
        Commands::State => commands::state::run(&paths),
        Commands::Config { action } => commands::config::run(&paths, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
