//! TileVault CLI - command-line interface
//!
//! Provides `tree`, `upload`, and `delete` subcommands over a
//! directory-backed tile catalog.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tilevault", version = tilevault::VERSION)]
#[command(about = "Manage a sparse map-tile catalog")]
struct Cli {
    /// Catalog root directory (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tile hierarchy
    Tree,
    /// Upload tile images named {z}-{x}-{y}.png into the catalog
    Upload {
        /// Image files to upload
        files: Vec<PathBuf>,
    },
    /// Delete tiles by coordinate key: z, z-x, or z-x-y
    Delete {
        /// Selection keys; nested selections are minimized automatically
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging failure is not fatal for a CLI run; commands print their own output
    let _guard = tilevault::logging::init_logging("logs", "tilevault.log").ok();

    let config = CliConfig::load();
    let root = cli.root.unwrap_or_else(|| config.root.clone());

    let result: Result<(), CliError> = match cli.command {
        Command::Tree => commands::tree::run(&root).await,
        Command::Upload { files } => commands::upload::run(&root, config.drain_policy, files).await,
        Command::Delete { keys } => commands::delete::run(&root, keys).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
