//! talefetch command-line interface
//!
//! Thin composition root over the download engine: builds the client,
//! stores, and orchestrator explicitly and wires events to the
//! terminal.

mod commands;
mod manifest;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "talefetch", version, about = "Audiobook chapter downloader")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download every chapter listed in a book manifest
    Download {
        /// Path to the book manifest JSON
        #[arg(long)]
        manifest: PathBuf,
        /// Directory books are saved under (defaults to the current
        /// directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the known publisher sources
    Sources,
    /// Check whether a site is reachable
    Probe {
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Download { manifest, output } => commands::download(manifest, output).await,
        Command::Sources => commands::sources(),
        Command::Probe { url } => commands::probe(&url).await,
    }
}
