//! Submission normalizer CLI.
//!
//! `subnorm run <archive> <root>` takes a batch of student submissions
//! delivered as a single zip and normalizes it in place: nested archives
//! expanded, junk deleted, misnamed directories repaired, notebooks
//! converted to Python scripts. Each stage is also exposed as its own
//! subcommand for inspecting a tree one step at a time.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use subnorm::config::load_config;
use subnorm::{logging, pipeline, stages};

const DEFAULT_CONFIG_PATH: &str = "subnorm.toml";

#[derive(Parser)]
#[command(
    name = "subnorm",
    version,
    about = "Normalize a batch of student assignment submissions"
)]
struct Cli {
    /// TOML config overriding strip rules and conversion defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: expand, clean, repair, convert.
    Run {
        /// Top-level submissions archive.
        archive: PathBuf,
        /// Working root directory, created if absent.
        root: PathBuf,
    },
    /// Extract the top-level archive and all nested submission archives.
    Expand { archive: PathBuf, root: PathBuf },
    /// Delete rendered documents, OS metadata files and junk directories.
    Clean { root: PathBuf },
    /// Rename or merge directories carrying the notebook extension.
    Repair { root: PathBuf },
    /// Convert every notebook under the root to a sibling script.
    Convert { root: PathBuf },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = load_config(&config_path)?;

    match cli.command {
        Command::Run { archive, root } => pipeline::run(&archive, &root, &config),
        Command::Expand { archive, root } => stages::expand::expand(&archive, &root, &config),
        Command::Clean { root } => stages::clean::clean(&root, &config),
        Command::Repair { root } => stages::repair::repair(&root),
        Command::Convert { root } => {
            stages::convert::convert(&root, &config)?;
            Ok(())
        }
    }
}
