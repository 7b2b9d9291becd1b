mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{add, init, inspect, set, AddArgs, InitArgs, InspectArgs, SetArgs};
use std::path::PathBuf;
use tessera_editor::EditorConfig;
use tracing_subscriber::EnvFilter;

/// Tessera CLI - inspect and edit prefab documents in place
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log editor internals (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory containing tessera.config.json (defaults to the current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default tessera.config.json
    Init(InitArgs),

    /// Show a document's metadata, entities and byte ranges
    Inspect(InspectArgs),

    /// Set one property on an entity
    Set(SetArgs),

    /// Add an entity
    Add(AddArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let config = || EditorConfig::load(&config_dir);
    match cli.command {
        Command::Init(args) => init(args, &config_dir),
        Command::Inspect(args) => inspect(args, &config()?),
        Command::Set(args) => set(args, &config()?),
        Command::Add(args) => add(args, &config()?),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
