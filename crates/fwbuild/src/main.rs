//! fwbuild CLI - firmware build-automation utilities

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fwbuild::commands;

/// fwbuild - firmware build-automation utilities
#[derive(Debug, Parser)]
#[command(name = "fwbuild")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root directory
    #[arg(short = 'C', long, global = true)]
    repo: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report boards whose hardware definitions changed on a branch
    ModifiedBoards(commands::modified_boards::ModifiedBoardsArgs),

    /// Invoke the build tool with a reproducible environment
    Build(commands::build::BuildArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Determine repository root
    let repo_root = if let Some(ref path) = cli.repo {
        camino::Utf8PathBuf::from(path)
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|p| camino::Utf8PathBuf::try_from(p).ok())
            .unwrap_or_else(|| camino::Utf8PathBuf::from("."))
    };

    match cli.command {
        Commands::ModifiedBoards(args) => commands::modified_boards::run(&repo_root, args),
        Commands::Build(args) => commands::build::run(&repo_root, args),
    }
}
