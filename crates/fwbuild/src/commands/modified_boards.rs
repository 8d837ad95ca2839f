//! Modified-boards command implementation
//!
//! Reports the boards whose hardware definitions are affected by the
//! changes on a branch, one name per line.

use camino::Utf8Path;
use clap::Args;
use miette::{IntoDiagnostic, Result};

use crate::config::Config;
use crate::git::GitClient;
use crate::impact::ImpactAnalyzer;
use crate::process::ProgramRunner;

/// Arguments for the modified-boards command
#[derive(Debug, Args)]
pub struct ModifiedBoardsArgs {
    /// Branch or commit holding the changes (default: the checked-out branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Base branch the changes will merge into
    #[arg(long)]
    pub base: Option<String>,

    /// Compare directly against the base instead of the merge-base commit
    #[arg(long)]
    pub no_merge_base: bool,
}

/// Run the modified-boards command
pub fn run(repo_root: &Utf8Path, args: ModifiedBoardsArgs) -> Result<()> {
    let config = Config::load(repo_root).into_diagnostic()?;

    let runner = ProgramRunner::with_scratch_dir(config.scratch_dir());
    let git = GitClient::with_repo_root(&runner, repo_root);

    let branch = match args.branch {
        Some(branch) => branch,
        None => git.current_branch_or_commit().into_diagnostic()?,
    };
    let base = args
        .base
        .unwrap_or_else(|| config.git.default_branch.clone());

    let analyzer = ImpactAnalyzer::new(&git, repo_root, config.hwdef_dirs(repo_root));
    let boards = analyzer
        .find_modified_boards(&branch, &base, !args.no_merge_base)
        .into_diagnostic()?;

    for board in &boards {
        println!("{board}");
    }

    Ok(())
}
