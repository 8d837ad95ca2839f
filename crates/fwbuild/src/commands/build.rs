//! Build command implementation
//!
//! Thin passthrough to the project's build tool with the reproducible
//! environment applied.

use camino::Utf8Path;
use clap::Args;
use miette::{IntoDiagnostic, Result};

use crate::config::Config;
use crate::process::ProgramRunner;
use crate::waf::{self, WafOptions};

/// Arguments for the build command
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Cross-compiler toolchain to build with
    #[arg(long)]
    pub toolchain: Option<String>,

    /// Arguments forwarded to the build tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Run the build command
pub fn run(repo_root: &Utf8Path, args: BuildArgs) -> Result<()> {
    let config = Config::load(repo_root).into_diagnostic()?;
    let runner = ProgramRunner::with_scratch_dir(config.scratch_dir());

    let waf_args: Vec<&str> = args.args.iter().map(String::as_str).collect();
    let options = WafOptions {
        toolchain: args.toolchain,
        cwd: Some(repo_root.to_path_buf()),
        ..WafOptions::default()
    };

    waf::run_waf(&runner, &waf_args, &options).into_diagnostic()?;
    Ok(())
}
