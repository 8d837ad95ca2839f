//! Version-control queries used by the build scripts

use camino::{Utf8Path, Utf8PathBuf};

use crate::Result;
use crate::process::{ProgramRunner, RunOptions};

/// Label prefix for streamed git output
const GIT_LABEL: &str = "git";

/// Thin wrapper around the `git` command line
///
/// All operations delegate to the shared [`ProgramRunner`] with a fixed
/// label and no special environment. Live output is suppressed since these
/// are short queries, not builds; on failure the captured output is shown.
pub struct GitClient<'a> {
    runner: &'a ProgramRunner,
    repo_root: Option<Utf8PathBuf>,
}

impl<'a> GitClient<'a> {
    /// Create a client operating in the current directory
    pub fn new(runner: &'a ProgramRunner) -> Self {
        Self {
            runner,
            repo_root: None,
        }
    }

    /// Create a client operating in the given repository
    pub fn with_repo_root(runner: &'a ProgramRunner, repo_root: impl AsRef<Utf8Path>) -> Self {
        Self {
            runner,
            repo_root: Some(repo_root.as_ref().to_path_buf()),
        }
    }

    /// Run git with the given arguments and return its trimmed output.
    fn run(&self, args: &[&str], show_output_on_error: bool) -> Result<String> {
        let options = RunOptions {
            show_output: false,
            show_output_on_error,
            cwd: self.repo_root.clone(),
            ..RunOptions::default()
        };
        let output = self.runner.run(GIT_LABEL, "git", args, &options)?;
        Ok(output.trim().to_string())
    }

    /// Short symbolic name of the checked-out branch, or the short commit
    /// hash when the repository is in a detached-HEAD state.
    pub fn current_branch_or_commit(&self) -> Result<String> {
        match self.run(&["symbolic-ref", "--short", "HEAD"], false) {
            Ok(branch) => Ok(branch),
            // Probably a detached HEAD; report the commit hash instead.
            Err(_) => self.run(&["rev-parse", "--short", "HEAD"], true),
        }
    }

    /// Most recent common ancestor commit of two references.
    pub fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        self.run(&["merge-base", a, b], true)
    }

    /// Repository-relative paths differing between two references.
    ///
    /// Name-only diff: rename and copy details are ignored.
    pub fn changed_files(&self, base: &str, target: &str) -> Result<Vec<String>> {
        let output = self.run(&["diff", "--name-only", base, target], true)?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
