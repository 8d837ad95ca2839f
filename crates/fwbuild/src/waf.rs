//! Build-tool invocation with a reproducible environment
//!
//! This module wraps the project's `waf` build tool. Version-marker
//! environment variables are pinned to fixed placeholder values so that
//! repeated builds of the same tree produce identical binaries regardless
//! of version-control state, and an optional cross-compiler toolchain can
//! be selected by name.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::process::{ProgramRunner, RunOptions};
use crate::{Error, Result};

/// Environment variables pinned so repeated builds produce identical output
pub const PINNED_VERSION_ENV: &[(&str, &str)] = &[
    ("CHIBIOS_GIT_VERSION", "12345678"),
    ("GIT_VERSION", "abcdef"),
    ("GIT_VERSION_EXTENDED", "0123456789abcdef"),
    ("GIT_VERSION_INT", "15"),
];

/// Override for the cross-compiler toolchain installation root
pub const TOOLCHAIN_HOME_ENV: &str = "FWBUILD_GCC_HOME";

/// Toolchain directory under `$HOME` used when no override is set
const DEFAULT_TOOLCHAIN_DIR: &str = "arm-gcc";

/// Label prefix for streamed build-tool output
const WAF_LABEL: &str = "waf";

/// Options for a build-tool invocation
#[derive(Debug, Clone, Default)]
pub struct WafOptions {
    /// Cross-compiler toolchain name under the toolchain root
    pub toolchain: Option<String>,
    /// Working directory for the build (default: current directory)
    pub cwd: Option<Utf8PathBuf>,
    /// Suppress live output echoing
    pub quiet: bool,
}

/// Invoke the build tool with the given arguments.
///
/// The important output of a build is already streamed while it runs, so
/// only success or failure is reported back.
pub fn run_waf(runner: &ProgramRunner, args: &[&str], options: &WafOptions) -> Result<()> {
    let base: HashMap<String, String> = std::env::vars().collect();
    let env = build_environment(&base, options.toolchain.as_deref())?;

    let cwd = options
        .cwd
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from("."));
    let waf = locate_waf(&cwd);

    let run_options = RunOptions {
        show_output: !options.quiet,
        cwd: Some(cwd),
        env: Some(env),
        ..RunOptions::default()
    };
    runner.run(WAF_LABEL, waf.as_str(), args, &run_options)?;
    Ok(())
}

/// Locate the build-tool entry point relative to the working directory,
/// preferring a local `waf` wrapper over the copy inside the submodule.
pub fn locate_waf(cwd: &Utf8Path) -> Utf8PathBuf {
    if cwd.join("waf").exists() {
        Utf8PathBuf::from("./waf")
    } else {
        Utf8PathBuf::from("./modules/waf/waf-light")
    }
}

/// Compute the child environment for a build-tool invocation.
///
/// Starts from the `base` snapshot, pins the build-identity variables, and
/// wires in the requested cross-compiler toolchain: the toolchain root
/// comes from [`TOOLCHAIN_HOME_ENV`] or falls back to `$HOME/arm-gcc`, its
/// `bin` directory is prepended to `PATH`, and `CC`/`CXX` are routed
/// through ccache. The snapshot is only ever handed to the child process;
/// the calling process environment is never mutated.
pub fn build_environment(
    base: &HashMap<String, String>,
    toolchain: Option<&str>,
) -> Result<HashMap<String, String>> {
    let mut env = base.clone();
    for (name, value) in PINNED_VERSION_ENV {
        env.insert((*name).to_string(), (*value).to_string());
    }

    let Some(toolchain) = toolchain else {
        return Ok(env);
    };

    let toolchain_home = match env.get(TOOLCHAIN_HOME_ENV) {
        Some(root) => Utf8PathBuf::from(root),
        None => {
            let home = env.get("HOME").ok_or_else(|| {
                Error::config(
                    "HOME is not set",
                    format!("Set {TOOLCHAIN_HOME_ENV} to the toolchain installation root"),
                )
            })?;
            Utf8PathBuf::from(home).join(DEFAULT_TOOLCHAIN_DIR)
        }
    };

    let gcc_bin = toolchain_home.join(toolchain).join("bin");
    if !gcc_bin.exists() {
        return Err(Error::config(
            format!("Missing compiler toolchain at {gcc_bin}"),
            format!(
                "Install the {toolchain} toolchain there or point {TOOLCHAIN_HOME_ENV} at its installation root"
            ),
        ));
    }

    let path = env.get("PATH").cloned().unwrap_or_default();
    env.insert("PATH".to_string(), format!("{gcc_bin}:{path}"));
    env.insert("CC".to_string(), "ccache arm-none-eabi-gcc".to_string());
    env.insert("CXX".to_string(), "ccache arm-none-eabi-g++".to_string());

    Ok(env)
}
