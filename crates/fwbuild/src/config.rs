//! Configuration file parsing
//!
//! This module handles parsing of the `fwbuild.toml` file at the
//! repository root. Every section and field is optional; a missing file
//! yields the default configuration.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Main configuration structure for fwbuild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hardware-definition settings
    pub hwdef: HwdefConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Version-control settings
    pub git: GitConfig,
}

/// Hardware-definition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HwdefConfig {
    /// Definition root directories, relative to the repository root
    pub dirs: Vec<Utf8PathBuf>,
}

impl Default for HwdefConfig {
    fn default() -> Self {
        Self {
            dirs: vec![Utf8PathBuf::from("boards")],
        }
    }
}

/// Build configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory for process failure reports (default: the system temp dir)
    pub scratch_dir: Option<Utf8PathBuf>,
}

/// Version-control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Branch that changes are compared against by default
    pub default_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: "master".to_string(),
        }
    }
}

impl Config {
    /// Load `fwbuild.toml` from the repository root, or defaults if absent.
    pub fn load(repo_root: &Utf8Path) -> Result<Self> {
        let path = repo_root.join("fwbuild.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Load configuration from a string (for testing)
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Scratch directory for failure reports
    pub fn scratch_dir(&self) -> Utf8PathBuf {
        self.build.scratch_dir.clone().unwrap_or_else(|| {
            Utf8PathBuf::from_path_buf(std::env::temp_dir())
                .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
        })
    }

    /// Hardware-definition roots resolved against the repository root
    pub fn hwdef_dirs(&self, repo_root: &Utf8Path) -> Vec<Utf8PathBuf> {
        self.hwdef
            .dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    repo_root.join(dir)
                }
            })
            .collect()
    }
}
