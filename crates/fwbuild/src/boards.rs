//! Board registry discovery
//!
//! Boards are defined by the filesystem: each subdirectory of a
//! hardware-definition root that contains a `hwdef.dat` is a buildable
//! board target, named after the subdirectory.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::{Error, Result};

/// A buildable board target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Board name, matching its hwdef directory
    pub name: String,
}

/// The set of known boards and the definition roots they were found under
#[derive(Debug)]
pub struct BoardRegistry {
    /// Discovered boards
    pub boards: Vec<Board>,

    /// Hardware-definition root directories to search
    pub hwdef_dirs: Vec<Utf8PathBuf>,
}

impl BoardRegistry {
    /// Discover boards under the given hardware-definition roots.
    ///
    /// Roots that do not exist are skipped. A board name appearing under
    /// several roots is kept once, for the first root that defines it.
    pub fn discover(hwdef_dirs: &[Utf8PathBuf]) -> Result<Self> {
        let mut boards = Vec::new();
        let mut seen = HashSet::new();

        for dir in hwdef_dirs {
            if !dir.exists() {
                tracing::debug!("Skipping missing hwdef root {dir}");
                continue;
            }

            for entry in WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| {
                    Error::registry(
                        format!("Failed to read directory entry: {e}"),
                        "Check directory permissions",
                    )
                })?;

                if !entry.file_type().is_dir() {
                    continue;
                }

                let path = Utf8Path::from_path(entry.path()).ok_or_else(|| {
                    Error::registry(
                        format!("Path is not valid UTF-8: {:?}", entry.path()),
                        "Ensure all board directory names are valid UTF-8",
                    )
                })?;

                if !path.join("hwdef.dat").is_file() {
                    continue;
                }

                let Some(name) = path.file_name() else {
                    continue;
                };

                if seen.insert(name.to_string()) {
                    tracing::debug!(board = name, "Discovered board");
                    boards.push(Board {
                        name: name.to_string(),
                    });
                } else {
                    tracing::debug!(board = name, "Duplicate board name; keeping first");
                }
            }
        }

        Ok(Self {
            boards,
            hwdef_dirs: hwdef_dirs.to_vec(),
        })
    }
}
