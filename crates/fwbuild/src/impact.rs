//! Board impact analysis
//!
//! Maps hardware-definition changes between two version-control references
//! to the set of boards whose builds are affected: the changed files are
//! filtered to hwdef paths, every known board's main (and, when present,
//! bootloader) definition is resolved to its transitive include set, and a
//! board is reported when the two sets intersect.

use std::collections::{BTreeSet, HashSet};

use camino::{Utf8Path, Utf8PathBuf};

use crate::Result;
use crate::boards::BoardRegistry;
use crate::git::GitClient;
use crate::hwdef::{self, canonicalize_lenient, collect_includes};

/// Resolves which boards are affected by hwdef changes between two refs
pub struct ImpactAnalyzer<'a> {
    git: &'a GitClient<'a>,
    repo_root: Utf8PathBuf,
    hwdef_dirs: Vec<Utf8PathBuf>,
}

impl<'a> ImpactAnalyzer<'a> {
    /// Create an analyzer for the given repository and hwdef roots
    pub fn new(
        git: &'a GitClient<'a>,
        repo_root: impl AsRef<Utf8Path>,
        hwdef_dirs: Vec<Utf8PathBuf>,
    ) -> Self {
        Self {
            git,
            repo_root: repo_root.as_ref().to_path_buf(),
            hwdef_dirs,
        }
    }

    /// Repository-relative hwdef paths changed between `branch` and `base`.
    ///
    /// The comparison base is the merge-base commit of the two references
    /// when `use_merge_base` is set, otherwise `base` itself.
    pub fn modified_hwdef_paths(
        &self,
        branch: &str,
        base: &str,
        use_merge_base: bool,
    ) -> Result<BTreeSet<String>> {
        let base_commit = if use_merge_base {
            self.git.merge_base(branch, base)?
        } else {
            base.to_string()
        };

        let changed = self.git.changed_files(&base_commit, branch)?;
        Ok(changed
            .into_iter()
            .filter(|path| hwdef::is_hwdef_change(path))
            .collect())
    }

    /// Boards whose main or bootloader definition depends on a changed
    /// file, sorted case-insensitively.
    pub fn find_modified_boards(
        &self,
        branch: &str,
        base: &str,
        use_merge_base: bool,
    ) -> Result<Vec<String>> {
        let changed = self.modified_hwdef_paths(branch, base, use_merge_base)?;
        if changed.is_empty() {
            // Nothing to intersect; the board registry is never consulted.
            return Ok(Vec::new());
        }

        for path in &changed {
            tracing::info!("Modified hwdef: {path}");
        }

        let changed_abs: HashSet<Utf8PathBuf> = changed
            .iter()
            .map(|path| canonicalize_lenient(&self.repo_root.join(path)))
            .collect();

        let registry = BoardRegistry::discover(&self.hwdef_dirs)?;
        boards_affected(&registry, &changed_abs)
    }
}

/// Intersect every board's transitive include set with the changed files.
///
/// A board is checked against each hwdef root in turn; the first root whose
/// definition matches records the board and ends the search for it, so a
/// board is never reported twice.
pub fn boards_affected(
    registry: &BoardRegistry,
    changed: &HashSet<Utf8PathBuf>,
) -> Result<Vec<String>> {
    let mut modified = Vec::new();

    for board in &registry.boards {
        for dir in &registry.hwdef_dirs {
            let board_dir = dir.join(&board.name);
            let main = board_dir.join("hwdef.dat");
            if !main.exists() {
                continue;
            }

            let mut includes = collect_includes(&main)?;
            let bootloader = board_dir.join("hwdef-bl.dat");
            if bootloader.exists() {
                includes.extend(collect_includes(&bootloader)?);
            }

            if !includes.is_disjoint(changed) {
                tracing::info!("Board {} uses a modified hwdef", board.name);
                modified.push(board.name.clone());
                break;
            }
        }
    }

    modified.sort_by_key(|name| name.to_lowercase());
    Ok(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::Board;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn write(root: &std::path::Path, relative: &str, content: &str) -> Utf8PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        utf8(&path)
    }

    fn registry_for(root: &TempDir, names: &[&str]) -> BoardRegistry {
        BoardRegistry {
            boards: names
                .iter()
                .map(|name| Board {
                    name: (*name).to_string(),
                })
                .collect(),
            hwdef_dirs: vec![utf8(root.path())],
        }
    }

    fn changed_set(paths: &[&Utf8PathBuf]) -> HashSet<Utf8PathBuf> {
        paths
            .iter()
            .map(|path| canonicalize_lenient(path))
            .collect()
    }

    #[test]
    fn test_board_with_changed_include_is_reported() {
        let root = TempDir::new().unwrap();
        write(root.path(), "x/hwdef.dat", "include ../common/mcu.inc\n");
        let common = write(root.path(), "common/mcu.inc", "");

        let registry = registry_for(&root, &["x"]);
        let modified = boards_affected(&registry, &changed_set(&[&common])).unwrap();

        assert_eq!(modified, vec!["x"]);
    }

    #[test]
    fn test_unrelated_board_is_not_reported() {
        let root = TempDir::new().unwrap();
        write(root.path(), "x/hwdef.dat", "include ../common/mcu.inc\n");
        write(root.path(), "common/mcu.inc", "");
        write(root.path(), "y/hwdef.dat", "PA0 UART4_TX UART4\n");
        let other = write(root.path(), "common/other.inc", "");

        let registry = registry_for(&root, &["x", "y"]);
        let modified = boards_affected(&registry, &changed_set(&[&other])).unwrap();

        assert!(modified.is_empty());
    }

    #[test]
    fn test_directly_changed_main_definition_is_reported() {
        let root = TempDir::new().unwrap();
        let main = write(root.path(), "x/hwdef.dat", "PA0 UART4_TX UART4\n");

        let registry = registry_for(&root, &["x"]);
        let modified = boards_affected(&registry, &changed_set(&[&main])).unwrap();

        assert_eq!(modified, vec!["x"]);
    }

    #[test]
    fn test_bootloader_only_change_is_reported() {
        let root = TempDir::new().unwrap();
        write(root.path(), "x/hwdef.dat", "PA0 UART4_TX UART4\n");
        write(root.path(), "x/hwdef-bl.dat", "include ../common/bl.inc\n");
        let bl_common = write(root.path(), "common/bl.inc", "");

        let registry = registry_for(&root, &["x"]);
        let modified = boards_affected(&registry, &changed_set(&[&bl_common])).unwrap();

        assert_eq!(modified, vec!["x"]);
    }

    #[test]
    fn test_result_is_sorted_case_insensitively() {
        let root = TempDir::new().unwrap();
        write(root.path(), "zeta/hwdef.dat", "include ../common/mcu.inc\n");
        write(root.path(), "Alpha/hwdef.dat", "include ../common/mcu.inc\n");
        let common = write(root.path(), "common/mcu.inc", "");

        // Registry iteration order must not matter.
        let registry = registry_for(&root, &["zeta", "Alpha"]);
        let modified = boards_affected(&registry, &changed_set(&[&common])).unwrap();

        assert_eq!(modified, vec!["Alpha", "zeta"]);
    }

    #[test]
    fn test_board_matched_once_across_multiple_roots() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let first_main = write(first.path(), "x/hwdef.dat", "");
        let second_main = write(second.path(), "x/hwdef.dat", "");

        let registry = BoardRegistry {
            boards: vec![Board {
                name: "x".to_string(),
            }],
            hwdef_dirs: vec![utf8(first.path()), utf8(second.path())],
        };

        let modified =
            boards_affected(&registry, &changed_set(&[&first_main, &second_main])).unwrap();
        assert_eq!(modified, vec!["x"]);
    }

    #[test]
    fn test_board_without_definition_in_first_root_uses_next() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let main = write(second.path(), "x/hwdef.dat", "");

        let registry = BoardRegistry {
            boards: vec![Board {
                name: "x".to_string(),
            }],
            hwdef_dirs: vec![utf8(first.path()), utf8(second.path())],
        };

        let modified = boards_affected(&registry, &changed_set(&[&main])).unwrap();
        assert_eq!(modified, vec!["x"]);
    }
}
