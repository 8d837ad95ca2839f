//! Hardware-definition include resolution
//!
//! Hardware-definition files are line-oriented: a line of the form
//! `include <relative-path>` pulls in another fragment, resolved relative
//! to the including file's directory. This module follows those directives
//! transitively to compute the full set of files a board definition
//! depends on, and provides the changed-path filter used by impact
//! analysis.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{Error, Result};

/// File-name suffixes recognized as hardware definitions
pub const HWDEF_SUFFIXES: &[&str] = &["hwdef.dat", "hwdef.inc", "hwdef-bl.dat", "hwdef-bl.inc"];

/// True when a repository-relative path names a hardware-definition file:
/// the path carries a `hwdef` segment (the definition file name itself
/// counts) and the file name ends with a recognized suffix.
pub fn is_hwdef_change(path: &str) -> bool {
    let candidate = Utf8Path::new(path);
    let Some(file_name) = candidate.file_name() else {
        return false;
    };
    if !HWDEF_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
    {
        return false;
    }
    candidate
        .components()
        .any(|component| component.as_str().contains("hwdef"))
}

/// Canonicalize a path, with a lexical fallback for paths that no longer
/// exist: the canonical parent plus the file name, then the path unchanged.
/// Keeps visited-set and intersection membership consistent for files
/// deleted on a branch.
pub fn canonicalize_lenient(path: &Utf8Path) -> Utf8PathBuf {
    if let Ok(canonical) = path.canonicalize_utf8() {
        return canonical;
    }
    if let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) {
        if let Ok(parent) = parent.canonicalize_utf8() {
            return parent.join(file_name);
        }
    }
    path.to_path_buf()
}

/// Resolve the transitive include set of a hardware-definition file.
///
/// The returned set contains the canonicalized root and every file
/// reachable through `include` directives, each exactly once. Cyclic or
/// repeated includes degrade to inclusion-without-duplication. A file that
/// does not exist contributes nothing, so optional definitions (bootloader
/// files in particular) resolve to an empty set rather than an error.
pub fn collect_includes(path: &Utf8Path) -> Result<HashSet<Utf8PathBuf>> {
    let mut visited = HashSet::new();
    collect_into(path, &mut visited)
}

fn collect_into(
    path: &Utf8Path,
    visited: &mut HashSet<Utf8PathBuf>,
) -> Result<HashSet<Utf8PathBuf>> {
    let path = canonicalize_lenient(path);

    // Mark visited before reading: a file that includes itself is mid-
    // expansion when the recursive call sees it, and must contribute once.
    if !visited.insert(path.clone()) {
        return Ok(HashSet::new());
    }

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(HashSet::new());
        }
        Err(error) => return Err(error.into()),
    };

    let dir = path.parent().ok_or_else(|| {
        Error::hwdef(
            format!("Invalid hwdef path: {path}"),
            "Path has no parent directory",
        )
    })?;

    let mut found = HashSet::new();
    found.insert(path.clone());

    for line in content.lines() {
        let Some(argument) = include_argument(line) else {
            continue;
        };
        found.extend(collect_into(&dir.join(argument), visited)?);
    }

    Ok(found)
}

/// Parse a line as an `include` directive and return its argument: the
/// literal word `include`, at least one whitespace character, and a
/// non-empty remainder. Anything else (comments, other directives,
/// malformed lines) fails the match silently.
fn include_argument(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("include")?;
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let argument = rest.trim();
    if argument.is_empty() { None } else { Some(argument) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        utf8(&path)
    }

    #[test]
    fn test_include_argument_matching() {
        assert_eq!(include_argument("include foo.inc"), Some("foo.inc"));
        assert_eq!(include_argument("  include \t ../common.inc  "), Some("../common.inc"));
        assert_eq!(include_argument("include"), None);
        assert_eq!(include_argument("include   "), None);
        assert_eq!(include_argument("includefoo.inc"), None);
        assert_eq!(include_argument("# include foo.inc"), None);
        assert_eq!(include_argument("PA0 UART4_TX UART4"), None);
    }

    #[test]
    fn test_union_of_transitive_includes() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.dat", "include b.inc\ninclude c.inc\n");
        let b = write(&dir, "b.inc", "include d.inc\n");
        let c = write(&dir, "c.inc", "PA0 UART4_TX UART4\n");
        let d = write(&dir, "d.inc", "");

        let includes = collect_includes(&a).unwrap();

        let expected: HashSet<_> = [&a, &b, &c, &d]
            .into_iter()
            .map(|p| canonicalize_lenient(p))
            .collect();
        assert_eq!(includes, expected);
    }

    #[test]
    fn test_includes_resolve_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        let root = write(&dir, "boards/x/hwdef.dat", "include ../../common/mcu.inc\n");
        let common = write(&dir, "common/mcu.inc", "");

        let includes = collect_includes(&root).unwrap();
        assert!(includes.contains(&canonicalize_lenient(&common)));
        assert_eq!(includes.len(), 2);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.dat", "include b.inc\n");
        write(&dir, "b.inc", "");

        let first = collect_includes(&a).unwrap();
        let second = collect_includes(&a).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_self_include_terminates() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.dat", "include a.dat\n");

        let includes = collect_includes(&a).unwrap();
        assert_eq!(includes.len(), 1);
        assert!(includes.contains(&canonicalize_lenient(&a)));
    }

    #[test]
    fn test_include_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.dat", "include b.inc\n");
        let b = write(&dir, "b.inc", "include a.dat\n");

        let includes = collect_includes(&a).unwrap();
        let expected: HashSet<_> = [&a, &b]
            .into_iter()
            .map(|p| canonicalize_lenient(p))
            .collect();
        assert_eq!(includes, expected);
    }

    #[test]
    fn test_diamond_includes_deduplicate() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.dat", "include b.inc\ninclude c.inc\n");
        write(&dir, "b.inc", "include d.inc\n");
        write(&dir, "c.inc", "include d.inc\n");
        write(&dir, "d.inc", "");

        let includes = collect_includes(&a).unwrap();
        assert_eq!(includes.len(), 4);
    }

    #[test]
    fn test_missing_root_yields_empty_set() {
        let dir = TempDir::new().unwrap();
        let missing = utf8(&dir.path().join("hwdef-bl.dat"));

        let includes = collect_includes(&missing).unwrap();
        assert!(includes.is_empty());
    }

    #[test]
    fn test_missing_include_is_skipped() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.dat", "include gone.inc\ninclude b.inc\n");
        let b = write(&dir, "b.inc", "");

        let includes = collect_includes(&a).unwrap();
        let expected: HashSet<_> = [&a, &b]
            .into_iter()
            .map(|p| canonicalize_lenient(p))
            .collect();
        assert_eq!(includes, expected);
    }

    #[test]
    fn test_hwdef_change_filter() {
        assert!(is_hwdef_change("boards/Foo/hwdef.dat"));
        assert!(is_hwdef_change("boards/Foo/hwdef-bl.dat"));
        assert!(is_hwdef_change("boards/common/hwdef.inc"));
        assert!(is_hwdef_change("boards/common/hwdef-bl.inc"));

        assert!(!is_hwdef_change("boards/Foo/notes.txt"));
        assert!(!is_hwdef_change("docs/hwdef/readme.md"));
        assert!(!is_hwdef_change(""));
    }
}
