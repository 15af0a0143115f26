//! Working out which backend owns a directory, and finding repositories.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;
use walkdir::WalkDir;

use crate::backend::Backend;
use crate::error::VcsError;
use crate::error::VcsResult;
use crate::registry::Registry;
use crate::repository::Repository;

/// The first registered backend whose marker is present in `directory`.
pub fn detect(registry: &Registry, directory: &Path) -> Option<Arc<dyn Backend>> {
    registry.backends().find(|b| b.detect(directory)).cloned()
}

/// Open `directory` with its detected backend, or with `hint` if nothing is
/// detected (e.g. before `init` or `clone`).
pub fn load(registry: &Registry, directory: &Path, hint: Option<&str>) -> VcsResult<Repository> {
    if let Some(backend) = detect(registry, directory) {
        return Ok(Repository::new(backend, directory));
    }
    match hint {
        Some(type_id) => registry.open(type_id, directory),
        None => Err(VcsError::no_repository(directory)),
    }
}

/// Every repository at or below `directory`.
///
/// `directory` itself comes first if it is a repository; the order of the
/// rest follows the walk. Marker directories are not descended into, but a
/// working copy's other subdirectories are, so nested repositories are
/// reported too. Each call walks the tree afresh.
pub fn find<'a>(
    registry: &'a Registry,
    directory: &Path,
) -> impl Iterator<Item = Repository> + use<'a> {
    let markers: Vec<&'static str> = registry
        .backends()
        .filter_map(|b| b.descriptor().marker)
        .collect();

    WalkDir::new(directory)
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| markers.iter().any(|m| *m == name))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(move |entry| {
            detect(registry, entry.path()).map(|backend| Repository::new(backend, entry.path()))
        })
}

/// The nearest directory at or above `directory` that is a repository.
///
/// `directory` is canonicalized first, so `..` components and symlinks are
/// resolved before walking up. A path that does not exist is only made
/// absolute.
pub fn root(registry: &Registry, directory: &Path) -> Option<PathBuf> {
    let start = directory
        .canonicalize()
        .or_else(|_| std::path::absolute(directory))
        .unwrap_or_else(|_| directory.to_path_buf());
    start
        .ancestors()
        .find(|dir| detect(registry, dir).is_some())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use super::*;
    use crate::config::Config;

    fn plant(dir: &Path, marker: &str) {
        fs::create_dir_all(dir.join(marker)).unwrap();
    }

    fn registry() -> Registry {
        Registry::builtin(&Config::default())
    }

    #[test]
    fn test_detect_each_marker() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry();
        for (type_id, marker) in [("git", ".git"), ("hg", ".hg"), ("bzr", ".bzr"), ("darcs", "_darcs")] {
            let dir = temp.path().join(type_id);
            plant(&dir, marker);
            assert_eq!(detect(&registry, &dir).unwrap().type_id(), type_id);
        }
        assert!(detect(&registry, temp.path()).is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let temp = tempfile::tempdir().unwrap();
        plant(temp.path(), ".hg");
        plant(temp.path(), ".git");

        assert_eq!(detect(&registry(), temp.path()).unwrap().type_id(), "git");
    }

    #[test]
    fn test_load_prefers_detection_over_hint() {
        let temp = tempfile::tempdir().unwrap();
        plant(temp.path(), ".hg");

        let repo = load(&registry(), temp.path(), Some("git")).unwrap();
        assert_eq!(repo.type_id(), "hg");
    }

    #[test]
    fn test_load_with_hint_for_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("not-yet");

        let repo = load(&registry(), &target, Some("bzr")).unwrap();
        assert_eq!(repo.type_id(), "bzr");
        assert_eq!(repo.directory(), target.as_path());
        assert!(!repo.is_detected());
    }

    #[test]
    fn test_load_errors() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry();

        let err = load(&registry, temp.path(), None).unwrap_err();
        assert!(matches!(err, VcsError::NoRepositoryFound(_)));

        let err = load(&registry, temp.path(), Some("cvs")).unwrap_err();
        assert!(matches!(err, VcsError::UnknownBackendType(id) if id == "cvs"));
    }

    #[test]
    fn test_find_one_per_planted_repository() {
        let temp = tempfile::tempdir().unwrap();
        plant(&temp.path().join("a/git-repo"), ".git");
        plant(&temp.path().join("b/hg-repo"), ".hg");
        plant(&temp.path().join("b/deeper/bzr-repo"), ".bzr");
        plant(&temp.path().join("darcs-repo"), "_darcs");
        fs::create_dir_all(temp.path().join("c/not-a-repo")).unwrap();

        let found: BTreeSet<(String, PathBuf)> = find(&registry(), temp.path())
            .map(|r| (r.type_id().to_string(), r.directory().to_path_buf()))
            .collect();

        let expected: BTreeSet<(String, PathBuf)> = [
            ("git", "a/git-repo"),
            ("hg", "b/hg-repo"),
            ("bzr", "b/deeper/bzr-repo"),
            ("darcs", "darcs-repo"),
        ]
        .into_iter()
        .map(|(t, p)| (t.to_string(), temp.path().join(p)))
        .collect();

        assert_eq!(found, expected);
    }

    #[test]
    fn test_find_yields_start_directory_first() {
        let temp = tempfile::tempdir().unwrap();
        plant(temp.path(), ".git");
        plant(&temp.path().join("vendor/lib"), ".hg");

        let found: Vec<_> = find(&registry(), temp.path()).collect();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].directory(), temp.path());
        assert_eq!(found[0].type_id(), "git");
        assert_eq!(found[1].type_id(), "hg");
    }

    #[test]
    fn test_find_skips_marker_contents() {
        let temp = tempfile::tempdir().unwrap();
        plant(temp.path(), ".git");
        // Looks like a repository, but lives inside the marker directory.
        plant(&temp.path().join(".git/modules/sub"), ".git");

        assert_eq!(find(&registry(), temp.path()).count(), 1);
    }

    #[test]
    fn test_root_from_descendant() {
        let temp = tempfile::tempdir().unwrap();
        let top = temp.path().join("project");
        plant(&top, ".bzr");
        let deep = top.join("src/module/inner");
        fs::create_dir_all(&deep).unwrap();

        let top = top.canonicalize().unwrap();
        assert_eq!(root(&registry(), &deep), Some(top.clone()));
        assert_eq!(root(&registry(), &top), Some(top));
    }

    #[test]
    fn test_root_resolves_parent_components() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry();
        let repo = temp.path().join("repo");
        plant(&repo, ".git");
        fs::create_dir_all(repo.join("a")).unwrap();
        let other = temp.path().join("other/b");
        fs::create_dir_all(&other).unwrap();

        // Spelled through the repository, but names a directory outside it.
        let through = repo.join("a/../../other/b");
        assert_eq!(root(&registry, &through), root(&registry, &other));
    }

    #[test]
    fn test_root_none_outside_repositories() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry();
        // The temp dir could itself sit inside a checkout.
        if root(&registry, temp.path()).is_none() {
            assert_eq!(root(&registry, &temp.path().join("x/y")), None);
        }
    }
}
