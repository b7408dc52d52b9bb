//! Change aggregation: classified, releasable changes per package
//!
//! Combines the baseline finder with the commit classifier to answer "what
//! changed since the last published state, and for which packages".

use crate::conventional::{classify, BumpLevel, ClassifiedChange};
use crate::error::Result;
use crate::git::Repository;
use crate::history;
use crate::logger;
use crate::release_commit::{is_merge_commit, is_release_commit};
use crate::workspace::{PackageDescriptor, Workspace};
use std::collections::BTreeMap;

/// One release-worthy commit with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCommit {
    pub hash: String,
    pub message: String,
    pub change: ClassifiedChange,
}

/// Releasable state of one package since the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChange {
    /// Changed paths under the package directory
    pub files: Vec<String>,
    /// Classified commits since baseline (shared across packages)
    pub commits: Vec<ClassifiedCommit>,
    /// Current (pre-bump) version
    pub version: String,
    pub private: bool,
}

/// Map of package name to its releasable changes since the baseline.
///
/// Never fails: errors from the repository are logged and an empty map is
/// returned. Packages without at least one changed file under their directory
/// are omitted entirely.
pub fn changes_since_baseline(
    git: &dyn Repository,
    workspace: &Workspace,
) -> BTreeMap<String, PackageChange> {
    match try_changes_since_baseline(git, workspace) {
        Ok(changes) => changes,
        Err(e) => {
            logger::error(&format!("Error collecting changes since baseline: {}", e));
            BTreeMap::new()
        }
    }
}

fn try_changes_since_baseline(
    git: &dyn Repository,
    workspace: &Workspace,
) -> Result<BTreeMap<String, PackageChange>> {
    let publishable = workspace.publishable();

    let skipped: Vec<&str> = workspace
        .packages()
        .iter()
        .filter(|pkg| !publishable.iter().any(|p| p.name == pkg.name))
        .map(|pkg| pkg.name.as_str())
        .collect();
    if !skipped.is_empty() {
        logger::info(&format!("Skipped private packages: {}", skipped.join(", ")));
    }

    let baseline = history::find_baseline(git);
    let files = git.changed_paths_since(&baseline)?;

    let commits: Vec<ClassifiedCommit> = git
        .commits_since(&baseline)?
        .into_iter()
        .filter(|c| !is_merge_commit(&c.message) && !is_release_commit(&c.message))
        .map(|c| {
            let change = classify(&c.message);
            ClassifiedCommit {
                hash: c.hash,
                message: c.message,
                change,
            }
        })
        .filter(|c| c.change.bump != BumpLevel::None)
        .collect();

    let mut changes = BTreeMap::new();
    for package in publishable {
        let package_files = files_under_package(&files, package);
        if package_files.is_empty() {
            continue;
        }
        changes.insert(
            package.name.clone(),
            PackageChange {
                files: package_files,
                commits: commits.clone(),
                version: package.version.clone(),
                private: package.private,
            },
        );
    }

    logger::info(&format!(
        "Found {} packages with changes since {}",
        changes.len(),
        baseline
    ));
    Ok(changes)
}

fn files_under_package(files: &[String], package: &PackageDescriptor) -> Vec<String> {
    let dir = package.dir.to_string_lossy().replace('\\', "/");
    if dir.is_empty() {
        // Root package: every changed path belongs to it.
        return files.to_vec();
    }

    let prefix = format!("{}/", dir);
    files
        .iter()
        .filter(|file| file.as_str() == dir || file.starts_with(&prefix))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), body).unwrap();
    }

    fn monorepo() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            r#"{"name": "root", "private": true, "workspaces": ["packages/*"]}"#,
        );
        write_manifest(
            &tmp.path().join("packages/a"),
            r#"{"name": "pkg-a", "version": "1.0.0"}"#,
        );
        write_manifest(
            &tmp.path().join("packages/b"),
            r#"{"name": "pkg-b", "version": "2.0.0"}"#,
        );
        write_manifest(
            &tmp.path().join("packages/secret"),
            r#"{"name": "secret", "version": "0.1.0", "private": true}"#,
        );
        let workspace = Workspace::discover(tmp.path()).unwrap();
        (tmp, workspace)
    }

    #[test]
    fn test_packages_filtered_by_changed_files() {
        let (_tmp, workspace) = monorepo();
        let mut git = MockRepository::new();
        git.add_commit("base", "chore(release): 1.0.0 [skip ci]");
        git.add_commit("c1", "feat: new feature");
        git.add_changed_path("packages/a/src/index.js");
        git.add_changed_path("packages/a/package.json");

        let changes = changes_since_baseline(&git, &workspace);
        assert_eq!(changes.len(), 1);
        let change = &changes["pkg-a"];
        assert_eq!(change.files.len(), 2);
        assert_eq!(change.version, "1.0.0");
        assert_eq!(change.commits.len(), 1);
        assert_eq!(change.commits[0].change.bump, BumpLevel::Minor);
    }

    #[test]
    fn test_none_level_commits_are_dropped() {
        let (_tmp, workspace) = monorepo();
        let mut git = MockRepository::new();
        git.add_commit("base", "chore(release): 1.0.0 [skip ci]");
        git.add_commit("c1", "docs: update readme");
        git.add_commit("c2", "fix: real fix");
        git.add_changed_path("packages/b/lib.js");

        let changes = changes_since_baseline(&git, &workspace);
        let commits = &changes["pkg-b"].commits;
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "fix: real fix");
    }

    #[test]
    fn test_release_and_merge_commits_are_excluded() {
        let (_tmp, workspace) = monorepo();
        let mut git = MockRepository::new();
        git.add_commit("base", "chore(release): 1.0.0 [skip ci]");
        git.add_commit("c1", "Merge pull request #4 from feature/x");
        git.add_commit("c2", "chore(release): bump package versions [skip ci]");
        git.add_commit("c3", "feat: keep me");
        git.add_changed_path("packages/a/index.js");

        let changes = changes_since_baseline(&git, &workspace);
        let commits = &changes["pkg-a"].commits;
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "feat: keep me");
    }

    #[test]
    fn test_private_packages_are_omitted() {
        let (_tmp, workspace) = monorepo();
        let mut git = MockRepository::new();
        git.add_commit("base", "chore(release): 1.0.0 [skip ci]");
        git.add_commit("c1", "feat: touches the private package");
        git.add_changed_path("packages/secret/index.js");

        let changes = changes_since_baseline(&git, &workspace);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_sole_root_package_matches_everything() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            r#"{"name": "solo", "version": "1.0.0", "private": true}"#,
        );
        let workspace = Workspace::discover(tmp.path()).unwrap();

        let mut git = MockRepository::new();
        git.add_commit("base", "chore(release): 1.0.0 [skip ci]");
        git.add_commit("c1", "fix: anything");
        git.add_changed_path("src/lib.js");

        let changes = changes_since_baseline(&git, &workspace);
        assert_eq!(changes.len(), 1);
        assert!(changes.contains_key("solo"));
    }

    #[test]
    fn test_repository_errors_yield_empty_map() {
        let (_tmp, workspace) = monorepo();
        let git = MockRepository::failing();
        assert!(changes_since_baseline(&git, &workspace).is_empty());
    }
}
