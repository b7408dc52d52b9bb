//! Release plan capture
//!
//! The version tool consumes record files as it bumps manifests, so anything
//! that needs to know what is about to be released must read the records
//! first. The plan captured here later names the release commit.

use crate::changeset::store::{parse_record_header, RecordStore};
use crate::conventional::BumpLevel;
use crate::logger;
use crate::release_commit::DEFAULT_RELEASE_COMMIT_MESSAGE;
use crate::workspace::Workspace;
use semver::Version;
use std::collections::HashMap;

/// One package about to be released, with its post-bump version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePackage {
    pub name: String,
    pub version: String,
    pub bump: BumpLevel,
}

/// Read every pending record and predict the versions the version tool is
/// about to write.
///
/// Each package takes its highest requested bump; results follow workspace
/// package order. Never fails: unreadable records and unparsable current
/// versions are skipped with a warning.
pub fn capture_release_plan(store: &RecordStore, workspace: &Workspace) -> Vec<ReleasePackage> {
    let mut bumps: HashMap<String, BumpLevel> = HashMap::new();

    for filename in store.list_records(true) {
        let content = match store.read_record(&filename) {
            Ok(content) => content,
            Err(e) => {
                logger::warn(&format!("Cannot read changeset {}: {}", filename, e));
                continue;
            }
        };
        for (name, bump) in parse_record_header(&content) {
            let entry = bumps.entry(name).or_insert(BumpLevel::None);
            if bump > *entry {
                *entry = bump;
            }
        }
    }

    let pre_tag = store.prerelease_tag();

    let mut plan = Vec::new();
    for package in workspace.packages() {
        let Some(&bump) = bumps.get(&package.name) else {
            continue;
        };
        if bump == BumpLevel::None {
            continue;
        }

        let current = match Version::parse(&package.version) {
            Ok(version) => version,
            Err(e) => {
                logger::warn(&format!(
                    "Skipping package '{}': cannot parse version '{}': {}",
                    package.name, package.version, e
                ));
                continue;
            }
        };

        let next = match &pre_tag {
            Some(tag) => bumped_prerelease(&current, bump, tag),
            None => bumped(&current, bump),
        };
        plan.push(ReleasePackage {
            name: package.name.clone(),
            version: next.to_string(),
            bump,
        });
    }
    plan
}

fn bumped(version: &Version, bump: BumpLevel) -> Version {
    let mut next = version.clone();
    next.pre = semver::Prerelease::EMPTY;
    next.build = semver::BuildMetadata::EMPTY;
    match bump {
        BumpLevel::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        BumpLevel::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        BumpLevel::Patch => next.patch += 1,
        BumpLevel::None => {}
    }
    next
}

/// Prerelease-mode prediction, matching how the version tool numbers
/// prereleases: the first one bumps the triple and starts `-<tag>.0`, later
/// ones on the same train keep the triple and advance the counter.
fn bumped_prerelease(version: &Version, bump: BumpLevel, tag: &str) -> Version {
    if let Some(counter) = prerelease_counter(version, tag) {
        let mut next = version.clone();
        next.pre = semver::Prerelease::new(&format!("{}.{}", tag, counter + 1))
            .unwrap_or(semver::Prerelease::EMPTY);
        return next;
    }

    let mut next = bumped(version, bump);
    next.pre =
        semver::Prerelease::new(&format!("{}.0", tag)).unwrap_or(semver::Prerelease::EMPTY);
    next
}

fn prerelease_counter(version: &Version, tag: &str) -> Option<u64> {
    version
        .pre
        .as_str()
        .strip_prefix(tag)?
        .strip_prefix('.')?
        .parse()
        .ok()
}

/// Commit message for the release commit, derived from the captured plan.
pub fn release_commit_message(plan: &[ReleasePackage]) -> String {
    match plan {
        [] => DEFAULT_RELEASE_COMMIT_MESSAGE.to_string(),
        [only] => format!("chore(release): {} [skip ci]", only.version),
        _ => {
            let lines: Vec<String> = plan
                .iter()
                .map(|pkg| format!("{}@{}", pkg.name, pkg.version))
                .collect();
            format!("{}\n\n{}", DEFAULT_RELEASE_COMMIT_MESSAGE, lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), body).unwrap();
    }

    fn monorepo() -> (TempDir, Workspace, RecordStore) {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            r#"{"name": "root", "private": true, "workspaces": ["packages/*"]}"#,
        );
        write_manifest(
            &tmp.path().join("packages/a"),
            r#"{"name": "pkg-a", "version": "1.2.3"}"#,
        );
        write_manifest(
            &tmp.path().join("packages/b"),
            r#"{"name": "pkg-b", "version": "0.9.0"}"#,
        );
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let store = RecordStore::new(tmp.path());
        (tmp, workspace, store)
    }

    #[test]
    fn test_plan_takes_highest_bump_per_package() {
        let (_tmp, workspace, store) = monorepo();
        store.create_record("pkg-a", BumpLevel::Patch, "fix").unwrap();
        store.create_record("pkg-a", BumpLevel::Minor, "feat").unwrap();
        store.create_record("pkg-b", BumpLevel::Major, "break").unwrap();

        let plan = capture_release_plan(&store, &workspace);
        assert_eq!(
            plan,
            vec![
                ReleasePackage {
                    name: "pkg-a".to_string(),
                    version: "1.3.0".to_string(),
                    bump: BumpLevel::Minor,
                },
                ReleasePackage {
                    name: "pkg-b".to_string(),
                    version: "1.0.0".to_string(),
                    bump: BumpLevel::Major,
                },
            ]
        );
    }

    #[test]
    fn test_plan_skips_unparsable_version() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            r#"{"name": "odd", "version": "not-a-version"}"#,
        );
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let store = RecordStore::new(tmp.path());
        store.create_record("odd", BumpLevel::Patch, "x").unwrap();

        assert!(capture_release_plan(&store, &workspace).is_empty());
    }

    #[test]
    fn test_plan_ignores_packages_without_records() {
        let (_tmp, workspace, store) = monorepo();
        store.create_record("pkg-b", BumpLevel::Patch, "fix").unwrap();

        let plan = capture_release_plan(&store, &workspace);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].name, "pkg-b");
        assert_eq!(plan[0].version, "0.9.1");
    }

    fn enter_prerelease(store: &RecordStore, tag: &str) {
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.dir().join("pre.json"),
            format!(r#"{{"mode": "pre", "tag": "{}", "initialVersions": {{}}}}"#, tag),
        )
        .unwrap();
    }

    #[test]
    fn test_plan_in_prerelease_mode_starts_the_train() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"name": "pkg", "version": "1.0.0"}"#);
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let store = RecordStore::new(tmp.path());
        enter_prerelease(&store, "rc");
        store.create_record("pkg", BumpLevel::Patch, "fix").unwrap();

        let plan = capture_release_plan(&store, &workspace);
        assert_eq!(plan[0].version, "1.0.1-rc.0");
        assert_eq!(
            release_commit_message(&plan),
            "chore(release): 1.0.1-rc.0 [skip ci]"
        );
    }

    #[test]
    fn test_plan_in_prerelease_mode_advances_the_counter() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"name": "pkg", "version": "1.0.1-rc.0"}"#);
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let store = RecordStore::new(tmp.path());
        enter_prerelease(&store, "rc");
        store.create_record("pkg", BumpLevel::Patch, "fix").unwrap();

        let plan = capture_release_plan(&store, &workspace);
        assert_eq!(plan[0].version, "1.0.1-rc.1");
    }

    #[test]
    fn test_prerelease_suffix_is_cleared_on_bump() {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            r#"{"name": "pre", "version": "2.0.0-rc.1"}"#,
        );
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let store = RecordStore::new(tmp.path());
        store.create_record("pre", BumpLevel::Patch, "fix").unwrap();

        let plan = capture_release_plan(&store, &workspace);
        assert_eq!(plan[0].version, "2.0.1");
    }

    #[test]
    fn test_commit_message_shapes() {
        assert_eq!(release_commit_message(&[]), DEFAULT_RELEASE_COMMIT_MESSAGE);

        let one = vec![ReleasePackage {
            name: "pkg-a".to_string(),
            version: "1.3.0".to_string(),
            bump: BumpLevel::Minor,
        }];
        assert_eq!(
            release_commit_message(&one),
            "chore(release): 1.3.0 [skip ci]"
        );

        let two = vec![
            ReleasePackage {
                name: "pkg-a".to_string(),
                version: "1.3.0".to_string(),
                bump: BumpLevel::Minor,
            },
            ReleasePackage {
                name: "pkg-b".to_string(),
                version: "1.0.0".to_string(),
                bump: BumpLevel::Major,
            },
        ];
        assert_eq!(
            release_commit_message(&two),
            format!(
                "{}\n\npkg-a@1.3.0\npkg-b@1.0.0",
                DEFAULT_RELEASE_COMMIT_MESSAGE
            )
        );
    }
}
