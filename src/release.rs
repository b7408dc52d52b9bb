//! GitHub release creation for published packages
//!
//! Release bodies come from each package's CHANGELOG.md as written by the
//! version tool: the `## <version>` section of the fresh release, headed by a
//! compare link against the previous version section when one exists. A
//! package without a changelog is silently skipped. Creation fans out
//! concurrently and each failure is an isolated warning.

use crate::config::Config;
use crate::error::{AutopilotError, Result};
use crate::logger;
use crate::workspace::{PackageDescriptor, Workspace};
use std::collections::BTreeMap;
use std::fs;
use std::thread;

/// A release ready to be sent to the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDraft {
    pub tag_name: String,
    pub title: String,
    pub body: String,
    pub prerelease: bool,
}

/// Destination for release drafts. The GitHub client is the production
/// implementation; tests substitute a recording sink.
pub trait ReleaseSink: Send + Sync {
    fn create_release(&self, draft: &ReleaseDraft) -> Result<()>;
}

/// Creates releases through the GitHub REST API.
pub struct GithubReleaseClient {
    client: reqwest::blocking::Client,
    repository: String,
    token: String,
}

impl GithubReleaseClient {
    pub fn new(repository: &str, token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("changeset-autopilot")
            .build()?;
        Ok(GithubReleaseClient {
            client,
            repository: repository.to_string(),
            token: token.to_string(),
        })
    }
}

impl ReleaseSink for GithubReleaseClient {
    fn create_release(&self, draft: &ReleaseDraft) -> Result<()> {
        let url = format!("https://api.github.com/repos/{}/releases", self.repository);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "tag_name": draft.tag_name,
                "name": draft.title,
                "body": draft.body,
                "prerelease": draft.prerelease,
                "generate_release_notes": true,
                "make_latest": "false",
            }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AutopilotError::release(format!(
                "GitHub API returned {} for {}: {}",
                status, draft.tag_name, body
            )));
        }
        Ok(())
    }
}

/// Create releases for every published package (or package group), sending
/// them concurrently. Never fails; each failed draft is logged and the rest
/// proceed.
pub fn create_releases(
    packages: &[PackageDescriptor],
    workspace: &Workspace,
    sink: &dyn ReleaseSink,
    repository: &str,
    config: &Config,
) {
    logger::info("Creating GitHub releases for published packages...");

    let drafts = if config.group_releases {
        grouped_drafts(packages, workspace, repository, config)
    } else {
        packages
            .iter()
            .filter_map(|pkg| draft_for_package(pkg, workspace, repository))
            .collect()
    };

    thread::scope(|scope| {
        for draft in &drafts {
            scope.spawn(move || match sink.create_release(draft) {
                Ok(_) => logger::info(&format!("Created GitHub release for {}", draft.tag_name)),
                Err(e) => logger::warn(&format!(
                    "Failed to create release for {}: {}",
                    draft.tag_name, e
                )),
            });
        }
    });
}

fn draft_for_package(
    pkg: &PackageDescriptor,
    workspace: &Workspace,
    repository: &str,
) -> Option<ReleaseDraft> {
    let changelog_path = workspace.package_path(pkg).join("CHANGELOG.md");
    let changelog = match fs::read_to_string(&changelog_path) {
        Ok(changelog) => changelog,
        // No changelog, no release.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            logger::error(&format!("Failed to read changelog for {}: {}", pkg.name, e));
            return None;
        }
    };

    let tag_name = format!("{}@{}", pkg.name, pkg.version);
    let Some(entry) = changelog_entry(&changelog, &pkg.version) else {
        logger::warn(&format!(
            "Could not find changelog entry for {}. Skipping release creation.",
            tag_name
        ));
        return None;
    };

    let header = match previous_version(&changelog, &pkg.version) {
        Some(previous) => {
            let previous_tag = format!("{}@{}", pkg.name, previous);
            format!(
                "## [{}](https://github.com/{}/compare/{}...{})",
                tag_name, repository, previous_tag, tag_name
            )
        }
        None => format!("## {}", tag_name),
    };

    Some(ReleaseDraft {
        title: tag_name.clone(),
        body: format!("{}\n\n{}", header, entry.content),
        prerelease: pkg.version.contains('-'),
        tag_name,
    })
}

/// One draft per package group, anchored on the group's highest version.
fn grouped_drafts(
    packages: &[PackageDescriptor],
    workspace: &Workspace,
    repository: &str,
    config: &Config,
) -> Vec<ReleaseDraft> {
    let mut groups: BTreeMap<String, Vec<&PackageDescriptor>> = BTreeMap::new();
    for pkg in packages {
        groups.entry(group_key(pkg, config)).or_default().push(pkg);
    }

    let mut drafts = Vec::new();
    for (group, members) in groups {
        let Some(anchor) = members.iter().max_by(|a, b| compare_versions(&a.version, &b.version))
        else {
            continue;
        };

        let bodies: Vec<String> = members
            .iter()
            .filter_map(|pkg| draft_for_package(pkg, workspace, repository))
            .map(|draft| draft.body)
            .collect();
        if bodies.is_empty() {
            continue;
        }

        let tag_name = format!("{}@{}", group, anchor.version);
        drafts.push(ReleaseDraft {
            title: tag_name.clone(),
            body: bodies.join("\n\n"),
            prerelease: anchor.version.contains('-'),
            tag_name,
        });
    }
    drafts
}

/// Group assignment: the explicit map wins, then the package's leading
/// directory segment, then the scope of a scoped name, then the name itself.
fn group_key(pkg: &PackageDescriptor, config: &Config) -> String {
    if let Some(group) = config.package_groups.get(&pkg.name) {
        return group.clone();
    }

    if let Some(first) = pkg.dir.components().next() {
        return first.as_os_str().to_string_lossy().into_owned();
    }

    if let Some(scope) = pkg.name.strip_prefix('@').and_then(|rest| rest.split('/').next()) {
        return format!("@{}", scope);
    }
    pkg.name.clone()
}

fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

struct ChangelogEntry {
    content: String,
}

/// Content of the `## <version>` section, trimmed of surrounding blank lines.
fn changelog_entry(changelog: &str, version: &str) -> Option<ChangelogEntry> {
    let lines: Vec<&str> = changelog.lines().collect();

    let start = lines.iter().position(|line| {
        let trimmed = line.trim();
        trimmed.starts_with("## ") && trimmed.contains(version)
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.trim().starts_with("## "))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    let mut section = &lines[start + 1..end];
    while section.first().is_some_and(|line| line.trim().is_empty()) {
        section = &section[1..];
    }
    while section.last().is_some_and(|line| line.trim().is_empty()) {
        section = &section[..section.len() - 1];
    }

    Some(ChangelogEntry {
        content: section.join("\n"),
    })
}

/// The version named by the section positionally after the current one.
fn previous_version(changelog: &str, current: &str) -> Option<String> {
    let mut found_current = false;
    for line in changelog.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("## ") {
            continue;
        }
        if found_current {
            return trimmed
                .strip_prefix("## ")
                .and_then(|rest| rest.split_whitespace().next())
                .map(String::from);
        }
        if trimmed.contains(current) {
            found_current = true;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const CHANGELOG: &str = "\
# pkg-a

## 1.3.0

### Minor Changes

- added the widget

## 1.2.3

### Patch Changes

- fixed the gadget
";

    struct RecordingSink {
        created: Mutex<Vec<ReleaseDraft>>,
        fail_tag: Option<String>,
    }

    impl RecordingSink {
        fn new() -> Self {
            RecordingSink {
                created: Mutex::new(Vec::new()),
                fail_tag: None,
            }
        }

        fn failing_on(tag: &str) -> Self {
            RecordingSink {
                created: Mutex::new(Vec::new()),
                fail_tag: Some(tag.to_string()),
            }
        }

        fn created(&self) -> Vec<ReleaseDraft> {
            self.created.lock().unwrap().clone()
        }
    }

    impl ReleaseSink for RecordingSink {
        fn create_release(&self, draft: &ReleaseDraft) -> Result<()> {
            if self.fail_tag.as_deref() == Some(draft.tag_name.as_str()) {
                return Err(AutopilotError::release("sink failure"));
            }
            self.created.lock().unwrap().push(draft.clone());
            Ok(())
        }
    }

    fn write_manifest(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), body).unwrap();
    }

    fn monorepo_with_changelogs() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        write_manifest(
            tmp.path(),
            r#"{"name": "root", "private": true, "workspaces": ["packages/*"]}"#,
        );
        write_manifest(
            &tmp.path().join("packages/a"),
            r#"{"name": "pkg-a", "version": "1.3.0"}"#,
        );
        write_manifest(
            &tmp.path().join("packages/b"),
            r#"{"name": "pkg-b", "version": "2.0.0"}"#,
        );
        fs::write(tmp.path().join("packages/a/CHANGELOG.md"), CHANGELOG).unwrap();
        fs::write(
            tmp.path().join("packages/b/CHANGELOG.md"),
            "# pkg-b\n\n## 2.0.0\n\n### Major Changes\n\n- breaking rework\n",
        )
        .unwrap();
        let workspace = Workspace::discover(tmp.path()).unwrap();
        (tmp, workspace)
    }

    fn descriptor(name: &str, dir: &str, version: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: name.to_string(),
            dir: PathBuf::from(dir),
            version: version.to_string(),
            private: false,
        }
    }

    #[test]
    fn test_changelog_entry_extraction() {
        let entry = changelog_entry(CHANGELOG, "1.3.0").unwrap();
        assert!(entry.content.starts_with("### Minor Changes"));
        assert!(entry.content.contains("added the widget"));
        assert!(!entry.content.contains("fixed the gadget"));

        assert!(changelog_entry(CHANGELOG, "9.9.9").is_none());
    }

    #[test]
    fn test_previous_version_lookup() {
        assert_eq!(previous_version(CHANGELOG, "1.3.0").as_deref(), Some("1.2.3"));
        assert_eq!(previous_version(CHANGELOG, "1.2.3"), None);
    }

    #[test]
    fn test_draft_with_compare_link() {
        let (_tmp, workspace) = monorepo_with_changelogs();
        let pkg = descriptor("pkg-a", "packages/a", "1.3.0");

        let draft = draft_for_package(&pkg, &workspace, "acme/widgets").unwrap();
        assert_eq!(draft.tag_name, "pkg-a@1.3.0");
        assert_eq!(draft.title, "pkg-a@1.3.0");
        assert!(!draft.prerelease);
        assert!(draft.body.starts_with(
            "## [pkg-a@1.3.0](https://github.com/acme/widgets/compare/pkg-a@1.2.3...pkg-a@1.3.0)"
        ));
        assert!(draft.body.contains("added the widget"));
    }

    #[test]
    fn test_draft_without_previous_version() {
        let (_tmp, workspace) = monorepo_with_changelogs();
        let pkg = descriptor("pkg-b", "packages/b", "2.0.0");

        let draft = draft_for_package(&pkg, &workspace, "acme/widgets").unwrap();
        assert!(draft.body.starts_with("## pkg-b@2.0.0\n"));
    }

    #[test]
    fn test_missing_changelog_is_silent_skip() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"name": "bare", "version": "1.0.0"}"#);
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let pkg = descriptor("bare", "", "1.0.0");

        assert!(draft_for_package(&pkg, &workspace, "acme/widgets").is_none());
    }

    #[test]
    fn test_prerelease_versions_are_marked() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"name": "pre", "version": "2.0.0-rc.1"}"#);
        fs::write(
            tmp.path().join("CHANGELOG.md"),
            "# pre\n\n## 2.0.0-rc.1\n\n- candidate\n",
        )
        .unwrap();
        let workspace = Workspace::discover(tmp.path()).unwrap();
        let pkg = descriptor("pre", "", "2.0.0-rc.1");

        let draft = draft_for_package(&pkg, &workspace, "acme/widgets").unwrap();
        assert!(draft.prerelease);
    }

    #[test]
    fn test_create_releases_fans_out_and_isolates_failures() {
        let (_tmp, workspace) = monorepo_with_changelogs();
        let packages = vec![
            descriptor("pkg-a", "packages/a", "1.3.0"),
            descriptor("pkg-b", "packages/b", "2.0.0"),
        ];
        let sink = RecordingSink::failing_on("pkg-a@1.3.0");

        create_releases(&packages, &workspace, &sink, "acme/widgets", &Config::default());

        let created = sink.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].tag_name, "pkg-b@2.0.0");
    }

    #[test]
    fn test_grouped_releases_use_explicit_map() {
        let (_tmp, workspace) = monorepo_with_changelogs();
        let packages = vec![
            descriptor("pkg-a", "packages/a", "1.3.0"),
            descriptor("pkg-b", "packages/b", "2.0.0"),
        ];
        let mut config = Config::default();
        config.group_releases = true;
        config
            .package_groups
            .insert("pkg-a".to_string(), "suite".to_string());
        config
            .package_groups
            .insert("pkg-b".to_string(), "suite".to_string());

        let sink = RecordingSink::new();
        create_releases(&packages, &workspace, &sink, "acme/widgets", &config);

        let created = sink.created();
        assert_eq!(created.len(), 1);
        // Anchored on the highest version in the group.
        assert_eq!(created[0].tag_name, "suite@2.0.0");
        assert!(created[0].body.contains("added the widget"));
        assert!(created[0].body.contains("breaking rework"));
    }

    #[test]
    fn test_group_key_fallbacks() {
        let config = Config::default();

        let by_dir = descriptor("pkg-a", "libs/pkg-a", "1.0.0");
        assert_eq!(group_key(&by_dir, &config), "libs");

        let by_scope = descriptor("@acme/core", "", "1.0.0");
        assert_eq!(group_key(&by_scope, &config), "@acme");

        let by_name = descriptor("standalone", "", "1.0.0");
        assert_eq!(group_key(&by_name, &config), "standalone");
    }
}
