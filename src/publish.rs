//! Publishing via the changesets CLI
//!
//! Runs `changeset publish` and works out which packages actually made it to
//! the registry. The CLI's stdout is the only record of that, and its shape
//! has shifted across releases, so scraping is layered: any of the known line
//! formats counts.

use crate::command::CommandRunner;
use crate::config::ResolvedBranchConfig;
use crate::changeset::store::RecordStore;
use crate::error::Result;
use crate::logger;
use crate::workspace::{PackageDescriptor, Workspace};
use regex::Regex;
use std::path::Path;

const PACKAGE_NAME_PATTERN: &str = r"(?:@[A-Za-z0-9._-]+/)?[A-Za-z0-9._-]+";
const VERSION_PATTERN: &str = r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?";

/// Run `changeset publish` and return the descriptors of the packages it
/// published.
///
/// The `--tag <channel>` flag is appended only when the branch configures a
/// channel and the store is not in prerelease mode; in prerelease mode the
/// CLI picks the dist-tag from `pre.json` itself. Descriptors are re-read
/// after publishing so versions reflect the post-bump manifests.
pub fn publish_packages(
    runner: &dyn CommandRunner,
    store: &RecordStore,
    branch: &ResolvedBranchConfig,
    npm_token: &str,
    root: &Path,
) -> Result<Vec<PackageDescriptor>> {
    let mut args = vec!["changeset", "publish"];
    if let Some(channel) = &branch.channel {
        if !store.in_prerelease_mode() {
            args.push("--tag");
            args.push(channel);
        }
    }

    logger::info(&format!("Publishing packages: npx {}", args.join(" ")));
    let output = runner.run(
        "npx",
        &args,
        &[("NPM_TOKEN".to_string(), npm_token.to_string())],
    )?;

    let names = parse_published_package_names(&output);
    if names.is_empty() {
        logger::info("No packages were published.");
        return Ok(Vec::new());
    }

    let workspace = Workspace::discover(root)?;
    let published: Vec<PackageDescriptor> = workspace
        .publishable()
        .into_iter()
        .filter(|pkg| names.iter().any(|name| name == &pkg.name))
        .cloned()
        .collect();

    logger::success(&format!(
        "Published {} package(s): {}",
        published.len(),
        published
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    Ok(published)
}

/// Package names scraped from `changeset publish` stdout.
///
/// Union of three line shapes the CLI has used: `New tag: name@version`,
/// `name@version` lines inside the "packages published successfully" block,
/// and `info Publishing "name" at "version"`.
pub fn parse_published_package_names(output: &str) -> Vec<String> {
    let new_tag = Regex::new(&format!(
        r"New tag:\s+({})@{}",
        PACKAGE_NAME_PATTERN, VERSION_PATTERN
    ))
    .unwrap();
    let bare = Regex::new(&format!(
        r"^({})@{}$",
        PACKAGE_NAME_PATTERN, VERSION_PATTERN
    ))
    .unwrap();
    let publishing = Regex::new(&format!(
        r#"Publishing "({})" at "{}""#,
        PACKAGE_NAME_PATTERN, VERSION_PATTERN
    ))
    .unwrap();

    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    let mut in_success_block = false;
    for line in output.lines() {
        let trimmed = line.trim();

        if let Some(captures) = new_tag.captures(trimmed) {
            push(&captures[1]);
            continue;
        }
        if let Some(captures) = publishing.captures(trimmed) {
            push(&captures[1]);
            continue;
        }

        if trimmed.to_lowercase().contains("packages published successfully") {
            in_success_block = true;
            continue;
        }
        if in_success_block {
            if let Some(captures) = bare.captures(trimmed) {
                push(&captures[1]);
            }
        }
    }
    names
}
