use regex::Regex;

/// Commit title used when several packages are versioned at once.
pub const DEFAULT_RELEASE_COMMIT_MESSAGE: &str = "chore(release): bump package versions [skip ci]";

/// Package name as it appears in a release commit title: a bare name or a
/// scoped `@scope/name`, never containing `@` or `/` in a segment.
const PACKAGE_NAME: &str = r"(?:@[0-9a-z][0-9a-z_.-]*/)?[0-9a-z][0-9a-z_.-]*";

/// Dotted semver triple with an optional prerelease. Build metadata is
/// rejected: the bot never writes it, so a `+` suffix means foreign noise.
const SEMVER: &str = r"\d+\.\d+\.\d+(?:-[0-9a-z][0-9a-z.-]*)?";

/// Returns true for commits written by a previous run of this bot (or its
/// predecessors), used to anchor the history walk and to drop bot noise from
/// change aggregation.
///
/// Recognized titles, case-insensitively and ignoring surrounding whitespace:
/// - `chore(release): <semver> [skip ci]`, optionally `name@<semver>`
/// - `chore(release): bump package versions [skip ci]`
/// - `chore(release): version packages [skip ci]` (legacy)
pub fn is_release_commit(message: &str) -> bool {
    let message = message.trim();

    let single = format!(
        r"(?i)^chore\(release\): +(?:{PACKAGE_NAME}@)?{SEMVER} +\[skip ci\]$"
    );
    let multi = r"(?i)^chore\(release\): +bump package versions +\[skip ci\]$";
    let legacy = r"(?i)^chore\(release\): +version packages +\[skip ci\]$";

    [single.as_str(), multi, legacy].iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(message))
            .unwrap_or(false)
    })
}

/// Returns true for branch/pull-request merge commits.
pub fn is_merge_commit(message: &str) -> bool {
    message.trim_start().to_lowercase().starts_with("merge")
}
