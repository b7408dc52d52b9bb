//! Git operations abstraction layer
//!
//! Trait-based abstraction over the git operations the bot needs, with a real
//! implementation on top of the `git2` crate and a mock for tests. Most code
//! should depend on the [Repository] trait rather than a concrete type.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Commit information sourced from history; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit hash
    pub hash: String,
    /// Complete message, header plus body
    pub message: String,
    /// Author name
    pub author: String,
    /// Author email
    pub email: String,
    /// Commit time, seconds since epoch
    pub timestamp: i64,
    /// Ref labels pointing at this commit (`HEAD -> main`, `tag: v1.0.0`, ...)
    pub refs: String,
    /// Tag names extracted from the ref labels
    pub tags: Vec<String>,
}

/// Common git operation trait
///
/// All implementors must be `Send + Sync`. Methods return the crate
/// [Result]; implementations map underlying failures (like `git2::Error`) to
/// [crate::error::AutopilotError] variants.
pub trait Repository: Send + Sync {
    /// Most recent commits reachable from HEAD, newest first, at most
    /// `max_count` entries.
    fn recent_commits(&self, max_count: usize) -> Result<Vec<CommitInfo>>;

    /// Commits in `base..HEAD` (base exclusive), oldest first. `base` may be
    /// a tag name, a hash, or a relative rev like `HEAD~1`.
    fn commits_since(&self, base: &str) -> Result<Vec<CommitInfo>>;

    /// Paths touched between `base` and HEAD, workspace-relative.
    fn changed_paths_since(&self, base: &str) -> Result<Vec<String>>;

    /// All tags reachable from HEAD, sorted by descending version order.
    fn sorted_version_tags(&self) -> Result<Vec<String>>;

    /// Short name of the currently checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// Stage every change in the working tree.
    fn stage_all(&self) -> Result<()>;

    /// Commit the staged changes. Fails with a command error when there is
    /// nothing to commit.
    fn commit(&self, message: &str) -> Result<()>;

    /// Push a refspec to the given (token-authenticated) remote URL.
    fn push_branch(&self, url: &str, refspec: &str) -> Result<()>;

    /// Push all local tags to the given remote URL.
    fn push_tags(&self, url: &str) -> Result<()>;
}

/// Sort tags by descending semantic-version order.
///
/// Non-semver tags sort after every semver one, alphabetically among
/// themselves, so callers scanning for a version tag see the newest first.
pub fn sort_tags_by_version_desc(tags: &mut [String]) {
    fn parse(tag: &str) -> Option<semver::Version> {
        semver::Version::parse(tag.trim().trim_start_matches('v')).ok()
    }

    tags.sort_by(|a, b| match (parse(a), parse(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}
