//! Baseline detection: where did the last published state end?
//!
//! Commit history is polluted by the bot's own release commits and by merge
//! commits, so "changes since the last release" needs a stable anchor. The
//! precedence chain is the single source of truth:
//! tag -> release commit -> step-back heuristic -> fixed fallback.

use crate::error::Result;
use crate::git::Repository;
use crate::logger;
use crate::release_commit::{is_merge_commit, is_release_commit};
use regex::Regex;

/// Used when no clearer anchor exists in the recent window.
pub const FALLBACK_BASELINE: &str = "HEAD~1";

/// How far back the commit-log scan reaches.
const LOG_WINDOW: usize = 80;

/// Find the commit or tag that represents the last published state.
///
/// Never fails: any error from the repository is logged and the fixed
/// fallback is returned instead.
pub fn find_baseline(git: &dyn Repository) -> String {
    match try_find_baseline(git) {
        Ok(baseline) => baseline,
        Err(e) => {
            logger::warn(&format!(
                "Error finding last publishable commit: {}, falling back to {}",
                e, FALLBACK_BASELINE
            ));
            FALLBACK_BASELINE.to_string()
        }
    }
}

fn try_find_baseline(git: &dyn Repository) -> Result<String> {
    // 1. Most recent semver-shaped tag wins.
    let tags = git.sorted_version_tags()?;
    if let Some(tag) = tags.iter().find(|tag| is_version_tag(tag)) {
        logger::info(&format!("Using last release tag as base: {}", tag));
        return Ok(tag.clone());
    }

    logger::info("No version tags found, searching commit history for published releases");
    let log = git.recent_commits(LOG_WINDOW)?;

    // 2. The newest release commit written by a previous run.
    if let Some(commit) = log.iter().find(|c| is_release_commit(&c.message)) {
        logger::info(&format!(
            "Using last published release commit as base: {}",
            commit.hash
        ));
        return Ok(commit.hash.clone());
    }

    // 3. Skip bot noise from the top, then step one commit further back so
    // the first real change lands inside the baseline..HEAD range.
    for (index, commit) in log.iter().enumerate() {
        if is_release_commit(&commit.message) || is_merge_commit(&commit.message) {
            continue;
        }
        if index + 1 < log.len() {
            logger::info(&format!(
                "Using commit before last publishable commit as base: {}",
                log[index + 1].hash
            ));
            return Ok(log[index + 1].hash.clone());
        }
        break;
    }

    // 4. Nothing clearer in the window.
    logger::info(&format!(
        "No clear base commit found, falling back to {}",
        FALLBACK_BASELINE
    ));
    Ok(FALLBACK_BASELINE.to_string())
}

fn is_version_tag(tag: &str) -> bool {
    Regex::new(r"^v?\d+\.\d+\.\d+")
        .map(|re| re.is_match(tag))
        .unwrap_or(false)
}
