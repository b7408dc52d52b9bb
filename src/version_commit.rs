//! Versioning and the release commit
//!
//! Drives `changeset version` and lands its output as a single release
//! commit. The caller captures the release plan before calling in here: the
//! version tool deletes the record files it consumes, so the plan cannot be
//! reconstructed afterwards.

use crate::command::CommandRunner;
use crate::error::Result;
use crate::git::Repository;
use crate::logger;
use crate::orchestration::RunContext;
use crate::plan::{release_commit_message, ReleasePackage};

/// Run the version tool, commit the manifest/changelog churn, and push the
/// current branch. Returns the commit message used.
///
/// A version-tool failure aborts with an error since the working tree state
/// is unknown. Commit and push failures are logged and swallowed; "nothing to
/// commit" is an expected outcome when the tool made no changes.
pub fn version_and_commit(
    git: &dyn Repository,
    runner: &dyn CommandRunner,
    plan: &[ReleasePackage],
    ctx: &RunContext,
) -> Result<String> {
    logger::info("Running changeset version...");
    runner.run("npx", &["changeset", "version"], &[])?;

    let message = release_commit_message(plan);

    // "Nothing to commit" is expected when the tool made no changes; the
    // push still runs so pending local commits from an earlier attempt land.
    match git.stage_all().and_then(|_| git.commit(&message)) {
        Ok(_) => logger::success(&format!("Committed version changes: {}", message)),
        Err(e) => logger::warn(&format!("Could not commit version changes: {}", e)),
    }

    match git.current_branch() {
        Ok(branch) => {
            let refspec = format!("HEAD:refs/heads/{}", branch);
            match git.push_branch(&ctx.remote_url(), &refspec) {
                Ok(_) => logger::success(&format!("Pushed release commit to {}", branch)),
                Err(e) => logger::warn(&format!("Could not push release commit: {}", e)),
            }
        }
        Err(e) => logger::warn(&format!("Could not resolve current branch: {}", e)),
    }

    Ok(message)
}
