//! Run orchestration
//!
//! Wires the pipeline together: branch resolution, prerelease mode, record
//! reconciliation, versioning, publishing, tag pushing, and release creation.
//! The trait seams (`Repository`, `CommandRunner`, `ReleaseSink`) let the
//! whole pipeline run against mocks in tests.

use crate::changeset::{configure_prerelease_mode, ensure_records, RecordStore};
use crate::command::{CommandRunner, ProcessRunner};
use crate::config::Config;
use crate::error::Result;
use crate::git::{Git2Repository, Repository};
use crate::logger;
use crate::plan::capture_release_plan;
use crate::publish::publish_packages;
use crate::release::{create_releases, GithubReleaseClient, ReleaseSink};
use crate::version_commit::version_and_commit;
use crate::workspace::Workspace;
use std::path::PathBuf;

/// Everything a run needs from the environment, resolved up front in `main`.
/// No component below this reads ambient environment variables.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Repository in `owner/repo` form
    pub repository: String,
    pub github_token: String,
    /// Publishing and release creation are skipped without one
    pub npm_token: Option<String>,
    pub bot_name: String,
    /// Workspace checkout root
    pub root: PathBuf,
}

impl RunContext {
    /// Token-authenticated HTTPS remote URL for pushes.
    pub fn remote_url(&self) -> String {
        format!(
            "https://x-access-token:{}@github.com/{}.git",
            self.github_token, self.repository
        )
    }
}

/// Run the pipeline with production implementations behind the seams.
pub fn run(ctx: &RunContext, config: &Config) -> Result<()> {
    let git = Git2Repository::open(&ctx.root, &ctx.bot_name)?;
    let runner = ProcessRunner::new(&ctx.root);
    let sink = GithubReleaseClient::new(&ctx.repository, &ctx.github_token)?;
    run_with(&git, &runner, &sink, ctx, config)
}

/// The pipeline proper. Only errors that make continuing pointless propagate;
/// everything else degrades and logs as described per step.
pub fn run_with(
    git: &dyn Repository,
    runner: &dyn CommandRunner,
    sink: &dyn ReleaseSink,
    ctx: &RunContext,
    config: &Config,
) -> Result<()> {
    let branch = git.current_branch()?;
    let resolved = config.resolve_branch(&branch);
    if !resolved.is_match {
        logger::info(&format!(
            "Branch '{}' is not configured for releasing. Skipping.",
            branch
        ));
        return Ok(());
    }

    let workspace = Workspace::discover(&ctx.root)?;
    let store = RecordStore::new(workspace.root());

    configure_prerelease_mode(&resolved, &store, runner)?;

    let has_records = if config.auto_changeset {
        ensure_records(&store, git, &workspace)
    } else {
        store.has_records()
    };
    if !has_records {
        logger::info("No changesets to process. Run completed.");
        return Ok(());
    }

    logger::info("Processing versioning and git operations...");

    // Captured before versioning: the version tool consumes the records.
    let plan = capture_release_plan(&store, &workspace);

    version_and_commit(git, runner, &plan, ctx)?;

    let Some(npm_token) = &ctx.npm_token else {
        logger::info("No npm token provided, skipping publish step.");
        return Ok(());
    };

    let published = publish_packages(runner, &store, &resolved, npm_token, &ctx.root)?;
    if published.is_empty() {
        return Ok(());
    }

    if config.push_tags {
        logger::info("Pushing tags created by changeset publish...");
        match git.push_tags(&ctx.remote_url()) {
            Ok(_) => logger::success("Tags pushed successfully"),
            Err(e) => logger::warn(&format!("Failed to push tags: {}", e)),
        }
    }

    if config.create_release {
        // Manifests changed on disk during versioning; re-read them.
        let workspace = Workspace::discover(&ctx.root)?;
        create_releases(&published, &workspace, sink, &ctx.repository, config);
    }

    Ok(())
}
