//! Prerelease mode switching
//!
//! The changesets CLI tracks prerelease mode via `.changeset/pre.json`. The
//! bot reconciles that marker with the resolved branch configuration before
//! versioning: publishing under the wrong mode would mis-tag the registry, so
//! failures here propagate instead of degrading.

use crate::command::CommandRunner;
use crate::config::ResolvedBranchConfig;
use crate::error::Result;
use crate::logger;

use super::store::RecordStore;

/// Enter or exit prerelease mode so the store matches the branch config.
pub fn configure_prerelease_mode(
    branch: &ResolvedBranchConfig,
    store: &RecordStore,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let in_mode = store.in_prerelease_mode();

    match (&branch.prerelease, in_mode) {
        (Some(tag), false) => {
            logger::info(&format!(
                "Entering prerelease mode with tag '{}' for branch '{}'",
                tag, branch.name
            ));
            runner.run("npx", &["changeset", "pre", "enter", tag], &[])?;
        }
        (None, true) => {
            logger::info(&format!(
                "Exiting prerelease mode for branch '{}'",
                branch.name
            ));
            runner.run("npx", &["changeset", "pre", "exit"], &[])?;
        }
        _ => {}
    }
    Ok(())
}
