//! Release-plan reconciliation: make sure records exist before versioning
//!
//! Versioning is driven entirely by the record store. When contributors wrote
//! records by hand there is nothing to do; otherwise the bot synthesizes one
//! record per classified commit from recent history.

use crate::changeset::aggregate;
use crate::changeset::store::{RecordStore, GENERATED_PREFIX};
use crate::git::Repository;
use crate::logger;
use crate::workspace::Workspace;

/// Ensure the store holds at least one record, synthesizing from commit
/// history when it is empty. Returns the store's final non-emptiness.
///
/// An existing record of either class suppresses synthesis, so calling this
/// twice in a row never duplicates records. A false return means "no
/// release-worthy changes this run", a normal terminal state.
pub fn ensure_records(store: &RecordStore, git: &dyn Repository, workspace: &Workspace) -> bool {
    if store.has_records() {
        let records = store.list_records(true);
        logger::info(&format!(
            "Existing changesets found. No need to create new ones.\nList of found changeset files: {}",
            records.join(", ")
        ));

        let generated = records
            .iter()
            .filter(|name| name.starts_with(GENERATED_PREFIX))
            .count();
        if generated > 0 {
            logger::info(&format!(
                "Note: {} auto-generated files from previous runs will be cleaned up after publishing.",
                generated
            ));
        }
        return true;
    }

    logger::info("No existing changesets found. Creating release records from recent commits...");
    let changes = aggregate::changes_since_baseline(git, workspace);

    for (package_name, change) in &changes {
        for commit in &change.commits {
            match store.create_record(
                package_name,
                commit.change.bump,
                &commit.change.description,
            ) {
                Ok(_) => logger::info(&format!(
                    "Created changeset for package '{}' with change type '{}' and description '{}'",
                    package_name, commit.change.bump, commit.change.description
                )),
                Err(e) => logger::warn(&format!(
                    "Failed to create changeset for package '{}': {}",
                    package_name, e
                )),
            }
        }
    }

    let has_records = store.has_records();
    if !has_records {
        logger::info("No changes detected that require versioning.");
    }
    has_records
}
