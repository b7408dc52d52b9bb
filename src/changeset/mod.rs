//! Changeset record handling: the store of pending-release records, the
//! aggregator that derives them from git history, reconciliation between the
//! two, and prerelease mode switching.

pub mod aggregate;
pub mod prerelease;
pub mod reconcile;
pub mod store;

pub use aggregate::{changes_since_baseline, ClassifiedCommit, PackageChange};
pub use prerelease::configure_prerelease_mode;
pub use reconcile::ensure_records;
pub use store::{parse_record_header, RecordStore};
