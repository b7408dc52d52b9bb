pub mod changeset;
pub mod command;
pub mod config;
pub mod conventional;
pub mod error;
pub mod git;
pub mod history;
pub mod logger;
pub mod orchestration;
pub mod plan;
pub mod publish;
pub mod release;
pub mod release_commit;
pub mod version_commit;
pub mod workspace;

pub use error::{AutopilotError, Result};
