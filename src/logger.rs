//! CI log output helpers
//!
//! The bot runs unattended, so everything user-visible is a leveled log line:
//! `info` for expected states, `warn` for degraded-but-continuing states, and
//! `error` only from the top-level failure path.

use console::style;

pub fn info(message: &str) {
    println!("{} {}", style("info").cyan().bold(), message);
}

pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn warn(message: &str) {
    eprintln!("{} {}", style("warning").yellow().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("error").red().bold(), message);
}
