//! Pending-release record store
//!
//! Changeset records live as individual markdown files under `.changeset/`.
//! Human contributors drop in records with arbitrary names; the bot writes
//! `auto-generated-at-<millis>.md` files. Records are created here and
//! consumed (deleted) by the external version tool; they are never edited in
//! place.

use crate::conventional::BumpLevel;
use crate::error::{AutopilotError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Record directory, relative to the workspace root.
pub const CHANGESET_DIR: &str = ".changeset";

/// Filename prefix marking records written by the bot.
pub const GENERATED_PREFIX: &str = "auto-generated-at-";

/// Body used when a record has no description.
pub const EMPTY_DESCRIPTION: &str = "No description provided.";

/// Documentation file that ships with the directory; never a record.
const RESERVED_README: &str = "README.md";

/// Written by `changeset pre enter`; its presence switches publishing to
/// prerelease behavior.
const PRERELEASE_MARKER: &str = "pre.json";

pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(workspace_root: &Path) -> Self {
        RecordStore {
            dir: workspace_root.join(CHANGESET_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True iff at least one record of either class exists. Generated
    /// leftovers from a previous run count: they still describe pending work.
    pub fn has_records(&self) -> bool {
        !self.list_records(true).is_empty()
    }

    /// Record filenames, sorted; generated records included on request.
    pub fn list_records(&self, include_generated: bool) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut records: Vec<String> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_record(name))
            .filter(|name| include_generated || !name.starts_with(GENERATED_PREFIX))
            .collect();
        records.sort();
        records
    }

    /// Write a new generated record and return its filename.
    ///
    /// The embedded epoch-millis timestamp is the uniqueness guarantee, so on
    /// collision (several records within one millisecond) the value is
    /// incremented until a free name is found.
    pub fn create_record(
        &self,
        package_name: &str,
        bump: BumpLevel,
        description: &str,
    ) -> Result<String> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let name = package_name.trim();
        let description = description.trim();
        let body = if description.is_empty() {
            EMPTY_DESCRIPTION
        } else {
            description
        };
        let content = format!("---\n'{}': {}\n---\n{}\n", name, bump, body);

        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AutopilotError::command(format!("system clock error: {}", e)))?
            .as_millis();
        let filename = loop {
            let candidate = format!("{}{}.md", GENERATED_PREFIX, millis);
            if !self.dir.join(&candidate).exists() {
                break candidate;
            }
            millis += 1;
        };

        fs::write(self.dir.join(&filename), content)?;
        Ok(filename)
    }

    /// Raw contents of a record file.
    pub fn read_record(&self, filename: &str) -> Result<String> {
        Ok(fs::read_to_string(self.dir.join(filename))?)
    }

    /// True while `changeset pre enter` is in effect.
    pub fn in_prerelease_mode(&self) -> bool {
        self.dir.join(PRERELEASE_MARKER).exists()
    }

    /// Prerelease tag recorded in the marker, when mode is active.
    ///
    /// The marker file persists with `"mode": "exit"` after `pre exit`, so
    /// only `"mode": "pre"` yields a tag.
    pub fn prerelease_tag(&self) -> Option<String> {
        let raw = fs::read_to_string(self.dir.join(PRERELEASE_MARKER)).ok()?;
        let marker: serde_json::Value = serde_json::from_str(&raw).ok()?;
        if marker.get("mode").and_then(|m| m.as_str()) != Some("pre") {
            return None;
        }
        marker
            .get("tag")
            .and_then(|t| t.as_str())
            .map(String::from)
    }
}

fn is_record(filename: &str) -> bool {
    filename.ends_with(".md") && filename != RESERVED_README
}

/// Parse the frontmatter of a record into `(package, bump)` pairs.
///
/// The header block between the `---` fences holds one `'<name>': <level>`
/// line per affected package. Lines that do not fit are skipped rather than
/// failing the whole record.
pub fn parse_record_header(content: &str) -> Vec<(String, BumpLevel)> {
    let mut lines = content.lines();
    if lines.next().map(str::trim) != Some("---") {
        return Vec::new();
    }

    let mut pairs = Vec::new();
    for line in lines {
        if line.trim() == "---" {
            break;
        }
        let Some((name, level)) = line.rsplit_once(':') else {
            continue;
        };
        let name = name.trim().trim_matches('\'').trim_matches('"').trim();
        if name.is_empty() {
            continue;
        }
        if let Some(bump) = BumpLevel::parse(level) {
            pairs.push((name.to_string(), bump));
        }
    }
    pairs
}
