//! Workspace package discovery
//!
//! Reads the root `package.json` and, when a `workspaces` field is present,
//! expands its member patterns into the list of package descriptors. The rest
//! of the bot treats this as an authoritative, read-only view.

use crate::error::{AutopilotError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One package in the workspace. `dir` is relative to the workspace root and
/// empty for a root package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub dir: PathBuf,
    pub version: String,
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    private: bool,
    workspaces: Option<WorkspacesField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Patterns(Vec<String>),
    Detailed { packages: Vec<String> },
}

impl WorkspacesField {
    fn patterns(&self) -> &[String] {
        match self {
            WorkspacesField::Patterns(patterns) => patterns,
            WorkspacesField::Detailed { packages } => packages,
        }
    }
}

/// The discovered workspace: either a set of member packages or a sole root
/// package.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    packages: Vec<PackageDescriptor>,
    single_package: bool,
}

impl Workspace {
    pub fn discover(root: &Path) -> Result<Workspace> {
        let manifest = read_manifest(&root.join("package.json"))?;

        let Some(workspaces) = &manifest.workspaces else {
            let descriptor = descriptor_from(&manifest, PathBuf::new(), root)?;
            return Ok(Workspace {
                root: root.to_path_buf(),
                packages: vec![descriptor],
                single_package: true,
            });
        };

        let mut packages = Vec::new();
        for pattern in workspaces.patterns() {
            for dir in expand_pattern(root, pattern)? {
                let manifest_path = root.join(&dir).join("package.json");
                if !manifest_path.exists() {
                    continue;
                }
                let member = read_manifest(&manifest_path)?;
                packages.push(descriptor_from(&member, dir, root)?);
            }
        }

        // Directory listings come back in arbitrary order; everything
        // downstream expects a stable package order.
        packages.sort_by(|a, b| a.dir.cmp(&b.dir));

        Ok(Workspace {
            root: root.to_path_buf(),
            packages,
            single_package: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    /// Packages eligible for release: private ones are excluded, except the
    /// sole root package of a single-package workspace, which is always
    /// included.
    pub fn publishable(&self) -> Vec<&PackageDescriptor> {
        if self.single_package {
            return self.packages.iter().collect();
        }
        self.packages.iter().filter(|pkg| !pkg.private).collect()
    }

    /// Absolute directory of a package.
    pub fn package_path(&self, package: &PackageDescriptor) -> PathBuf {
        self.root.join(&package.dir)
    }
}

fn read_manifest(path: &Path) -> Result<PackageManifest> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AutopilotError::workspace(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| AutopilotError::workspace(format!("cannot parse {}: {}", path.display(), e)))
}

fn descriptor_from(
    manifest: &PackageManifest,
    dir: PathBuf,
    root: &Path,
) -> Result<PackageDescriptor> {
    let name = manifest.name.clone().ok_or_else(|| {
        AutopilotError::workspace(format!(
            "package at {} has no name",
            root.join(&dir).display()
        ))
    })?;
    let version = manifest.version.clone().unwrap_or_else(|| "0.0.0".to_string());

    Ok(PackageDescriptor {
        name,
        dir,
        version,
        private: manifest.private,
    })
}

/// Expand a workspace pattern into candidate directories, relative to root.
/// Supports literal paths and single trailing-star globs (`packages/*`).
fn expand_pattern(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let normalized = pattern.trim_end_matches('/');

    let Some(prefix) = normalized.strip_suffix("/*") else {
        return Ok(vec![PathBuf::from(normalized)]);
    };

    let base = root.join(prefix);
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(&base)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(PathBuf::from(prefix).join(entry.file_name()));
        }
    }
    Ok(dirs)
}
