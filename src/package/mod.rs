//! Package directories and their descriptors.
//!
//! A package root is a directory holding the descriptor (`llpkg.cfg`) next to
//! every marker file of the layout. The descriptor names the upstream library
//! and the version the package wraps.

use crate::error::{FormatError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Files that make a directory a package root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    /// Descriptor file name
    pub descriptor: String,
    /// Files that must sit next to the descriptor
    pub markers: Vec<String>,
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self {
            descriptor: "llpkg.cfg".to_string(),
            markers: vec!["llcppg.cfg".to_string(), "go.mod".to_string()],
        }
    }
}

impl PackageLayout {
    /// Whether `dir` holds the descriptor and every marker file.
    ///
    /// The directory is read from disk rather than from the change set, so a
    /// change touching only one file still identifies its package.
    pub fn is_package_root(&self, dir: &Path) -> bool {
        std::iter::once(&self.descriptor)
            .chain(&self.markers)
            .all(|name| dir.join(name).is_file())
    }

    /// Distinct parent directories of `changed` that are package roots,
    /// resolved against `root`.
    pub fn package_dirs<S: AsRef<str>>(&self, root: &Path, changed: &[S]) -> Vec<PathBuf> {
        let parents: BTreeSet<PathBuf> = changed
            .iter()
            .map(|path| {
                Path::new(path.as_ref())
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            })
            .collect();

        parents
            .into_iter()
            .filter(|dir| !dir.as_os_str().is_empty())
            .filter(|dir| self.is_package_root(&root.join(dir)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    upstream: UpstreamSection,
}

#[derive(Debug, Deserialize)]
struct UpstreamSection {
    package: PackageSection,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
    version: String,
}

/// Upstream identity read from a package descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Upstream library name
    pub clib: String,
    /// Upstream version, possibly not semver
    pub cversion: String,
}

impl PackageDescriptor {
    /// Read the descriptor inside `dir`
    pub fn load(dir: &Path, layout: &PackageLayout) -> Result<Self> {
        let path = dir.join(&layout.descriptor);
        let content = std::fs::read_to_string(&path).map_err(|e| FormatError::Descriptor {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(&path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let file: DescriptorFile =
            serde_json::from_str(content).map_err(|e| FormatError::Descriptor {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let clib = file.upstream.package.name.trim().to_string();
        let cversion = file.upstream.package.version.trim().to_string();
        if clib.is_empty() || cversion.is_empty() {
            return Err(FormatError::Descriptor {
                path: path.to_path_buf(),
                reason: "upstream.package.name and upstream.package.version are required".to_string(),
            }
            .into());
        }
        Ok(Self { clib, cversion })
    }
}
