//! Persistent record of every (C version -> mapped version) release.
//!
//! The table is the only source of truth for what has already shipped. It is
//! loaded at the start of every run and rewritten in full on each append.

use crate::error::{InvariantError, Result};
use crate::version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upstream version -> mapped versions released for it
pub type MappingEntries = BTreeMap<String, Vec<String>>;

/// In-memory mapping table bound to an optional backing file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    libraries: BTreeMap<String, MappingEntries>,

    #[serde(skip)]
    path: Option<PathBuf>,
}

impl MappingTable {
    /// An empty table with no backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Read the table at `path`, or start an empty one if the file is missing.
    ///
    /// The file itself is only created by the first [`append`](Self::append).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut table = Self::from_json(&content)?;
        table.path = Some(path.to_path_buf());
        log::debug!(
            "Loaded mapping table from {} ({} libraries)",
            path.display(),
            table.libraries.len()
        );
        Ok(table)
    }

    /// Parse a table document. Blank input is an empty table.
    pub fn from_json(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Bind the table to a file written on every append.
    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialized document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.libraries)?)
    }

    fn entries(&self, clib: &str) -> Option<&MappingEntries> {
        self.libraries.get(clib)
    }

    /// Canonical forms of every C version with at least one release.
    ///
    /// Versions that do not parse are returned raw.
    pub fn c_versions(&self, clib: &str) -> Vec<String> {
        self.entries(clib)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, mapped)| !mapped.is_empty())
                    .map(|(cversion, _)| version::to_semver(cversion))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every mapped version ever released for `clib`
    pub fn go_versions(&self, clib: &str) -> Vec<String> {
        self.entries(clib)
            .map(|entries| entries.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Highest mapped version across all C versions
    pub fn latest_mapped_version(&self, clib: &str) -> Option<String> {
        let entries = self.entries(clib)?;
        version::max_version(entries.values().flatten()).map(str::to_string)
    }

    /// Highest mapped version released for one raw C version
    pub fn latest_mapped_version_for(&self, clib: &str, cversion: &str) -> Option<String> {
        let mapped = self.entries(clib)?.get(cversion)?;
        version::max_version(mapped).map(str::to_string)
    }

    /// Raw C versions whose canonical form equals `canonical`.
    ///
    /// `1.5` and `1.5.0` are distinct keys sharing one canonical form.
    pub fn search_by_canonical_version(&self, clib: &str, canonical: &str) -> Vec<String> {
        self.entries(clib)
            .map(|entries| {
                entries
                    .keys()
                    .filter(|cversion| version::to_semver(cversion) == canonical)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Highest mapped version across every raw spelling of `canonical`
    pub fn latest_mapped_version_for_canonical(&self, clib: &str, canonical: &str) -> Option<String> {
        let entries = self.entries(clib)?;
        let mapped = self
            .search_by_canonical_version(clib, canonical)
            .into_iter()
            .filter_map(|raw| entries.get(&raw))
            .flatten();
        version::max_version(mapped).map(str::to_string)
    }

    /// Whether `mapped` is recorded under (`clib`, `cversion`)
    pub fn contains(&self, clib: &str, cversion: &str, mapped: &str) -> bool {
        self.entries(clib)
            .and_then(|entries| entries.get(cversion))
            .is_some_and(|versions| versions.iter().any(|v| v == mapped))
    }

    /// Record `mapped` under (`clib`, `cversion`) and write the table through.
    ///
    /// A mapped version is never reused for the same library; attempting it is
    /// an [`InvariantError::DuplicateMappedVersion`].
    pub fn append(&mut self, clib: &str, cversion: &str, mapped: &str) -> Result<()> {
        if self
            .entries(clib)
            .is_some_and(|entries| entries.values().flatten().any(|v| v == mapped))
        {
            return Err(InvariantError::DuplicateMappedVersion {
                clib: clib.to_string(),
                version: mapped.to_string(),
            }
            .into());
        }

        self.libraries
            .entry(clib.to_string())
            .or_default()
            .entry(cversion.to_string())
            .or_default()
            .push(mapped.to_string());

        log::info!("Recorded {} {} -> {}", clib, cversion, mapped);
        self.persist()
    }

    /// Write the whole document to the backing file through a temp file.
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let serialized = self.to_json()?;
        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
