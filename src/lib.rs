//! # clib_release
//!
//! Release coordination for wrapper packages generated from upstream C
//! libraries.
//!
//! Every upstream (C) library version is mapped to a semantically versioned
//! wrapper release. This crate decides whether a proposed mapping is
//! consistent with everything released before, and turns an accepted mapping
//! into tags, releases, published artifacts and maintenance branches.
//!
//! ## Features
//!
//! - **Version Policy**: mapped versions rise monotonically within each upstream major.minor line
//! - **Mapping Table**: the JSON record of every release, written through on each append
//! - **Legacy Maintenance**: older upstream lines get short-lived maintenance branches
//! - **Artifact Publishing**: run artifacts are uploaded in parallel with first-error cancellation
//!
//! ## Usage
//!
//! ```bash
//! clib_release verify                 # check a pull request
//! clib_release postprocess            # tag and release a merged change
//! clib_release labelcreate --label branch:release-branch.cjson/v0.1.1
//! clib_release decide --clib cjson --cversion 1.7.19 --mapped v0.1.2 --legacy
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod env;
pub mod error;
pub mod event;
pub mod git;
pub mod github;
pub mod mapping;
pub mod package;
pub mod policy;
pub mod release;
pub mod sema;
pub mod trailer;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for public API
pub use cli::Args;
pub use env::EnvConfig;
pub use error::{CliError, ReleaseError, Result};
pub use event::ActionContext;
pub use git::{RefManager, RefNaming, RefOperations};
pub use github::{GitHubClient, ReleaseOperations};
pub use mapping::MappingTable;
pub use package::PackageLayout;
pub use policy::{Decision, RejectKind, decide};
pub use release::ReleaseCoordinator;
pub use sema::SemaphoreGroup;

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the per-call timeout, in seconds
pub const TIMEOUT_ENV: &str = "CLIB_RELEASE_TIMEOUT_SECS";

/// Environment variable naming the published mapping table
pub const TABLE_URL_ENV: &str = "CLIB_RELEASE_TABLE_URL";

/// Per-call timeout bounds, in seconds
const TIMEOUT_RANGE: (u64, u64) = (1, 300);

/// Configuration for release operations
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Mapping table file
    pub table_path: PathBuf,
    /// Published copy of the mapping table, read instead of the local file
    pub table_url: Option<String>,
    /// Directory package paths are resolved against
    pub package_root: PathBuf,
    /// Tag, branch and label naming
    pub naming: RefNaming,
    /// Trailer prefix declaring the mapped version
    pub trailer_prefix: String,
    /// Files identifying a package directory
    pub layout: PackageLayout,
    /// Deadline for each remote call
    pub timeout: Duration,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from("llpkgstore.json"),
            table_url: None,
            package_root: PathBuf::from("."),
            naming: RefNaming::default(),
            trailer_prefix: "Release-as: ".to_string(),
            layout: PackageLayout::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ReleaseConfig {
    /// Defaults overridden by the environment
    pub fn from_env(env: &EnvConfig) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = env.get(TIMEOUT_ENV) {
            let secs = raw.parse::<u64>().map_err(|_| CliError::InvalidArguments {
                reason: format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, raw),
            })?;
            config.timeout = clamp_timeout(secs);
        }
        config.table_url = env.get(TABLE_URL_ENV);
        Ok(config)
    }

    /// Set the per-call timeout, clamped to the supported range
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = clamp_timeout(secs);
        self
    }
}

fn clamp_timeout(secs: u64) -> Duration {
    let clamped = secs.clamp(TIMEOUT_RANGE.0, TIMEOUT_RANGE.1);
    if clamped != secs {
        log::warn!("Timeout {}s out of range, using {}s", secs, clamped);
    }
    Duration::from_secs(clamped)
}
