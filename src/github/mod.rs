//! GitHub integration for release operations

mod client;
mod operations;

pub use client::{DEFAULT_API_BASE, GitHubClient, filename_from_disposition};
pub use operations::{ArtifactInfo, LatestMode, ReleaseInfo, ReleaseOperations, ReleaseRequest};
