//! Hosting-service release operations.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Whether a new release becomes the repository's latest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatestMode {
    /// Mark as latest
    Latest,
    /// Released from a maintenance branch
    Legacy,
}

impl LatestMode {
    /// Value of the API's `make_latest` field
    pub fn as_str(&self) -> &'static str {
        match self {
            LatestMode::Latest => "true",
            LatestMode::Legacy => "legacy",
        }
    }
}

/// Parameters for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    /// Tag the release is attached to
    pub tag_name: String,
    /// Commit or branch the tag is created from
    pub target_commitish: String,
    /// Release title
    pub name: String,
    /// `make_latest` value
    pub make_latest: String,
    /// Let the service write the notes
    pub generate_release_notes: bool,
}

impl ReleaseRequest {
    /// Release named after its tag with generated notes
    pub fn for_tag(tag_name: &str, target_commitish: &str, latest: LatestMode) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            target_commitish: target_commitish.to_string(),
            name: tag_name.to_string(),
            make_latest: latest.as_str().to_string(),
            generate_release_notes: true,
        }
    }
}

/// A created release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    /// Release ID
    pub id: u64,
    /// Release page
    #[serde(default)]
    pub html_url: String,
    /// Asset upload URL template
    #[serde(default)]
    pub upload_url: String,
    /// Release title
    #[serde(default)]
    pub name: Option<String>,
}

/// A build artifact produced by a workflow run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactInfo {
    /// Artifact ID
    pub id: u64,
    /// Artifact name
    pub name: String,
}

/// Trait defining the release operations of the hosting service
pub trait ReleaseOperations: Send + Sync {
    /// Create a release for an existing tag
    fn create_release(&self, request: &ReleaseRequest) -> impl Future<Output = Result<ReleaseInfo>> + Send;

    /// Artifacts uploaded by a workflow run
    fn list_run_artifacts(&self, run_id: u64) -> impl Future<Output = Result<Vec<ArtifactInfo>>> + Send;

    /// Download one artifact and attach it to `release`
    fn publish_artifact(
        &self,
        release: &ReleaseInfo,
        artifact: &ArtifactInfo,
    ) -> impl Future<Output = Result<()>> + Send;
}
