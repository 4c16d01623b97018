//! Core ref operations trait and types for release management.
//!
//! This module defines the RefOperations trait that specifies every repository
//! operation the release workflow performs on the hosting service. The REST
//! implementation lives in the github module; tests use an in-memory one.

use crate::error::Result;
use std::future::Future;

/// Trait defining all required repository operations for release management.
///
/// Operations perform no deduplication: callers check existence first.
pub trait RefOperations: Send + Sync {
    /// Check if tag exists
    fn tag_exists(&self, tag_name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Check if branch exists
    fn branch_exists(&self, branch_name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Create a lightweight tag at `sha`
    fn create_tag(&self, tag_name: &str, sha: &str) -> impl Future<Output = Result<()>> + Send;

    /// Create a branch at `sha`
    fn create_branch(&self, branch_name: &str, sha: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete a branch
    fn delete_branch(&self, branch_name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Commit a tag points to
    fn sha_of_tag(&self, tag_name: &str) -> impl Future<Output = Result<String>> + Send;

    /// Pull requests containing `sha`, most relevant first
    fn pulls_with_commit(&self, sha: &str) -> impl Future<Output = Result<Vec<PullRequestInfo>>> + Send;

    /// Commits of a pull request, oldest first
    fn pull_commits(&self, number: u64) -> impl Future<Output = Result<Vec<CommitInfo>>> + Send;

    /// A single commit
    fn commit(&self, sha: &str) -> impl Future<Output = Result<CommitInfo>> + Send;

    /// Latest commits on the default branch
    fn recent_commits(&self) -> impl Future<Output = Result<Vec<CommitInfo>>> + Send;

    /// Delete a repository label
    fn delete_label(&self, label_name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit hash (full SHA)
    pub sha: String,
    /// Commit message
    pub message: String,
}

/// Information about a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    /// Pull request number
    pub number: u64,
    /// Branch it targets
    pub base_ref: String,
    /// Whether it was merged (closed without merging is not enough)
    pub merged: bool,
}
