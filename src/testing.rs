//! In-memory hosting service for unit tests.

use crate::error::{RemoteError, Result};
use crate::git::{CommitInfo, PullRequestInfo, RefOperations};
use crate::github::{ArtifactInfo, ReleaseInfo, ReleaseOperations, ReleaseRequest};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct FakeState {
    pub tags: BTreeMap<String, String>,
    pub branches: BTreeMap<String, String>,
    pub labels: BTreeSet<String>,
    pub pulls: BTreeMap<String, Vec<PullRequestInfo>>,
    pub pull_commits: BTreeMap<u64, Vec<CommitInfo>>,
    pub commits: BTreeMap<String, CommitInfo>,
    pub recent: Vec<CommitInfo>,
    pub releases: Vec<ReleaseRequest>,
    pub artifacts: Vec<ArtifactInfo>,
    pub published: Vec<String>,
    pub failing_artifact: Option<String>,
    /// Mutating calls in order
    pub calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<FakeState>,
}

fn not_found(operation: &str) -> RemoteError {
    RemoteError::Status {
        operation: operation.to_string(),
        status: 404,
        body: "Not Found".to_string(),
    }
}

impl FakeHost {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_tag(&self, name: &str, sha: &str) {
        self.state().tags.insert(name.to_string(), sha.to_string());
    }

    pub fn add_branch(&self, name: &str, sha: &str) {
        self.state().branches.insert(name.to_string(), sha.to_string());
    }

    pub fn add_label(&self, name: &str) {
        self.state().labels.insert(name.to_string());
    }

    pub fn add_pull(&self, sha: &str, number: u64, base: &str, merged: bool) {
        self.state()
            .pulls
            .entry(sha.to_string())
            .or_default()
            .push(PullRequestInfo {
                number,
                base_ref: base.to_string(),
                merged,
            });
    }

    pub fn add_pull_commit(&self, number: u64, sha: &str, message: &str) {
        self.state()
            .pull_commits
            .entry(number)
            .or_default()
            .push(CommitInfo {
                sha: sha.to_string(),
                message: message.to_string(),
            });
    }

    pub fn add_commit(&self, sha: &str, message: &str) {
        let commit = CommitInfo {
            sha: sha.to_string(),
            message: message.to_string(),
        };
        let mut state = self.state();
        state.commits.insert(sha.to_string(), commit.clone());
        state.recent.push(commit);
    }

    pub fn add_artifact(&self, id: u64, name: &str) {
        self.state().artifacts.push(ArtifactInfo {
            id,
            name: name.to_string(),
        });
    }

    pub fn fail_artifact(&self, name: &str) {
        self.state().failing_artifact = Some(name.to_string());
    }

    pub fn branch_sha(&self, name: &str) -> Option<String> {
        self.state().branches.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

impl RefOperations for FakeHost {
    async fn tag_exists(&self, tag_name: &str) -> Result<bool> {
        Ok(self.state().tags.contains_key(tag_name))
    }

    async fn branch_exists(&self, branch_name: &str) -> Result<bool> {
        Ok(self.state().branches.contains_key(branch_name))
    }

    async fn create_tag(&self, tag_name: &str, sha: &str) -> Result<()> {
        let mut state = self.state();
        state.tags.insert(tag_name.to_string(), sha.to_string());
        state.calls.push(format!("tag {}", tag_name));
        Ok(())
    }

    async fn create_branch(&self, branch_name: &str, sha: &str) -> Result<()> {
        let mut state = self.state();
        state.branches.insert(branch_name.to_string(), sha.to_string());
        state.calls.push(format!("branch {}", branch_name));
        Ok(())
    }

    async fn delete_branch(&self, branch_name: &str) -> Result<()> {
        let mut state = self.state();
        if state.branches.remove(branch_name).is_none() {
            return Err(not_found("delete branch").into());
        }
        state.calls.push(format!("delete-branch {}", branch_name));
        Ok(())
    }

    async fn sha_of_tag(&self, tag_name: &str) -> Result<String> {
        self.state()
            .tags
            .get(tag_name)
            .cloned()
            .ok_or_else(|| not_found("resolve tag").into())
    }

    async fn pulls_with_commit(&self, sha: &str) -> Result<Vec<PullRequestInfo>> {
        Ok(self.state().pulls.get(sha).cloned().unwrap_or_default())
    }

    async fn pull_commits(&self, number: u64) -> Result<Vec<CommitInfo>> {
        Ok(self.state().pull_commits.get(&number).cloned().unwrap_or_default())
    }

    async fn commit(&self, sha: &str) -> Result<CommitInfo> {
        self.state()
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| not_found("get commit").into())
    }

    async fn recent_commits(&self) -> Result<Vec<CommitInfo>> {
        Ok(self.state().recent.clone())
    }

    async fn delete_label(&self, label_name: &str) -> Result<()> {
        let mut state = self.state();
        if !state.labels.remove(label_name) {
            return Err(not_found("delete label").into());
        }
        state.calls.push(format!("delete-label {}", label_name));
        Ok(())
    }
}

impl ReleaseOperations for FakeHost {
    async fn create_release(&self, request: &ReleaseRequest) -> Result<ReleaseInfo> {
        let mut state = self.state();
        state.releases.push(request.clone());
        state.calls.push(format!("release {}", request.tag_name));
        Ok(ReleaseInfo {
            id: state.releases.len() as u64,
            html_url: format!("https://example.invalid/releases/{}", request.tag_name),
            upload_url: "https://uploads.example.invalid/assets{?name,label}".to_string(),
            name: Some(request.name.clone()),
        })
    }

    async fn list_run_artifacts(&self, _run_id: u64) -> Result<Vec<ArtifactInfo>> {
        Ok(self.state().artifacts.clone())
    }

    async fn publish_artifact(&self, _release: &ReleaseInfo, artifact: &ArtifactInfo) -> Result<()> {
        let mut state = self.state();
        if state.failing_artifact.as_deref() == Some(artifact.name.as_str()) {
            return Err(RemoteError::Request {
                operation: format!("upload {}", artifact.name),
                reason: "connection reset".to_string(),
            }
            .into());
        }
        state.published.push(artifact.name.clone());
        Ok(())
    }
}

/// Create a package directory under `root` holding a descriptor and `markers`.
pub fn write_package(root: &Path, dir: &str, name: &str, version: &str, markers: &[&str]) {
    let dir = root.join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("llpkg.cfg"),
        format!(
            r#"{{"upstream": {{"installer": {{"name": "conan"}}, "package": {{"name": "{}", "version": "{}"}}}}}}"#,
            name, version
        ),
    )
    .unwrap();
    for marker in markers {
        std::fs::write(dir.join(marker), "").unwrap();
    }
}
