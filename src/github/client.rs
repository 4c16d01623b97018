//! REST client for the hosting service.
//!
//! Implements [`RefOperations`] and [`ReleaseOperations`] against the GitHub
//! REST API. Every call carries the client's per-call deadline.

use super::{ArtifactInfo, ReleaseInfo, ReleaseOperations, ReleaseRequest};
use crate::error::{CliError, RemoteError, Result};
use crate::git::{CommitInfo, PullRequestInfo, RefOperations};
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;

/// Public API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com/";

/// One-time initialization guard for the rustls crypto provider
static RUSTLS_INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct AnnotatedTag {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct BaseRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct PullSummary {
    number: u64,
    base: BaseRef,
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    merged_at: Option<String>,
}

impl From<PullSummary> for PullRequestInfo {
    fn from(pull: PullSummary) -> Self {
        Self {
            number: pull.number,
            base_ref: pull.base.ref_name,
            merged: pull.merged.unwrap_or(false) || pull.merged_at.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
    commit: CommitBody,
}

impl From<CommitSummary> for CommitInfo {
    fn from(commit: CommitSummary) -> Self {
        Self {
            sha: commit.sha,
            message: commit.commit.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
    #[serde(default)]
    artifacts: Vec<ArtifactInfo>,
}

/// Authenticated client bound to one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    owner: String,
    repo: String,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client for `owner/repo` authenticated with `token`
    pub fn new(token: &str, owner: &str, repo: &str, timeout: Duration) -> Result<Self> {
        RUSTLS_INITIALIZED.get_or_init(|| {
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                log::debug!("rustls crypto provider already installed");
            }
        });

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            CliError::InvalidArguments {
                reason: "token contains characters not allowed in an HTTP header".to_string(),
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::from_reqwest("build HTTP client", e, timeout))?;

        let api_base = Url::parse(DEFAULT_API_BASE).map_err(|e| CliError::InvalidArguments {
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            api_base,
            owner: owner.to_string(),
            repo: repo.to_string(),
            timeout,
        })
    }

    /// Point the client at another API endpoint, e.g. a GitHub Enterprise server
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        let mut base = api_base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.api_base = Url::parse(&base).map_err(|e| CliError::InvalidArguments {
            reason: format!("invalid API URL '{}': {}", api_base, e),
        })?;
        Ok(self)
    }

    /// Underlying HTTP client, shared with table downloads
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `<api>/repos/<owner>/<repo>/<segments...>`
    fn repo_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| CliError::InvalidArguments {
                reason: format!("API URL '{}' cannot be a base", self.api_base),
            })?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// `git/ref(s)/<kind>/<name>` keeping the slashes inside `name`
    fn ref_url(&self, endpoint: &str, kind: &str, name: &str) -> Result<Url> {
        let mut segments = vec!["git", endpoint, kind];
        segments.extend(name.split('/'));
        self.repo_url(&segments)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| RemoteError::from_reqwest(operation, e, self.timeout).into())
    }

    async fn check(&self, operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn json<T: DeserializeOwned>(&self, operation: &str, response: Response) -> Result<T> {
        let response = self.check(operation, response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::from_reqwest(operation, e, self.timeout).into())
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: Url) -> Result<T> {
        let response = self.send(operation, self.http.get(url)).await?;
        self.json(operation, response).await
    }

    /// 200 means present, 404 absent
    async fn exists(&self, operation: &str, url: Url) -> Result<bool> {
        let response = self.send(operation, self.http.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        self.check(operation, response).await?;
        Ok(true)
    }

    async fn create_ref(&self, operation: &str, full_ref: String, sha: &str) -> Result<()> {
        let url = self.repo_url(&["git", "refs"])?;
        let body = serde_json::json!({ "ref": full_ref, "sha": sha });
        let response = self
            .send(operation, self.http.request(Method::POST, url).json(&body))
            .await?;
        self.check(operation, response).await?;
        Ok(())
    }

    async fn delete(&self, operation: &str, url: Url) -> Result<()> {
        let response = self.send(operation, self.http.delete(url)).await?;
        self.check(operation, response).await?;
        Ok(())
    }

    /// Asset upload endpoint for `release`, with the URI template removed
    fn upload_url(&self, release: &ReleaseInfo, file_name: &str) -> Result<Url> {
        let template = release.upload_url.split('{').next().unwrap_or_default();
        let mut url = Url::parse(template).map_err(|e| RemoteError::Request {
            operation: "upload release asset".to_string(),
            reason: format!("invalid upload URL '{}': {}", release.upload_url, e),
        })?;
        url.query_pairs_mut().append_pair("name", file_name);
        Ok(url)
    }

    async fn download_artifact(&self, artifact: &ArtifactInfo) -> Result<(String, Bytes)> {
        let operation = format!("download artifact {}", artifact.name);
        let url = self.repo_url(&["actions", "artifacts", &artifact.id.to_string(), "zip"])?;
        // the API redirects to blob storage; reqwest drops the token on the cross-host hop
        let response = self.send(&operation, self.http.get(url)).await?;
        let response = self.check(&operation, response).await?;

        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .ok_or_else(|| RemoteError::Request {
                operation: operation.clone(),
                reason: "no filename found in Content-Disposition".to_string(),
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::from_reqwest(&operation, e, self.timeout))?;
        Ok((file_name, body))
    }
}

/// File name from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*` form when present.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let raw = raw.trim();
        match key.as_str() {
            "filename*" => {
                // charset'lang'value
                let decoded = raw.splitn(3, '\'').nth(2).and_then(percent_decode);
                if let Some(decoded) = decoded.filter(|d| !d.is_empty()) {
                    return Some(decoded);
                }
            }
            "filename" => {
                let unquoted = raw.trim_matches('"').to_string();
                if !unquoted.is_empty() {
                    plain = Some(unquoted);
                }
            }
            _ => {}
        }
    }
    plain
}

fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

impl RefOperations for GitHubClient {
    async fn tag_exists(&self, tag_name: &str) -> Result<bool> {
        let url = self.ref_url("ref", "tags", tag_name)?;
        self.exists("look up tag", url).await
    }

    async fn branch_exists(&self, branch_name: &str) -> Result<bool> {
        let url = self.ref_url("ref", "heads", branch_name)?;
        self.exists("look up branch", url).await
    }

    async fn create_tag(&self, tag_name: &str, sha: &str) -> Result<()> {
        self.create_ref("create tag", format!("refs/tags/{}", tag_name), sha)
            .await
    }

    async fn create_branch(&self, branch_name: &str, sha: &str) -> Result<()> {
        self.create_ref("create branch", format!("refs/heads/{}", branch_name), sha)
            .await
    }

    async fn delete_branch(&self, branch_name: &str) -> Result<()> {
        let url = self.ref_url("refs", "heads", branch_name)?;
        self.delete("delete branch", url).await
    }

    async fn sha_of_tag(&self, tag_name: &str) -> Result<String> {
        let operation = "resolve tag";
        let url = self.ref_url("ref", "tags", tag_name)?;
        let found: GitRef = self.get_json(operation, url).await?;
        if found.object.kind != "tag" {
            return Ok(found.object.sha);
        }

        // annotated tag: one more hop to the commit
        let url = self.repo_url(&["git", "tags", &found.object.sha])?;
        let tag: AnnotatedTag = self.get_json(operation, url).await?;
        Ok(tag.object.sha)
    }

    async fn pulls_with_commit(&self, sha: &str) -> Result<Vec<PullRequestInfo>> {
        let url = self.repo_url(&["commits", sha, "pulls"])?;
        let pulls: Vec<PullSummary> = self.get_json("list pull requests for commit", url).await?;
        Ok(pulls.into_iter().map(PullRequestInfo::from).collect())
    }

    async fn pull_commits(&self, number: u64) -> Result<Vec<CommitInfo>> {
        let mut url = self.repo_url(&["pulls", &number.to_string(), "commits"])?;
        url.query_pairs_mut().append_pair("per_page", "100");
        let commits: Vec<CommitSummary> = self.get_json("list pull request commits", url).await?;
        Ok(commits.into_iter().map(CommitInfo::from).collect())
    }

    async fn commit(&self, sha: &str) -> Result<CommitInfo> {
        let url = self.repo_url(&["commits", sha])?;
        let commit: CommitSummary = self.get_json("get commit", url).await?;
        Ok(commit.into())
    }

    async fn recent_commits(&self) -> Result<Vec<CommitInfo>> {
        let mut url = self.repo_url(&["commits"])?;
        url.query_pairs_mut().append_pair("per_page", "100");
        let commits: Vec<CommitSummary> = self.get_json("list commits", url).await?;
        Ok(commits.into_iter().map(CommitInfo::from).collect())
    }

    async fn delete_label(&self, label_name: &str) -> Result<()> {
        let url = self.repo_url(&["labels", label_name])?;
        self.delete("delete label", url).await
    }
}

impl ReleaseOperations for GitHubClient {
    async fn create_release(&self, request: &ReleaseRequest) -> Result<ReleaseInfo> {
        let operation = "create release";
        let url = self.repo_url(&["releases"])?;
        let response = self
            .send(operation, self.http.post(url).json(request))
            .await?;
        self.json(operation, response).await
    }

    async fn list_run_artifacts(&self, run_id: u64) -> Result<Vec<ArtifactInfo>> {
        let mut url = self.repo_url(&["actions", "runs", &run_id.to_string(), "artifacts"])?;
        url.query_pairs_mut().append_pair("per_page", "100");
        let list: ArtifactList = self.get_json("list run artifacts", url).await?;
        Ok(list.artifacts)
    }

    async fn publish_artifact(&self, release: &ReleaseInfo, artifact: &ArtifactInfo) -> Result<()> {
        let (file_name, body) = self.download_artifact(artifact).await?;
        log::info!(
            "Uploading {} ({} bytes) to {}",
            file_name,
            body.len(),
            release.name.as_deref().unwrap_or("release")
        );

        let operation = format!("upload {}", file_name);
        let url = self.upload_url(release, &file_name)?;
        let request = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/zip")
            .body(body);
        let response = self.send(&operation, request).await?;
        self.check(&operation, response).await?;
        Ok(())
    }
}
