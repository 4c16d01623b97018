//! Typed view of the triggering event and the run context built around it.
//!
//! The payload is parsed once at process start into an [`ActionContext`] that
//! is handed to every component needing it.

use crate::env::EnvConfig;
use crate::error::{FormatError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// A branch pointer in a pull request
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RefPoint {
    /// Branch name
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Commit the branch pointed to
    #[serde(default)]
    pub sha: Option<String>,
}

/// Pull request section of an event
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PullRequestEvent {
    /// Pull request number
    pub number: u64,
    /// Target branch
    pub base: RefPoint,
    /// Source branch
    #[serde(default)]
    pub head: Option<RefPoint>,
    /// Whether it has been merged
    #[serde(default)]
    pub merged: Option<bool>,
}

/// Issue label
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Label {
    /// Label name
    pub name: String,
}

/// Issue section of an event
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IssueEvent {
    /// Issue number
    pub number: u64,
    /// Labels attached to the issue
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// The parts of an event payload this tool reads. Absent sections are `None`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EventPayload {
    /// Present for pull request events
    #[serde(default)]
    pub pull_request: Option<PullRequestEvent>,
    /// Present for issue events
    #[serde(default)]
    pub issue: Option<IssueEvent>,
    /// Present for label events
    #[serde(default)]
    pub label: Option<Label>,
}

impl EventPayload {
    /// Parse a payload document
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            FormatError::Event {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Everything a run knows about why it was started
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Commit the run was triggered for
    pub sha: String,
    /// Workflow run id
    pub run_id: Option<u64>,
    /// Paths changed by the change under test
    pub changed_files: Vec<String>,
    /// Parsed event payload
    pub event: EventPayload,
    /// Step output file
    pub output_path: Option<PathBuf>,
}

impl ActionContext {
    /// Read the environment and parse the event payload once.
    pub fn from_env(env: &EnvConfig) -> Result<Self> {
        let (owner, repo) = env.repository()?;
        let event = match env.event_path() {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| FormatError::Event {
                    reason: format!("cannot read {}: {}", path.display(), e),
                })?;
                EventPayload::from_json(&content)?
            }
            None => EventPayload::default(),
        };

        Ok(Self {
            owner,
            repo,
            sha: env.sha()?,
            run_id: env.run_id()?,
            changed_files: env.changed_files(),
            event,
            output_path: env.output_path(),
        })
    }

    /// Pull request section, or an error naming the operation that needed it
    pub fn pull_request(&self, operation: &str) -> Result<&PullRequestEvent> {
        self.event.pull_request.as_ref().ok_or_else(|| {
            FormatError::Event {
                reason: format!("{} requires a pull_request event", operation),
            }
            .into()
        })
    }

    /// Issue section, or an error naming the operation that needed it
    pub fn issue(&self, operation: &str) -> Result<&IssueEvent> {
        self.event.issue.as_ref().ok_or_else(|| {
            FormatError::Event {
                reason: format!("{} requires an issue event", operation),
            }
            .into()
        })
    }
}
