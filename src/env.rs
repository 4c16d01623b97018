//! Typed access to the CI environment.
//!
//! Everything the run reads from the process environment goes through
//! [`EnvConfig`] so tests can supply a fixed set of variables.

use crate::error::{FormatError, ReleaseError, Result};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Snapshot of environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Non-empty value of `name`
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Value of `name`, or a [`FormatError::MissingEnv`]
    pub fn require(&self, name: &str) -> Result<String> {
        self.get(name).ok_or_else(|| {
            ReleaseError::Format(FormatError::MissingEnv {
                name: name.to_string(),
            })
        })
    }

    /// API token, preferring `GH_TOKEN` over `GITHUB_TOKEN`
    pub fn token(&self) -> Result<String> {
        self.get("GH_TOKEN")
            .or_else(|| self.get("GITHUB_TOKEN"))
            .ok_or_else(|| {
                ReleaseError::Format(FormatError::MissingEnv {
                    name: "GITHUB_TOKEN".to_string(),
                })
            })
    }

    /// `(owner, repo)` from `GITHUB_REPOSITORY`
    pub fn repository(&self) -> Result<(String, String)> {
        let full = self.require("GITHUB_REPOSITORY")?;
        match full.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(FormatError::Event {
                reason: format!("GITHUB_REPOSITORY '{}' is not owner/repo", full),
            }
            .into()),
        }
    }

    /// Commit the run was triggered for
    pub fn sha(&self) -> Result<String> {
        self.require("GITHUB_SHA")
    }

    /// Workflow run id, when running inside a workflow
    pub fn run_id(&self) -> Result<Option<u64>> {
        match self.get("GITHUB_RUN_ID") {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                FormatError::Event {
                    reason: format!("GITHUB_RUN_ID '{}' is not a number", raw),
                }
                .into()
            }),
        }
    }

    /// Paths changed by the current change, from `ALL_CHANGED_FILES`
    pub fn changed_files(&self) -> Vec<String> {
        self.get("ALL_CHANGED_FILES")
            .map(|all| all.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Event payload file
    pub fn event_path(&self) -> Option<PathBuf> {
        self.get("GITHUB_EVENT_PATH").map(PathBuf::from)
    }

    /// Step output file
    pub fn output_path(&self) -> Option<PathBuf> {
        self.get("GITHUB_OUTPUT").map(PathBuf::from)
    }
}

/// Append `key=value` lines to a step output file.
pub fn write_step_output(path: &Path, outputs: &[(&str, String)]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (key, value) in outputs {
        writeln!(file, "{}={}", key, value)?;
    }
    Ok(())
}
