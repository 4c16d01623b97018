//! Error types for release coordination.
//!
//! Every failure a run can hit is one of a small number of kinds: a malformed
//! input, a policy rejection, a failed remote call, or a broken invariant. Each
//! kind carries enough context to tell the author what to fix before re-running.

use crate::policy::RejectKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Malformed trailers, labels, descriptors or event payloads
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// The proposed release is inconsistent with history
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Hosting API failures
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Internal consistency violations
    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input that does not have the expected shape
#[derive(Error, Debug)]
pub enum FormatError {
    /// A `Release-as:` value that is not `<clib>/<semver>`
    #[error("Invalid mapped version '{value}': {reason}")]
    InvalidMappedVersion {
        /// Offending value
        value: String,
        /// Reason for the error
        reason: String,
    },

    /// No `Release-as:` trailer was found
    #[error("No 'Release-as: {scope}/<semver>' trailer found in {location}")]
    MissingTrailer {
        /// Library the trailer was expected for, or `<clib>`
        scope: String,
        /// Where we looked
        location: String,
    },

    /// A label that does not follow the maintenance naming convention
    #[error("Invalid label '{label}': expected '{expected}'")]
    InvalidLabel {
        /// Label name
        label: String,
        /// Expected shape
        expected: String,
    },

    /// A package descriptor that cannot be read
    #[error("Invalid package descriptor at {path}: {reason}")]
    Descriptor {
        /// Descriptor path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Event payload problems
    #[error("Invalid event payload: {reason}")]
    Event {
        /// Reason for the error
        reason: String,
    },

    /// A required environment variable is absent
    #[error("Environment variable {name} is not set")]
    MissingEnv {
        /// Variable name
        name: String,
    },
}

/// Reasons a change is refused
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The version policy engine rejected the mapping
    #[error("{clib} {cversion} -> {mapped} rejected: {kind}")]
    Rejected {
        /// Library name
        clib: String,
        /// Upstream version
        cversion: String,
        /// Proposed mapped version
        mapped: String,
        /// Rejection kind
        kind: RejectKind,
    },

    /// No changed directory is a package root
    #[error("No package directory in this change; '{descriptor}' and its companion files must exist")]
    NoPackage {
        /// Descriptor file name
        descriptor: String,
    },

    /// More than one package directory changed
    #[error("Too many package directories in one change: {dirs:?}")]
    TooManyPackages {
        /// Directories found
        dirs: Vec<PathBuf>,
    },

    /// The directory name differs from the descriptor's library name
    #[error("Directory '{dir}' does not match the package name '{name}'")]
    PackageNameMismatch {
        /// Directory
        dir: PathBuf,
        /// Name in the descriptor
        name: String,
    },

    /// The commit is not the result of a merged pull request
    #[error("Commit {sha} is not associated with a merged pull request")]
    NotMergeCommit {
        /// Commit SHA
        sha: String,
    },

    /// No release history exists for the library
    #[error("No recorded C versions for '{clib}'")]
    NoClibHistory {
        /// Library name
        clib: String,
    },

    /// The library's versions cannot be ordered
    #[error("C versions of '{clib}' do not follow semver; legacy maintenance is unavailable")]
    UnorderableHistory {
        /// Library name
        clib: String,
    },

    /// The issue was not closed by a merged pull request
    #[error("Issue #{number} was not closed by a merged pull request")]
    IssueNotClosed {
        /// Issue number
        number: u64,
    },

    /// The issue carries no maintenance label
    #[error("Issue #{number} has no label starting with '{prefix}'")]
    NoBranchLabel {
        /// Issue number
        number: u64,
        /// Expected label prefix
        prefix: String,
    },
}

/// Hosting API failures
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The request could not be sent or the body could not be read
    #[error("{operation} failed: {reason}")]
    Request {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// The API answered with an unexpected status
    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        /// Operation that failed
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The per-call deadline elapsed
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Deadline in seconds
        seconds: u64,
    },

    /// The operation was cancelled before it finished
    #[error("{operation} was cancelled")]
    Cancelled {
        /// Operation that was cancelled
        operation: String,
    },
}

/// Defects: states the surrounding checks guarantee cannot happen
#[derive(Error, Debug)]
pub enum InvariantError {
    /// An append would record a mapped version twice
    #[error("mapped version {version} already exists for '{clib}'")]
    DuplicateMappedVersion {
        /// Library name
        clib: String,
        /// Mapped version
        version: String,
    },

    /// The closest smaller C version has no recorded mapped version
    #[error("cannot resolve the mapped version recorded for '{clib}' {cversion}")]
    ClosestVersionNotFound {
        /// Library name
        clib: String,
        /// Canonical C version
        cversion: String,
    },

    /// More units were submitted to a publishing group than it reserved
    #[error("publishing group reserved {size} units but {submitted} were submitted")]
    GroupSize {
        /// Reserved budget
        size: usize,
        /// Submitted units
        submitted: usize,
    },

    /// A publishing unit panicked
    #[error("publishing unit panicked: {reason}")]
    UnitPanicked {
        /// Panic message
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl RemoteError {
    /// Classify a transport failure for `operation`
    pub fn from_reqwest(operation: &str, e: reqwest::Error, timeout: std::time::Duration) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout {
                operation: operation.to_string(),
                seconds: timeout.as_secs(),
            }
        } else {
            RemoteError::Request {
                operation: operation.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Policy(PolicyError::Rejected { kind, clib, .. }) => match kind {
                RejectKind::DuplicateMappedVersion => vec![
                    format!("Pick a mapped version that was never released for '{}'", clib),
                    "Update the 'Release-as:' trailer and push again".to_string(),
                ],
                RejectKind::NotMonotonic => vec![
                    "The mapped version must not be lower than the latest one in its line".to_string(),
                    "Bump the 'Release-as:' version above the recorded maximum".to_string(),
                ],
                RejectKind::WrongTarget => vec![
                    "Older upstream versions must target a maintenance branch".to_string(),
                    "Open a maintenance issue and add a 'branch:' label to create the branch".to_string(),
                ],
                RejectKind::HistoricalResubmission => vec![
                    "A newer patch of this minor line has already shipped".to_string(),
                    "Submit the newest patch of the line instead".to_string(),
                ],
                RejectKind::NotFound => vec![
                    "The mapping table is inconsistent; inspect it before re-running".to_string(),
                ],
            },
            ReleaseError::Format(FormatError::MissingTrailer { scope, .. }) => vec![format!(
                "Add a line 'Release-as: {}/v<major>.<minor>.<patch>' to a commit message",
                scope
            )],
            ReleaseError::Format(FormatError::MissingEnv { name }) => vec![
                format!("Export {} before running", name),
                "This tool is meant to run inside a CI workflow".to_string(),
            ],
            ReleaseError::Remote(RemoteError::Status { status: 401, .. })
            | ReleaseError::Remote(RemoteError::Status { status: 403, .. }) => vec![
                "Check that GH_TOKEN or GITHUB_TOKEN is set and has write access".to_string(),
            ],
            ReleaseError::Remote(RemoteError::Timeout { .. }) => vec![
                "Re-run the workflow; finished steps are skipped".to_string(),
                "Raise CLIB_RELEASE_TIMEOUT_SECS if the API is slow".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if re-running without changing inputs can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReleaseError::Remote(_) | ReleaseError::Io(_))
    }
}
