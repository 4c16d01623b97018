//! Issueclose command implementation.

use super::helpers::coordinator;
use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;

/// Execute issueclose command
pub(super) async fn execute_issueclose(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let coordinator = coordinator(args)?;
    let outcome = coordinator.clean_label().await?;
    config.success_println(&format!(
        "Removed label {} after issue #{} was closed",
        outcome.label, outcome.issue
    ));
    Ok(0)
}
