//! Verify command implementation.
//!
//! Runs on pull requests: checks the changed package and its declared mapped
//! version against the mapping table.

use super::helpers::{coordinator, load_table};
use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;

/// Execute verify command
pub(super) async fn execute_verify(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let coordinator = coordinator(args)?;
    config.verbose_println(&format!(
        "Changed files: {}",
        coordinator.context().changed_files.join(" ")
    ));

    let table = load_table(&coordinator).await?;
    let outcome = coordinator.validate(&table).await?;

    config.success_println(&format!(
        "{} {} may be released as {}",
        outcome.package.clib, outcome.package.cversion, outcome.trailer.version
    ));
    config.indent(&format!("target branch: {}", outcome.target_branch));
    for dir in &outcome.dirs {
        config.indent(&format!("package: {}", dir.display()));
    }
    Ok(0)
}
