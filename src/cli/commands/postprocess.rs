//! Postprocess command implementation.
//!
//! Runs on pushes to a release branch after a pull request was merged.

use super::helpers::{coordinator, load_table};
use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::release::FinalizeOutcome;

/// Execute postprocess command
pub(super) async fn execute_postprocess(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let coordinator = coordinator(args)?;
    let mut table = load_table(&coordinator).await?;

    match coordinator.finalize(&mut table).await? {
        FinalizeOutcome::AlreadyReleased { tag } => {
            config.warning_println(&format!("{} is already released, nothing to do", tag));
        }
        FinalizeOutcome::Released {
            tag,
            release_url,
            artifacts,
            deleted_branch,
        } => {
            config.success_println(&format!("Released {}", tag));
            config.indent(&release_url);
            config.indent(&format!("{} artifact(s) attached", artifacts));
            if let Some(branch) = deleted_branch {
                config.indent(&format!("deleted maintenance branch {}", branch));
            }
            if let Some(path) = table.path() {
                config.verbose_println(&format!("Mapping table written to {}", path.display()));
            }
        }
    }
    Ok(0)
}
