//! Labelcreate command implementation.

use super::helpers::{coordinator, load_table};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::release::BranchOutcome;

/// Execute labelcreate command
pub(super) async fn execute_labelcreate(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Labelcreate { label } = &args.command else {
        unreachable!("execute_labelcreate called with non-Labelcreate command");
    };

    let coordinator = coordinator(args)?;
    let label = coordinator.event_label(label.as_deref())?;
    config.verbose_println(&format!("Label: {}", label));

    let table = load_table(&coordinator).await?;
    match coordinator.create_branch_from_label(&table, &label).await? {
        BranchOutcome::Exists { branch } => {
            config.warning_println(&format!("Branch {} already exists", branch));
        }
        BranchOutcome::Created { branch, sha } => {
            config.success_println(&format!("Created {} at {}", branch, sha));
        }
    }
    Ok(0)
}
