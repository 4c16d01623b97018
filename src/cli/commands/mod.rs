//! Command execution for each workflow trigger.

mod decide;
mod helpers;
mod issueclose;
mod labelcreate;
mod postprocess;
mod verify;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use decide::execute_decide;
use issueclose::execute_issueclose;
use labelcreate::execute_labelcreate;
use postprocess::execute_postprocess;
use verify::execute_verify;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // never quiet for argument errors
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Verify => execute_verify(&args, &config).await,
        Command::Postprocess => execute_postprocess(&args, &config).await,
        Command::Labelcreate { .. } => execute_labelcreate(&args, &config).await,
        Command::Issueclose => execute_issueclose(&args, &config).await,
        Command::Decide { .. } => execute_decide(&args, &config),
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!(
                "Command '{}' failed: {}",
                args.command.name(),
                e
            ));

            if !config.is_quiet() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    config.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        config.indent(&format!("• {}", suggestion));
                    }
                }
                if e.is_recoverable() {
                    config.warning_println(
                        "This failure may be transient; re-running the workflow skips finished steps",
                    );
                }
            }

            Ok(1)
        }
    }
}
