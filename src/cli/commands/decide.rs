//! Decide command implementation.
//!
//! Offline policy check for maintainers: reads only the local mapping table.

use super::helpers::release_config;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::env::EnvConfig;
use crate::error::Result;
use crate::mapping::MappingTable;
use crate::policy::{self, Decision};

/// Execute decide command
pub(super) fn execute_decide(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Decide {
        clib,
        cversion,
        mapped,
        legacy,
    } = &args.command
    else {
        unreachable!("execute_decide called with non-Decide command");
    };

    let release = release_config(args, &EnvConfig::from_process())?;
    let table = MappingTable::load(&release.table_path)?;
    config.verbose_println(&format!(
        "{} has {} recorded C version(s) in {}",
        clib,
        table.c_versions(clib).len(),
        release.table_path.display()
    ));

    let target = if *legacy { "a maintenance branch" } else { "the main line" };
    match policy::decide(&table, clib, cversion, mapped, *legacy) {
        Decision::Accept => {
            config.success_println(&format!(
                "{} {} may be released as {} on {}",
                clib, cversion, mapped, target
            ));
            Ok(0)
        }
        Decision::Reject(kind) => {
            config.error_println(&format!(
                "{} {} cannot be released as {} on {}: {}",
                clib, cversion, mapped, target, kind
            ));
            Ok(1)
        }
    }
}
