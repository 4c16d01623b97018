//! Command line argument parsing and validation.
//!
//! Each subcommand corresponds to one workflow trigger. Everything about the
//! triggering event comes from the GitHub Actions environment, so the flags
//! only cover local overrides.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Release coordination for C library wrapper packages
#[derive(Parser, Debug)]
#[command(
    name = "clib_release",
    version,
    about = "Release coordination for C library wrapper packages",
    long_about = "Validate and release wrapper packages whose versions map to upstream C library versions.

Usage:
  clib_release verify
  clib_release postprocess
  clib_release labelcreate --label branch:release-branch.cjson/v0.1.1
  clib_release issueclose
  clib_release decide --clib cjson --cversion 1.7.19 --mapped v0.1.2 --legacy"
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Mapping table file
    #[arg(long, global = true, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Deadline for each remote call, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print progress details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check the package changed by a pull request
    Verify,

    /// Tag, record and release a merged change
    Postprocess,

    /// Open the maintenance branch named by a label
    Labelcreate {
        /// Label to act on; defaults to the label of the triggering event
        #[arg(long)]
        label: Option<String>,
    },

    /// Remove the maintenance label of a closed issue
    Issueclose,

    /// Check a proposed mapping against the table without touching the remote
    Decide {
        /// Upstream library name
        #[arg(long)]
        clib: String,

        /// Upstream version
        #[arg(long)]
        cversion: String,

        /// Proposed mapped version
        #[arg(long)]
        mapped: String,

        /// Treat the proposal as targeting a maintenance branch
        #[arg(long)]
        legacy: bool,
    },
}

impl Command {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Command::Verify => "verify",
            Command::Postprocess => "postprocess",
            Command::Labelcreate { .. } => "labelcreate",
            Command::Issueclose => "issueclose",
            Command::Decide { .. } => "decide",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(table) = &self.table
            && table.as_os_str().is_empty()
        {
            return Err("--table must not be empty".to_string());
        }

        if let Command::Decide {
            clib,
            cversion,
            mapped,
            ..
        } = &self.command
        {
            if clib.trim().is_empty() {
                return Err("--clib must not be empty".to_string());
            }
            if cversion.trim().is_empty() {
                return Err("--cversion must not be empty".to_string());
            }
            // same shape a Release-as trailer requires
            if !mapped.starts_with('v') || !crate::version::is_valid(mapped) {
                return Err(format!(
                    "--mapped '{}' is not a semantic version like v1.2.3",
                    mapped
                ));
            }
        }

        if let Command::Labelcreate { label: Some(label) } = &self.command
            && label.trim().is_empty()
        {
            return Err("--label must not be empty".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        self.output.println(message);
    }

    /// Print message only in verbose mode
    pub fn verbose_println(&self, message: &str) {
        self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        self.output.indent(message);
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}
