//! Release coordination.
//!
//! The coordinator drives one invocation of the workflow: validating a pull
//! request, finalizing a merged change, opening a maintenance branch from a
//! label, or cleaning up after a maintenance issue is closed.

mod finalize;
mod maintenance;
mod validate;

pub use finalize::FinalizeOutcome;
pub use maintenance::{BranchOutcome, LabelOutcome};
pub use validate::ValidateOutcome;

use crate::ReleaseConfig;
use crate::event::ActionContext;
use crate::git::{RefManager, RefOperations};
use crate::github::ReleaseOperations;
use std::sync::Arc;

/// Orchestrates validation and post-merge finalization over a hosting service
#[derive(Debug)]
pub struct ReleaseCoordinator<H> {
    host: Arc<H>,
    config: ReleaseConfig,
    ctx: ActionContext,
}

impl<H> ReleaseCoordinator<H>
where
    H: RefOperations + ReleaseOperations + 'static,
{
    /// Create a coordinator for one run
    pub fn new(host: Arc<H>, config: ReleaseConfig, ctx: ActionContext) -> Self {
        Self { host, config, ctx }
    }

    /// Hosting service
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run context
    pub fn context(&self) -> &ActionContext {
        &self.ctx
    }

    /// Configuration in use
    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    fn refs(&self) -> RefManager<'_, H> {
        RefManager::new(self.host.as_ref(), &self.config.naming)
    }
}
