//! Ref manager for coordinating release refs.
//!
//! Derives tag and branch names from mapped versions and answers the
//! questions the release workflow asks about pull requests and their targets.

mod config;

pub use config::RefNaming;

use crate::error::{PolicyError, Result};
use crate::event::ActionContext;
use crate::git::{PullRequestInfo, RefOperations};

/// High-level ref manager over a [`RefOperations`] implementation
#[derive(Debug)]
pub struct RefManager<'a, H> {
    /// Underlying repository operations
    ops: &'a H,
    /// Naming conventions
    naming: &'a RefNaming,
}

impl<'a, H: RefOperations> RefManager<'a, H> {
    /// Create a manager borrowing `ops` and `naming`
    pub fn new(ops: &'a H, naming: &'a RefNaming) -> Self {
        Self { ops, naming }
    }

    /// Naming conventions in use
    pub fn naming(&self) -> &RefNaming {
        self.naming
    }

    /// Branch the change targets.
    ///
    /// Pull request events carry it directly; otherwise the first pull request
    /// containing the run commit decides.
    pub async fn resolve_target_branch(&self, ctx: &ActionContext) -> Result<String> {
        if let Some(pr) = &ctx.event.pull_request {
            return Ok(pr.base.ref_name.clone());
        }

        let pulls = self.ops.pulls_with_commit(&ctx.sha).await?;
        match pulls.into_iter().next() {
            Some(pr) => Ok(pr.base_ref),
            None => Err(PolicyError::NotMergeCommit {
                sha: ctx.sha.clone(),
            }
            .into()),
        }
    }

    /// Target branch and whether it is a maintenance branch
    pub async fn target_branch(&self, ctx: &ActionContext) -> Result<(String, bool)> {
        let branch = self.resolve_target_branch(ctx).await?;
        let legacy = self.naming.is_legacy_branch(&branch);
        log::debug!("Target branch {} (legacy: {})", branch, legacy);
        Ok((branch, legacy))
    }

    /// Merged pull request that produced `sha`, if any
    pub async fn merged_pull_request(&self, sha: &str) -> Result<Option<PullRequestInfo>> {
        let pulls = self.ops.pulls_with_commit(sha).await?;
        Ok(pulls.into_iter().next().filter(|pr| pr.merged))
    }

    /// Whether `sha` is the merge result of a pull request
    pub async fn is_merge_commit(&self, sha: &str) -> Result<bool> {
        Ok(self.merged_pull_request(sha).await?.is_some())
    }

    /// Create `tag_name` at `sha`
    pub async fn create_tag(&self, tag_name: &str, sha: &str) -> Result<()> {
        self.ops.create_tag(tag_name, sha).await?;
        log::info!("Created tag {} at {}", tag_name, sha);
        Ok(())
    }

    /// Create `branch_name` at the commit `tag_name` points to
    pub async fn create_branch_from_tag(&self, branch_name: &str, tag_name: &str) -> Result<String> {
        let sha = self.ops.sha_of_tag(tag_name).await?;
        self.ops.create_branch(branch_name, &sha).await?;
        log::info!("Created branch {} from {} ({})", branch_name, tag_name, sha);
        Ok(sha)
    }

    /// Delete a maintenance branch
    pub async fn delete_branch(&self, branch_name: &str) -> Result<()> {
        self.ops.delete_branch(branch_name).await?;
        log::info!("Deleted branch {}", branch_name);
        Ok(())
    }
}
