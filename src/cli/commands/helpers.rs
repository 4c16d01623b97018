//! Shared helper functions for command execution.

use crate::cli::Args;
use crate::env::EnvConfig;
use crate::error::Result;
use crate::event::ActionContext;
use crate::github::GitHubClient;
use crate::mapping::{MappingTable, TableOrigin};
use crate::release::ReleaseCoordinator;
use crate::ReleaseConfig;
use std::sync::Arc;

/// Environment variable pointing at a GitHub Enterprise API
const API_URL_ENV: &str = "GITHUB_API_URL";

/// Library configuration: environment first, then command line overrides
pub(super) fn release_config(args: &Args, env: &EnvConfig) -> Result<ReleaseConfig> {
    let mut config = ReleaseConfig::from_env(env)?;
    if let Some(table) = &args.table {
        config.table_path = table.clone();
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout_secs(secs);
    }
    Ok(config)
}

/// Coordinator over the GitHub API for the current workflow run
pub(super) fn coordinator(args: &Args) -> Result<ReleaseCoordinator<GitHubClient>> {
    let env = EnvConfig::from_process();
    let config = release_config(args, &env)?;
    let ctx = ActionContext::from_env(&env)?;

    let mut client = GitHubClient::new(&env.token()?, &ctx.owner, &ctx.repo, config.timeout)?;
    if let Some(api) = env.get(API_URL_ENV) {
        client = client.with_api_base(&api)?;
    }
    log::debug!("Run {:?} on {}/{} at {}", ctx.run_id, ctx.owner, ctx.repo, ctx.sha);

    Ok(ReleaseCoordinator::new(Arc::new(client), config, ctx))
}

/// Load the mapping table, preferring the published copy when one is configured
pub(super) async fn load_table(coordinator: &ReleaseCoordinator<GitHubClient>) -> Result<MappingTable> {
    let config = coordinator.config();
    let Some(url) = &config.table_url else {
        return MappingTable::load(&config.table_path);
    };

    let (table, origin) = MappingTable::from_release(
        coordinator.host().http(),
        url,
        &config.table_path,
        config.timeout,
    )
    .await?;
    if origin == TableOrigin::Local {
        log::warn!("Mapping table not published yet, using {}", config.table_path.display());
    }
    Ok(table)
}
