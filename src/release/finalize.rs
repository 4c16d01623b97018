//! Post-merge finalization.
//!
//! Order matters: the table append comes first since it only governs future
//! decisions, then the irreversible tag, then the visible release and its
//! assets. A tag that already exists means a previous run got that far.

use super::ReleaseCoordinator;
use crate::error::{FormatError, PolicyError, ReleaseError, Result};
use crate::git::RefOperations;
use crate::github::{ArtifactInfo, LatestMode, ReleaseInfo, ReleaseOperations, ReleaseRequest};
use crate::mapping::MappingTable;
use crate::package::PackageDescriptor;
use crate::sema::SemaphoreGroup;
use crate::trailer;
use std::sync::Arc;

/// Result of finalizing a merged change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The tag already existed; nothing was done
    AlreadyReleased {
        /// Existing tag
        tag: String,
    },
    /// A new release was created
    Released {
        /// Created tag
        tag: String,
        /// Release page
        release_url: String,
        /// Number of artifacts attached
        artifacts: usize,
        /// Maintenance branch removed after releasing from it
        deleted_branch: Option<String>,
    },
}

impl<H> ReleaseCoordinator<H>
where
    H: RefOperations + ReleaseOperations + 'static,
{
    /// Record, tag and release the mapped version declared by the merge commit.
    pub async fn finalize(&self, table: &mut MappingTable) -> Result<FinalizeOutcome> {
        let sha = self.ctx.sha.as_str();
        let refs = self.refs();

        if !refs.is_merge_commit(sha).await? {
            return Err(PolicyError::NotMergeCommit {
                sha: sha.to_string(),
            }
            .into());
        }

        let commit = self.host.commit(sha).await?;
        let declared = trailer::find_trailer(&self.config.trailer_prefix, &commit.message, None)?
            .ok_or_else(|| FormatError::MissingTrailer {
                scope: "<clib>".to_string(),
                location: format!("commit {}", sha),
            })?;
        let tag = declared.tag_name();

        if self.host.tag_exists(&tag).await? {
            log::info!("Tag {} already exists, nothing to do", tag);
            return Ok(FinalizeOutcome::AlreadyReleased { tag });
        }

        let package_dir = self.config.package_root.join(&declared.clib);
        let package = PackageDescriptor::load(&package_dir, &self.config.layout)?;
        if table.contains(&package.clib, &package.cversion, &declared.version) {
            // recorded by an earlier run that stopped before tagging
            log::info!("{} already recorded for {} {}", declared.version, package.clib, package.cversion);
        } else {
            table.append(&package.clib, &package.cversion, &declared.version)?;
        }

        refs.create_tag(&tag, sha).await?;

        let (source_branch, legacy) = refs.target_branch(&self.ctx).await?;
        let mode = if legacy { LatestMode::Legacy } else { LatestMode::Latest };
        let release = self
            .host
            .create_release(&ReleaseRequest::for_tag(&tag, sha, mode))
            .await?;
        log::info!("Created release {} ({})", tag, release.html_url);

        let artifacts = self.publish_artifacts(&release).await?;

        let deleted_branch = if legacy {
            refs.delete_branch(&source_branch).await?;
            Some(source_branch)
        } else {
            None
        };

        Ok(FinalizeOutcome::Released {
            tag,
            release_url: release.html_url,
            artifacts,
            deleted_branch,
        })
    }

    /// Attach every artifact of the triggering run to `release`.
    async fn publish_artifacts(&self, release: &ReleaseInfo) -> Result<usize> {
        let Some(run_id) = self.ctx.run_id else {
            log::warn!("No workflow run id, skipping artifact publishing");
            return Ok(0);
        };

        let artifacts = self.host.list_run_artifacts(run_id).await?;
        if artifacts.is_empty() {
            log::warn!("Run {} produced no artifacts", run_id);
        }

        let group: SemaphoreGroup<ReleaseError> = SemaphoreGroup::new(artifacts.len());
        for artifact in &artifacts {
            let host = Arc::clone(&self.host);
            let release = release.clone();
            let artifact: ArtifactInfo = artifact.clone();
            group.go(async move { host.publish_artifact(&release, &artifact).await });
        }
        group.wait().await?;

        log::info!("Published {} artifact(s)", artifacts.len());
        Ok(artifacts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReleaseConfig;
    use crate::error::{InvariantError, RemoteError};
    use crate::event::ActionContext;
    use crate::testing::{FakeHost, write_package};
    use tempfile::TempDir;

    const MERGE: &str = "merge-sha";

    struct Fixture {
        root: TempDir,
        host: Arc<FakeHost>,
    }

    impl Fixture {
        fn new(cversion: &str, message: &str, base: &str) -> Self {
            let root = TempDir::new().unwrap();
            write_package(root.path(), "cjson", "cjson", cversion, &["llcppg.cfg", "go.mod"]);
            let host = Arc::new(FakeHost::default());
            host.add_pull(MERGE, 12, base, true);
            host.add_commit(MERGE, message);
            Self { root, host }
        }

        fn coordinator(&self, run_id: Option<u64>) -> ReleaseCoordinator<FakeHost> {
            let config = ReleaseConfig {
                package_root: self.root.path().to_path_buf(),
                ..Default::default()
            };
            let ctx = ActionContext {
                sha: MERGE.to_string(),
                run_id,
                ..Default::default()
            };
            ReleaseCoordinator::new(Arc::clone(&self.host), config, ctx)
        }

        fn table(&self) -> MappingTable {
            MappingTable::load(self.root.path().join("llpkgstore.json")).unwrap()
        }
    }

    #[tokio::test]
    async fn test_release_from_main() {
        let f = Fixture::new("1.7.18", "Merge #12\n\nRelease-as: cjson/v1.0.0", "main");
        f.host.add_artifact(1, "cjson_linux_amd64");
        f.host.add_artifact(2, "cjson_darwin_arm64");

        let mut table = f.table();
        let outcome = f.coordinator(Some(99)).finalize(&mut table).await.unwrap();
        assert_eq!(
            outcome,
            FinalizeOutcome::Released {
                tag: "cjson/v1.0.0".to_string(),
                release_url: "https://example.invalid/releases/cjson/v1.0.0".to_string(),
                artifacts: 2,
                deleted_branch: None,
            }
        );

        assert_eq!(f.host.calls(), vec!["tag cjson/v1.0.0", "release cjson/v1.0.0"]);
        let state = f.host.state();
        assert_eq!(state.tags.get("cjson/v1.0.0").map(String::as_str), Some(MERGE));
        assert_eq!(state.releases[0].make_latest, "true");
        assert!(state.releases[0].generate_release_notes);
        assert_eq!(state.published.len(), 2);
        drop(state);

        // written through to disk
        assert!(f.table().contains("cjson", "1.7.18", "v1.0.0"));
    }

    #[tokio::test]
    async fn test_release_from_legacy_branch_deletes_it() {
        let branch = "release-branch.cjson/v0.1.1";
        let f = Fixture::new("1.7.19", "Release-as: cjson/v0.1.2", branch);
        f.host.add_branch(branch, "base");

        let mut table = f.table();
        let outcome = f.coordinator(None).finalize(&mut table).await.unwrap();
        match outcome {
            FinalizeOutcome::Released {
                artifacts,
                deleted_branch,
                ..
            } => {
                assert_eq!(artifacts, 0);
                assert_eq!(deleted_branch.as_deref(), Some(branch));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(
            f.host.calls(),
            vec![
                "tag cjson/v0.1.2".to_string(),
                "release cjson/v0.1.2".to_string(),
                format!("delete-branch {}", branch),
            ]
        );
        assert_eq!(f.host.state().releases[0].make_latest, "legacy");
    }

    #[tokio::test]
    async fn test_existing_tag_is_a_no_op() {
        let f = Fixture::new("1.7.18", "Release-as: cjson/v1.0.0", "main");
        f.host.add_tag("cjson/v1.0.0", MERGE);

        let mut table = f.table();
        let outcome = f.coordinator(Some(1)).finalize(&mut table).await.unwrap();
        assert_eq!(
            outcome,
            FinalizeOutcome::AlreadyReleased {
                tag: "cjson/v1.0.0".to_string()
            }
        );
        assert!(f.host.calls().is_empty());
        assert!(!f.root.path().join("llpkgstore.json").exists());
    }

    #[tokio::test]
    async fn test_rerun_after_partial_failure_skips_the_append() {
        let f = Fixture::new("1.7.18", "Release-as: cjson/v1.0.0", "main");
        let mut table = f.table();
        table.append("cjson", "1.7.18", "v1.0.0").unwrap();

        let outcome = f.coordinator(None).finalize(&mut table).await.unwrap();
        assert!(matches!(outcome, FinalizeOutcome::Released { .. }));
        assert_eq!(table.go_versions("cjson"), vec!["v1.0.0"]);
    }

    #[tokio::test]
    async fn test_reused_version_is_an_invariant_error() {
        let f = Fixture::new("1.7.19", "Release-as: cjson/v1.0.0", "main");
        let mut table = f.table();
        table.append("cjson", "1.7.18", "v1.0.0").unwrap();

        let err = f.coordinator(None).finalize(&mut table).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Invariant(InvariantError::DuplicateMappedVersion { .. })
        ));
        assert!(f.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_requires_merged_pull_request() {
        let f = Fixture::new("1.7.18", "Release-as: cjson/v1.0.0", "main");
        f.host.state().pulls.clear();
        f.host.add_pull(MERGE, 12, "main", false);

        let mut table = f.table();
        let err = f.coordinator(None).finalize(&mut table).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Policy(PolicyError::NotMergeCommit { .. })));
    }

    #[tokio::test]
    async fn test_merge_commit_without_trailer() {
        let f = Fixture::new("1.7.18", "Merge pull request #12", "main");
        let mut table = f.table();
        let err = f.coordinator(None).finalize(&mut table).await.unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Format(FormatError::MissingTrailer { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_upload_fails_the_run_and_keeps_the_branch() {
        let branch = "release-branch.cjson/v0.1.1";
        let f = Fixture::new("1.7.19", "Release-as: cjson/v0.1.2", branch);
        f.host.add_branch(branch, "base");
        f.host.add_artifact(1, "cjson_linux_amd64");
        f.host.add_artifact(2, "cjson_darwin_arm64");
        f.host.fail_artifact("cjson_darwin_arm64");

        let mut table = f.table();
        let err = f.coordinator(Some(5)).finalize(&mut table).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Remote(RemoteError::Request { .. })));
        assert!(f.host.branch_sha(branch).is_some());
    }
}
