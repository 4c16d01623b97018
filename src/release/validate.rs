//! Pull request validation.

use super::ReleaseCoordinator;
use crate::env::write_step_output;
use crate::error::{FormatError, InvariantError, PolicyError, Result};
use crate::git::RefOperations;
use crate::github::ReleaseOperations;
use crate::mapping::MappingTable;
use crate::package::PackageDescriptor;
use crate::policy::{self, Decision, RejectKind};
use crate::trailer::{self, ReleaseTrailer};
use std::path::PathBuf;

/// Result of validating a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    /// Package directories touched by the change
    pub dirs: Vec<PathBuf>,
    /// Upstream identity of the package
    pub package: PackageDescriptor,
    /// Declared mapped version
    pub trailer: ReleaseTrailer,
    /// Branch the pull request targets
    pub target_branch: String,
}

impl<H> ReleaseCoordinator<H>
where
    H: RefOperations + ReleaseOperations + 'static,
{
    /// Check that the pull request changes exactly one package and declares a
    /// mapped version consistent with `table`.
    pub async fn validate(&self, table: &MappingTable) -> Result<ValidateOutcome> {
        let root = &self.config.package_root;
        let layout = &self.config.layout;

        let mut dirs = layout.package_dirs(root, &self.ctx.changed_files);
        if dirs.len() > 1 {
            return Err(PolicyError::TooManyPackages { dirs }.into());
        }
        let Some(dir) = dirs.pop() else {
            return Err(PolicyError::NoPackage {
                descriptor: layout.descriptor.clone(),
            }
            .into());
        };

        let package = PackageDescriptor::load(&root.join(&dir), layout)?;
        if dir != PathBuf::from(&package.clib) {
            return Err(PolicyError::PackageNameMismatch {
                dir,
                name: package.clib,
            }
            .into());
        }
        log::info!("Validating {} {} in {}", package.clib, package.cversion, dir.display());

        let pr = self.ctx.pull_request("verify")?;
        let commits = self.host.pull_commits(pr.number).await?;
        let trailer = trailer::find_in_messages(
            &self.config.trailer_prefix,
            commits.iter().map(|c| c.message.as_str()),
            Some(&package.clib),
        )?
        .ok_or_else(|| FormatError::MissingTrailer {
            scope: package.clib.clone(),
            location: format!("the commits of pull request #{}", pr.number),
        })?;

        let (target_branch, legacy) = self.refs().target_branch(&self.ctx).await?;

        match policy::decide(table, &package.clib, &package.cversion, &trailer.version, legacy) {
            Decision::Accept => {
                log::info!(
                    "Accepted {} {} -> {} on {}",
                    package.clib,
                    package.cversion,
                    trailer.version,
                    target_branch
                );
            }
            Decision::Reject(RejectKind::NotFound) => {
                return Err(InvariantError::ClosestVersionNotFound {
                    clib: package.clib,
                    cversion: package.cversion,
                }
                .into());
            }
            Decision::Reject(kind) => {
                return Err(PolicyError::Rejected {
                    clib: package.clib,
                    cversion: package.cversion,
                    mapped: trailer.version,
                    kind,
                }
                .into());
            }
        }

        let dirs = vec![dir];
        if let Some(output) = &self.ctx.output_path {
            let affected = dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            write_step_output(output, &[("affected", affected)])?;
        }

        Ok(ValidateOutcome {
            dirs,
            package,
            trailer,
            target_branch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReleaseConfig;
    use crate::error::ReleaseError;
    use crate::event::{ActionContext, EventPayload, PullRequestEvent, RefPoint};
    use crate::testing::{FakeHost, write_package};
    use std::sync::Arc;
    use tempfile::TempDir;

    const MARKERS: &[&str] = &["llcppg.cfg", "go.mod"];

    fn history() -> MappingTable {
        MappingTable::from_json(
            r#"{"cjson": {"1.7.16": ["v0.1.0"], "1.7.18": ["v0.1.1", "v0.1.2"], "1.8.18": ["v0.2.0", "v0.2.1"]}}"#,
        )
        .unwrap()
    }

    struct Fixture {
        root: TempDir,
        host: Arc<FakeHost>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: TempDir::new().unwrap(),
                host: Arc::new(FakeHost::default()),
            }
        }

        fn coordinator(&self, base: &str, changed: &[&str]) -> ReleaseCoordinator<FakeHost> {
            let config = ReleaseConfig {
                package_root: self.root.path().to_path_buf(),
                ..Default::default()
            };
            let ctx = ActionContext {
                owner: "goplus".to_string(),
                repo: "llpkg".to_string(),
                sha: "head".to_string(),
                changed_files: changed.iter().map(|s| s.to_string()).collect(),
                event: EventPayload {
                    pull_request: Some(PullRequestEvent {
                        number: 7,
                        base: RefPoint {
                            ref_name: base.to_string(),
                            sha: None,
                        },
                        head: None,
                        merged: None,
                    }),
                    ..Default::default()
                },
                output_path: Some(self.root.path().join("github_output")),
                ..Default::default()
            };
            ReleaseCoordinator::new(Arc::clone(&self.host), config, ctx)
        }
    }

    #[tokio::test]
    async fn test_accepts_new_latest_version() {
        let f = Fixture::new();
        write_package(f.root.path(), "cjson", "cjson", "1.9.1", MARKERS);
        f.host.add_pull_commit(7, "a", "Update cjson");
        f.host.add_pull_commit(7, "b", "Bump\n\nRelease-as: cjson/v0.3.0");

        let outcome = f
            .coordinator("main", &["cjson/llpkg.cfg", "README.md"])
            .validate(&history())
            .await
            .unwrap();
        assert_eq!(outcome.dirs, vec![PathBuf::from("cjson")]);
        assert_eq!(outcome.trailer.version, "v0.3.0");
        assert_eq!(outcome.target_branch, "main");

        let output = std::fs::read_to_string(f.root.path().join("github_output")).unwrap();
        assert_eq!(output, "affected=cjson\n");
    }

    #[tokio::test]
    async fn test_legacy_patch_on_maintenance_branch() {
        let f = Fixture::new();
        write_package(f.root.path(), "cjson", "cjson", "1.7.19", MARKERS);
        f.host.add_pull_commit(7, "a", "Release-as: cjson/v0.1.3");

        let outcome = f
            .coordinator("release-branch.cjson/v0.1.2", &["cjson/cjson.go"])
            .validate(&history())
            .await
            .unwrap();
        assert_eq!(outcome.trailer.version, "v0.1.3");

        // same change against main is refused
        let err = f
            .coordinator("main", &["cjson/cjson.go"])
            .validate(&history())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Policy(PolicyError::Rejected {
                kind: RejectKind::WrongTarget,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_rejects_duplicate_mapped_version() {
        let f = Fixture::new();
        write_package(f.root.path(), "cjson", "cjson", "1.9.1", MARKERS);
        f.host.add_pull_commit(7, "a", "Release-as: cjson/v0.2.1");

        let err = f
            .coordinator("main", &["cjson/llpkg.cfg"])
            .validate(&history())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Policy(PolicyError::Rejected {
                kind: RejectKind::DuplicateMappedVersion,
                ..
            })
        ));
        assert!(!f.root.path().join("github_output").exists());
    }

    #[tokio::test]
    async fn test_package_count_checks() {
        let f = Fixture::new();
        write_package(f.root.path(), "cjson", "cjson", "1.9.1", MARKERS);
        write_package(f.root.path(), "zlib", "zlib", "1.3.1", MARKERS);
        write_package(f.root.path(), "partial", "partial", "1.0.0", &["go.mod"]);

        let err = f
            .coordinator("main", &["README.md", "partial/llpkg.cfg"])
            .validate(&history())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Policy(PolicyError::NoPackage { .. })));

        let err = f
            .coordinator("main", &["cjson/llpkg.cfg", "zlib/llpkg.cfg"])
            .validate(&history())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Policy(PolicyError::TooManyPackages { .. })));
    }

    #[tokio::test]
    async fn test_directory_must_match_package_name() {
        let f = Fixture::new();
        write_package(f.root.path(), "cjson2", "cjson", "1.9.1", MARKERS);

        let err = f
            .coordinator("main", &["cjson2/llpkg.cfg"])
            .validate(&history())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Policy(PolicyError::PackageNameMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_trailer() {
        let f = Fixture::new();
        write_package(f.root.path(), "cjson", "cjson", "1.9.1", MARKERS);
        f.host.add_pull_commit(7, "a", "Release-as: zlib/v9.0.0");

        let err = f
            .coordinator("main", &["cjson/llpkg.cfg"])
            .validate(&history())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Format(FormatError::MissingTrailer { .. })
        ));
    }
}
