//! Maintenance branches for legacy upstream lines.

use super::ReleaseCoordinator;
use crate::error::{FormatError, PolicyError, Result};
use crate::git::RefOperations;
use crate::github::ReleaseOperations;
use crate::mapping::MappingTable;
use crate::version;
use regex::Regex;

/// Result of handling a maintenance label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The branch was already there
    Exists {
        /// Branch name
        branch: String,
    },
    /// The branch was created
    Created {
        /// Branch name
        branch: String,
        /// Commit it points to
        sha: String,
    },
}

/// Result of cleaning up after a maintenance issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelOutcome {
    /// Issue that was closed
    pub issue: u64,
    /// Deleted label
    pub label: String,
}

impl<H> ReleaseCoordinator<H>
where
    H: RefOperations + ReleaseOperations + 'static,
{
    /// Label to act on: the explicit one, or the label of the triggering event
    pub fn event_label(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.ctx.event.label.as_ref().map(|l| l.name.clone()))
            .ok_or_else(|| {
                FormatError::Event {
                    reason: "no label given and the event carries none".to_string(),
                }
                .into()
            })
    }

    /// Open the maintenance branch a `branch:` label asks for.
    ///
    /// The branch starts at the tag of the mapped version embedded in the
    /// label. Libraries whose history cannot be ordered are refused.
    pub async fn create_branch_from_label(&self, table: &MappingTable, label: &str) -> Result<BranchOutcome> {
        let naming = &self.config.naming;
        let (branch, declared) = naming.parse_label(label)?;

        if self.host.branch_exists(&branch).await? {
            log::info!("Branch {} already exists", branch);
            return Ok(BranchOutcome::Exists { branch });
        }

        let cversions = table.c_versions(&declared.clib);
        if cversions.is_empty() {
            return Err(PolicyError::NoClibHistory {
                clib: declared.clib,
            }
            .into());
        }
        if !version::all_semver(cversions.as_slice()) {
            return Err(PolicyError::UnorderableHistory {
                clib: declared.clib,
            }
            .into());
        }

        let sha = self
            .refs()
            .create_branch_from_tag(&branch, &declared.tag_name())
            .await?;
        Ok(BranchOutcome::Created { branch, sha })
    }

    /// Delete the maintenance label of an issue closed by a merged change.
    pub async fn clean_label(&self) -> Result<LabelOutcome> {
        let issue = self.ctx.issue("issueclose")?;
        let closing = closing_regex(issue.number)?;

        let mut closed = false;
        for commit in self.host.recent_commits().await? {
            if closing.is_match(&commit.message) && self.refs().is_merge_commit(&commit.sha).await? {
                log::info!("Issue #{} closed by {}", issue.number, commit.sha);
                closed = true;
                break;
            }
        }
        if !closed {
            return Err(PolicyError::IssueNotClosed {
                number: issue.number,
            }
            .into());
        }

        let naming = &self.config.naming;
        let label = issue
            .labels
            .iter()
            .map(|l| l.name.as_str())
            .find(|name| naming.is_branch_label(name))
            .ok_or_else(|| PolicyError::NoBranchLabel {
                number: issue.number,
                prefix: naming.label_prefix.clone(),
            })?;

        self.host.delete_label(label).await?;
        log::info!("Deleted label {}", label);
        Ok(LabelOutcome {
            issue: issue.number,
            label: label.to_string(),
        })
    }
}

/// `fix ... #<number>` with nothing numeric after the issue number
fn closing_regex(number: u64) -> Result<Regex> {
    Regex::new(&format!(r"[fF]ix.*#{}\b", number)).map_err(|e| {
        FormatError::Event {
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReleaseConfig;
    use crate::error::ReleaseError;
    use crate::event::{ActionContext, EventPayload, IssueEvent, Label};
    use crate::testing::FakeHost;
    use std::sync::Arc;

    fn coordinator(host: &Arc<FakeHost>, event: EventPayload) -> ReleaseCoordinator<FakeHost> {
        let ctx = ActionContext {
            sha: "head".to_string(),
            event,
            ..Default::default()
        };
        ReleaseCoordinator::new(Arc::clone(host), ReleaseConfig::default(), ctx)
    }

    fn history() -> MappingTable {
        MappingTable::from_json(r#"{"cjson": {"1.7.18": ["v0.1.1"], "1.8.18": ["v0.2.0"]}, "libxml": {"2.9": ["v1.0.0"], "snapshot": ["v1.1.0"]}}"#)
            .unwrap()
    }

    fn issue_event(number: u64, labels: &[&str]) -> EventPayload {
        EventPayload {
            issue: Some(IssueEvent {
                number,
                labels: labels
                    .iter()
                    .map(|name| Label {
                        name: name.to_string(),
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_creates_branch_at_tag() {
        let host = Arc::new(FakeHost::default());
        host.add_tag("cjson/v0.1.1", "c0ffee");
        let c = coordinator(&host, EventPayload::default());

        let outcome = c
            .create_branch_from_label(&history(), "branch:release-branch.cjson/v0.1.1")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BranchOutcome::Created {
                branch: "release-branch.cjson/v0.1.1".to_string(),
                sha: "c0ffee".to_string(),
            }
        );

        // a second delivery of the same label changes nothing
        let outcome = c
            .create_branch_from_label(&history(), "branch:release-branch.cjson/v0.1.1")
            .await
            .unwrap();
        assert!(matches!(outcome, BranchOutcome::Exists { .. }));
        assert_eq!(host.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_refuses_unknown_or_unorderable_libraries() {
        let host = Arc::new(FakeHost::default());
        let c = coordinator(&host, EventPayload::default());

        let err = c
            .create_branch_from_label(&history(), "branch:release-branch.zlib/v1.0.0")
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Policy(PolicyError::NoClibHistory { .. })));

        let err = c
            .create_branch_from_label(&history(), "branch:release-branch.libxml/v1.0.0")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::Policy(PolicyError::UnorderableHistory { .. })
        ));

        let err = c
            .create_branch_from_label(&history(), "release-branch.cjson/v0.1.1")
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Format(FormatError::InvalidLabel { .. })));
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_label_from_event() {
        let host = Arc::new(FakeHost::default());
        let event = EventPayload {
            label: Some(Label {
                name: "branch:release-branch.cjson/v0.1.1".to_string(),
            }),
            ..Default::default()
        };
        let c = coordinator(&host, event);
        assert_eq!(
            c.event_label(None).unwrap(),
            "branch:release-branch.cjson/v0.1.1"
        );
        assert_eq!(c.event_label(Some("x")).unwrap(), "x");

        let c = coordinator(&host, EventPayload::default());
        assert!(c.event_label(None).is_err());
    }

    #[tokio::test]
    async fn test_clean_label_after_merged_fix() {
        let host = Arc::new(FakeHost::default());
        host.add_commit("aaa", "Fix typo #4");
        host.add_commit("bbb", "fix: backport cjson 1.7.19 (#41)\n\nRelease-as: cjson/v0.1.2");
        host.add_commit("ccc", "fix: backport cjson 1.7.19 #4");
        host.add_pull("bbb", 40, "release-branch.cjson/v0.1.1", true);
        host.add_pull("ccc", 42, "release-branch.cjson/v0.1.1", true);
        host.add_label("branch:release-branch.cjson/v0.1.1");

        let c = coordinator(&host, issue_event(4, &["bug", "branch:release-branch.cjson/v0.1.1"]));
        let outcome = c.clean_label().await.unwrap();
        assert_eq!(outcome.issue, 4);
        assert_eq!(outcome.label, "branch:release-branch.cjson/v0.1.1");
        assert!(host.state().labels.is_empty());
    }

    #[tokio::test]
    async fn test_clean_label_requires_merged_fix() {
        let host = Arc::new(FakeHost::default());
        host.add_commit("aaa", "Fix typo #4");
        host.add_label("branch:release-branch.cjson/v0.1.1");

        let c = coordinator(&host, issue_event(4, &["branch:release-branch.cjson/v0.1.1"]));
        let err = c.clean_label().await.unwrap_err();
        assert!(matches!(err, ReleaseError::Policy(PolicyError::IssueNotClosed { number: 4 })));

        host.add_pull("aaa", 5, "main", true);
        let c = coordinator(&host, issue_event(4, &["bug"]));
        let err = c.clean_label().await.unwrap_err();
        assert!(matches!(err, ReleaseError::Policy(PolicyError::NoBranchLabel { .. })));
    }

    #[test]
    fn test_closing_regex_bounds_the_number() {
        let re = closing_regex(4).unwrap();
        assert!(re.is_match("Fix #4"));
        assert!(re.is_match("fixes the build (#4)"));
        assert!(!re.is_match("Fix #41"));
        assert!(!re.is_match("Refs #4"));
    }
}
