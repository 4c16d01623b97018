//! Version policy: decides whether a proposed (C version, mapped version) pair
//! is consistent with everything already released for a library.
//!
//! Within one upstream major.minor line, mapped versions must rise with the
//! upstream patch order. Separate lines have independent ceilings, which lets
//! several legacy lines be maintained side by side.

use crate::mapping::MappingTable;
use crate::version;
use std::cmp::Ordering;
use std::fmt;

/// Why a proposal was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    /// The mapped version was already released for this library
    DuplicateMappedVersion,
    /// The mapped version would regress below an earlier release
    NotMonotonic,
    /// An older upstream version was submitted to the main line
    WrongTarget,
    /// A newer patch of the same major.minor line has already shipped
    HistoricalResubmission,
    /// The closest smaller C version could not be resolved in the table
    NotFound,
}

impl fmt::Display for RejectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectKind::DuplicateMappedVersion => "mapped version has already been released",
            RejectKind::NotMonotonic => "mapped version must not be lower than the previous one",
            RejectKind::WrongTarget => "a legacy version must not be submitted to the main branch",
            RejectKind::HistoricalResubmission => "cannot submit a historical legacy version",
            RejectKind::NotFound => "cannot find the closest recorded C version",
        };
        f.write_str(text)
    }
}

/// Outcome of [`decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The proposal is consistent with history
    Accept,
    /// The proposal must be corrected
    Reject(RejectKind),
}

impl Decision {
    /// Whether the proposal was accepted
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    /// Rejection kind, if any
    pub fn reject_kind(&self) -> Option<RejectKind> {
        match self {
            Decision::Accept => None,
            Decision::Reject(kind) => Some(*kind),
        }
    }
}

/// `0.2.1` and `v0.2.1` name the same release
fn same_version(recorded: &str, mapped: &str) -> bool {
    recorded == mapped
        || version::canonicalize(recorded)
            .is_some_and(|canonical| Some(canonical) == version::canonicalize(mapped))
}

/// Accept only when `mapped` does not fall below `ceiling`.
fn at_least(ceiling: Option<&str>, mapped: &str) -> Decision {
    match ceiling {
        Some(ceiling) if version::compare(ceiling, mapped) == Ordering::Greater => {
            Decision::Reject(RejectKind::NotMonotonic)
        }
        _ => Decision::Accept,
    }
}

/// Decide whether `clib` at upstream `cversion` may be released as `mapped`.
///
/// `legacy_target` is true when the change targets a maintenance branch.
pub fn decide(
    table: &MappingTable,
    clib: &str,
    cversion: &str,
    mapped: &str,
    legacy_target: bool,
) -> Decision {
    if table.go_versions(clib).iter().any(|v| same_version(v, mapped)) {
        return Decision::Reject(RejectKind::DuplicateMappedVersion);
    }

    let mut vers = table.c_versions(clib);
    // no history, or an upstream that opts out of ordering
    let Some(current) = version::canonicalize(cversion) else {
        return Decision::Accept;
    };
    if vers.is_empty() {
        return Decision::Accept;
    }
    version::sort_descending(&mut vers);

    if version::compare(&current, &vers[0]) != Ordering::Less {
        let latest = table.latest_mapped_version(clib);
        return at_least(latest.as_deref(), mapped);
    }

    if !legacy_target {
        return Decision::Reject(RejectKind::WrongTarget);
    }

    let Some(i) = vers
        .iter()
        .position(|v| version::compare(v, &current) == Ordering::Less)
    else {
        // smallest version ever submitted
        return Decision::Accept;
    };

    // i > 0: vers[0] >= current was established above
    let previous = &vers[i - 1];
    if version::same_major_minor(previous, &current)
        && version::compare(previous, &current) == Ordering::Greater
    {
        return Decision::Reject(RejectKind::HistoricalResubmission);
    }

    let closest = table.latest_mapped_version_for_canonical(clib, &vers[i]);
    match closest {
        Some(closest) => at_least(Some(&closest), mapped),
        None => Decision::Reject(RejectKind::NotFound),
    }
}
