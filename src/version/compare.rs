//! Ordering and validity checks over version strings.
//!
//! Upstream C libraries rarely publish strict semver, so parsing is lenient in
//! the same places Go-style module versions are: the `v` marker is optional,
//! `1` and `1.2` are short for `1.0.0` and `1.2.0`, and build metadata never
//! takes part in ordering.

use semver::{BuildMetadata, Version};
use std::cmp::Ordering;

/// Parse a version leniently, returning `None` for anything unorderable.
pub fn parse(version: &str) -> Option<Version> {
    let raw = version.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }

    let (without_build, build) = match raw.split_once('+') {
        Some((head, build)) => (head, Some(build)),
        None => (raw, None),
    };
    let (core, pre) = match without_build.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (without_build, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.iter().any(|p| !is_numeric_identifier(p)) {
        return None;
    }

    let full = match parts.len() {
        3 => core.to_string(),
        // short forms only stand alone
        1 | 2 if pre.is_none() && build.is_none() => {
            let mut padded = parts.clone();
            padded.resize(3, "0");
            padded.join(".")
        }
        _ => return None,
    };

    let mut text = full;
    if let Some(pre) = pre {
        text.push('-');
        text.push_str(pre);
    }
    if let Some(build) = build {
        text.push('+');
        text.push_str(build);
    }

    let mut parsed = Version::parse(&text).ok()?;
    parsed.build = BuildMetadata::EMPTY;
    Some(parsed)
}

fn is_numeric_identifier(part: &str) -> bool {
    !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'))
}

/// Whether `version` can take part in ordering.
pub fn is_valid(version: &str) -> bool {
    parse(version).is_some()
}

/// Canonical `vMAJOR.MINOR.PATCH[-PRE]` form, or `None` when invalid.
pub fn canonicalize(version: &str) -> Option<String> {
    parse(version).map(|v| format!("v{}", v))
}

/// Canonical form when valid, otherwise the input unchanged.
pub fn to_semver(version: &str) -> String {
    canonicalize(version).unwrap_or_else(|| version.to_string())
}

/// Semver precedence; invalid versions are equal to each other and lower than
/// every valid one.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp_precedence(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Whether both versions are valid and share major and minor.
pub fn same_major_minor(a: &str, b: &str) -> bool {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.major == b.major && a.minor == b.minor,
        _ => false,
    }
}

/// Sort newest first. Equal precedence falls back to the raw strings so the
/// result does not depend on input order.
pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(b, a).then_with(|| b.cmp(a)));
}

/// Whether every version in the slice is orderable.
pub fn all_semver<S: AsRef<str>>(versions: &[S]) -> bool {
    versions.iter().all(|v| is_valid(v.as_ref()))
}

/// Largest version by precedence.
pub fn max_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare(a, b).then_with(|| a.cmp(b)))
        .map(String::as_str)
}
