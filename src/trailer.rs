//! `Release-as:` commit trailers.
//!
//! A change declares its mapped version with a line such as
//! `Release-as: cjson/v1.2.0`. The same `<clib>/<mapped>` string names the tag
//! and is embedded in maintenance branch names.

use crate::error::{FormatError, Result};
use crate::version;
use regex::Regex;

/// Semver with a mandatory `v` marker, as accepted in trailers
const SEMVER_PATTERN: &str = r"v(?P<major>0|[1-9]\d*)\.(?P<minor>0|[1-9]\d*)\.(?P<patch>0|[1-9]\d*)(?:-(?P<prerelease>(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+(?P<buildmetadata>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?";

/// A parsed `<clib>/<mapped>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTrailer {
    /// Library name
    pub clib: String,
    /// Mapped version, with its `v` marker
    pub version: String,
}

impl ReleaseTrailer {
    /// Tag (and release) name for this declaration
    pub fn tag_name(&self) -> String {
        format!("{}/{}", self.clib, self.version)
    }
}

/// Split `<clib>/<semver>` into its parts.
pub fn parse_mapped_version(value: &str) -> Result<ReleaseTrailer> {
    let value = value.trim();
    let invalid = |reason: &str| FormatError::InvalidMappedVersion {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = value.split('/').collect();
    let [clib, mapped] = parts.as_slice() else {
        return Err(invalid("expected exactly one '/' between library and version").into());
    };
    if clib.is_empty() {
        return Err(invalid("library name is empty").into());
    }
    if !mapped.starts_with('v') || !version::is_valid(mapped) {
        return Err(invalid("mapped version is not a 'v'-prefixed semver").into());
    }

    Ok(ReleaseTrailer {
        clib: clib.to_string(),
        version: mapped.to_string(),
    })
}

/// Matches `<prefix><clib>/<semver>` for one library, or any library when
/// `clib` is `None`.
pub fn trailer_regex(prefix: &str, clib: Option<&str>) -> Result<Regex> {
    // the prefix ends with one space; any single whitespace is accepted there
    let prefix = regex::escape(prefix.trim_end());
    let clib = clib.map(regex::escape).unwrap_or_else(|| r"[^\s/]+".to_string());
    let pattern = format!(r"{}\s{}/{}", prefix, clib, SEMVER_PATTERN);
    Regex::new(&pattern).map_err(|e| {
        FormatError::InvalidMappedVersion {
            value: pattern,
            reason: e.to_string(),
        }
        .into()
    })
}

/// First trailer in `message`, if any.
pub fn find_trailer(prefix: &str, message: &str, clib: Option<&str>) -> Result<Option<ReleaseTrailer>> {
    let re = trailer_regex(prefix, clib)?;
    let Some(found) = re.find(message) else {
        return Ok(None);
    };
    let value = strip_required_prefix(found.as_str(), prefix.trim_end())?;
    parse_mapped_version(value.trim()).map(Some)
}

/// First trailer across several messages, in order.
pub fn find_in_messages<'a, I>(prefix: &str, messages: I, clib: Option<&str>) -> Result<Option<ReleaseTrailer>>
where
    I: IntoIterator<Item = &'a str>,
{
    for message in messages {
        if let Some(trailer) = find_trailer(prefix, message, clib)? {
            return Ok(Some(trailer));
        }
    }
    Ok(None)
}

/// Remove `prefix` from `value`; a value without it is malformed.
pub fn strip_required_prefix<'a>(value: &'a str, prefix: &str) -> Result<&'a str> {
    value.strip_prefix(prefix).ok_or_else(|| {
        FormatError::InvalidLabel {
            label: value.to_string(),
            expected: format!("{}...", prefix),
        }
        .into()
    })
}
