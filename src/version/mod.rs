//! Version comparison for upstream and mapped versions.
//!
//! Upstream versions may opt out of strict ordering; callers treat an invalid
//! version as "skip ordering checks", never as an error.

mod compare;

pub use compare::{
    all_semver, canonicalize, compare, is_valid, max_version, parse, same_major_minor,
    sort_descending, to_semver,
};
