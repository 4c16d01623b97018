//! Naming conventions for release refs and maintenance labels.

use crate::error::{FormatError, Result};
use crate::trailer::{self, ReleaseTrailer};

/// Prefixes from which tag, branch and label names are derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefNaming {
    /// Prefix of maintenance branches
    pub legacy_prefix: String,
    /// Prefix of labels requesting a maintenance branch
    pub label_prefix: String,
}

impl Default for RefNaming {
    fn default() -> Self {
        Self {
            legacy_prefix: "release-branch.".to_string(),
            label_prefix: "branch:".to_string(),
        }
    }
}

impl RefNaming {
    /// Tag for a mapped version: `<clib>/<mapped>`
    pub fn tag_name(&self, clib: &str, mapped: &str) -> String {
        format!("{}/{}", clib, mapped)
    }

    /// Maintenance branch: `<legacy prefix><clib>/<mapped>`
    pub fn branch_name(&self, clib: &str, mapped: &str) -> String {
        format!("{}{}", self.legacy_prefix, self.tag_name(clib, mapped))
    }

    /// Label requesting the maintenance branch
    pub fn label_name(&self, clib: &str, mapped: &str) -> String {
        format!("{}{}", self.label_prefix, self.branch_name(clib, mapped))
    }

    /// Whether `ref_name` is a maintenance branch
    pub fn is_legacy_branch(&self, ref_name: &str) -> bool {
        ref_name.starts_with(&self.legacy_prefix)
    }

    /// Whether `label` requests a maintenance branch
    pub fn is_branch_label(&self, label: &str) -> bool {
        label.starts_with(&self.label_prefix)
    }

    /// Split a label into its branch name and the mapped version the branch
    /// starts from.
    pub fn parse_label(&self, label: &str) -> Result<(String, ReleaseTrailer)> {
        let label = label.trim();
        let expected = format!("{}{}<clib>/<mapped>", self.label_prefix, self.legacy_prefix);
        let shape_error = || FormatError::InvalidLabel {
            label: label.to_string(),
            expected: expected.clone(),
        };

        let branch = trailer::strip_required_prefix(label, &self.label_prefix)
            .map_err(|_| shape_error())?;
        let version = trailer::strip_required_prefix(branch, &self.legacy_prefix)
            .map_err(|_| shape_error())?;
        let parsed = trailer::parse_mapped_version(version)?;
        Ok((branch.to_string(), parsed))
    }
}
