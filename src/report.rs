//! `serde_json`-friendly result shaping, gated behind the `json` feature.
//!
//! [`CheckResult`] and its scope-/fix-aware variants are plain Rust structs
//! with no `Serialize` impl of their own (the crate doesn't want every
//! caller to pay for `serde_json` just to run a check). [`Report`]
//! flattens whichever variant a caller has into one `Serialize` value, so
//! an external CLI or report-formatter collaborator can hand it straight
//! to `serde_json::to_string`.

use crate::{CheckResult, FixableCheckResult, ScopedCheckResult};
use crate::rule::Violation;
use crate::scope::ScopeConflict;
use serde::Serialize;

/// A flattened, serializable view of a check's results.
///
/// Fields that only apply to the scope-aware or fix-aware variants are
/// `None`/empty when built from a plain [`CheckResult`].
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub file_path: String,
    pub violations: Vec<Violation>,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied_scopes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ScopeConflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixable_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_fix_count: Option<usize>,
}

impl Report {
    /// Serialize to a JSON string with `serde_json::to_string`.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn from_base(base: &CheckResult) -> Self {
        Report {
            file_path: base.file_path.clone(),
            violations: base.violations.clone(),
            error_count: base.error_count,
            warning_count: base.warning_count,
            info_count: base.info_count,
            applied_scopes: Vec::new(),
            conflicts: Vec::new(),
            fixable_count: None,
            safe_fix_count: None,
        }
    }
}

impl From<&CheckResult> for Report {
    fn from(result: &CheckResult) -> Self {
        Report::from_base(result)
    }
}

impl From<&ScopedCheckResult> for Report {
    fn from(result: &ScopedCheckResult) -> Self {
        let mut report = Report::from_base(&result.base);
        report.applied_scopes = result.applied_scopes.clone();
        report.conflicts = result.conflicts.clone();
        report
    }
}

impl From<&FixableCheckResult> for Report {
    fn from(result: &FixableCheckResult) -> Self {
        let mut report = Report::from_base(&result.base);
        report.fixable_count = Some(result.fixable_count);
        report.safe_fix_count = Some(result.safe_fix_count);
        report
    }
}
