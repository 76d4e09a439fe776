//! `sentry-html`: a static analyzer for HTML and component-tree (JSX-like)
//! source that reports accessibility/SEO/security violations and rewrites
//! source to fix them, built around a rule-evaluation pipeline: a document
//! model, a selector engine, a rule engine, a scope registry/resolver, and
//! a fix engine.
//!
//! See DESIGN.md for the grounding ledger behind each module's design.

pub mod component;
pub mod dom;
pub mod error;
pub mod fix;
pub mod html;
#[cfg(feature = "json")]
pub mod report;
pub mod rule;
pub mod rules;
pub mod scope;
pub mod selector;

pub use dom::{Document, ElementRef};
pub use error::{PatternError, ScopeError, SentryError};
pub use fix::{Edit, FixOptions, FixResult, SkipReason, SkippedEdit};
#[cfg(feature = "json")]
pub use report::Report;
pub use rule::{Category, Context, Rule, Severity, Violation};
pub use scope::{ConflictType, OptionValue, OptionsMap, Scope, ScopeConflict, ScopeRegistry, ScopeRuleConfig};

use std::collections::BTreeMap;

/// Which adapter produces the Document for a check call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Html,
    Component,
}

/// One rule's global configuration entry: a severity, optionally paired
/// with arbitrary per-rule options.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub severity: Severity,
    pub options: OptionsMap,
}

impl RuleConfig {
    pub fn severity(severity: Severity) -> Self {
        RuleConfig { severity, options: OptionsMap::new() }
    }

    pub fn with_options(severity: Severity, options: OptionsMap) -> Self {
        RuleConfig { severity, options }
    }
}

/// The effective configuration a [`Sentry`] check runs with.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub rules: BTreeMap<String, RuleConfig>,
    pub fail_on_warnings: bool,
    pub max_warnings: Option<usize>,
}

impl Config {
    pub fn validate(&self) -> Result<(), SentryError> {
        if let Some(max) = self.max_warnings {
            if (max as i64) < 0 {
                return Err(SentryError::Config("maxWarnings must not be negative".to_string()));
            }
        }
        Ok(())
    }
}

/// Base check output.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub file_path: String,
    pub violations: Vec<Violation>,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

impl CheckResult {
    fn from_violations(file_path: String, violations: Vec<Violation>) -> Self {
        let error_count = violations.iter().filter(|v| v.severity == Severity::Error).count();
        let warning_count = violations.iter().filter(|v| v.severity == Severity::Warning).count();
        let info_count = violations.iter().filter(|v| v.severity == Severity::Info).count();
        CheckResult { file_path, violations, error_count, warning_count, info_count }
    }
}

/// Scope-aware check output: adds the resolved scope ids, per-violation
/// scope attribution and element breadcrumb, and any detected conflicts.
#[derive(Debug, Clone)]
pub struct ScopedCheckResult {
    pub base: CheckResult,
    pub applied_scopes: Vec<String>,
    pub conflicts: Vec<ScopeConflict>,
}

/// Fix-aware check output: each violation's `fixable` bit plus aggregate
/// counts.
#[derive(Debug, Clone)]
pub struct FixableCheckResult {
    pub base: CheckResult,
    pub fixable_count: usize,
    pub safe_fix_count: usize,
}

/// Sentinel bucket name for violations with no attributed scope.
pub const GLOBAL_SCOPE_BUCKET: &str = "_global";

/// Group a violation list by `Violation::scope`, placing scope-less
/// violations under [`GLOBAL_SCOPE_BUCKET`].
pub fn group_by_scope(violations: &[Violation]) -> BTreeMap<String, Vec<&Violation>> {
    let mut groups: BTreeMap<String, Vec<&Violation>> = BTreeMap::new();
    for v in violations {
        let key = v.scope.clone().unwrap_or_else(|| GLOBAL_SCOPE_BUCKET.to_string());
        groups.entry(key).or_default().push(v);
    }
    groups
}

/// The engine entry point: an immutable ruleset plus configuration,
/// invoked once per (bytes, kind, path) check.
pub struct Sentry {
    rules: Vec<Rule>,
    config: Config,
    scopes: ScopeRegistry,
}

impl Sentry {
    pub fn new(rules: Vec<Rule>, config: Config) -> Result<Self, SentryError> {
        config.validate()?;
        Ok(Sentry { rules, config, scopes: ScopeRegistry::new() })
    }

    pub fn with_scopes(mut self, scopes: ScopeRegistry) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn global_severity(&self, rule: &Rule) -> Severity {
        self.config
            .rules
            .get(&rule.id)
            .map(|c| c.severity)
            .unwrap_or(rule.default_severity)
    }

    fn global_options(&self, rule_id: &str) -> OptionsMap {
        self.config.rules.get(rule_id).map(|c| c.options.clone()).unwrap_or_default()
    }

    fn documents_for(&self, bytes: &str, kind: SourceKind) -> Vec<(Option<String>, Document)> {
        match kind {
            SourceKind::Html => vec![(None, html::parse(bytes))],
            SourceKind::Component => component::lower_components(bytes)
                .into_iter()
                .map(|b| (Some(b.component_name), b.document))
                .collect(),
        }
    }

    /// Run every rule against `bytes` and return the resulting violations.
    pub fn check(&self, bytes: &str, kind: SourceKind, path: &str) -> CheckResult {
        self.check_internal(bytes, kind, path, false).0
    }

    /// As [`Sentry::check`], additionally computing each violation's fix
    /// and the aggregate fixable/safe-fix counts.
    pub fn check_with_fixes(&self, bytes: &str, kind: SourceKind, path: &str) -> FixableCheckResult {
        let (base, _) = self.check_internal(bytes, kind, path, true);
        let fixable_count = base.violations.iter().filter(|v| v.fix.is_some()).count();
        let safe_fix_count = base
            .violations
            .iter()
            .filter(|v| v.fix.as_ref().is_some_and(|f| f.safe))
            .count();
        FixableCheckResult { base, fixable_count, safe_fix_count }
    }

    /// Scope-aware variant: attaches `scope`/`elementPath` per violation and
    /// reports conflicts, resolving scopes against `path` (and, for
    /// component sources, each branch's component name).
    pub fn check_scoped(&self, bytes: &str, kind: SourceKind, path: &str, fix_mode: bool) -> ScopedCheckResult {
        let (base, applied) = self.check_internal(bytes, kind, path, fix_mode);
        ScopedCheckResult {
            base,
            applied_scopes: applied.scope_ids,
            conflicts: applied.conflicts,
        }
    }

    fn check_internal(
        &self,
        bytes: &str,
        kind: SourceKind,
        path: &str,
        fix_mode: bool,
    ) -> (CheckResult, AppliedScopeInfo) {
        let mut all_violations = Vec::new();
        let mut scope_ids = std::collections::BTreeSet::new();
        let mut conflicts = Vec::new();

        for (component_name, doc) in self.documents_for(bytes, kind) {
            let mut matched: Vec<&Scope> = self.scopes.find_by_file(path);
            if let Some(name) = &component_name {
                matched.extend(self.scopes.find_by_component(name));
            }
            let resolved = self.scopes.resolve(matched);
            scope_ids.extend(resolved.scope_ids());
            conflicts.extend(resolved.conflicts.iter().cloned());

            let violations = rule::run_rules(
                &doc,
                &self.rules,
                |rule_id| {
                    let default = self
                        .rules
                        .iter()
                        .find(|r| r.id == rule_id)
                        .map(|r| self.global_severity(r))
                        .unwrap_or(Severity::Off);
                    resolved.effective_severity(rule_id, default)
                },
                |rule_id| {
                    let mut merged = self.global_options(rule_id);
                    for (k, v) in resolved.effective_options(rule_id) {
                        merged.insert(k, v);
                    }
                    merged
                },
                fix_mode,
            );

            for mut v in violations {
                v.component = component_name.clone();
                if let Some(message) = resolved.effective_message(&v.rule_id) {
                    v.message = message.to_string();
                }
                if !resolved.scope_ids().is_empty() {
                    v.scope = resolved.scope_ids().last().cloned();
                }
                all_violations.push(v);
            }
        }

        let result = CheckResult::from_violations(path.to_string(), all_violations);
        (
            result,
            AppliedScopeInfo {
                scope_ids: scope_ids.into_iter().collect(),
                conflicts,
            },
        )
    }
}

struct AppliedScopeInfo {
    scope_ids: Vec<String>,
    conflicts: Vec<ScopeConflict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentry() -> Sentry {
        Sentry::new(rules::builtin_rules(), Config::default()).unwrap()
    }

    #[test]
    fn missing_alt_is_flagged_and_fixed() {
        let sentry = sentry();
        let result = sentry.check_with_fixes(r#"<img src="test.jpg">"#, SourceKind::Html, "index.html");
        assert_eq!(result.base.violations.len(), 1);
        assert_eq!(result.base.violations[0].rule_id, "images-alt-text");
        assert_eq!(result.base.error_count, 1);
        let edit = result.base.violations[0].fix.clone().unwrap();
        let fixed = fix::apply_fixes(r#"<img src="test.jpg">"#, &[edit], &FixOptions::default());
        assert_eq!(fixed.fixed, r#"<img src="test.jpg" alt="">"#);
    }

    #[test]
    fn external_link_without_rel_is_flagged_and_fixed() {
        let sentry = sentry();
        let src = r#"<a href="https://x.example" target="_blank">x</a>"#;
        let result = sentry.check_with_fixes(src, SourceKind::Html, "index.html");
        assert_eq!(result.base.violations.len(), 1);
        assert_eq!(result.base.violations[0].rule_id, "external-links-security");
        let edit = result.base.violations[0].fix.clone().unwrap();
        let fixed = fix::apply_fixes(src, &[edit], &FixOptions::default());
        assert_eq!(
            fixed.fixed,
            r#"<a href="https://x.example" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn off_severity_removes_the_rule_site_wide() {
        let mut config = Config::default();
        config.rules.insert("images-alt-text".to_string(), RuleConfig::severity(Severity::Off));
        let sentry = Sentry::new(rules::builtin_rules(), config).unwrap();
        let result = sentry.check(r#"<img src="test.jpg">"#, SourceKind::Html, "index.html");
        assert!(result.violations.is_empty());
    }

    #[test]
    fn component_violations_are_tagged_with_component_name() {
        let sentry = sentry();
        let src = r#"function Photo() { return <img src="a.jpg">; }"#;
        let result = sentry.check(src, SourceKind::Component, "Photo.jsx");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].component.as_deref(), Some("Photo"));
    }

    #[test]
    fn group_by_scope_buckets_scope_less_violations_under_global() {
        let sentry = sentry();
        let result = sentry.check(r#"<img src="test.jpg">"#, SourceKind::Html, "index.html");
        let groups = group_by_scope(&result.violations);
        assert!(groups.contains_key(GLOBAL_SCOPE_BUCKET));
    }
}
