//! Scope Registry & Resolver.
//!
//! A registry of named, hierarchical configuration overlays, each narrowing
//! to a selector, a file glob, and/or a component list. Glob matching for
//! `find_by_file` is hand-rolled (brace/star/globstar only) rather than
//! pulling in a glob crate, since the grammar needed is small and fully
//! specified.

mod glob;

use crate::error::ScopeError;
use crate::rule::Severity;
use std::collections::BTreeMap;

/// An arbitrary per-rule option value, independent of any particular
/// serialization format so scopes can be compared by deep equality without
/// depending on the optional `json` feature.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<OptionValue>),
    Object(BTreeMap<String, OptionValue>),
}

pub type OptionsMap = BTreeMap<String, OptionValue>;

/// Severity override plus arbitrary options plus an optional message
/// override for one rule at one scope.
#[derive(Debug, Clone, Default)]
pub struct ScopeRuleConfig {
    pub severity: Option<Severity>,
    pub options: OptionsMap,
    pub message: Option<String>,
}

/// What a scope narrows its configuration to: at most one match
/// discriminator per applicability axis, though a scope may combine more
/// than one axis, e.g. a file glob AND a component list.
#[derive(Debug, Clone, Default)]
pub struct ScopeMatch {
    pub selector: Option<String>,
    pub file_glob: Option<String>,
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub matches: ScopeMatch,
    pub parent: Option<String>,
    pub rules: BTreeMap<String, ScopeRuleConfig>,
    pub enabled: bool,
}

impl Scope {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Scope {
            id: id.into(),
            name: name.into(),
            description: None,
            matches: ScopeMatch::default(),
            parent: None,
            rules: BTreeMap::new(),
            enabled: true,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.matches.selector = Some(selector.into());
        self
    }

    pub fn with_file_glob(mut self, glob: impl Into<String>) -> Self {
        self.matches.file_glob = Some(glob.into());
        self
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.matches.components = Some(components);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(parent_id.into());
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>, config: ScopeRuleConfig) -> Self {
        self.rules.insert(rule_id.into(), config);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The trailing ` *` form of a selector means "any strict descendant
    /// of a matching element" rather than the element itself.
    fn selector_wants_strict_descendant(&self) -> Option<&str> {
        self.matches
            .selector
            .as_deref()
            .and_then(|s| s.strip_suffix(" *"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    Severity,
    Options,
    Both,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScopeConflict {
    pub rule_id: String,
    pub scope_ids: Vec<String>,
    pub conflict_type: ConflictType,
}

#[derive(Default)]
pub struct ScopeRegistry {
    scopes: Vec<Scope>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        ScopeRegistry { scopes: Vec::new() }
    }

    /// Rejects duplicate ids, references to unregistered parents, and
    /// cycles.
    pub fn register(&mut self, scope: Scope) -> Result<(), ScopeError> {
        if self.get(&scope.id).is_some() {
            return Err(ScopeError::DuplicateId(scope.id));
        }
        if let Some(parent) = &scope.parent {
            if self.get(parent).is_none() {
                return Err(ScopeError::UnknownParent {
                    child: scope.id,
                    parent: parent.clone(),
                });
            }
        }
        self.scopes.push(scope);
        if let Some(cycle_id) = self.find_cycle() {
            let bad = self.scopes.pop().expect("just pushed");
            debug_assert_eq!(bad.id, cycle_id);
            return Err(ScopeError::Cycle(cycle_id));
        }
        Ok(())
    }

    fn find_cycle(&self) -> Option<String> {
        'outer: for scope in &self.scopes {
            let mut seen = vec![scope.id.clone()];
            let mut current = scope.parent.clone();
            while let Some(parent_id) = current {
                if seen.contains(&parent_id) {
                    continue 'outer;
                }
                seen.push(parent_id.clone());
                current = self.get(&parent_id).and_then(|s| s.parent.clone());
                if seen.len() > self.scopes.len() + 1 {
                    return Some(scope.id.clone());
                }
            }
        }
        None
    }

    pub fn get(&self, id: &str) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.id == id)
    }

    pub fn find_by_file(&self, path: &str) -> Vec<&Scope> {
        self.scopes
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| {
                s.matches
                    .file_glob
                    .as_deref()
                    .is_some_and(|g| glob::matches(g, path))
            })
            .collect()
    }

    pub fn find_by_component(&self, component: &str) -> Vec<&Scope> {
        self.scopes
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| {
                s.matches
                    .components
                    .as_ref()
                    .is_some_and(|list| list.iter().any(|c| c == component))
            })
            .collect()
    }

    pub fn find_by_element(&self, element: crate::dom::ElementRef) -> Vec<&Scope> {
        let doc = element.document();
        self.scopes
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| match s.selector_wants_strict_descendant() {
                Some(sel) => {
                    let matched = crate::selector::select_all(doc, sel);
                    element.ancestors().any(|a| matched.iter().any(|m| m.id() == a.id()))
                }
                None => match &s.matches.selector {
                    Some(sel) => {
                        let matched = crate::selector::select_all(doc, sel);
                        matched.iter().any(|m| m.id() == element.id())
                            || element.ancestors().any(|a| matched.iter().any(|m| m.id() == a.id()))
                    }
                    None => false,
                },
            })
            .collect()
    }

    /// Closes the given scope ids under the parent relation (roots first,
    /// then registration order) and detects cross-scope conflicts.
    pub fn resolve<'a>(&'a self, matched: Vec<&'a Scope>) -> ResolvedScopes<'a> {
        let mut closure: Vec<&Scope> = Vec::new();
        for scope in matched {
            let mut chain = Vec::new();
            let mut current = Some(scope);
            while let Some(s) = current {
                if !chain.iter().any(|c: &&Scope| c.id == s.id) {
                    chain.push(s);
                }
                current = s.parent.as_deref().and_then(|p| self.get(p));
            }
            for s in chain.into_iter().rev() {
                if !closure.iter().any(|c: &&Scope| c.id == s.id) {
                    closure.push(s);
                }
            }
        }
        closure.sort_by_key(|s| self.depth(s));

        let conflicts = detect_conflicts(&closure);
        ResolvedScopes { scopes: closure, conflicts }
    }

    fn depth(&self, scope: &Scope) -> usize {
        let mut depth = 0;
        let mut current = scope.parent.clone();
        while let Some(parent_id) = current {
            depth += 1;
            current = self.get(&parent_id).and_then(|s| s.parent.clone());
        }
        depth
    }
}

pub struct ResolvedScopes<'a> {
    pub scopes: Vec<&'a Scope>,
    pub conflicts: Vec<ScopeConflict>,
}

impl<'a> ResolvedScopes<'a> {
    /// The last non-default setting in resolution order wins; `off`
    /// dominates as an explicit severity.
    pub fn effective_severity(&self, rule_id: &str, default: Severity) -> Severity {
        self.scopes
            .iter()
            .filter_map(|s| s.rules.get(rule_id))
            .filter_map(|c| c.severity)
            .last()
            .unwrap_or(default)
    }

    pub fn effective_options(&self, rule_id: &str) -> OptionsMap {
        let mut merged = OptionsMap::new();
        for scope in &self.scopes {
            if let Some(config) = scope.rules.get(rule_id) {
                for (k, v) in &config.options {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        merged
    }

    pub fn effective_message(&self, rule_id: &str) -> Option<&str> {
        self.scopes
            .iter()
            .filter_map(|s| s.rules.get(rule_id))
            .filter_map(|c| c.message.as_deref())
            .last()
    }

    pub fn scope_ids(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.id.clone()).collect()
    }
}

fn detect_conflicts(scopes: &[&Scope]) -> Vec<ScopeConflict> {
    let mut rule_ids = std::collections::BTreeSet::new();
    for scope in scopes {
        rule_ids.extend(scope.rules.keys().cloned());
    }

    let mut conflicts = Vec::new();
    for rule_id in rule_ids {
        let configuring: Vec<&&Scope> = scopes
            .iter()
            .filter(|s| s.rules.contains_key(&rule_id))
            .collect();
        if configuring.len() < 2 {
            continue;
        }
        let severities: std::collections::BTreeSet<_> = configuring
            .iter()
            .filter_map(|s| s.rules[&rule_id].severity)
            .collect();
        let options: Vec<&OptionsMap> = configuring
            .iter()
            .map(|s| &s.rules[&rule_id].options)
            .collect();
        let options_differ = options.windows(2).any(|w| w[0] != w[1]);
        let severity_differs = severities.len() > 1;

        let conflict_type = match (severity_differs, options_differ) {
            (true, true) => Some(ConflictType::Both),
            (true, false) => Some(ConflictType::Severity),
            (false, true) => Some(ConflictType::Options),
            (false, false) => None,
        };
        if let Some(conflict_type) = conflict_type {
            conflicts.push(ScopeConflict {
                rule_id,
                scope_ids: configuring.iter().map(|s| s.id.clone()).collect(),
                conflict_type,
            });
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut reg = ScopeRegistry::new();
        reg.register(Scope::new("a", "A")).unwrap();
        let err = reg.register(Scope::new("a", "A again")).unwrap_err();
        assert_eq!(err, ScopeError::DuplicateId("a".into()));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut reg = ScopeRegistry::new();
        let err = reg
            .register(Scope::new("child", "Child").with_parent("missing"))
            .unwrap_err();
        assert!(matches!(err, ScopeError::UnknownParent { .. }));
    }

    #[test]
    fn resolution_orders_roots_before_children() {
        let mut reg = ScopeRegistry::new();
        reg.register(Scope::new("root", "Root")).unwrap();
        reg.register(Scope::new("child", "Child").with_parent("root"))
            .unwrap();
        let resolved = reg.resolve(vec![reg.get("child").unwrap()]);
        let ids: Vec<_> = resolved.scopes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "child"]);
    }

    #[test]
    fn off_from_child_scope_wins_over_parent_error() {
        let mut reg = ScopeRegistry::new();
        reg.register(
            Scope::new("root", "Root").with_rule(
                "images-alt-text",
                ScopeRuleConfig { severity: Some(Severity::Error), ..Default::default() },
            ),
        )
        .unwrap();
        reg.register(
            Scope::new("child", "Child").with_parent("root").with_rule(
                "images-alt-text",
                ScopeRuleConfig { severity: Some(Severity::Off), ..Default::default() },
            ),
        )
        .unwrap();
        let resolved = reg.resolve(vec![reg.get("child").unwrap()]);
        assert_eq!(
            resolved.effective_severity("images-alt-text", Severity::Warning),
            Severity::Off
        );
    }

    #[test]
    fn conflicting_severities_are_reported() {
        let mut reg = ScopeRegistry::new();
        reg.register(Scope::new("a", "A").with_rule(
            "images-alt-text",
            ScopeRuleConfig { severity: Some(Severity::Error), ..Default::default() },
        ))
        .unwrap();
        reg.register(Scope::new("b", "B").with_rule(
            "images-alt-text",
            ScopeRuleConfig { severity: Some(Severity::Warning), ..Default::default() },
        ))
        .unwrap();
        let resolved = reg.resolve(vec![reg.get("a").unwrap(), reg.get("b").unwrap()]);
        assert_eq!(resolved.conflicts.len(), 1);
        assert_eq!(resolved.conflicts[0].conflict_type, ConflictType::Severity);
    }
}
