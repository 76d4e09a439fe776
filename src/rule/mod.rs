//! Rule, Context, and Violation types plus the Rule Engine.
//!
//! Each [`Rule`] is a struct literal carrying closures rather than a trait
//! object hierarchy, registered into a flat set the caller owns and passes
//! explicitly (no global registry).

mod engine;

pub use engine::run_rules;

use crate::dom::{Document, ElementRef};
use crate::fix::Edit;
use crate::selector::Pattern;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Accessibility,
    Seo,
    Security,
    Performance,
    BestPractice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn is_active(self) -> bool {
        self != Severity::Off
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::error::SentryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Severity::Off),
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(crate::error::SentryError::Config(format!(
                "unknown severity `{other}`"
            ))),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Off => "off",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Per-check handle passed by non-owning reference to predicates, fix
/// producers, and suggestion producers.
pub struct Context<'a> {
    doc: &'a Document,
    /// Effective options for the rule currently being evaluated, resolved
    /// by the scope system; empty when no scope configured any for this
    /// rule at this site.
    options: &'a crate::scope::OptionsMap,
}

impl<'a> Context<'a> {
    pub(crate) fn new(doc: &'a Document, options: &'a crate::scope::OptionsMap) -> Self {
        Context { doc, options }
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn select_first(&self, pattern: &str) -> Option<ElementRef<'a>> {
        crate::selector::select_first(self.doc, pattern)
    }

    pub fn select_all(&self, pattern: &str) -> Vec<ElementRef<'a>> {
        crate::selector::select_all(self.doc, pattern)
    }

    pub fn by_id(&self, id: &str) -> Option<ElementRef<'a>> {
        self.doc.by_id(id)
    }

    /// Arbitrary per-rule options resolved for the current site, set by the
    /// nearest scope in the hierarchy that configures this rule.
    pub fn options(&self) -> &'a crate::scope::OptionsMap {
        self.options
    }
}

type Predicate = dyn Fn(ElementRef, &Context) -> Option<String> + Send + Sync;
type Suggestion = dyn Fn(ElementRef) -> String + Send + Sync;
type FixProducer = dyn Fn(ElementRef, &Context) -> Option<Edit> + Send + Sync;

/// Pattern + predicate + metadata, possibly with a fix producer.
/// Immutable once constructed.
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub default_severity: Severity,
    pattern_source: String,
    pattern: Option<Pattern>,
    predicate: Arc<Predicate>,
    suggestion: Option<Arc<Suggestion>>,
    fix: Option<Arc<FixProducer>>,
    pub doc_url: String,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("default_severity", &self.default_severity)
            .field("pattern", &self.pattern_source)
            .field("fixable", &self.fix.is_some())
            .finish()
    }
}

impl Rule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        default_severity: Severity,
        pattern: impl Into<String>,
        predicate: impl Fn(ElementRef, &Context) -> Option<String> + Send + Sync + 'static,
        doc_url: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let pattern_source = pattern.into();
        let pattern = match Pattern::compile(&pattern_source) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("rule `{id}`: failed to compile pattern `{pattern_source}`: {e}");
                None
            }
        };
        Rule {
            id,
            name: name.into(),
            description: description.into(),
            category,
            default_severity,
            pattern_source,
            pattern,
            predicate: Arc::new(predicate),
            suggestion: None,
            fix: None,
            doc_url: doc_url.into(),
        }
    }

    pub fn with_suggestion(
        mut self,
        f: impl Fn(ElementRef) -> String + Send + Sync + 'static,
    ) -> Self {
        self.suggestion = Some(Arc::new(f));
        self
    }

    pub fn with_fix(
        mut self,
        f: impl Fn(ElementRef, &Context) -> Option<Edit> + Send + Sync + 'static,
    ) -> Self {
        self.fix = Some(Arc::new(f));
        self
    }

    pub fn pattern_source(&self) -> &str {
        &self.pattern_source
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    pub(crate) fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub(crate) fn predicate(&self) -> &Predicate {
        &*self.predicate
    }

    pub(crate) fn suggestion(&self) -> Option<&Suggestion> {
        self.suggestion.as_deref()
    }

    pub(crate) fn fix_producer(&self) -> Option<&FixProducer> {
        self.fix.as_deref()
    }
}

/// One recorded failure of one rule against one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub rule_name: String,
    pub message: String,
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    /// Serialized `<tag attrs>` string.
    pub element: String,
    pub snippet: String,
    pub suggestion: Option<String>,
    pub fix: Option<Edit>,
    /// Name of the component this violation was found in, for component
    /// sources; `None` for plain HTML checks.
    pub component: Option<String>,
    /// Identifier of the scope that produced the effective severity for
    /// this violation, populated only by scope-aware check variants.
    pub scope: Option<String>,
    /// Breadcrumb from the root to this element, e.g. `["html", "body",
    /// "div.container"]`.
    pub element_path: Vec<String>,
}
