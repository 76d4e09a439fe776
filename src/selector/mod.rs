//! Extended selector engine.
//!
//! The base grammar is deliberately narrower than full CSS (no combinators,
//! no standard pseudo-classes) and adds its own predicate vocabulary
//! instead, so matching is not built on the `selectors` crate's full CSS
//! matching machinery. Base-selector and predicate-argument tokenizing
//! reuses `cssparser`'s `Parser`/string-literal handling; pattern structure
//! (predicate nesting, the top-level `,` alternation) is a small
//! hand-rolled recursive-descent parser over the raw pattern text, since
//! predicates embed whole nested patterns and an iterator-based matcher has
//! no hook for that.

mod parser;
mod matcher;

pub use matcher::{select_all, select_first};
pub use parser::{CountOp, Pattern, PatternAlternative, Predicate};

use crate::dom::Document;
use crate::error::PatternError;

/// A compiled, ready-to-evaluate pattern. Construction never panics;
/// `Pattern::compile` reports a [`PatternError`] for malformed input so
/// callers can log it and treat the rule as matching nothing.
impl Pattern {
    pub fn compile(source: &str) -> Result<Pattern, PatternError> {
        parser::parse_pattern(source)
    }
}

/// Parse `source` and, on failure, log a warning and return a pattern that
/// matches nothing.
pub fn compile_lenient(source: &str) -> Pattern {
    match Pattern::compile(source) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("failed to parse selector pattern `{source}`: {e}");
            Pattern { alternatives: Vec::new() }
        }
    }
}

/// Evaluate a compiled pattern against a document: base matches in document
/// order, then predicates in author order, then `:count` as a final
/// result-set gate.
pub fn evaluate<'a>(pattern: &Pattern, doc: &'a Document) -> Vec<crate::dom::ElementRef<'a>> {
    matcher::evaluate(pattern, doc)
}
