//! Error taxonomy for the crate.
//!
//! The core never aborts a check partway through; these types exist for the
//! handful of conditions that are genuinely fatal (bad scope registration,
//! bad configuration). Conditions that are reported but don't stop
//! anything — pattern parse failures, fix validation mismatches — are
//! logged via `log::warn!` instead of returned as errors.

use thiserror::Error;

/// Errors that can prevent a check from running at all, or that abort scope
/// registration.
#[derive(Debug, Error)]
pub enum SentryError {
    #[error("scope registration failed: {0}")]
    Scope(#[from] ScopeError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Fatal conditions raised while registering scopes.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ScopeError {
    #[error("scope `{0}` is already registered")]
    DuplicateId(String),
    #[error("scope `{child}` references unknown parent `{parent}`")]
    UnknownParent { child: String, parent: String },
    #[error("registering scope `{0}` would introduce a cycle")]
    Cycle(String),
}

/// A non-fatal error encountered while compiling a selector pattern.
///
/// An unparsable pattern does not fail the check: it is logged and yields
/// zero matches. This type exists so the parser has
/// something concrete to log and so callers that do want to surface pattern
/// errors explicitly (e.g. when registering a rule) have something typed to
/// match on.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PatternError {
    #[error("unexpected end of pattern")]
    UnexpectedEof,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unknown predicate `:{0}`")]
    UnknownPredicate(String),
    #[error("invalid regular expression `{0}`: {1}")]
    InvalidRegex(String, String),
    #[error("invalid count constraint `{0}`")]
    InvalidCount(String),
}
