//! The source-agnostic document model.
//!
//! Both the HTML Parser Adapter ([`crate::html`]) and the Component-Tree
//! Adapter ([`crate::component`]) produce a [`Document`]; every other
//! component (selector engine, rule engine, fix engine) only ever sees this
//! type, never the HTML or component source directly.

mod attributes;
mod document;

pub use attributes::Attributes;
pub use document::{Document, ElementId, ElementRef, SourceSpan};
