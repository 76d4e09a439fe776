//! Component-Tree Adapter.
//!
//! Lowers component source expressing a nested element tree (JSX-like)
//! into the same [`Document`] model the HTML Parser Adapter produces, so
//! the Rule Engine runs unmodified against either source kind. The
//! tokenizer is hand-rolled (see `lower.rs`): no JS/JSX parser crate is
//! pulled in, since resolving runtime component behavior beyond what the
//! source statically expresses is out of scope.

mod branches;
mod discover;
mod lower;

use crate::dom::Document;

/// One checkable unit produced by lowering: a single return branch of a
/// single component, plus the name used to tag violations found in it.
pub struct ComponentBranch {
    pub component_name: String,
    pub document: Document,
}

/// Discover every top-level component definition in `source`, extract
/// every tree-literal branch each could return, and lower each branch to
/// its own Document.
pub fn lower_components(source: &str) -> Vec<ComponentBranch> {
    let mut out = Vec::new();
    for def in discover::discover_components(source) {
        for branch in branches::extract_branches(source, def.body.clone()) {
            let document = lower::lower_branch(source, branch.range);
            out.push(ComponentBranch {
                component_name: def.name.clone(),
                document,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_a_single_branch_component() {
        let src = r#"function Photo() { return <img src="x.jpg">; }"#;
        let result = lower_components(src);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].component_name, "Photo");
        let img = result[0].document.root().children().next().unwrap();
        assert_eq!(img.tag_name(), "img");
    }

    #[test]
    fn ternary_component_lowers_to_two_branches() {
        let src = "const Banner = (props) => { return props.ok ? <p>good</p> : <p>bad</p>; };";
        let result = lower_components(src);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|b| b.component_name == "Banner"));
    }

    #[test]
    fn whitespace_in_tree_literal_does_not_affect_violation_set() {
        let a = r#"function A() { return <img src="x.jpg">; }"#;
        let b = "function A() { return <img   src=\"x.jpg\"  >; }";
        let docs_a = lower_components(a);
        let docs_b = lower_components(b);
        assert_eq!(docs_a.len(), docs_b.len());
        assert_eq!(
            docs_a[0].document.root().children().next().unwrap().get_attribute("src"),
            docs_b[0].document.root().children().next().unwrap().get_attribute("src"),
        );
    }
}
