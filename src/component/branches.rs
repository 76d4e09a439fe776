//! Branch extraction: every expression a component body could return.

use std::ops::Range;

/// One candidate return expression, trimmed of surrounding whitespace and
/// wrapping parens, with its byte range in the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub range: Range<usize>,
}

/// Collect every branch a component body could return: each `return`
/// statement's expression (recursing into nested conditionals and
/// ternaries), plus — for an arrow function with a bare expression body —
/// the body expression itself. Only branches that are tree literals
/// (trimmed text starting with `<`) are kept.
pub fn extract_branches(source: &str, body: Range<usize>) -> Vec<Branch> {
    let mut branches = Vec::new();
    let body_text = &source[body.clone()];

    if !has_block_statements(body_text) {
        // Arrow expression body: the whole thing is the one implicit
        // return.
        collect_ternary_branches(source, trim_range(source, body), &mut branches);
        return branches;
    }

    for ret in find_return_statements(source, body) {
        collect_ternary_branches(source, ret, &mut branches);
    }
    branches
}

/// Heuristic: a block body contains `return` somewhere; an expression
/// body usually doesn't start with `{` (that case was already routed to
/// `balanced_braces` at discovery time, so by the time we're here an
/// expression body never contains a top-level `return` keyword).
fn has_block_statements(body_text: &str) -> bool {
    body_text.contains("return")
}

fn find_return_statements(source: &str, body: Range<usize>) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let text = &source[body.clone()];
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find("return") {
        let idx = search_from + rel;
        let before_ok = idx == 0
            || !text.as_bytes()[idx - 1].is_ascii_alphanumeric() && text.as_bytes()[idx - 1] != b'_';
        let after = &text[idx + "return".len()..];
        let after_ok = after.chars().next().is_none_or(|c| c.is_whitespace() || c == '(' || c == ';');
        if before_ok && after_ok {
            let expr_start_rel = idx + "return".len();
            let expr_start = body.start + expr_start_rel;
            let end = find_statement_end(source, expr_start);
            out.push(trim_range(source, expr_start..end));
            search_from = (end - body.start).max(expr_start_rel + 1);
        } else {
            search_from = idx + "return".len();
        }
    }
    out
}

fn find_statement_end(source: &str, start: usize) -> usize {
    let mut depth = 0i32;
    let mut in_str: Option<char> = None;
    for (idx, c) in source[start..].char_indices() {
        if let Some(q) = in_str {
            if c == q {
                in_str = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_str = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            ';' if depth <= 0 => return start + idx,
            _ => {}
        }
    }
    source.len()
}

fn trim_range(source: &str, range: Range<usize>) -> Range<usize> {
    let text = &source[range.clone()];
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return range.start..range.start;
    }
    let lead = text.len() - text.trim_start().len();
    let start = range.start + lead;
    let end = start + trimmed.len();
    unwrap_parens(source, start..end)
}

fn unwrap_parens(source: &str, range: Range<usize>) -> Range<usize> {
    let text = &source[range.clone()];
    if text.starts_with('(') && text.ends_with(')') {
        if let Some(close) = find_matching_delim(source, range.start, '(', ')') {
            if close == range.end {
                return unwrap_parens(source, range.start + 1..range.end - 1);
            }
        }
    }
    range
}

fn find_matching_delim(source: &str, open_pos: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, c) in source[open_pos..].char_indices() {
        match c {
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_pos + idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a top-level `cond ? a : b` into its two branches, emitting both
/// sides rather than picking one, recursing into each side; a non-ternary
/// expression that looks like a tree literal is kept as a single branch,
/// anything else is dropped.
fn collect_ternary_branches(source: &str, range: Range<usize>, out: &mut Vec<Branch>) {
    if range.start >= range.end {
        return;
    }
    let range = trim_range(source, range);
    if range.start >= range.end {
        return;
    }
    if let Some((q_pos, colon_pos)) = find_top_level_ternary(source, range.clone()) {
        let then_range = q_pos + 1..colon_pos;
        let else_range = colon_pos + 1..range.end;
        collect_ternary_branches(source, then_range, out);
        collect_ternary_branches(source, else_range, out);
        return;
    }
    let text = &source[range.clone()];
    if text.trim_start().starts_with('<') {
        out.push(Branch { range });
    }
}

/// Finds a top-level `?`/`:` pair (not inside parens/braces/brackets,
/// strings, or a JSX tag's own attribute braces). Returns the absolute
/// byte offsets of the `?` and its matching `:`, so the caller can slice
/// `(q_pos+1)..colon_pos` for the then-branch and `(colon_pos+1)..end` for
/// the else-branch.
fn find_top_level_ternary(source: &str, range: Range<usize>) -> Option<(usize, usize)> {
    let text = &source[range.clone()];
    let mut depth = 0i32;
    let mut in_str: Option<char> = None;
    let mut q_pos: Option<usize> = None;
    for (idx, c) in text.char_indices() {
        if let Some(q) = in_str {
            if c == q {
                in_str = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_str = Some(c),
            '(' | '{' | '[' | '<' => depth += 1,
            ')' | '}' | ']' | '>' => depth -= 1,
            '?' if depth == 0 && q_pos.is_none() => {
                // Guard against `?.` optional chaining and `??`.
                if text[idx + 1..].starts_with('.') || text[idx + 1..].starts_with('?') {
                    continue;
                }
                q_pos = Some(idx);
            }
            ':' if depth == 0 => {
                if let Some(q) = q_pos {
                    return Some((range.start + q, range.start + idx));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_return_branch() {
        let src = "{ return <div>hi</div>; }";
        let branches = extract_branches(src, 1..src.len() - 1);
        assert_eq!(branches.len(), 1);
        assert!(src[branches[0].range.clone()].starts_with("<div>"));
    }

    #[test]
    fn ternary_emits_both_branches() {
        let src = "{ return cond ? <a>yes</a> : <b>no</b>; }";
        let branches = extract_branches(src, 1..src.len() - 1);
        assert_eq!(branches.len(), 2);
        assert!(src[branches[0].range.clone()].starts_with("<a>"));
        assert!(src[branches[1].range.clone()].starts_with("<b>"));
    }

    #[test]
    fn expression_body_is_its_own_branch() {
        let src = "<label>hi</label>";
        let branches = extract_branches(src, 0..src.len());
        assert_eq!(branches.len(), 1);
    }
}
