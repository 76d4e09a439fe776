//! Discovery of top-level component definitions and their return branches.
//!
//! No JS parser is pulled in: resolving runtime component behavior in
//! general is out of scope, so a brace/paren-balanced scanner that
//! recognizes a few concrete shapes (`function Name(...) {}`, `const Name
//! = (...) => {}`, `const Name = (...) => expr`) is the right amount of
//! machinery: enough to find every tree-literal branch, not a general
//! JavaScript front end.

#[derive(Debug, Clone)]
pub struct ComponentDef {
    pub name: String,
    /// Byte range of the definition's body (block contents without the
    /// enclosing braces, or the bare expression for an arrow's expression
    /// body) within the whole source.
    pub body: std::ops::Range<usize>,
}

/// Find every top-level `function Name(...) { ... }` or `const/let/var
/// Name = (...) => ...` whose name starts with an upper-case letter.
pub fn discover_components(source: &str) -> Vec<ComponentDef> {
    let mut defs = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(rest) = source[i..].strip_prefix("function ") {
            let name_start = i + "function ".len();
            let name = read_ident(rest);
            if starts_upper(&name) {
                if let Some(open) = source[name_start + name.len()..].find('(') {
                    let params_start = name_start + name.len() + open;
                    if let Some(brace) = find_char_after_parens(source, params_start) {
                        if let Some(body_range) = balanced_braces(source, brace) {
                            defs.push(ComponentDef { name: name.clone(), body: body_range });
                        }
                    }
                }
            }
            i = name_start + name.len().max(1);
            continue;
        }
        if let Some(kw_len) = matches_decl_keyword(&source[i..]) {
            let after_kw = i + kw_len;
            let rest = &source[after_kw..];
            let name = read_ident(rest.trim_start());
            let ws = rest.len() - rest.trim_start().len();
            if starts_upper(&name) {
                let after_name = after_kw + ws + name.len();
                if let Some(def) = try_parse_arrow_assignment(source, &name, after_name) {
                    defs.push(def);
                }
            }
            i = after_kw + ws + name.len().max(1);
            continue;
        }
        i += 1;
    }
    defs
}

fn matches_decl_keyword(s: &str) -> Option<usize> {
    for kw in ["const ", "let ", "var "] {
        if s.starts_with(kw) {
            return Some(kw.len());
        }
    }
    None
}

fn starts_upper(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

fn read_ident(s: &str) -> String {
    s.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect()
}

fn try_parse_arrow_assignment(source: &str, _name: &str, after_name: usize) -> Option<ComponentDef> {
    let rest = source[after_name..].trim_start();
    let skipped = source[after_name..].len() - rest.len();
    let mut pos = after_name + skipped;
    if !source[pos..].starts_with('=') || source[pos..].starts_with("=>") {
        return None;
    }
    pos += 1;
    let rest = source[pos..].trim_start();
    pos += source[pos..].len() - rest.len();
    if !source[pos..].starts_with('(') && !source[pos..].trim_start().starts_with(|c: char| c.is_alphabetic()) {
        return None;
    }

    // params: either `(...)` or a bare single identifier.
    let params_end = if source[pos..].starts_with('(') {
        find_matching_paren(source, pos)?
    } else {
        let ident = read_ident(&source[pos..]);
        pos + ident.len()
    };

    let after_params = source[params_end..].trim_start();
    let skipped = source[params_end..].len() - after_params.len();
    let arrow_pos = params_end + skipped;
    if !source[arrow_pos..].starts_with("=>") {
        return None;
    }
    let body_start_raw = arrow_pos + 2;
    let body_trimmed = source[body_start_raw..].trim_start();
    let body_start = body_start_raw + (source[body_start_raw..].len() - body_trimmed.len());

    if source[body_start..].starts_with('{') {
        balanced_braces(source, body_start).map(|body| ComponentDef { name: _name.to_string(), body })
    } else {
        let end = find_expression_statement_end(source, body_start);
        Some(ComponentDef { name: _name.to_string(), body: body_start..end })
    }
}

fn find_char_after_parens(source: &str, paren_open: usize) -> Option<usize> {
    let close = find_matching_paren(source, paren_open)?;
    let after = source[close..].trim_start();
    let skipped = source[close..].len() - after.len();
    if after.starts_with('{') {
        Some(close + skipped)
    } else {
        None
    }
}

fn find_matching_paren(source: &str, open_pos: usize) -> Option<usize> {
    find_matching(source, open_pos, '(', ')')
}

fn find_matching(source: &str, open_pos: usize, open: char, close: char) -> Option<usize> {
    let bytes = &source[open_pos..];
    let mut depth = 0i32;
    let mut in_str: Option<char> = None;
    for (idx, c) in bytes.char_indices() {
        if let Some(q) = in_str {
            if c == q {
                in_str = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_str = Some(c),
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

/// Returns the byte range of the braces' *contents* (excluding `{`/`}`).
fn balanced_braces(source: &str, open_pos: usize) -> Option<std::ops::Range<usize>> {
    debug_assert!(source[open_pos..].starts_with('{'));
    let close = find_matching(source, open_pos, '{', '}')?;
    Some(open_pos + 1..close - 1)
}

/// For a bare arrow-expression body, consume until a top-level `;` or the
/// end of input, whichever comes first, skipping over nested
/// brace/paren/bracket groups so an embedded object/array/JSX literal
/// doesn't terminate the scan early.
fn find_expression_statement_end(source: &str, start: usize) -> usize {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_function_declaration_component() {
        let src = "function Header() { return <header>hi</header>; }";
        let defs = discover_components(src);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "Header");
        assert!(src[defs[0].body.clone()].contains("<header>"));
    }

    #[test]
    fn finds_const_arrow_block_body_component() {
        let src = "const Card = (props) => { return <div>{props.x}</div>; };";
        let defs = discover_components(src);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "Card");
    }

    #[test]
    fn finds_const_arrow_expression_body_component() {
        let src = "const Label = () => <label>hi</label>;";
        let defs = discover_components(src);
        assert_eq!(defs.len(), 1);
        let body = &src[defs[0].body.clone()];
        assert!(body.trim_start().starts_with("<label>"));
    }

    #[test]
    fn ignores_lowercase_named_bindings() {
        let src = "const helper = () => { return 1; };";
        assert!(discover_components(src).is_empty());
    }
}
