//! Standard brace/star/globstar glob matching for `find_by_file`. No
//! filesystem access — pure string matching against an opaque path
//! string, so the core stays free of any filesystem dependency.

/// `*` matches any run of characters except `/`; `**` matches any run of
/// characters including `/`; `{a,b,c}` expands to an alternation of
/// literal branches. Path separators are normalized to `/` for matching
/// so glob authors don't need to special-case Windows paths.
pub fn matches(pattern: &str, path: &str) -> bool {
    let path = path.replace('\\', "/");
    for branch in expand_braces(pattern) {
        if matches_one(&branch, &path) {
            return true;
        }
    }
    false
}

fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close_rel) = pattern[open..].find('}') else {
        return vec![pattern.to_string()];
    };
    let close = open + close_rel;
    let prefix = &pattern[..open];
    let options = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];

    let mut out = Vec::new();
    for option in options.split(',') {
        for rest in expand_braces(suffix) {
            out.push(format!("{prefix}{option}{rest}"));
        }
    }
    out
}

fn matches_one(pattern: &str, path: &str) -> bool {
    let tokens = tokenize(pattern);
    match_tokens(&tokens, path.as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Star,
    Globstar,
    Literal(&'a str),
}

fn tokenize(pattern: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = pattern;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            tokens.push(Token::Globstar);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('*') {
            tokens.push(Token::Star);
            rest = after;
        } else {
            let next_special = rest.find('*').unwrap_or(rest.len());
            let (literal, remainder) = rest.split_at(next_special);
            tokens.push(Token::Literal(literal));
            rest = remainder;
        }
    }
    tokens
}

fn match_tokens(tokens: &[Token], input: &[u8]) -> bool {
    match tokens.split_first() {
        None => input.is_empty(),
        Some((Token::Literal(lit), rest)) => {
            let lit = lit.as_bytes();
            input.len() >= lit.len() && &input[..lit.len()] == lit
                && match_tokens(rest, &input[lit.len()..])
        }
        Some((Token::Star, rest)) => {
            for i in 0..=input.len() {
                if input[..i].contains(&b'/') {
                    break;
                }
                if match_tokens(rest, &input[i..]) {
                    return true;
                }
            }
            false
        }
        Some((Token::Globstar, rest)) => {
            for i in 0..=input.len() {
                if match_tokens(rest, &input[i..]) {
                    return true;
                }
            }
            false
        }
    }
}
