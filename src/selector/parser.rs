//! Pattern grammar: base selector + predicate chain + `,` alternation.

use crate::error::PatternError;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub(crate) alternatives: Vec<PatternAlternative>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternAlternative {
    pub(crate) base: BaseSelector,
    pub(crate) predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BaseSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attr {
        name: String,
        value: Option<String>,
    },
    TagAttr {
        tag: String,
        name: String,
        value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Contains(String),
    ContainsI(String),
    ContainsRegex(RegexPredicate),
    Has(Pattern),
    HasParent(Pattern),
    HasAncestor(Pattern),
    HasSibling(Pattern),
    Without(String),
    Not(Pattern),
    Count(CountOp, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CountOp {
    pub(crate) fn eval(self, count: usize, n: usize) -> bool {
        match self {
            CountOp::Eq => count == n,
            CountOp::Gt => count > n,
            CountOp::Lt => count < n,
            CountOp::Ge => count >= n,
            CountOp::Le => count <= n,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegexPredicate {
    source: String,
    flags: String,
    compiled: CompiledRegex,
}

impl RegexPredicate {
    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl PartialEq for RegexPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

#[derive(Debug, Clone)]
enum CompiledRegex {
    Std(Arc<regex::Regex>),
    Fancy(Arc<fancy_regex::Regex>),
}

impl CompiledRegex {
    fn is_match(&self, text: &str) -> bool {
        match self {
            CompiledRegex::Std(re) => re.is_match(text),
            CompiledRegex::Fancy(re) => re.is_match(text).unwrap_or(false),
        }
    }
}

pub(crate) fn parse_pattern(source: &str) -> Result<Pattern, PatternError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(PatternError::UnexpectedEof);
    }
    let mut alternatives = Vec::new();
    for part in split_top_level_commas(trimmed) {
        let part = part.trim();
        if part.is_empty() {
            return Err(PatternError::UnexpectedEof);
        }
        alternatives.push(parse_alternative(part)?);
    }
    Ok(Pattern { alternatives })
}

fn parse_alternative(s: &str) -> Result<PatternAlternative, PatternError> {
    let mut scanner = Scanner::new(s);
    let base = parse_base(&mut scanner)?;
    let mut predicates = Vec::new();
    loop {
        scanner.skip_ws();
        match scanner.peek() {
            Some(':') => {
                if let Some(p) = parse_predicate(&mut scanner)? {
                    predicates.push(p);
                }
            }
            None => break,
            Some(c) => return Err(PatternError::UnexpectedToken(c.to_string())),
        }
    }
    Ok(PatternAlternative { base, predicates })
}

fn parse_base(scanner: &mut Scanner) -> Result<BaseSelector, PatternError> {
    scanner.skip_ws();
    match scanner.peek() {
        Some('*') => {
            scanner.advance_char();
            Ok(BaseSelector::Universal)
        }
        Some('#') => {
            scanner.advance_char();
            let id = scanner.read_ident();
            if id.is_empty() {
                return Err(PatternError::UnexpectedEof);
            }
            Ok(BaseSelector::Id(id))
        }
        Some('.') => {
            scanner.advance_char();
            let class = scanner.read_ident();
            if class.is_empty() {
                return Err(PatternError::UnexpectedEof);
            }
            Ok(BaseSelector::Class(class))
        }
        Some('[') => {
            let (name, value) = parse_attr_bracket(scanner)?;
            Ok(BaseSelector::Attr { name, value })
        }
        Some(c) if c.is_ascii_alphabetic() => {
            let tag = scanner.read_ident().to_ascii_lowercase();
            if scanner.peek() == Some('[') {
                let (name, value) = parse_attr_bracket(scanner)?;
                Ok(BaseSelector::TagAttr { tag, name, value })
            } else {
                Ok(BaseSelector::Tag(tag))
            }
        }
        Some(c) => Err(PatternError::UnexpectedToken(c.to_string())),
        None => Err(PatternError::UnexpectedEof),
    }
}

fn parse_attr_bracket(scanner: &mut Scanner) -> Result<(String, Option<String>), PatternError> {
    scanner.advance_char(); // '['
    scanner.skip_ws();
    let name = scanner.read_ident().to_ascii_lowercase();
    if name.is_empty() {
        return Err(PatternError::UnexpectedEof);
    }
    scanner.skip_ws();
    let value = match scanner.peek() {
        Some(']') => None,
        Some('=') => {
            scanner.advance_char();
            scanner.skip_ws();
            let raw = scanner.read_quoted_raw()?;
            Some(parse_quoted_str(&raw)?)
        }
        Some(c) => return Err(PatternError::UnexpectedToken(c.to_string())),
        None => return Err(PatternError::UnexpectedEof),
    };
    scanner.skip_ws();
    if scanner.peek() != Some(']') {
        return Err(PatternError::UnexpectedToken(
            scanner.peek().map(|c| c.to_string()).unwrap_or_default(),
        ));
    }
    scanner.advance_char();
    Ok((name, value))
}

fn parse_predicate(scanner: &mut Scanner) -> Result<Option<Predicate>, PatternError> {
    scanner.advance_char(); // ':'
    let name = scanner.read_pred_name();
    if name.is_empty() {
        return Err(PatternError::UnexpectedEof);
    }
    let has_args = scanner.peek() == Some('(');
    match name.as_str() {
        "contains" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::Contains(parse_quoted_str(&inner)?)))
        }
        "contains-i" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::ContainsI(parse_quoted_str(&inner)?)))
        }
        "contains-regex" => {
            let inner = read_balanced_parens(scanner)?;
            let (pattern, flags) = parse_regex_inner(&inner)?;
            let compiled = compile_regex(&pattern, &flags)?;
            Ok(Some(Predicate::ContainsRegex(RegexPredicate {
                source: pattern,
                flags,
                compiled,
            })))
        }
        "has" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::Has(parse_pattern(&inner)?)))
        }
        "has-parent" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::HasParent(parse_pattern(&inner)?)))
        }
        "has-ancestor" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::HasAncestor(parse_pattern(&inner)?)))
        }
        "has-sibling" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::HasSibling(parse_pattern(&inner)?)))
        }
        "without" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::Without(inner.trim().to_ascii_lowercase())))
        }
        "not" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(Predicate::Not(parse_pattern(&inner)?)))
        }
        "count" => {
            let inner = read_balanced_parens(scanner)?;
            Ok(Some(parse_count(&inner)?))
        }
        other => {
            if has_args {
                read_balanced_parens(scanner)?;
            }
            log::warn!("ignoring unknown selector predicate `:{other}`");
            Ok(None)
        }
    }
}

fn parse_count(inner: &str) -> Result<Predicate, PatternError> {
    let s = inner.trim();
    let (op, rest) = if let Some(r) = s.strip_prefix(">=") {
        (CountOp::Ge, r)
    } else if let Some(r) = s.strip_prefix("<=") {
        (CountOp::Le, r)
    } else if let Some(r) = s.strip_prefix('>') {
        (CountOp::Gt, r)
    } else if let Some(r) = s.strip_prefix('<') {
        (CountOp::Lt, r)
    } else if let Some(r) = s.strip_prefix('=') {
        (CountOp::Eq, r)
    } else {
        return Err(PatternError::InvalidCount(inner.to_string()));
    };
    let n: usize = rest
        .trim()
        .parse()
        .map_err(|_| PatternError::InvalidCount(inner.to_string()))?;
    Ok(Predicate::Count(op, n))
}

fn parse_regex_inner(s: &str) -> Result<(String, String), PatternError> {
    let t = s.trim();
    if !t.starts_with('/') {
        return Err(PatternError::InvalidRegex(t.to_string(), "expected /pattern/flags".into()));
    }
    let mut split_at = None;
    for (i, c) in t.char_indices().skip(1) {
        if c == '/' && t[i + 1..].chars().all(|f| f.is_ascii_alphabetic()) {
            split_at = Some(i);
        }
    }
    let idx = split_at.ok_or_else(|| {
        PatternError::InvalidRegex(t.to_string(), "missing closing /".into())
    })?;
    Ok((t[1..idx].to_string(), t[idx + 1..].to_string()))
}

fn compile_regex(pattern: &str, flags: &str) -> Result<CompiledRegex, PatternError> {
    let prefixed = if flags.contains('i') {
        format!("(?i){pattern}")
    } else {
        pattern.to_string()
    };
    match regex::Regex::new(&prefixed) {
        Ok(re) => Ok(CompiledRegex::Std(Arc::new(re))),
        Err(_) => fancy_regex::Regex::new(&prefixed)
            .map(|re| CompiledRegex::Fancy(Arc::new(re)))
            .map_err(|e| PatternError::InvalidRegex(pattern.to_string(), e.to_string())),
    }
}

fn parse_quoted_str(raw: &str) -> Result<String, PatternError> {
    let t = raw.trim();
    let mut input = cssparser::ParserInput::new(t);
    let mut parser = cssparser::Parser::new(&mut input);
    parser
        .expect_string()
        .map(|s| s.as_ref().to_string())
        .map_err(|_| PatternError::UnexpectedToken(t.to_string()))
}

/// Read the raw (still-quoted) text of a `"..."`/`'...'` literal starting at
/// the current position, without unescaping it.
fn read_balanced_parens(scanner: &mut Scanner) -> Result<String, PatternError> {
    scanner.skip_ws();
    if scanner.peek() != Some('(') {
        return Err(PatternError::UnexpectedToken(
            scanner.peek().map(|c| c.to_string()).unwrap_or_default(),
        ));
    }
    scanner.advance_char();
    let start = scanner.pos();
    let mut depth = 1;
    loop {
        match scanner.peek() {
            None => return Err(PatternError::UnexpectedEof),
            Some('(') => {
                depth += 1;
                scanner.advance_char();
            }
            Some(')') => {
                depth -= 1;
                if depth == 0 {
                    let inner = scanner.slice(start, scanner.pos());
                    scanner.advance_char();
                    return Ok(inner);
                }
                scanner.advance_char();
            }
            Some(q @ ('"' | '\'')) => {
                scanner.advance_char();
                while let Some(c) = scanner.peek() {
                    if c == '\\' {
                        scanner.advance_char();
                        if scanner.peek().is_some() {
                            scanner.advance_char();
                        }
                        continue;
                    }
                    scanner.advance_char();
                    if c == q {
                        break;
                    }
                }
            }
            Some(_) => scanner.advance_char(),
        }
    }
}

/// Split `s` on top-level commas, ignoring commas nested inside
/// `(...)`/`[...]`/quoted strings (top-level alternation).
fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '"' | '\'' => {
                // Skip the quoted span so an embedded comma doesn't split.
                while let Some(&(_, next)) = chars.peek() {
                    chars.next();
                    if next == c {
                        break;
                    }
                    if next == '\\' {
                        chars.next();
                    }
                }
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner { src, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.src[start..end].to_string()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance_char();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn read_ident(&mut self) -> String {
        self.read_while(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    fn read_pred_name(&mut self) -> String {
        self.read_while(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    /// Read a `"..."`/`'...'` literal (including the quotes) at the current
    /// position, returning the raw (still-quoted) text.
    fn read_quoted_raw(&mut self) -> Result<String, PatternError> {
        let start = self.pos;
        let quote = self.peek().ok_or(PatternError::UnexpectedEof)?;
        if quote != '"' && quote != '\'' {
            return Err(PatternError::UnexpectedToken(quote.to_string()));
        }
        self.advance_char();
        loop {
            match self.peek() {
                None => return Err(PatternError::UnexpectedEof),
                Some('\\') => {
                    self.advance_char();
                    if self.peek().is_some() {
                        self.advance_char();
                    }
                }
                Some(c) if c == quote => {
                    self.advance_char();
                    break;
                }
                Some(_) => self.advance_char(),
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_attr_combo() {
        let p = parse_pattern(r#"img[alt]"#).unwrap();
        assert_eq!(p.alternatives.len(), 1);
        assert_eq!(
            p.alternatives[0].base,
            BaseSelector::TagAttr {
                tag: "img".into(),
                name: "alt".into(),
                value: None
            }
        );
    }

    #[test]
    fn parses_alternation() {
        let p = parse_pattern(r#"a:contains-i("click here"), button"#).unwrap();
        assert_eq!(p.alternatives.len(), 2);
    }

    #[test]
    fn parses_nested_has() {
        let p = parse_pattern(r#"label:without(for):has(input, select)"#).unwrap();
        assert_eq!(p.alternatives[0].predicates.len(), 2);
    }

    #[test]
    fn unknown_predicate_is_ignored_not_fatal() {
        let p = parse_pattern(r#"div:frobnicate(1,2)"#).unwrap();
        assert!(p.alternatives[0].predicates.is_empty());
    }

    #[test]
    fn parses_count() {
        let p = parse_pattern(r#"h1:count(> 1)"#).unwrap();
        assert_eq!(p.alternatives[0].predicates[0], Predicate::Count(CountOp::Gt, 1));
    }

    #[test]
    fn rejects_malformed_bracket() {
        assert!(parse_pattern(r#"img[alt"#).is_err());
    }
}
