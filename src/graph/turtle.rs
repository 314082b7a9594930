//! Turtle reading and writing.
//!
//! The writer groups triples by subject and compacts IRIs with the longest
//! bound namespace whose remainder is a safe local name. The parser accepts
//! the subset of Turtle 1.1 produced by common RDF toolkits: `@prefix` /
//! `PREFIX`, `@base` / `BASE`, IRIs, prefixed names, `a`, blank node labels
//! and property lists, short and long string literals with escapes, language
//! tags, datatypes, bare numbers and booleans, `;` and `,` lists, comments.
//! Collections are rejected.

use std::collections::{BTreeMap, BTreeSet};

use super::vocab;
use super::{Datatype, GraphError, Literal, Term, Triple};

/// Serialize a canonical triple set
pub(crate) fn write(prefixes: &BTreeMap<String, String>, triples: &BTreeSet<Triple>) -> String {
    let mut out = String::new();
    for (prefix, namespace) in prefixes {
        out.push_str(&format!("@prefix {}: <{}> .\n", prefix, namespace));
    }
    if !prefixes.is_empty() {
        out.push('\n');
    }

    let mut current: Option<&Term> = None;
    for triple in triples {
        if current == Some(&triple.subject) {
            out.push_str(" ;\n    ");
        } else {
            if current.is_some() {
                out.push_str(" .\n\n");
            }
            out.push_str(&format_term(&triple.subject, prefixes));
            out.push(' ');
            current = Some(&triple.subject);
        }

        if triple.predicate == vocab::RDF_TYPE {
            out.push('a');
        } else {
            out.push_str(&format_iri(&triple.predicate, prefixes));
        }
        out.push(' ');
        out.push_str(&format_term(&triple.object, prefixes));
    }
    if current.is_some() {
        out.push_str(" .\n");
    }
    out
}

fn format_term(term: &Term, prefixes: &BTreeMap<String, String>) -> String {
    match term {
        Term::Iri(iri) => format_iri(iri, prefixes),
        Term::Blank(label) => format!("_:{}", label),
        Term::Literal(literal) => {
            let quoted = format!("\"{}\"", escape_literal(&literal.lexical));
            match &literal.datatype {
                Datatype::String => quoted,
                Datatype::Lang(tag) => format!("{}@{}", quoted, tag),
                other => match other.iri() {
                    Some(iri) => format!("{}^^{}", quoted, format_iri(iri, prefixes)),
                    None => quoted,
                },
            }
        }
    }
}

/// Compact an IRI with the longest matching namespace, if the remainder allows it
fn format_iri(iri: &str, prefixes: &BTreeMap<String, String>) -> String {
    let best = prefixes
        .iter()
        .filter(|(_, namespace)| iri.starts_with(namespace.as_str()))
        .max_by_key(|(_, namespace)| namespace.len());

    if let Some((prefix, namespace)) = best {
        let local = &iri[namespace.len()..];
        if is_valid_local_name(local) {
            return format!("{}:{}", prefix, local);
        }
    }
    format!("<{}>", iri)
}

/// Conservative check for a local name that needs no escaping
fn is_valid_local_name(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if !(first.is_ascii_alphanumeric() || first == '_') || s.ends_with('.') {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Escape a lexical form for a short double-quoted string
pub(crate) fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Parse a Turtle document into its prefixes and triples
pub(crate) fn parse(
    input: &str,
) -> Result<(BTreeMap<String, String>, Vec<Triple>), GraphError> {
    let mut parser = Parser::new(input);
    parser.document()?;
    Ok((parser.prefixes, parser.triples))
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    line_start: usize,
    base: Option<String>,
    prefixes: BTreeMap<String, String>,
    triples: Vec<Triple>,
    anonymous: usize,
}

type ParseResult<T> = Result<T, GraphError>;

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{00B7}')
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.trim_start_matches('\u{feff}').chars().collect(),
            pos: 0,
            line: 1,
            line_start: 0,
            base: None,
            prefixes: BTreeMap::new(),
            triples: Vec::new(),
            anonymous: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    /// 1-based column of the next character
    fn column(&self) -> usize {
        self.pos - self.line_start + 1
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(GraphError::Parse {
            line: self.line,
            column: self.column(),
            message: message.into(),
        })
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => self.error(format!("expected '{}', found '{}'", expected, c)),
            None => self.error(format!("expected '{}', found end of input", expected)),
        }
    }

    /// Whether `keyword` starts at the cursor and is not part of a longer name
    fn keyword_ahead(&self, keyword: &str, case_insensitive: bool) -> bool {
        let len = keyword.chars().count();
        let matches = keyword.chars().enumerate().all(|(i, k)| match self.peek_at(i) {
            Some(c) if case_insensitive => c.eq_ignore_ascii_case(&k),
            Some(c) => c == k,
            None => false,
        });
        matches
            && !self
                .peek_at(len)
                .map(|c| is_name_char(c) || c == ':')
                .unwrap_or(false)
    }

    fn document(&mut self) -> ParseResult<()> {
        loop {
            self.skip_ws();
            let Some(c) = self.peek() else {
                return Ok(());
            };

            if c == '@' {
                self.directive()?;
            } else if self.keyword_ahead("PREFIX", true) {
                self.pos += "PREFIX".len();
                self.prefix_declaration(false)?;
            } else if self.keyword_ahead("BASE", true) {
                self.pos += "BASE".len();
                self.skip_ws();
                let iri = self.iri_ref()?;
                self.base = Some(iri);
            } else {
                self.statement()?;
            }
        }
    }

    fn directive(&mut self) -> ParseResult<()> {
        self.bump();
        let mut word = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphabetic()) {
            word.push(c);
            self.bump();
        }
        match word.as_str() {
            "prefix" => self.prefix_declaration(true),
            "base" => {
                self.skip_ws();
                let iri = self.iri_ref()?;
                self.base = Some(iri);
                self.expect('.')
            }
            other => self.error(format!("unknown directive '@{}'", other)),
        }
    }

    fn prefix_declaration(&mut self, terminated: bool) -> ParseResult<()> {
        self.skip_ws();
        let mut prefix = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            prefix.push(c);
            self.bump();
        }
        self.expect(':')?;
        self.skip_ws();
        let namespace = self.iri_ref()?;
        self.prefixes.insert(prefix, namespace);
        if terminated {
            self.expect('.')?;
        }
        Ok(())
    }

    fn statement(&mut self) -> ParseResult<()> {
        self.skip_ws();
        if self.peek() == Some('[') {
            let subject = self.blank_node_property_list()?;
            self.skip_ws();
            if self.peek() != Some('.') {
                self.predicate_object_list(&subject)?;
            }
        } else {
            let subject = self.subject()?;
            self.predicate_object_list(&subject)?;
        }
        self.expect('.')
    }

    fn subject(&mut self) -> ParseResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri_ref()?)),
            Some('_') if self.peek_at(1) == Some(':') => self.blank_label(),
            Some('(') => self.error("RDF collections are not supported"),
            Some('"') | Some('\'') => self.error("literal in subject position"),
            Some(_) => Ok(Term::Iri(self.prefixed_name()?)),
            None => self.error("unexpected end of input, expected subject"),
        }
    }

    fn predicate_object_list(&mut self, subject: &Term) -> ParseResult<()> {
        loop {
            let predicate = self.predicate()?;
            self.object_list(subject, &predicate)?;

            self.skip_ws();
            if self.peek() != Some(';') {
                return Ok(());
            }
            while self.peek() == Some(';') {
                self.bump();
                self.skip_ws();
            }
            if matches!(self.peek(), Some('.') | Some(']') | None) {
                return Ok(());
            }
        }
    }

    fn predicate(&mut self) -> ParseResult<String> {
        self.skip_ws();
        match self.peek() {
            Some('a') if self.keyword_ahead("a", false) => {
                self.bump();
                Ok(vocab::RDF_TYPE.to_string())
            }
            Some('<') => self.iri_ref(),
            Some(_) => self.prefixed_name(),
            None => self.error("unexpected end of input, expected predicate"),
        }
    }

    fn object_list(&mut self, subject: &Term, predicate: &str) -> ParseResult<()> {
        loop {
            let object = self.object()?;
            self.triples
                .push(Triple::new(subject.clone(), predicate, object));
            self.skip_ws();
            if self.peek() == Some(',') {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> ParseResult<Term> {
        self.skip_ws();
        match self.peek() {
            Some('<') => Ok(Term::Iri(self.iri_ref()?)),
            Some('_') if self.peek_at(1) == Some(':') => self.blank_label(),
            Some('[') => self.blank_node_property_list(),
            Some('"') | Some('\'') => Ok(Term::Literal(self.literal()?)),
            Some('(') => self.error("RDF collections are not supported"),
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' => {
                Ok(Term::Literal(self.number()?))
            }
            Some('.') if self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                Ok(Term::Literal(self.number()?))
            }
            Some(_) if self.keyword_ahead("true", false) => {
                self.pos += 4;
                Ok(Term::Literal(Literal::typed("true", vocab::XSD_BOOLEAN)))
            }
            Some(_) if self.keyword_ahead("false", false) => {
                self.pos += 5;
                Ok(Term::Literal(Literal::typed("false", vocab::XSD_BOOLEAN)))
            }
            Some(_) => Ok(Term::Iri(self.prefixed_name()?)),
            None => self.error("unexpected end of input, expected object"),
        }
    }

    fn blank_label(&mut self) -> ParseResult<Term> {
        // `_:`
        self.bump();
        self.bump();
        let mut label = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            label.push(c);
            self.bump();
        }
        while label.ends_with('.') {
            label.pop();
            self.pos -= 1;
        }
        if label.is_empty() {
            return self.error("empty blank node label");
        }
        Ok(Term::Blank(label))
    }

    fn blank_node_property_list(&mut self) -> ParseResult<Term> {
        self.expect('[')?;
        let node = Term::Blank(format!("anon-{}", self.anonymous));
        self.anonymous += 1;

        self.skip_ws();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(node);
        }
        self.predicate_object_list(&node)?;
        self.expect(']')?;
        Ok(node)
    }

    fn iri_ref(&mut self) -> ParseResult<String> {
        self.expect('<')?;
        let mut iri = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some('\\') => iri.push(self.unicode_escape()?),
                Some(c) if c.is_whitespace() || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`') => {
                    return self.error(format!("invalid character '{}' in IRI", c.escape_default()));
                }
                Some(c) => iri.push(c),
                None => return self.error("unterminated IRI"),
            }
        }
        Ok(self.resolve(iri))
    }

    fn resolve(&self, iri: String) -> String {
        let Some(base) = &self.base else {
            return iri;
        };
        let has_scheme = iri
            .split(|c| matches!(c, '/' | '?' | '#'))
            .next()
            .map(|head| head.contains(':'))
            .unwrap_or(false);
        if has_scheme {
            iri
        } else {
            format!("{}{}", base, iri)
        }
    }

    fn prefixed_name(&mut self) -> ParseResult<String> {
        let mut prefix = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            prefix.push(c);
            self.bump();
        }
        if self.peek() != Some(':') {
            return match self.peek() {
                Some(c) if prefix.is_empty() => self.error(format!("unexpected character '{}'", c)),
                _ => self.error(format!("expected prefixed name, found '{}'", prefix)),
            };
        }
        self.bump();

        let mut local = String::new();
        while let Some(c) = self.peek() {
            if is_name_char(c) || c == ':' {
                local.push(c);
                self.bump();
            } else if c == '%' {
                let hex: String = (1..=2).filter_map(|i| self.peek_at(i)).collect();
                if hex.len() != 2 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    return self.error("invalid percent escape in prefixed name");
                }
                local.push('%');
                local.push_str(&hex);
                self.pos += 3;
            } else if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) if "_~.-!$&'()*+,;=/?#@%".contains(escaped) => local.push(escaped),
                    _ => return self.error("invalid escape in prefixed name"),
                }
            } else {
                break;
            }
        }
        // A trailing dot terminates the statement
        while local.ends_with('.') {
            local.pop();
            self.pos -= 1;
        }

        match self.prefixes.get(&prefix) {
            Some(namespace) => Ok(format!("{}{}", namespace, local)),
            None => Err(GraphError::UndefinedPrefix {
                line: self.line,
                prefix,
            }),
        }
    }

    fn literal(&mut self) -> ParseResult<Literal> {
        let lexical = self.string()?;

        match self.peek() {
            Some('@') => {
                self.bump();
                let mut tag = String::new();
                while let Some(c) = self.peek().filter(|c| c.is_ascii_alphanumeric() || *c == '-') {
                    tag.push(c);
                    self.bump();
                }
                if tag.is_empty() {
                    return self.error("empty language tag");
                }
                Ok(Literal::lang(lexical, tag))
            }
            Some('^') if self.peek_at(1) == Some('^') => {
                self.bump();
                self.bump();
                let datatype = match self.peek() {
                    Some('<') => self.iri_ref()?,
                    _ => self.prefixed_name()?,
                };
                Ok(Literal::typed(lexical, &datatype))
            }
            _ => Ok(Literal::string(lexical)),
        }
    }

    fn string(&mut self) -> ParseResult<String> {
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return self.error("expected string literal"),
        };
        let long = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if long {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            if !long && matches!(self.peek(), Some('\n' | '\r')) {
                return self.error("line break in short string literal");
            }
            match self.bump() {
                None => return self.error("unterminated string literal"),
                Some(c) if c == quote => {
                    if !long {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        break;
                    }
                    value.push(c);
                }
                Some('\\') => value.push(self.string_escape()?),
                Some(c) => value.push(c),
            }
        }
        Ok(value)
    }

    fn string_escape(&mut self) -> ParseResult<char> {
        match self.peek() {
            Some('t') => {
                self.bump();
                Ok('\t')
            }
            Some('b') => {
                self.bump();
                Ok('\u{0008}')
            }
            Some('n') => {
                self.bump();
                Ok('\n')
            }
            Some('r') => {
                self.bump();
                Ok('\r')
            }
            Some('f') => {
                self.bump();
                Ok('\u{000C}')
            }
            Some(c @ ('"' | '\'' | '\\')) => {
                self.bump();
                Ok(c)
            }
            Some('u') | Some('U') => self.unicode_escape(),
            _ => self.error("invalid escape sequence in string"),
        }
    }

    /// `uXXXX` or `UXXXXXXXX`, cursor just after the backslash
    fn unicode_escape(&mut self) -> ParseResult<char> {
        let width = match self.bump() {
            Some('u') => 4,
            Some('U') => 8,
            _ => return self.error("invalid escape sequence"),
        };
        let mut hex = String::with_capacity(width);
        for _ in 0..width {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return self.error("invalid unicode escape"),
            }
        }
        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
            Some(c) => Ok(c),
            None => self.error(format!("invalid code point U+{}", hex)),
        }
    }

    fn number(&mut self) -> ParseResult<Literal> {
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.bump();
        }

        let mut digits = 0;
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(c);
            self.bump();
            digits += 1;
        }

        let mut decimal = false;
        if self.peek() == Some('.') && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            decimal = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                text.push(c);
                self.bump();
                digits += 1;
            }
        }

        if digits == 0 {
            return self.error("invalid numeric literal");
        }

        let mut exponent = false;
        if let Some(e @ ('e' | 'E')) = self.peek() {
            exponent = true;
            text.push(e);
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            let mut exp_digits = 0;
            while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                text.push(c);
                self.bump();
                exp_digits += 1;
            }
            if exp_digits == 0 {
                return self.error("invalid exponent in numeric literal");
            }
        }

        let datatype = if exponent {
            vocab::XSD_DOUBLE
        } else if decimal {
            vocab::XSD_DECIMAL
        } else {
            vocab::XSD_INTEGER
        };
        Ok(Literal::typed(text, datatype))
    }
}
