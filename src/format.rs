//! Format strings attached to views, e.g.
//!
//! ```text
//! list { separator: ", "; last-separator: ", and " }
//! number { decimal-digits: 2 }
//! item { title: expression(concat(.label, " (", .year, ")")) }
//! ```
//!
//! The format scanner does not know the expression grammar; the caller
//! injects a parser that is handed the full text and the offset just after
//! `expression(`.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{
    expression::Expression,
    lexer::{LexError, is_space, scan_number, scan_string},
    parser::{ParseError, Parsed},
};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w-]+").expect("identifier pattern"));

static COLOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]*").expect("color pattern"));

/// Parses an embedded expression starting at the given offset.
pub type EmbeddedParser<'p> = &'p dyn Fn(&str, usize) -> Result<Parsed<Expression>, ParseError>;

#[derive(Debug, Clone, PartialEq)]
pub enum FormatTokenKind {
    /// `{ } ( ) , : ;`
    Delimiter(char),
    Number(f64),
    String(String),
    Identifier(String),
    /// Text between the parens of `url(...)`
    Url(String),
    /// `#` and hex digits, `#` included
    Color(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatToken {
    pub kind: FormatTokenKind,
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for FormatTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTokenKind::Delimiter(c) => write!(f, "{}", c),
            FormatTokenKind::Number(n) => write!(f, "{}", n),
            FormatTokenKind::String(s) => write!(f, "\"{}\"", s),
            FormatTokenKind::Identifier(name) => f.write_str(name),
            FormatTokenKind::Url(url) => write!(f, "url({})", url),
            FormatTokenKind::Color(color) => f.write_str(color),
            FormatTokenKind::Expression(expression) => write!(f, "expression({})", expression),
        }
    }
}

/// Tokenizer for format strings.
pub struct FormatScanner<'p> {
    text: String,
    input: Vec<char>,
    index: usize,
    token: Option<FormatToken>,
    parse: EmbeddedParser<'p>,
}

impl<'p> FormatScanner<'p> {
    pub fn new(text: &str, start_index: usize, parse: EmbeddedParser<'p>) -> Result<Self, ParseError> {
        let mut scanner = FormatScanner {
            text: text.to_string(),
            input: text.chars().collect(),
            index: start_index,
            token: None,
            parse,
        };
        scanner.next()?;
        Ok(scanner)
    }

    pub fn token(&self) -> Option<&FormatToken> {
        self.token.as_ref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn is_delimiter(&self, delimiter: char) -> bool {
        matches!(self.token.as_ref().map(|t| &t.kind), Some(FormatTokenKind::Delimiter(c)) if *c == delimiter)
    }

    fn skip_spaces_from(&self, mut i: usize) -> usize {
        while i < self.input.len() && is_space(self.input[i]) {
            i += 1;
        }
        i
    }

    /// Length in characters of the `pattern` match at char offset `at`.
    fn match_len(&self, pattern: &Regex, at: usize) -> usize {
        let byte = self
            .text
            .char_indices()
            .nth(at)
            .map_or(self.text.len(), |(byte, _)| byte);
        pattern
            .find(&self.text[byte..])
            .map_or(0, |m| m.as_str().chars().count())
    }

    pub fn next(&mut self) -> Result<(), ParseError> {
        self.token = None;
        self.index = self.skip_spaces_from(self.index);
        let Some(&c) = self.input.get(self.index) else {
            return Ok(());
        };
        let start = self.index;

        let kind = match c {
            '{' | '}' | '(' | ')' | ',' | ':' | ';' => {
                self.index += 1;
                FormatTokenKind::Delimiter(c)
            }
            '"' | '\'' => {
                let (value, end) = scan_string(&self.input, start)?;
                self.index = end;
                FormatTokenKind::String(value)
            }
            '#' => {
                let len = self.match_len(&COLOR, start);
                self.index += len;
                FormatTokenKind::Color(self.input[start..self.index].iter().collect())
            }
            c if c.is_ascii_digit() => {
                let (value, end) = scan_number(&self.input, start);
                self.index = end;
                FormatTokenKind::Number(value)
            }
            _ => {
                let len = self.match_len(&IDENTIFIER, start);
                if len == 0 {
                    return Err(LexError::UnexpectedCharacter { ch: c, position: start }.into());
                }
                self.index += len;
                let identifier: String = self.input[start..self.index].iter().collect();
                let open = self.skip_spaces_from(self.index);
                let followed_by_paren = self.input.get(open) == Some(&'(');

                match identifier.as_str() {
                    "url" if followed_by_paren => self.scan_url(start, open)?,
                    "expression" if followed_by_paren => self.scan_expression(open)?,
                    _ => FormatTokenKind::Identifier(identifier),
                }
            }
        };

        self.token = Some(FormatToken {
            kind,
            start,
            end: self.index,
        });
        Ok(())
    }

    fn scan_url(&mut self, start: usize, open: usize) -> Result<FormatTokenKind, ParseError> {
        let close = (open + 1..self.input.len())
            .find(|&i| self.input[i] == ')')
            .ok_or(LexError::MissingUrlParen { position: start })?;
        self.index = close + 1;
        Ok(FormatTokenKind::Url(self.input[open + 1..close].iter().collect()))
    }

    fn scan_expression(&mut self, open: usize) -> Result<FormatTokenKind, ParseError> {
        let parsed = (self.parse)(&self.text, open + 1)?;
        let close = self.skip_spaces_from(parsed.index);
        if self.input.get(close) != Some(&')') {
            return Err(LexError::MissingExpressionParen { position: close }.into());
        }
        self.index = close + 1;
        Ok(FormatTokenKind::Expression(parsed.value))
    }
}

/// One value of a format setting.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatValue {
    Number(f64),
    String(String),
    Identifier(String),
    Url(String),
    Color(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub name: String,
    pub values: Vec<FormatValue>,
}

/// Settings that apply to values of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRule {
    pub value_type: String,
    pub settings: Vec<Setting>,
}

fn expected(what: &'static str, scanner: &FormatScanner<'_>) -> ParseError {
    match scanner.token() {
        Some(token) => ParseError::Expected {
            expected: what,
            found: token.kind.to_string(),
            position: token.start,
        },
        None => ParseError::Expected {
            expected: what,
            found: "end of text".into(),
            position: scanner.index(),
        },
    }
}

fn parse_setting(scanner: &mut FormatScanner<'_>, name: String) -> Result<Setting, ParseError> {
    scanner.next()?;
    if !scanner.is_delimiter(':') {
        return Err(expected("':'", scanner));
    }
    scanner.next()?;

    let mut values = Vec::new();
    while let Some(token) = scanner.token() {
        let value = match token.kind.clone() {
            FormatTokenKind::Number(n) => FormatValue::Number(n),
            FormatTokenKind::String(s) => FormatValue::String(s),
            FormatTokenKind::Identifier(id) => FormatValue::Identifier(id),
            FormatTokenKind::Url(url) => FormatValue::Url(url),
            FormatTokenKind::Color(color) => FormatValue::Color(color),
            FormatTokenKind::Expression(expression) => FormatValue::Expression(expression),
            FormatTokenKind::Delimiter(_) => break,
        };
        values.push(value);
        scanner.next()?;
    }
    if values.is_empty() {
        return Err(expected("setting value", scanner));
    }
    Ok(Setting { name, values })
}

/// Parses a sequence of `type { name: value...; ... }` rules.
///
/// # Examples
///
/// ```
/// use exhibit_expression::{Registry, format::{FormatValue, parse_format_rules}, parse_expression_at};
///
/// let registry = Registry::standard();
/// let parse = |text: &str, start: usize| parse_expression_at(text, start, &registry);
/// let rules = parse_format_rules("list { separator: \", \" }", &parse).unwrap();
/// assert_eq!(rules[0].value_type, "list");
/// assert_eq!(rules[0].settings[0].values, vec![FormatValue::String(", ".into())]);
/// ```
pub fn parse_format_rules(text: &str, parse: EmbeddedParser<'_>) -> Result<Vec<FormatRule>, ParseError> {
    let mut scanner = FormatScanner::new(text, 0, parse)?;
    let mut rules = Vec::new();

    while let Some(token) = scanner.token() {
        let value_type = match &token.kind {
            FormatTokenKind::Delimiter(';') => {
                scanner.next()?;
                continue;
            }
            FormatTokenKind::Identifier(name) => name.clone(),
            _ => return Err(expected("value type", &scanner)),
        };
        scanner.next()?;

        let mut settings = Vec::new();
        if scanner.is_delimiter('{') {
            scanner.next()?;
            loop {
                match scanner.token().map(|t| t.kind.clone()) {
                    Some(FormatTokenKind::Delimiter('}')) => {
                        scanner.next()?;
                        break;
                    }
                    Some(FormatTokenKind::Delimiter(';')) => scanner.next()?,
                    Some(FormatTokenKind::Identifier(name)) => settings.push(parse_setting(&mut scanner, name)?),
                    _ => return Err(expected("setting name or '}'", &scanner)),
                }
            }
        }
        log::debug!("format rule for {} with {} settings", value_type, settings.len());
        rules.push(FormatRule { value_type, settings });
    }
    Ok(rules)
}
