use std::fmt;

use crate::{ast::HopOperator, value::format_number};

/// Kind and payload of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Grouping and argument punctuation
    ///
    /// # Examples
    /// ```text
    /// (  )  ,
    /// ```
    Delimiter(char),

    /// Number literal, always read as floating point
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// ```
    Number(f64),

    /// String literal in single or double quotes, escapes already removed
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'it\'s'
    /// ```
    String(String),

    /// Property, root, function or control name
    ///
    /// Runs until a delimiter, path operator or whitespace, so names such as
    /// `date-range` are single identifiers.
    Identifier(String),

    /// Binary operator symbol
    ///
    /// # Examples
    /// ```text
    /// +  -  *  /  =  <>  ><  <  <=  >  >=
    /// ```
    Operator(String),

    /// Hop between a value and a property
    ///
    /// # Examples
    /// ```text
    /// .  !  .@  !@
    /// ```
    PathOperator(HopOperator),
}

/// A token with its character offsets in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Offset of the first character
    pub start: usize,
    /// Offset just past the last character
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Token { kind, start, end }
    }

    pub fn is_delimiter(&self, delimiter: char) -> bool {
        matches!(self.kind, TokenKind::Delimiter(c) if c == delimiter)
    }

    pub fn is_operator(&self, symbols: &[&str]) -> bool {
        matches!(&self.kind, TokenKind::Operator(op) if symbols.contains(&op.as_str()))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Delimiter(c) => write!(f, "{}", c),
            TokenKind::Number(n) => f.write_str(&format_number(*n)),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Operator(op) => f.write_str(op),
            TokenKind::PathOperator(hop) => f.write_str(hop.symbol()),
        }
    }
}
