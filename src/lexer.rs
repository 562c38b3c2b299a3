use thiserror::Error;

use crate::ast::{HopOperator, Token, TokenKind};

/// Errors raised while splitting text into tokens.
///
/// Positions are character offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Unterminated string starting at {start}")]
    UnterminatedString { start: usize },

    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Missing ) to close url at {position}")]
    MissingUrlParen { position: usize },

    #[error("Missing ) to close expression at {position}")]
    MissingExpressionParen { position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedString { start } => *start,
            LexError::UnexpectedCharacter { position, .. }
            | LexError::MissingUrlParen { position }
            | LexError::MissingExpressionParen { position } => *position,
        }
    }
}

pub(crate) fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// Scans a quoted string whose opening quote is at `start`.
///
/// Returns the unescaped content and the offset just past the closing quote.
pub(crate) fn scan_string(input: &[char], start: usize) -> Result<(String, usize), LexError> {
    let quote = input[start];
    let mut i = start + 1;
    while i < input.len() {
        if input[i] == quote && input[i - 1] != '\\' {
            let raw: String = input[start + 1..i].iter().collect();
            let value = raw.replace("\\'", "'").replace("\\\"", "\"");
            return Ok((value, i + 1));
        }
        i += 1;
    }
    Err(LexError::UnterminatedString { start })
}

/// Scans digits, an optional `.` and more digits.
pub(crate) fn scan_number(input: &[char], start: usize) -> (f64, usize) {
    let mut i = start;
    while i < input.len() && input[i].is_ascii_digit() {
        i += 1;
    }
    if i < input.len() && input[i] == '.' {
        i += 1;
        while i < input.len() && input[i].is_ascii_digit() {
            i += 1;
        }
    }
    let literal: String = input[start..i].iter().collect();
    (literal.parse::<f64>().unwrap_or(f64::NAN), i)
}

/// Tokenizer for expression text.
///
/// The scanner always holds the current token; [`Scanner::next`] moves to the
/// following one. Scanning may start at any offset, which lets a caller parse
/// an expression embedded inside a larger string.
///
/// # Examples
///
/// ```
/// use exhibit_expression::{Scanner, TokenKind};
///
/// let mut scanner = Scanner::new("count(.author)", 0).unwrap();
/// assert_eq!(scanner.token().unwrap().kind, TokenKind::Identifier("count".into()));
/// scanner.next().unwrap();
/// assert_eq!(scanner.token().unwrap().kind, TokenKind::Delimiter('('));
/// ```
pub struct Scanner {
    input: Vec<char>,
    index: usize,
    token: Option<Token>,
}

impl Scanner {
    /// Creates a scanner positioned on the first token at or after `start_index`.
    pub fn new(text: &str, start_index: usize) -> Result<Self, LexError> {
        let mut scanner = Scanner {
            input: text.chars().collect(),
            index: start_index,
            token: None,
        };
        scanner.next()?;
        Ok(scanner)
    }

    /// Current token, `None` once the input is exhausted.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Offset just past the current token.
    pub fn index(&self) -> usize {
        self.index
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.index).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.index + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if is_space(ch) {
                self.index += 1;
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> Result<String, LexError> {
        let start = self.index;
        while let Some(ch) = self.current_char() {
            if matches!(ch, '(' | ')' | ',' | '.' | '!' | '@') || is_space(ch) {
                break;
            }
            self.index += 1;
        }
        if self.index == start {
            return Err(LexError::UnexpectedCharacter {
                ch: self.input[start],
                position: start,
            });
        }
        Ok(self.input[start..self.index].iter().collect())
    }

    /// Advances to the next token.
    pub fn next(&mut self) -> Result<(), LexError> {
        self.token = None;
        self.skip_whitespace();

        let Some(c1) = self.current_char() else {
            return Ok(());
        };
        let c2 = self.peek_char(1);
        let start = self.index;

        let kind = match c1 {
            '.' | '!' => {
                let symbol = if c2 == Some('@') {
                    self.index += 2;
                    if c1 == '.' { ".@" } else { "!@" }
                } else {
                    self.index += 1;
                    if c1 == '.' { "." } else { "!" }
                };
                let hop = HopOperator::from_symbol(symbol)
                    .ok_or(LexError::UnexpectedCharacter { ch: c1, position: start })?;
                TokenKind::PathOperator(hop)
            }
            '<' | '>' => match c2 {
                Some(c) if c == '=' || (matches!(c, '<' | '>') && c != c1) => {
                    self.index += 2;
                    TokenKind::Operator([c1, c].iter().collect())
                }
                _ => {
                    self.index += 1;
                    TokenKind::Operator(c1.to_string())
                }
            },
            '+' | '-' | '*' | '/' | '=' => {
                self.index += 1;
                TokenKind::Operator(c1.to_string())
            }
            '(' | ')' | ',' => {
                self.index += 1;
                TokenKind::Delimiter(c1)
            }
            '"' | '\'' => {
                let (value, end) = scan_string(&self.input, start)?;
                self.index = end;
                TokenKind::String(value)
            }
            c if c.is_ascii_digit() => {
                let (value, end) = scan_number(&self.input, start);
                self.index = end;
                TokenKind::Number(value)
            }
            _ => TokenKind::Identifier(self.read_identifier()?),
        };

        self.token = Some(Token::new(kind, start, self.index));
        Ok(())
    }
}

/// Scans all of `text` into tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut scanner = Scanner::new(text, 0)?;
    let mut tokens = Vec::new();
    while let Some(token) = scanner.token.take() {
        tokens.push(token);
        scanner.next()?;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_angle_operators() {
        assert_eq!(
            kinds("< <= <> >< > >= <<"),
            vec![
                TokenKind::Operator("<".into()),
                TokenKind::Operator("<=".into()),
                TokenKind::Operator("<>".into()),
                TokenKind::Operator("><".into()),
                TokenKind::Operator(">".into()),
                TokenKind::Operator(">=".into()),
                TokenKind::Operator("<".into()),
                TokenKind::Operator("<".into()),
            ]
        );
    }

    #[test]
    fn test_lone_at_sign_is_rejected() {
        let err = tokenize("@x").unwrap_err();
        assert_eq!(err, LexError::UnexpectedCharacter { ch: '@', position: 0 });
    }

    #[test]
    fn test_start_offset() {
        let scanner = Scanner::new("ignored .label", 8).unwrap();
        let token = scanner.token().unwrap();
        assert_eq!(token.kind, TokenKind::PathOperator(HopOperator::Forward));
        assert_eq!(token.start, 8);
    }
}
