use thiserror::Error;

use crate::{
    ast::{
        Expr, Path, TokenKind,
        operators::{ADDITIVE, COMPARISON, MULTIPLICATIVE},
    },
    expression::Expression,
    lexer::{LexError, Scanner},
    registry::Registry,
    value::{Value, ValueType},
};

/// Syntax errors. Every variant carries the character offset where parsing
/// stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Missing factor at end of expression")]
    MissingFactor { position: usize },

    #[error("Unexpected text {text} at position {position}")]
    UnexpectedToken { text: String, position: usize },

    #[error("Missing ) at position {position}")]
    MissingParen { position: usize },

    #[error("Missing property ID at position {position}")]
    MissingPropertyId { position: usize },

    #[error("Missing ( to start {name} at position {position}")]
    MissingOpenParen { name: String, position: usize },

    #[error("Missing ) to end {name} at position {position}")]
    MissingCloseParen { name: String, position: usize },

    #[error("Expected {expected} but found {found} at position {position}")]
    Expected {
        expected: &'static str,
        found: String,
        position: usize,
    },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(err) => err.position(),
            ParseError::MissingFactor { position }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::MissingParen { position }
            | ParseError::MissingPropertyId { position }
            | ParseError::MissingOpenParen { position, .. }
            | ParseError::MissingCloseParen { position, .. }
            | ParseError::Expected { position, .. } => *position,
        }
    }
}

/// A parse result together with the offset where parsing stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub index: usize,
}

/// Recursive-descent expression parser.
///
/// Parsing stops at the first token that cannot continue the grammar, so an
/// expression may be followed by arbitrary text; [`Parser::index`] tells the
/// caller where that text starts.
pub struct Parser<'r> {
    scanner: Scanner,
    registry: &'r Registry,
}

impl<'r> Parser<'r> {
    pub fn new(scanner: Scanner, registry: &'r Registry) -> Self {
        Parser { scanner, registry }
    }

    /// Offset of the current token, or of the end of the scanned text.
    pub fn index(&self) -> usize {
        self.scanner
            .token()
            .map_or(self.scanner.index(), |token| token.start)
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.scanner.next()?;
        Ok(())
    }

    fn check_delimiter(&self, delimiter: char) -> bool {
        self.scanner
            .token()
            .is_some_and(|token| token.is_delimiter(delimiter))
    }

    fn check_operator(&self, symbols: &[&str]) -> Option<String> {
        match self.scanner.token() {
            Some(token) if token.is_operator(symbols) => Some(token.kind.to_string()),
            _ => None,
        }
    }

    /// Parse hops following a root name (or none, for a bare `.x` path)
    fn parse_path(&mut self, mut path: Path) -> Result<Path, ParseError> {
        while let Some(TokenKind::PathOperator(hop)) = self.scanner.token().map(|t| t.kind.clone()) {
            self.advance()?;
            match self.scanner.token().map(|t| t.kind.clone()) {
                Some(TokenKind::Identifier(property)) => {
                    path.append_segment(property, hop);
                    self.advance()?;
                }
                _ => {
                    return Err(ParseError::MissingPropertyId {
                        position: self.index(),
                    });
                }
            }
        }
        Ok(path)
    }

    /// Parse call arguments; the opening `(` has been consumed
    fn parse_call_args(&mut self, name: &str) -> Result<Vec<Expr>, ParseError> {
        if self.scanner.token().is_none() {
            return Err(ParseError::MissingCloseParen {
                name: name.to_string(),
                position: self.index(),
            });
        }
        let args = if self.check_delimiter(')') {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        if !self.check_delimiter(')') {
            return Err(ParseError::MissingCloseParen {
                name: name.to_string(),
                position: self.index(),
            });
        }
        self.advance()?;
        Ok(args)
    }

    fn parse_identifier(&mut self, name: String) -> Result<Expr, ParseError> {
        self.advance()?;
        if self.registry.is_control(&name) {
            if !self.check_delimiter('(') {
                return Err(ParseError::MissingOpenParen {
                    name,
                    position: self.index(),
                });
            }
            self.advance()?;
            let args = self.parse_call_args(&name)?;
            Ok(Expr::ControlCall { name, args })
        } else if self.check_delimiter('(') {
            self.advance()?;
            let args = self.parse_call_args(&name)?;
            Ok(Expr::FunctionCall { name, args })
        } else {
            Ok(Expr::Path(self.parse_path(Path::with_root(name))?))
        }
    }

    /// Parse factors: literals, paths, calls and parenthesized expressions
    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.scanner.token().cloned() else {
            return Err(ParseError::MissingFactor {
                position: self.index(),
            });
        };

        match token.kind {
            TokenKind::Number(n) => {
                self.advance()?;
                Ok(Expr::number(n))
            }
            TokenKind::String(s) => {
                self.advance()?;
                Ok(Expr::Constant {
                    value: Value::Text(s),
                    value_type: ValueType::Text,
                })
            }
            TokenKind::PathOperator(_) => Ok(Expr::Path(self.parse_path(Path::new())?)),
            TokenKind::Identifier(name) => self.parse_identifier(name),
            TokenKind::Delimiter('(') => {
                self.advance()?;
                let expr = self.parse_expression()?;
                if !self.check_delimiter(')') {
                    return Err(ParseError::MissingParen {
                        position: self.index(),
                    });
                }
                self.advance()?;
                Ok(expr)
            }
            other => Err(ParseError::UnexpectedToken {
                text: other.to_string(),
                position: token.start,
            }),
        }
    }

    /// Parse one left-associative precedence level
    fn parse_level(
        &mut self,
        symbols: &[&str],
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = operand(self)?;
        while let Some(symbol) = self.check_operator(symbols) {
            self.advance()?;
            let right = operand(self)?;
            left = Expr::operator(symbol, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        self.parse_level(MULTIPLICATIVE, Self::parse_factor)
    }

    fn parse_subexpression(&mut self) -> Result<Expr, ParseError> {
        self.parse_level(ADDITIVE, Self::parse_term)
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_level(COMPARISON, Self::parse_subexpression)
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut expressions = vec![self.parse_expression()?];
        while self.check_delimiter(',') {
            self.advance()?;
            expressions.push(self.parse_expression()?);
        }
        Ok(expressions)
    }

    /// Parse one expression starting at the current token.
    pub fn parse(&mut self) -> Result<Expression, ParseError> {
        let root = self.parse_expression()?;
        log::debug!("parsed expression {} (stopped at {})", root, self.index());
        Ok(Expression::new(root))
    }

    /// Parse a comma-separated list of expressions.
    pub fn parse_several(&mut self) -> Result<Vec<Expression>, ParseError> {
        let roots = self.parse_expression_list()?;
        log::debug!("parsed {} expressions (stopped at {})", roots.len(), self.index());
        Ok(roots.into_iter().map(Expression::new).collect())
    }
}

/// Parses `text` from `start`, returning the expression and the offset
/// where parsing stopped. Trailing text is left for the caller.
pub fn parse_expression_at(
    text: &str,
    start: usize,
    registry: &Registry,
) -> Result<Parsed<Expression>, ParseError> {
    let mut parser = Parser::new(Scanner::new(text, start)?, registry);
    let value = parser.parse()?;
    Ok(Parsed {
        value,
        index: parser.index(),
    })
}

/// Parses a comma-separated expression list from `start`.
pub fn parse_several_at(
    text: &str,
    start: usize,
    registry: &Registry,
) -> Result<Parsed<Vec<Expression>>, ParseError> {
    let mut parser = Parser::new(Scanner::new(text, start)?, registry);
    let value = parser.parse_several()?;
    Ok(Parsed {
        value,
        index: parser.index(),
    })
}

/// Parses the whole of `text` as one expression.
///
/// Unlike [`parse_expression_at`], leftover tokens are an error.
///
/// # Examples
///
/// ```
/// use exhibit_expression::{Registry, parse_expression};
///
/// let registry = Registry::standard();
/// let expression = parse_expression("count(.author) + 1", &registry).unwrap();
/// assert_eq!(expression.to_string(), "count(.author) + 1");
/// assert!(parse_expression("1 2", &registry).is_err());
/// ```
pub fn parse_expression(text: &str, registry: &Registry) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(Scanner::new(text, 0)?, registry);
    let expression = parser.parse()?;
    if let Some(token) = parser.scanner.token() {
        return Err(ParseError::UnexpectedToken {
            text: token.kind.to_string(),
            position: token.start,
        });
    }
    Ok(expression)
}
