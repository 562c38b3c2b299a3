use std::fmt;

use crate::{
    ast::operators::precedence,
    value::{Value, ValueType, format_number},
};

/// How a path segment moves through the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HopOperator {
    /// `.` - subject to objects, collected into a set
    Forward,
    /// `!` - object to subjects, collected into a set
    Backward,
    /// `.@` - subject to objects, every visited value kept in order
    ForwardArray,
    /// `!@` - object to subjects, every visited value kept in order
    BackwardArray,
}

impl HopOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "." => Some(HopOperator::Forward),
            "!" => Some(HopOperator::Backward),
            ".@" => Some(HopOperator::ForwardArray),
            "!@" => Some(HopOperator::BackwardArray),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            HopOperator::Forward => ".",
            HopOperator::Backward => "!",
            HopOperator::ForwardArray => ".@",
            HopOperator::BackwardArray => "!@",
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, HopOperator::Forward | HopOperator::ForwardArray)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, HopOperator::ForwardArray | HopOperator::BackwardArray)
    }
}

/// One hop of a path: a property and the direction to follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub property: String,
    pub hop: HopOperator,
}

/// A chain of hops starting from a named root.
///
/// Without a root name the evaluator starts from the default root, usually
/// `value`. A path with a root name and no segments is a bare variable
/// reference.
///
/// # Examples
/// ```text
/// .author.label      // Path { root_name: None, segments: [.author, .label] }
/// !author            // items whose author is the current value
/// index              // the root `index` itself
/// index.year         // root `index`, then `.year`
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    root_name: Option<String>,
    segments: Vec<Segment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root_name: impl Into<String>) -> Self {
        Path {
            root_name: Some(root_name.into()),
            segments: Vec::new(),
        }
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    pub fn set_root_name(&mut self, root_name: impl Into<String>) {
        self.root_name = Some(root_name.into());
    }

    pub fn append_segment(&mut self, property: impl Into<String>, hop: HopOperator) {
        self.segments.push(Segment {
            property: property.into(),
            hop,
        });
    }

    /// Builder form of [`Path::append_segment`].
    pub fn hop(mut self, hop: HopOperator, property: impl Into<String>) -> Self {
        self.append_segment(property, hop);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

/// Abstract Syntax Tree node of an expression.
///
/// Nodes are immutable once the parser has built them; evaluation never
/// changes the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal number or string
    ///
    /// # Examples
    /// ```text
    /// 42
    /// "hello"
    /// ```
    Constant { value: Value, value_type: ValueType },

    /// Database path
    ///
    /// # Examples
    /// ```text
    /// .label
    /// !author.label
    /// value
    /// ```
    Path(Path),

    /// Binary operator applied to every pair of operand values
    ///
    /// # Example
    /// ```text
    /// .price * 1.1
    /// ```
    Operator {
        symbol: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Call into the function registry, arguments evaluated first
    ///
    /// # Example
    /// ```text
    /// count(.child)
    /// ```
    FunctionCall { name: String, args: Vec<Expr> },

    /// Call into the control registry with unevaluated arguments
    ///
    /// # Example
    /// ```text
    /// if(.done, "yes", "no")
    /// ```
    ControlCall { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Constant {
            value: Value::Number(n),
            value_type: ValueType::Number,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Expr::Constant {
            value: Value::Text(s.into()),
            value_type: ValueType::Text,
        }
    }

    pub fn operator(symbol: impl Into<String>, left: Expr, right: Expr) -> Self {
        Expr::Operator {
            symbol: symbol.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Expr::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(root) = &self.root_name {
            f.write_str(root)?;
        }
        for segment in &self.segments {
            write!(f, "{}{}", segment.hop.symbol(), segment.property)?;
        }
        Ok(())
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    f.write_str(")")
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr, min_precedence: u8) -> fmt::Result {
    match operand {
        Expr::Operator { symbol, .. } if precedence(symbol) < min_precedence => {
            write!(f, "({})", operand)
        }
        _ => write!(f, "{}", operand),
    }
}

/// Prints the expression back in source syntax.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant { value, .. } => match value {
                Value::Text(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
                Value::Number(n) => f.write_str(&format_number(*n)),
                Value::Boolean(b) => write!(f, "{}", b),
            },
            Expr::Path(path) => write!(f, "{}", path),
            Expr::Operator {
                symbol,
                left,
                right,
            } => {
                let level = precedence(symbol);
                write_operand(f, left, level)?;
                write!(f, " {} ", symbol)?;
                // left associative: an equal-precedence right operand needs parens
                write_operand(f, right, level + 1)
            }
            Expr::FunctionCall { name, args } | Expr::ControlCall { name, args } => {
                write_args(f, name, args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path() {
        let path = Path::new()
            .hop(HopOperator::Forward, "author")
            .hop(HopOperator::BackwardArray, "cites");
        assert_eq!(path.to_string(), ".author!@cites");

        let rooted = Path::with_root("index").hop(HopOperator::Forward, "year");
        assert_eq!(rooted.to_string(), "index.year");
    }

    #[test]
    fn test_display_keeps_grouping() {
        let sum = Expr::operator("+", Expr::number(1.0), Expr::number(2.0));
        let product = Expr::operator("*", sum, Expr::number(3.0));
        assert_eq!(product.to_string(), "(1 + 2) * 3");

        let difference = Expr::operator(
            "-",
            Expr::number(1.0),
            Expr::operator("-", Expr::number(2.0), Expr::number(3.0)),
        );
        assert_eq!(difference.to_string(), "1 - (2 - 3)");
    }

    #[test]
    fn test_display_calls() {
        let call = Expr::ControlCall {
            name: "if".into(),
            args: vec![
                Expr::Path(Path::new().hop(HopOperator::Forward, "done")),
                Expr::text("yes"),
                Expr::text("say \"no\""),
            ],
        };
        assert_eq!(call.to_string(), r#"if(.done, "yes", "say \"no\"")"#);
    }

    #[test]
    fn test_hop_operator_flags() {
        assert!(HopOperator::ForwardArray.is_forward());
        assert!(HopOperator::ForwardArray.is_array());
        assert!(!HopOperator::Backward.is_forward());
        assert_eq!(HopOperator::from_symbol("!@"), Some(HopOperator::BackwardArray));
        assert_eq!(HopOperator::from_symbol("@"), None);
    }
}
