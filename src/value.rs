use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
};

/// A scalar value flowing through expression evaluation.
///
/// The item database stores item identifiers, labels and URLs as text;
/// operators and functions produce numbers and booleans. Every collection
/// element is one of these three kinds.
///
/// # Equality
///
/// `Value` implements `Eq` and `Hash` so that values can live in sets:
/// numbers compare by value with `0.0 == -0.0` and every NaN equal to every
/// other NaN. The `=` operator of the expression language uses
/// [`Value::strict_equals`] instead, where NaN is never equal to anything.
///
/// # Examples
///
/// ```
/// use exhibit_expression::Value;
///
/// let label = Value::from("Alice");
/// let age = Value::from(30.0);
///
/// assert!(label.is_truthy());
/// assert_eq!(age.to_number(), 30.0);
/// assert_eq!(Value::from("12px").to_number(), 12.0);
/// assert!(Value::from("abc").to_number().is_nan());
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// Text, item identifiers and URLs
    Text(String),

    /// Floating point number
    Number(f64),

    /// Boolean produced by comparisons and predicates
    Boolean(bool),
}

impl Value {
    /// Truthiness used by `if`: non-empty text, non-zero numbers and `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
        }
    }

    /// Numeric view of the value with `parseFloat` semantics.
    ///
    /// Text is read up to the longest numeric prefix; anything without one
    /// becomes NaN, as do booleans.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_float(s),
            Value::Boolean(_) => f64::NAN,
        }
    }

    /// Text form of the value, borrowed when it already is text.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::Boolean(b) => Cow::Owned(b.to_string()),
        }
    }

    /// Equality without coercion, with IEEE semantics for numbers.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }
}

fn canonical_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => canonical_bits(*a) == canonical_bits(*b),
            _ => self.strict_equals(other),
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Text(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Value::Number(n) => {
                1u8.hash(state);
                canonical_bits(*n).hash(state);
            }
            Value::Boolean(b) => {
                2u8.hash(state);
                b.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Parses the longest numeric prefix of `s`, like JavaScript's `parseFloat`.
pub fn parse_float(s: &str) -> f64 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut i = 0;

    let negative = matches!(bytes.first(), Some(b'-'));
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    if t[i..].starts_with("Infinity") {
        return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let fraction = j - (i + 1);
        if digits > 0 || fraction > 0 {
            digits += fraction;
            i = j;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    t[..i].parse::<f64>().unwrap_or(f64::NAN)
}

/// Formats a number the way it is shown to users: integral values without a
/// fractional part, `NaN` and `Infinity` spelled out, exponent form below
/// `1e-6` and from `1e21` up.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
            _ => text,
        }
    } else {
        n.to_string()
    }
}

/// Value type tag carried by every collection.
///
/// Callers use it to decide how to render or coerce the values. Databases
/// may declare types beyond the built-in ones; those are kept as
/// [`ValueType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Text,
    Number,
    Boolean,
    Item,
    Url,
    Date,
    Other(String),
}

impl ValueType {
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Item => "item",
            ValueType::Url => "url",
            ValueType::Date => "date",
            ValueType::Other(name) => name,
        }
    }
}

impl From<&str> for ValueType {
    fn from(name: &str) -> Self {
        match name {
            "text" => ValueType::Text,
            "number" => ValueType::Number,
            "boolean" => ValueType::Boolean,
            "item" => ValueType::Item,
            "url" => ValueType::Url,
            "date" => ValueType::Date,
            other => ValueType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
