/// Multiplicative operators, the tightest binding level.
pub const MULTIPLICATIVE: &[&str] = &["*", "/"];

/// Additive operators.
pub const ADDITIVE: &[&str] = &["+", "-"];

/// Comparison operators, the loosest binding level.
///
/// `><` is scanned as an operator token but is not a binary operator.
pub const COMPARISON: &[&str] = &["=", "<>", "<", "<=", ">", ">="];

/// Binding strength of an operator symbol; higher binds tighter.
pub fn precedence(symbol: &str) -> u8 {
    if MULTIPLICATIVE.contains(&symbol) {
        3
    } else if ADDITIVE.contains(&symbol) {
        2
    } else {
        1
    }
}
