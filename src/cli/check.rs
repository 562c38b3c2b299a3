//! Parse an expression and evaluate it against exhibit JSON data

use super::CliError;
use crate::{
    Collection, EvaluationResult, MemoryDatabase, Registry, Roots, ValueType, parse_expression,
};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// Exhibit JSON (`items`, `properties`, `types`)
    pub data: Option<String>,
    /// Evaluate on this item only; otherwise on every item
    pub item: Option<String>,
    /// Root the items are bound to, `value` when not given
    pub root: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax is valid; carries the expression printed back
    SyntaxValid(String),
    /// Expression evaluated successfully
    Success(EvaluationResult),
}

/// Execute an exhibit check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let registry = Registry::standard();
    let expression = parse_expression(&options.expression, &registry)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid(expression.to_string()));
    }

    let mut database = MemoryDatabase::new();
    if let Some(data) = &options.data {
        database.load_json(data)?;
    }

    let root = options.root.as_deref().unwrap_or(crate::VALUE_ROOT);
    let roots = match &options.item {
        Some(item) => Roots::new().with_value(root, item.as_str().into(), ValueType::Item),
        None => Roots::new().with(root, Collection::set(database.items().clone(), ValueType::Item)),
    };
    let result = expression.evaluate(&roots, root, &database, &registry)?;
    Ok(CheckResult::Success(result))
}
