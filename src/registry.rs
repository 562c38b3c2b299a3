//! Operator, function and control registries.
//!
//! The parser consults the control table to recognise control calls; the
//! evaluator resolves operators, functions and controls by name when a node
//! is evaluated. Feature modules extend a [`Registry`] before first use.
//!
//! Registration policy: `register_*` refuses a name that is already taken
//! and returns [`RegistryError::Duplicate`]; `replace_*` overwrites on
//! purpose and hands back the previous entry.

use std::{collections::HashMap, fmt, sync::Arc};

use thiserror::Error;

use crate::{
    ast::Expr,
    collection::Collection,
    controls,
    evaluator::{EvalContext, EvalResult},
    functions,
    value::{Value, ValueType},
};

/// A built-in or extension function.
///
/// Functions receive their arguments already evaluated, left to right.
/// Any `Fn(&[Collection]) -> EvalResult<Collection>` is a function.
pub trait Function: Send + Sync {
    fn call(&self, args: &[Collection]) -> EvalResult<Collection>;
}

impl<F> Function for F
where
    F: Fn(&[Collection]) -> EvalResult<Collection> + Send + Sync,
{
    fn call(&self, args: &[Collection]) -> EvalResult<Collection> {
        self(args)
    }
}

/// A control construct.
///
/// Controls receive their argument expressions unevaluated together with the
/// evaluation context and decide which arguments to evaluate, how often and
/// under which bindings.
pub trait Control: Send + Sync {
    fn evaluate(&self, args: &[Expr], ctx: &EvalContext<'_>) -> EvalResult<Collection>;
}

/// Scalar implementation of a binary operator.
pub type OperatorFn = fn(&Value, &Value) -> Value;

/// Binary operator definition.
#[derive(Debug, Clone)]
pub struct OperatorDef {
    /// When `Some(ValueType::Number)`, operands are coerced to numbers first
    pub argument_type: Option<ValueType>,
    /// Value type of the produced collection
    pub value_type: ValueType,
    pub apply: OperatorFn,
}

impl OperatorDef {
    pub fn new(argument_type: Option<ValueType>, value_type: ValueType, apply: OperatorFn) -> Self {
        OperatorDef {
            argument_type,
            value_type,
            apply,
        }
    }

    pub fn coerces_numbers(&self) -> bool {
        self.argument_type == Some(ValueType::Number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: &'static str, name: String },
}

/// Name-keyed tables of operators, functions and controls.
#[derive(Clone, Default)]
pub struct Registry {
    operators: HashMap<String, OperatorDef>,
    functions: HashMap<String, Arc<dyn Function>>,
    controls: HashMap<String, Arc<dyn Control>>,
}

impl Registry {
    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in operators, functions and
    /// controls.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        register_operators(&mut registry);
        functions::register_builtins(&mut registry);
        controls::register_builtins(&mut registry);
        registry
    }

    pub fn register_operator(
        &mut self,
        symbol: impl Into<String>,
        def: OperatorDef,
    ) -> Result<(), RegistryError> {
        let symbol = symbol.into();
        if self.operators.contains_key(&symbol) {
            return Err(RegistryError::Duplicate {
                kind: "operator",
                name: symbol,
            });
        }
        self.operators.insert(symbol, def);
        Ok(())
    }

    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F) -> Result<(), RegistryError>
    where
        F: Function + 'static,
    {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                kind: "function",
                name,
            });
        }
        self.functions.insert(name, Arc::new(function));
        Ok(())
    }

    pub fn register_control<C>(&mut self, name: impl Into<String>, control: C) -> Result<(), RegistryError>
    where
        C: Control + 'static,
    {
        let name = name.into();
        if self.controls.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                kind: "control",
                name,
            });
        }
        self.controls.insert(name, Arc::new(control));
        Ok(())
    }

    pub fn replace_operator(&mut self, symbol: impl Into<String>, def: OperatorDef) -> Option<OperatorDef> {
        let symbol = symbol.into();
        let previous = self.operators.insert(symbol.clone(), def);
        if previous.is_some() {
            log::debug!("replaced operator '{}'", symbol);
        }
        previous
    }

    pub fn replace_function<F>(&mut self, name: impl Into<String>, function: F) -> Option<Arc<dyn Function>>
    where
        F: Function + 'static,
    {
        let name = name.into();
        let previous = self.functions.insert(name.clone(), Arc::new(function));
        if previous.is_some() {
            log::debug!("replaced function '{}'", name);
        }
        previous
    }

    pub fn replace_control<C>(&mut self, name: impl Into<String>, control: C) -> Option<Arc<dyn Control>>
    where
        C: Control + 'static,
    {
        let name = name.into();
        let previous = self.controls.insert(name.clone(), Arc::new(control));
        if previous.is_some() {
            log::debug!("replaced control '{}'", name);
        }
        previous
    }

    pub fn remove_operator(&mut self, symbol: &str) -> Option<OperatorDef> {
        self.operators.remove(symbol)
    }

    pub fn remove_function(&mut self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.remove(name)
    }

    pub fn remove_control(&mut self, name: &str) -> Option<Arc<dyn Control>> {
        self.controls.remove(name)
    }

    pub fn operator(&self, symbol: &str) -> Option<&OperatorDef> {
        self.operators.get(symbol)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn control(&self, name: &str) -> Option<&Arc<dyn Control>> {
        self.controls.get(name)
    }

    pub fn is_control(&self, name: &str) -> bool {
        self.controls.contains_key(name)
    }

    pub fn operator_symbols(&self) -> Vec<&str> {
        sorted_keys(self.operators.keys())
    }

    pub fn function_names(&self) -> Vec<&str> {
        sorted_keys(self.functions.keys())
    }

    pub fn control_names(&self) -> Vec<&str> {
        sorted_keys(self.controls.keys())
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = keys.map(String::as_str).collect();
    names.sort_unstable();
    names
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("operators", &self.operator_symbols())
            .field("functions", &self.function_names())
            .field("controls", &self.control_names())
            .finish()
    }
}

fn add(a: &Value, b: &Value) -> Value {
    Value::Number(a.to_number() + b.to_number())
}

fn subtract(a: &Value, b: &Value) -> Value {
    Value::Number(a.to_number() - b.to_number())
}

fn multiply(a: &Value, b: &Value) -> Value {
    Value::Number(a.to_number() * b.to_number())
}

fn divide(a: &Value, b: &Value) -> Value {
    Value::Number(a.to_number() / b.to_number())
}

fn equal(a: &Value, b: &Value) -> Value {
    Value::Boolean(a.strict_equals(b))
}

fn not_equal(a: &Value, b: &Value) -> Value {
    Value::Boolean(!a.strict_equals(b))
}

fn less_than(a: &Value, b: &Value) -> Value {
    Value::Boolean(a.to_number() < b.to_number())
}

fn less_equal(a: &Value, b: &Value) -> Value {
    Value::Boolean(a.to_number() <= b.to_number())
}

fn greater_than(a: &Value, b: &Value) -> Value {
    Value::Boolean(a.to_number() > b.to_number())
}

fn greater_equal(a: &Value, b: &Value) -> Value {
    Value::Boolean(a.to_number() >= b.to_number())
}

fn register_operators(registry: &mut Registry) {
    let numeric = Some(ValueType::Number);
    let table: [(&str, Option<ValueType>, ValueType, OperatorFn); 10] = [
        ("+", numeric.clone(), ValueType::Number, add),
        ("-", numeric.clone(), ValueType::Number, subtract),
        ("*", numeric.clone(), ValueType::Number, multiply),
        ("/", numeric.clone(), ValueType::Number, divide),
        ("=", None, ValueType::Boolean, equal),
        ("<>", None, ValueType::Boolean, not_equal),
        ("<", numeric.clone(), ValueType::Boolean, less_than),
        ("<=", numeric.clone(), ValueType::Boolean, less_equal),
        (">", numeric.clone(), ValueType::Boolean, greater_than),
        (">=", numeric, ValueType::Boolean, greater_equal),
    ];
    for (symbol, argument_type, value_type, apply) in table {
        registry.replace_operator(symbol, OperatorDef::new(argument_type, value_type, apply));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_empty(_args: &[Collection]) -> EvalResult<Collection> {
        Ok(Collection::empty(ValueType::Text))
    }

    #[test]
    fn test_standard_contents() {
        let registry = Registry::standard();
        assert_eq!(registry.control_names(), vec!["default", "filter", "foreach", "if"]);
        assert!(registry.function("count").is_some());
        assert!(registry.function("date-range").is_some());
        assert!(registry.operator("<>").is_some());
        assert!(registry.operator("><").is_none());
        assert!(!registry.is_control("count"));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = Registry::standard();
        let err = registry.register_function("count", always_empty).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                kind: "function",
                name: "count".into()
            }
        );
        assert!(registry.register_function("nothing", always_empty).is_ok());
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut registry = Registry::standard();
        assert!(registry.replace_function("count", always_empty).is_some());
        assert!(registry.replace_function("brand-new", always_empty).is_none());
        assert!(registry.remove_function("brand-new").is_some());
        assert!(registry.function("brand-new").is_none());
    }

    #[test]
    fn test_closure_functions() {
        let mut registry = Registry::empty();
        registry
            .register_function("one", |_args: &[Collection]| -> EvalResult<Collection> {
                Ok(Collection::single(Value::Number(1.0), ValueType::Number))
            })
            .unwrap();
        let result = registry.function("one").unwrap().call(&[]).unwrap();
        assert_eq!(result.size(), 1);
    }

    #[test]
    fn test_numeric_operators_coerce() {
        let registry = Registry::standard();
        let plus = registry.operator("+").unwrap();
        assert!(plus.coerces_numbers());
        assert_eq!((plus.apply)(&Value::from("2"), &Value::from(3.0)), Value::Number(5.0));
        let eq = registry.operator("=").unwrap();
        assert!(!eq.coerces_numbers());
        assert_eq!((eq.apply)(&Value::from("2"), &Value::from(2.0)), Value::Boolean(false));
    }
}
