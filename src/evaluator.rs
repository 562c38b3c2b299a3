use std::{borrow::Cow, collections::HashMap};

use thiserror::Error;

use crate::{
    ast::{Expr, Path, Segment},
    collection::{Collection, ValueSet},
    database::Database,
    registry::Registry,
    value::{Value, ValueType},
};

/// Root bound to the current item or element.
pub const VALUE_ROOT: &str = "value";

/// Errors that can occur during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("No such function named {name}")]
    UnknownFunction { name: String },

    #[error("No such control named {name}")]
    UnknownControl { name: String },

    #[error("No such operator {symbol}")]
    UnknownOperator { symbol: String },

    #[error("No such variable called {name}")]
    UndefinedRoot { name: String },

    #[error("{name} expects at least {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Fails with [`EvalError::ArgumentCount`] when fewer than `expected`
/// arguments were given. Extra arguments are ignored.
pub fn expect_args<T>(name: &str, args: &[T], expected: usize) -> EvalResult<()> {
    if args.len() < expected {
        return Err(EvalError::ArgumentCount {
            name: name.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// Binding environment for root names.
///
/// A child environment shadows its parent for the names it binds and never
/// changes the parent, so a binding cannot outlive the evaluation that made
/// it.
#[derive(Debug, Default)]
pub struct Roots<'p> {
    parent: Option<&'p Roots<'p>>,
    bindings: HashMap<String, Collection>,
}

impl<'p> Roots<'p> {
    pub fn new() -> Self {
        Roots {
            parent: None,
            bindings: HashMap::new(),
        }
    }

    /// Binds `name` in this environment.
    pub fn bind(&mut self, name: impl Into<String>, collection: Collection) {
        self.bindings.insert(name.into(), collection);
    }

    /// Builder form of [`Roots::bind`].
    pub fn with(mut self, name: impl Into<String>, collection: Collection) -> Self {
        self.bind(name, collection);
        self
    }

    /// Builder binding a single value.
    pub fn with_value(self, name: impl Into<String>, value: Value, value_type: ValueType) -> Self {
        self.with(name, Collection::single(value, value_type))
    }

    /// A child environment with one extra binding.
    pub fn child(&self, name: impl Into<String>, collection: Collection) -> Roots<'_> {
        let mut bindings = HashMap::new();
        bindings.insert(name.into(), collection);
        Roots {
            parent: Some(self),
            bindings,
        }
    }

    /// Looks `name` up here, then in the enclosing environments.
    pub fn get(&self, name: &str) -> Option<&Collection> {
        let mut roots = Some(self);
        while let Some(current) = roots {
            if let Some(collection) = current.bindings.get(name) {
                return Some(collection);
            }
            roots = current.parent;
        }
        None
    }
}

/// Everything an AST node needs to evaluate.
pub struct EvalContext<'a> {
    pub roots: &'a Roots<'a>,
    /// Root used by paths that start with a hop
    pub default_root_name: &'a str,
    pub database: &'a dyn Database,
    pub registry: &'a Registry,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        roots: &'a Roots<'a>,
        default_root_name: &'a str,
        database: &'a dyn Database,
        registry: &'a Registry,
    ) -> Self {
        EvalContext {
            roots,
            default_root_name,
            database,
            registry,
        }
    }

    /// Same database and registry under different bindings.
    pub fn with_roots<'b>(&self, roots: &'b Roots<'b>) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            roots,
            default_root_name: self.default_root_name,
            database: self.database,
            registry: self.registry,
        }
    }

    pub fn evaluate(&self, expr: &Expr) -> EvalResult<Collection> {
        expr.evaluate(self)
    }
}

impl Expr {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> EvalResult<Collection> {
        match self {
            Expr::Constant { value, value_type } => Ok(Collection::single(value.clone(), value_type.clone())),
            Expr::Path(path) => path.evaluate(ctx),
            Expr::Operator { symbol, left, right } => evaluate_operator(symbol, left, right, ctx),
            Expr::FunctionCall { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(ctx))
                    .collect::<EvalResult<Vec<_>>>()?;
                let function = ctx
                    .registry
                    .function(name)
                    .ok_or_else(|| EvalError::UnknownFunction { name: name.clone() })?;
                function.call(&args)
            }
            Expr::ControlCall { name, args } => {
                let control = ctx
                    .registry
                    .control(name)
                    .ok_or_else(|| EvalError::UnknownControl { name: name.clone() })?;
                control.evaluate(args, ctx)
            }
        }
    }
}

/// Applies the operator to every (left, right) pair, left values outermost.
fn evaluate_operator(symbol: &str, left: &Expr, right: &Expr, ctx: &EvalContext<'_>) -> EvalResult<Collection> {
    let left = left.evaluate(ctx)?;
    let right = right.evaluate(ctx)?;
    let operator = ctx.registry.operator(symbol).ok_or_else(|| EvalError::UnknownOperator {
        symbol: symbol.to_string(),
    })?;

    let coerce = |value: &Value| {
        if operator.coerces_numbers() {
            Value::Number(value.to_number())
        } else {
            value.clone()
        }
    };
    let right_values: Vec<Value> = right.iter().map(coerce).collect();
    let mut values = Vec::with_capacity(left.size() * right_values.len());
    for a in left.iter() {
        let a = coerce(a);
        for b in &right_values {
            values.push((operator.apply)(&a, b));
        }
    }
    Ok(Collection::sequence(values, operator.value_type.clone()))
}

fn step<'d>(database: &'d dyn Database, value: &Value, segment: &Segment) -> Cow<'d, ValueSet> {
    if segment.hop.is_forward() {
        database.objects(&value.as_text(), &segment.property)
    } else {
        database.subjects(&value.as_text(), &segment.property)
    }
}

fn hop(input: &Collection, segment: &Segment, database: &dyn Database) -> Collection {
    let value_type = if segment.hop.is_forward() {
        database.property_value_type(&segment.property).unwrap_or_default()
    } else {
        ValueType::Item
    };

    if segment.hop.is_array() {
        let mut values = Vec::new();
        for value in input.iter() {
            values.extend(step(database, value, segment).iter().cloned());
        }
        Collection::sequence(values, value_type)
    } else {
        let mut values = ValueSet::new();
        for value in input.iter() {
            values.add_set(&step(database, value, segment));
        }
        Collection::set(values, value_type)
    }
}

fn exists_along(values: &mut dyn Iterator<Item = &Value>, segments: &[Segment], database: &dyn Database) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return values.next().is_some();
    };
    for value in values {
        let next = step(database, value, segment);
        if exists_along(&mut next.iter(), rest, database) {
            return true;
        }
    }
    false
}

impl Path {
    fn root<'c>(&self, ctx: &'c EvalContext<'_>) -> EvalResult<&'c Collection> {
        let name = self.root_name().unwrap_or(ctx.default_root_name);
        ctx.roots
            .get(name)
            .ok_or_else(|| EvalError::UndefinedRoot { name: name.to_string() })
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> EvalResult<Collection> {
        let root = self.root(ctx)?;
        let Some((first, rest)) = self.segments().split_first() else {
            return Ok(root.clone());
        };
        let start = hop(root, first, ctx.database);
        Ok(rest
            .iter()
            .fold(start, |current, segment| hop(&current, segment, ctx.database)))
    }

    /// Whether any value is reachable through every hop.
    ///
    /// Explores depth first and stops at the first value found.
    pub fn test_exists(&self, ctx: &EvalContext<'_>) -> EvalResult<bool> {
        let root = self.root(ctx)?;
        Ok(exists_along(&mut root.iter(), self.segments(), ctx.database))
    }

    /// Maps values at the end of the path back to the values at its start.
    ///
    /// Hops are undone last to first: a forward hop yields the subjects
    /// (typed `item`), a backward hop the objects (typed by the property).
    /// `filter`, when given, restricts the values of the final step.
    pub fn walk_backward(
        &self,
        values: &ValueSet,
        value_type: ValueType,
        filter: Option<&ValueSet>,
        database: &dyn Database,
    ) -> Collection {
        let mut current = values.clone();
        let mut value_type = value_type;
        for (i, segment) in self.segments().iter().enumerate().rev() {
            let restrict = if i == 0 { filter } else { None };
            if segment.hop.is_forward() {
                current = database.subjects_union(&current, &segment.property, restrict);
                value_type = ValueType::Item;
            } else {
                current = database.objects_union(&current, &segment.property, restrict);
                value_type = database.property_value_type(&segment.property).unwrap_or_default();
            }
        }
        Collection::set(current, value_type)
    }

    /// Single-value form of [`Path::walk_backward`].
    pub fn evaluate_backward(
        &self,
        value: Value,
        value_type: ValueType,
        filter: Option<&ValueSet>,
        database: &dyn Database,
    ) -> Collection {
        let values: ValueSet = std::iter::once(value).collect();
        self.walk_backward(&values, value_type, filter, database)
    }
}
