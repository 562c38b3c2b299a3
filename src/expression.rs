use std::fmt;

use crate::{
    ast::{Expr, Path},
    collection::{Collection, ValueSet},
    database::Database,
    evaluator::{EvalContext, EvalResult, Roots, VALUE_ROOT},
    registry::Registry,
    value::{Value, ValueType},
};

/// A parsed expression ready to be evaluated any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Expr,
}

/// Values produced by [`Expression::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub values: ValueSet,
    pub value_type: ValueType,
    /// Size of the evaluated collection; larger than `values.size()` when a
    /// sequence held duplicates
    pub size: usize,
}

/// First value produced by an expression, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleResult {
    pub value: Option<Value>,
    pub value_type: ValueType,
}

impl Expression {
    pub fn new(root: Expr) -> Self {
        Expression { root }
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn is_path(&self) -> bool {
        matches!(self.root, Expr::Path(_))
    }

    pub fn path(&self) -> Option<&Path> {
        self.root.as_path()
    }

    fn evaluate_collection(
        &self,
        roots: &Roots<'_>,
        default_root_name: &str,
        database: &dyn Database,
        registry: &Registry,
    ) -> EvalResult<Collection> {
        let ctx = EvalContext::new(roots, default_root_name, database, registry);
        self.root.evaluate(&ctx)
    }

    pub fn evaluate(
        &self,
        roots: &Roots<'_>,
        default_root_name: &str,
        database: &dyn Database,
        registry: &Registry,
    ) -> EvalResult<EvaluationResult> {
        let collection = self.evaluate_collection(roots, default_root_name, database, registry)?;
        let size = collection.size();
        let value_type = collection.value_type().clone();
        Ok(EvaluationResult {
            values: collection.into_set(),
            value_type,
            size,
        })
    }

    /// Evaluates with `value` bound to the item `item_id`.
    pub fn evaluate_on_item(
        &self,
        item_id: &str,
        database: &dyn Database,
        registry: &Registry,
    ) -> EvalResult<EvaluationResult> {
        let roots = item_roots(item_id);
        self.evaluate(&roots, VALUE_ROOT, database, registry)
    }

    pub fn evaluate_single(
        &self,
        roots: &Roots<'_>,
        default_root_name: &str,
        database: &dyn Database,
        registry: &Registry,
    ) -> EvalResult<SingleResult> {
        let collection = self.evaluate_collection(roots, default_root_name, database, registry)?;
        Ok(SingleResult {
            value: collection.first().cloned(),
            value_type: collection.value_type().clone(),
        })
    }

    pub fn evaluate_single_on_item(
        &self,
        item_id: &str,
        database: &dyn Database,
        registry: &Registry,
    ) -> EvalResult<SingleResult> {
        let roots = item_roots(item_id);
        self.evaluate_single(&roots, VALUE_ROOT, database, registry)
    }

    /// Whether the expression yields at least one value.
    ///
    /// Paths stop at the first reachable value instead of building the
    /// whole result.
    pub fn test_exists(
        &self,
        roots: &Roots<'_>,
        default_root_name: &str,
        database: &dyn Database,
        registry: &Registry,
    ) -> EvalResult<bool> {
        match &self.root {
            Expr::Path(path) => {
                let ctx = EvalContext::new(roots, default_root_name, database, registry);
                path.test_exists(&ctx)
            }
            _ => Ok(self
                .evaluate_collection(roots, default_root_name, database, registry)?
                .size()
                > 0),
        }
    }
}

fn item_roots(item_id: &str) -> Roots<'static> {
    Roots::new().with_value(VALUE_ROOT, Value::from(item_id), ValueType::Item)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
