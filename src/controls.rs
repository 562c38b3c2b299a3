//! Built-in controls: `if`, `foreach`, `default` and `filter`.

use std::ops::ControlFlow;

use crate::{
    ast::Expr,
    collection::{Collection, ValueSet},
    evaluator::{EvalContext, EvalResult, VALUE_ROOT, expect_args},
    registry::{Control, Registry},
    value::{Value, ValueType},
};

/// `if(condition, then, else)`
pub struct IfControl;

/// `foreach(collection, body)`
pub struct ForEachControl;

/// `default(a, b, ...)`
pub struct DefaultControl;

/// `filter(collection, predicate)`
pub struct FilterControl;

impl Control for IfControl {
    fn evaluate(&self, args: &[Expr], ctx: &EvalContext<'_>) -> EvalResult<Collection> {
        expect_args("if", args, 3)?;
        let condition = args[0].evaluate(ctx)?;
        let truthy = condition
            .for_each_value(|v| {
                if v.is_truthy() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .is_break();
        log::trace!("if: condition {} is {}", args[0], truthy);
        if truthy { args[1].evaluate(ctx) } else { args[2].evaluate(ctx) }
    }
}

impl Control for ForEachControl {
    fn evaluate(&self, args: &[Expr], ctx: &EvalContext<'_>) -> EvalResult<Collection> {
        expect_args("foreach", args, 2)?;
        let collection = args[0].evaluate(ctx)?;
        let element_type = collection.value_type().clone();

        let mut results = Vec::new();
        let mut value_type = ValueType::Text;
        for element in collection.iter() {
            let roots = ctx
                .roots
                .child(VALUE_ROOT, Collection::single(element.clone(), element_type.clone()));
            let body = args[1].evaluate(&ctx.with_roots(&roots))?;
            value_type = body.value_type().clone();
            results.extend(body.iter().cloned());
        }
        log::trace!("foreach: {} elements -> {} values", collection.size(), results.len());
        Ok(Collection::sequence(results, value_type))
    }
}

impl Control for DefaultControl {
    fn evaluate(&self, args: &[Expr], ctx: &EvalContext<'_>) -> EvalResult<Collection> {
        for arg in args {
            let collection = arg.evaluate(ctx)?;
            if collection.size() > 0 && !collection.iter().all(Value::is_empty_text) {
                log::trace!("default: chose {}", arg);
                return Ok(collection);
            }
        }
        Ok(Collection::empty(ValueType::Text))
    }
}

impl Control for FilterControl {
    fn evaluate(&self, args: &[Expr], ctx: &EvalContext<'_>) -> EvalResult<Collection> {
        expect_args("filter", args, 2)?;
        let collection = args[0].evaluate(ctx)?;
        let value_type = collection.value_type().clone();
        let marker = Value::Text("true".into());

        let mut kept = ValueSet::new();
        for element in collection.iter() {
            let roots = ctx
                .roots
                .child(VALUE_ROOT, Collection::single(element.clone(), value_type.clone()));
            let predicate = args[1].evaluate(&ctx.with_roots(&roots))?;
            if predicate.size() > 0 && predicate.contains(&marker) {
                kept.add(element.clone());
            }
        }
        log::trace!("filter: kept {} of {}", kept.size(), collection.size());
        Ok(Collection::set(kept, value_type))
    }
}

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.replace_control("if", IfControl);
    registry.replace_control("foreach", ForEachControl);
    registry.replace_control("default", DefaultControl);
    registry.replace_control("filter", FilterControl);
}
