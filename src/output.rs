//! JSON rendering of evaluation results.
//!
//! A result becomes an object with the value type, the collection size and
//! the distinct values. Keys come out sorted:
//!
//! ```
//! use exhibit_expression::{EvaluationResult, Value, ValueType};
//! use exhibit_expression::output::to_json;
//!
//! let result = EvaluationResult {
//!     values: [Value::from(11.0)].into_iter().collect(),
//!     value_type: ValueType::Number,
//!     size: 1,
//! };
//! assert_eq!(to_json(&result), r#"{"size":1,"valueType":"number","values":[11]}"#);
//! ```

use serde_json::{Map, Number};

use crate::{expression::EvaluationResult, value::Value};

/// Converts a value to JSON. Numbers JSON cannot hold (NaN, infinities)
/// become `null`.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            serde_json::Value::Number(Number::from(*n as i64))
        }
        Value::Number(n) => Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number),
    }
}

pub fn result_to_json(result: &EvaluationResult) -> serde_json::Value {
    let mut object = Map::new();
    object.insert("valueType".into(), result.value_type.as_str().into());
    object.insert("size".into(), result.size.into());
    object.insert(
        "values".into(),
        serde_json::Value::Array(result.values.iter().map(value_to_json).collect()),
    );
    serde_json::Value::Object(object)
}

pub fn to_json(result: &EvaluationResult) -> String {
    result_to_json(result).to_string()
}

pub fn to_json_pretty(result: &EvaluationResult) -> String {
    let json = result_to_json(result);
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
}
