//! Intermediate results of expression evaluation.
//!
//! Every AST node evaluates to a [`Collection`]: zero or more values plus a
//! [`ValueType`]. Some producers naturally build ordered sequences (operators,
//! `foreach`, array hops) while others build sets (path unions, `filter`);
//! the collection hides which one a caller got.
//!
//! ```
//! use std::ops::ControlFlow;
//! use exhibit_expression::{Collection, Value, ValueType};
//!
//! let numbers = Collection::sequence(
//!     vec![Value::from(1.0), Value::from(2.0), Value::from(1.0)],
//!     ValueType::Number,
//! );
//! assert_eq!(numbers.size(), 3);
//! assert_eq!(numbers.get_set().size(), 2);
//!
//! let mut seen = 0;
//! numbers.for_each_value(|_| {
//!     seen += 1;
//!     ControlFlow::Break(())
//! });
//! assert_eq!(seen, 1);
//! ```

use std::ops::ControlFlow;

use indexmap::IndexSet;

use crate::value::{Value, ValueType};

/// Insertion-ordered set of values.
///
/// This is the container exchanged with the item database and returned to
/// callers of [`crate::Expression::evaluate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet {
    values: IndexSet<Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, returning `false` if it was already present.
    pub fn add(&mut self, value: Value) -> bool {
        self.values.insert(value)
    }

    pub fn add_set(&mut self, other: &ValueSet) {
        for value in other.iter() {
            self.values.insert(value.clone());
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Visits every value until the visitor breaks.
    pub fn visit<F>(&self, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&Value) -> ControlFlow<()>,
    {
        for value in &self.values {
            visitor(value)?;
        }
        ControlFlow::Continue(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.values.iter().cloned().collect()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueSet {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValueSet {
    type Item = Value;
    type IntoIter = indexmap::set::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = indexmap::set::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Zero or more values of a declared type.
///
/// Collections are built fresh by each evaluation step and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// Ordered values, duplicates allowed
    Sequence {
        values: Vec<Value>,
        value_type: ValueType,
    },

    /// Distinct values
    Set {
        values: ValueSet,
        value_type: ValueType,
    },
}

impl Collection {
    pub fn sequence(values: Vec<Value>, value_type: ValueType) -> Self {
        Collection::Sequence { values, value_type }
    }

    pub fn set(values: ValueSet, value_type: ValueType) -> Self {
        Collection::Set { values, value_type }
    }

    /// One-element sequence.
    pub fn single(value: Value, value_type: ValueType) -> Self {
        Collection::Sequence {
            values: vec![value],
            value_type,
        }
    }

    pub fn empty(value_type: ValueType) -> Self {
        Collection::Sequence {
            values: Vec::new(),
            value_type,
        }
    }

    pub fn value_type(&self) -> &ValueType {
        match self {
            Collection::Sequence { value_type, .. } | Collection::Set { value_type, .. } => {
                value_type
            }
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Collection::Sequence { values, .. } => values.len(),
            Collection::Set { values, .. } => values.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Visits values in container order until the visitor breaks.
    pub fn for_each_value<F>(&self, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&Value) -> ControlFlow<()>,
    {
        match self {
            Collection::Sequence { values, .. } => {
                for value in values {
                    visitor(value)?;
                }
                ControlFlow::Continue(())
            }
            Collection::Set { values, .. } => values.visit(visitor),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Collection::Sequence { values, .. } => Box::new(values.iter()),
            Collection::Set { values, .. } => Box::new(values.iter()),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Collection::Sequence { values, .. } => values.contains(value),
            Collection::Set { values, .. } => values.contains(value),
        }
    }

    /// The values as a set; sequences lose duplicates but keep first-seen order.
    pub fn get_set(&self) -> ValueSet {
        match self {
            Collection::Sequence { values, .. } => values.iter().cloned().collect(),
            Collection::Set { values, .. } => values.clone(),
        }
    }

    pub fn into_set(self) -> ValueSet {
        match self {
            Collection::Sequence { values, .. } => values.into_iter().collect(),
            Collection::Set { values, .. } => values,
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_sequence_keeps_duplicates_and_order() {
        let collection = Collection::sequence(texts(&["b", "a", "b"]), ValueType::Text);
        assert_eq!(collection.size(), 3);
        let seen: Vec<String> = collection.iter().map(|v| v.to_string()).collect();
        assert_eq!(seen, vec!["b", "a", "b"]);
        assert_eq!(collection.get_set().to_vec(), texts(&["b", "a"]));
    }

    #[test]
    fn test_set_contains() {
        let set: ValueSet = texts(&["x", "y"]).into_iter().collect();
        let collection = Collection::set(set, ValueType::Item);
        assert!(collection.contains(&Value::from("y")));
        assert!(!collection.contains(&Value::from("z")));
        assert_eq!(collection.value_type(), &ValueType::Item);
    }

    #[test]
    fn test_early_exit_on_set() {
        let set: ValueSet = texts(&["1", "2", "3"]).into_iter().collect();
        let collection = Collection::set(set, ValueType::Text);
        let mut visited = Vec::new();
        let flow = collection.for_each_value(|v| {
            visited.push(v.clone());
            if v == &Value::from("2") {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(flow.is_break());
        assert_eq!(visited, texts(&["1", "2"]));
    }

    #[test]
    fn test_empty_collection() {
        let collection = Collection::empty(ValueType::Number);
        assert!(collection.is_empty());
        assert!(collection.first().is_none());
        assert!(collection.for_each_value(|_| ControlFlow::Break(())).is_continue());
    }
}
