//! Item database interface and an in-memory implementation.
//!
//! Paths hop through a triple store: `objects(subject, property)` follows a
//! property forward, `subjects(object, property)` follows it backward. Both
//! sides are keyed by the text form of a value, so the number `30` and the
//! text `"30"` reach the same triples.

use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    collection::ValueSet,
    value::{Value, ValueType, parse_float},
};

/// Read access to an item database.
pub trait Database {
    /// Values of `property` on `subject`.
    fn objects(&self, subject: &str, property: &str) -> Cow<'_, ValueSet>;

    /// Items whose `property` has the value `object`.
    fn subjects(&self, object: &str, property: &str) -> Cow<'_, ValueSet>;

    /// Declared value type of a property, if the database knows it.
    fn property_value_type(&self, property: &str) -> Option<ValueType>;

    /// Union of `objects` over every subject, restricted to `filter`.
    fn objects_union(&self, subjects: &ValueSet, property: &str, filter: Option<&ValueSet>) -> ValueSet {
        let mut result = ValueSet::new();
        for subject in subjects {
            add_filtered(&mut result, &self.objects(&subject.as_text(), property), filter);
        }
        result
    }

    /// Union of `subjects` over every object, restricted to `filter`.
    fn subjects_union(&self, objects: &ValueSet, property: &str, filter: Option<&ValueSet>) -> ValueSet {
        let mut result = ValueSet::new();
        for object in objects {
            add_filtered(&mut result, &self.subjects(&object.as_text(), property), filter);
        }
        result
    }
}

fn add_filtered(result: &mut ValueSet, values: &ValueSet, filter: Option<&ValueSet>) {
    match filter {
        None => result.add_set(values),
        Some(filter) => {
            for value in values {
                if filter.contains(value) {
                    result.add(value.clone());
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid item at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },
}

#[derive(Deserialize)]
struct ExhibitData {
    #[serde(default)]
    types: HashMap<String, serde_json::Value>,
    #[serde(default)]
    properties: HashMap<String, PropertyEntry>,
    #[serde(default)]
    items: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyEntry {
    #[serde(default)]
    value_type: Option<String>,
}

type Index = HashMap<String, HashMap<String, ValueSet>>;

/// Triple store held in two hash indexes.
///
/// `label` and `type` are text properties and `uri` is a url property from
/// the start; other properties are text unless declared.
///
/// # Examples
///
/// ```
/// use exhibit_expression::{Database, MemoryDatabase, Value};
///
/// let mut db = MemoryDatabase::new();
/// db.load_json(r#"{"items": [{"label": "Alice", "knows": ["Bob", "Carol"]}]}"#).unwrap();
/// assert_eq!(db.objects("Alice", "knows").size(), 2);
/// assert!(db.subjects("Bob", "knows").contains(&Value::from("Alice")));
/// ```
#[derive(Debug)]
pub struct MemoryDatabase {
    items: ValueSet,
    types: HashSet<String>,
    properties: HashMap<String, ValueType>,
    forward: Index,
    backward: Index,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        let mut db = MemoryDatabase {
            items: ValueSet::new(),
            types: HashSet::new(),
            properties: HashMap::new(),
            forward: HashMap::new(),
            backward: HashMap::new(),
        };
        db.define_property("label", ValueType::Text);
        db.define_property("type", ValueType::Text);
        db.define_property("uri", ValueType::Url);
        db
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_property(&mut self, name: impl Into<String>, value_type: ValueType) {
        self.properties.insert(name.into(), value_type);
    }

    pub fn add_item(&mut self, id: impl Into<String>) {
        self.items.add(Value::Text(id.into()));
    }

    pub fn add_triple(&mut self, subject: &str, property: &str, object: Value) {
        let object_key = object.as_text().into_owned();
        index_insert(&mut self.forward, subject, property, object);
        index_insert(&mut self.backward, &object_key, property, Value::Text(subject.to_string()));
    }

    /// Every item id, in load order.
    pub fn items(&self) -> &ValueSet {
        &self.items
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    pub fn load_json(&mut self, text: &str) -> Result<(), DatabaseError> {
        let data: ExhibitData = serde_json::from_str(text)?;
        self.load_data(data)
    }

    pub fn load_json_value(&mut self, value: serde_json::Value) -> Result<(), DatabaseError> {
        let data: ExhibitData = serde_json::from_value(value)?;
        self.load_data(data)
    }

    fn load_data(&mut self, data: ExhibitData) -> Result<(), DatabaseError> {
        self.types.extend(data.types.into_keys());
        for (name, entry) in data.properties {
            let value_type = entry
                .value_type
                .as_deref()
                .map(ValueType::from)
                .unwrap_or_default();
            self.define_property(name, value_type);
        }

        let count = data.items.len();
        for (index, item) in data.items.into_iter().enumerate() {
            self.load_item(index, item)?;
        }
        log::debug!(
            "loaded {} items ({} known properties, {} types)",
            count,
            self.properties.len(),
            self.types.len()
        );
        Ok(())
    }

    fn load_item(&mut self, index: usize, item: serde_json::Map<String, serde_json::Value>) -> Result<(), DatabaseError> {
        let id = match item.get("id").or_else(|| item.get("label")) {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(DatabaseError::InvalidItem {
                    index,
                    reason: "item has neither an id nor a label".into(),
                });
            }
        };
        self.add_item(id.clone());

        if !item.contains_key("type") {
            self.types.insert("Item".into());
            self.add_triple(&id, "type", Value::from("Item"));
        }

        for (property, json) in item {
            if property == "id" {
                continue;
            }
            let values = match json {
                serde_json::Value::Array(values) => values,
                other => vec![other],
            };
            for json in values {
                match self.convert(&property, json) {
                    Some(value) => {
                        if property == "type" {
                            self.types.insert(value.as_text().into_owned());
                        }
                        self.add_triple(&id, &property, value);
                    }
                    None => log::warn!("item {}: skipping non-scalar value of '{}'", id, property),
                }
            }
        }
        Ok(())
    }

    /// Converts a scalar JSON value according to the declared property type.
    fn convert(&self, property: &str, json: serde_json::Value) -> Option<Value> {
        let declared = self.properties.get(property);
        match json {
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::Bool(b) => Some(Value::Boolean(b)),
            serde_json::Value::String(s) => Some(match declared {
                Some(ValueType::Number) => {
                    let n = parse_float(&s);
                    if n.is_nan() { Value::Text(s) } else { Value::Number(n) }
                }
                Some(ValueType::Boolean) if s == "true" || s == "false" => Value::Boolean(s == "true"),
                _ => Value::Text(s),
            }),
            _ => None,
        }
    }
}

fn index_insert(index: &mut Index, key: &str, property: &str, value: Value) {
    index
        .entry(key.to_string())
        .or_default()
        .entry(property.to_string())
        .or_default()
        .add(value);
}

fn lookup<'a>(index: &'a Index, key: &str, property: &str) -> Cow<'a, ValueSet> {
    match index.get(key).and_then(|properties| properties.get(property)) {
        Some(values) => Cow::Borrowed(values),
        None => Cow::Owned(ValueSet::new()),
    }
}

impl Database for MemoryDatabase {
    fn objects(&self, subject: &str, property: &str) -> Cow<'_, ValueSet> {
        lookup(&self.forward, subject, property)
    }

    fn subjects(&self, object: &str, property: &str) -> Cow<'_, ValueSet> {
        lookup(&self.backward, object, property)
    }

    fn property_value_type(&self, property: &str) -> Option<ValueType> {
        self.properties.get(property).cloned()
    }
}
