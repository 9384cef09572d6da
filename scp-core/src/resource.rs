//! Resource - Attribute values and the per-operation attribute store

use std::collections::HashMap;

use crate::provider::{ProviderError, ProviderResult};
use crate::schema::ResourceSchema;

/// Flat attribute map as stored by the engine
pub type Attributes = HashMap<String, Value>;

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Textual form of a primitive value, `None` for lists and maps
    pub fn to_primitive_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::List(_) | Value::Map(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<HashMap<String, String>> for Value {
    fn from(map: HashMap<String, String>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
    }
}

/// The engine's attribute store for one resource operation
///
/// `prior` holds the state persisted from the previous run, `current` the
/// planned configuration merged with everything the handler has written.
/// Reads always see `current`; change detection compares both layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    prior: Attributes,
    current: Attributes,
}

impl ResourceData {
    /// Attribute store for a create: no prior state
    pub fn new(config: Attributes) -> Self {
        Self {
            id: String::new(),
            prior: Attributes::new(),
            current: config,
        }
    }

    /// Attribute store for read and delete: prior and current are the same
    pub fn from_state(id: impl Into<String>, state: Attributes) -> Self {
        Self {
            id: id.into(),
            prior: state.clone(),
            current: state,
        }
    }

    /// Attribute store for an update from `prior` to `planned`
    pub fn for_update(id: impl Into<String>, prior: Attributes, planned: Attributes) -> Self {
        Self {
            id: id.into(),
            prior,
            current: planned,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the primary identifier; an empty string marks the resource as gone
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn is_new_resource(&self) -> bool {
        self.prior.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.current.insert(key.into(), value.into());
    }

    /// Merge a marshalled attribute map into the store
    pub fn set_attributes(&mut self, attributes: Attributes) {
        self.current.extend(attributes);
    }

    /// Fill schema defaults for attributes the configuration left out
    pub fn apply_defaults(&mut self, schema: &ResourceSchema) {
        schema.apply_defaults(&mut self.current);
    }

    pub fn remove(&mut self, key: &str) {
        self.current.remove(key);
    }

    pub fn state(&self) -> &Attributes {
        &self.current
    }

    pub fn into_state(self) -> (String, Attributes) {
        (self.id, self.current)
    }

    pub fn has_change(&self, key: &str) -> bool {
        self.prior.get(key) != self.current.get(key)
    }

    pub fn has_changes(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has_change(k))
    }

    pub fn get_change(&self, key: &str) -> (Option<&Value>, Option<&Value>) {
        (self.prior.get(key), self.current.get(key))
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get_str(key).unwrap_or_default().to_string()
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        self.get(key).and_then(Value::as_list).unwrap_or(&[])
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_list(key)
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    }

    pub fn get_string_map(&self, key: &str) -> HashMap<String, String> {
        string_map(self.get(key))
    }

    /// Old and new string maps for `key`
    pub fn get_string_map_change(
        &self,
        key: &str,
    ) -> (HashMap<String, String>, HashMap<String, String>) {
        (string_map(self.prior.get(key)), string_map(self.current.get(key)))
    }

    /// Required string attribute, reported against its path when missing
    pub fn require_str(&self, key: &str) -> ProviderResult<&str> {
        self.get_str(key)
            .ok_or_else(|| ProviderError::validation(key, "attribute is required"))
    }

    pub fn require_int(&self, key: &str) -> ProviderResult<i64> {
        self.get_int(key)
            .ok_or_else(|| ProviderError::validation(key, "attribute is required"))
    }

    /// First element of a single nested block
    pub fn get_block(&self, key: &str) -> Option<&HashMap<String, Value>> {
        self.get_list(key).first().and_then(Value::as_map)
    }
}

fn string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
