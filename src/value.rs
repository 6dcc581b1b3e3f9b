//! Runtime values that templates are rendered with.
//!
//! Plain data (anything [`serde::Serialize`]) becomes one of the data variants
//! of [`Value`]. Host types that need accessor semantics beyond plain data,
//! such as restricted properties, getter methods or lazily iterated contents,
//! implement [`Object`] and are stored as [`Value::Object`].
use indexmap::IndexMap;
use serde_json::Number;
use std::{fmt::Debug, sync::Arc};

/// Ordered key-indexed mapping.
pub type Map = IndexMap<String, Value>;

/// A value produced by evaluating a template node.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Plain key-indexed mapping.
    Map(Map),
    /// Host object, resolved through the [`Object`] capabilities.
    Object(Arc<dyn Object>),
}

/// Visibility of a named property on an [`Object`].
#[derive(Debug, Clone)]
pub enum Property {
    /// The property exists and may be read.
    Public(Value),
    /// The property exists but may only be read through an accessor method.
    Restricted,
    /// No property with that name exists.
    Missing,
}

/// Capabilities a host object may expose to object accessors.
///
/// Every capability is optional. Accessors try them in a fixed order,
/// see [`crate::render::accessor`].
pub trait Object: Debug + Send + Sync {
    /// Array-style indexed access. Return `None` when the key is not present.
    fn offset_get(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Look up a property by its exact name.
    fn property(&self, _name: &str) -> Property {
        Property::Missing
    }

    /// Invoke the public zero-argument method with the exact given name.
    ///
    /// Return `None` when no such public method exists.
    fn method(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Iterate the object, if it is iterable.
    fn iterate(&self) -> Option<Vec<Value>> {
        None
    }

    /// String conversion used when the object is written to output.
    fn to_text(&self) -> Option<String> {
        None
    }
}

impl Value {
    /// Return true if the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Return true if the given [`Value`] is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(bool) => *bool,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            Value::String(string) => !string.is_empty() && string != "0",
            Value::Array(array) => !array.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(object) => object.iterate().map_or(true, |items| !items.is_empty()),
        }
    }

    /// Return true if the value holds no content: null, empty strings
    /// and empty collections.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(string) => string.is_empty(),
            Value::Array(array) => array.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Return the string slice if the value is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string),
            _ => None,
        }
    }

    /// Return the value as an unsigned integer, if it is one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(number) => number.as_u64(),
            Value::String(string) => string.trim().parse().ok(),
            _ => None,
        }
    }

    /// Return true for mappings, sequences and iterable objects.
    pub fn is_iterable(&self) -> bool {
        match self {
            Value::Array(_) | Value::Map(_) => true,
            Value::Object(object) => object.iterate().is_some(),
            _ => false,
        }
    }

    /// Materialize the value into an ordered sequence.
    ///
    /// Mappings yield their values in insertion order and iterable objects are
    /// drained. Returns `None` for anything else.
    pub fn to_sequence(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(array) => Some(array.clone()),
            Value::Map(map) => Some(map.values().cloned().collect()),
            Value::Object(object) => object.iterate(),
            _ => None,
        }
    }

    /// Materialize the value into ordered key/value pairs.
    ///
    /// Sequences are keyed by their position.
    pub fn to_pairs(&self) -> Option<Vec<(Value, Value)>> {
        match self {
            Value::Map(map) => Some(
                map.iter()
                    .map(|(key, value)| (Value::String(key.clone()), value.clone()))
                    .collect(),
            ),
            _ => self.to_sequence().map(|items| {
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| (Value::from(index), value))
                    .collect()
            }),
        }
    }

    /// Wrap a host object.
    pub fn object<T>(object: T) -> Self
    where
        T: Object + 'static,
    {
        Value::Object(Arc::new(object))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Map(left), Value::Map(right)) => left == right,
            (Value::Object(left), Value::Object(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(bool) => Value::Bool(bool),
            serde_json::Value::Number(number) => Value::Number(number),
            serde_json::Value::String(string) => Value::String(string),
            serde_json::Value::Array(array) => {
                Value::Array(array.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number((value as u64).into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Object, Value};
    use serde_json::json;

    #[derive(Debug)]
    struct Numbers;

    impl Object for Numbers {
        fn iterate(&self) -> Option<Vec<Value>> {
            Some(vec![Value::from(1_i64), Value::from(2_i64)])
        }
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"b": [1, true], "a": null}));
        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        let keys: Vec<_> = map.keys().cloned().collect();

        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(
            map["b"],
            Value::Array(vec![Value::from(1_i64), Value::Bool(true)])
        );
        assert!(map["a"].is_null());
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::from(0_i64).is_truthy());
        assert!(Value::from("taylor").is_truthy());
        assert!(Value::from(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn test_to_sequence() {
        let map = Value::from(json!({"one": "a", "two": "b"}));

        assert_eq!(
            map.to_sequence(),
            Some(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(Value::object(Numbers).to_sequence().map(|s| s.len()), Some(2));
        assert_eq!(Value::from("text").to_sequence(), None);
    }

    #[test]
    fn test_object_equality_is_identity() {
        let object = Value::object(Numbers);

        assert_eq!(object, object.clone());
        assert_ne!(object, Value::object(Numbers));
    }
}
