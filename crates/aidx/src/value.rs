//! Canonical value model produced by the converter

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::ops::Index;

use crate::error::{Error, ErrorKind};

/// A converted XML value
///
/// Equality is structural: mappings compare by key set and per-key value, ignoring
/// insertion order; lists compare positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Leaf scalar
    Text(String),
    /// Attributes, children and mixed-content text of one element, in insertion order
    Mapping(Mapping),
    /// Repeated sibling elements sharing one tag name, in document order
    List(List),
}

impl Default for Value {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Value {
    /// Returns true if this value is text
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if this value is a mapping
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns true if this value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the text if this is text, None otherwise
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping if this is a mapping, None otherwise
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the list if this is a list, None otherwise
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Look up `key` if this is a mapping
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Self::List(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(List(values))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Mapping(m) => m.serialize(serializer),
            Self::List(l) => l.serialize(serializer),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    /// Only strings, arrays and objects exist in the canonical model
    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<List, _>>()
                .map(Self::List),
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Self::try_from(v).map(|v| (k, v)))
                .collect::<Result<Mapping, _>>()
                .map(Self::Mapping),
            other => Err(Error::bare(
                ErrorKind::Serialization,
                format!("json value outside the canonical model: {other}"),
            )),
        }
    }
}

/// An order-preserving mapping of string keys to values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping(pub(crate) IndexMap<String, Value>);

impl Mapping {
    /// Creates a new empty mapping
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Creates a new mapping with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the mapping has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the value corresponding to the key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a key-value pair, keeping the key's original position if it existed
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns true if the mapping contains the specified key
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns an iterator over the keys in insertion order
    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values in insertion order
    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over key-value pairs in insertion order
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl Index<&str> for Mapping {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A list of values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct List(pub(crate) Vec<Value>);

impl List {
    /// Creates a new empty list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the list has no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the element at the given index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Appends an element to the end of the list
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Returns an iterator over the list
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl Index<usize> for List {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for List {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Value>> for List {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(Vec::from_iter(iter))
    }
}

impl Serialize for List {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in &self.0 {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_and_as_methods() {
        let text = Value::from("JQ");
        assert!(text.is_text());
        assert!(!text.is_mapping());
        assert!(!text.is_list());
        assert_eq!(text.as_text(), Some("JQ"));
        assert_eq!(text.as_mapping(), None);

        assert!(Value::Mapping(Mapping::new()).is_mapping());
        assert!(Value::List(List::new()).is_list());
        assert_eq!(Value::default(), Value::Text(String::new()));
    }

    #[test]
    fn test_mapping_order_preservation() {
        let mut m = Mapping::new();
        m.insert("@CodeContext", "IATA");
        m.insert("Num", "255");
        m.insert("#text", "JQ");

        let keys: Vec<_> = m.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@CodeContext", "Num", "#text"]);

        m.remove("Num");
        let keys: Vec<_> = m.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@CodeContext", "#text"]);
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a: Mapping = [("x".to_string(), Value::from("1")), ("y".to_string(), Value::from("2"))]
            .into_iter()
            .collect();
        let b: Mapping = [("y".to_string(), Value::from("2")), ("x".to_string(), Value::from("1"))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_list_equality_is_positional() {
        let a = Value::from(vec![Value::from("1"), Value::from("2")]);
        let b = Value::from(vec![Value::from("2"), Value::from("1")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialize_keeps_insertion_order() -> Result<(), serde_json::Error> {
        let mut m = Mapping::new();
        m.insert("b", "2");
        m.insert("a", Value::from(vec![Value::from("x"), Value::from("")]));
        let json = serde_json::to_string(&Value::Mapping(m))?;
        assert_eq!(json, r#"{"b":"2","a":["x",""]}"#);
        Ok(())
    }

    #[test]
    fn test_try_from_json() {
        let json = serde_json::json!({"Legs": {"Leg": ["1", "2"]}});
        let value = Value::try_from(json);
        let leg = value
            .as_ref()
            .ok()
            .and_then(|v| v.get("Legs"))
            .and_then(|v| v.get("Leg"))
            .and_then(Value::as_list)
            .map(List::len);
        assert_eq!(leg, Some(2));

        let err = Value::try_from(serde_json::json!({"n": 1})).err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::Serialization));
    }
}
