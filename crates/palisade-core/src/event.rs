//! The inbound invocation payload.

use crate::path::{self, TokenPath};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error returned when converting a non-object JSON value into an [`Event`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("event must be a JSON object, found {found}")]
pub struct EventError {
    /// JSON type that was found instead.
    pub found: &'static str,
}

/// An invocation payload: a mapping from string keys to nested values.
///
/// Plugins mutate the event in place; it is never replaced wholesale while a
/// pipeline run is in progress.
///
/// # Example
///
/// ```
/// use palisade_core::{Event, TokenPath};
/// use serde_json::json;
///
/// let mut event = Event::try_from(json!({ "headers": { "jwt": "abc" } })).unwrap();
/// let path = TokenPath::parse("headers.jwt").unwrap();
///
/// assert_eq!(event.read(&path), Some(&json!("abc")));
///
/// event.insert("jwt", json!({ "sub": "user-1" }));
/// assert!(event.contains_key("jwt"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the top-level value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a top-level value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Removes a top-level value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` if the top-level key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over the top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterates over the top-level entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns `true` if the event has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reads the nested value at `path`.
    #[must_use]
    pub fn read(&self, path: &TokenPath) -> Option<&Value> {
        path::read(&self.0, path)
    }

    /// Writes a nested value at `path`.
    pub fn write(&mut self, path: &TokenPath, value: Value) {
        path::write(&mut self.0, path, value);
    }

    /// Borrows the underlying mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the event, returning the underlying mapping.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consumes the event, returning it as a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Event {
    type Error = EventError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let found = match value {
            Value::Object(map) => return Ok(Self(map)),
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        };
        Err(EventError { found })
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        event.into_value()
    }
}
