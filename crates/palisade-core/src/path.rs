//! Dotted path addressing into nested mappings.
//!
//! A [`TokenPath`] is parsed from strings such as `"headers.jwt"` and used to
//! read or write values inside an event:
//!
//! ```
//! use palisade_core::path::{self, TokenPath};
//! use serde_json::{json, Map, Value};
//!
//! let path: TokenPath = "headers.jwt".parse().unwrap();
//!
//! let mut container = Map::new();
//! path::write(&mut container, &path, json!("token"));
//!
//! assert_eq!(path::read(&container, &path), Some(&json!("token")));
//! assert_eq!(Value::Object(container), json!({ "headers": { "jwt": "token" } }));
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path has no segments.
    #[error("path must contain at least one segment")]
    Empty,

    /// One of the segments is empty (e.g. `"headers..jwt"`).
    #[error("path '{path}' contains an empty segment")]
    EmptySegment {
        /// The offending path.
        path: String,
    },
}

/// An ordered, non-empty sequence of non-empty keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TokenPath(Vec<String>);

/// Path into a decoded claim set.
///
/// Claim paths share the representation and parsing rules of [`TokenPath`].
pub type ClaimPath = TokenPath;

impl TokenPath {
    /// Parses a dotted path string.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        Self::from_segments(path.split('.')).map_err(|_| PathError::EmptySegment {
            path: path.to_string(),
        })
    }

    /// Builds a path from already split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment {
                path: segments.join("."),
            });
        }

        Ok(Self(segments))
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the final segment.
    #[must_use]
    pub fn last(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Returns the number of segments. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; paths are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for TokenPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Reads the value at `path`.
///
/// Returns `None` when any segment is absent or an intermediate value is not a
/// mapping. Callers decide whether absence is fatal.
#[must_use]
pub fn read<'a>(container: &'a Map<String, Value>, path: &TokenPath) -> Option<&'a Value> {
    let (last, parents) = path.0.split_last()?;

    let mut current = container;
    for segment in parents {
        current = current.get(segment)?.as_object()?;
    }
    current.get(last)
}

/// Writes `value` at `path`, creating intermediate mappings as needed.
///
/// Intermediate values that are not mappings are replaced.
pub fn write(container: &mut Map<String, Value>, path: &TokenPath, value: Value) {
    let Some((last, parents)) = path.0.split_last() else {
        return;
    };

    let mut current = container;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_parse_single_segment() {
        let path = TokenPath::parse("nonce").unwrap();
        assert_eq!(path.segments(), ["nonce"]);
        assert_eq!(path.last(), "nonce");
    }

    #[test]
    fn test_parse_nested() {
        let path: TokenPath = "queryStringParameters.jwt".parse().unwrap();
        assert_eq!(path.segments(), ["queryStringParameters", "jwt"]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.to_string(), "queryStringParameters.jwt");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(TokenPath::parse(""), Err(PathError::Empty));
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        for bad in ["headers.", ".jwt", "headers..jwt", "."] {
            assert!(
                matches!(TokenPath::parse(bad), Err(PathError::EmptySegment { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_segments_rejects_empty_list() {
        let segments: Vec<String> = Vec::new();
        assert_eq!(TokenPath::from_segments(segments), Err(PathError::Empty));
    }

    #[test]
    fn test_read_nested_value() {
        let container = object(json!({ "headers": { "jwt": "X" } }));
        let path = TokenPath::parse("headers.jwt").unwrap();
        assert_eq!(read(&container, &path), Some(&json!("X")));
    }

    #[test]
    fn test_read_missing_is_none() {
        let container = object(json!({ "headers": {} }));
        assert!(read(&container, &TokenPath::parse("headers.jwt").unwrap()).is_none());
        assert!(read(&container, &TokenPath::parse("body.jwt").unwrap()).is_none());
    }

    #[test]
    fn test_read_through_scalar_is_none() {
        let container = object(json!({ "headers": "not-a-map" }));
        assert!(read(&container, &TokenPath::parse("headers.jwt").unwrap()).is_none());
    }

    #[test]
    fn test_write_creates_intermediates() {
        let mut container = Map::new();
        write(&mut container, &TokenPath::parse("a.b.c").unwrap(), json!(1));
        assert_eq!(Value::Object(container), json!({ "a": { "b": { "c": 1 } } }));
    }

    #[test]
    fn test_write_replaces_scalar_intermediate() {
        let mut container = object(json!({ "a": 5 }));
        write(&mut container, &TokenPath::parse("a.b").unwrap(), json!(true));
        assert_eq!(Value::Object(container), json!({ "a": { "b": true } }));
    }

    #[test]
    fn test_write_keeps_siblings() {
        let mut container = object(json!({ "headers": { "jwt": "X" } }));
        write(&mut container, &TokenPath::parse("headers.xsrf").unwrap(), json!("Y"));
        assert_eq!(
            Value::Object(container),
            json!({ "headers": { "jwt": "X", "xsrf": "Y" } })
        );
    }

    proptest! {
        #[test]
        fn prop_parse_display_is_identity(segments in prop::collection::vec("[A-Za-z0-9_-]{1,8}", 1..6)) {
            let dotted = segments.join(".");
            let path = TokenPath::parse(&dotted).unwrap();
            prop_assert_eq!(path.segments(), segments.as_slice());
            prop_assert_eq!(path.to_string(), dotted);
        }

        #[test]
        fn prop_write_then_read(segments in prop::collection::vec("[a-z]{1,6}", 1..5), value in any::<i64>()) {
            let path = TokenPath::from_segments(segments).unwrap();
            let mut container = Map::new();
            write(&mut container, &path, json!(value));
            prop_assert_eq!(read(&container, &path), Some(&json!(value)));
        }
    }
}
