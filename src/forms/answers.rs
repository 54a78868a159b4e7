//! Nested answer object built from field paths.
//!
//! Answers are keyed by the same structure as the component tree:
//! a value entered for `address.street` lands at `{"address": {"street": ..}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered path segments identifying one answer, e.g. `["address", "street"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path (the answer object root).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `address.street`. Empty segments are dropped.
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// This path extended by one segment.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// The nested structure of end-user answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerObject(Map<String, Value>);

impl AnswerObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    ///
    /// An intermediate segment currently holding a non-object value is
    /// replaced by an object. Writing to the root path is a no-op.
    pub fn set(&mut self, path: &FieldPath, value: impl Into<Value>) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in parents {
            let slot = current.entry(segment.clone()).or_insert(Value::Null);
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                return;
            };
            current = next;
        }
        current.insert(last.clone(), value.into());
    }

    /// Read the value at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.0.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Read a string value at `path`.
    pub fn get_str(&self, path: &FieldPath) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Whether a top-level key has been written.
    pub fn is_defined(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
