use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended property bag handed verbatim to a render function.
///
/// Props are a JSON object. The accessors below validate individual entries
/// at the point a render function reads them instead of assuming a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, returning the value previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style variant of [`Props::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the property as a string slice when it holds a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Interprets the property as a boolean flag.
    ///
    /// JSON `true` and the string `"true"` (any case) are set; anything else,
    /// including a missing entry, is unset.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(value)) => value.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Renders the props as compact JSON, the form used in render log lines.
impl fmt::Display for Props {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        formatter.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::bool_true(json!(true), true)]
    #[case::bool_false(json!(false), false)]
    #[case::string_true(json!("true"), true)]
    #[case::string_upper(json!("TRUE"), true)]
    #[case::string_false(json!("false"), false)]
    #[case::number(json!(1), false)]
    fn flag_accepts_bool_and_string_forms(#[case] value: Value, #[case] expected: bool) {
        let props = Props::new().with("exclamate", value);
        assert_eq!(props.flag("exclamate"), expected);
    }

    #[test]
    fn missing_flag_is_unset() {
        assert!(!Props::new().flag("exclamate"));
    }

    #[test]
    fn displays_as_compact_json() {
        let props = Props::new().with("exclamate", true);
        assert_eq!(props.to_string(), r#"{"exclamate":true}"#);
    }

    #[test]
    fn get_str_ignores_non_strings() {
        let props: Props = [("name", json!("gunnar")), ("count", json!(3))]
            .into_iter()
            .collect();
        assert_eq!(props.get_str("name"), Some("gunnar"));
        assert_eq!(props.get_str("count"), None);
        assert_eq!(props.len(), 2);
    }
}
