//! Tagged value type for loosely-typed webhook fields.
//!
//! Alert payloads can carry arbitrary JSON next to the order fields
//! (tags, strategy metadata, ...). Everything that ends up in the signed
//! parameter map has to be a flat string, so [`ParamValue::stringify`]
//! defines exactly one string form for every JSON shape:
//!
//! | Variant  | Top-level form                  | Nested form (inside list/map) |
//! |----------|---------------------------------|-------------------------------|
//! | `Null`   | dropped by the builder          | JSON `null`                   |
//! | `Bool`   | `true` / `false`                | JSON string of the same       |
//! | `Number` | JSON number text (`1`, `0.5`)   | JSON string of the same       |
//! | `String` | the string itself               | JSON string                   |
//! | `List`   | compact JSON array              | JSON string of the array text |
//! | `Map`    | compact JSON object, keys sorted| JSON string of the object text|
//!
//! Container text is ASCII-only: other characters are `\uXXXX`-escaped.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::json::AsciiJson;

/// A JSON value with an explicit variant for every shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Flat string form of this value.
    ///
    /// Lists and maps become compact JSON text whose elements are themselves
    /// stringified, so the output is always re-parseable JSON for containers.
    pub fn stringify(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::List(items) => {
                let array = Value::Array(items.iter().map(ParamValue::nested).collect());
                AsciiJson(&array).to_string()
            }
            Self::Map(entries) => {
                // BTreeMap iteration is sorted; inserting in that order keeps the
                // object sorted whichever map backs serde_json.
                let mut object = Map::new();
                for (key, value) in entries {
                    object.insert(key.clone(), value.nested());
                }
                AsciiJson(&Value::Object(object)).to_string()
            }
        }
    }

    /// Element form used inside an enclosing list or map.
    fn nested(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            other => Value::String(other.stringify()),
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_stringify_plain() {
        assert_eq!(ParamValue::from(json!("BTCUSDT")).stringify(), "BTCUSDT");
        assert_eq!(ParamValue::from(json!(1)).stringify(), "1");
        assert_eq!(ParamValue::from(json!(0.25)).stringify(), "0.25");
        assert_eq!(ParamValue::from(json!(true)).stringify(), "true");
        assert_eq!(ParamValue::Null.stringify(), "null");
    }

    #[test]
    fn test_list_of_strings_is_compact_json() {
        let value = ParamValue::from(json!(["a", "b"]));
        assert_eq!(value.stringify(), r#"["a","b"]"#);

        let reparsed: Vec<String> = serde_json::from_str(&value.stringify()).unwrap();
        assert_eq!(reparsed, vec!["a", "b"]);
    }

    #[test]
    fn test_list_elements_are_stringified() {
        let value = ParamValue::from(json!([1, 2.5, false, null]));
        assert_eq!(value.stringify(), r#"["1","2.5","false",null]"#);
    }

    #[test]
    fn test_map_keys_sorted_and_values_stringified() {
        let value = ParamValue::from(json!({"z": 1, "a": "x", "m": [1]}));
        assert_eq!(value.stringify(), r#"{"a":"x","m":"[\"1\"]","z":"1"}"#);
    }

    #[test]
    fn test_nested_containers_reparse_recursively() {
        let value = ParamValue::from(json!({"legs": [{"px": 1.5, "tags": ["a b"]}]}));
        let outer: BTreeMap<String, String> = serde_json::from_str(&value.stringify()).unwrap();
        let legs: Vec<String> = serde_json::from_str(&outer["legs"]).unwrap();
        let leg: BTreeMap<String, String> = serde_json::from_str(&legs[0]).unwrap();

        assert_eq!(leg["px"], "1.5");
        // Spaces inside string values survive; only structural whitespace is absent.
        assert_eq!(leg["tags"], r#"["a b"]"#);
    }

    #[test]
    fn test_stringify_has_no_structural_whitespace() {
        let value = ParamValue::from(json!({"a": [1, 2], "b": {"c": "d"}}));
        let text = value.stringify();
        assert!(!text.contains(": "));
        assert!(!text.contains(", "));
    }

    #[test]
    fn test_nested_text_escapes_non_ascii() {
        let value = ParamValue::from(json!(["止盈", {"note": "🚀"}]));
        assert_eq!(
            value.stringify(),
            r#"["\u6b62\u76c8","{\"note\":\"\\ud83d\\ude80\"}"]"#
        );

        // Top-level strings are values, not JSON, and stay as-is.
        assert_eq!(ParamValue::from(json!("止盈")).stringify(), "止盈");
    }
}
