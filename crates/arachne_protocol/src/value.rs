//! Tagged value variants moved between actions and serialized onto the bus.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single typed payload. Exactly one slot matches the tag; the adjacently
/// tagged serde representation makes a tag/payload mismatch a parse error
/// rather than a silently-zeroed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Value {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Bool(bool),
    Float(f64),
    Strings(Vec<String>),
    StringMap(HashMap<String, String>),
    StringsMap(HashMap<String, Vec<String>>),
    Cookies(HashMap<String, String>),
    /// Opaque JSON payload for values no other tag fits.
    Json(serde_json::Value),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Float(_) => "float",
            Value::Strings(_) => "strings",
            Value::StringMap(_) => "stringMap",
            Value::StringsMap(_) => "stringsMap",
            Value::Cookies(_) => "cookies",
            Value::Json(_) => "json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Value::Strings(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_map(&self) -> Option<&HashMap<String, String>> {
        match self {
            Value::StringMap(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_strings_map(&self) -> Option<&HashMap<String, Vec<String>>> {
        match self {
            Value::StringsMap(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_cookies(&self) -> Option<&HashMap<String, String>> {
        match self {
            Value::Cookies(c) => Some(c),
            _ => None,
        }
    }

    /// Render any variant as a flat string for exporter cells and item maps.
    pub fn coerce_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Int(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Strings(v) => v.join(","),
            Value::StringMap(m) | Value::Cookies(m) => {
                serde_json::to_string(m).unwrap_or_default()
            }
            Value::StringsMap(m) => serde_json::to_string(m).unwrap_or_default(),
            Value::Json(j) => match j {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Strings(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_every_variant() {
        let mut map = HashMap::new();
        map.insert("k".to_string(), "v".to_string());
        let mut multi = HashMap::new();
        multi.insert("k".to_string(), vec!["a".to_string(), "b".to_string()]);

        let values = vec![
            Value::Str("hello".into()),
            Value::Bytes(vec![0x61, 0x62, 0x63]),
            Value::Int(-42),
            Value::Bool(true),
            Value::Float(2.5),
            Value::Strings(vec!["x".into(), "y".into()]),
            Value::StringMap(map.clone()),
            Value::StringsMap(multi),
            Value::Cookies(map),
            Value::Json(serde_json::json!({"nested": [1, 2]})),
        ];

        for value in values {
            let raw = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(value, back);
        }
    }

    #[test]
    fn test_tag_payload_mismatch_rejected() {
        // A bool payload under the str tag must not parse.
        let raw = r#"{"type": "str", "value": false}"#;
        assert!(serde_json::from_str::<Value>(raw).is_err());
    }

    #[test]
    fn test_accessors_match_tag_only() {
        let v = Value::Bool(true);
        assert_eq!(v.as_bool(), Some(true));
        assert!(v.as_str().is_none());
        assert!(v.as_int().is_none());
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(Value::Str("a".into()).coerce_string(), "a");
        assert_eq!(Value::Int(7).coerce_string(), "7");
        assert_eq!(Value::Bytes(b"abc".to_vec()).coerce_string(), "abc");
        assert_eq!(
            Value::Strings(vec!["a".into(), "b".into()]).coerce_string(),
            "a,b"
        );
    }
}
