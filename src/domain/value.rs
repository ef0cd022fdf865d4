//! Cache value model

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::error::CacheError;

/// A value going into or coming out of the cache.
///
/// The variant is chosen by the caller, not inferred from runtime type
/// identity: counters are `Int`, structured data is `Json`, and `Raw`
/// carries payloads written before the tagged encoding existed. Booleans
/// are `Json(Value::Bool)`, never `Int`.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Integer stored as plain ASCII decimal, compatible with the store's
    /// atomic increment/decrement primitives.
    Int(i64),
    /// Arbitrary structured value, stored tagged and JSON-serialized.
    Json(JsonValue),
    /// Untagged legacy payload, returned verbatim on read.
    Raw(Vec<u8>),
}

impl CacheValue {
    /// Serializes any `Serialize` value into the `Json` variant.
    ///
    /// A serializer failure is a programmer error and surfaces immediately;
    /// it is never swallowed into a cache miss.
    pub fn json<V: Serialize>(value: &V) -> Result<Self, CacheError> {
        let json = serde_json::to_value(value).map_err(|e| {
            CacheError::serialization(format!("Failed to serialize cache value: {}", e))
        })?;
        Ok(Self::Json(json))
    }

    /// Converts the value into its JSON representation, if it has one.
    ///
    /// `Raw` payloads have no JSON form and yield `None`.
    pub fn into_json(self) -> Option<JsonValue> {
        match self {
            Self::Int(n) => Some(JsonValue::from(n)),
            Self::Json(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// Returns the integer if this is an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<i64> for CacheValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<JsonValue> for CacheValue {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        Self::Json(JsonValue::String(s.to_string()))
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        Self::Json(JsonValue::String(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_int() {
        assert_eq!(CacheValue::from(42), CacheValue::Int(42));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            CacheValue::from("hello"),
            CacheValue::Json(json!("hello"))
        );
    }

    #[test]
    fn test_json_constructor() {
        #[derive(Serialize)]
        struct Payload {
            x: i32,
        }

        let value = CacheValue::json(&Payload { x: 1 }).unwrap();
        assert_eq!(value, CacheValue::Json(json!({"x": 1})));
    }

    #[test]
    fn test_into_json() {
        assert_eq!(CacheValue::Int(7).into_json(), Some(json!(7)));
        assert_eq!(
            CacheValue::Json(json!({"a": true})).into_json(),
            Some(json!({"a": true}))
        );
        assert_eq!(CacheValue::Raw(b"legacy".to_vec()).into_json(), None);
    }

    #[test]
    fn test_bool_is_not_int() {
        let value = CacheValue::json(&true).unwrap();
        assert_eq!(value, CacheValue::Json(json!(true)));
        assert!(value.as_int().is_none());
    }
}
