//! Native values produced by decoding and consumed by encoding.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Ordered field map of an object value. An absent optional property is a
/// missing key, which keeps "absent" distinct from [`Value::Null`].
pub type ObjectValue = IndexMap<String, Value>;

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    String(String),
    Timestamp(DateTime<Utc>),
    /// float32 and float64.
    Float(f64),
    /// int8 through int64.
    Int(i64),
    /// uint8 through uint64.
    UInt(u64),
    Array(Vec<Value>),
    Object(ObjectValue),
    /// A discriminated union value. `fields` excludes the tag field.
    Variant { tag: String, fields: ObjectValue },
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Float(_) => "float",
            Value::Int(_) => "integer",
            Value::UInt(_) => "unsigned integer",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Variant { .. } => "variant",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(fields) | Value::Variant { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Field of an object or variant value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    /// Build an object value from key/value pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a variant value.
    pub fn variant<I, K>(tag: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Variant {
            tag: tag.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_builder_keeps_order() {
        let value = Value::object([("b", Value::from(1i64)), ("a", Value::from("x"))]);
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(value.get("a"), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_variant_fields_accessible() {
        let value = Value::variant("CIRCLE", [("r", Value::Float(1.5))]);
        assert_eq!(value.get("r"), Some(&Value::Float(1.5)));
        assert_eq!(value.kind(), "variant");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(true)), Value::Boolean(true));
    }
}
