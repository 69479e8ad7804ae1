//! Value errors reported by decoding, coercion and encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One structural mismatch between a value and its schema.
///
/// Both paths are JSON pointers: `instance_path` locates the offending value
/// in the input (`/posts/0/title`), `schema_path` locates the rule it broke
/// (`/properties/posts/elements/properties/title/type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueError {
    pub instance_path: String,
    pub schema_path: String,
    pub message: String,
}

impl ValueError {
    pub fn new(
        instance_path: impl Into<String>,
        schema_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            instance_path: instance_path.into(),
            schema_path: schema_path.into(),
            message: message.into(),
        }
    }

    /// The input has the wrong JSON type.
    pub fn expected(
        instance_path: &str,
        schema_path: &str,
        expected: &str,
        got: &serde_json::Value,
    ) -> Self {
        Self::new(
            instance_path,
            schema_path,
            format!("Expected {expected}. Got {}.", json_kind(got)),
        )
    }

    /// A required property is missing.
    pub fn missing(instance_path: &str, schema_path: &str, key: &str) -> Self {
        Self::new(
            instance_path,
            schema_path,
            format!("Missing required property '{key}'."),
        )
    }

    /// A strict object received an undeclared property.
    pub fn unexpected(instance_path: &str, schema_path: &str, key: &str) -> Self {
        Self::new(
            instance_path,
            schema_path,
            format!("Unexpected property '{key}'."),
        )
    }

    /// Coercion to the given kind failed for the given input.
    pub fn coercion(
        instance_path: &str,
        schema_path: &str,
        target: &str,
        input: &serde_json::Value,
    ) -> Self {
        Self::new(
            instance_path,
            schema_path,
            format!("Unable to coerce {input} to {target}."),
        )
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.instance_path.is_empty() {
            "/"
        } else {
            self.instance_path.as_str()
        };
        write!(f, "Error at {at}: {}", self.message)
    }
}

impl std::error::Error for ValueError {}

/// Name of the JSON type of a wire value.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Append a key to a JSON pointer, escaping `~` and `/`.
pub(crate) fn pointer(base: &str, key: &str) -> String {
    let escaped = key.replace('~', "~0").replace('/', "~1");
    format!("{base}/{escaped}")
}
