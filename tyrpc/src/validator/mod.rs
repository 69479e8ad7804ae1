//! Validator compiler.
//!
//! A schema and its model arena compile into a [`Validator`], which offers
//! the runtime operations every generated client also needs:
//!
//! - [`Validator::validate`]: type guard over a native [`Value`]
//! - [`Validator::decode`]: strict decode with every error collected
//! - [`Validator::coerce`]: decode that converts mismatched scalars
//! - [`Validator::parse_lenient`]: decode that substitutes defaults
//! - [`Validator::encode`]: serialize back to wire JSON
//!
//! [`compile`] goes through a process-wide cache, so repeated compilation of
//! the same schema returns the same shared instance.
//!
//! # Example
//!
//! ```rust
//! use tyrpc::schema::{Models, SchemaNode};
//! use tyrpc::validator;
//!
//! let schema = SchemaNode::object()
//!     .property("id", SchemaNode::string())
//!     .optional_property("bio", SchemaNode::string().nullable());
//! let user = validator::compile(&schema, &Models::new()).unwrap();
//!
//! let value = user.decode_str(r#"{"id":"1","bio":null}"#).unwrap();
//! assert!(user.validate(&value));
//! assert_eq!(user.encode(&value).unwrap(), r#"{"id":"1","bio":null}"#);
//! ```

mod cache;
mod decode;
mod encode;
mod error;
mod guard;
mod lenient;
mod program;

use std::sync::Arc;

use serde_json::Value as Json;

pub use cache::{global as global_cache, ValidatorCache};
pub use error::ValueError;

use crate::error::SchemaResult;
use crate::schema::{Models, SchemaNode};
use crate::value::Value;
use decode::{Decoder, Mode};
use program::Program;

/// A compiled schema.
#[derive(Debug)]
pub struct Validator {
    program: Program,
}

impl Validator {
    /// Compile without consulting the cache.
    #[tracing::instrument(skip_all, fields(form = schema.form_name()))]
    pub fn compile(schema: &SchemaNode, models: &Models) -> SchemaResult<Self> {
        let program = program::lower(schema, models)?;
        tracing::debug!(models = program.models.len(), "compiled validator");
        Ok(Self { program })
    }

    /// Whether `value` already conforms to the schema.
    pub fn validate(&self, value: &Value) -> bool {
        guard::validate(&self.program, value)
    }

    /// Decode wire JSON, reporting every mismatch.
    pub fn decode(&self, input: &Json) -> Result<Value, Vec<ValueError>> {
        Decoder::new(&self.program, Mode::Strict).run(input)
    }

    /// Parse JSON text and decode it.
    pub fn decode_str(&self, text: &str) -> Result<Value, Vec<ValueError>> {
        let input: Json = serde_json::from_str(text)
            .map_err(|err| vec![ValueError::new("", "", format!("Invalid JSON: {err}"))])?;
        self.decode(&input)
    }

    /// Decode, converting scalars from strings and numbers where possible.
    pub fn coerce(&self, input: &Json) -> Result<Value, Vec<ValueError>> {
        Decoder::new(&self.program, Mode::Coerce).run(input)
    }

    /// Strict decode returning only the first error.
    pub fn parse(&self, input: &Json) -> Result<Value, ValueError> {
        self.decode(input).map_err(|mut errors| {
            if errors.is_empty() {
                ValueError::new("", "", "Invalid input.")
            } else {
                errors.swap_remove(0)
            }
        })
    }

    /// Decode without failing on malformed scalars, arrays, records or objects.
    ///
    /// Each malformed value becomes `null` when nullable and a type default
    /// otherwise. A discriminator without a known tag is still an error.
    pub fn parse_lenient(&self, input: &Json) -> Result<Value, ValueError> {
        lenient::parse(&self.program, input)
    }

    /// Encode to wire JSON text.
    pub fn encode(&self, value: &Value) -> Result<String, ValueError> {
        let json = self.encode_value(value)?;
        serde_json::to_string(&json).map_err(|err| ValueError::new("", "", err.to_string()))
    }

    /// Encode to a wire JSON tree.
    pub fn encode_value(&self, value: &Value) -> Result<Json, ValueError> {
        encode::encode(&self.program, value)
    }
}

/// Compile through the process-wide cache.
pub fn compile(schema: &SchemaNode, models: &Models) -> SchemaResult<Arc<Validator>> {
    cache::global().get_or_compile(schema, models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_returns_first_error() {
        let validator = Validator::compile(
            &SchemaNode::object()
                .property("a", SchemaNode::string())
                .property("b", SchemaNode::string()),
            &Models::new(),
        )
        .unwrap();
        let err = validator.parse(&json!({})).unwrap_err();
        assert_eq!(err.instance_path, "");
        assert_eq!(err.schema_path, "/properties/a");
    }

    #[test]
    fn test_decode_str_reports_invalid_json() {
        let validator = Validator::compile(&SchemaNode::string(), &Models::new()).unwrap();
        let errors = validator.decode_str("{").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_global_compile_shares_instances() {
        let schema = SchemaNode::object().property("compileShared", SchemaNode::boolean());
        let a = compile(&schema, &Models::new()).unwrap();
        let b = compile(&schema, &Models::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
