//! Encoding native values to their wire form.
//!
//! 64-bit integers are written as decimal strings, timestamps as RFC 3339
//! with millisecond precision, and discriminated unions with the tag field
//! first. Only declared properties are written.

use chrono::SecondsFormat;
use serde_json::{Map, Value as Json};

use super::error::{pointer, ValueError};
use super::program::{Kind, Node, Program, Shape};
use crate::schema::ScalarKind;
use crate::value::{ObjectValue, Value};

pub(crate) fn encode(program: &Program, value: &Value) -> Result<Json, ValueError> {
    Encoder { program }.node(&program.root, value, "", "")
}

struct Encoder<'p> {
    program: &'p Program,
}

impl Encoder<'_> {
    fn node(&self, node: &Node, value: &Value, at: &str, rule: &str) -> Result<Json, ValueError> {
        if value.is_null() {
            return if node.nullable {
                Ok(Json::Null)
            } else {
                Err(mismatch(at, rule, "non-null value", value))
            };
        }
        match (&node.kind, value) {
            (Kind::Scalar(kind), value) => scalar(*kind, value, at, &format!("{rule}/type")),
            (Kind::Enum { values, members }, Value::String(s)) => {
                if members.contains(s) {
                    Ok(Json::String(s.clone()))
                } else {
                    Err(ValueError::new(
                        at,
                        format!("{rule}/enum"),
                        format!("Expected one of [{}]. Got \"{s}\".", values.join(", ")),
                    ))
                }
            }
            (Kind::Object(shape), Value::Object(fields)) => {
                let mut out = Map::new();
                self.shape(shape, fields, at, rule, &mut out)?;
                Ok(Json::Object(out))
            }
            (Kind::Array(element), Value::Array(items)) => {
                let rule = format!("{rule}/elements");
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.node(element, item, &pointer(at, &index.to_string()), &rule)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Json::Array)
            }
            (Kind::Record(value_node), Value::Object(fields)) => {
                let rule = format!("{rule}/values");
                let mut out = Map::new();
                for (key, item) in fields {
                    out.insert(key.clone(), self.node(value_node, item, &pointer(at, key), &rule)?);
                }
                Ok(Json::Object(out))
            }
            (Kind::Discriminator { tag, variants }, Value::Variant { tag: name, fields }) => {
                self.variant(tag, variants.get(name), name, fields, at, rule)
            }
            (Kind::Discriminator { tag, variants }, Value::Object(fields)) => {
                let Some(Value::String(name)) = fields.get(tag) else {
                    return Err(ValueError::new(
                        pointer(at, tag),
                        format!("{rule}/discriminator"),
                        format!("Missing discriminator field '{tag}'."),
                    ));
                };
                self.variant(tag, variants.get(name), name, fields, at, rule)
            }
            (Kind::Ref(index), value) => self.node(self.program.model(*index), value, at, rule),
            (Kind::Enum { .. }, value) => Err(mismatch(at, &format!("{rule}/enum"), "string", value)),
            (Kind::Array(_), value) => Err(mismatch(at, &format!("{rule}/elements"), "array", value)),
            (Kind::Record(_), value) => Err(mismatch(at, &format!("{rule}/values"), "object", value)),
            (Kind::Object(_), value) => {
                Err(mismatch(at, &format!("{rule}/properties"), "object", value))
            }
            (Kind::Discriminator { .. }, value) => Err(mismatch(
                at,
                &format!("{rule}/discriminator"),
                "variant",
                value,
            )),
        }
    }

    fn variant(
        &self,
        tag: &str,
        shape: Option<&Shape>,
        name: &str,
        fields: &ObjectValue,
        at: &str,
        rule: &str,
    ) -> Result<Json, ValueError> {
        let Some(shape) = shape else {
            return Err(ValueError::new(
                pointer(at, tag),
                format!("{rule}/mapping"),
                format!("Unknown discriminator value \"{name}\"."),
            ));
        };
        let mut out = Map::new();
        out.insert(tag.to_string(), Json::String(name.to_string()));
        let variant_rule = pointer(&format!("{rule}/mapping"), name);
        self.shape(shape, fields, at, &variant_rule, &mut out)?;
        Ok(Json::Object(out))
    }

    fn shape(
        &self,
        shape: &Shape,
        fields: &ObjectValue,
        at: &str,
        rule: &str,
        out: &mut Map<String, Json>,
    ) -> Result<(), ValueError> {
        for (key, child) in &shape.required {
            let child_rule = pointer(&format!("{rule}/properties"), key);
            let Some(value) = fields.get(key) else {
                return Err(ValueError::missing(at, &child_rule, key));
            };
            out.insert(key.clone(), self.node(child, value, &pointer(at, key), &child_rule)?);
        }
        for (key, child) in &shape.optional {
            if let Some(value) = fields.get(key) {
                let child_rule = pointer(&format!("{rule}/optionalProperties"), key);
                out.insert(key.clone(), self.node(child, value, &pointer(at, key), &child_rule)?);
            }
        }
        Ok(())
    }
}

fn scalar(kind: ScalarKind, value: &Value, at: &str, rule: &str) -> Result<Json, ValueError> {
    let out_of_range = || {
        ValueError::new(
            at,
            rule,
            format!("Value {} is out of range for {kind}.", display(value)),
        )
    };
    match (kind, value) {
        (ScalarKind::Boolean, Value::Boolean(b)) => Ok(Json::Bool(*b)),
        (ScalarKind::String, Value::String(s)) => Ok(Json::String(s.clone())),
        (ScalarKind::Timestamp, Value::Timestamp(ts)) => Ok(Json::String(
            ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        )),
        (ScalarKind::Float32 | ScalarKind::Float64, Value::Float(f)) => {
            if kind == ScalarKind::Float32 && f.is_finite() && f.abs() > f32::MAX as f64 {
                return Err(out_of_range());
            }
            serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| ValueError::new(at, rule, format!("Cannot encode non-finite float {f}.")))
        }
        (kind, Value::Int(_) | Value::UInt(_)) if kind.is_integer() => {
            let whole = match value {
                Value::Int(i) => *i as i128,
                Value::UInt(u) => *u as i128,
                _ => return Err(mismatch(at, rule, kind.as_str(), value)),
            };
            let checked = super::decode::bounded_integer(kind, whole).ok_or_else(out_of_range)?;
            Ok(match (kind.is_64_bit(), checked) {
                (true, Value::Int(i)) => Json::String(i.to_string()),
                (true, Value::UInt(u)) => Json::String(u.to_string()),
                (false, Value::Int(i)) => Json::from(i),
                (false, Value::UInt(u)) => Json::from(u),
                (_, _) => return Err(mismatch(at, rule, kind.as_str(), value)),
            })
        }
        (kind, value) => Err(mismatch(at, rule, kind.as_str(), value)),
    }
}

fn mismatch(at: &str, rule: &str, expected: &str, value: &Value) -> ValueError {
    ValueError::new(
        at,
        rule,
        format!("Expected {expected}. Got {}.", value.kind()),
    )
}

fn display(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        other => other.kind().to_string(),
    }
}
