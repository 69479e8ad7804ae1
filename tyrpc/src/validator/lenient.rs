//! Lenient parsing.
//!
//! Mirrors the parse functions emitted by code generators: malformed input is
//! replaced with a kind-specific default instead of being reported. The only
//! failure is a discriminator whose tag is missing or unknown, since no
//! variant can be chosen as a safe default.

use std::cell::Cell;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use super::decode::{bounded_integer, strict_scalar};
use super::error::{pointer, ValueError};
use super::program::{Kind, Node, Program, Shape};
use crate::schema::ScalarKind;
use crate::value::{ObjectValue, Value};

pub(crate) fn parse(program: &Program, input: &Json) -> Result<Value, ValueError> {
    let lenient = Lenient {
        program,
        defaulted_refs: Cell::new(0),
    };
    lenient.node(&program.root, Some(input), "", "")
}

struct Lenient<'p> {
    program: &'p Program,
    defaulted_refs: Cell<usize>,
}

impl Lenient<'_> {
    fn node(
        &self,
        node: &Node,
        input: Option<&Json>,
        at: &str,
        rule: &str,
    ) -> Result<Value, ValueError> {
        let input = input.filter(|v| !v.is_null());
        if input.is_none() && node.nullable {
            return Ok(Value::Null);
        }
        let fallback = |default: Value| {
            if node.nullable {
                Value::Null
            } else {
                default
            }
        };

        match &node.kind {
            Kind::Scalar(kind) => Ok(input
                .and_then(|v| scalar(*kind, v))
                .unwrap_or_else(|| fallback(default_scalar(*kind)))),
            Kind::Enum { values, members } => Ok(match input {
                Some(Json::String(s)) if members.contains(s) => Value::String(s.clone()),
                _ => fallback(Value::String(values.first().cloned().unwrap_or_default())),
            }),
            Kind::Object(shape) => match input {
                Some(Json::Object(_)) => Ok(Value::Object(self.shape(shape, input, at, rule)?)),
                _ if node.nullable => Ok(Value::Null),
                _ => Ok(Value::Object(self.shape(shape, None, at, rule)?)),
            },
            Kind::Array(element) => match input {
                Some(Json::Array(items)) => {
                    let rule = format!("{rule}/elements");
                    let mut out = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let item_at = pointer(at, &index.to_string());
                        out.push(self.node(element, Some(item), &item_at, &rule)?);
                    }
                    Ok(Value::Array(out))
                }
                _ => Ok(fallback(Value::Array(Vec::new()))),
            },
            Kind::Record(value_node) => match input {
                Some(Json::Object(entries)) => {
                    let rule = format!("{rule}/values");
                    let mut out = ObjectValue::new();
                    for (key, item) in entries {
                        let value = self.node(value_node, Some(item), &pointer(at, key), &rule)?;
                        out.insert(key.clone(), value);
                    }
                    Ok(Value::Object(out))
                }
                _ => Ok(fallback(Value::Object(ObjectValue::new()))),
            },
            Kind::Discriminator { tag, variants } => {
                let tag_at = pointer(at, tag);
                let value = match input.and_then(|v| v.get(tag)) {
                    Some(Json::String(value)) => value,
                    _ => {
                        return Err(ValueError::new(
                            tag_at,
                            format!("{rule}/discriminator"),
                            format!("Missing discriminator field '{tag}'."),
                        ))
                    }
                };
                let Some(shape) = variants.get(value) else {
                    return Err(ValueError::new(
                        tag_at,
                        format!("{rule}/mapping"),
                        format!("Unknown discriminator value \"{value}\"."),
                    ));
                };
                let variant_rule = pointer(&format!("{rule}/mapping"), value);
                Ok(Value::Variant {
                    tag: value.clone(),
                    fields: self.shape(shape, input, at, &variant_rule)?,
                })
            }
            Kind::Ref(index) => {
                if input.is_some() {
                    return self.node(self.program.model(*index), input, at, rule);
                }
                // Defaulting a missing value re-enters the model without
                // consuming input, so bound the expansion.
                let depth = self.defaulted_refs.get();
                if depth > self.program.models.len() {
                    return Err(ValueError::new(
                        at,
                        rule,
                        format!(
                            "Cannot build a default for recursive model '{}'.",
                            self.program.model_names[*index]
                        ),
                    ));
                }
                self.defaulted_refs.set(depth + 1);
                let result = self.node(self.program.model(*index), None, at, rule);
                self.defaulted_refs.set(depth);
                result
            }
        }
    }

    fn shape(
        &self,
        shape: &Shape,
        input: Option<&Json>,
        at: &str,
        rule: &str,
    ) -> Result<ObjectValue, ValueError> {
        let entries = input.and_then(Json::as_object);
        let mut out = ObjectValue::new();
        for (key, child) in &shape.required {
            let item = entries.and_then(|e| e.get(key));
            let child_rule = pointer(&format!("{rule}/properties"), key);
            out.insert(
                key.clone(),
                self.node(child, item, &pointer(at, key), &child_rule)?,
            );
        }
        for (key, child) in &shape.optional {
            if let Some(item) = entries.and_then(|e| e.get(key)) {
                let child_rule = pointer(&format!("{rule}/optionalProperties"), key);
                out.insert(
                    key.clone(),
                    self.node(child, Some(item), &pointer(at, key), &child_rule)?,
                );
            }
        }
        Ok(out)
    }
}

fn scalar(kind: ScalarKind, input: &Json) -> Option<Value> {
    if let Ok(value) = strict_scalar(kind, input) {
        return Some(value);
    }
    // 64-bit integers also accept plain JSON integers.
    match (kind, input) {
        (ScalarKind::Int64, Json::Number(n)) => n.as_i64().map(Value::Int),
        (ScalarKind::Uint64, Json::Number(n)) => n.as_u64().map(Value::UInt),
        _ => None,
    }
}

fn default_scalar(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Boolean => Value::Boolean(false),
        ScalarKind::String => Value::String(String::new()),
        ScalarKind::Timestamp => Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH),
        ScalarKind::Float32 | ScalarKind::Float64 => Value::Float(0.0),
        kind => bounded_integer(kind, 0).unwrap_or(Value::Int(0)),
    }
}
