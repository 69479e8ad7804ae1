//! Type guard over native values.

use super::program::{Kind, Node, Program, Shape};
use crate::schema::ScalarKind;
use crate::value::{ObjectValue, Value};

/// Whether `value` already has the shape described by the program.
pub(crate) fn validate(program: &Program, value: &Value) -> bool {
    Guard { program }.node(&program.root, value)
}

struct Guard<'p> {
    program: &'p Program,
}

impl Guard<'_> {
    fn node(&self, node: &Node, value: &Value) -> bool {
        if value.is_null() {
            return node.nullable;
        }
        match (&node.kind, value) {
            (Kind::Scalar(kind), value) => scalar(*kind, value),
            (Kind::Enum { members, .. }, Value::String(s)) => members.contains(s),
            (Kind::Object(shape), Value::Object(fields)) => self.shape(shape, fields, None),
            (Kind::Array(element), Value::Array(items)) => {
                items.iter().all(|item| self.node(element, item))
            }
            (Kind::Record(value_node), Value::Object(fields)) => {
                fields.values().all(|item| self.node(value_node, item))
            }
            (Kind::Discriminator { variants, .. }, Value::Variant { tag, fields }) => variants
                .get(tag)
                .is_some_and(|shape| self.shape(shape, fields, None)),
            // A plain object carrying the tag field is accepted as well.
            (Kind::Discriminator { tag, variants }, Value::Object(fields)) => {
                match fields.get(tag) {
                    Some(Value::String(name)) => variants
                        .get(name)
                        .is_some_and(|shape| self.shape(shape, fields, Some(tag.as_str()))),
                    _ => false,
                }
            }
            (Kind::Ref(index), value) => self.node(self.program.model(*index), value),
            _ => false,
        }
    }

    fn shape(&self, shape: &Shape, fields: &ObjectValue, tag: Option<&str>) -> bool {
        let required = shape.required.iter().all(|(key, child)| {
            fields
                .get(key)
                .is_some_and(|value| self.node(child, value))
        });
        let optional = shape.optional.iter().all(|(key, child)| {
            fields
                .get(key)
                .map_or(true, |value| self.node(child, value))
        });
        let closed = !shape.strict
            || fields
                .keys()
                .all(|key| shape.declares(key) || Some(key.as_str()) == tag);
        required && optional && closed
    }
}

fn scalar(kind: ScalarKind, value: &Value) -> bool {
    match (kind, value) {
        (ScalarKind::Boolean, Value::Boolean(_)) => true,
        (ScalarKind::String, Value::String(_)) => true,
        (ScalarKind::Timestamp, Value::Timestamp(_)) => true,
        // Non-finite floats have no wire form.
        (ScalarKind::Float32, Value::Float(f)) => f.is_finite() && f.abs() <= f32::MAX as f64,
        (ScalarKind::Float64, Value::Float(f)) => f.is_finite(),
        (kind, Value::Int(i)) if kind.is_integer() => in_range(kind, *i as i128),
        (kind, Value::UInt(u)) if kind.is_integer() => in_range(kind, *u as i128),
        _ => false,
    }
}

fn in_range(kind: ScalarKind, whole: i128) -> bool {
    if let Some((min, max)) = kind.signed_range() {
        return whole >= min as i128 && whole <= max as i128;
    }
    kind.unsigned_max()
        .is_some_and(|max| whole >= 0 && whole <= max as i128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Models, SchemaNode};
    use crate::validator::program::lower;

    fn program(schema: SchemaNode) -> Program {
        lower(&schema, &Models::new()).unwrap()
    }

    #[test]
    fn test_integer_ranges() {
        let program = program(SchemaNode::scalar(ScalarKind::Uint8));
        assert!(validate(&program, &Value::UInt(255)));
        assert!(validate(&program, &Value::Int(3)));
        assert!(!validate(&program, &Value::Int(-1)));
        assert!(!validate(&program, &Value::UInt(256)));
        assert!(!validate(&program, &Value::Float(1.0)));
    }

    #[test]
    fn test_floats_must_be_encodable() {
        let float32 = program(SchemaNode::scalar(ScalarKind::Float32));
        let float64 = program(SchemaNode::scalar(ScalarKind::Float64));
        assert!(validate(&float32, &Value::Float(1.5)));
        assert!(!validate(&float32, &Value::Float(1e39)));
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!validate(&float32, &Value::Float(f)));
            assert!(!validate(&float64, &Value::Float(f)));
        }
        assert!(validate(&float64, &Value::Float(1e39)));
    }

    #[test]
    fn test_strict_object_rejects_extra_keys() {
        let schema = SchemaNode::object().property("id", SchemaNode::string());
        let strict = program(schema.clone());
        let loose = program(schema.allow_additional());
        let value = Value::object([("id", Value::from("1")), ("extra", Value::from(true))]);
        assert!(!validate(&strict, &value));
        assert!(validate(&loose, &value));
    }

    #[test]
    fn test_optional_absent_versus_null() {
        let program = program(
            SchemaNode::object().optional_property("bio", SchemaNode::string()),
        );
        assert!(validate(&program, &Value::Object(ObjectValue::new())));
        assert!(!validate(&program, &Value::object([("bio", Value::Null)])));
    }

    #[test]
    fn test_discriminator_accepts_tagged_object() {
        let program = program(
            SchemaNode::discriminator("type")
                .variant("A", SchemaNode::object().property("id", SchemaNode::string())),
        );
        assert!(validate(&program, &Value::variant("A", [("id", Value::from("1"))])));
        assert!(validate(
            &program,
            &Value::object([("type", Value::from("A")), ("id", Value::from("1"))])
        ));
        assert!(!validate(&program, &Value::variant("B", [("id", Value::from("1"))])));
    }
}
