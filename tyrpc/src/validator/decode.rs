//! Strict decoding and coercion.
//!
//! Both modes walk the compiled program the same way and aggregate one error
//! per failing subtree. Coercion only differs at scalar leaves, where it
//! retries a failed strict match with a type conversion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as Json;

use super::error::{pointer, ValueError};
use super::program::{Kind, Node, Program, Shape};
use crate::schema::ScalarKind;
use crate::value::{ObjectValue, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Strict,
    Coerce,
}

pub(crate) struct Decoder<'p> {
    program: &'p Program,
    mode: Mode,
    errors: Vec<ValueError>,
}

impl<'p> Decoder<'p> {
    pub fn new(program: &'p Program, mode: Mode) -> Self {
        Self {
            program,
            mode,
            errors: Vec::new(),
        }
    }

    pub fn run(mut self, input: &Json) -> Result<Value, Vec<ValueError>> {
        let program = self.program;
        match self.node(&program.root, input, "", "") {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }

    fn fail(&mut self, error: ValueError) -> Option<Value> {
        self.errors.push(error);
        None
    }

    fn node(&mut self, node: &Node, input: &Json, at: &str, rule: &str) -> Option<Value> {
        if input.is_null() && node.nullable {
            return Some(Value::Null);
        }
        match &node.kind {
            Kind::Scalar(kind) => self.scalar(*kind, input, at, rule),
            Kind::Enum { values, members } => match input {
                Json::String(s) if members.contains(s) => Some(Value::String(s.clone())),
                Json::String(s) => self.fail(ValueError::new(
                    at,
                    format!("{rule}/enum"),
                    format!("Expected one of [{}]. Got \"{s}\".", values.join(", ")),
                )),
                other => self.fail(ValueError::expected(
                    at,
                    &format!("{rule}/enum"),
                    "string",
                    other,
                )),
            },
            Kind::Object(shape) => {
                let fields = self.shape(shape, input, at, rule, None)?;
                Some(Value::Object(fields))
            }
            Kind::Array(element) => {
                let Json::Array(items) = input else {
                    return self.fail(ValueError::expected(
                        at,
                        &format!("{rule}/elements"),
                        "array",
                        input,
                    ));
                };
                let before = self.errors.len();
                let rule = format!("{rule}/elements");
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_at = pointer(at, &index.to_string());
                    if let Some(value) = self.node(element, item, &item_at, &rule) {
                        out.push(value);
                    }
                }
                (self.errors.len() == before).then_some(Value::Array(out))
            }
            Kind::Record(value_node) => {
                let Json::Object(entries) = input else {
                    return self.fail(ValueError::expected(
                        at,
                        &format!("{rule}/values"),
                        "object",
                        input,
                    ));
                };
                let before = self.errors.len();
                let rule = format!("{rule}/values");
                let mut out = ObjectValue::new();
                for (key, item) in entries {
                    if let Some(value) = self.node(value_node, item, &pointer(at, key), &rule) {
                        out.insert(key.clone(), value);
                    }
                }
                (self.errors.len() == before).then_some(Value::Object(out))
            }
            Kind::Discriminator { tag, variants } => {
                let Json::Object(entries) = input else {
                    return self.fail(ValueError::expected(
                        at,
                        &format!("{rule}/discriminator"),
                        "object",
                        input,
                    ));
                };
                let tag_at = pointer(at, tag);
                let value = match entries.get(tag) {
                    Some(Json::String(value)) => value,
                    Some(other) => {
                        return self.fail(ValueError::expected(
                            &tag_at,
                            &format!("{rule}/discriminator"),
                            "string",
                            other,
                        ))
                    }
                    None => {
                        return self.fail(ValueError::new(
                            tag_at,
                            format!("{rule}/discriminator"),
                            format!("Missing discriminator field '{tag}'."),
                        ))
                    }
                };
                let Some(shape) = variants.get(value) else {
                    let expected: Vec<&str> = variants.keys().map(String::as_str).collect();
                    return self.fail(ValueError::new(
                        tag_at,
                        format!("{rule}/mapping"),
                        format!(
                            "Unknown discriminator value \"{value}\". Expected one of [{}].",
                            expected.join(", ")
                        ),
                    ));
                };
                let variant_rule = pointer(&format!("{rule}/mapping"), value);
                let fields = self.shape(shape, input, at, &variant_rule, Some(tag.as_str()))?;
                Some(Value::Variant {
                    tag: value.clone(),
                    fields,
                })
            }
            Kind::Ref(index) => {
                let program = self.program;
                self.node(program.model(*index), input, at, rule)
            }
        }
    }

    fn shape(
        &mut self,
        shape: &Shape,
        input: &Json,
        at: &str,
        rule: &str,
        tag: Option<&str>,
    ) -> Option<ObjectValue> {
        let Json::Object(entries) = input else {
            self.errors.push(ValueError::expected(
                at,
                &format!("{rule}/properties"),
                "object",
                input,
            ));
            return None;
        };
        let before = self.errors.len();
        let mut out = ObjectValue::new();

        for (key, child) in &shape.required {
            let child_rule = pointer(&format!("{rule}/properties"), key);
            match entries.get(key) {
                Some(item) => {
                    if let Some(value) = self.node(child, item, &pointer(at, key), &child_rule) {
                        out.insert(key.clone(), value);
                    }
                }
                None => self.errors.push(ValueError::missing(at, &child_rule, key)),
            }
        }
        for (key, child) in &shape.optional {
            if let Some(item) = entries.get(key) {
                let child_rule = pointer(&format!("{rule}/optionalProperties"), key);
                if let Some(value) = self.node(child, item, &pointer(at, key), &child_rule) {
                    out.insert(key.clone(), value);
                }
            }
        }
        if shape.strict {
            for key in entries.keys() {
                if !shape.declares(key) && Some(key.as_str()) != tag {
                    self.errors
                        .push(ValueError::unexpected(&pointer(at, key), rule, key));
                }
            }
        }

        (self.errors.len() == before).then_some(out)
    }

    fn scalar(&mut self, kind: ScalarKind, input: &Json, at: &str, rule: &str) -> Option<Value> {
        let rule = format!("{rule}/type");
        match strict_scalar(kind, input) {
            Ok(value) => return Some(value),
            Err(Mismatch::Range) => {
                return self.fail(ValueError::new(
                    at,
                    rule,
                    format!("Value {input} is out of range for {kind}."),
                ))
            }
            Err(Mismatch::Type) => {}
        }
        if self.mode == Mode::Coerce && !input.is_null() {
            return match coerce_scalar(kind, input) {
                Some(value) => Some(value),
                None => self.fail(ValueError::coercion(at, &rule, kind.as_str(), input)),
            };
        }
        let expected = match kind {
            ScalarKind::Timestamp if input.is_string() => {
                return self.fail(ValueError::new(at, rule, "Invalid date string."))
            }
            ScalarKind::Int64 | ScalarKind::Uint64 => "integer string",
            ScalarKind::Boolean => "boolean",
            ScalarKind::String => "string",
            ScalarKind::Timestamp => "ISO-8601 date string",
            _ => "number",
        };
        self.fail(ValueError::expected(at, &rule, expected, input))
    }
}

pub(crate) enum Mismatch {
    Type,
    Range,
}

/// Match a wire value exactly against a scalar kind.
pub(crate) fn strict_scalar(kind: ScalarKind, input: &Json) -> Result<Value, Mismatch> {
    match (kind, input) {
        (ScalarKind::Boolean, Json::Bool(b)) => Ok(Value::Boolean(*b)),
        (ScalarKind::String, Json::String(s)) => Ok(Value::String(s.clone())),
        (ScalarKind::Timestamp, Json::String(s)) => parse_timestamp(s)
            .map(Value::Timestamp)
            .ok_or(Mismatch::Type),
        (ScalarKind::Float32, Json::Number(n)) => {
            let value = n.as_f64().ok_or(Mismatch::Type)?;
            if value.is_finite() && value.abs() > f32::MAX as f64 {
                return Err(Mismatch::Range);
            }
            Ok(Value::Float(value))
        }
        (ScalarKind::Float64, Json::Number(n)) => n.as_f64().map(Value::Float).ok_or(Mismatch::Type),
        (ScalarKind::Int64, Json::String(s)) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Mismatch::Type),
        (ScalarKind::Uint64, Json::String(s)) => s
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|_| Mismatch::Type),
        (kind, Json::Number(n)) if kind.is_integer() && !kind.is_64_bit() => {
            let whole = integer_of(n).ok_or(Mismatch::Type)?;
            bounded_integer(kind, whole).ok_or(Mismatch::Range)
        }
        _ => Err(Mismatch::Type),
    }
}

/// Attempt a type conversion after a strict mismatch.
pub(crate) fn coerce_scalar(kind: ScalarKind, input: &Json) -> Option<Value> {
    match kind {
        ScalarKind::Boolean => match input {
            Json::String(s) => match s.as_str() {
                "true" | "TRUE" | "1" => Some(Value::Boolean(true)),
                "false" | "FALSE" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            Json::Number(n) => match n.as_i64() {
                Some(1) => Some(Value::Boolean(true)),
                Some(0) => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
        ScalarKind::String => match input {
            Json::Number(n) => Some(Value::String(n.to_string())),
            Json::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ScalarKind::Timestamp => match input {
            Json::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(Value::Timestamp),
            Json::String(s) => parse_timestamp(s.trim()).map(Value::Timestamp),
            _ => None,
        },
        ScalarKind::Float32 | ScalarKind::Float64 => match input {
            Json::String(s) => {
                let value = s.trim().parse::<f64>().ok()?;
                let wire = Json::from(serde_json::Number::from_f64(value)?);
                strict_scalar(kind, &wire).ok()
            }
            _ => None,
        },
        ScalarKind::Int64 => match input {
            Json::Number(n) => n.as_i64().map(Value::Int),
            _ => None,
        },
        ScalarKind::Uint64 => match input {
            Json::Number(n) => n.as_u64().map(Value::UInt),
            _ => None,
        },
        _ => match input {
            Json::String(s) => {
                let whole = s.trim().parse::<i128>().ok()?;
                bounded_integer(kind, whole)
            }
            _ => None,
        },
    }
}

/// Whole-number value of a JSON number, accepting integral floats like `3.0`.
fn integer_of(n: &serde_json::Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i as i128);
    }
    if let Some(u) = n.as_u64() {
        return Some(u as i128);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e20).then_some(f as i128)
}

/// Range-check an integer against a kind and wrap it in the matching value.
pub(crate) fn bounded_integer(kind: ScalarKind, whole: i128) -> Option<Value> {
    if let Some((min, max)) = kind.signed_range() {
        return (whole >= min as i128 && whole <= max as i128).then(|| Value::Int(whole as i64));
    }
    let max = kind.unsigned_max()?;
    (whole >= 0 && whole <= max as i128).then(|| Value::UInt(whole as u64))
}

/// Parse an ISO-8601 date or date-time. Inputs without an offset are UTC.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_integers_respect_range() {
        assert!(matches!(
            strict_scalar(ScalarKind::Uint8, &json!(255)),
            Ok(Value::UInt(255))
        ));
        assert!(matches!(
            strict_scalar(ScalarKind::Uint8, &json!(256)),
            Err(Mismatch::Range)
        ));
        assert!(matches!(
            strict_scalar(ScalarKind::Int8, &json!(-129)),
            Err(Mismatch::Range)
        ));
        assert!(matches!(
            strict_scalar(ScalarKind::Int32, &json!(3.0)),
            Ok(Value::Int(3))
        ));
        assert!(matches!(
            strict_scalar(ScalarKind::Int32, &json!(3.5)),
            Err(Mismatch::Type)
        ));
    }

    #[test]
    fn test_strict_64_bit_requires_string() {
        assert!(matches!(
            strict_scalar(ScalarKind::Int64, &json!("-9007199254740993")),
            Ok(Value::Int(-9007199254740993))
        ));
        assert!(matches!(
            strict_scalar(ScalarKind::Int64, &json!(12)),
            Err(Mismatch::Type)
        ));
        assert!(matches!(
            strict_scalar(ScalarKind::Uint64, &json!("-1")),
            Err(Mismatch::Type)
        ));
    }

    #[test]
    fn test_coerce_booleans() {
        for input in [json!("true"), json!("TRUE"), json!("1"), json!(1)] {
            assert_eq!(
                coerce_scalar(ScalarKind::Boolean, &input),
                Some(Value::Boolean(true))
            );
        }
        for input in [json!("false"), json!("FALSE"), json!("0"), json!(0)] {
            assert_eq!(
                coerce_scalar(ScalarKind::Boolean, &input),
                Some(Value::Boolean(false))
            );
        }
        assert_eq!(coerce_scalar(ScalarKind::Boolean, &json!("yes")), None);
        assert_eq!(coerce_scalar(ScalarKind::Boolean, &json!(2)), None);
    }

    #[test]
    fn test_coerce_timestamp_from_millis() {
        let value = coerce_scalar(ScalarKind::Timestamp, &json!(1_700_000_000_000i64)).unwrap();
        let Value::Timestamp(ts) = value else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_coerce_numbers_from_strings() {
        assert_eq!(
            coerce_scalar(ScalarKind::Float64, &json!("1.5")),
            Some(Value::Float(1.5))
        );
        assert_eq!(
            coerce_scalar(ScalarKind::Uint16, &json!("42")),
            Some(Value::UInt(42))
        );
        assert_eq!(coerce_scalar(ScalarKind::Uint16, &json!("70000")), None);
        assert_eq!(
            coerce_scalar(ScalarKind::Int64, &json!(42)),
            Some(Value::Int(42))
        );
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        let ts = parse_timestamp("2024-01-02T03:04:05.678+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-02T01:04:05.678+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_timestamp_iso_forms() {
        let cases = [
            ("2024-01-02T03:04:05", "2024-01-02T03:04:05+00:00"),
            ("2024-01-02T03:04:05.123+0100", "2024-01-02T02:04:05.123+00:00"),
            ("2024-01-02", "2024-01-02T00:00:00+00:00"),
        ];
        for (input, expected) in cases {
            let ts = parse_timestamp(input).unwrap();
            assert_eq!(ts.to_rfc3339(), expected, "{input}");
        }
        assert!(parse_timestamp("2024-13-02").is_none());
    }

    #[test]
    fn test_coerce_timestamp_from_date_string() {
        let value = coerce_scalar(ScalarKind::Timestamp, &json!("2024-01-02")).unwrap();
        let Value::Timestamp(ts) = value else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }
}
