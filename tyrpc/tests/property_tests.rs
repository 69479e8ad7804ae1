//! Property-based tests for tyrpc.
//!
//! Properties tested:
//! - Scalar round-trip: decoding an encoded scalar yields the same value
//! - 64-bit precision: integers beyond 2^53 survive the wire
//! - Procedure tree round-trip: flatten(unflatten(p)) == p

use chrono::DateTime;
use indexmap::IndexMap;
use proptest::prelude::*;

use tyrpc::schema::{Models, ScalarKind};
use tyrpc::{flatten, unflatten, HttpMethod, RpcDefinition, SchemaNode, Validator, Value};

// =============================================================================
// Generators for property tests
// =============================================================================

/// A scalar kind paired with a value representable in it.
fn arb_scalar() -> impl Strategy<Value = (ScalarKind, Value)> {
    prop_oneof![
        any::<bool>().prop_map(|b| (ScalarKind::Boolean, Value::Boolean(b))),
        ".{0,24}".prop_map(|s| (ScalarKind::String, Value::String(s))),
        (0i64..4_102_444_800_000).prop_map(|ms| {
            let ts = DateTime::from_timestamp_millis(ms).unwrap_or_default();
            (ScalarKind::Timestamp, Value::Timestamp(ts))
        }),
        // Binary fractions print and parse exactly.
        (-1_000_000i32..1_000_000).prop_map(|n| (ScalarKind::Float32, Value::Float(n as f64 / 4.0))),
        (-1_000_000i32..1_000_000).prop_map(|n| (ScalarKind::Float64, Value::Float(n as f64 / 8.0))),
        any::<i8>().prop_map(|n| (ScalarKind::Int8, Value::Int(n.into()))),
        any::<u8>().prop_map(|n| (ScalarKind::Uint8, Value::UInt(n.into()))),
        any::<i16>().prop_map(|n| (ScalarKind::Int16, Value::Int(n.into()))),
        any::<u16>().prop_map(|n| (ScalarKind::Uint16, Value::UInt(n.into()))),
        any::<i32>().prop_map(|n| (ScalarKind::Int32, Value::Int(n.into()))),
        any::<u32>().prop_map(|n| (ScalarKind::Uint32, Value::UInt(n.into()))),
        any::<i64>().prop_map(|n| (ScalarKind::Int64, Value::Int(n))),
        any::<u64>().prop_map(|n| (ScalarKind::Uint64, Value::UInt(n))),
    ]
}

/// A procedure map where no key is a prefix of another.
///
/// Services are named from `a`-`c` and leaf procedures from `d`-`z`, so a
/// leaf can never share its name with a service at the same level.
fn arb_procedures() -> impl Strategy<Value = IndexMap<String, RpcDefinition>> {
    let leaf = "[d-z][a-z]{0,5}";
    let key = prop_oneof![
        leaf.prop_map(|l| l),
        ("[a-c]", leaf).prop_map(|(s, l)| format!("{s}.{l}")),
        ("[a-c]", "[a-c]", leaf).prop_map(|(s, t, l)| format!("{s}.{t}.{l}")),
    ];
    prop::collection::vec(key, 1..20).prop_map(|keys| {
        keys.into_iter()
            .map(|key| {
                let path = format!("/{}", key.replace('.', "/"));
                (key, RpcDefinition::new(path, HttpMethod::Post))
            })
            .collect()
    })
}

// =============================================================================
// Scalar round-trip
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_scalar_round_trip((kind, value) in arb_scalar()) {
        let validator = Validator::compile(&SchemaNode::scalar(kind), &Models::new()).unwrap();
        let wire = validator.encode_value(&value).unwrap();
        prop_assert_eq!(validator.decode(&wire).unwrap(), value.clone());
        prop_assert!(validator.validate(&value));
    }

    #[test]
    fn prop_64_bit_travels_as_string(n in (1i64 << 53)..i64::MAX) {
        let validator =
            Validator::compile(&SchemaNode::scalar(ScalarKind::Int64), &Models::new()).unwrap();
        let wire = validator.encode_value(&Value::Int(n)).unwrap();
        let expected = n.to_string();
        prop_assert_eq!(wire.as_str(), Some(expected.as_str()));
        prop_assert_eq!(validator.decode(&wire).unwrap(), Value::Int(n));
    }
}

// =============================================================================
// Procedure tree round-trip
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_flatten_inverts_unflatten(procedures in arb_procedures()) {
        let tree = unflatten(&procedures).unwrap();
        prop_assert_eq!(flatten(&tree), procedures);
    }
}
