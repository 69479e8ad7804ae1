//! Property-based tests for naming and the name registry.

use proptest::prelude::*;
use tyrpc::SchemaNode;
use tyrpc_codegen::naming::{pascal_path, type_name};
use tyrpc_codegen::NameRegistry;

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-D][a-c]{0,2}", 1..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Each distinct name registers exactly once, and `names()` keeps the
    /// order of first registration.
    #[test]
    fn prop_first_registration_wins(names in arb_names()) {
        let mut registry = NameRegistry::new();
        let mut expected: Vec<String> = Vec::new();
        for name in &names {
            let first = !expected.contains(name);
            prop_assert_eq!(registry.register(name), first);
            if first {
                expected.push(name.clone());
            }
        }
        let registered: Vec<String> = registry.names().map(str::to_string).collect();
        prop_assert_eq!(registered, expected);
    }

    /// Re-registering a name with the same shape is never a conflict, even
    /// in strict mode.
    #[test]
    fn prop_strict_accepts_identical_shapes(names in arb_names()) {
        let node = SchemaNode::object().property("id", SchemaNode::string());
        let mut registry = NameRegistry::strict();
        for name in &names {
            prop_assert!(registry.register_node(name, &node, "/models/X").is_ok());
        }
    }

    /// Derived names are prefix + PascalCase path and never contain `/`.
    #[test]
    fn prop_type_names_are_flat(
        segments in prop::collection::vec("[a-z]{1,6}", 1..5),
        prefix in "[A-Z][a-z]{0,3}",
    ) {
        let path = segments.join("/");
        let name = type_name(None, &path, &prefix);
        prop_assert!(!name.contains('/'));
        prop_assert!(name.starts_with(&prefix));
        prop_assert_eq!(name, format!("{prefix}{}", pascal_path(&path)));
    }
}
