//! Type-name derivation and identifier helpers.

use convert_case::{Case, Casing};

/// Derive the type name of a node.
///
/// An explicit `id` wins; otherwise the instance path segments are converted
/// to PascalCase and concatenated (`User/address/Item` becomes
/// `UserAddressItem`). The prefix is applied in both cases.
pub fn type_name(id: Option<&str>, instance_path: &str, prefix: &str) -> String {
    match id {
        Some(id) => format!("{prefix}{id}"),
        None => format!("{prefix}{}", pascal_path(instance_path)),
    }
}

/// PascalCase concatenation of `/`-separated path segments.
pub fn pascal_path(instance_path: &str) -> String {
    instance_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_case(Case::Pascal))
        .collect()
}

/// Whether `name` can be used as a bare identifier or property name.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Quote a string as a JSON (and JavaScript) string literal.
pub fn string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Property name as written in an interface or object literal.
pub fn property_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        string_literal(key)
    }
}

/// Member access expression for `key` on `input`.
pub fn accessor(input: &str, key: &str) -> String {
    if is_identifier(key) {
        format!("{input}.{key}")
    } else {
        format!("{input}[{}]", string_literal(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_from_path() {
        assert_eq!(type_name(None, "User/address", ""), "UserAddress");
        assert_eq!(type_name(None, "Post/tags/Item", "Api"), "ApiPostTagsItem");
        assert_eq!(type_name(Some("Author"), "Post/author", "Api"), "ApiAuthor");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("userId"));
        assert!(is_identifier("$$User"));
        assert!(!is_identifier("first-name"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(accessor("input", "id"), "input.id");
        assert_eq!(accessor("input", "first-name"), r#"input["first-name"]"#);
        assert_eq!(property_key("a b"), r#""a b""#);
    }
}
