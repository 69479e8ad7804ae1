//! Schema node model.
//!
//! A [`SchemaNode`] is one unit of the type-definition IR. Its [`Form`] is a
//! closed sum type with one case per JSON Type Definition form, built once at
//! parse time from the wire JSON (see [`wire`]). Every node additionally
//! carries a nullable flag and [`Metadata`].
//!
//! # Example
//!
//! ```rust
//! use tyrpc::schema::SchemaNode;
//!
//! let user = SchemaNode::object()
//!     .property("id", SchemaNode::string())
//!     .optional_property("bio", SchemaNode::string().nullable())
//!     .with_id("User");
//!
//! assert!(user.is_object());
//! assert_eq!(user.type_id(), Some("User"));
//! ```

pub mod wire;

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping of property or variant name to schema node.
pub type NodeMap = IndexMap<String, SchemaNode>;

/// Named model arena. References resolve by lookup in this map.
pub type Models = IndexMap<String, SchemaNode>;

/// One schema node: a form plus the modifiers shared by every form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "wire::RawSchema")]
pub struct SchemaNode {
    /// The node's form.
    pub form: Form,

    /// Whether the value may be the null literal.
    pub nullable: bool,

    /// Descriptive metadata.
    pub metadata: Metadata,
}

/// The closed set of schema forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// A primitive value.
    Scalar { kind: ScalarKind },

    /// One of a fixed, ordered set of strings.
    Enum { values: Vec<String> },

    /// An object with required and optional properties.
    Object(ObjectForm),

    /// A homogeneous sequence.
    Array { element: Box<SchemaNode> },

    /// A homogeneous string-keyed map.
    Record { value: Box<SchemaNode> },

    /// A tagged union of object variants.
    Discriminator(DiscriminatorForm),

    /// A named reference into the model arena.
    Ref { target: String },
}

/// Properties of an object form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectForm {
    /// Properties whose key must be present.
    pub properties: NodeMap,

    /// Properties whose key may be absent.
    pub optional_properties: NodeMap,

    /// Reject keys that are not declared.
    pub strict: bool,
}

impl ObjectForm {
    /// Look up a declared property, required or optional.
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.properties
            .get(key)
            .or_else(|| self.optional_properties.get(key))
    }

    /// Whether the key is declared at all.
    pub fn declares(&self, key: &str) -> bool {
        self.properties.contains_key(key) || self.optional_properties.contains_key(key)
    }

    /// Total number of declared properties.
    pub fn len(&self) -> usize {
        self.properties.len() + self.optional_properties.len()
    }

    /// Whether no properties are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tag field and variants of a discriminator form.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorForm {
    /// Name of the field carrying the variant tag.
    pub tag: String,

    /// Tag value to variant. Every variant is an object node.
    pub mapping: NodeMap,
}

/// Scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Boolean,
    String,
    Timestamp,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl ScalarKind {
    /// All scalar kinds, in wire order.
    pub const ALL: [ScalarKind; 13] = [
        ScalarKind::Boolean,
        ScalarKind::String,
        ScalarKind::Timestamp,
        ScalarKind::Float32,
        ScalarKind::Float64,
        ScalarKind::Int8,
        ScalarKind::Int16,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint8,
        ScalarKind::Uint16,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
    ];

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::String => "string",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint8 => "uint8",
            ScalarKind::Uint16 => "uint16",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
        }
    }

    /// Whether the kind is an integer kind.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarKind::Int8
                | ScalarKind::Int16
                | ScalarKind::Int32
                | ScalarKind::Int64
                | ScalarKind::Uint8
                | ScalarKind::Uint16
                | ScalarKind::Uint32
                | ScalarKind::Uint64
        )
    }

    /// Whether the kind is a float kind.
    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::Float32 | ScalarKind::Float64)
    }

    /// 64-bit integers travel on the wire as decimal strings.
    pub fn is_64_bit(&self) -> bool {
        matches!(self, ScalarKind::Int64 | ScalarKind::Uint64)
    }

    /// Inclusive range of a signed integer kind.
    pub fn signed_range(&self) -> Option<(i64, i64)> {
        match self {
            ScalarKind::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            ScalarKind::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            ScalarKind::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            ScalarKind::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Inclusive upper bound of an unsigned integer kind.
    pub fn unsigned_max(&self) -> Option<u64> {
        match self {
            ScalarKind::Uint8 => Some(u8::MAX as u64),
            ScalarKind::Uint16 => Some(u16::MAX as u64),
            ScalarKind::Uint32 => Some(u32::MAX as u64),
            ScalarKind::Uint64 => Some(u64::MAX),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Descriptive metadata attached to a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Explicit type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the type or field is deprecated.
    #[serde(
        default,
        rename = "isDeprecated",
        alias = "deprecated",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub deprecated: bool,
}

impl Metadata {
    /// Check if metadata is empty (no values set).
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.description.is_none() && !self.deprecated
    }
}

impl SchemaNode {
    /// Wrap a form with default modifiers.
    pub fn new(form: Form) -> Self {
        Self {
            form,
            nullable: false,
            metadata: Metadata::default(),
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(Form::Scalar { kind })
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn timestamp() -> Self {
        Self::scalar(ScalarKind::Timestamp)
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Form::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Create an empty strict object.
    pub fn object() -> Self {
        Self::new(Form::Object(ObjectForm {
            strict: true,
            ..ObjectForm::default()
        }))
    }

    pub fn array(element: SchemaNode) -> Self {
        Self::new(Form::Array {
            element: Box::new(element),
        })
    }

    pub fn record(value: SchemaNode) -> Self {
        Self::new(Form::Record {
            value: Box::new(value),
        })
    }

    /// Create a discriminator with no variants yet.
    pub fn discriminator(tag: impl Into<String>) -> Self {
        Self::new(Form::Discriminator(DiscriminatorForm {
            tag: tag.into(),
            mapping: NodeMap::new(),
        }))
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(Form::Ref {
            target: target.into(),
        })
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Add a required property. No effect on non-object nodes.
    pub fn property(mut self, key: impl Into<String>, node: SchemaNode) -> Self {
        if let Form::Object(object) = &mut self.form {
            object.properties.insert(key.into(), node);
        }
        self
    }

    /// Add an optional property. No effect on non-object nodes.
    pub fn optional_property(mut self, key: impl Into<String>, node: SchemaNode) -> Self {
        if let Form::Object(object) = &mut self.form {
            object.optional_properties.insert(key.into(), node);
        }
        self
    }

    /// Allow undeclared keys on an object node.
    pub fn allow_additional(mut self) -> Self {
        if let Form::Object(object) = &mut self.form {
            object.strict = false;
        }
        self
    }

    /// Add a variant to a discriminator node. The variant must be an object.
    pub fn variant(mut self, tag: impl Into<String>, node: SchemaNode) -> Self {
        if let Form::Discriminator(union) = &mut self.form {
            union.mapping.insert(tag.into(), node);
        }
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.metadata.deprecated = true;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Wire keyword of the node's form.
    pub fn form_name(&self) -> &'static str {
        match &self.form {
            Form::Scalar { .. } => "type",
            Form::Enum { .. } => "enum",
            Form::Object(_) => "properties",
            Form::Array { .. } => "elements",
            Form::Record { .. } => "values",
            Form::Discriminator(_) => "discriminator",
            Form::Ref { .. } => "ref",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.form, Form::Object(_))
    }

    pub fn as_object(&self) -> Option<&ObjectForm> {
        match &self.form {
            Form::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Explicit type name from metadata.
    pub fn type_id(&self) -> Option<&str> {
        self.metadata.id.as_deref()
    }

    /// Canonical JSON text of the node, used as its structural identity.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Visit this node and every descendant in pre-order.
    ///
    /// The callback receives the schema path of each node relative to `path`,
    /// with segments joined by `.` (for example `properties.tags.elements`).
    pub fn walk<'a, F>(&'a self, path: &str, visit: &mut F)
    where
        F: FnMut(&str, &'a SchemaNode),
    {
        visit(path, self);
        let child = |segment: &str| {
            if path.is_empty() {
                segment.to_string()
            } else {
                format!("{path}.{segment}")
            }
        };
        match &self.form {
            Form::Scalar { .. } | Form::Enum { .. } | Form::Ref { .. } => {}
            Form::Object(object) => {
                for (key, node) in &object.properties {
                    node.walk(&child(&format!("properties.{key}")), visit);
                }
                for (key, node) in &object.optional_properties {
                    node.walk(&child(&format!("optionalProperties.{key}")), visit);
                }
            }
            Form::Array { element } => element.walk(&child("elements"), visit),
            Form::Record { value } => value.walk(&child("values"), visit),
            Form::Discriminator(union) => {
                for (tag, node) in &union.mapping {
                    node.walk(&child(&format!("mapping.{tag}")), visit);
                }
            }
        }
    }

    /// Every `ref` target below this node, with its schema path.
    pub fn references(&self) -> Vec<(String, String)> {
        let mut refs = Vec::new();
        self.walk("", &mut |path, node| {
            if let Form::Ref { target } = &node.form {
                refs.push((path.to_string(), target.clone()));
            }
        });
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kind_round_trip_names() {
        for kind in ScalarKind::ALL {
            assert_eq!(kind.as_str().parse::<ScalarKind>(), Ok(kind));
        }
        assert!("int128".parse::<ScalarKind>().is_err());
    }

    #[test]
    fn test_scalar_kind_ranges() {
        assert_eq!(ScalarKind::Int8.signed_range(), Some((-128, 127)));
        assert_eq!(ScalarKind::Uint16.unsigned_max(), Some(65535));
        assert_eq!(ScalarKind::String.signed_range(), None);
        assert!(ScalarKind::Uint64.is_64_bit());
        assert!(!ScalarKind::Int32.is_64_bit());
    }

    #[test]
    fn test_builder_object() {
        let node = SchemaNode::object()
            .property("id", SchemaNode::string())
            .optional_property("bio", SchemaNode::string().nullable());

        let object = node.as_object().unwrap();
        assert!(object.strict);
        assert_eq!(object.len(), 2);
        assert!(object.declares("bio"));
        assert!(object.get("bio").unwrap().nullable);
        assert!(!object.declares("name"));
    }

    #[test]
    fn test_builder_ignores_mismatched_form() {
        let node = SchemaNode::string().property("id", SchemaNode::string());
        assert_eq!(node, SchemaNode::string());
    }

    #[test]
    fn test_metadata_builders() {
        let node = SchemaNode::object()
            .with_id("User")
            .with_description("A user")
            .deprecated();
        assert_eq!(node.type_id(), Some("User"));
        assert_eq!(node.metadata.description.as_deref(), Some("A user"));
        assert!(node.metadata.deprecated);
        assert!(!node.metadata.is_empty());
        assert!(Metadata::default().is_empty());
    }

    #[test]
    fn test_references_collects_paths() {
        let node = SchemaNode::object()
            .property("author", SchemaNode::reference("User"))
            .optional_property("replies", SchemaNode::array(SchemaNode::reference("Post")));

        assert_eq!(
            node.references(),
            vec![
                ("properties.author".to_string(), "User".to_string()),
                (
                    "optionalProperties.replies.elements".to_string(),
                    "Post".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_shapes() {
        let a = SchemaNode::object().property("id", SchemaNode::string());
        let b = SchemaNode::object().property("id", SchemaNode::boolean());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }
}
