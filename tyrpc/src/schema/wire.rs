//! JSON wire format for schema nodes.
//!
//! The wire document is read into [`RawSchema`], a permissive mirror of the
//! JSON keys, and then converted into a [`SchemaNode`] in one pass that
//! checks the form rules and records the path of every failure.

use std::collections::HashSet;
use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::{DiscriminatorForm, Form, Metadata, NodeMap, ObjectForm, ScalarKind, SchemaNode};
use crate::error::{SchemaError, SchemaResult};

/// Mirror of the wire keys of one schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Box<RawSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Box<RawSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, RawSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_properties: Option<IndexMap<String, RawSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<IndexMap<String, RawSchema>>,

    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

pub(crate) fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

impl RawSchema {
    /// Wire keywords present on this node, one entry per form.
    fn forms(&self) -> Vec<String> {
        let mut forms = Vec::new();
        if self.type_name.is_some() {
            forms.push("type");
        }
        if self.enum_values.is_some() {
            forms.push("enum");
        }
        if self.properties.is_some() || self.optional_properties.is_some() {
            forms.push("properties");
        }
        if self.elements.is_some() {
            forms.push("elements");
        }
        if self.values.is_some() {
            forms.push("values");
        }
        if self.discriminator.is_some() || self.mapping.is_some() {
            forms.push("discriminator");
        }
        if self.reference.is_some() {
            forms.push("ref");
        }
        forms.into_iter().map(String::from).collect()
    }

    /// Convert into a checked [`SchemaNode`]. `path` locates this node in the
    /// enclosing document and prefixes every error.
    pub fn into_node(self, path: &str) -> SchemaResult<SchemaNode> {
        let forms = self.forms();
        match forms.len() {
            0 => {
                return Err(SchemaError::NoForm {
                    path: path.to_string(),
                })
            }
            1 => {}
            _ => {
                return Err(SchemaError::AmbiguousForm {
                    path: path.to_string(),
                    forms,
                })
            }
        }

        let RawSchema {
            type_name,
            enum_values,
            elements,
            values,
            properties,
            optional_properties,
            additional_properties,
            discriminator,
            mapping,
            reference,
            nullable,
            metadata,
        } = self;

        let form = if let Some(name) = type_name {
            let kind = name
                .parse::<ScalarKind>()
                .map_err(|value| SchemaError::UnknownScalar {
                    path: path.to_string(),
                    value,
                })?;
            Form::Scalar { kind }
        } else if let Some(values) = enum_values {
            check_enum(path, &values)?;
            Form::Enum { values }
        } else if properties.is_some() || optional_properties.is_some() {
            Form::Object(ObjectForm {
                properties: convert_map(path, "properties", properties)?,
                optional_properties: convert_map(path, "optionalProperties", optional_properties)?,
                strict: !additional_properties.unwrap_or(false),
            })
        } else if let Some(element) = elements {
            Form::Array {
                element: Box::new(element.into_node(&join_path(path, "elements"))?),
            }
        } else if let Some(value) = values {
            Form::Record {
                value: Box::new(value.into_node(&join_path(path, "values"))?),
            }
        } else if let Some(target) = reference {
            Form::Ref { target }
        } else {
            let (Some(tag), Some(mapping)) = (discriminator, mapping) else {
                return Err(SchemaError::IncompleteDiscriminator {
                    path: path.to_string(),
                });
            };
            let mapping = convert_map(path, "mapping", Some(mapping))?;
            check_variants(path, &tag, &mapping)?;
            Form::Discriminator(DiscriminatorForm { tag, mapping })
        };

        Ok(SchemaNode {
            form,
            nullable,
            metadata,
        })
    }
}

fn convert_map(
    path: &str,
    key: &str,
    map: Option<IndexMap<String, RawSchema>>,
) -> SchemaResult<NodeMap> {
    let mut nodes = NodeMap::new();
    for (name, raw) in map.unwrap_or_default() {
        let child = join_path(path, &format!("{key}.{name}"));
        nodes.insert(name, raw.into_node(&child)?);
    }
    Ok(nodes)
}

fn check_enum(path: &str, values: &[String]) -> SchemaResult<()> {
    if values.is_empty() {
        return Err(SchemaError::EmptyEnum {
            path: path.to_string(),
        });
    }
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.as_str()) {
            return Err(SchemaError::DuplicateEnumValue {
                path: path.to_string(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

/// Every variant must be an object that leaves the tag field to the union.
pub(crate) fn check_variants(path: &str, tag: &str, mapping: &NodeMap) -> SchemaResult<()> {
    for (value, node) in mapping {
        let variant_path = join_path(path, &format!("mapping.{value}"));
        let Some(object) = node.as_object() else {
            return Err(SchemaError::VariantNotObject {
                path: variant_path,
                tag: value.clone(),
            });
        };
        if object.declares(tag) {
            return Err(SchemaError::TagRedeclared {
                path: variant_path,
                tag: value.clone(),
                field: tag.to_string(),
            });
        }
    }
    Ok(())
}

impl From<SchemaNode> for RawSchema {
    fn from(node: SchemaNode) -> Self {
        let mut raw = RawSchema {
            nullable: node.nullable,
            metadata: node.metadata,
            ..RawSchema::default()
        };
        let to_raw = |map: NodeMap| -> IndexMap<String, RawSchema> {
            map.into_iter().map(|(k, v)| (k, v.into())).collect()
        };
        match node.form {
            Form::Scalar { kind } => raw.type_name = Some(kind.as_str().to_string()),
            Form::Enum { values } => raw.enum_values = Some(values),
            Form::Object(object) => {
                raw.properties = Some(to_raw(object.properties));
                if !object.optional_properties.is_empty() {
                    raw.optional_properties = Some(to_raw(object.optional_properties));
                }
                if !object.strict {
                    raw.additional_properties = Some(true);
                }
            }
            Form::Array { element } => raw.elements = Some(Box::new((*element).into())),
            Form::Record { value } => raw.values = Some(Box::new((*value).into())),
            Form::Discriminator(union) => {
                raw.discriminator = Some(union.tag);
                raw.mapping = Some(to_raw(union.mapping));
            }
            Form::Ref { target } => raw.reference = Some(target),
        }
        raw
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSchema::deserialize(deserializer)?;
        raw.into_node("").map_err(serde::de::Error::custom)
    }
}

/// Convert a `serde_path_to_error` failure into a located [`SchemaError`].
pub(crate) fn located<E: Display>(err: serde_path_to_error::Error<E>) -> SchemaError {
    let path = err.path().to_string();
    let path = if path == "." { String::new() } else { path };
    SchemaError::json(path, err.inner().to_string())
}

impl SchemaNode {
    /// Parse a schema node from JSON text.
    pub fn from_json_str(text: &str) -> SchemaResult<Self> {
        let mut de = serde_json::Deserializer::from_str(text);
        let raw: RawSchema = serde_path_to_error::deserialize(&mut de).map_err(located)?;
        de.end().map_err(|e| SchemaError::json("", e.to_string()))?;
        raw.into_node("")
    }

    /// Parse a schema node from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> SchemaResult<Self> {
        let raw: RawSchema = serde_path_to_error::deserialize(value).map_err(located)?;
        raw.into_node("")
    }

    /// Serialize the node to its wire JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
