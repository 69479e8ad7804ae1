//! Compiled form of a schema.
//!
//! Compilation resolves every reachable `ref` into an index into a flat model
//! table, checks discriminator variants, and precomputes enum and key sets.
//! A [`Program`] is immutable afterwards.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::wire::{check_variants, join_path};
use crate::schema::{Form, Models, ObjectForm, ScalarKind, SchemaNode};

#[derive(Debug)]
pub(crate) struct Program {
    pub root: Node,
    pub models: Vec<Node>,
    pub model_names: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub kind: Kind,
    pub nullable: bool,
}

#[derive(Debug)]
pub(crate) enum Kind {
    Scalar(ScalarKind),
    Enum {
        values: Vec<String>,
        members: HashSet<String>,
    },
    Object(Shape),
    Array(Box<Node>),
    Record(Box<Node>),
    Discriminator {
        tag: String,
        variants: IndexMap<String, Shape>,
    },
    Ref(usize),
}

#[derive(Debug)]
pub(crate) struct Shape {
    pub required: Vec<(String, Node)>,
    pub optional: Vec<(String, Node)>,
    pub known: HashSet<String>,
    pub strict: bool,
}

impl Shape {
    pub fn declares(&self, key: &str) -> bool {
        self.known.contains(key)
    }
}

impl Program {
    pub fn model(&self, index: usize) -> &Node {
        &self.models[index]
    }
}

struct Lowering<'m> {
    models: &'m Models,
    indices: HashMap<String, usize>,
    pending: VecDeque<String>,
}

impl<'m> Lowering<'m> {
    fn index_of(&mut self, target: &str, path: &str) -> SchemaResult<usize> {
        if let Some(index) = self.indices.get(target) {
            return Ok(*index);
        }
        if !self.models.contains_key(target) {
            return Err(SchemaError::unresolved(path, target));
        }
        let index = self.indices.len();
        self.indices.insert(target.to_string(), index);
        self.pending.push_back(target.to_string());
        Ok(index)
    }

    fn lower(&mut self, node: &SchemaNode, path: &str) -> SchemaResult<Node> {
        let kind = match &node.form {
            Form::Scalar { kind } => Kind::Scalar(*kind),
            Form::Enum { values } => Kind::Enum {
                values: values.clone(),
                members: values.iter().cloned().collect(),
            },
            Form::Object(object) => Kind::Object(self.lower_shape(object, path)?),
            Form::Array { element } => {
                Kind::Array(Box::new(self.lower(element, &join_path(path, "elements"))?))
            }
            Form::Record { value } => {
                Kind::Record(Box::new(self.lower(value, &join_path(path, "values"))?))
            }
            Form::Discriminator(union) => {
                check_variants(path, &union.tag, &union.mapping)?;
                let mut variants = IndexMap::new();
                for (tag, variant) in &union.mapping {
                    let variant_path = join_path(path, &format!("mapping.{tag}"));
                    if let Some(object) = variant.as_object() {
                        variants.insert(tag.clone(), self.lower_shape(object, &variant_path)?);
                    }
                }
                Kind::Discriminator {
                    tag: union.tag.clone(),
                    variants,
                }
            }
            Form::Ref { target } => Kind::Ref(self.index_of(target, path)?),
        };
        Ok(Node {
            kind,
            nullable: node.nullable,
        })
    }

    fn lower_shape(&mut self, object: &ObjectForm, path: &str) -> SchemaResult<Shape> {
        let mut required = Vec::with_capacity(object.properties.len());
        for (key, node) in &object.properties {
            let child = self.lower(node, &join_path(path, &format!("properties.{key}")))?;
            required.push((key.clone(), child));
        }
        let mut optional = Vec::with_capacity(object.optional_properties.len());
        for (key, node) in &object.optional_properties {
            let child = self.lower(node, &join_path(path, &format!("optionalProperties.{key}")))?;
            optional.push((key.clone(), child));
        }
        let known = required
            .iter()
            .chain(optional.iter())
            .map(|(key, _)| key.clone())
            .collect();
        Ok(Shape {
            required,
            optional,
            known,
            strict: object.strict,
        })
    }
}

/// Compile a schema and every model reachable from it.
pub(crate) fn lower(schema: &SchemaNode, models: &Models) -> SchemaResult<Program> {
    let mut lowering = Lowering {
        models,
        indices: HashMap::new(),
        pending: VecDeque::new(),
    };
    let root = lowering.lower(schema, "")?;

    // Indices are handed out in discovery order and drained FIFO, so the
    // n-th lowered model lands at index n.
    let mut lowered = Vec::new();
    let mut model_names = Vec::new();
    while let Some(name) = lowering.pending.pop_front() {
        let Some(node) = models.get(&name) else {
            return Err(SchemaError::unresolved("", name));
        };
        let path = format!("models.{name}");
        lowered.push(lowering.lower(node, &path)?);
        model_names.push(name);
    }

    Ok(Program {
        root,
        models: lowered,
        model_names,
    })
}

/// Names of the models reachable from `schema`, in discovery order.
pub(crate) fn reachable_models<'m>(
    schema: &SchemaNode,
    models: &'m Models,
) -> Vec<(&'m str, &'m SchemaNode)> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<String> = schema.references().into_iter().map(|(_, t)| t).collect();
    let mut out = Vec::new();
    while let Some(target) = queue.pop_front() {
        if !seen.insert(target.clone()) {
            continue;
        }
        if let Some((name, node)) = models.get_key_value(&target) {
            out.push((name.as_str(), node));
            queue.extend(node.references().into_iter().map(|(_, t)| t));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_resolves_cycles() {
        let mut models = Models::new();
        models.insert(
            "Node".to_string(),
            SchemaNode::object()
                .property("value", SchemaNode::string())
                .optional_property("next", SchemaNode::reference("Node")),
        );
        let program = lower(&SchemaNode::reference("Node"), &models).unwrap();
        assert_eq!(program.model_names, vec!["Node"]);
        assert!(matches!(program.root.kind, Kind::Ref(0)));
    }

    #[test]
    fn test_lower_only_reachable_models() {
        let mut models = Models::new();
        models.insert(
            "A".to_string(),
            SchemaNode::object().property("b", SchemaNode::reference("B")),
        );
        models.insert("B".to_string(), SchemaNode::object());
        models.insert("Unused".to_string(), SchemaNode::object());

        let program = lower(&SchemaNode::reference("A"), &models).unwrap();
        assert_eq!(program.model_names, vec!["A", "B"]);
        assert_eq!(
            reachable_models(&SchemaNode::reference("A"), &models)
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[test]
    fn test_lower_unresolved_ref() {
        let schema = SchemaNode::object().property("owner", SchemaNode::reference("Ghost"));
        let err = lower(&schema, &Models::new()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedRef {
                path: "properties.owner".to_string(),
                target: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_lower_rejects_non_object_variant() {
        let schema = SchemaNode::discriminator("type").variant("A", SchemaNode::string());
        let err = lower(&schema, &Models::new()).unwrap_err();
        assert!(matches!(err, SchemaError::VariantNotObject { tag, .. } if tag == "A"));
    }
}
