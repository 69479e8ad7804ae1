//! Traversal engine.
//!
//! The engine walks a schema node depth-first, derives type names, threads
//! instance and schema paths, consults the [`NameRegistry`] and hands each
//! node to the [`Backend`] once its children are generated. It never emits
//! target-language text itself.
//!
//! Paths used for child nodes:
//!
//! | Form | Instance path | Schema path |
//! |------|---------------|-------------|
//! | property `k` | `parent/k` | `…/properties/k` or `…/optionalProperties/k` |
//! | array element | `parent/Item` | `…/elements` |
//! | record value | `parent/Value` | `…/values` |
//! | variant `T` | `parent/T` | `…/mapping/T` |

use tyrpc::schema::{DiscriminatorForm, ObjectForm};
use tyrpc::{Form, Models, SchemaError, SchemaNode};

use crate::backend::{Backend, NodeContext, Property, TagField, Variant};
use crate::bundle::CodeBundle;
use crate::error::{CodegenError, CodegenResult};
use crate::naming;
use crate::registry::NameRegistry;

/// Location of the node being generated.
#[derive(Clone, Copy)]
struct Site<'s> {
    key: Option<&'s str>,
    optional: bool,
    instance_path: &'s str,
    schema_path: &'s str,
}

/// Backend-agnostic traversal over one model arena.
pub struct Engine<'a> {
    backend: &'a dyn Backend,
    models: &'a Models,
}

impl<'a> Engine<'a> {
    pub fn new(backend: &'a dyn Backend, models: &'a Models) -> Self {
        Self { backend, models }
    }

    /// A fresh registry matching the backend's strictness setting.
    pub fn registry(&self) -> NameRegistry {
        if self.backend.config().strict_names {
            NameRegistry::strict()
        } else {
            NameRegistry::new()
        }
    }

    /// Type name of `node` found at `instance_path`.
    pub fn type_name(&self, node: &SchemaNode, instance_path: &str) -> String {
        naming::type_name(
            node.type_id(),
            instance_path,
            &self.backend.config().type_prefix,
        )
    }

    /// Type name a `ref` to `target` resolves to.
    pub fn model_type_name(&self, target: &str) -> Option<String> {
        self.models
            .get(target)
            .map(|node| self.type_name(node, target))
    }

    /// Generate a node and everything below it.
    pub fn generate(
        &self,
        node: &SchemaNode,
        instance_path: &str,
        schema_path: &str,
        registry: &mut NameRegistry,
    ) -> CodegenResult<CodeBundle> {
        let site = Site {
            key: None,
            optional: false,
            instance_path,
            schema_path,
        };
        self.node(node, site, registry)
    }

    /// Generate every model of the arena, in arena order.
    #[tracing::instrument(skip_all, fields(backend = self.backend.id(), models = self.models.len()))]
    pub fn generate_models(&self, registry: &mut NameRegistry) -> CodegenResult<Vec<CodeBundle>> {
        let mut bundles = Vec::with_capacity(self.models.len());
        for (key, node) in self.models {
            let schema_path = pointer("/models", key);
            bundles.push(self.generate(node, key, &schema_path, registry)?);
        }
        tracing::debug!(types = registry.len(), "generated models");
        Ok(bundles)
    }

    fn node(
        &self,
        node: &SchemaNode,
        site: Site<'_>,
        registry: &mut NameRegistry,
    ) -> CodegenResult<CodeBundle> {
        let type_name = match &node.form {
            Form::Ref { target } => self
                .model_type_name(target)
                .ok_or_else(|| CodegenError::unresolved(site.schema_path, target.as_str()))?,
            _ => self.type_name(node, site.instance_path),
        };
        let ctx = NodeContext {
            key: site.key.map(str::to_string),
            optional: site.optional,
            nullable: node.nullable,
            metadata: node.metadata.clone(),
            instance_path: site.instance_path.to_string(),
            schema_path: site.schema_path.to_string(),
            type_name,
        };
        tracing::trace!(path = %ctx.instance_path, form = node.form_name(), "generating node");

        match &node.form {
            Form::Scalar { kind } => Ok(self.backend.scalar(&ctx, *kind)),
            Form::Enum { values } => {
                if !registry.register_node(&ctx.type_name, node, &ctx.schema_path)? {
                    return Ok(self.backend.reference(&ctx));
                }
                Ok(self.backend.enumeration(&ctx, values))
            }
            Form::Object(object) => {
                if !registry.register_node(&ctx.type_name, node, &ctx.schema_path)? {
                    return Ok(self.backend.reference(&ctx));
                }
                self.object(&ctx, object, None, registry)
            }
            Form::Array { element } => {
                let instance_path = join(site.instance_path, "Item");
                let schema_path = format!("{}/elements", site.schema_path);
                let child = self.node(element, child_site(&instance_path, &schema_path), registry)?;
                let nested = child.declarations();
                Ok(self.backend.array(&ctx, &child).with_sub_declarations(nested))
            }
            Form::Record { value } => {
                let instance_path = join(site.instance_path, "Value");
                let schema_path = format!("{}/values", site.schema_path);
                let child = self.node(value, child_site(&instance_path, &schema_path), registry)?;
                let nested = child.declarations();
                Ok(self.backend.record(&ctx, &child).with_sub_declarations(nested))
            }
            Form::Discriminator(union) => {
                if !registry.register_node(&ctx.type_name, node, &ctx.schema_path)? {
                    return Ok(self.backend.reference(&ctx));
                }
                self.discriminator(&ctx, union, registry)
            }
            Form::Ref { .. } => Ok(self.backend.reference(&ctx)),
        }
    }

    fn object(
        &self,
        ctx: &NodeContext,
        object: &ObjectForm,
        tag: Option<&TagField>,
        registry: &mut NameRegistry,
    ) -> CodegenResult<CodeBundle> {
        let fields = object
            .properties
            .iter()
            .map(|(key, node)| (key, node, false))
            .chain(
                object
                    .optional_properties
                    .iter()
                    .map(|(key, node)| (key, node, true)),
            );

        let mut properties = Vec::with_capacity(object.len());
        let mut nested = Vec::new();
        for (key, node, optional) in fields {
            let section = if optional {
                "optionalProperties"
            } else {
                "properties"
            };
            let instance_path = join(&ctx.instance_path, key);
            let schema_path = pointer(&format!("{}/{section}", ctx.schema_path), key);
            let site = Site {
                key: Some(key),
                optional,
                instance_path: &instance_path,
                schema_path: &schema_path,
            };
            let bundle = self.node(node, site, registry)?;
            nested.extend(bundle.declarations());
            properties.push(Property {
                key: key.clone(),
                optional,
                metadata: node.metadata.clone(),
                bundle,
            });
        }

        Ok(self
            .backend
            .object(ctx, &properties, tag)
            .with_sub_declarations(nested))
    }

    fn discriminator(
        &self,
        ctx: &NodeContext,
        union: &DiscriminatorForm,
        registry: &mut NameRegistry,
    ) -> CodegenResult<CodeBundle> {
        let mut variants = Vec::with_capacity(union.mapping.len());
        let mut nested = Vec::new();
        for (tag_value, variant) in &union.mapping {
            let schema_path = pointer(&format!("{}/mapping", ctx.schema_path), tag_value);
            let Some(object) = variant.as_object() else {
                return Err(SchemaError::VariantNotObject {
                    path: schema_path,
                    tag: tag_value.clone(),
                }
                .into());
            };
            if object.declares(&union.tag) {
                return Err(SchemaError::TagRedeclared {
                    path: schema_path,
                    tag: tag_value.clone(),
                    field: union.tag.clone(),
                }
                .into());
            }

            let instance_path = join(&ctx.instance_path, tag_value);
            let variant_ctx = NodeContext {
                key: None,
                optional: false,
                nullable: false,
                metadata: variant.metadata.clone(),
                type_name: self.type_name(variant, &instance_path),
                instance_path,
                schema_path,
            };
            let bundle =
                if registry.register_node(&variant_ctx.type_name, variant, &variant_ctx.schema_path)? {
                    let tag = TagField {
                        key: union.tag.clone(),
                        value: tag_value.clone(),
                    };
                    self.object(&variant_ctx, object, Some(&tag), registry)?
                } else {
                    self.backend.reference(&variant_ctx)
                };
            nested.extend(bundle.declarations());
            variants.push(Variant {
                tag_value: tag_value.clone(),
                bundle,
            });
        }

        Ok(self
            .backend
            .discriminator(ctx, &union.tag, &variants)
            .with_sub_declarations(nested))
    }
}

fn child_site<'s>(instance_path: &'s str, schema_path: &'s str) -> Site<'s> {
    Site {
        key: None,
        optional: false,
        instance_path,
        schema_path,
    }
}

fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

/// Append a key to a JSON pointer, escaping `~` and `/`.
fn pointer(base: &str, key: &str) -> String {
    format!("{base}/{}", key.replace('~', "~0").replace('/', "~1"))
}
