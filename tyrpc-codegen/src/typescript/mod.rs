//! TypeScript backend.
//!
//! Every named type is emitted as a type declaration plus a `$$Name` helper
//! object:
//!
//! ```typescript
//! export interface User {
//!   id: string;
//!   bio?: string;
//! }
//! export const $$User = {
//!   validate(input: unknown): input is User { ... },
//!   parse(input: unknown): User { ... },
//!   serialize(input: User): string { ... },
//! };
//! ```
//!
//! `parse` is lenient: malformed values fall back to type defaults, and only
//! an unknown discriminator tag throws. `serialize` writes wire JSON with
//! 64-bit integers as quoted decimal strings.

mod client;

pub use client::{plugin, TypeScriptClientGenerator};

use tyrpc::{Metadata, ScalarKind};

use crate::backend::{Backend, GeneratorConfig, NodeContext, Property, TagField, Variant};
use crate::bundle::CodeBundle;
use crate::naming::{accessor, property_key, string_literal};

/// Identifier of the TypeScript generator.
pub const ID: &str = "typescript";

/// TypeScript emitter.
#[derive(Debug, Clone, Default)]
pub struct TypeScriptBackend {
    config: GeneratorConfig,
}

impl TypeScriptBackend {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// JSDoc block for `metadata`, indented to `depth`.
    pub(super) fn doc_comment(&self, metadata: &Metadata, depth: usize) -> String {
        if !self.config.generate_docs {
            return String::new();
        }
        let mut lines = Vec::new();
        if let Some(description) = &metadata.description {
            lines.extend(description.lines().map(|line| line.replace("*/", "*\\/")));
        }
        if metadata.deprecated {
            lines.push("@deprecated".to_string());
        }
        if lines.is_empty() {
            return String::new();
        }
        let pad = self.config.indent(depth);
        let mut out = format!("{pad}/**\n");
        for line in lines {
            out.push_str(&format!("{pad} * {line}\n"));
        }
        out.push_str(&format!("{pad} */\n"));
        out
    }

    /// The `$$Name` helper object with the given method bodies.
    fn helper(&self, name: &str, validate: &[String], parse: &[String], serialize: &[String]) -> String {
        let i1 = self.config.indent(1);
        let body = |lines: &[String]| {
            lines
                .iter()
                .map(|line| format!("{i1}{i1}{line}\n"))
                .collect::<String>()
        };
        format!(
            "export const $${name} = {{\n\
             {i1}validate(input: unknown): input is {name} {{\n{}{i1}}},\n\
             {i1}parse(input: unknown): {name} {{\n{}{i1}}},\n\
             {i1}serialize(input: {name}): string {{\n{}{i1}}},\n\
             }};",
            body(validate),
            body(parse),
            body(serialize),
        )
    }
}

/// Bundle for a use of the named type `ctx.type_name`.
fn named(ctx: &NodeContext) -> CodeBundle {
    let name = ctx.type_name.clone();
    let field = if ctx.nullable {
        format!("{name} | null")
    } else {
        name.clone()
    };
    let (parse_name, serialize_name, validate_name) = (name.clone(), name.clone(), name.clone());
    let bundle = CodeBundle::new(name, field);
    if ctx.nullable {
        bundle
            .with_parse(move |v| format!("({v} === null || {v} === undefined ? null : $${parse_name}.parse({v}))"))
            .with_serialize(move |v| format!("({v} === null ? \"null\" : $${serialize_name}.serialize({v}))"))
            .with_validate(move |v| format!("({v} === null || $${validate_name}.validate({v}))"))
    } else {
        bundle
            .with_parse(move |v| format!("$${parse_name}.parse({v})"))
            .with_serialize(move |v| format!("$${serialize_name}.serialize({v})"))
            .with_validate(move |v| format!("$${validate_name}.validate({v})"))
    }
}

/// Wrap unnamed templates with a null branch when the node is nullable.
fn with_null_branch(
    bundle: CodeBundle,
    nullable: bool,
    validate: impl Fn(&str) -> String + Send + Sync + 'static,
    serialize: impl Fn(&str) -> String + Send + Sync + 'static,
) -> CodeBundle {
    if nullable {
        bundle
            .with_validate(move |v| format!("({} || {v} === null)", validate(v)))
            .with_serialize(move |v| format!("({v} === null ? \"null\" : {})", serialize(v)))
    } else {
        bundle.with_validate(validate).with_serialize(serialize)
    }
}

struct ScalarShape {
    ts_type: &'static str,
    /// Whether the input can be converted.
    accepts: fn(&str, ScalarKind) -> String,
    convert: fn(&str) -> String,
    default: &'static str,
    validate: fn(&str, ScalarKind) -> String,
    serialize: fn(&str) -> String,
}

fn scalar_shape(kind: ScalarKind) -> ScalarShape {
    fn json(v: &str) -> String {
        format!("JSON.stringify({v})")
    }
    fn same(v: &str) -> String {
        v.to_string()
    }
    fn type_check(v: &str, kind: ScalarKind) -> String {
        let js = match kind {
            ScalarKind::Boolean => "boolean",
            ScalarKind::String => "string",
            _ => "number",
        };
        format!("typeof {v} === \"{js}\"")
    }
    fn integer(v: &str, _: ScalarKind) -> String {
        format!("typeof {v} === \"number\" && Number.isInteger({v})")
    }
    fn bounded(v: &str, kind: ScalarKind) -> String {
        let (min, max) = match (kind.signed_range(), kind.unsigned_max()) {
            (Some((min, max)), _) => (min.to_string(), max.to_string()),
            (None, Some(max)) => ("0".to_string(), max.to_string()),
            (None, None) => return integer(v, kind),
        };
        if kind.is_64_bit() {
            format!("typeof {v} === \"bigint\" && {v} >= BigInt(\"{min}\") && {v} <= BigInt(\"{max}\")")
        } else {
            format!("{} && {v} >= {min} && {v} <= {max}", integer(v, kind))
        }
    }

    match kind {
        ScalarKind::Boolean => ScalarShape {
            ts_type: "boolean",
            accepts: type_check,
            convert: same,
            default: "false",
            validate: type_check,
            serialize: |v| format!("({v} ? \"true\" : \"false\")"),
        },
        ScalarKind::String => ScalarShape {
            ts_type: "string",
            accepts: type_check,
            convert: same,
            default: "\"\"",
            validate: type_check,
            serialize: json,
        },
        ScalarKind::Timestamp => ScalarShape {
            ts_type: "Date",
            accepts: |v, _| format!("(typeof {v} === \"string\" || {v} instanceof Date)"),
            convert: |v| format!("new Date({v})"),
            default: "new Date(0)",
            validate: |v, _| format!("{v} instanceof Date"),
            serialize: |v| format!("JSON.stringify({v}.toISOString())"),
        },
        ScalarKind::Float32 | ScalarKind::Float64 => ScalarShape {
            ts_type: "number",
            accepts: type_check,
            convert: same,
            default: "0",
            validate: type_check,
            serialize: json,
        },
        ScalarKind::Int64 | ScalarKind::Uint64 => ScalarShape {
            ts_type: "bigint",
            accepts: |v, kind| {
                let digits = if kind == ScalarKind::Int64 { "/^-?\\d+$/" } else { "/^\\d+$/" };
                format!("((typeof {v} === \"string\" && {digits}.test({v})) || typeof {v} === \"bigint\")")
            },
            convert: |v| format!("BigInt({v})"),
            default: "BigInt(0)",
            validate: bounded,
            serialize: |v| format!("JSON.stringify({v}.toString())"),
        },
        _ => ScalarShape {
            ts_type: "number",
            accepts: integer,
            convert: same,
            default: "0",
            validate: bounded,
            serialize: json,
        },
    }
}

impl Backend for TypeScriptBackend {
    fn id(&self) -> &'static str {
        ID
    }

    fn name(&self) -> &'static str {
        "TypeScript Client Generator"
    }

    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn scalar(&self, ctx: &NodeContext, kind: ScalarKind) -> CodeBundle {
        let shape = scalar_shape(kind);
        let field = if ctx.nullable {
            format!("{} | null", shape.ts_type)
        } else {
            shape.ts_type.to_string()
        };
        let fallback = if ctx.nullable { "null" } else { shape.default };
        let ScalarShape {
            accepts,
            convert,
            validate,
            serialize,
            ..
        } = shape;

        let bundle = CodeBundle::new(kind.as_str(), field)
            .with_parse(move |v| format!("({} ? {} : {fallback})", accepts(v, kind), convert(v)));
        with_null_branch(bundle, ctx.nullable, move |v| validate(v, kind), serialize)
    }

    fn enumeration(&self, ctx: &NodeContext, values: &[String]) -> CodeBundle {
        let name = &ctx.type_name;
        let literals: Vec<String> = values.iter().map(|v| string_literal(v)).collect();
        let first = literals.first().cloned().unwrap_or_else(|| "\"\"".to_string());

        let declaration = format!(
            "{}export type {name} = {};\n{}",
            self.doc_comment(&ctx.metadata, 0),
            literals.join(" | "),
            self.helper(
                name,
                &[format!("return typeof input === \"string\" && [{}].includes(input);", literals.join(", "))],
                &[format!("return $${name}.validate(input) ? input : {first};")],
                &["return JSON.stringify(input);".to_string()],
            ),
        );
        named(ctx).with_declaration(declaration)
    }

    fn object(&self, ctx: &NodeContext, properties: &[Property], tag: Option<&TagField>) -> CodeBundle {
        let name = &ctx.type_name;
        let i1 = self.config.indent(1);

        let mut fields = Vec::new();
        let mut checks = vec!["isObject(input)".to_string()];
        let mut assigned = Vec::new();
        let mut optional_parse = Vec::new();
        let mut parts = Vec::new();

        if let Some(tag) = tag {
            let value = string_literal(&tag.value);
            fields.push(format!("{i1}{}: {value};\n", property_key(&tag.key)));
            checks.push(format!("{} === {value}", accessor("input", &tag.key)));
            assigned.push(format!("{i1}{}: {value},", property_key(&tag.key)));
            let wire = format!("{}:{}", string_literal(&tag.key), value);
            parts.push(format!("parts.push({});", string_literal(&wire)));
        }

        for property in properties {
            let key = &property.key;
            let bundle = &property.bundle;
            let input = accessor("input", key);
            let obj = accessor("obj", key);
            let wire_key = string_literal(&format!("{}:", string_literal(key)));

            fields.push(format!(
                "{}{i1}{}{}: {};\n",
                self.doc_comment(&property.metadata, 1),
                property_key(key),
                if property.optional { "?" } else { "" },
                bundle.field,
            ));
            if property.optional {
                checks.push(format!("({input} === undefined || {})", bundle.validate(&input)));
                optional_parse.push(format!(
                    "if ({obj} !== undefined) {{\n{i1}{} = {};\n}}",
                    accessor("result", key),
                    bundle.parse(&obj),
                ));
                parts.push(format!(
                    "if ({input} !== undefined) {{\n{i1}parts.push({wire_key} + {});\n}}",
                    bundle.serialize(&input),
                ));
            } else {
                checks.push(bundle.validate(&input));
                assigned.push(format!("{i1}{}: {},", property_key(key), bundle.parse(&obj)));
                parts.push(format!("parts.push({wire_key} + {});", bundle.serialize(&input)));
            }
        }

        let separator = format!(" &&\n{i1}");
        let validate = vec![format!("return (\n{i1}{}\n);", checks.join(separator.as_str()))];

        let mut parse = vec!["const obj: Record<string, any> = isObject(input) ? input : {};".to_string()];
        if assigned.is_empty() {
            parse.push(format!("const result: {name} = {{}};"));
        } else {
            parse.push(format!("const result: {name} = {{"));
            parse.extend(assigned);
            parse.push("};".to_string());
        }
        parse.extend(optional_parse);
        parse.push("return result;".to_string());

        let mut serialize = vec!["const parts: string[] = [];".to_string()];
        serialize.extend(parts);
        serialize.push("return \"{\" + parts.join(\",\") + \"}\";".to_string());

        // Multi-line statements are indented relative to the method body.
        let reindent = |lines: Vec<String>| -> Vec<String> {
            lines
                .iter()
                .flat_map(|line| line.split('\n').map(str::to_string))
                .collect()
        };

        let declaration = format!(
            "{}export interface {name} {{\n{}}}\n{}",
            self.doc_comment(&ctx.metadata, 0),
            fields.concat(),
            self.helper(name, &reindent(validate), &reindent(parse), &reindent(serialize)),
        );
        named(ctx).with_declaration(declaration)
    }

    fn array(&self, ctx: &NodeContext, element: &CodeBundle) -> CodeBundle {
        let inner = if element.field.contains(' ') {
            format!("Array<{}>", element.field)
        } else {
            format!("{}[]", element.field)
        };
        let field = if ctx.nullable {
            format!("{inner} | null")
        } else {
            inner.clone()
        };
        let fallback = if ctx.nullable { "null" } else { "[]" };

        let (parse_el, validate_el, serialize_el) = (element.clone(), element.clone(), element.clone());
        let bundle = CodeBundle::new(inner, field).with_parse(move |v| {
            format!(
                "(Array.isArray({v}) ? {v}.map((item: any) => {}) : {fallback})",
                parse_el.parse("item")
            )
        });
        with_null_branch(
            bundle,
            ctx.nullable,
            move |v| {
                format!(
                    "(Array.isArray({v}) && {v}.every((item: any) => {}))",
                    validate_el.validate("item")
                )
            },
            move |v| {
                format!(
                    "(\"[\" + {v}.map((item) => {}).join(\",\") + \"]\")",
                    serialize_el.serialize("item")
                )
            },
        )
    }

    fn record(&self, ctx: &NodeContext, value: &CodeBundle) -> CodeBundle {
        let inner = format!("Record<string, {}>", value.field);
        let field = if ctx.nullable {
            format!("{inner} | null")
        } else {
            inner.clone()
        };
        let fallback = if ctx.nullable { "null" } else { "{}" };

        let (parse_value, validate_value, serialize_value) = (value.clone(), value.clone(), value.clone());
        let bundle = CodeBundle::new(inner, field).with_parse(move |v| {
            format!(
                "(isObject({v}) ? Object.fromEntries(Object.entries({v}).map(([key, value]) => [key, {}])) : {fallback})",
                parse_value.parse("value")
            )
        });
        with_null_branch(
            bundle,
            ctx.nullable,
            move |v| {
                format!(
                    "(isObject({v}) && Object.values({v}).every((value: any) => {}))",
                    validate_value.validate("value")
                )
            },
            move |v| {
                format!(
                    "(\"{{\" + Object.entries({v}).map(([key, value]) => JSON.stringify(key) + \":\" + {}).join(\",\") + \"}}\")",
                    serialize_value.serialize("value")
                )
            },
        )
    }

    fn discriminator(&self, ctx: &NodeContext, tag: &str, variants: &[Variant]) -> CodeBundle {
        let name = &ctx.type_name;
        let i1 = self.config.indent(1);
        let i2 = self.config.indent(2);
        let union = variants
            .iter()
            .map(|v| v.bundle.type_name.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        let union = if union.is_empty() { "never".to_string() } else { union };

        let cases = |call: &str, arg: &str| -> Vec<String> {
            variants
                .iter()
                .flat_map(|variant| {
                    [
                        format!("{i1}case {}:", string_literal(&variant.tag_value)),
                        format!("{i2}return $${}.{call}({arg});", variant.bundle.type_name),
                    ]
                })
                .collect()
        };
        let unknown = |value: &str| {
            format!(
                "{i2}throw new Error({} + String({value}));",
                string_literal(&format!("Unknown \"{tag}\" value for {name}: "))
            )
        };

        let mut validate = vec![
            "if (!isObject(input)) {".to_string(),
            format!("{i1}return false;"),
            "}".to_string(),
            format!("switch ({}) {{", accessor("input", tag)),
        ];
        validate.extend(cases("validate", "input"));
        validate.extend([format!("{i1}default:"), format!("{i2}return false;"), "}".to_string()]);

        let obj_tag = accessor("obj", tag);
        let mut parse = vec![
            "const obj: Record<string, any> = isObject(input) ? input : {};".to_string(),
            format!("switch ({obj_tag}) {{"),
        ];
        parse.extend(cases("parse", "obj"));
        parse.extend([format!("{i1}default:"), unknown(&obj_tag), "}".to_string()]);

        let input_tag = accessor("input", tag);
        let mut serialize = vec![format!("switch ({input_tag}) {{")];
        serialize.extend(cases("serialize", "input as any"));
        serialize.extend([format!("{i1}default:"), unknown(&input_tag), "}".to_string()]);

        let declaration = format!(
            "{}export type {name} = {union};\n{}",
            self.doc_comment(&ctx.metadata, 0),
            self.helper(name, &validate, &parse, &serialize),
        );
        named(ctx).with_declaration(declaration)
    }

    fn reference(&self, ctx: &NodeContext) -> CodeBundle {
        named(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use tyrpc::{Models, SchemaNode};

    fn ctx(nullable: bool) -> NodeContext {
        NodeContext {
            nullable,
            ..NodeContext::default()
        }
    }

    #[test]
    fn test_int64_maps_to_bigint() {
        let backend = TypeScriptBackend::default();
        let bundle = backend.scalar(&ctx(false), ScalarKind::Int64);
        assert_eq!(bundle.field, "bigint");
        assert_eq!(bundle.serialize("v"), "JSON.stringify(v.toString())");
        assert!(bundle.parse("v").contains("BigInt(v)"));
        assert!(bundle.parse("v").ends_with(": BigInt(0))"));
    }

    #[test]
    fn test_nullable_scalar_branches() {
        let backend = TypeScriptBackend::default();
        let bundle = backend.scalar(&ctx(true), ScalarKind::String);
        assert_eq!(bundle.field, "string | null");
        assert_eq!(bundle.parse("v"), "(typeof v === \"string\" ? v : null)");
        assert_eq!(bundle.validate("v"), "(typeof v === \"string\" || v === null)");
        assert_eq!(bundle.serialize("v"), "(v === null ? \"null\" : JSON.stringify(v))");
    }

    #[test]
    fn test_bounded_integer_validation() {
        let backend = TypeScriptBackend::default();
        let bundle = backend.scalar(&ctx(false), ScalarKind::Uint8);
        assert_eq!(
            bundle.validate("v"),
            "typeof v === \"number\" && Number.isInteger(v) && v >= 0 && v <= 255"
        );
    }

    #[test]
    fn test_enum_declaration() {
        let backend = TypeScriptBackend::default();
        let mut models = Models::new();
        models.insert(
            "Status".to_string(),
            SchemaNode::enumeration(["ACTIVE", "INACTIVE"]).with_description("Account state"),
        );
        let engine = Engine::new(&backend, &models);
        let mut registry = engine.registry();
        let bundles = engine.generate_models(&mut registry).unwrap();

        insta::assert_snapshot!(bundles[0].declarations().join("\n"), @r#"
        /**
         * Account state
         */
        export type Status = "ACTIVE" | "INACTIVE";
        export const $$Status = {
          validate(input: unknown): input is Status {
            return typeof input === "string" && ["ACTIVE", "INACTIVE"].includes(input);
          },
          parse(input: unknown): Status {
            return $$Status.validate(input) ? input : "ACTIVE";
          },
          serialize(input: Status): string {
            return JSON.stringify(input);
          },
        };
        "#);
    }

    #[test]
    fn test_object_skips_absent_optional() {
        let backend = TypeScriptBackend::default();
        let mut models = Models::new();
        models.insert(
            "User".to_string(),
            SchemaNode::object()
                .property("id", SchemaNode::string())
                .optional_property("bio", SchemaNode::string()),
        );
        let engine = Engine::new(&backend, &models);
        let mut registry = engine.registry();
        let declaration = engine.generate_models(&mut registry).unwrap()[0]
            .declaration
            .clone()
            .unwrap();

        assert!(declaration.contains("export interface User {\n  id: string;\n  bio?: string;\n}"));
        assert!(declaration.contains("if (input.bio !== undefined) {"));
        assert!(declaration.contains(r#"parts.push("\"id\":" + JSON.stringify(input.id));"#));
        assert!(declaration.contains("id: (typeof obj.id === \"string\" ? obj.id : \"\"),"));
    }

    #[test]
    fn test_discriminator_variant_has_literal_tag() {
        let backend = TypeScriptBackend::new(GeneratorConfig::new().with_generate_docs(false));
        let mut models = Models::new();
        models.insert(
            "Shape".to_string(),
            SchemaNode::discriminator("type").variant(
                "CIRCLE",
                SchemaNode::object().property("radius", SchemaNode::scalar(ScalarKind::Float64)),
            ),
        );
        let engine = Engine::new(&backend, &models);
        let mut registry = engine.registry();
        let declarations = engine.generate_models(&mut registry).unwrap()[0].declarations();

        assert_eq!(declarations.len(), 2);
        assert!(declarations[0].starts_with("export interface ShapeCircle {\n  type: \"CIRCLE\";\n"));
        assert!(declarations[0].contains(r#"parts.push("\"type\":\"CIRCLE\"");"#));
        assert!(declarations[1].starts_with("export type Shape = ShapeCircle;\n"));
        assert!(declarations[1].contains("throw new Error(\"Unknown \\\"type\\\" value for Shape: \" + String(obj.type));"));
    }
}
