//! Backend contract.
//!
//! A backend turns already-traversed nodes into target-language text. The
//! [`Engine`](crate::engine::Engine) decides names, paths and recursion and
//! calls exactly one method per schema form, so a new form cannot be added
//! without every backend handling it.

use tyrpc::{Metadata, ScalarKind};

use crate::bundle::CodeBundle;

/// Trait for target-language emitters.
pub trait Backend: Send + Sync {
    /// Short lowercase identifier (`"typescript"`).
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Extension of generated files, without the dot.
    fn file_extension(&self) -> &'static str;

    fn config(&self) -> &GeneratorConfig;

    fn scalar(&self, ctx: &NodeContext, kind: ScalarKind) -> CodeBundle;

    /// A named enum seen for the first time.
    fn enumeration(&self, ctx: &NodeContext, values: &[String]) -> CodeBundle;

    /// A named object seen for the first time. `tag` is set when the object
    /// is a discriminator variant.
    fn object(
        &self,
        ctx: &NodeContext,
        properties: &[Property],
        tag: Option<&TagField>,
    ) -> CodeBundle;

    fn array(&self, ctx: &NodeContext, element: &CodeBundle) -> CodeBundle;

    fn record(&self, ctx: &NodeContext, value: &CodeBundle) -> CodeBundle;

    /// A named discriminated union seen for the first time.
    fn discriminator(&self, ctx: &NodeContext, tag: &str, variants: &[Variant]) -> CodeBundle;

    /// A use of an already-declared type, either through `ref` or because a
    /// named node's name was registered earlier in the pass.
    fn reference(&self, ctx: &NodeContext) -> CodeBundle;
}

/// Where a node sits and how it is modified.
#[derive(Debug, Clone, Default)]
pub struct NodeContext {
    /// Property key inside the enclosing object, if any.
    pub key: Option<String>,
    /// Whether the key may be absent from the enclosing object.
    pub optional: bool,
    pub nullable: bool,
    pub metadata: Metadata,
    /// `/`-separated ancestry used for naming (`User/address`).
    pub instance_path: String,
    /// JSON pointer into the schema document.
    pub schema_path: String,
    /// Derived type name (the target's name for references).
    pub type_name: String,
}

/// A generated object property.
#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub optional: bool,
    pub metadata: Metadata,
    pub bundle: CodeBundle,
}

/// The literal tag injected into a discriminator variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagField {
    pub key: String,
    pub value: String,
}

/// A generated discriminator variant.
#[derive(Debug, Clone)]
pub struct Variant {
    pub tag_value: String,
    pub bundle: CodeBundle,
}

/// Generator configuration shared by backends.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Whether to emit doc comments from schema metadata.
    pub generate_docs: bool,

    pub indent: IndentStyle,

    /// Prefix prepended to every derived type name.
    pub type_prefix: String,

    /// Reject a type name reused for a different shape.
    pub strict_names: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generate_docs: true,
            indent: IndentStyle::default(),
            type_prefix: String::new(),
            strict_names: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generate_docs(mut self, generate: bool) -> Self {
        self.generate_docs = generate;
        self
    }

    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_prefix = prefix.into();
        self
    }

    pub fn with_strict_names(mut self, strict: bool) -> Self {
        self.strict_names = strict;
        self
    }

    /// Indentation for the given depth.
    pub fn indent(&self, depth: usize) -> String {
        self.indent.indent(depth)
    }
}

/// Indentation style for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentStyle {
    /// Two spaces
    #[default]
    Spaces2,

    /// Four spaces
    Spaces4,

    Tabs,
}

impl IndentStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Spaces4 => "    ",
            IndentStyle::Tabs => "\t",
        }
    }

    pub fn indent(&self, depth: usize) -> String {
        self.as_str().repeat(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert!(config.generate_docs);
        assert_eq!(config.indent, IndentStyle::Spaces2);
        assert!(config.type_prefix.is_empty());
        assert!(!config.strict_names);
    }

    #[test]
    fn test_generator_config_builder() {
        let config = GeneratorConfig::new()
            .with_generate_docs(false)
            .with_indent(IndentStyle::Tabs)
            .with_type_prefix("Api")
            .with_strict_names(true);
        assert!(!config.generate_docs);
        assert_eq!(config.indent(2), "\t\t");
        assert_eq!(config.type_prefix, "Api");
        assert!(config.strict_names);
    }

    #[test]
    fn test_indent_style() {
        assert_eq!(IndentStyle::Spaces2.indent(2), "    ");
        assert_eq!(IndentStyle::Spaces4.as_str(), "    ");
    }
}
