//! Per-node generation output.

use std::fmt;
use std::sync::Arc;

/// Expression template: receives an input expression, returns target code.
pub type Template = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Everything a backend produced for one schema node.
///
/// `field` is the type expression used where the node appears (a property,
/// an array element, a parameter). `declaration` is only set for nodes that
/// introduce a named type the first time they are seen. Nested declarations
/// are carried in `sub_declarations` so the caller can emit them before the
/// parent.
#[derive(Clone)]
pub struct CodeBundle {
    pub type_name: String,
    pub field: String,
    pub declaration: Option<String>,
    pub sub_declarations: Vec<String>,
    parse: Template,
    serialize: Template,
    validate: Template,
}

impl CodeBundle {
    /// Create a bundle whose templates pass their input through unchanged.
    pub fn new(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        let identity: Template = Arc::new(|input: &str| input.to_string());
        Self {
            type_name: type_name.into(),
            field: field.into(),
            declaration: None,
            sub_declarations: Vec::new(),
            parse: Arc::clone(&identity),
            serialize: identity,
            validate: Arc::new(|_: &str| "true".to_string()),
        }
    }

    pub fn with_declaration(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }

    pub fn with_sub_declarations(mut self, declarations: Vec<String>) -> Self {
        self.sub_declarations = declarations;
        self
    }

    pub fn with_parse<F>(mut self, template: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.parse = Arc::new(template);
        self
    }

    pub fn with_serialize<F>(mut self, template: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.serialize = Arc::new(template);
        self
    }

    pub fn with_validate<F>(mut self, template: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.validate = Arc::new(template);
        self
    }

    /// Lenient parse expression for `input`.
    pub fn parse(&self, input: &str) -> String {
        (self.parse)(input)
    }

    /// Serialize expression for `input`, producing wire text.
    pub fn serialize(&self, input: &str) -> String {
        (self.serialize)(input)
    }

    /// Boolean type-guard expression for `input`.
    pub fn validate(&self, input: &str) -> String {
        (self.validate)(input)
    }

    /// Nested declarations followed by this node's own.
    pub fn declarations(&self) -> Vec<String> {
        let mut out = self.sub_declarations.clone();
        out.extend(self.declaration.iter().cloned());
        out
    }
}

impl fmt::Debug for CodeBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeBundle")
            .field("type_name", &self.type_name)
            .field("field", &self.field)
            .field("declaration", &self.declaration.is_some())
            .field("sub_declarations", &self.sub_declarations.len())
            .finish_non_exhaustive()
    }
}
