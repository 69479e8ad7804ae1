//! Error types for schema loading, definition checks and procedure trees.
//!
//! Every error raised while building the schema model is fatal to a
//! generation pass and carries the JSON path of the offending node.

use thiserror::Error;

/// Error raised while constructing or resolving a schema node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A node carries none of the form keywords.
    #[error("Schema at '{path}' has no form (expected one of type, enum, properties, elements, values, discriminator, ref)")]
    NoForm { path: String },

    /// A node carries more than one form keyword.
    #[error("Schema at '{path}' mixes forms: {}", .forms.join(", "))]
    AmbiguousForm { path: String, forms: Vec<String> },

    /// `type` names something that is not a scalar kind.
    #[error("Schema at '{path}' has unknown scalar type '{value}'")]
    UnknownScalar { path: String, value: String },

    /// An enum without values.
    #[error("Enum at '{path}' has no values")]
    EmptyEnum { path: String },

    /// An enum that lists the same value twice.
    #[error("Enum at '{path}' repeats value '{value}'")]
    DuplicateEnumValue { path: String, value: String },

    /// `mapping` given without `discriminator` or the reverse.
    #[error("Schema at '{path}' must declare both 'discriminator' and 'mapping'")]
    IncompleteDiscriminator { path: String },

    /// A discriminator variant that is not an object.
    #[error("Discriminator variant '{tag}' at '{path}' must be an object schema")]
    VariantNotObject { path: String, tag: String },

    /// A discriminator variant that declares the tag field itself.
    #[error("Discriminator variant '{tag}' at '{path}' redeclares tag field '{field}'")]
    TagRedeclared {
        path: String,
        tag: String,
        field: String,
    },

    /// A `ref` whose target is not in the model arena.
    #[error("Schema at '{path}' references unknown model '{target}'")]
    UnresolvedRef { path: String, target: String },

    /// Malformed JSON or a type mismatch inside the wire document.
    #[error("Invalid schema JSON at '{path}': {message}")]
    Json { path: String, message: String },
}

impl SchemaError {
    /// Create a JSON error at the given path.
    pub fn json(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Json {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved reference error.
    pub fn unresolved(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnresolvedRef {
            path: path.into(),
            target: target.into(),
        }
    }

    /// Path of the schema node the error refers to.
    pub fn path(&self) -> &str {
        match self {
            SchemaError::NoForm { path }
            | SchemaError::AmbiguousForm { path, .. }
            | SchemaError::UnknownScalar { path, .. }
            | SchemaError::EmptyEnum { path }
            | SchemaError::DuplicateEnumValue { path, .. }
            | SchemaError::IncompleteDiscriminator { path }
            | SchemaError::VariantNotObject { path, .. }
            | SchemaError::TagRedeclared { path, .. }
            | SchemaError::UnresolvedRef { path, .. }
            | SchemaError::Json { path, .. } => path,
        }
    }

    /// Prefix the error path with the location of the enclosing document.
    pub(crate) fn within(self, parent: &str) -> Self {
        let join = |path: String| {
            if parent.is_empty() {
                path
            } else if path.is_empty() {
                parent.to_string()
            } else {
                format!("{parent}.{path}")
            }
        };
        match self {
            SchemaError::NoForm { path } => SchemaError::NoForm { path: join(path) },
            SchemaError::AmbiguousForm { path, forms } => SchemaError::AmbiguousForm {
                path: join(path),
                forms,
            },
            SchemaError::UnknownScalar { path, value } => SchemaError::UnknownScalar {
                path: join(path),
                value,
            },
            SchemaError::EmptyEnum { path } => SchemaError::EmptyEnum { path: join(path) },
            SchemaError::DuplicateEnumValue { path, value } => SchemaError::DuplicateEnumValue {
                path: join(path),
                value,
            },
            SchemaError::IncompleteDiscriminator { path } => {
                SchemaError::IncompleteDiscriminator { path: join(path) }
            }
            SchemaError::VariantNotObject { path, tag } => SchemaError::VariantNotObject {
                path: join(path),
                tag,
            },
            SchemaError::TagRedeclared { path, tag, field } => SchemaError::TagRedeclared {
                path: join(path),
                tag,
                field,
            },
            SchemaError::UnresolvedRef { path, target } => SchemaError::UnresolvedRef {
                path: join(path),
                target,
            },
            SchemaError::Json { path, message } => SchemaError::Json {
                path: join(path),
                message,
            },
        }
    }
}

/// Error raised while building or flattening a procedure tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcedureTreeError {
    /// A key whose prefix is already an RPC, or an RPC key that is already a service.
    #[error("Procedure '{key}' collides with an existing entry at '{at}'")]
    Collision { key: String, at: String },

    /// A key with an empty segment (`"a..b"`, `""`, `".a"`).
    #[error("Procedure key '{key}' contains an empty segment")]
    EmptySegment { key: String },
}

/// Error raised when an [`AppDefinition`](crate::AppDefinition) is not usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    /// The definition document failed to parse.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The procedure map cannot form a tree.
    #[error(transparent)]
    Procedures(#[from] ProcedureTreeError),

    /// A model (or the error schema) is not an object.
    #[error("Model '{name}' must be an object schema, found {form}")]
    ModelNotObject { name: String, form: String },

    /// A procedure names a params/response model that does not exist.
    #[error("Procedure '{procedure}' {role} references unknown model '{model}'")]
    UnknownModel {
        procedure: String,
        role: &'static str,
        model: String,
    },
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
