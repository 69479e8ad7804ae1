//! Error types for code generation.
//!
//! Every variant is fatal to the generator invocation that raised it.

use std::path::PathBuf;

use thiserror::Error;
use tyrpc::{DefinitionError, SchemaError};

/// Error raised while generating or writing client code.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A `ref` names a model missing from the arena.
    #[error("Schema at '{path}' references unknown model '{target}'")]
    UnresolvedRef { path: String, target: String },

    /// Two structurally different nodes derived the same type name.
    #[error("Type name '{name}' at '{path}' was already generated for a different schema")]
    NameConflict { name: String, path: String },

    /// A required generator option is empty.
    #[error("Generator '{generator}' is missing required option '{option}'")]
    MissingOption {
        generator: &'static str,
        option: &'static str,
    },

    /// The definition has nothing to generate a client for.
    #[error("Generator '{generator}' found no procedures in the app definition")]
    NoProcedures { generator: &'static str },

    /// A schema node violates a structural rule.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The definition failed validation.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// Writing a generated file failed.
    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    pub fn unresolved(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnresolvedRef {
            path: path.into(),
            target: target.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for code generation.
pub type CodegenResult<T> = Result<T, CodegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_location() {
        let err = CodegenError::unresolved("/properties/owner", "Ghost");
        assert_eq!(
            err.to_string(),
            "Schema at '/properties/owner' references unknown model 'Ghost'"
        );

        let err = CodegenError::MissingOption {
            generator: "typescript",
            option: "client_name",
        };
        assert_eq!(
            err.to_string(),
            "Generator 'typescript' is missing required option 'client_name'"
        );
    }
}
