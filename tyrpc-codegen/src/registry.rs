//! Name registry for one generation pass.
//!
//! The registry records every type name already declared so that repeated
//! occurrences of the same named type emit a reference instead of a second
//! declaration. It is created per pass and threaded through the traversal by
//! `&mut`, so independent passes never share state.

use indexmap::IndexMap;
use tyrpc::SchemaNode;

use crate::error::{CodegenError, CodegenResult};

/// Registry of emitted type names.
///
/// By default the first registration of a name wins and later nodes with the
/// same name are assumed identical. A strict registry also records each
/// node's structure and rejects a name reused for a different shape.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    /// Name -> structural fingerprint (empty when registered by name only).
    names: IndexMap<String, String>,
    strict: bool,
}

impl NameRegistry {
    /// Create a first-writer-wins registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that rejects structurally different reuse of a name.
    pub fn strict() -> Self {
        Self {
            names: IndexMap::new(),
            strict: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Register a name. Returns `true` the first time a name is seen.
    pub fn register(&mut self, name: &str) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        self.names.insert(name.to_string(), String::new());
        true
    }

    /// Register the name of a schema node.
    ///
    /// Returns `Ok(true)` on first registration and `Ok(false)` when the name
    /// is already taken. In strict mode a taken name whose recorded shape
    /// differs from `node` is a [`CodegenError::NameConflict`] at `path`.
    /// Nullability is not part of the shape.
    pub fn register_node(
        &mut self,
        name: &str,
        node: &SchemaNode,
        path: &str,
    ) -> CodegenResult<bool> {
        let fingerprint = shape_of(node);
        match self.names.get_mut(name) {
            None => {
                self.names.insert(name.to_string(), fingerprint);
                Ok(true)
            }
            Some(existing) if existing.is_empty() => {
                *existing = fingerprint;
                Ok(false)
            }
            Some(existing) if self.strict && *existing != fingerprint => {
                Err(CodegenError::NameConflict {
                    name: name.to_string(),
                    path: path.to_string(),
                })
            }
            Some(_) => Ok(false),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn shape_of(node: &SchemaNode) -> String {
    let mut shape = node.clone();
    shape.nullable = false;
    shape.fingerprint()
}
