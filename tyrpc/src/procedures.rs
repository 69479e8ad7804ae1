//! Procedure tree builder.
//!
//! Procedures are keyed by dot-separated paths (`"posts.comments.getComment"`).
//! [`unflatten`] turns that flat map into nested [`ServiceNode`]s so client
//! generators can emit one service class per level; [`flatten`] is its inverse.
//!
//! # Example
//!
//! ```rust
//! use indexmap::IndexMap;
//! use tyrpc::app::{HttpMethod, RpcDefinition};
//! use tyrpc::procedures::{flatten, unflatten, ProcedureNode};
//!
//! let mut procedures = IndexMap::new();
//! procedures.insert(
//!     "posts.getPost".to_string(),
//!     RpcDefinition::new("/posts/get-post", HttpMethod::Get),
//! );
//!
//! let tree = unflatten(&procedures).unwrap();
//! assert!(matches!(tree.get("posts"), Some(ProcedureNode::Service(_))));
//! assert_eq!(flatten(&tree), procedures);
//! ```

use indexmap::IndexMap;

use crate::app::RpcDefinition;
use crate::error::ProcedureTreeError;

/// One entry of the procedure tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcedureNode {
    /// A callable procedure.
    Rpc(RpcDefinition),

    /// A namespace holding further entries.
    Service(ServiceNode),
}

/// A level of the procedure tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNode {
    children: IndexMap<String, ProcedureNode>,
}

impl ServiceNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a procedure under its dot-separated key, creating intermediate
    /// services as needed.
    pub fn insert(&mut self, key: &str, rpc: RpcDefinition) -> Result<(), ProcedureTreeError> {
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ProcedureTreeError::EmptySegment {
                key: key.to_string(),
            });
        }
        let Some((last, parents)) = segments.split_last() else {
            return Err(ProcedureTreeError::EmptySegment {
                key: key.to_string(),
            });
        };

        let mut node = self;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| ProcedureNode::Service(ServiceNode::new()));
            node = match entry {
                ProcedureNode::Service(service) => service,
                ProcedureNode::Rpc(_) => {
                    return Err(ProcedureTreeError::Collision {
                        key: key.to_string(),
                        at: segments[..=depth].join("."),
                    })
                }
            };
        }

        if node.children.contains_key(*last) {
            return Err(ProcedureTreeError::Collision {
                key: key.to_string(),
                at: key.to_string(),
            });
        }
        node.children
            .insert(last.to_string(), ProcedureNode::Rpc(rpc));
        Ok(())
    }

    /// Look up an entry by dot-separated path.
    pub fn get(&self, path: &str) -> Option<&ProcedureNode> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.children.get(first)?;
        for segment in segments {
            match current {
                ProcedureNode::Service(service) => current = service.children.get(segment)?,
                ProcedureNode::Rpc(_) => return None,
            }
        }
        Some(current)
    }

    /// Direct children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&String, &ProcedureNode)> {
        self.children.iter()
    }

    /// Direct procedures of this level.
    pub fn rpcs(&self) -> impl Iterator<Item = (&String, &RpcDefinition)> {
        self.children.iter().filter_map(|(key, node)| match node {
            ProcedureNode::Rpc(rpc) => Some((key, rpc)),
            ProcedureNode::Service(_) => None,
        })
    }

    /// Direct sub-services of this level.
    pub fn services(&self) -> impl Iterator<Item = (&String, &ServiceNode)> {
        self.children.iter().filter_map(|(key, node)| match node {
            ProcedureNode::Service(service) => Some((key, service)),
            ProcedureNode::Rpc(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn collect(&self, prefix: &str, out: &mut IndexMap<String, RpcDefinition>) {
        for (key, node) in &self.children {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match node {
                ProcedureNode::Rpc(rpc) => {
                    out.insert(path, rpc.clone());
                }
                ProcedureNode::Service(service) => service.collect(&path, out),
            }
        }
    }
}

/// Build the nested service tree of a flat procedure map.
pub fn unflatten(
    procedures: &IndexMap<String, RpcDefinition>,
) -> Result<ServiceNode, ProcedureTreeError> {
    let mut root = ServiceNode::new();
    for (key, rpc) in procedures {
        root.insert(key, rpc.clone())?;
    }
    tracing::trace!(procedures = procedures.len(), top_level = root.len(), "unflattened procedures");
    Ok(root)
}

/// Flatten a service tree back into dot-separated keys.
pub fn flatten(tree: &ServiceNode) -> IndexMap<String, RpcDefinition> {
    let mut out = IndexMap::new();
    tree.collect("", &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::HttpMethod;

    fn rpc(path: &str) -> RpcDefinition {
        RpcDefinition::new(path, HttpMethod::Post)
    }

    fn procedures(keys: &[&str]) -> IndexMap<String, RpcDefinition> {
        keys.iter()
            .map(|key| (key.to_string(), rpc(&format!("/{}", key.replace('.', "/")))))
            .collect()
    }

    #[test]
    fn test_unflatten_nests_services() {
        let input = procedures(&[
            "sayHello",
            "posts.getPost",
            "posts.comments.getComment",
            "posts.comments.deleteComment",
            "users.getUser",
        ]);
        let tree = unflatten(&input).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.rpcs().count(), 1);
        assert_eq!(tree.services().count(), 2);

        let Some(ProcedureNode::Service(comments)) = tree.get("posts.comments") else {
            panic!("expected a service");
        };
        let names: Vec<_> = comments.rpcs().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["getComment", "deleteComment"]);

        assert!(matches!(
            tree.get("posts.comments.getComment"),
            Some(ProcedureNode::Rpc(r)) if r.path == "/posts/comments/getComment"
        ));
        assert!(tree.get("posts.missing").is_none());
        assert!(tree.get("sayHello.nested").is_none());
    }

    #[test]
    fn test_prefix_colliding_with_rpc() {
        let input = procedures(&["posts", "posts.getPost"]);
        let err = unflatten(&input).unwrap_err();
        assert_eq!(
            err,
            ProcedureTreeError::Collision {
                key: "posts.getPost".to_string(),
                at: "posts".to_string(),
            }
        );
    }

    #[test]
    fn test_rpc_colliding_with_service() {
        let input = procedures(&["posts.getPost", "posts"]);
        let err = unflatten(&input).unwrap_err();
        assert!(matches!(err, ProcedureTreeError::Collision { key, .. } if key == "posts"));
    }

    #[test]
    fn test_empty_segment_rejected() {
        for key in ["", "a..b", ".a", "a."] {
            let err = unflatten(&procedures(&[key])).unwrap_err();
            assert_eq!(
                err,
                ProcedureTreeError::EmptySegment {
                    key: key.to_string()
                }
            );
        }
    }

    #[test]
    fn test_flatten_round_trip() {
        let input = procedures(&["a.b.c", "a.b.d", "a.e", "f"]);
        let tree = unflatten(&input).unwrap();
        assert_eq!(flatten(&tree), input);
    }

    #[test]
    fn test_empty_map() {
        let tree = unflatten(&IndexMap::new()).unwrap();
        assert!(tree.is_empty());
        assert!(flatten(&tree).is_empty());
    }
}
