//! # tyrpc
//!
//! Schema model, application definitions and runtime validators for
//! schema-driven RPC.
//!
//! An application is described by an [`AppDefinition`]: a flat map of
//! procedures, a named arena of model schemas, and a shared error schema.
//! Schemas are [`SchemaNode`]s in one of seven forms. Code generators in
//! `tyrpc-codegen` read the definition and emit clients; this crate holds
//! everything they share.
//!
//! ## Schema forms
//!
//! | Form | Wire keyword | Example |
//! |------|--------------|---------|
//! | Scalar | `type` | `{"type": "int64"}` |
//! | Enum | `enum` | `{"enum": ["ACTIVE", "INACTIVE"]}` |
//! | Object | `properties` / `optionalProperties` | `{"properties": {"id": {"type": "string"}}}` |
//! | Array | `elements` | `{"elements": {"type": "string"}}` |
//! | Record | `values` | `{"values": {"type": "float64"}}` |
//! | Discriminator | `discriminator` + `mapping` | `{"discriminator": "type", "mapping": {...}}` |
//! | Ref | `ref` | `{"ref": "User"}` |
//!
//! Any form may carry `nullable` and `metadata` (`id`, `description`,
//! `isDeprecated`).
//!
//! ## Quick Start
//!
//! ```rust
//! use tyrpc::{validator, SchemaNode, Value};
//! use tyrpc::schema::{Models, ScalarKind};
//!
//! let schema = SchemaNode::object()
//!     .property("id", SchemaNode::scalar(ScalarKind::Int64))
//!     .property("tags", SchemaNode::array(SchemaNode::string()));
//! let v = validator::compile(&schema, &Models::new()).unwrap();
//!
//! let value = v.decode_str(r#"{"id":"9007199254740993","tags":[]}"#).unwrap();
//! assert_eq!(value.get("id"), Some(&Value::Int(9_007_199_254_740_993)));
//! ```

pub mod app;
pub mod error;
pub mod procedures;
pub mod schema;
pub mod validator;
pub mod value;

pub use app::{AppDefinition, AppInfo, HttpMethod, RpcDefinition, Transport, SCHEMA_VERSION};
pub use error::{DefinitionError, ProcedureTreeError, SchemaError, SchemaResult};
pub use procedures::{flatten, unflatten, ProcedureNode, ServiceNode};
pub use schema::{Form, Metadata, Models, ScalarKind, SchemaNode};
pub use validator::{Validator, ValueError};
pub use value::{ObjectValue, Value};
