//! # tyrpc-codegen
//!
//! Backend-agnostic client generation for tyrpc definitions.
//!
//! The [`Engine`] walks schema nodes, derives type names and resolves refs;
//! a [`Backend`] turns each node into target-language text packaged as a
//! [`CodeBundle`]. Client generators combine the bundles with the procedure
//! tree into output files behind the [`ClientGenerator`] trait.
//!
//! ## Example
//!
//! ```rust
//! use tyrpc::{AppDefinition, HttpMethod, RpcDefinition, SchemaNode};
//! use tyrpc_codegen::{typescript, GeneratorConfig, GeneratorOptions};
//!
//! let definition = AppDefinition::new(
//!     SchemaNode::object().property("message", SchemaNode::string()),
//! )
//! .with_model("User", SchemaNode::object().property("id", SchemaNode::string()))
//! .with_procedure(
//!     "users.get",
//!     RpcDefinition::new("/users/get", HttpMethod::Get).with_response("User"),
//! );
//!
//! let plugin = typescript::plugin(
//!     GeneratorOptions::new("ApiClient", "client.ts"),
//!     GeneratorConfig::default(),
//! )
//! .unwrap();
//! let files = plugin.render(&definition).unwrap();
//! assert!(files[0].contents.contains("export class ApiClientUsersService {"));
//! ```

pub mod backend;
pub mod bundle;
pub mod engine;
pub mod error;
pub mod naming;
pub mod plugin;
pub mod registry;
pub mod typescript;

pub use backend::{Backend, GeneratorConfig, IndentStyle, NodeContext, Property, TagField, Variant};
pub use bundle::{CodeBundle, Template};
pub use engine::Engine;
pub use error::{CodegenError, CodegenResult};
pub use plugin::{ClientGenerator, GeneratedFile, GeneratorOptions, GeneratorPlugin};
pub use registry::NameRegistry;
pub use typescript::{TypeScriptBackend, TypeScriptClientGenerator};
