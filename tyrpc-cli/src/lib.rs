//! # tyrpc-cli
//!
//! Library behind the `tyrpc` binary: configuration, definition loading,
//! and generator dispatch.
//!
//! - [`config`] - `tyrpc.toml` parsing and CLI overrides
//! - [`loader`] - reading and validating an app definition
//! - [`generator`] - running the configured generators in parallel
//! - [`error`] - error types

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;

pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use generator::{render_all, GeneratorRun};
pub use loader::load_definition;
