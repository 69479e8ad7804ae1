//! Configuration management for the CLI.
//!
//! Configuration is read from `tyrpc.toml` and merged with command-line
//! arguments. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tyrpc_codegen::{GeneratorConfig, GeneratorOptions};

use crate::error::{CliResult, ConfigError};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "tyrpc.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,

    pub output: OutputConfig,

    /// Generators to run, in declaration order.
    pub generators: Vec<GeneratorEntry>,
}

/// Input configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Path of the app definition JSON file.
    pub definition: PathBuf,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generator output files are resolved against.
    pub dir: PathBuf,
}

/// Target language of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Typescript,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Typescript => "typescript",
        }
    }
}

/// One `[[generators]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorEntry {
    pub kind: GeneratorKind,

    /// Name of the root client type.
    pub client_name: String,

    /// Output file, relative to `output.dir`.
    pub output_file: PathBuf,

    /// Prefix for every generated type name.
    pub type_prefix: String,

    /// Whether to emit doc comments.
    pub generate_docs: bool,

    /// Reject a type name reused for a different shape.
    pub strict_names: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            definition: PathBuf::from("app_definition.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl Default for GeneratorEntry {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::default(),
            client_name: String::new(),
            output_file: PathBuf::new(),
            type_prefix: String::new(),
            generate_docs: true,
            strict_names: false,
        }
    }
}

impl GeneratorEntry {
    /// Plugin options with the output file resolved against `output_dir`.
    pub fn options(&self, output_dir: &Path) -> GeneratorOptions {
        let output_file = if self.output_file.as_os_str().is_empty() {
            PathBuf::new()
        } else {
            output_dir.join(&self.output_file)
        };
        GeneratorOptions::new(self.client_name.clone(), output_file)
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new()
            .with_type_prefix(self.type_prefix.clone())
            .with_generate_docs(self.generate_docs)
            .with_strict_names(self.strict_names)
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config = Self::parse(&config_path, &content)?;
        tracing::debug!(
            path = %config_path.display(),
            generators = config.generators.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Parse configuration text read from `path`.
    pub fn parse(path: &Path, content: &str) -> CliResult<Config> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::invalid_toml(path.to_path_buf(), e.to_string()))?;

        for (i, entry) in config.generators.iter().enumerate() {
            if entry.client_name.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("generators[{i}].client_name"),
                    "must not be empty",
                )
                .into());
            }
            if entry.output_file.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("generators[{i}].output_file"),
                    "must not be empty",
                )
                .into());
            }
        }
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref definition) = args.definition {
            config.input.definition = definition.clone();
        }

        if let Some(ref output) = args.output {
            config.output.dir = output.clone();
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# tyrpc configuration file

[input]
# App definition JSON produced by the server
definition = "app_definition.json"

[output]
# Directory generator output files are resolved against
dir = "."

[[generators]]
# Target language (typescript)
kind = "typescript"

# Name of the generated root client class
client_name = "Client"

# Output file, relative to [output].dir
output_file = "client.ts"

# Prefix prepended to every generated type name
type_prefix = ""

# Whether to emit doc comments from schema descriptions
generate_docs = true

# Fail when one type name is reused for two different shapes
strict_names = false
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Definition file override.
    pub definition: Option<PathBuf>,

    /// Output directory override.
    pub output: Option<PathBuf>,
}
