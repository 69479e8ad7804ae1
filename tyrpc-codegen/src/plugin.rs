//! Generator plugin boundary.
//!
//! A [`ClientGenerator`] renders an [`AppDefinition`] into files without
//! touching the filesystem; [`GeneratedFile::write`] is the only place
//! output is written.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tyrpc::AppDefinition;

use crate::error::{CodegenError, CodegenResult};

/// Options every client generator requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    /// Name of the root client type.
    pub client_name: String,

    /// File the client is written to.
    pub output_file: PathBuf,
}

impl GeneratorOptions {
    pub fn new(client_name: impl Into<String>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            client_name: client_name.into(),
            output_file: output_file.into(),
        }
    }

    /// Fail with [`CodegenError::MissingOption`] when an option is empty.
    pub fn validate(&self, generator: &'static str) -> CodegenResult<()> {
        if self.client_name.trim().is_empty() {
            return Err(CodegenError::MissingOption {
                generator,
                option: "client_name",
            });
        }
        if self.output_file.as_os_str().is_empty() {
            return Err(CodegenError::MissingOption {
                generator,
                option: "output_file",
            });
        }
        Ok(())
    }
}

/// A rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    /// Write the file, creating missing parent directories.
    pub fn write(&self) -> CodegenResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
        }
        fs::write(&self.path, &self.contents).map_err(|e| CodegenError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), bytes = self.contents.len(), "wrote file");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Trait for client generators.
pub trait ClientGenerator: Send + Sync {
    /// Identifier of the target (`"typescript"`).
    fn id(&self) -> &'static str;

    fn options(&self) -> &GeneratorOptions;

    /// Render the client for `definition`.
    fn render(&self, definition: &AppDefinition) -> CodegenResult<Vec<GeneratedFile>>;

    /// Render and write the client, returning the written paths.
    fn generate(&self, definition: &AppDefinition) -> CodegenResult<Vec<PathBuf>> {
        let files = self.render(definition)?;
        let mut written = Vec::with_capacity(files.len());
        for file in files {
            file.write()?;
            tracing::info!(generator = self.id(), path = %file.path.display(), "wrote client");
            written.push(file.path);
        }
        Ok(written)
    }
}

/// A configured generator, as returned by a backend's `plugin` constructor.
pub struct GeneratorPlugin {
    pub generator: Box<dyn ClientGenerator>,
    pub options: GeneratorOptions,
}

impl GeneratorPlugin {
    pub fn new(generator: Box<dyn ClientGenerator>) -> Self {
        let options = generator.options().clone();
        Self { generator, options }
    }

    pub fn id(&self) -> &'static str {
        self.generator.id()
    }

    pub fn render(&self, definition: &AppDefinition) -> CodegenResult<Vec<GeneratedFile>> {
        self.generator.render(definition)
    }

    pub fn generate(&self, definition: &AppDefinition) -> CodegenResult<Vec<PathBuf>> {
        self.generator.generate(definition)
    }
}

impl fmt::Debug for GeneratorPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorPlugin")
            .field("generator", &self.generator.id())
            .field("options", &self.options)
            .finish()
    }
}
