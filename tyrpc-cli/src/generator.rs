//! Generator dispatch.
//!
//! Each `[[generators]]` entry becomes a plugin and renders independently;
//! entries run in parallel on the rayon pool and report in config order.

use std::path::Path;

use rayon::prelude::*;
use tyrpc::AppDefinition;
use tyrpc_codegen::{typescript, CodegenResult, GeneratedFile, GeneratorPlugin};

use crate::config::{Config, GeneratorEntry, GeneratorKind};

/// Outcome of one generator entry.
#[derive(Debug)]
pub struct GeneratorRun {
    pub kind: GeneratorKind,
    pub client_name: String,
    pub result: CodegenResult<Vec<GeneratedFile>>,
}

impl GeneratorRun {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Build the plugin for one entry.
pub fn build_plugin(entry: &GeneratorEntry, output_dir: &Path) -> CodegenResult<GeneratorPlugin> {
    match entry.kind {
        GeneratorKind::Typescript => {
            typescript::plugin(entry.options(output_dir), entry.generator_config())
        }
    }
}

/// Render every configured generator against `definition`.
#[tracing::instrument(skip_all, fields(generators = config.generators.len()))]
pub fn render_all(definition: &AppDefinition, config: &Config) -> Vec<GeneratorRun> {
    config
        .generators
        .par_iter()
        .map(|entry| {
            let result = build_plugin(entry, &config.output.dir)
                .and_then(|plugin| plugin.render(definition));
            if let Err(e) = &result {
                tracing::debug!(client = %entry.client_name, error = %e, "generator failed");
            }
            GeneratorRun {
                kind: entry.kind,
                client_name: entry.client_name.clone(),
                result,
            }
        })
        .collect()
}
