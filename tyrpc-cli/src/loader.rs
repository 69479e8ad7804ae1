//! App definition loading.

use std::path::Path;

use tyrpc::AppDefinition;

use crate::error::{CliResult, LoadError};

/// Read, parse and validate the definition at `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_definition(path: &Path) -> CliResult<AppDefinition> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let definition = AppDefinition::from_json_str(&content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    definition.validate().map_err(|e| LoadError::Invalid {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        procedures = definition.procedures.len(),
        models = definition.models.len(),
        "loaded definition"
    );
    Ok(definition)
}
