//! Compile-once validator cache.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::program::reachable_models;
use super::Validator;
use crate::error::SchemaResult;
use crate::schema::{Models, SchemaNode};

static GLOBAL: Lazy<ValidatorCache> = Lazy::new(ValidatorCache::new);

/// Process-wide cache used by [`super::compile`].
pub fn global() -> &'static ValidatorCache {
    &GLOBAL
}

/// Thread-safe map from schema identity to compiled validator.
///
/// A schema is identified by its own fingerprint together with the
/// fingerprints of every model it can reach, so two model arenas that
/// disagree on a reachable model never share an entry.
#[derive(Debug, Default)]
pub struct ValidatorCache {
    entries: DashMap<String, Arc<Validator>>,
}

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached validator for `schema`, compiling it on first use.
    ///
    /// The entry's shard stays locked while compiling, so concurrent callers
    /// asking for the same schema wait for the first compilation and then
    /// share its result.
    #[tracing::instrument(skip_all)]
    pub fn get_or_compile(&self, schema: &SchemaNode, models: &Models) -> SchemaResult<Arc<Validator>> {
        let key = cache_key(schema, models);
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                tracing::debug!("validator cache hit");
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                tracing::trace!("validator cache miss");
                let validator = Arc::new(Validator::compile(schema, models)?);
                entry.insert(Arc::clone(&validator));
                Ok(validator)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

fn cache_key(schema: &SchemaNode, models: &Models) -> String {
    let mut key = schema.fingerprint();
    for (name, node) in reachable_models(schema, models) {
        key.push('\n');
        key.push_str(name);
        key.push('=');
        key.push_str(&node.fingerprint());
    }
    key
}
