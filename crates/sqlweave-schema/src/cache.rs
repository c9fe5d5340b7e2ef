//! Concurrent memoization of table metadata

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::{Result, SchemaProvider, TableMeta};

/// Caches `describe_table` results by table name.
///
/// Clones share the same map and provider, so one cache can be handed to
/// every worker compiling files in parallel. Failed lookups are not cached.
#[derive(Clone)]
pub struct SchemaCache {
    provider: Arc<dyn SchemaProvider>,
    tables: Arc<DashMap<String, Arc<TableMeta>>>,
}

impl SchemaCache {
    pub fn new(provider: impl SchemaProvider + 'static) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    pub fn from_arc(provider: Arc<dyn SchemaProvider>) -> Self {
        Self {
            provider,
            tables: Arc::new(DashMap::new()),
        }
    }

    pub fn describe_table(&self, name: &str) -> Result<Arc<TableMeta>> {
        if let Some(hit) = self.tables.get(name) {
            trace!(table = name, "schema cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        debug!(table = name, "describing table");
        let meta = Arc::new(self.provider.describe_table(name)?);

        // Racing misses keep whichever entry landed first
        let entry = self.tables.entry(name.to_string()).or_insert(meta);
        Ok(Arc::clone(entry.value()))
    }

    /// Drop a cached entry so the next lookup asks the provider again
    pub fn invalidate(&self, name: &str) {
        self.tables.remove(name);
    }

    pub fn clear(&self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("cached_tables", &self.tables.len())
            .finish()
    }
}
