//! Schema introspection interface

use std::collections::HashMap;

use crate::{Result, SchemaError, TableMeta};

/// Source of table metadata, e.g. a live database connection.
///
/// Calls are synchronous and may block on I/O; timeouts and cancellation
/// belong to the implementation, not to its callers.
pub trait SchemaProvider: Send + Sync {
    /// Describe a table, failing with `TableNotFound` or `Connection`
    fn describe_table(&self, name: &str) -> Result<TableMeta>;
}

/// Schema held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySchema {
    tables: HashMap<String, TableMeta>,
}

impl MemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableMeta) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: TableMeta) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<TableMeta> for MemorySchema {
    fn from_iter<I: IntoIterator<Item = TableMeta>>(iter: I) -> Self {
        let mut schema = MemorySchema::new();
        for table in iter {
            schema.insert(table);
        }
        schema
    }
}

impl SchemaProvider for MemorySchema {
    fn describe_table(&self, name: &str) -> Result<TableMeta> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))
    }
}
