//! Schema snapshot stored as a JSON file
//!
//! ```json
//! { "tables": [ { "name": "user", "comment": "accounts",
//!     "columns": [ { "name": "id", "db_type": "BIGINT", "is_primary_key": true } ] } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{MemorySchema, Result, SchemaProvider, TableMeta};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SchemaFile {
    tables: Vec<TableMeta>,
}

/// Provider backed by a JSON schema snapshot
#[derive(Debug, Clone, Default)]
pub struct JsonSchema {
    inner: MemorySchema,
}

impl JsonSchema {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Ok(Self {
            inner: file.tables.into_iter().collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let schema = Self::from_json(&json)?;
        debug!(path = %path.display(), tables = schema.inner.len(), "loaded schema file");
        Ok(schema)
    }
}

impl SchemaProvider for JsonSchema {
    fn describe_table(&self, name: &str) -> Result<TableMeta> {
        self.inner.describe_table(name)
    }
}
