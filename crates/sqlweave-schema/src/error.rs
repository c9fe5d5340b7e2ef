//! Error types for schema lookups

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid schema file: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::TableNotFound(_) => "E-SCHEMA-001",
            SchemaError::Connection(_) => "E-SCHEMA-002",
            SchemaError::Io(_) => "E-SCHEMA-003",
            SchemaError::Json(_) => "E-SCHEMA-004",
        }
    }
}
