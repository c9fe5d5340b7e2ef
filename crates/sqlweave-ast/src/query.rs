//! Query shape nodes: selected fields and source tables

use serde::{Deserialize, Serialize};
use crate::Span;

/// Synthetic name given to `COUNT(...)` fields
pub const COUNT_FIELD: &str = "count";

/// Name of wildcard fields (`*`, `t.*`)
pub const WILDCARD_FIELD: &str = "*";

/// A field in the select list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryField {
    /// Qualifier as written before resolution, canonical table name after
    pub table: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub is_aggregate: bool,
    /// Not a column reference: a literal, a placeholder or substituted
    /// text. `name` holds the text as written.
    #[serde(default)]
    pub is_opaque: bool,
    pub span: Span,
}

impl QueryField {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            table: None,
            name: name.into(),
            alias: None,
            is_aggregate: false,
            is_opaque: false,
            span,
        }
    }

    pub fn opaque(text: impl Into<String>, span: Span) -> Self {
        Self {
            is_opaque: true,
            ..Self::new(text, span)
        }
    }

    /// The name the column has in the result set
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD_FIELD
    }
}

/// A table introduced by `FROM` or `JOIN`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTable {
    pub name: String,
    pub alias: Option<String>,
    /// Named by a placeholder (`#{table}`); `name` is the placeholder text
    #[serde(default)]
    pub is_opaque: bool,
    pub span: Span,
}

/// Fields and tables of an analyzed `SELECT`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryShape {
    pub fields: Vec<QueryField>,
    pub tables: Vec<QueryTable>,
}
