//! Compiled method records handed to the code emitter

use std::fmt;

use serde::{Deserialize, Serialize};
use crate::{MethodBody, QueryField, QueryTable, Span};

/// What a mutation returns, from the `exec=` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecKind {
    /// Last inserted id
    LastId,
    /// Number of affected rows
    Affect,
    /// Opaque driver execution result
    #[default]
    Result,
}

impl ExecKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "lastid" => Some(ExecKind::LastId),
            "affect" => Some(ExecKind::Affect),
            "result" => Some(ExecKind::Result),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ExecKind::LastId => "lastid",
            ExecKind::Affect => "affect",
            ExecKind::Result => "result",
        }
    }

    /// The declared return shape a mutation with this tag must have
    pub fn required_shape(self) -> ShapeKind {
        match self {
            ExecKind::LastId | ExecKind::Affect => ShapeKind::Int64,
            ExecKind::Result => ShapeKind::ExecResult,
        }
    }
}

/// Classification of a method's statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "exec", rename_all = "snake_case")]
pub enum StatementKind {
    SingleRow,
    MultiRow,
    Mutation(ExecKind),
}

impl StatementKind {
    pub fn is_mutation(self) -> bool {
        matches!(self, StatementKind::Mutation(_))
    }
}

/// The element type of a declared return shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ShapeKind {
    /// 64-bit integer
    Int64,
    /// Opaque execution-result type
    ExecResult,
    /// A named record or scalar type
    Named(String),
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Int64 => write!(f, "i64"),
            ShapeKind::ExecResult => write!(f, "exec_result"),
            ShapeKind::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A declared return shape, e.g. `User` or `[User]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnShape {
    pub kind: ShapeKind,
    pub collection: bool,
}

impl ReturnShape {
    pub fn single(kind: ShapeKind) -> Self {
        Self {
            kind,
            collection: false,
        }
    }

    pub fn collection(kind: ShapeKind) -> Self {
        Self {
            kind,
            collection: true,
        }
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collection {
            write!(f, "[{}]", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// A field of a synthesized result record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    /// Name in the result set (alias if present)
    pub name: String,
    /// Database type as reported by the schema
    pub db_type: String,
    pub comment: String,
    /// Provenance, e.g. `user.name`, for documentation and debugging
    pub source: String,
}

/// Result record synthesized from the query shape and table metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultShape {
    pub name: String,
    pub fields: Vec<ResultField>,
}

/// A compiled method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub owner_interface: Option<String>,
    pub is_mutation: bool,
    pub kind: StatementKind,
    pub body: MethodBody,
    /// Selected fields, resolved to canonical table names (queries only)
    pub fields: Vec<QueryField>,
    pub tables: Vec<QueryTable>,
    /// The `exec=` tag exactly as declared
    pub declared_kind_tag: Option<String>,
    pub returns: Option<ReturnShape>,
    /// Present for methods marked `auto`
    pub result_shape: Option<ResultShape>,
    pub span: Span,
}

impl Method {
    /// `Owner.Name`, or just `Name`
    pub fn qualified_name(&self) -> String {
        match &self.owner_interface {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}
