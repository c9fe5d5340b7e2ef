//! Build errors and file-level diagnostics

use std::fmt;
use std::path::PathBuf;

use sqlweave_ast::Span;
use sqlweave_parser::{ErrorClass, ParseError};
use sqlweave_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("text outside of a method block; start methods with `-- name: <Method>`")]
    TextOutsideMethod { span: Span },

    #[error("invalid method header: {reason}")]
    InvalidHeader { reason: String, span: Span },

    #[error("method `{name}` has an empty template")]
    EmptyBody { name: String, span: Span },

    #[error("duplicate method `{name}`")]
    DuplicateMethod { name: String, first: Span, span: Span },

    #[error("unknown option `{key}`")]
    UnknownOption { key: String, span: Span },

    #[error("invalid option `{key}`: {reason}")]
    InvalidOption {
        key: String,
        reason: String,
        span: Span,
    },

    #[error("method returns nothing; declare `returns=<type>`")]
    MissingReturnShape { span: Span },

    #[error("declared return shape mismatch: expected {expected}, found {found}")]
    ReturnShapeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("`auto` only applies to queries")]
    AutoOnMutation { span: Span },

    #[error("`auto` needs a named record return type, found {found}")]
    AutoNeedsRecord { found: String, span: Span },

    #[error("`auto` needs table metadata but no schema is configured")]
    NoSchema { span: Span },

    #[error("schema lookup for table `{table}` failed: {source}")]
    Schema {
        table: String,
        #[source]
        source: SchemaError,
        span: Span,
    },

    #[error("column `{column}` not found in table `{table}`")]
    MissingColumn {
        table: String,
        column: String,
        span: Span,
    },

    #[error("result field `{name}` appears more than once")]
    DuplicateResultField { name: String, span: Span },

    #[error("`auto` cannot type field `{name}`: it is not a column reference")]
    OpaqueField { name: String, span: Span },

    #[error("`auto` cannot describe table `{table}`: its name is substituted at run time")]
    OpaqueTable { table: String, span: Span },
}

impl BuildError {
    pub fn span(&self) -> Span {
        match self {
            BuildError::Parse(err) => err.span(),
            BuildError::TextOutsideMethod { span } => *span,
            BuildError::InvalidHeader { span, .. } => *span,
            BuildError::EmptyBody { span, .. } => *span,
            BuildError::DuplicateMethod { span, .. } => *span,
            BuildError::UnknownOption { span, .. } => *span,
            BuildError::InvalidOption { span, .. } => *span,
            BuildError::MissingReturnShape { span } => *span,
            BuildError::ReturnShapeMismatch { span, .. } => *span,
            BuildError::AutoOnMutation { span } => *span,
            BuildError::AutoNeedsRecord { span, .. } => *span,
            BuildError::NoSchema { span } => *span,
            BuildError::Schema { span, .. } => *span,
            BuildError::MissingColumn { span, .. } => *span,
            BuildError::DuplicateResultField { span, .. } => *span,
            BuildError::OpaqueField { span, .. } => *span,
            BuildError::OpaqueTable { span, .. } => *span,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            BuildError::Parse(err) => err.class(),
            BuildError::TextOutsideMethod { .. }
            | BuildError::InvalidHeader { .. }
            | BuildError::EmptyBody { .. }
            | BuildError::DuplicateMethod { .. } => ErrorClass::Structural,
            _ => ErrorClass::Semantic,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::Parse(err) => err.code(),
            BuildError::TextOutsideMethod { .. } => "E-STRUCT-101",
            BuildError::InvalidHeader { .. } => "E-STRUCT-102",
            BuildError::EmptyBody { .. } => "E-STRUCT-103",
            BuildError::DuplicateMethod { .. } => "E-STRUCT-104",
            BuildError::UnknownOption { .. } => "E-SEM-101",
            BuildError::InvalidOption { .. } => "E-SEM-102",
            BuildError::MissingReturnShape { .. } => "E-SEM-103",
            BuildError::ReturnShapeMismatch { .. } => "E-SEM-104",
            BuildError::AutoOnMutation { .. } => "E-SEM-105",
            BuildError::AutoNeedsRecord { .. } => "E-SEM-106",
            BuildError::NoSchema { .. } => "E-SEM-107",
            BuildError::Schema { .. } => "E-SEM-108",
            BuildError::MissingColumn { .. } => "E-SEM-109",
            BuildError::DuplicateResultField { .. } => "E-SEM-110",
            BuildError::OpaqueField { .. } => "E-SEM-111",
            BuildError::OpaqueTable { .. } => "E-SEM-112",
        }
    }
}

/// A build error located in a template file.
///
/// Compilation of a file stops at the first error, so no partial output
/// exists when one is returned.
#[derive(Debug)]
pub struct CompileError {
    pub path: PathBuf,
    /// 1-based line of the error start
    pub line: usize,
    /// 1-based column (in characters) of the error start
    pub column: usize,
    /// Byte offset of the error in the file
    pub offset: usize,
    pub error: BuildError,
}

impl CompileError {
    pub fn new(path: impl Into<PathBuf>, source: &str, error: BuildError) -> Self {
        let offset = error.span().start.min(source.len());
        let (line, column) = line_column(source, offset);
        Self {
            path: path.into(),
            line,
            column,
            offset,
            error,
        }
    }

    pub fn span(&self) -> Span {
        self.error.span()
    }

    pub fn class(&self) -> ErrorClass {
        self.error.class()
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} error [{}]: {}",
            self.path.display(),
            self.line,
            self.column,
            self.class(),
            self.code(),
            self.error
        )
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// 1-based line and column of a byte offset
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
