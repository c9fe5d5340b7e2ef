//! Parser error types

use sqlweave_ast::Span;
use sqlweave_lexer::{LexError, TokenKind};
use thiserror::Error;

/// How bad an error is, and what it aborts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Unterminated quote or placeholder, empty placeholder name
    Lexical,
    /// Malformed template or statement structure
    Structural,
    /// Well-formed input that does not make sense
    Semantic,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Lexical => write!(f, "lexical"),
            ErrorClass::Structural => write!(f, "structural"),
            ErrorClass::Semantic => write!(f, "semantic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("missing FROM clause")]
    MissingFrom { span: Span },

    #[error("empty SELECT clause")]
    EmptySelect { span: Span },

    #[error("FROM clause names no table")]
    NoTables { span: Span },

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of template: expected {expected}")]
    UnexpectedEnd { expected: String, span: Span },

    #[error("unsupported statement: expected SELECT, INSERT, UPDATE or DELETE, found {found}")]
    UnsupportedStatement { found: String, span: Span },

    #[error("unmatched directive: expected {expected}, found {found}")]
    UnmatchedDirective {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unknown directive `{found}`")]
    UnknownDirective { found: String, span: Span },

    #[error("nested directives are not supported")]
    NestedDirective { span: Span },

    #[error("`if` directive has no condition")]
    EmptyCondition { span: Span },

    #[error("malformed `for` clause: {reason}")]
    MalformedFor { reason: String, span: Span },

    #[error("template declared dynamic but contains no dynamic directive")]
    NoDynamicSegment { span: Span },

    #[error("directive in a template not declared dynamic")]
    DirectiveNotAllowed { span: Span },

    #[error("field `{field}` refers to unknown table `{table}`")]
    UnresolvedTable {
        field: String,
        table: String,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(err) => err.span(),
            ParseError::MissingFrom { span } => *span,
            ParseError::EmptySelect { span } => *span,
            ParseError::NoTables { span } => *span,
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEnd { span, .. } => *span,
            ParseError::UnsupportedStatement { span, .. } => *span,
            ParseError::UnmatchedDirective { span, .. } => *span,
            ParseError::UnknownDirective { span, .. } => *span,
            ParseError::NestedDirective { span } => *span,
            ParseError::EmptyCondition { span } => *span,
            ParseError::MalformedFor { span, .. } => *span,
            ParseError::NoDynamicSegment { span } => *span,
            ParseError::DirectiveNotAllowed { span } => *span,
            ParseError::UnresolvedTable { span, .. } => *span,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ParseError::Lex(_) => ErrorClass::Lexical,
            ParseError::UnresolvedTable { .. } => ErrorClass::Semantic,
            _ => ErrorClass::Structural,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Lex(err) => err.code(),
            ParseError::MissingFrom { .. } => "E-STRUCT-001",
            ParseError::EmptySelect { .. } => "E-STRUCT-002",
            ParseError::NoTables { .. } => "E-STRUCT-003",
            ParseError::UnexpectedToken { .. } => "E-STRUCT-004",
            ParseError::UnexpectedEnd { .. } => "E-STRUCT-005",
            ParseError::UnsupportedStatement { .. } => "E-STRUCT-006",
            ParseError::UnmatchedDirective { .. } => "E-STRUCT-007",
            ParseError::UnknownDirective { .. } => "E-STRUCT-008",
            ParseError::NestedDirective { .. } => "E-STRUCT-009",
            ParseError::EmptyCondition { .. } => "E-STRUCT-010",
            ParseError::MalformedFor { .. } => "E-STRUCT-011",
            ParseError::NoDynamicSegment { .. } => "E-STRUCT-012",
            ParseError::DirectiveNotAllowed { .. } => "E-STRUCT-013",
            ParseError::UnresolvedTable { .. } => "E-SEM-001",
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.describe(),
            span,
        }
    }

    /// Shift the span by `base` bytes
    pub fn shifted(self, base: usize) -> Self {
        match self {
            ParseError::Lex(err) => ParseError::Lex(err.shifted(base)),
            ParseError::MissingFrom { span } => ParseError::MissingFrom {
                span: span.shift(base),
            },
            ParseError::EmptySelect { span } => ParseError::EmptySelect {
                span: span.shift(base),
            },
            ParseError::NoTables { span } => ParseError::NoTables {
                span: span.shift(base),
            },
            ParseError::UnexpectedToken {
                expected,
                found,
                span,
            } => ParseError::UnexpectedToken {
                expected,
                found,
                span: span.shift(base),
            },
            ParseError::UnexpectedEnd { expected, span } => ParseError::UnexpectedEnd {
                expected,
                span: span.shift(base),
            },
            ParseError::UnsupportedStatement { found, span } => ParseError::UnsupportedStatement {
                found,
                span: span.shift(base),
            },
            ParseError::UnmatchedDirective {
                expected,
                found,
                span,
            } => ParseError::UnmatchedDirective {
                expected,
                found,
                span: span.shift(base),
            },
            ParseError::UnknownDirective { found, span } => ParseError::UnknownDirective {
                found,
                span: span.shift(base),
            },
            ParseError::NestedDirective { span } => ParseError::NestedDirective {
                span: span.shift(base),
            },
            ParseError::EmptyCondition { span } => ParseError::EmptyCondition {
                span: span.shift(base),
            },
            ParseError::MalformedFor { reason, span } => ParseError::MalformedFor {
                reason,
                span: span.shift(base),
            },
            ParseError::NoDynamicSegment { span } => ParseError::NoDynamicSegment {
                span: span.shift(base),
            },
            ParseError::DirectiveNotAllowed { span } => ParseError::DirectiveNotAllowed {
                span: span.shift(base),
            },
            ParseError::UnresolvedTable { field, table, span } => ParseError::UnresolvedTable {
                field,
                table,
                span: span.shift(base),
            },
        }
    }
}
