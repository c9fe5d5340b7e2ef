//! Lexical errors

use sqlweave_ast::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// E-LEX-001
    #[error("unterminated quoted literal starting with {quote}")]
    UnterminatedQuote { quote: char, span: Span },

    /// E-LEX-002
    #[error("unterminated placeholder: missing closing `}}`")]
    UnterminatedPlaceholder { span: Span },

    /// E-LEX-003
    #[error("empty placeholder name")]
    EmptyPlaceholder { span: Span },

    /// E-LEX-004
    #[error("unterminated directive: missing closing `}}`")]
    UnterminatedDirective { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedQuote { span, .. } => *span,
            LexError::UnterminatedPlaceholder { span } => *span,
            LexError::EmptyPlaceholder { span } => *span,
            LexError::UnterminatedDirective { span } => *span,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            LexError::UnterminatedQuote { .. } => "E-LEX-001",
            LexError::UnterminatedPlaceholder { .. } => "E-LEX-002",
            LexError::EmptyPlaceholder { .. } => "E-LEX-003",
            LexError::UnterminatedDirective { .. } => "E-LEX-004",
        }
    }

    /// Shift the span by `base` bytes
    pub fn shifted(self, base: usize) -> Self {
        match self {
            LexError::UnterminatedQuote { quote, span } => LexError::UnterminatedQuote {
                quote,
                span: span.shift(base),
            },
            LexError::UnterminatedPlaceholder { span } => LexError::UnterminatedPlaceholder {
                span: span.shift(base),
            },
            LexError::EmptyPlaceholder { span } => LexError::EmptyPlaceholder {
                span: span.shift(base),
            },
            LexError::UnterminatedDirective { span } => LexError::UnterminatedDirective {
                span: span.shift(base),
            },
        }
    }
}
