//! Statement classification against declared method metadata

use sqlweave_ast::{ReturnShape, ShapeKind, Span, StatementKind};
use sqlweave_lexer::{Cursor, Keyword, Lexicon, Symbol, TokenKind};
use sqlweave_parser::ParseError;
use tracing::warn;

use crate::{BuildError, MethodOptions};

/// The statement keyword of a template, skipping leading
/// directive and placeholder spans
pub fn leading_keyword(text: &str, lexicon: &Lexicon) -> Result<(Keyword, Span), ParseError> {
    let mut cursor = Cursor::new(text, lexicon);
    loop {
        let Some(token) = cursor.next()? else {
            return Err(ParseError::UnexpectedEnd {
                expected: "SELECT, INSERT, UPDATE or DELETE".to_string(),
                span: Span::at(text.len()),
            });
        };

        match token.kind {
            TokenKind::Symbol(sym) if sym.opens_brace() => {
                while let Some(inner) = cursor.next()? {
                    if inner.is_symbol(Symbol::RBrace) {
                        break;
                    }
                }
            }
            TokenKind::Keyword(
                kw @ (Keyword::Select | Keyword::Insert | Keyword::Update | Keyword::Delete),
            ) => return Ok((kw, token.span)),
            other => {
                return Err(ParseError::UnsupportedStatement {
                    found: other.describe(),
                    span: token.span,
                })
            }
        }
    }
}

/// Decide the statement kind and the effective return shape.
///
/// | keyword                | `exec=`            | outcome                                  |
/// |------------------------|--------------------|------------------------------------------|
/// | INSERT/UPDATE/DELETE   | `affect`, `lastid` | mutation returning `i64`                 |
/// | INSERT/UPDATE/DELETE   | `result` (default) | mutation returning `exec_result`         |
/// | SELECT                 | ignored            | single-row, or multi-row for `[T]`       |
pub fn classify(
    keyword: Keyword,
    options: &MethodOptions,
    keyword_span: Span,
) -> Result<(StatementKind, ReturnShape), BuildError> {
    let returns_span = options.span_of("returns").unwrap_or(keyword_span);

    if keyword.is_mutation() {
        if options.auto {
            return Err(BuildError::AutoOnMutation {
                span: options.span_of("auto").unwrap_or(keyword_span),
            });
        }

        let exec = options.exec.unwrap_or_default();
        let required = exec.required_shape();
        let returns = match &options.returns {
            None => ReturnShape::single(required),
            Some(shape) if !shape.collection && shape.kind == required => shape.clone(),
            Some(shape) => {
                return Err(BuildError::ReturnShapeMismatch {
                    expected: format!("{} for exec={}", required, exec.tag()),
                    found: shape.to_string(),
                    span: returns_span,
                })
            }
        };
        return Ok((StatementKind::Mutation(exec), returns));
    }

    if let Some(tag) = &options.exec_tag {
        warn!(exec = %tag, "`exec` has no effect on a SELECT; ignored");
    }

    let Some(returns) = options.returns.clone() else {
        return Err(BuildError::MissingReturnShape { span: keyword_span });
    };
    if returns.kind == ShapeKind::ExecResult {
        return Err(BuildError::ReturnShapeMismatch {
            expected: "a record or scalar type for a SELECT".to_string(),
            found: returns.to_string(),
            span: returns_span,
        });
    }
    if options.auto && !matches!(returns.kind, ShapeKind::Named(_)) {
        return Err(BuildError::AutoNeedsRecord {
            found: returns.to_string(),
            span: returns_span,
        });
    }

    let kind = if returns.collection {
        StatementKind::MultiRow
    } else {
        StatementKind::SingleRow
    };
    Ok((kind, returns))
}
