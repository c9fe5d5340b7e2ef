//! Placeholder resolution: `${name}` and `#{name}`
//!
//! Turns literal template text into a [`Statement`] whose text carries
//! positional markers in place of the placeholders.

use sqlweave_ast::{Span, Statement};
use sqlweave_lexer::LexError;

/// Markers written in place of placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Replaces `${name}`; a database bind parameter
    pub bind: String,
    /// Replaces `#{name}`; a text formatting verb
    pub substitute: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            bind: "?".to_string(),
            substitute: "%v".to_string(),
        }
    }
}

#[derive(Clone, Copy)]
enum Placeholder {
    Bind,
    Substitute,
}

/// Resolve the placeholders of `text`.
///
/// Whitespace runs collapse to one space and the result is trimmed.
/// Parameter names are recorded once per occurrence, in source order.
/// Error spans are relative to `text`.
pub fn resolve_placeholders(text: &str, markers: &Markers) -> Result<Statement, LexError> {
    let mut stmt = Statement::default();
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        let placeholder = match c {
            '$' => Some(Placeholder::Bind),
            '#' => Some(Placeholder::Substitute),
            _ => None,
        };
        let opens = matches!(chars.peek(), Some((_, '{')));

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        let kind = match placeholder {
            Some(kind) if opens => kind,
            _ => {
                out.push(c);
                continue;
            }
        };

        chars.next();
        let name_start = start + 2;
        let mut name_end = None;
        for (i, c) in chars.by_ref() {
            if c == '}' {
                name_end = Some(i);
                break;
            }
        }
        let name_end = name_end.ok_or(LexError::UnterminatedPlaceholder {
            span: Span::new(start, text.len()),
        })?;

        let name = text[name_start..name_end].trim();
        if name.is_empty() {
            return Err(LexError::EmptyPlaceholder {
                span: Span::new(start, name_end + 1),
            });
        }

        match kind {
            Placeholder::Bind => {
                out.push_str(&markers.bind);
                stmt.bind_params.push(name.to_string());
            }
            Placeholder::Substitute => {
                out.push_str(&markers.substitute);
                stmt.substitute_params.push(name.to_string());
            }
        }
    }

    stmt.text = out;
    Ok(stmt)
}
