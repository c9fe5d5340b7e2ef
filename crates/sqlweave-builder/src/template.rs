//! Splitting a template file into method blocks
//!
//! ```text
//! -- name: UserDao.FindById returns=User auto
//! SELECT id, name FROM user WHERE id = ${id}
//! ```

use sqlweave_ast::Span;

use crate::{BuildError, RawOption};

const HEADER_TAG: &str = "name:";

/// One method block as written in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSource {
    pub name: String,
    pub owner: Option<String>,
    pub options: Vec<RawOption>,
    pub header_span: Span,
    pub name_span: Span,
    /// Template text; `--` comments are blanked with spaces
    pub body: String,
    /// Offset of `body` in the file
    pub body_offset: usize,
}

impl MethodSource {
    /// Span of the whole block, header included
    pub fn span(&self) -> Span {
        self.header_span
            .merge(Span::new(self.body_offset, self.body_offset + self.body.len()))
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("--")
}

/// Header text after `name:`, with its offset in `line`
fn header_rest(line: &str) -> Option<(&str, usize)> {
    let trimmed = line.trim_start();
    let after_dashes = trimmed.strip_prefix("--")?;
    let tagged = after_dashes.trim_start();
    let rest = tagged.strip_prefix(HEADER_TAG)?;
    Some((rest, line.len() - rest.len()))
}

/// Whitespace separated words with their spans
fn words(text: &str, base: usize) -> Vec<(&str, Span)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                words.push((&text[s..i], Span::new(base + s, base + i)));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((&text[s..], Span::new(base + s, base + text.len())));
    }
    words
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_header(line: &str, offset: usize) -> Result<MethodSource, BuildError> {
    let header_span = Span::new(offset, offset + line.trim_end().len());
    let (rest, rest_offset) = header_rest(line).ok_or_else(|| BuildError::InvalidHeader {
        reason: "expected `-- name: <Method>`".to_string(),
        span: header_span,
    })?;

    let mut words = words(rest, offset + rest_offset).into_iter();
    let Some((qualified, name_span)) = words.next() else {
        return Err(BuildError::InvalidHeader {
            reason: "missing method name".to_string(),
            span: header_span,
        });
    };

    let (owner, name) = match qualified.rsplit_once('.') {
        Some((owner, name)) => (Some(owner), name),
        None => (None, qualified),
    };
    if !is_identifier(name) || owner.is_some_and(|o| !is_identifier(o)) {
        return Err(BuildError::InvalidHeader {
            reason: format!("`{}` is not a valid method name", qualified),
            span: name_span,
        });
    }

    Ok(MethodSource {
        name: name.to_string(),
        owner: owner.map(str::to_string),
        options: words.map(|(word, span)| RawOption::parse(word, span)).collect(),
        header_span,
        name_span,
        body: String::new(),
        body_offset: offset + line.len(),
    })
}

/// Blank the `--` comment of `line`, if any, keeping byte offsets.
///
/// `quote` carries an open quote across lines; `--` inside quotes is text.
fn blank_comment(line: &str, quote: &mut Option<char>) -> String {
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match (*quote, c) {
            (Some(q), c) if c == q => *quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => *quote = Some(c),
            (None, '-') if matches!(chars.peek(), Some((_, '-'))) => {
                let (text, comment) = line.split_at(i);
                let blanked: String = comment
                    .chars()
                    .map(|c| match c {
                        '\n' | '\r' => c.to_string(),
                        _ => " ".repeat(c.len_utf8()),
                    })
                    .collect();
                return format!("{}{}", text, blanked);
            }
            (None, _) => {}
        }
    }
    line.to_string()
}

/// Split a template file into its method blocks, in file order
pub fn split_methods(source: &str) -> Result<Vec<MethodSource>, BuildError> {
    let mut methods: Vec<MethodSource> = Vec::new();
    let mut offset = 0;
    let mut quote = None;

    for line in source.split_inclusive('\n') {
        if header_rest(line).is_some() {
            methods.push(parse_header(line, offset)?);
            quote = None;
        } else if let Some(current) = methods.last_mut() {
            current.body.push_str(&blank_comment(line, &mut quote));
        } else if !line.trim().is_empty() && !is_comment(line) {
            let start = offset + (line.len() - line.trim_start().len());
            return Err(BuildError::TextOutsideMethod {
                span: Span::new(start, offset + line.trim_end().len()),
            });
        }
        offset += line.len();
    }

    Ok(methods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_methods() {
        let source = "\
-- user queries
-- name: UserDao.FindById returns=User auto
SELECT id FROM user
WHERE id = ${id}

-- name: Delete exec=affect
DELETE FROM user WHERE id = ${id}
";
        let methods = split_methods(source).unwrap();
        assert_eq!(methods.len(), 2);

        let find = &methods[0];
        assert_eq!(find.name, "FindById");
        assert_eq!(find.owner.as_deref(), Some("UserDao"));
        assert_eq!(find.options.len(), 2);
        assert_eq!(find.options[0].key, "returns");
        assert_eq!(find.options[0].value.as_deref(), Some("User"));
        assert_eq!(find.options[1].key, "auto");
        assert_eq!(find.body, "SELECT id FROM user\nWHERE id = ${id}\n\n");
        assert_eq!(&source[find.body_offset..find.body_offset + 6], "SELECT");
        assert_eq!(&source[find.name_span.start..find.name_span.end], "UserDao.FindById");

        let delete = &methods[1];
        assert!(delete.owner.is_none());
        assert_eq!(&source[delete.options[0].span.start..delete.options[0].span.end], "exec=affect");
    }

    #[test]
    fn test_comment_lines_are_blanked() {
        let source = "-- name: A returns=X\nSELECT a -- keep\n  -- drop é\nFROM t\n";
        let methods = split_methods(source).unwrap();
        let body = &methods[0].body;
        assert!(body.starts_with("SELECT a "));
        assert!(!body.contains("keep"));
        assert!(!body.contains("drop"));
        assert_eq!(body.len(), source.len() - methods[0].body_offset);
        let from = body.find("FROM").unwrap();
        assert_eq!(&source[methods[0].body_offset + from..][..4], "FROM");
    }

    #[test]
    fn test_trailing_comments_are_blanked() {
        let source = "-- name: A returns=X\nSELECT id, -- primary key\n  name -- display\nFROM user\n";
        let methods = split_methods(source).unwrap();
        let body = &methods[0].body;
        assert!(!body.contains("--"), "comment left in {:?}", body);
        assert!(!body.contains("primary"));
        assert_eq!(body.len(), source.len() - methods[0].body_offset);
        let name = body.find("name").unwrap();
        assert_eq!(&source[methods[0].body_offset + name..][..4], "name");
    }

    #[test]
    fn test_dashes_inside_quotes_are_text() {
        let source = "-- name: A returns=X\nSELECT id FROM t WHERE a = '--x' AND b = \"-- y\" -- real\n";
        let body = &split_methods(source).unwrap()[0].body;
        assert!(body.contains("'--x'"));
        assert!(body.contains("\"-- y\""));
        assert!(!body.contains("real"));
    }

    #[test]
    fn test_quote_spanning_lines() {
        let source = "-- name: A exec=affect\nUPDATE t SET note = 'a\n-- not a comment' -- gone\n";
        let body = &split_methods(source).unwrap()[0].body;
        assert!(body.contains("-- not a comment'"));
        assert!(!body.contains("gone"));
    }

    #[test]
    fn test_text_before_first_header() {
        let err = split_methods("SELECT 1\n-- name: A\n").unwrap_err();
        assert!(matches!(err, BuildError::TextOutsideMethod { span } if span == Span::new(0, 8)));
    }

    #[test]
    fn test_header_without_name() {
        let err = split_methods("-- name:   \nSELECT 1").unwrap_err();
        assert!(matches!(err, BuildError::InvalidHeader { .. }));
    }

    #[test]
    fn test_invalid_method_name() {
        let err = split_methods("-- name: Find-All\nSELECT 1").unwrap_err();
        assert!(matches!(err, BuildError::InvalidHeader { .. }));
    }

    #[test]
    fn test_empty_file() {
        assert!(split_methods("").unwrap().is_empty());
        assert!(split_methods("-- nothing here\n\n").unwrap().is_empty());
    }
}
