//! Dynamic segment parsing: `%{if ...}` / `%{for ...}` blocks

use sqlweave_ast::{Span, TemplateSegment};
use sqlweave_lexer::{tokenize_directive, DirectiveKind, DirectiveToken, LexError};
use tracing::debug;

use crate::{resolve_placeholders, Markers, ParseError};

const DIRECTIVE_OPEN: &str = "%{";

/// Offset of the first directive opener in `text`, if any
pub fn find_directive(text: &str) -> Option<usize> {
    text.find(DIRECTIVE_OPEN)
}

/// A `%{ ... }` directive located in the template
struct Directive<'a> {
    header: &'a str,
    /// Offset of the header text inside the template
    header_start: usize,
    tokens: Vec<DirectiveToken>,
    /// The whole directive, opener to closer
    span: Span,
}

impl Directive<'_> {
    fn first(&self) -> Option<DirectiveKind> {
        self.tokens.first().map(|t| t.kind)
    }

    fn name(&self) -> &str {
        self.tokens
            .first()
            .map(|t| t.text(self.header))
            .unwrap_or("")
    }

    fn token_span(&self, token: &DirectiveToken) -> Span {
        token.span.shift(self.header_start)
    }
}

/// Splits a dynamic template into ordered segments
struct SegmentParser<'a> {
    source: &'a str,
    markers: &'a Markers,
    pos: usize,
    segments: Vec<TemplateSegment>,
}

impl<'a> SegmentParser<'a> {
    fn new(source: &'a str, markers: &'a Markers) -> Self {
        Self {
            source,
            markers,
            pos: 0,
            segments: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Vec<TemplateSegment>, ParseError> {
        while let Some(open) = self.next_opener() {
            self.flush_constant(self.pos, open)?;
            let directive = self.read_directive(open)?;
            self.pos = directive.span.end;

            match directive.first() {
                Some(DirectiveKind::If) => self.parse_if(&directive)?,
                Some(DirectiveKind::For) => self.parse_for(&directive)?,
                Some(DirectiveKind::EndIf) | Some(DirectiveKind::EndFor) => {
                    return Err(ParseError::UnmatchedDirective {
                        expected: "`if` or `for`".to_string(),
                        found: format!("`{}`", directive.name()),
                        span: directive.span,
                    });
                }
                _ => {
                    return Err(ParseError::UnknownDirective {
                        found: directive.header.trim().to_string(),
                        span: directive.span,
                    });
                }
            }
        }
        self.flush_constant(self.pos, self.source.len())?;

        if !self.segments.iter().any(TemplateSegment::is_dynamic) {
            return Err(ParseError::NoDynamicSegment {
                span: Span::new(0, self.source.len()),
            });
        }
        Ok(self.segments)
    }

    fn next_opener(&self) -> Option<usize> {
        find_directive(&self.source[self.pos..]).map(|i| self.pos + i)
    }

    fn resolve(&self, start: usize, end: usize) -> Result<sqlweave_ast::Statement, ParseError> {
        resolve_placeholders(&self.source[start..end], self.markers)
            .map_err(|err| ParseError::from(err.shifted(start)))
    }

    fn flush_constant(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        let stmt = self.resolve(start, end)?;
        if !stmt.is_empty() {
            self.segments.push(TemplateSegment::Constant(stmt));
        }
        Ok(())
    }

    /// Read the directive whose opener starts at `open`
    fn read_directive(&self, open: usize) -> Result<Directive<'a>, ParseError> {
        let header_start = open + DIRECTIVE_OPEN.len();
        let mut quote: Option<char> = None;

        for (i, c) in self.source[header_start..].char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'') | (None, '"') => quote = Some(c),
                (None, '}') => {
                    let header_end = header_start + i;
                    let header = &self.source[header_start..header_end];
                    return Ok(Directive {
                        header,
                        header_start,
                        tokens: tokenize_directive(header),
                        span: Span::new(open, header_end + 1),
                    });
                }
                (None, _) => {}
            }
        }

        Err(LexError::UnterminatedDirective {
            span: Span::new(open, self.source.len()),
        }
        .into())
    }

    /// Scan the body of an open block up to its end tag.
    ///
    /// Returns the body range; `self.pos` moves past the end tag.
    fn read_body(&mut self, opener: &Directive<'_>, end: DirectiveKind) -> Result<(usize, usize), ParseError> {
        let (expected, other) = match end {
            DirectiveKind::EndIf => ("`endif`", DirectiveKind::EndFor),
            _ => ("`endfor`", DirectiveKind::EndIf),
        };
        let body_start = self.pos;

        let Some(close) = self.next_opener() else {
            return Err(ParseError::UnmatchedDirective {
                expected: expected.to_string(),
                found: "end of template".to_string(),
                span: opener.span,
            });
        };
        let directive = self.read_directive(close)?;

        match directive.first() {
            Some(kind) if kind == end => {
                if let Some(extra) = directive.tokens.get(1) {
                    return Err(unexpected_token(&directive, extra, "`}`"));
                }
            }
            Some(kind) if kind == other => {
                return Err(ParseError::UnmatchedDirective {
                    expected: expected.to_string(),
                    found: format!("`{}`", directive.name()),
                    span: directive.span,
                });
            }
            Some(DirectiveKind::If) | Some(DirectiveKind::For) => {
                return Err(ParseError::NestedDirective {
                    span: directive.span,
                });
            }
            _ => {
                return Err(ParseError::UnknownDirective {
                    found: directive.header.trim().to_string(),
                    span: directive.span,
                });
            }
        }

        self.pos = directive.span.end;
        Ok((body_start, close))
    }

    fn parse_if(&mut self, directive: &Directive<'_>) -> Result<(), ParseError> {
        let keyword_end = directive.tokens[0].span.end;
        let condition = directive.header[keyword_end..].trim();
        if condition.is_empty() {
            return Err(ParseError::EmptyCondition {
                span: directive.span,
            });
        }

        let (start, end) = self.read_body(directive, DirectiveKind::EndIf)?;
        let body = self.resolve(start, end)?;
        debug!(condition, params = body.param_count(), "if segment");

        self.segments.push(TemplateSegment::If {
            condition: condition.to_string(),
            body,
        });
        Ok(())
    }

    fn parse_for(&mut self, directive: &Directive<'_>) -> Result<(), ParseError> {
        let header = directive.header;
        let mut tokens = directive.tokens.iter().skip(1);

        let element = expect_part(directive, tokens.next(), DirectiveKind::Ident, "loop element name")?;
        expect_part(directive, tokens.next(), DirectiveKind::In, "`in`")?;
        let collection = expect_part(directive, tokens.next(), DirectiveKind::Ident, "collection")?;

        let join_separator = match tokens.next() {
            None => None,
            Some(token) if token.kind == DirectiveKind::Join => {
                let sep = expect_part(directive, tokens.next(), DirectiveKind::Str, "quoted join separator")?;
                Some(sep.text(header)[1..sep.text(header).len() - 1].to_string())
            }
            Some(token) => {
                return Err(ParseError::MalformedFor {
                    reason: format!("expected `join`, found {}", token.kind.describe()),
                    span: directive.token_span(token),
                });
            }
        };

        if let Some(extra) = tokens.next() {
            return Err(ParseError::MalformedFor {
                reason: format!(
                    "unexpected {} after join separator; a `for` clause has at most three parts",
                    extra.kind.describe()
                ),
                span: directive.token_span(extra),
            });
        }

        let element = element.text(header).to_string();
        let collection = collection.text(header).to_string();

        let (start, end) = self.read_body(directive, DirectiveKind::EndFor)?;
        let body = self.resolve(start, end)?;
        debug!(%element, %collection, params = body.param_count(), "for segment");

        self.segments.push(TemplateSegment::For {
            element,
            collection,
            join_separator,
            body,
        });
        Ok(())
    }
}

fn expect_part<'t>(
    directive: &Directive<'_>,
    token: Option<&'t DirectiveToken>,
    kind: DirectiveKind,
    what: &str,
) -> Result<&'t DirectiveToken, ParseError> {
    match token {
        Some(token) if token.kind == kind => Ok(token),
        Some(token) => Err(ParseError::MalformedFor {
            reason: format!("expected {}, found {}", what, token.kind.describe()),
            span: directive.token_span(token),
        }),
        None => Err(ParseError::MalformedFor {
            reason: format!("expected {}", what),
            span: directive.span,
        }),
    }
}

fn unexpected_token(directive: &Directive<'_>, token: &DirectiveToken, expected: &str) -> ParseError {
    ParseError::UnexpectedToken {
        expected: expected.to_string(),
        found: token.kind.describe().to_string(),
        span: directive.token_span(token),
    }
}

/// Split a dynamic template into constant, `if` and `for` segments.
///
/// Constant text and block bodies go through [`resolve_placeholders`];
/// `if` conditions are passed through verbatim. Fails if the template
/// contains no `if` or `for` block.
pub fn parse_segments(source: &str, markers: &Markers) -> Result<Vec<TemplateSegment>, ParseError> {
    SegmentParser::new(source, markers).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave_ast::Statement;

    fn parse(source: &str) -> Result<Vec<TemplateSegment>, ParseError> {
        parse_segments(source, &Markers::default())
    }

    #[test]
    fn test_for_with_join() {
        let segments =
            parse("SELECT a FROM t WHERE id IN (%{for id in ids join ','}${id}%{endfor})").unwrap();
        assert_eq!(
            segments,
            vec![
                TemplateSegment::Constant(Statement::new("SELECT a FROM t WHERE id IN (")),
                TemplateSegment::For {
                    element: "id".to_string(),
                    collection: "ids".to_string(),
                    join_separator: Some(",".to_string()),
                    body: Statement {
                        text: "?".to_string(),
                        bind_params: vec!["id".to_string()],
                        substitute_params: vec![],
                    },
                },
                TemplateSegment::Constant(Statement::new(")")),
            ]
        );
    }

    #[test]
    fn test_if_condition_is_verbatim() {
        let segments = parse("SELECT a FROM t WHERE 1=1 %{if name != \"\" } AND name = ${name} %{endif}").unwrap();
        assert_eq!(segments.len(), 2);
        match &segments[1] {
            TemplateSegment::If { condition, body } => {
                assert_eq!(condition, "name != \"\"");
                assert_eq!(body.text, "AND name = ?");
                assert_eq!(body.bind_params, vec!["name"]);
            }
            other => panic!("expected if segment, got {:?}", other),
        }
    }

    #[test]
    fn test_for_without_join() {
        let segments = parse("%{for v in req.values}(${v})%{endfor}").unwrap();
        assert_eq!(segments.len(), 1);
        match &segments[0] {
            TemplateSegment::For { element, collection, join_separator, .. } => {
                assert_eq!(element, "v");
                assert_eq!(collection, "req.values");
                assert!(join_separator.is_none());
            }
            other => panic!("expected for segment, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_only_constants_are_dropped() {
        let segments = parse("  %{if a} x %{endif}   %{if b} y %{endif}  ").unwrap();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(TemplateSegment::is_dynamic));
    }

    #[test]
    fn test_missing_end_tag() {
        let err = parse("SELECT a FROM t %{if x} AND b = 1").unwrap_err();
        assert!(
            matches!(err, ParseError::UnmatchedDirective { ref found, .. } if found == "end of template"),
            "got {:?}",
            err
        );
        assert_eq!(err.span(), Span::new(16, 23));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse("%{if x} a %{endfor}").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedDirective { ref found, .. } if found == "`endfor`"));
    }

    #[test]
    fn test_stray_end_tag() {
        let err = parse("a %{endif}").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedDirective { .. }));
    }

    #[test]
    fn test_nested_directive() {
        let err = parse("%{if a} %{if b} x %{endif} %{endif}").unwrap_err();
        assert!(matches!(err, ParseError::NestedDirective { .. }));
    }

    #[test]
    fn test_no_dynamic_segment() {
        let err = parse("SELECT a FROM t").unwrap_err();
        assert!(matches!(err, ParseError::NoDynamicSegment { .. }));
    }

    #[test]
    fn test_malformed_for() {
        for source in [
            "%{for id}x%{endfor}",
            "%{for id of ids}x%{endfor}",
            "%{for id in ids join}x%{endfor}",
            "%{for id in ids join ',' extra}x%{endfor}",
            "%{for id in ids sep ','}x%{endfor}",
        ] {
            let err = parse(source).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedFor { .. }),
                "{}: got {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_empty_condition() {
        let err = parse("%{if   }x%{endif}").unwrap_err();
        assert!(matches!(err, ParseError::EmptyCondition { .. }));
    }

    #[test]
    fn test_unknown_directive() {
        let err = parse("%{while x}y%{endwhile}").unwrap_err();
        assert!(matches!(err, ParseError::UnknownDirective { ref found, .. } if found == "while x"));
    }

    #[test]
    fn test_unterminated_directive() {
        let err = parse("SELECT %{if x").unwrap_err();
        assert!(matches!(err, ParseError::Lex(LexError::UnterminatedDirective { .. })));
    }

    #[test]
    fn test_placeholder_error_offsets_are_template_relative() {
        let err = parse("SELECT a %{if x} b = ${ } %{endif}").unwrap_err();
        assert_eq!(err.span(), Span::new(21, 25));
    }

    #[test]
    fn test_closing_brace_inside_quotes() {
        let segments = parse("%{if s == \"}\"}x%{endif}").unwrap();
        match &segments[0] {
            TemplateSegment::If { condition, .. } => assert_eq!(condition, "s == \"}\""),
            other => panic!("expected if segment, got {:?}", other),
        }
    }
}
