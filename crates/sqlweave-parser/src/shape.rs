//! Query shape analysis: selected fields and source tables of a `SELECT`

use std::collections::{HashMap, HashSet};

use sqlweave_ast::{QueryField, QueryShape, QueryTable, Span, COUNT_FIELD, WILDCARD_FIELD};
use sqlweave_lexer::{Cursor, Keyword, Lexicon, Symbol, Token, TokenKind};
use tracing::debug;

use crate::ParseError;

pub struct ShapeParser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> ShapeParser<'a> {
    pub fn new(source: &'a str, lexicon: &'a Lexicon) -> Self {
        Self {
            cursor: Cursor::new(source, lexicon),
        }
    }

    // === Utilities ===

    fn end_span(&self) -> Span {
        Span::at(self.cursor.source().len())
    }

    fn peek_kind(&mut self, offset: usize) -> Result<Option<TokenKind>, ParseError> {
        Ok(self.cursor.peek(offset)?.map(|t| t.kind))
    }

    /// Consume the current token, failing at end of input
    fn advance(&mut self, expected: &str) -> Result<Token, ParseError> {
        match self.cursor.next()? {
            Some(token) => Ok(token),
            None => Err(ParseError::UnexpectedEnd {
                expected: expected.to_string(),
                span: self.end_span(),
            }),
        }
    }

    fn consume(&mut self, symbol: Symbol) -> Result<Token, ParseError> {
        let expected = format!("`{}`", symbol.as_str());
        let token = self.advance(&expected)?;
        if token.is_symbol(symbol) {
            Ok(token)
        } else {
            Err(ParseError::unexpected(expected, token.kind, token.span))
        }
    }

    /// Read the rest of a brace span whose opener is `open`; returns the
    /// span text as written
    fn read_brace_span(&mut self, open: &Token) -> Result<(String, Span), ParseError> {
        loop {
            let token = self.advance("`}`")?;
            if token.is_symbol(Symbol::RBrace) {
                let span = open.span.merge(token.span);
                let text = self.cursor.source()[span.start..span.end].to_string();
                return Ok((text, span));
            }
        }
    }

    /// Skip brace spans at the cursor whose opener satisfies `skip`
    fn skip_spans_where(&mut self, skip: fn(Symbol) -> bool) -> Result<(), ParseError> {
        while let Some(TokenKind::Symbol(sym)) = self.peek_kind(0)? {
            if !sym.opens_brace() || !skip(sym) {
                break;
            }
            if let Some(open) = self.cursor.next()? {
                self.read_brace_span(&open)?;
            }
        }
        Ok(())
    }

    /// Skip `${..}`, `#{..}` and `%{..}` spans at the cursor
    fn skip_brace_spans(&mut self) -> Result<(), ParseError> {
        self.skip_spans_where(|_| true)
    }

    /// Skip `%{..}` directive spans only; placeholders stay
    fn skip_directives(&mut self) -> Result<(), ParseError> {
        self.skip_spans_where(|sym| sym == Symbol::DirectiveOpen)
    }

    /// Skip to just past the `)` matching an already consumed `(`
    fn skip_parenthesized(&mut self) -> Result<Span, ParseError> {
        let mut depth = 1usize;
        loop {
            let token = self.advance("`)`")?;
            match token.kind {
                TokenKind::Symbol(Symbol::LParen) => depth += 1,
                TokenKind::Symbol(Symbol::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(token.span);
                    }
                }
                _ => {}
            }
        }
    }

    /// Like [`Self::skip_parenthesized`], but stops quietly at end of input
    fn skip_group(&mut self) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while let Some(token) = self.cursor.next()? {
            match token.kind {
                TokenKind::Symbol(Symbol::LParen) => depth += 1,
                TokenKind::Symbol(Symbol::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    // === Pass 1: fields ===

    /// Skip `DISTINCT` / `ALL` after `SELECT`, unless it is a column name
    fn skip_set_quantifier(&mut self) -> Result<(), ParseError> {
        let quantifier = self
            .cursor
            .peek(0)?
            .and_then(|t| t.ident())
            .is_some_and(|w| w.eq_ignore_ascii_case("distinct") || w.eq_ignore_ascii_case("all"));
        if !quantifier {
            return Ok(());
        }
        match self.peek_kind(1)? {
            None
            | Some(TokenKind::Symbol(Symbol::Comma))
            | Some(TokenKind::Keyword(Keyword::From)) => {}
            Some(_) => {
                self.cursor.next()?;
            }
        }
        Ok(())
    }

    fn parse_fields(&mut self) -> Result<Vec<QueryField>, ParseError> {
        let select = self.advance("SELECT")?;
        if !select.is_keyword(Keyword::Select) {
            return Err(ParseError::unexpected("SELECT", select.kind, select.span));
        }
        self.skip_set_quantifier()?;

        let mut fields = Vec::new();
        loop {
            self.skip_directives()?;
            match self.peek_kind(0)? {
                None => return Err(ParseError::MissingFrom { span: self.end_span() }),
                Some(TokenKind::Keyword(Keyword::From)) => break,
                Some(TokenKind::Symbol(Symbol::Comma)) => {
                    self.cursor.next()?;
                }
                Some(_) => {
                    let field = self.parse_field()?;
                    fields.push(field);
                    self.skip_to_field_end()?;
                }
            }
        }

        if fields.is_empty() {
            return Err(ParseError::EmptySelect { span: select.span });
        }
        Ok(fields)
    }

    fn parse_field(&mut self) -> Result<QueryField, ParseError> {
        let token = self.advance("field")?;

        let mut field = match token.kind {
            // a column that happens to be named like a function
            TokenKind::Keyword(Keyword::Ifnull | Keyword::Count)
                if !self.cursor.at_symbol(Symbol::LParen)? =>
            {
                self.parse_column_ref(token)?
            }
            TokenKind::Keyword(Keyword::Ifnull) => self.parse_call_column(&token)?,
            TokenKind::Keyword(Keyword::Count) => {
                self.consume(Symbol::LParen)?;
                let close = self.skip_parenthesized()?;
                let mut field = QueryField::new(COUNT_FIELD, token.span.merge(close));
                field.is_aggregate = true;
                field
            }
            TokenKind::Symbol(Symbol::Star) => QueryField::new(WILDCARD_FIELD, token.span),
            TokenKind::Symbol(sym) if sym.opens_brace() => {
                let (text, span) = self.read_brace_span(&token)?;
                QueryField::opaque(text, span)
            }
            TokenKind::Ident if !is_column_name(&token.lexeme) => {
                QueryField::opaque(token.lexeme.clone(), token.span)
            }
            TokenKind::Ident if self.peek_kind(0)? == Some(TokenKind::Symbol(Symbol::LParen)) => {
                self.parse_call_column(&token)?
            }
            TokenKind::Ident | TokenKind::Quoted(_) => self.parse_column_ref(token)?,
            other => return Err(ParseError::unexpected("field", other, token.span)),
        };

        field.alias = self.parse_alias(&field.name)?;
        Ok(field)
    }

    /// `[table.]column`, with `first` already consumed
    fn parse_column_ref(&mut self, first: Token) -> Result<QueryField, ParseError> {
        let first_name = word(&first).to_string();
        if !self.cursor.eat_symbol(Symbol::Dot)? {
            return Ok(QueryField::new(first_name, first.span));
        }

        let column = self.advance("column name")?;
        let mut field = match column.kind {
            TokenKind::Symbol(Symbol::Star) => QueryField::new(WILDCARD_FIELD, column.span),
            TokenKind::Symbol(sym) if sym.opens_brace() => {
                let (text, span) = self.read_brace_span(&column)?;
                QueryField::opaque(text, span)
            }
            TokenKind::Ident | TokenKind::Quoted(_) | TokenKind::Keyword(_) => {
                QueryField::new(word(&column), column.span)
            }
            other => return Err(ParseError::unexpected("column name", other, column.span)),
        };

        field.span = first.span.merge(field.span);
        field.table = Some(first_name);
        Ok(field)
    }

    /// `f(...)`: the field is the first column reference inside the call
    fn parse_call_column(&mut self, function: &Token) -> Result<QueryField, ParseError> {
        self.consume(Symbol::LParen)?;
        let mut column: Option<QueryField> = None;
        let mut depth = 1usize;

        while depth > 0 {
            let token = self.advance("`)`")?;
            match token.kind {
                TokenKind::Symbol(Symbol::LParen) => depth += 1,
                TokenKind::Symbol(Symbol::RParen) => depth -= 1,
                TokenKind::Ident if column.is_none() && is_column_name(&token.lexeme) => {
                    if self.peek_kind(0)? == Some(TokenKind::Symbol(Symbol::LParen)) {
                        continue;
                    }
                    column = Some(self.parse_column_ref(token)?);
                }
                _ => {}
            }
        }

        let span = self.cursor.previous(1).map(|t| t.span).unwrap_or(function.span);
        match column {
            Some(mut field) => {
                field.span = function.span.merge(span);
                Ok(field)
            }
            None => Err(ParseError::UnexpectedToken {
                expected: "column reference".to_string(),
                found: format!("`{}(...)` without one", function.lexeme),
                span: function.span.merge(span),
            }),
        }
    }

    /// Optional `[AS] alias`; an alias equal to the field's own name is dropped
    fn parse_alias(&mut self, own_name: &str) -> Result<Option<String>, ParseError> {
        self.cursor.eat_keyword(Keyword::As)?;
        let Some(token) = self.cursor.peek(0)? else {
            return Ok(None);
        };
        let candidate = match token.kind {
            TokenKind::Ident | TokenKind::Quoted(_) => token.name().unwrap_or_default().to_string(),
            _ => return Ok(None),
        };
        self.cursor.next()?;
        if candidate == own_name {
            Ok(None)
        } else {
            Ok(Some(candidate))
        }
    }

    /// Skip whatever trails a field (operators, CASE arms, ...) up to the
    /// next top-level `,` or `FROM`
    fn skip_to_field_end(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_brace_spans()?;
            match self.peek_kind(0)? {
                None
                | Some(TokenKind::Symbol(Symbol::Comma))
                | Some(TokenKind::Keyword(Keyword::From)) => return Ok(()),
                Some(TokenKind::Symbol(Symbol::LParen)) => {
                    self.cursor.next()?;
                    self.skip_parenthesized()?;
                }
                Some(_) => {
                    self.cursor.next()?;
                }
            }
        }
    }

    // === Pass 2: tables ===

    fn parse_tables(&mut self) -> Result<Vec<QueryTable>, ParseError> {
        let from_span = self.cursor.peek(0)?.map(|t| t.span);
        let from_span = from_span.unwrap_or_else(|| self.end_span());
        let mut tables = Vec::new();

        loop {
            self.skip_brace_spans()?;
            let Some(token) = self.cursor.next()? else {
                break;
            };
            match token.kind {
                // `t.join` is a column, not a clause
                TokenKind::Symbol(Symbol::Dot) => {
                    self.cursor.next()?;
                }
                // nested queries declare their own tables
                TokenKind::Symbol(Symbol::LParen) => self.skip_group()?,
                TokenKind::Keyword(Keyword::From) => loop {
                    if let Some(table) = self.parse_table_ref()? {
                        tables.push(table);
                    }
                    if !self.cursor.eat_symbol(Symbol::Comma)? {
                        break;
                    }
                },
                TokenKind::Keyword(Keyword::Join) => {
                    if let Some(table) = self.parse_table_ref()? {
                        tables.push(table);
                    }
                }
                _ => {}
            }
        }

        if tables.is_empty() {
            return Err(ParseError::NoTables { span: from_span });
        }
        Ok(tables)
    }

    /// One part of a table name; placeholders are opaque
    fn parse_table_part(&mut self, keywords: bool) -> Result<(String, Span, bool), ParseError> {
        let part = self.advance("table name")?;
        match part.kind {
            TokenKind::Ident | TokenKind::Quoted(_) => Ok((word(&part).to_string(), part.span, false)),
            TokenKind::Keyword(_) if keywords => Ok((part.lexeme.clone(), part.span, false)),
            TokenKind::Symbol(sym) if sym.opens_brace() => {
                let (text, span) = self.read_brace_span(&part)?;
                Ok((text, span, true))
            }
            other => Err(ParseError::unexpected("table name", other, part.span)),
        }
    }

    /// One table reference; `None` for a parenthesized subquery
    fn parse_table_ref(&mut self) -> Result<Option<QueryTable>, ParseError> {
        if self.cursor.eat_symbol(Symbol::LParen)? {
            self.skip_group()?;
            self.parse_alias("")?;
            return Ok(None);
        }

        let (mut name, mut span, mut is_opaque) = self.parse_table_part(false)?;

        // schema-qualified: keep the table part
        while self.cursor.eat_symbol(Symbol::Dot)? {
            let (part, part_span, opaque) = self.parse_table_part(true)?;
            name = part;
            span = span.merge(part_span);
            is_opaque = opaque;
        }

        let alias = self.parse_alias(&name)?;
        Ok(Some(QueryTable {
            name,
            alias,
            is_opaque,
            span,
        }))
    }

    /// Run both passes and bind every field to a declared table
    pub fn parse_shape(mut self) -> Result<QueryShape, ParseError> {
        self.skip_brace_spans()?;
        let mut fields = self.parse_fields()?;
        let tables = self.parse_tables()?;
        resolve_fields(&mut fields, &tables)?;

        debug!(fields = fields.len(), tables = tables.len(), "analyzed query shape");
        Ok(QueryShape { fields, tables })
    }
}

/// Identifier or quoted name without quotes; keywords as written
fn word(token: &Token) -> &str {
    token.name().unwrap_or(&token.lexeme)
}

/// Numbers and other literals lexed as words are not column names
fn is_column_name(word: &str) -> bool {
    word.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
}

/// Replace each field's qualifier with the canonical table name.
///
/// Unqualified fields go to the first declared table. Qualifiers are
/// looked up among table names first, then among aliases.
pub fn resolve_fields(fields: &mut [QueryField], tables: &[QueryTable]) -> Result<(), ParseError> {
    let Some(default_table) = tables.first() else {
        return Ok(());
    };
    let names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let aliases: HashMap<&str, &str> = tables
        .iter()
        .filter_map(|t| t.alias.as_deref().map(|a| (a, t.name.as_str())))
        .collect();

    for field in fields.iter_mut() {
        let canonical = match field.table.as_deref() {
            None => default_table.name.clone(),
            Some(qualifier) if names.contains(qualifier) => qualifier.to_string(),
            Some(qualifier) => match aliases.get(qualifier) {
                Some(name) => name.to_string(),
                None => {
                    return Err(ParseError::UnresolvedTable {
                        field: field.name.clone(),
                        table: qualifier.to_string(),
                        span: field.span,
                    });
                }
            },
        };
        field.table = Some(canonical);
    }
    Ok(())
}

/// Analyze the `SELECT` in `source` into fields and tables
pub fn analyze_query(source: &str, lexicon: &Lexicon) -> Result<QueryShape, ParseError> {
    ShapeParser::new(source, lexicon).parse_shape()
}
