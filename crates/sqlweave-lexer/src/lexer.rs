//! Lazy tokenizer over template text

use sqlweave_ast::Span;

use crate::{LexError, Lexicon, Token, TokenKind};

/// Produces tokens one at a time from `source`.
///
/// Characters that are neither whitespace, a quote, nor the start of a
/// registered symbol accumulate into a word; the word is flushed when one of
/// those is reached or input ends, and becomes a keyword token if the
/// lexicon knows it.
pub struct Lexer<'a> {
    source: &'a str,
    lexicon: &'a Lexicon,
    pos: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, lexicon: &'a Lexicon) -> Self {
        Self {
            source,
            lexicon,
            pos: 0,
            failed: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn lex_quoted(&mut self, quote: char) -> Result<Token, LexError> {
        let start = self.pos;
        let body_start = start + quote.len_utf8();
        let mut chars = self.source[body_start..].char_indices();

        while let Some((i, c)) = chars.next() {
            if c != quote {
                continue;
            }
            let end = body_start + i + c.len_utf8();
            // A doubled quote is an escaped quote character
            if self.source[end..].starts_with(quote) {
                chars.next();
                continue;
            }
            self.pos = end;
            return Ok(Token {
                kind: TokenKind::Quoted(quote),
                lexeme: self.source[start..end].to_string(),
                span: Span::new(start, end),
            });
        }

        self.pos = self.source.len();
        Err(LexError::UnterminatedQuote {
            quote,
            span: Span::new(start, self.source.len()),
        })
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos;
        for (i, c) in self.rest().char_indices() {
            if c.is_whitespace()
                || self.lexicon.is_quote(c)
                || self.lexicon.symbol_at(&self.source[start + i..]).is_some()
            {
                self.pos = start + i;
                return self.flush(start);
            }
        }
        self.pos = self.source.len();
        self.flush(start)
    }

    fn flush(&self, start: usize) -> Token {
        let word = &self.source[start..self.pos];
        let kind = match self.lexicon.keyword(word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        Token {
            kind,
            lexeme: word.to_string(),
            span: Span::new(start, self.pos),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        let c = self.rest().chars().next()?;

        if self.lexicon.is_quote(c) {
            let result = self.lex_quoted(c);
            self.failed = result.is_err();
            return Some(result);
        }

        if let Some((symbol, len)) = self.lexicon.symbol_at(self.rest()) {
            let start = self.pos;
            self.pos += len;
            return Some(Ok(Token {
                kind: TokenKind::Symbol(symbol),
                lexeme: self.source[start..self.pos].to_string(),
                span: Span::new(start, self.pos),
            }));
        }

        Some(Ok(self.lex_word()))
    }
}

/// Tokenize all of `source`, stopping at the first lexical error
pub fn tokenize(source: &str, lexicon: &Lexicon) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, lexicon).collect()
}
