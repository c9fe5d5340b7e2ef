//! Position-aware cursor over a lazily lexed token stream

use crate::{Keyword, LexError, Lexer, Lexicon, Symbol, Token};

/// Buffered cursor with lookahead, lookback and reset.
///
/// Tokens are pulled from the underlying [`Lexer`] only when a lookahead
/// reaches past the buffer. `next`, `reset` and the `eat_*` helpers are the
/// only operations that move the cursor.
pub struct Cursor<'a> {
    lexer: Lexer<'a>,
    buffer: Vec<Token>,
    pos: usize,
    error: Option<LexError>,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, lexicon: &'a Lexicon) -> Self {
        Self {
            lexer: Lexer::new(source, lexicon),
            buffer: Vec::new(),
            pos: 0,
            error: None,
        }
    }

    pub fn source(&self) -> &'a str {
        self.lexer.source()
    }

    /// Make sure the buffer holds index `index` if the input has it
    fn fill(&mut self, index: usize) -> Result<(), LexError> {
        while self.buffer.len() <= index {
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            match self.lexer.next() {
                Some(Ok(token)) => self.buffer.push(token),
                Some(Err(err)) => {
                    self.error = Some(err.clone());
                    return Err(err);
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Look at the token `offset` positions ahead without consuming it
    pub fn peek(&mut self, offset: usize) -> Result<Option<&Token>, LexError> {
        let index = self.pos + offset;
        self.fill(index)?;
        Ok(self.buffer.get(index))
    }

    /// Consume and return the current token
    pub fn next(&mut self) -> Result<Option<Token>, LexError> {
        self.fill(self.pos)?;
        let token = self.buffer.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        Ok(token)
    }

    /// The token consumed `offset` steps ago; `previous(1)` is the last one
    pub fn previous(&self, offset: usize) -> Option<&Token> {
        if offset == 0 || offset > self.pos {
            return None;
        }
        self.buffer.get(self.pos - offset)
    }

    /// Rewind to the first token
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Number of tokens consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn at_end(&mut self) -> Result<bool, LexError> {
        Ok(self.peek(0)?.is_none())
    }

    pub fn at_keyword(&mut self, keyword: Keyword) -> Result<bool, LexError> {
        Ok(self.peek(0)?.is_some_and(|t| t.is_keyword(keyword)))
    }

    pub fn at_symbol(&mut self, symbol: Symbol) -> Result<bool, LexError> {
        Ok(self.peek(0)?.is_some_and(|t| t.is_symbol(symbol)))
    }

    /// Consume the current token if it is `keyword`
    pub fn eat_keyword(&mut self, keyword: Keyword) -> Result<bool, LexError> {
        if self.at_keyword(keyword)? {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consume the current token if it is `symbol`
    pub fn eat_symbol(&mut self, symbol: Symbol) -> Result<bool, LexError> {
        if self.at_symbol(symbol)? {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }
}
