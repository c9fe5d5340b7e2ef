//! Registered keyword and symbol sets

use crate::{Keyword, Symbol};

/// The set of lexemes a [`Lexer`](crate::Lexer) recognizes.
///
/// Keywords match case-insensitively; everything else that is not a
/// symbol, quote or whitespace becomes an identifier.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    keywords: Vec<(&'static str, Keyword)>,
    /// Kept sorted longest first so `%{` wins over a bare `%`-prefixed word
    symbols: Vec<(&'static str, Symbol)>,
    quotes: Vec<char>,
}

impl Lexicon {
    /// An empty lexicon: every lexeme is an identifier
    pub fn new() -> Self {
        Self::default()
    }

    /// The query grammar: SQL keywords, punctuation, quotes and
    /// placeholder/directive sigils
    pub fn sql() -> Self {
        let mut lexicon = Self::new();
        for keyword in Keyword::ALL {
            lexicon = lexicon.with_keyword(keyword);
        }
        for symbol in [
            Symbol::DirectiveOpen,
            Symbol::BindOpen,
            Symbol::SubstituteOpen,
            Symbol::RBrace,
            Symbol::LParen,
            Symbol::RParen,
            Symbol::Comma,
            Symbol::Dot,
            Symbol::Star,
            Symbol::Semicolon,
        ] {
            lexicon = lexicon.with_symbol(symbol);
        }
        lexicon.with_quote('\'').with_quote('"').with_quote('`')
    }

    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        if !self.keywords.iter().any(|(_, k)| *k == keyword) {
            self.keywords.push((keyword.as_str(), keyword));
        }
        self
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        if !self.symbols.iter().any(|(_, s)| *s == symbol) {
            self.symbols.push((symbol.as_str(), symbol));
            self.symbols.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        }
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        if !self.quotes.contains(&quote) {
            self.quotes.push(quote);
        }
        self
    }

    /// Case-insensitive keyword lookup
    pub fn keyword(&self, word: &str) -> Option<Keyword> {
        self.keywords
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, kw)| *kw)
    }

    /// Longest symbol that `rest` starts with, and its byte length
    pub fn symbol_at(&self, rest: &str) -> Option<(Symbol, usize)> {
        self.symbols
            .iter()
            .find(|(text, _)| rest.starts_with(text))
            .map(|(text, sym)| (*sym, text.len()))
    }

    pub fn is_quote(&self, c: char) -> bool {
        self.quotes.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_insensitive() {
        let lexicon = Lexicon::sql();
        assert_eq!(lexicon.keyword("select"), Some(Keyword::Select));
        assert_eq!(lexicon.keyword("SeLeCt"), Some(Keyword::Select));
        assert_eq!(lexicon.keyword("ifnull"), Some(Keyword::Ifnull));
        assert_eq!(lexicon.keyword("selects"), None);
    }

    #[test]
    fn test_longest_symbol_wins() {
        let lexicon = Lexicon::new()
            .with_symbol(Symbol::RBrace)
            .with_symbol(Symbol::DirectiveOpen);
        assert_eq!(lexicon.symbol_at("%{if"), Some((Symbol::DirectiveOpen, 2)));
        assert_eq!(lexicon.symbol_at("}x"), Some((Symbol::RBrace, 1)));
        assert_eq!(lexicon.symbol_at("%x"), None);
    }

    #[test]
    fn test_empty_lexicon_has_no_keywords() {
        assert_eq!(Lexicon::new().keyword("select"), None);
    }
}
