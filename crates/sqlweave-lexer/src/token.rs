//! Token definitions for template text

use std::fmt;

use sqlweave_ast::Span;

/// SQL keywords recognized by the query tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    From,
    Inner,
    Left,
    Right,
    Join,
    On,
    Where,
    Order,
    By,
    As,
    Group,
    Ifnull,
    Limit,
    Count,
    Update,
    Delete,
    Insert,
}

impl Keyword {
    /// All keywords, in registration order
    pub const ALL: [Keyword; 18] = [
        Keyword::Select,
        Keyword::From,
        Keyword::Inner,
        Keyword::Left,
        Keyword::Right,
        Keyword::Join,
        Keyword::On,
        Keyword::Where,
        Keyword::Order,
        Keyword::By,
        Keyword::As,
        Keyword::Group,
        Keyword::Ifnull,
        Keyword::Limit,
        Keyword::Count,
        Keyword::Update,
        Keyword::Delete,
        Keyword::Insert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::Where => "WHERE",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::As => "AS",
            Keyword::Group => "GROUP",
            Keyword::Ifnull => "IFNULL",
            Keyword::Limit => "LIMIT",
            Keyword::Count => "COUNT",
            Keyword::Update => "UPDATE",
            Keyword::Delete => "DELETE",
            Keyword::Insert => "INSERT",
        }
    }

    /// Keywords that start a mutation
    pub fn is_mutation(self) -> bool {
        matches!(self, Keyword::Insert | Keyword::Update | Keyword::Delete)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Punctuation and directive sigils
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    LParen,
    RParen,
    Comma,
    Dot,
    Star,
    Semicolon,
    /// `%{`
    DirectiveOpen,
    /// `${`
    BindOpen,
    /// `#{`
    SubstituteOpen,
    /// `}`
    RBrace,
}

impl Symbol {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::Comma => ",",
            Symbol::Dot => ".",
            Symbol::Star => "*",
            Symbol::Semicolon => ";",
            Symbol::DirectiveOpen => "%{",
            Symbol::BindOpen => "${",
            Symbol::SubstituteOpen => "#{",
            Symbol::RBrace => "}",
        }
    }

    /// Symbols that open a `{ ... }` span closed by `RBrace`
    pub fn opens_brace(self) -> bool {
        matches!(
            self,
            Symbol::DirectiveOpen | Symbol::BindOpen | Symbol::SubstituteOpen
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(Symbol),
    /// A quoted span; carries the quote character
    Quoted(char),
    Ident,
}

impl TokenKind {
    /// Get a human-readable description of this token kind
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(kw) => format!("keyword `{}`", kw),
            TokenKind::Symbol(sym) => format!("`{}`", sym.as_str()),
            TokenKind::Quoted(_) => "quoted literal".to_string(),
            TokenKind::Ident => "identifier".to_string(),
        }
    }
}

/// A token with its lexeme and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text, quotes included for quoted tokens
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Symbol(symbol)
    }

    pub fn ident(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Ident => Some(&self.lexeme),
            _ => None,
        }
    }

    /// Identifier or quoted literal, with quotes stripped
    pub fn name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Ident => Some(&self.lexeme),
            TokenKind::Quoted(q) => Some(
                self.lexeme
                    .strip_prefix(q)
                    .and_then(|s| s.strip_suffix(q))
                    .unwrap_or(&self.lexeme),
            ),
            _ => None,
        }
    }
}
