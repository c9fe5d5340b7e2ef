//! Tokens inside a `%{ ... }` directive header

use logos::Logos;
use sqlweave_ast::Span;

/// Directive keywords are case-sensitive, unlike SQL keywords
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum DirectiveKind {
    #[token("if")]
    If,
    #[token("endif")]
    EndIf,
    #[token("for")]
    For,
    #[token("endfor")]
    EndFor,
    #[token("in")]
    In,
    #[token("join")]
    Join,

    #[regex(r"[A-Za-z_][A-Za-z0-9_.]*")]
    Ident,
    #[regex(r"'[^']*'")]
    #[regex(r#""[^"]*""#)]
    Str,

    /// Anything the header grammar does not know
    Error,
}

impl DirectiveKind {
    pub fn describe(&self) -> &'static str {
        match self {
            DirectiveKind::If => "`if`",
            DirectiveKind::EndIf => "`endif`",
            DirectiveKind::For => "`for`",
            DirectiveKind::EndFor => "`endfor`",
            DirectiveKind::In => "`in`",
            DirectiveKind::Join => "`join`",
            DirectiveKind::Ident => "identifier",
            DirectiveKind::Str => "quoted string",
            DirectiveKind::Error => "invalid input",
        }
    }
}

/// A directive token with its span inside the header
#[derive(Debug, Clone)]
pub struct DirectiveToken {
    pub kind: DirectiveKind,
    pub span: Span,
}

impl DirectiveToken {
    pub fn text<'a>(&self, header: &'a str) -> &'a str {
        &header[self.span.start..self.span.end]
    }
}

/// Tokenize a directive header (the text between `%{` and `}`)
pub fn tokenize_directive(header: &str) -> Vec<DirectiveToken> {
    let mut tokens = Vec::new();
    let mut lexer = DirectiveKind::lexer(header);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => DirectiveKind::Error,
        };
        tokens.push(DirectiveToken { kind, span });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(header: &str) -> Vec<DirectiveKind> {
        tokenize_directive(header).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_for_header() {
        assert_eq!(
            kinds("for id in ids join ','"),
            vec![
                DirectiveKind::For,
                DirectiveKind::Ident,
                DirectiveKind::In,
                DirectiveKind::Ident,
                DirectiveKind::Join,
                DirectiveKind::Str,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(kinds("IF"), vec![DirectiveKind::Ident]);
        assert_eq!(kinds("endif"), vec![DirectiveKind::EndIf]);
        assert_eq!(kinds("iffy"), vec![DirectiveKind::Ident]);
    }

    #[test]
    fn test_dotted_collection() {
        let header = "for u in req.users";
        let tokens = tokenize_directive(header);
        assert_eq!(tokens[3].text(header), "req.users");
    }

    #[test]
    fn test_unknown_input_is_error_token() {
        assert_eq!(kinds("for a in b ;"), vec![
            DirectiveKind::For,
            DirectiveKind::Ident,
            DirectiveKind::In,
            DirectiveKind::Ident,
            DirectiveKind::Error,
        ]);
    }
}
