//! Lexer for predicate text
//!
//! Tokenizes `where`-clause predicates into a stream of tokens using the
//! Logos library.

pub mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{PredicateError, SourceFile};
use logos::Logos;
use miette::Result;

/// Lex predicate text into tokens
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => {
                return Err(PredicateError::InvalidCharacter {
                    found: source[span.clone()].to_string(),
                    span: Span::new(span.start, span.end).into(),
                    src: SourceFile::new("<predicate>", source).to_named_source(),
                }
                .into());
            }
        };

        tokens.push(Token {
            kind,
            span: Span::new(span.start, span.end),
            text: source[span].to_string(),
        });
    }

    // Add EOF token
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(source.len(), source.len()),
        text: String::new(),
    });

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_comparison() {
        let tokens = lex("x.len >= 10").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Ge,
                TokenKind::IntLit,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[2].text, "len");
        assert_eq!(tokens[4].text, "10");
        assert_eq!(tokens[4].span, Span::new(9, 11));
    }

    #[test]
    fn test_lex_longest_match() {
        let tokens = lex("a<=b && !c != d").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Le,
                TokenKind::Ident,
                TokenKind::AmpAmp,
                TokenKind::Bang,
                TokenKind::Ident,
                TokenKind::Ne,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_lex_keywords_before_identifiers() {
        let tokens = lex("true || trueish").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::True);
        assert_eq!(tokens[2].kind, TokenKind::Ident);
        assert!(tokens[0].kind.is_literal());
        assert!(tokens[1].kind.is_operator());
    }

    #[test]
    fn test_lex_invalid_character() {
        let err = lex("a # b").unwrap_err();
        assert!(err.to_string().contains("Unexpected character '#'"));
    }
}
