//! Parser for predicate text
//!
//! Precedence climbing over the token stream from [`crate::lexer`]. Binding
//! strength, loosest first: `||`, `&&`, `== !=`, `< <= > >=`, `+ -`,
//! `* / %`, then unary `-`/`!`, then postfix `.field`. All binary
//! operators are left associative. Nesting through parentheses and unary
//! operators is capped at [`MAX_NESTING`] levels.

use crate::ast::*;
use crate::common::{IdGenerator, NodeId, Span};
use crate::diagnostics::{PredicateError, SourceFile};
use crate::lexer::{Token, TokenKind};
use miette::Result;
use rustc_hash::FxHashMap;

/// Parse a token stream into a predicate
pub fn parse(tokens: &[Token], source: &str) -> Result<Predicate> {
    let mut parser = Parser::new(tokens, source);
    parser.parse_predicate()
}

/// Deepest nesting of parentheses and unary operators accepted
pub const MAX_NESTING: usize = 256;

/// Parser state
pub struct Parser<'a> {
    tokens: &'a [Token],
    source: &'a str,
    pos: usize,
    depth: usize,
    id_gen: IdGenerator,
    /// Mapping from NodeId to source spans
    node_spans: FxHashMap<NodeId, Span>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str) -> Self {
        Self {
            tokens,
            source,
            pos: 0,
            depth: 0,
            id_gen: IdGenerator::new(),
            node_spans: FxHashMap::default(),
        }
    }

    /// Parse one complete predicate; trailing tokens are an error.
    pub fn parse_predicate(&mut self) -> Result<Predicate> {
        let expr = self.parse_expr()?;
        if !self.at(TokenKind::Eof) {
            return Err(self.unexpected("end of predicate"));
        }
        Ok(Predicate {
            expr,
            node_spans: std::mem::take(&mut self.node_spans),
        })
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_with_precedence(1)
    }

    fn next_id(&mut self) -> NodeId {
        self.id_gen.next()
    }

    /// Record the span of a node for error reporting
    fn record_span(&mut self, id: NodeId, span: Span) {
        self.node_spans.insert(id, span);
    }

    fn span_of(&self, expr: &Expr) -> Span {
        self.node_spans
            .get(&expr.id())
            .copied()
            .unwrap_or_else(Span::dummy)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    fn peek(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn span(&self) -> Span {
        self.current()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(self.source.len(), self.source.len()))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.current().cloned();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            self.advance().ok_or_else(|| self.unexpected(kind.as_str()))
        } else {
            Err(self.unexpected(kind.as_str()))
        }
    }

    fn unexpected(&self, expected: &str) -> miette::Report {
        let src = SourceFile::new("<predicate>", self.source).to_named_source();
        if self.at(TokenKind::Eof) {
            PredicateError::UnexpectedEof {
                span: self.span().into(),
                src,
            }
            .into()
        } else {
            PredicateError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.peek().as_str().to_string(),
                span: self.span().into(),
                src,
            }
            .into()
        }
    }

    fn parse_expr_with_precedence(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec)) = self.binary_op_info() {
            if prec < min_prec {
                break;
            }

            self.advance();
            let right = self.parse_expr_with_precedence(prec + 1)?;

            let span = self.span_of(&left).merge(self.span_of(&right));
            let id = self.next_id();
            self.record_span(id, span);
            left = Expr::Binary {
                id,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn binary_op_info(&self) -> Option<(BinaryOp, u8)> {
        let (op, prec) = match self.peek() {
            TokenKind::PipePipe => (BinaryOp::Or, 1),
            TokenKind::AmpAmp => (BinaryOp::And, 2),
            TokenKind::EqEq => (BinaryOp::Eq, 3),
            TokenKind::Ne => (BinaryOp::Ne, 3),
            TokenKind::Lt => (BinaryOp::Lt, 4),
            TokenKind::Le => (BinaryOp::Le, 4),
            TokenKind::Gt => (BinaryOp::Gt, 4),
            TokenKind::Ge => (BinaryOp::Ge, 4),
            TokenKind::Plus => (BinaryOp::Add, 9),
            TokenKind::Minus => (BinaryOp::Sub, 9),
            TokenKind::Star => (BinaryOp::Mul, 10),
            TokenKind::Slash => (BinaryOp::Div, 10),
            TokenKind::Percent => (BinaryOp::Rem, 10),
            _ => return None,
        };
        Some((op, prec))
    }

    /// Every operand, parenthesized or not, passes through here.
    fn parse_unary(&mut self) -> Result<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(self.unexpected("shallower nesting"));
        }
        self.depth += 1;
        let result = self.parse_nested_unary();
        self.depth -= 1;
        result
    }

    fn parse_nested_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.span();
        self.advance();
        let expr = self.parse_unary()?;
        let span = start.merge(self.span_of(&expr));
        let id = self.next_id();
        self.record_span(id, span);
        Ok(Expr::Unary {
            id,
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;

        while self.at(TokenKind::Dot) {
            self.advance();
            let field = self.expect(TokenKind::Ident)?;
            let span = self.span_of(&expr).merge(field.span);
            let id = self.next_id();
            self.record_span(id, span);
            expr = Expr::Field {
                id,
                base: Box::new(expr),
                field: field.text,
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.span();
        let expr = match self.peek() {
            TokenKind::IntLit => {
                let token = self.expect(TokenKind::IntLit)?;
                Expr::Literal {
                    id: self.next_id(),
                    value: Literal::Int(token.text),
                }
            }
            TokenKind::True | TokenKind::False => {
                let value = self.at(TokenKind::True);
                self.advance();
                Expr::Literal {
                    id: self.next_id(),
                    value: Literal::Bool(value),
                }
            }
            TokenKind::Ident => {
                let token = self.expect(TokenKind::Ident)?;
                Expr::Path {
                    id: self.next_id(),
                    name: token.text,
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.record_span(expr.id(), span);
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_str(source: &str) -> Result<Predicate> {
        let tokens = lex(source)?;
        parse(&tokens, source)
    }

    #[test]
    fn test_precedence() {
        let predicate = parse_str("a + 2 * b >= c - 1 && d < 3 || e == f").unwrap();
        assert_eq!(
            predicate.expr.to_string(),
            "((((a + (2 * b)) >= (c - 1)) && (d < 3)) || (e == f))"
        );
    }

    #[test]
    fn test_left_associative() {
        let predicate = parse_str("a - b - c").unwrap();
        assert_eq!(predicate.expr.to_string(), "((a - b) - c)");
    }

    #[test]
    fn test_unary_and_parens() {
        let predicate = parse_str("-(a + b) * 2 > !c").unwrap();
        assert_eq!(predicate.expr.to_string(), "((-(a + b) * 2) > !c)");
    }

    #[test]
    fn test_property_chain() {
        let predicate = parse_str("x.inner.len <= 4").unwrap();
        match &predicate.expr {
            Expr::Binary { left, .. } => {
                assert_eq!(left.dotted_name().as_deref(), Some("x.inner.len"));
                assert_eq!(predicate.span_of(left.id()), Some(Span::new(0, 11)));
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_spans_recorded() {
        let predicate = parse_str("a + 10").unwrap();
        assert_eq!(predicate.span_of(predicate.expr.id()), Some(Span::new(0, 6)));
    }

    #[test]
    fn test_errors() {
        let err = parse_str("a + ").unwrap_err();
        assert!(err.to_string().contains("Unexpected end of predicate"));

        let err = parse_str("a b").unwrap_err();
        assert!(err.to_string().contains("expected end of predicate, found identifier"));

        let err = parse_str("(a + b").unwrap_err();
        assert!(err.to_string().contains("Unexpected end of predicate"));

        let err = parse_str("a.3").unwrap_err();
        assert!(err.to_string().contains("expected identifier, found integer"));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}a{} >= 0", "(".repeat(depth), ")".repeat(depth));

        let predicate = parse_str(&nested(MAX_NESTING - 1)).unwrap();
        assert_eq!(predicate.expr.to_string(), "(a >= 0)");

        let err = parse_str(&nested(2000)).unwrap_err();
        assert!(err.to_string().contains("expected shallower nesting, found ("));

        let err = parse_str(&format!("{}a >= 0", "-".repeat(2000))).unwrap_err();
        assert!(err.to_string().contains("expected shallower nesting, found -"));

        assert!(parse_str(&format!("{}a >= 0", "!".repeat(100))).is_ok());
    }
}
