//! Fuzz target for the predicate reader
//!
//! Tests that lexing, parsing and normalization never panic on
//! predicate-like token soup.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zen::bounds::NormalizerState;
use zen::{lexer, parser};

/// Structured input for generating predicate-like source
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    fragments: Vec<Fragment>,
}

#[derive(Debug, Arbitrary)]
enum Fragment {
    Identifier(Identifier),
    /// Kept small so products of literals stay within `i64`
    Literal(u8),
    Operator(Operator),
    Open,
    Close,
    Keyword(bool),
}

#[derive(Debug, Arbitrary)]
enum Identifier {
    A,
    B,
    Len,
    Unknown,
}

#[derive(Debug, Arbitrary)]
enum Operator {
    Add,
    Sub,
    Mul,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
}

impl FuzzInput {
    fn to_source(&self) -> String {
        self.fragments
            .iter()
            .take(64)
            .map(Fragment::to_source)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Fragment {
    fn to_source(&self) -> String {
        match self {
            Fragment::Identifier(Identifier::A) => "a".to_string(),
            Fragment::Identifier(Identifier::B) => "b".to_string(),
            Fragment::Identifier(Identifier::Len) => "a.len".to_string(),
            Fragment::Identifier(Identifier::Unknown) => "zz".to_string(),
            Fragment::Literal(n) => (n % 16).to_string(),
            Fragment::Operator(op) => match op {
                Operator::Add => "+",
                Operator::Sub => "-",
                Operator::Mul => "*",
                Operator::Lt => "<",
                Operator::Le => "<=",
                Operator::Gt => ">",
                Operator::Ge => ">=",
                Operator::Eq => "==",
                Operator::Ne => "!=",
                Operator::And => "&&",
                Operator::Or => "||",
                Operator::Not => "!",
            }
            .to_string(),
            Fragment::Open => "(".to_string(),
            Fragment::Close => ")".to_string(),
            Fragment::Keyword(value) => value.to_string(),
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let source = input.to_source();

    if let Ok(tokens) = lexer::lex(&source) {
        if let Ok(predicate) = parser::parse(&tokens, &source) {
            let mut state = NormalizerState::new();
            state.use_identifier_mapping("a", 1);
            state.use_identifier_mapping("b", 2);
            state.use_identifier_mapping("a.len", 3);
            let _ = state.normalize_to_or_group(&predicate.expr);
            let _ = state.normalize_to_sum_group(&predicate.expr);
        }
    }
});
