//! Module providing Token struct for lexing reaction equations
use std::fmt::{Display, Formatter};

/// Represents Tokens in a reaction equation
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub enum Token {
    Identifier(String),
    /// Numeric literal, kept as source text until the parser converts it
    Number(String),
    Plus,
    Star,
    Arrow,
    Eof,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Identifier(id) => write!(f, "{}", id),
            Token::Number(text) => write!(f, "{}", text),
            Token::Plus => write!(f, "+"),
            Token::Star => write!(f, "*"),
            Token::Arrow => write!(f, "->"),
            Token::Eof => write!(f, "end of equation"),
        }
    }
}
