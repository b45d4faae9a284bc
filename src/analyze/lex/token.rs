use std::{fmt, ops::Range};

/// A single lexical unit, tagged with the 1-based source line it came from
/// and its span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(u8),
    Ident(String),
    Operator(char),
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "number",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Operator(_) => "operator",
        }
    }
}

/// Canonical source rendering: re-tokenizing the rendered text yields an
/// equal token. Numbers render in decimal regardless of the literal base
/// they were written in.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(value) => write!(f, "{}", value),
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::Operator(c) => write!(f, "{}", c),
        }
    }
}
