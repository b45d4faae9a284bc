use std::{ops::Range, rc::Rc};

use ariadne::{ColorGenerator, Label, Report, ReportBuilder, ReportKind};
use tracing::debug;

use crate::analyze::{
    Error, ErrorCode, Span,
    lex::token::{Token, TokenKind},
};

pub mod token;

/// The tokens of one translation unit in source order, with the single
/// cursor the encoder moves through them.
///
/// The sequence is contiguous and randomly addressable; backtracking during
/// operand resolution is an index save/restore, never a link walk.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    /// Get the token under the cursor
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Restores a cursor position previously obtained from
    /// [index](Self::index).
    pub fn rewind(&mut self, index: usize) {
        self.index = index;
    }

    /// All tokens in source order, independent of the cursor.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Source position just past the last token, for end-of-input labels.
    pub fn end_pos(&self) -> usize {
        self.tokens.last().map(|t| t.span.end).unwrap_or(0)
    }
}

pub struct Lexer {
    source_name: Rc<String>,
    color_gen: ColorGenerator,
    code: Vec<char>,
    index: usize,
    line: u32,
}

impl Lexer {
    /// Scans the whole source left to right and produces the token sequence
    /// in one pass. The source is already fully in memory; nothing is read
    /// lazily.
    pub fn tokenize(
        source_name: Rc<String>,
        source: impl AsRef<str>,
    ) -> Result<TokenStream, Error> {
        let mut lexer = Self {
            source_name,
            color_gen: ColorGenerator::new(),
            code: source.as_ref().chars().collect(),
            index: 0,
            line: 1,
        };

        let mut tokens = Vec::new();
        while let Some(token) = lexer.lex_next()? {
            debug!("lexed: {:?}", token);
            tokens.push(token);
        }

        Ok(TokenStream { tokens, index: 0 })
    }
}

/// Internals
impl Lexer {
    fn peek_char(&self, offset: usize) -> Option<char> {
        self.code.get(self.index + offset).copied()
    }

    fn cur_char(&self) -> Option<char> {
        self.peek_char(0)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.cur_char()
            && c.is_whitespace()
        {
            if c == '\n' {
                self.line += 1;
            }
            self.index += 1;
        }
    }

    fn lex_next(&mut self) -> Result<Option<Token>, Error> {
        self.skip_whitespace();

        let Some(c) = self.cur_char() else {
            return Ok(None);
        };

        // '_' is ASCII punctuation but also a legal identifier head, so the
        // identifier class is checked first.
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(Some(self.lex_ident()));
        }

        if c.is_ascii_digit() {
            return self.lex_number().map(Some);
        }

        if c.is_ascii_punctuation() {
            self.index += 1;
            return Ok(Some(self.token(
                TokenKind::Operator(c),
                (self.index - 1)..self.index,
            )));
        }

        Err(Error::new(
            self.error(self.index, 1)
                .with_code(ErrorCode::UnexpectedCharacter)
                .with_message("unexpected character")
                .with_label(
                    self.label(self.index, 1)
                        .with_message("not part of any token class"),
                )
                .finish(),
        ))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.index;
        let mut string = String::new();
        while let Some(c) = self.cur_char()
            && (c.is_ascii_alphanumeric() || c == '_')
        {
            string.push(c);
            self.index += 1;
        }

        self.token(TokenKind::Ident(string), start..self.index)
    }

    fn lex_number(&mut self) -> Result<Token, Error> {
        let start = self.index;

        let base: u8 = if self.cur_char() == Some('0') && self.peek_char(1) == Some('x') {
            self.index += 2;
            if !self.cur_char().is_some_and(is_hex_digit) {
                return Err(Error::new(
                    self.error(start, self.index - start)
                        .with_code(ErrorCode::MalformedHexLiteral)
                        .with_message("expected number to follow '0x'")
                        .with_label(
                            self.label(start, self.index - start)
                                .with_message("hex literal without digits"),
                        )
                        .finish(),
                ));
            }
            16
        } else {
            10
        };

        // The target machine's word is 8 bits; larger literals wrap.
        let mut value: u8 = 0;
        while let Some(c) = self.cur_char()
            && (c.is_ascii_digit() || (base == 16 && is_hex_digit(c)))
        {
            let digit = match c {
                '0'..='9' => c as u8 - b'0',
                _ => c as u8 - b'A' + 10,
            };
            value = value.wrapping_mul(base).wrapping_add(digit);
            self.index += 1;
        }

        Ok(self.token(TokenKind::Number(value), start..self.index))
    }

    fn token(&self, kind: TokenKind, span: Range<usize>) -> Token {
        Token {
            kind,
            line: self.line,
            span,
        }
    }

    fn error(&self, pos: usize, length: usize) -> ReportBuilder<'static, Span> {
        Report::build(
            ReportKind::Error,
            (self.source_name.clone(), pos..(pos + length)),
        )
    }

    fn label(&mut self, pos: usize, length: usize) -> Label<Span> {
        Label::new((self.source_name.clone(), pos..(pos + length)))
            .with_color(self.color_gen.next())
    }
}

/// Hex digits are `0`-`9` and uppercase `A`-`F`; lowercase letters end the
/// literal just like any other non-digit.
fn is_hex_digit(c: char) -> bool {
    c.is_ascii_digit() || ('A'..='F').contains(&c)
}
