use std::{ops::Range, rc::Rc};

use tracing::trace;

use crate::{
    analyze::{
        Error, ErrorCode, ErrorContext,
        lex::{
            TokenStream,
            token::{Token, TokenKind},
        },
    },
    synthesize::{
        ObjectImage,
        isa::{AddressingMode, Mnemonic, Register},
    },
};

/// Encodes a token stream into the binary object image.
///
/// The stream must alternate mnemonics and their operand lists; each
/// instruction becomes an `[opcode, mode, operand-bytes...]` record, with
/// records concatenated in source order and nothing in between. The first
/// translation error aborts encoding, and no bytes of the failing
/// instruction are ever appended.
pub fn encode(stream: TokenStream, source_name: Rc<String>) -> Result<ObjectImage, Error> {
    Encoder {
        err_ctx: ErrorContext::new(source_name),
        stream,
        image: ObjectImage::default(),
    }
    .run()
}

struct Encoder {
    err_ctx: ErrorContext,
    stream: TokenStream,
    image: ObjectImage,
}

impl Encoder {
    fn run(mut self) -> Result<ObjectImage, Error> {
        while self.stream.current().is_some() {
            self.encode_instruction()?;
        }

        Ok(self.image)
    }

    fn encode_instruction(&mut self) -> Result<(), Error> {
        let (mnemonic, mnemonic_span) = self.expect_mnemonic()?;
        let (mode, operands) = self.resolve_operands()?;

        if !mnemonic.allowed_modes().contains(mode.flag()) {
            let operand_span = operands
                .first()
                .zip(operands.last())
                .map(|(first, last)| first.span.start..last.span.end)
                .unwrap_or(mnemonic_span.clone());

            return Err(self
                .err_ctx
                .build(operand_span.clone())
                .with_code(ErrorCode::ModeNotAllowed)
                .with_message(format!(
                    "addressing mode {:?} is not allowed for {}",
                    mode,
                    mnemonic.name()
                ))
                .with_label(operand_span, format!("resolves to the {:?} form", mode))
                .with_label(
                    mnemonic_span,
                    format!("{} does not accept these operands", mnemonic.name()),
                )
                .finish());
        }

        // The record is buffered whole so a failing register lookup can't
        // leave a truncated instruction in the image.
        let mut record = Vec::with_capacity(2 + operands.len());
        record.push(mnemonic.opcode());
        record.push(mode.tag());
        for token in &operands {
            record.push(self.operand_byte(token)?);
        }

        trace!("encoded {} {:?} ({} bytes)", mnemonic.name(), mode, record.len());

        self.image.bytes.extend(record);
        self.image.instruction_count += 1;

        Ok(())
    }

    fn expect_mnemonic(&mut self) -> Result<(Mnemonic, Range<usize>), Error> {
        let token = self.expect_take_current()?;
        let TokenKind::Ident(ref name) = token.kind else {
            return Err(self
                .err_ctx
                .unexpected_token(
                    token.span.clone(),
                    format!(
                        "expected an instruction mnemonic, found {}",
                        token.kind.describe()
                    ),
                )
                .finish());
        };

        match Mnemonic::parse(name) {
            Some(mnemonic) => Ok((mnemonic, token.span)),
            None => Err(self
                .err_ctx
                .build(token.span.clone())
                .with_code(ErrorCode::UnknownMnemonic)
                .with_message(format!("unknown mnemonic '{}'", name))
                .with_label(token.span.clone(), "not in the instruction table")
                .finish()),
        }
    }

    fn operand_byte(&mut self, token: &Token) -> Result<u8, Error> {
        match &token.kind {
            TokenKind::Number(value) => Ok(*value),
            TokenKind::Ident(name) => match Register::parse(name) {
                Some(register) => Ok(register.index()),
                None => Err(self
                    .err_ctx
                    .build(token.span.clone())
                    .with_code(ErrorCode::UnknownRegister)
                    .with_message(format!("unknown register '{}'", name))
                    .with_label(token.span.clone(), "not in the register table")
                    .finish()),
            },
            // the resolver only records number and identifier tokens as operands
            TokenKind::Operator(_) => unreachable!("operator token recorded as an operand"),
        }
    }
}

/// Operand resolution
impl Encoder {
    /// Determines which addressing mode is in use immediately after a
    /// mnemonic and extracts the operand tokens belonging to it, leaving
    /// the cursor on the token after the full operand list.
    ///
    /// Dispatch is on token kind only, never on value: any identifier
    /// followed by `,` and a number resolves to the register/immediate form
    /// whether or not it names a real register. Register validity is
    /// checked at emission.
    fn resolve_operands(&mut self) -> Result<(AddressingMode, Vec<Token>), Error> {
        let Some(first) = self.stream.current().cloned() else {
            return Ok((AddressingMode::NoOperand, Vec::new()));
        };

        // a mnemonic in operand position means the previous instruction
        // took zero operands
        if let TokenKind::Ident(name) = &first.kind
            && Mnemonic::parse(name).is_some()
        {
            return Ok((AddressingMode::NoOperand, Vec::new()));
        }

        match first.kind {
            TokenKind::Ident(_) => self.resolve_register_first(first),
            TokenKind::Operator(_) => self.resolve_memory_first(first),
            TokenKind::Number(_) => {
                self.stream.advance();
                Ok((AddressingMode::Immediate, vec![first]))
            }
        }
    }

    /// Operand 0 is a register; the shape depends on what follows it.
    fn resolve_register_first(
        &mut self,
        first: Token,
    ) -> Result<(AddressingMode, Vec<Token>), Error> {
        self.stream.advance();

        // tentatively consume a ','; the bare-register form backs the
        // cursor up to just past operand 0
        let saved = self.stream.index();
        match self.take_current() {
            Some(token) if token.kind == TokenKind::Operator(',') => (),
            _ => {
                self.stream.rewind(saved);
                return Ok((AddressingMode::Register, vec![first]));
            }
        }

        let second = self.expect_take_current()?;
        match second.kind {
            TokenKind::Number(_) => Ok((AddressingMode::RegImm, vec![first, second])),
            TokenKind::Ident(_) => Ok((AddressingMode::RegReg, vec![first, second])),
            TokenKind::Operator('[') => {
                let (base, offset) = self.memory_reference_rest()?;
                Ok((AddressingMode::RegMem, vec![first, base, offset]))
            }
            TokenKind::Operator(_) => Err(self
                .err_ctx
                .unexpected_token(second.span, "expected an immediate, a register or '['")
                .finish()),
        }
    }

    /// Operand 0 lives inside a `[reg+imm]` memory reference; the trailing
    /// operand decides between the immediate and register shapes.
    fn resolve_memory_first(
        &mut self,
        first: Token,
    ) -> Result<(AddressingMode, Vec<Token>), Error> {
        if first.kind != TokenKind::Operator('[') {
            return Err(self
                .err_ctx
                .unexpected_token(first.span, "expected instruction operands")
                .finish());
        }
        self.stream.advance();

        let (base, offset) = self.memory_reference_rest()?;
        self.expect_operator(',', "expected ',' after the memory reference")?;

        let last = self.expect_take_current()?;
        match last.kind {
            TokenKind::Number(_) => Ok((AddressingMode::MemImm, vec![base, offset, last])),
            TokenKind::Ident(_) => Ok((AddressingMode::MemReg, vec![base, offset, last])),
            TokenKind::Operator(_) => Err(self
                .err_ctx
                .unexpected_token(
                    last.span,
                    "expected an immediate or a register after the memory reference",
                )
                .finish()),
        }
    }

    /// Consumes `reg (+|-) imm ]`, the remainder of a memory reference
    /// whose opening `[` has already been taken. Every transition is
    /// expectation-checked; malformed brackets never advance blindly.
    fn memory_reference_rest(&mut self) -> Result<(Token, Token), Error> {
        let base = self.expect_ident("expected a base register inside '[...]'")?;
        self.expect_sign()?;
        let offset = self.expect_number("expected a displacement inside '[...]'")?;
        self.expect_operator(']', "expected a closing ']'")?;

        Ok((base, offset))
    }
}

/// Cursor helpers
impl Encoder {
    fn take_current(&mut self) -> Option<Token> {
        let token = self.stream.current().cloned();
        if token.is_some() {
            self.stream.advance();
        }

        token
    }

    fn expect_take_current(&mut self) -> Result<Token, Error> {
        match self.take_current() {
            Some(token) => Ok(token),
            None => Err(self.err_ctx.unexpected_eof(self.stream.end_pos()).finish()),
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<Token, Error> {
        let token = self.expect_take_current()?;
        if matches!(token.kind, TokenKind::Ident(_)) {
            Ok(token)
        } else {
            Err(self.unexpected_kind(token, message))
        }
    }

    fn expect_number(&mut self, message: &str) -> Result<Token, Error> {
        let token = self.expect_take_current()?;
        if matches!(token.kind, TokenKind::Number(_)) {
            Ok(token)
        } else {
            Err(self.unexpected_kind(token, message))
        }
    }

    fn expect_operator(&mut self, op: char, message: &str) -> Result<(), Error> {
        let token = self.expect_take_current()?;
        if token.kind == TokenKind::Operator(op) {
            Ok(())
        } else {
            Err(self.unexpected_kind(token, message))
        }
    }

    fn expect_sign(&mut self) -> Result<(), Error> {
        let token = self.expect_take_current()?;
        if matches!(token.kind, TokenKind::Operator('+' | '-')) {
            Ok(())
        } else {
            Err(self.unexpected_kind(
                token,
                "expected '+' or '-' between the base register and the displacement",
            ))
        }
    }

    fn unexpected_kind(&mut self, token: Token, message: &str) -> Error {
        self.err_ctx
            .unexpected_token(
                token.span.clone(),
                format!("{}, found {}", message, token.kind.describe()),
            )
            .finish()
    }
}
