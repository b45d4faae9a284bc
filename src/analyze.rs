use std::{
    fmt::Display,
    ops::{Deref, Range},
    rc::Rc,
};

use ariadne::{ColorGenerator, Label, Report, ReportBuilder, ReportKind};

pub mod lex;

pub type Span = (Rc<String>, Range<usize>);

/// A single fatal translation diagnostic.
///
/// The first error aborts the translation unit; there is no recovery, so
/// errors are propagated with `?` rather than accumulated.
#[derive(Debug)]
pub struct Error(Box<Report<'static, Span>>);

impl Error {
    pub fn new(report: Report<'static, Span>) -> Self {
        Self(Box::new(report))
    }
}

impl Deref for Error {
    type Target = Report<'static, Span>;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

pub struct ErrorBuilder<'c> {
    builder: ReportBuilder<'static, Span>,
    context: &'c mut ErrorContext,
}

impl<'c> ErrorBuilder<'c> {
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.builder = self.builder.with_code(code);
        self
    }

    pub fn with_message(mut self, msg: impl ToString) -> Self {
        self.builder.set_message(msg);
        self
    }

    pub fn with_label(mut self, range: Range<usize>, msg: impl ToString) -> Self {
        let label = Label::new((self.context.source_name.clone(), range))
            .with_color(self.context.color_gen.next())
            .with_message(msg);

        self.builder.add_label(label);

        self
    }

    pub fn finish(self) -> Error {
        Error::new(self.builder.finish())
    }
}

/// Factory for diagnostics within one translation unit.
pub struct ErrorContext {
    source_name: Rc<String>,
    color_gen: ColorGenerator,
}

impl ErrorContext {
    pub fn new(source_name: Rc<String>) -> Self {
        Self {
            source_name,
            color_gen: ColorGenerator::new(),
        }
    }

    pub fn unexpected_token(
        &mut self,
        range: Range<usize>,
        message: impl ToString,
    ) -> ErrorBuilder<'_> {
        self.build(range.clone())
            .with_code(ErrorCode::UnexpectedToken)
            .with_message("unexpected token")
            .with_label(range, message)
    }

    pub fn unexpected_eof(&mut self, pos: usize) -> ErrorBuilder<'_> {
        let range = pos.saturating_sub(1)..pos;
        self.build(range.clone())
            .with_code(ErrorCode::UnexpectedToken)
            .with_message("unexpected end of input")
            .with_label(range, "the instruction is cut short here")
    }

    pub fn build(&mut self, range: Range<usize>) -> ErrorBuilder<'_> {
        let builder = Report::build(ReportKind::Error, (self.source_name.clone(), range));

        ErrorBuilder {
            builder,
            context: self,
        }
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    UnexpectedCharacter,
    MalformedHexLiteral,
    UnexpectedToken,
    UnknownMnemonic,
    UnknownRegister,
    ModeNotAllowed,
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:02}", *self as u32)
    }
}
