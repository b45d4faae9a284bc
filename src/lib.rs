use std::{marker::PhantomData, path::Path, rc::Rc};

use ariadne::Source;
use tracing::info;

use crate::{
    analyze::{Error, lex::Lexer},
    synthesize::{ObjectImage, encode::encode, output::Output},
};

pub mod analyze;
pub mod synthesize;

/// The assembly pipeline: source text in, object image out, handed to an
/// [Output] destination.
#[derive(Default)]
pub struct Assembler<O: Output> {
    _marker: PhantomData<O>,
}

impl<O: Output> Assembler<O> {
    /// Translates the file at `path` and writes the object to `out_path`.
    ///
    /// Every failure is reported to stderr here, with the path for I/O
    /// errors and a rendered diagnostic for translation errors; the caller
    /// only learns that assembly failed.
    pub fn assemble(
        &self,
        path: impl AsRef<Path>,
        out_path: impl AsRef<Path>,
    ) -> Result<ObjectImage, ()> {
        let path = path.as_ref();
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("couldn't open '{}': {}", path.display(), e);
                return Err(());
            }
        };

        let source_name = Rc::new(
            path.file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(String::from("unknown")),
        );

        let image = match self.assemble_source(source_name.clone(), &source) {
            Ok(image) => image,
            Err(e) => {
                e.eprint((source_name, Source::from(source)))
                    .expect("couldn't print error message to stderr");
                return Err(());
            }
        };

        if let Err(e) = O::default().write(&image, out_path.as_ref()) {
            eprintln!("couldn't write '{}': {}", out_path.as_ref().display(), e);
            return Err(());
        }

        Ok(image)
    }

    /// Runs the tokenizer and the encoder over in-memory source.
    pub fn assemble_source(&self, name: Rc<String>, source: &str) -> Result<ObjectImage, Error> {
        let stream = Lexer::tokenize(name.clone(), source)?;
        let image = encode(stream, name)?;

        info!(
            "assembled {} instructions into {} bytes",
            image.instruction_count,
            image.bytes.len()
        );

        Ok(image)
    }
}
