use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use octasm::{Assembler, synthesize::output::RawBinary};

#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Assembly source file
    file: PathBuf,

    /// Object file to write (defaults to the source path with a `bin` extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log the token stream and each encoded instruction
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Error> {
    let args = Cli::parse();

    let level = if args.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if args.file.file_name().is_none() {
        return Err(Error::InvalidFile);
    }

    let out_path = args
        .output
        .unwrap_or_else(|| args.file.with_extension("bin"));

    let assembler = Assembler::<RawBinary>::default();
    let Ok(image) = assembler.assemble(&args.file, &out_path) else {
        return Err(Error::AssemblyFailed);
    };

    println!(
        "{:>12} {} ({} instructions, {} bytes)",
        "Assembled".bright_green(),
        out_path.display(),
        image.instruction_count,
        image.bytes.len()
    );

    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("path is not an assemblable file")]
    InvalidFile,
    #[error("assembly failed")]
    AssemblyFailed,
}
