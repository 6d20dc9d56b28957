use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// Translate Vapor programs to register-allocated Vapor-M.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input file; reads standard input when omitted.
    input: Option<PathBuf>,

    /// Write output here instead of standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let source = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading standard input")?;
            buf
        }
    };

    let translated = v2vm::translate(&source)?;

    match &args.output {
        Some(path) => fs::write(path, translated)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{translated}"),
    }

    Ok(())
}
