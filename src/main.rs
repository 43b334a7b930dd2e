//! `sprig-opt`: parse, verify and reprint sprig IR.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
use sprig::diagnostics::eprint_errors;
use sprig::pipeline::{self, Options};
use sprig::{Config, Error};
use sprig_ir::{Registry, VerifyMode};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config, cli.verbose);

    let result = sprig_riscv::registry()
        .map_err(Error::from)
        .and_then(|registry| run(cli.command, &config, &registry));
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the command succeeded. Diagnostics are already printed.
fn run(command: Command, config: &Config, registry: &Registry) -> Result<bool, Error> {
    match command {
        Command::Print {
            file,
            syntax,
            no_verify,
            output,
        } => {
            let source = read(&file)?;
            let options = Options {
                syntax: syntax.map_or(config.syntax, Into::into),
                verify: config.verify && !no_verify,
                mode: config.diagnostics,
            };
            match pipeline::print(registry, &source, &options) {
                Ok(text) => {
                    write(output, &text)?;
                    Ok(true)
                }
                Err(errors) => {
                    eprint_errors(&errors, &source, &display_name(&file));
                    Ok(false)
                }
            }
        }
        Command::Verify { file, accumulate } => {
            let source = read(&file)?;
            let mode = if accumulate {
                VerifyMode::Accumulate
            } else {
                config.diagnostics
            };
            match pipeline::verify(registry, &source, mode) {
                Ok(()) => {
                    println!("{}: ok", display_name(&file));
                    Ok(true)
                }
                Err(errors) => {
                    eprint_errors(&errors, &source, &display_name(&file));
                    eprintln!("{} error(s)", errors.len());
                    Ok(false)
                }
            }
        }
        Command::Roundtrip { file } => {
            let source = read(&file)?;
            match pipeline::roundtrip(registry, &source) {
                Ok(violations) if violations.is_empty() => {
                    println!("{}: round trip ok", display_name(&file));
                    Ok(true)
                }
                Ok(violations) => {
                    for violation in &violations {
                        eprintln!("{}: {violation}", display_name(&file));
                    }
                    Ok(false)
                }
                Err(errors) => {
                    eprint_errors(&errors, &source, &display_name(&file));
                    Ok(false)
                }
            }
        }
    }
}

fn read(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(output: Option<PathBuf>, text: &str) -> Result<(), Error> {
    match output {
        Some(path) => std::fs::write(&path, text).map_err(|source| Error::Write { path, source }),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}
