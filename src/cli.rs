//! Command-line interface for `sprig-opt`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use sprig_ir::Syntax;

#[derive(Parser)]
#[command(name = "sprig-opt")]
#[command(about = "Parse, verify and reprint sprig IR", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to ./sprig.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log more (-v debug, -vv trace); overrides RUST_LOG
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a file and print it in custom or generic syntax
    Print {
        file: PathBuf,

        #[arg(long, value_enum)]
        syntax: Option<SyntaxArg>,

        /// Print without running the verifier
        #[arg(long)]
        no_verify: bool,

        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Parse a file and report verifier diagnostics
    Verify {
        file: PathBuf,

        /// Report every failure instead of stopping at the first
        #[arg(long)]
        accumulate: bool,
    },
    /// Check that both syntaxes reparse to the same module
    #[command(alias = "rt")]
    Roundtrip { file: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SyntaxArg {
    Custom,
    Generic,
}

impl From<SyntaxArg> for Syntax {
    fn from(arg: SyntaxArg) -> Self {
        match arg {
            SyntaxArg::Custom => Syntax::Custom,
            SyntaxArg::Generic => Syntax::Generic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_flags() {
        let cli = Cli::try_parse_from(["sprig-opt", "-v", "print", "k.ir", "--syntax", "generic", "-o", "out.ir"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Print {
            file,
            syntax,
            no_verify,
            output,
        } = cli.command
        else {
            panic!("expected print");
        };
        assert_eq!(file, PathBuf::from("k.ir"));
        assert_eq!(syntax.map(Syntax::from), Some(Syntax::Generic));
        assert!(!no_verify);
        assert_eq!(output, Some(PathBuf::from("out.ir")));
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["sprig-opt", "verify", "k.ir", "--accumulate", "--config", "s.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("s.toml")));
        assert!(matches!(cli.command, Command::Verify { accumulate: true, .. }));
    }

    #[test]
    fn unknown_syntax_is_rejected() {
        assert!(Cli::try_parse_from(["sprig-opt", "print", "k.ir", "--syntax", "pretty"]).is_err());
    }
}
