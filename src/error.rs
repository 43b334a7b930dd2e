//! Errors of the `sprig-opt` driver.

use std::path::PathBuf;

use derive_more::{Display, Error, From};
use sprig_ir::IrError;

/// Failures outside the IR itself. IR diagnostics travel as `Vec<IrError>`
/// so they can be rendered against the source.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    #[display("cannot read '{}': {source}", path.display())]
    #[from(skip)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("cannot write '{}': {source}", path.display())]
    #[from(skip)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("invalid config '{}': {source}", path.display())]
    #[from(skip)]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[display("{_0}")]
    Ir(IrError),
}
