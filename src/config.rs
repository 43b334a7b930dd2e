//! `sprig.toml` settings for `sprig-opt`.
//!
//! ```toml
//! syntax = "generic"          # or "custom"
//! verify = true
//! diagnostics = "accumulate"  # or "fail-fast"
//! log = "sprig_ir=debug"
//! ```
//!
//! Command-line flags override every value here.

use std::path::Path;

use serde::Deserialize;
use sprig_ir::{Syntax, VerifyMode};

use crate::error::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_FILE: &str = "sprig.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output syntax of `print`.
    pub syntax: Syntax,
    /// Run the verifier after parsing.
    pub verify: bool,
    pub diagnostics: VerifyMode,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            syntax: Syntax::Custom,
            verify: true,
            diagnostics: VerifyMode::FailFast,
            log: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read `path`, or [`DEFAULT_FILE`] when it exists, or fall back to the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::read(path),
            None if Path::new(DEFAULT_FILE).is_file() => Self::read(Path::new(DEFAULT_FILE)),
            None => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
