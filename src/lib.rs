//! Driver library behind `sprig-opt`: settings, the parse/verify/print
//! pipeline and diagnostic rendering.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;

pub use config::Config;
pub use error::Error;
pub use pipeline::{Options, Violation};
