//! Common helpers for driving the `sprig-opt` binary.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

pub struct Output {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Write `source` to a temporary `.ir` file.
pub fn ir_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".ir").expect("Failed to create temp file");
    file.write_all(source.as_bytes()).expect("Failed to write IR");
    file
}

/// Run `sprig-opt` in `dir` with logging off.
pub fn sprig_opt(dir: &Path, args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_sprig-opt"))
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to execute sprig-opt");
    Output {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
