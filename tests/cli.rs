//! End-to-end runs of the `sprig-opt` binary.

mod common;

use common::{ir_file, sprig_opt};
use insta::assert_snapshot;

const SAXPY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/crates/sprig-riscv/tests/fixtures/saxpy.ir");

const SCFGWI: &str = "%0 = riscv.get_register : !riscv.reg<>
%1 = riscv_snitch.scfgwi %0, 42 : (!riscv.reg<>) -> !riscv.reg<zero>
";

#[test]
fn print_generic() {
    let dir = tempfile::tempdir().unwrap();
    let input = ir_file(SCFGWI);
    let out = sprig_opt(dir.path(), &["print", "--syntax", "generic", input.path().to_str().unwrap()]);
    assert!(out.success, "{}", out.stderr);
    assert_snapshot!(out.stdout, @r#"
    "builtin.module"() ({
      %0 = "riscv.get_register"() : () -> !riscv.reg<>
      %1 = "riscv_snitch.scfgwi"(%0) {"immediate" = 42 : si12} : (!riscv.reg<>) -> !riscv.reg<zero>
    }) : () -> ()
    "#);
}

#[test]
fn print_to_file_in_custom_form() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.ir");
    let out = sprig_opt(dir.path(), &["print", SAXPY, "-o", output.to_str().unwrap()]);
    assert!(out.success, "{}", out.stderr);
    assert_eq!(out.stdout, "");
    let expected = std::fs::read_to_string(SAXPY).unwrap();
    assert_eq!(std::fs::read_to_string(output).unwrap(), expected);
}

#[test]
fn config_file_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sprig.toml"), "syntax = \"generic\"\n").unwrap();
    let input = ir_file(SCFGWI);
    let out = sprig_opt(dir.path(), &["print", input.path().to_str().unwrap()]);
    assert!(out.success, "{}", out.stderr);
    assert!(out.stdout.starts_with("\"builtin.module\"() ({"), "{}", out.stdout);

    // The flag wins over the file.
    let out = sprig_opt(dir.path(), &["print", "--syntax", "custom", input.path().to_str().unwrap()]);
    assert!(out.stdout.starts_with("builtin.module {"), "{}", out.stdout);
}

#[test]
fn broken_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "verify = \"maybe\"\n").unwrap();
    let out = sprig_opt(dir.path(), &["--config", config.to_str().unwrap(), "verify", SAXPY]);
    assert!(!out.success);
    assert!(out.stderr.contains("invalid config"), "{}", out.stderr);
}

#[test]
fn verify_accumulates_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let input = ir_file(
        "%0 = riscv.get_register : !riscv.reg<>
%1 = riscv.addi %0, 5000 : (!riscv.reg<>) -> !riscv.reg<>
%2 = riscv.slli %0, 99 : (!riscv.reg<>) -> !riscv.reg<>
",
    );
    let path = input.path().to_str().unwrap();

    let out = sprig_opt(dir.path(), &["verify", path]);
    assert!(!out.success);
    assert!(out.stderr.contains("1 error(s)"), "{}", out.stderr);

    let out = sprig_opt(dir.path(), &["verify", "--accumulate", path]);
    assert!(!out.success);
    assert!(out.stderr.contains("2 error(s)"), "{}", out.stderr);
    assert!(out.stderr.contains("value 5000 is out of range for si12"), "{}", out.stderr);
    assert!(out.stderr.contains("value 99 is out of range for ui5"), "{}", out.stderr);
}

#[test]
fn verify_clean_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = sprig_opt(dir.path(), &["verify", SAXPY]);
    assert!(out.success, "{}", out.stderr);
    assert!(out.stdout.ends_with(": ok\n"), "{}", out.stdout);
}

#[test]
fn parse_errors_point_at_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let input = ir_file("%1 = riscv.mv %missing : (!riscv.reg<>) -> !riscv.reg<>\n");
    let out = sprig_opt(dir.path(), &["print", input.path().to_str().unwrap()]);
    assert!(!out.success);
    assert!(out.stderr.contains("undefined value '%missing'"), "{}", out.stderr);
    assert!(out.stderr.contains("undefined-value"), "{}", out.stderr);
}

#[test]
fn roundtrip_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let out = sprig_opt(dir.path(), &["roundtrip", SAXPY]);
    assert!(out.success, "{}", out.stderr);
    assert!(out.stdout.ends_with("round trip ok\n"), "{}", out.stdout);
}

#[test]
fn missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = sprig_opt(dir.path(), &["print", "nowhere.ir"]);
    assert!(!out.success);
    assert!(out.stderr.contains("cannot read 'nowhere.ir'"), "{}", out.stderr);
}
