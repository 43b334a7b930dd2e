//! The `sprig-opt` stages.
//!
//! ```text
//! source text
//!     │
//!     ▼
//! parse ─► Module (unverified)
//!     │
//!     ▼
//! verify ─► Module (fail-fast or accumulate)
//!     │
//!     ├─► print ─► text in custom or generic syntax
//!     │
//!     └─► roundtrip ─► both syntaxes reparsed and compared
//! ```
//!
//! IR failures come back as `Vec<IrError>`: one entry for a parse error,
//! one or more for the verifier depending on the mode.

use derive_more::Display;
use sprig_ir::equivalence::StructuralDiff;
use sprig_ir::{
    IrError, Module, Registry, Syntax, VerifyMode, parse_module, parse_module_unverified,
    print_module, verify_module,
};

use crate::config::Config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    pub syntax: Syntax,
    pub verify: bool,
    pub mode: VerifyMode,
}

impl Default for Options {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Options {
    fn from(config: &Config) -> Self {
        Self {
            syntax: config.syntax,
            verify: config.verify,
            mode: config.diagnostics,
        }
    }
}

// =============================================================================
// Stages
// =============================================================================

pub fn parse(registry: &Registry, source: &str, options: &Options) -> Result<Module, Vec<IrError>> {
    let module = parse_module_unverified(registry, source).map_err(|e| vec![e])?;
    if options.verify {
        verify_module(registry, &module, options.mode)?;
    } else {
        tracing::warn!("verifier skipped; custom forms fall back to generic for invalid ops");
    }
    Ok(module)
}

pub fn print(registry: &Registry, source: &str, options: &Options) -> Result<String, Vec<IrError>> {
    let module = parse(registry, source, options)?;
    let text = print_module(registry, &module, options.syntax);
    tracing::debug!(syntax = %options.syntax, bytes = text.len(), "printed module");
    Ok(text)
}

pub fn verify(registry: &Registry, source: &str, mode: VerifyMode) -> Result<(), Vec<IrError>> {
    let options = Options {
        verify: true,
        mode,
        ..Options::default()
    };
    parse(registry, source, &options).map(drop)
}

// =============================================================================
// Round trip
// =============================================================================

/// One broken leg of the round-trip contract.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Violation {
    #[display("{syntax} output does not parse: {error}")]
    Reparse { syntax: Syntax, error: IrError },

    #[display("{syntax} output parses to a different module: {diff}")]
    Structure { syntax: Syntax, diff: StructuralDiff },

    #[display("{syntax} output prints differently in {other} syntax once reparsed")]
    Reprint { syntax: Syntax, other: Syntax },
}

/// Print the module in both syntaxes, reparse each text and compare the
/// result with the original, structurally and by reprinting it in both
/// syntaxes. An empty list means the contract holds.
pub fn roundtrip(registry: &Registry, source: &str) -> Result<Vec<Violation>, Vec<IrError>> {
    let module = parse(registry, source, &Options::default())?;
    let printed = [Syntax::Custom, Syntax::Generic].map(|syntax| (syntax, print_module(registry, &module, syntax)));

    let mut violations = Vec::new();
    for (syntax, text) in &printed {
        let syntax = *syntax;
        let reparsed = match parse_module(registry, text) {
            Ok(reparsed) => reparsed,
            Err(error) => {
                violations.push(Violation::Reparse { syntax, error });
                continue;
            }
        };
        if let Some(diff) = module.structural_diff(&reparsed) {
            violations.push(Violation::Structure { syntax, diff });
            continue;
        }
        for (other, expected) in &printed {
            if print_module(registry, &reparsed, *other) != *expected {
                violations.push(Violation::Reprint { syntax, other: *other });
            }
        }
    }
    tracing::debug!(violations = violations.len(), "round trip checked");
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    const SCFGWI: &str = "%0 = riscv.get_register : !riscv.reg<>
%1 = riscv_snitch.scfgwi %0, 42 : (!riscv.reg<>) -> !riscv.reg<zero>
";

    fn registry() -> Registry {
        sprig_riscv::registry().unwrap()
    }

    #[test]
    fn print_both_syntaxes() {
        let registry = registry();
        let custom = print(&registry, SCFGWI, &Options::default()).unwrap();
        assert_snapshot!(custom, @r"
        builtin.module {
          %0 = riscv.get_register : !riscv.reg<>
          %1 = riscv_snitch.scfgwi %0, 42 : (!riscv.reg<>) -> !riscv.reg<zero>
        }
        ");
        let options = Options {
            syntax: Syntax::Generic,
            ..Options::default()
        };
        assert_snapshot!(print(&registry, SCFGWI, &options).unwrap(), @r#"
        "builtin.module"() ({
          %0 = "riscv.get_register"() : () -> !riscv.reg<>
          %1 = "riscv_snitch.scfgwi"(%0) {"immediate" = 42 : si12} : (!riscv.reg<>) -> !riscv.reg<zero>
        }) : () -> ()
        "#);
    }

    #[test]
    fn verify_modes() {
        let registry = registry();
        let src = "%0 = riscv.get_register : !riscv.reg<>
%1 = riscv.addi %0, 5000 : (!riscv.reg<>) -> !riscv.reg<>
%2 = riscv.andi %0, -5000 : (!riscv.reg<>) -> !riscv.reg<>
";
        assert_eq!(verify(&registry, src, VerifyMode::FailFast).unwrap_err().len(), 1);
        assert_eq!(verify(&registry, src, VerifyMode::Accumulate).unwrap_err().len(), 2);
        assert_eq!(verify(&registry, SCFGWI, VerifyMode::Accumulate), Ok(()));
    }

    #[test]
    fn unverified_print_falls_back_to_generic() {
        let registry = registry();
        let src = "%0 = riscv.get_register : !riscv.reg<>
%1 = riscv.addi %0, 5000 : (!riscv.reg<>) -> !riscv.reg<>
";
        let options = Options {
            verify: false,
            ..Options::default()
        };
        let text = print(&registry, src, &options).unwrap();
        assert!(text.contains(r#"%1 = "riscv.addi"(%0) {"immediate" = 5000 : si12}"#), "{text}");
    }

    #[test]
    fn parse_errors_are_single() {
        let registry = registry();
        let errors = print(&registry, "riscv.nope", &Options::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_unknown_operation());
    }

    #[test]
    fn roundtrip_holds_for_snitch_ops() {
        let registry = registry();
        assert_eq!(roundtrip(&registry, SCFGWI).unwrap(), vec![]);
    }
}
