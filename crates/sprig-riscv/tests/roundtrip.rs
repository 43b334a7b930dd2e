//! Whole-module round trips over every RISC-V dialect.

use insta::assert_snapshot;
use sprig_ir::{Syntax, VerifyMode, parse_module, parse_module_unverified, print_module, verify_module};
use sprig_riscv::registry;

const SAXPY: &str = include_str!("fixtures/saxpy.ir");

#[test]
fn custom_form_is_canonical() {
    let registry = registry().unwrap();
    let module = parse_module(&registry, SAXPY).unwrap();
    assert_eq!(print_module(&registry, &module, Syntax::Custom), SAXPY);
}

#[test]
fn generic_form() {
    let registry = registry().unwrap();
    let module = parse_module(&registry, SAXPY).unwrap();
    assert_snapshot!(print_module(&registry, &module, Syntax::Generic), @r#"
    "builtin.module"() ({
      "riscv_func.func"() ({
      ^bb0(%n : !riscv.reg<a0>, %alpha : !riscv.freg<fa0>):
        %x = "riscv_snitch.get_stream"() : () -> !snitch.readable<!riscv.freg<ft0>>
        %y = "riscv_snitch.get_stream"() : () -> !snitch.readable<!riscv.freg<ft1>>
        %z = "riscv_snitch.get_stream"() : () -> !snitch.writable<!riscv.freg<ft2>>
        %0 = "riscv.li"() {"immediate" = 8 : i32} : () -> !riscv.reg<>
        %1 = "riscv_snitch.scfgwi"(%0) {"immediate" = 42 : si12} : (!riscv.reg<>) -> !riscv.reg<zero>
        %2 = "riscv.addi"(%n) {"immediate" = -1 : si12} : (!riscv.reg<a0>) -> !riscv.reg<t1>
        "riscv_snitch.frep_outer"(%2) ({
          %3 = "riscv_snitch.read"(%x) : (!snitch.readable<!riscv.freg<ft0>>) -> !riscv.freg<ft0>
          %4 = "riscv_snitch.read"(%y) : (!snitch.readable<!riscv.freg<ft1>>) -> !riscv.freg<ft1>
          %5 = "riscv.fmul.d"(%alpha, %3) : (!riscv.freg<fa0>, !riscv.freg<ft0>) -> !riscv.freg<ft3>
          %6 = "riscv.fadd.d"(%5, %4) : (!riscv.freg<ft3>, !riscv.freg<ft1>) -> !riscv.freg<ft2>
          "riscv_snitch.write"(%6, %z) : (!riscv.freg<ft2>, !snitch.writable<!riscv.freg<ft2>>) -> ()
          "riscv_snitch.frep_yield"() : () -> ()
        }) {"stagger_mask" = #builtin.int<0>, "stagger_count" = #builtin.int<0>} : (!riscv.reg<t1>) -> ()
        "riscv_snitch.dmsrc"(%n, %2) : (!riscv.reg<a0>, !riscv.reg<t1>) -> ()
        %7 = "riscv_snitch.dmcpyi"(%n) {"immediate" = 3 : ui5} : (!riscv.reg<a0>) -> !riscv.reg<t2>
        %8 = "riscv_snitch.dmstati"() {"immediate" = 2 : ui5} : () -> !riscv.reg<t3>
        "riscv_func.return"(%n) : (!riscv.reg<a0>) -> ()
      }) {"sym_name" = "saxpy", "function_type" = (!riscv.reg<a0>, !riscv.freg<fa0>) -> !riscv.reg<a0>} : () -> ()
    }) {"sym_name" = "kernels"} : () -> ()
    "#);
}

#[test]
fn both_forms_parse_to_the_same_module() {
    let registry = registry().unwrap();
    let module = parse_module(&registry, SAXPY).unwrap();
    let generic = print_module(&registry, &module, Syntax::Generic);
    let from_generic = parse_module(&registry, &generic).unwrap();
    if let Some(diff) = module.structural_diff(&from_generic) {
        panic!("{diff}\n{generic}");
    }
    assert_eq!(print_module(&registry, &from_generic, Syntax::Custom), SAXPY);
    assert_eq!(print_module(&registry, &from_generic, Syntax::Generic), generic);
}

#[test]
fn terminator_only_appears_in_generic_form() {
    let registry = registry().unwrap();
    let module = parse_module(&registry, SAXPY).unwrap();
    let yield_op = r#""riscv_snitch.frep_yield"() : () -> ()"#;
    let generic = print_module(&registry, &module, Syntax::Generic);
    assert_eq!(generic.matches(yield_op).count(), 1);
    assert!(!print_module(&registry, &module, Syntax::Custom).contains("frep_yield"));
}

#[test]
fn values_from_earlier_blocks_round_trip() {
    let src = "riscv_func.func @f(%n : !riscv.reg<a0>) -> !riscv.reg<a0> {
  %m = riscv.li 3 : !riscv.reg<>
  riscv_func.return %n : !riscv.reg<a0>
^bb1:
  riscv_snitch.frep_outer %m {
    %k = riscv.addi %m, 1 : (!riscv.reg<>) -> !riscv.reg<>
  }
  riscv_func.return %n : !riscv.reg<a0>
}";
    let registry = registry().unwrap();
    let module = parse_module(&registry, src).unwrap();
    for syntax in [Syntax::Custom, Syntax::Generic] {
        let text = print_module(&registry, &module, syntax);
        let reparsed = parse_module(&registry, &text).unwrap_or_else(|e| panic!("{e}\n{text}"));
        if let Some(diff) = module.structural_diff(&reparsed) {
            panic!("{diff}\n{text}");
        }
        assert_eq!(print_module(&registry, &reparsed, syntax), text);
    }
}

#[test]
fn values_from_later_blocks_are_rejected() {
    let later_result = r#""riscv_func.func"() ({
^bb0(%n : !riscv.reg<a0>):
  "riscv_snitch.frep_outer"(%m) ({
    "riscv_snitch.frep_yield"() : () -> ()
  }) {"stagger_mask" = #builtin.int<0>, "stagger_count" = #builtin.int<0>} : (!riscv.reg<>) -> ()
  "riscv_func.return"(%n) : (!riscv.reg<a0>) -> ()
^bb1:
  %m = "riscv.li"() {"immediate" = 3 : i32} : () -> !riscv.reg<>
  "riscv_func.return"(%n) : (!riscv.reg<a0>) -> ()
}) {"sym_name" = "f", "function_type" = (!riscv.reg<a0>) -> !riscv.reg<a0>} : () -> ()"#;
    let registry = registry().unwrap();
    let err = parse_module(&registry, later_result).unwrap_err();
    assert!(err.is_undefined_value(), "{err}");
    assert_eq!(err.to_string(), "undefined value '%m'");

    let later_argument = later_result
        .replace("^bb1:", "^bb1(%m : !riscv.reg<>):")
        .replace("  %m = \"riscv.li\"() {\"immediate\" = 3 : i32} : () -> !riscv.reg<>\n", "");
    let err = parse_module(&registry, &later_argument).unwrap_err();
    assert!(err.is_verification(), "{err}");
    assert_eq!(
        err.to_string(),
        "'riscv_snitch.frep_outer' failed to verify: operand #0 is defined in a later block"
    );
}

#[test]
fn accumulate_reports_every_failure() {
    let src = "%0 = riscv.get_register : !riscv.reg<>
%1 = riscv_snitch.scfgwi %0, 4096 : (!riscv.reg<>) -> !riscv.reg<zero>
%2 = riscv.slli %0, 32 : (!riscv.reg<>) -> !riscv.reg<>
%3 = riscv.get_float_register : !riscv.freg<>
%4 = \"riscv.add\"(%0, %3) : (!riscv.reg<>, !riscv.freg<>) -> !riscv.reg<>";
    let registry = registry().unwrap();
    let module = parse_module_unverified(&registry, src).unwrap();

    let errors = verify_module(&registry, &module, VerifyMode::Accumulate).unwrap_err();
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_snapshot!(messages.join("\n"), @r"
    'riscv_snitch.scfgwi' failed to verify: attribute 'immediate' value 4096 is out of range for si12 (-2048..=2047)
    'riscv.slli' failed to verify: attribute 'immediate' value 32 is out of range for ui5 (0..=31)
    'riscv.add' failed to verify: operand #1 ('rs2') must be !riscv.reg
    ");

    let first = verify_module(&registry, &module, VerifyMode::FailFast).unwrap_err();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].to_string(), messages[0]);
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = registry().unwrap();
    let expected = {
        let module = parse_module(&registry, SAXPY).unwrap();
        print_module(&registry, &module, Syntax::Generic)
    };
    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let module = parse_module(&registry, SAXPY).unwrap();
                    print_module(&registry, &module, Syntax::Generic)
                })
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), expected);
        }
    });
}
