use crate::attribute::Attribute;
use crate::context::IrContext;
use crate::location::Span;
use crate::refs::{OpRef, ValueDef};
use crate::symbol::Symbol;
use crate::test_dialect::parse;
use crate::types::IntegerType;

fn body_ops(ctx: &IrContext, op: OpRef) -> Vec<OpRef> {
    let region = ctx.op(op).regions[0];
    let block = ctx.region(region).blocks[0];
    ctx.block(block).ops.to_vec()
}

fn names(ctx: &IrContext, ops: &[OpRef]) -> Vec<String> {
    ops.iter().map(|&op| ctx.op_name(op).to_string()).collect()
}

#[test]
fn generic_and_custom_forms_build_the_same_thing() {
    let (ctx, root) = parse(
        r#"%0 = test.const 1 : i32
%1 = "test.const"() {"value" = 1 : i32} : () -> i32
%2 = "test.add"(%0, %1) {"flag"} : (i32, i32) -> i32"#,
    )
    .unwrap();
    let ops = body_ops(&ctx, root);
    assert_eq!(names(&ctx, &ops), ["test.const", "test.const", "test.add"]);
    assert_eq!(ctx.op(ops[0]).attributes, ctx.op(ops[1]).attributes);
    assert_eq!(ctx.op_result_types(ops[0]), ctx.op_result_types(ops[1]));

    let add = ops[2];
    assert_eq!(
        ctx.op_operands(add),
        [ctx.op_result(ops[0], 0), ctx.op_result(ops[1], 0)]
    );
    assert_eq!(
        ctx.op(add).attributes.get(&Symbol::new("flag")),
        Some(&Attribute::Unit)
    );
}

#[test]
fn unknown_operation_is_rejected_in_both_forms() {
    let err = parse(r#""test.nope"() : () -> ()"#).unwrap_err();
    assert!(err.is_unknown_operation());
    assert_eq!(err.to_string(), "unknown operation 'test.nope'");
    assert_eq!(err.span(), Some(Span::new(0, 11)));

    let err = parse("%0 = test.nope 1 : i32").unwrap_err();
    assert!(err.is_unknown_operation());
    assert_eq!(err.span(), Some(Span::new(5, 14)));
}

#[test]
fn op_without_custom_syntax_needs_generic_form() {
    let err = parse("%0 = test.const 1 : i32\n%1 = test.add %0, %0").unwrap_err();
    assert!(err.is_unexpected_token());
    assert_eq!(
        err.to_string(),
        r#"expected generic form "test.add"(...), found 'test.add'"#
    );
}

#[test]
fn undefined_value_reports_first_use() {
    let err = parse(r#""test.yield"(%x, %y) : (i32, i32) -> ()"#).unwrap_err();
    assert!(err.is_undefined_value());
    assert_eq!(err.to_string(), "undefined value '%x'");
    assert_eq!(err.span(), Some(Span::new(13, 15)));
}

#[test]
fn region_values_do_not_leak() {
    let err = parse(
        r#"test.region {
  %inner = test.const 1 : i32
}
"test.yield"(%inner) : (i32) -> ()"#,
    )
    .unwrap_err();
    assert!(err.is_undefined_value());
}

#[test]
fn nested_region_sees_enclosing_values() {
    let (ctx, root) = parse(
        r#"%0 = test.const 1 : i32
test.region {
  "test.yield"(%0) : (i32) -> ()
}"#,
    )
    .unwrap();
    let ops = body_ops(&ctx, root);
    let inner = body_ops(&ctx, ops[1]);
    assert_eq!(ctx.op_operands(inner[0]), [ctx.op_result(ops[0], 0)]);
}

#[test]
fn isolated_region_does_not_see_enclosing_values() {
    let err = parse(
        r#"%0 = test.const 1 : i32
"test.isolated"() ({
  "test.yield"(%0) : (i32) -> ()
}) : () -> ()"#,
    )
    .unwrap_err();
    assert!(err.is_undefined_value());
    assert_eq!(err.to_string(), "undefined value '%0'");
}

#[test]
fn redefinition_in_one_scope() {
    let err = parse("%0 = test.const 1 : i32\n%0 = test.const 2 : i32").unwrap_err();
    assert!(err.is_redefinition());
    assert_eq!(err.to_string(), "redefinition of '%0'");
    assert_eq!(err.span(), Some(Span::new(24, 26)));
}

#[test]
fn nested_region_may_shadow() {
    parse(
        r#"%0 = test.const 1 : i32
test.region {
  %0 = test.const 2 : i32
}"#,
    )
    .unwrap();
}

#[test]
fn duplicate_block_label() {
    let err = parse(
        r#""test.isolated"() ({
^bb0:
  "test.yield"() : () -> ()
^bb0:
  "test.yield"() : () -> ()
}) : () -> ()"#,
    )
    .unwrap_err();
    assert!(err.is_redefinition());
    assert_eq!(err.to_string(), "redefinition of '^bb0'");
}

#[test]
fn later_block_argument_can_be_named_ahead() {
    let (ctx, root) = parse(
        r#""test.isolated"() ({
^bb0:
  "test.yield"(%later) : (i32) -> ()
^bb1(%later : i32):
  "test.yield"() : () -> ()
}) : () -> ()"#,
    )
    .unwrap();
    let isolated = body_ops(&ctx, root)[0];
    let region = ctx.op(isolated).regions[0];
    let blocks = &ctx.region(region).blocks;
    let yield_op = ctx.block(blocks[0]).ops[0];
    let operand = ctx.op_operands(yield_op)[0];
    assert_eq!(operand, ctx.block_arg(blocks[1], 0));
    assert_eq!(ctx.value_def(operand), ValueDef::BlockArg(blocks[1], 0));
}

#[test]
fn result_cannot_be_used_before_its_operation() {
    let src = r#"%y = "test.add"(%x, %x) : (i32, i32) -> i32
%x = test.const 1 : i32"#;
    let err = parse(src).unwrap_err();
    assert!(err.is_undefined_value());
    assert_eq!(err.to_string(), "undefined value '%x'");
    assert_eq!(err.span(), Some(Span::new(16, 18)));
}

#[test]
fn result_in_later_block_is_undefined_earlier() {
    let err = parse(
        r#""test.isolated"() ({
^bb0:
  "test.yield"(%later) : (i32) -> ()
^bb1:
  %later = test.const 3 : i32
  "test.yield"() : () -> ()
}) : () -> ()"#,
    )
    .unwrap_err();
    assert!(err.is_undefined_value());
    assert_eq!(err.to_string(), "undefined value '%later'");
}

#[test]
fn forward_reference_type_must_match() {
    let err = parse(
        r#""test.isolated"() ({
^bb0:
  "test.yield"(%later) : (i64) -> ()
^bb1(%later : i32):
  "test.yield"() : () -> ()
}) : () -> ()"#,
    )
    .unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(
        err.to_string(),
        "type mismatch for '%later': expected i64, found i32"
    );
}

#[test]
fn operand_type_must_match_signature() {
    let err = parse("%0 = test.const 1 : i32\n\"test.yield\"(%0) : (i64) -> ()").unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(err.to_string(), "type mismatch for '%0': expected i64, found i32");
}

#[test]
fn operand_count_must_match_signature() {
    let err = parse("%0 = test.const 1 : i32\n\"test.yield\"(%0) : () -> ()").unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn result_names_must_match_result_count() {
    let err = parse("%a, %b = test.const 1 : i32").unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(
        err.to_string(),
        "type mismatch for results of 'test.const': expected 1 result(s), found 2 name(s)"
    );
}

#[test]
fn implicit_terminator_is_inserted_after_custom_parse() {
    let (ctx, root) = parse("test.region {\n  %0 = test.const 1 : i32\n}\ntest.region {}").unwrap();
    let ops = body_ops(&ctx, root);
    assert_eq!(names(&ctx, &body_ops(&ctx, ops[0])), ["test.const", "test.yield"]);
    assert_eq!(names(&ctx, &body_ops(&ctx, ops[1])), ["test.yield"]);
}

#[test]
fn explicit_terminator_is_not_duplicated() {
    let (ctx, root) = parse("test.region {\n  \"test.yield\"() : () -> ()\n}").unwrap();
    let region_op = body_ops(&ctx, root)[0];
    assert_eq!(names(&ctx, &body_ops(&ctx, region_op)), ["test.yield"]);
}

#[test]
fn generic_form_keeps_regions_as_written() {
    let (ctx, root) = parse(r#""test.region"() ({}) : () -> ()"#).unwrap();
    let region_op = body_ops(&ctx, root)[0];
    let region = ctx.op(region_op).regions[0];
    assert!(ctx.region(region).blocks.is_empty());
}

#[test]
fn entry_arguments_are_bound_in_the_body() {
    let (ctx, root) = parse(
        r#"test.region (%i : index, %b : !test.box<i32>) {
  "test.yield"(%i) : (index) -> ()
}"#,
    )
    .unwrap();
    let region_op = body_ops(&ctx, root)[0];
    let region = ctx.op(region_op).regions[0];
    let entry = ctx.region(region).blocks[0];
    let args = ctx.block_args(entry);
    assert_eq!(args.len(), 2);
    let yield_op = ctx.block(entry).ops[0];
    assert_eq!(ctx.op_operands(yield_op), [args[0]]);

    let boxed = ctx.types.get(ctx.value_ty(args[1]));
    assert!(boxed.is("test", "box"));
    let inner = IntegerType::from_type(&ctx.types, boxed.params[0]);
    assert_eq!(inner, Some(IntegerType::signless(32)));
}

#[test]
fn entry_arguments_exclude_an_entry_label() {
    let err = parse("test.region (%i : index) {\n^bb0:\n}").unwrap_err();
    assert!(err.is_unexpected_token());
}

#[test]
fn unknown_dialect_type() {
    let err = parse("test.region (%i : !test.nope) {}").unwrap_err();
    assert_eq!(err.to_string(), "unknown type '!test.nope'");
}

#[test]
fn loose_ops_are_wrapped_in_a_module() {
    let src = "%0 = test.const 1 : i32\n%1 = test.const 2 : i32";
    let (ctx, root) = parse(src).unwrap();
    assert!(ctx.op_name(root).is("builtin.module"));
    assert_eq!(ctx.op(root).span, Span::new(0, src.len()));
    assert_eq!(body_ops(&ctx, root).len(), 2);
}

#[test]
fn lone_module_is_not_wrapped() {
    let (ctx, root) = parse("builtin.module @m {\n  %0 = test.const 1 : i32\n}").unwrap();
    assert!(ctx.op_name(root).is("builtin.module"));
    assert_eq!(ctx.op(root).parent_block, None);
    assert_eq!(body_ops(&ctx, root).len(), 1);
}

#[test]
fn attribute_kinds() {
    let (ctx, root) = parse(
        r#""test.yield"() {
  int = 1, narrow = -2 : si8, float = 1.5, single = 2.0 : f32,
  bits = 0x7FF0000000000000 : f64, text = "a\"b", sym = @"my sym",
  ty = i32, list = [1, true], dialect = #test.thing<3>, flag, nothing = unit
} : () -> ()"#,
    )
    .unwrap();
    let op = body_ops(&ctx, root)[0];
    let attrs = &ctx.op(op).attributes;
    let get = |key: &'static str| attrs.get(&Symbol::new(key)).unwrap();

    let i64_ty = ctx.types.get(match get("int") {
        Attribute::Int { ty, .. } => *ty,
        other => panic!("unexpected {other:?}"),
    });
    assert!(i64_ty.is("builtin", "i64"));
    assert_eq!(get("narrow").as_int(), Some(-2));
    assert!(matches!(get("float"), Attribute::Float { bits, .. } if f64::from_bits(*bits) == 1.5));
    assert!(matches!(get("bits"), Attribute::Float { bits, .. } if f64::from_bits(*bits).is_infinite()));
    assert_eq!(get("text").as_str(), Some("a\"b"));
    assert_eq!(get("sym"), &Attribute::SymbolRef(Symbol::new("my sym")));
    assert!(get("ty").as_type().is_some());
    assert!(matches!(get("list"), Attribute::Array(items) if items.len() == 2));
    assert!(matches!(get("dialect"), Attribute::Opaque { params, .. } if params.len() == 1));
    assert_eq!(get("flag"), &Attribute::Unit);
    assert_eq!(get("nothing"), &Attribute::Unit);
    let keys: Vec<String> = attrs.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys[..3], ["int", "narrow", "float"]);
}

#[test]
fn duplicate_attribute_key() {
    let err = parse(r#""test.yield"() {a = 1, "a" = 2} : () -> ()"#).unwrap_err();
    assert!(err.is_redefinition());
    assert_eq!(err.to_string(), "redefinition of 'a'");
}

#[test]
fn lex_errors_surface_with_span() {
    let err = parse(r#""test.yield"() {a = 0x} : () -> ()"#).unwrap_err();
    assert!(err.is_lex());
    assert_eq!(err.span().map(|s| s.start), Some(20));
}

#[test]
fn truncated_input() {
    let err = parse(r#""test.yield"("#).unwrap_err();
    assert!(err.is_unexpected_token());
    assert_eq!(err.to_string(), "expected ')', found end of input");
}

#[test]
fn name_hints_are_kept() {
    let (ctx, root) = parse("%acc = test.const 0 : i32\n%7 = test.const 1 : i32").unwrap();
    let ops = body_ops(&ctx, root);
    assert_eq!(ctx.value_name(ctx.op_result(ops[0], 0)), Some(Symbol::new("acc")));
    assert_eq!(ctx.value_name(ctx.op_result(ops[1], 0)), None);
}
