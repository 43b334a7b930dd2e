//! Randomly built, well-typed kernels survive both syntaxes.
//!
//! Each case builds a `riscv_func.func` through the dialect builders,
//! prints it in custom and generic form, parses each text back and checks
//! the result is structurally the original and prints identically.

use proptest::prelude::*;
use sprig_ir::{
    BlockRef, DialectOp, IrContext, Module, Syntax, TypeRef, ValueRef, VerifyMode, parse_module, print_module,
    verify_module,
};
use sprig_riscv::registers::{FLOAT_REGISTERS, INT_REGISTERS};
use sprig_riscv::riscv::{self, FloatBinaryOp, IntBinaryOp, IntImmediateOp};
use sprig_riscv::riscv_snitch::{self, DmaOp, FrepKind, MAX_STAGGER_COUNT, MAX_STAGGER_MASK};
use sprig_riscv::types::{freg, reg, stream_type};
use sprig_riscv::{StreamDirection, registry, riscv_func};

type Name = Option<&'static str>;

/// One instruction. Operand indices wrap around the values in scope.
#[derive(Clone, Debug)]
enum Step {
    GetRegister(Name),
    GetFloatRegister(Name),
    Li(i32, Name),
    Mv(usize, Name),
    IntBinary(IntBinaryOp, usize, usize, Name),
    IntImmediate(IntImmediateOp, usize, i128, Name),
    FloatBinary(FloatBinaryOp, usize, usize, Name),
    FmvD(usize, Name),
    Scfgw(usize, usize),
    Scfgwi(usize, i128),
    Dma(DmaOp, usize, usize, i128, Name),
    Read,
    Write(usize),
    Frep(FrepKind, usize, i128, i128, Vec<Step>),
}

fn int_name() -> impl Strategy<Value = Name> {
    prop::option::of(prop::sample::select(INT_REGISTERS))
}

fn float_name() -> impl Strategy<Value = Name> {
    prop::option::of(prop::sample::select(FLOAT_REGISTERS))
}

fn instruction() -> impl Strategy<Value = Step> {
    let int_immediate = prop::sample::select(IntImmediateOp::ALL.to_vec()).prop_flat_map(|op| {
        let (lo, hi) = op.immediate_type().range();
        (Just(op), any::<usize>(), lo..=hi, int_name())
    });
    prop_oneof![
        int_name().prop_map(Step::GetRegister),
        float_name().prop_map(Step::GetFloatRegister),
        (any::<i32>(), int_name()).prop_map(|(value, name)| Step::Li(value, name)),
        (any::<usize>(), int_name()).prop_map(|(rs, name)| Step::Mv(rs, name)),
        (
            prop::sample::select(IntBinaryOp::ALL.to_vec()),
            any::<usize>(),
            any::<usize>(),
            int_name()
        )
            .prop_map(|(op, rs1, rs2, name)| Step::IntBinary(op, rs1, rs2, name)),
        int_immediate.prop_map(|(op, rs, imm, name)| Step::IntImmediate(op, rs, imm, name)),
        (
            prop::sample::select(FloatBinaryOp::ALL.to_vec()),
            any::<usize>(),
            any::<usize>(),
            float_name()
        )
            .prop_map(|(op, rs1, rs2, name)| Step::FloatBinary(op, rs1, rs2, name)),
        (any::<usize>(), float_name()).prop_map(|(rs, name)| Step::FmvD(rs, name)),
        (any::<usize>(), any::<usize>()).prop_map(|(rs1, rs2)| Step::Scfgw(rs1, rs2)),
        (any::<usize>(), -2048..=2047i128).prop_map(|(rs, imm)| Step::Scfgwi(rs, imm)),
        (
            prop::sample::select(DmaOp::ALL.to_vec()),
            any::<usize>(),
            any::<usize>(),
            0..=31i128,
            int_name()
        )
            .prop_map(|(op, rs1, rs2, imm, name)| Step::Dma(op, rs1, rs2, imm, name)),
        Just(Step::Read),
        any::<usize>().prop_map(Step::Write),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    let frep = (
        prop::sample::select(vec![FrepKind::Outer, FrepKind::Inner]),
        any::<usize>(),
        0..=MAX_STAGGER_MASK,
        0..=MAX_STAGGER_COUNT,
        prop::collection::vec(instruction(), 0..6),
    )
        .prop_map(|(kind, max_rep, mask, count, body)| Step::Frep(kind, max_rep, mask, count, body));
    prop_oneof![4 => instruction(), 1 => frep]
}

fn pick(values: &[ValueRef], index: usize) -> ValueRef {
    values[index % values.len()]
}

/// Values in scope while building.
struct Kernel {
    ints: Vec<ValueRef>,
    floats: Vec<ValueRef>,
    input: ValueRef,
    output: ValueRef,
    output_element: TypeRef,
}

impl Kernel {
    fn apply(&mut self, ctx: &mut IrContext, block: BlockRef, step: &Step) {
        match *step {
            Step::GetRegister(name) => {
                let ty = reg(&mut ctx.types, name);
                let op = riscv::get_register(ctx, block, ty);
                self.ints.push(ctx.op_result(op.op_ref(), 0));
            }
            Step::GetFloatRegister(name) => {
                let ty = freg(&mut ctx.types, name);
                let op = riscv::get_float_register(ctx, block, ty);
                self.floats.push(ctx.op_result(op.op_ref(), 0));
            }
            Step::Li(value, name) => {
                let ty = reg(&mut ctx.types, name);
                let li = riscv::li(ctx, block, value.into(), ty);
                self.ints.push(ctx.op_result(li.op_ref(), 0));
            }
            Step::Mv(rs, name) => {
                let ty = reg(&mut ctx.types, name);
                let mv = riscv::mv(ctx, block, pick(&self.ints, rs), ty);
                self.ints.push(ctx.op_result(mv.op_ref(), 0));
            }
            Step::IntBinary(op, rs1, rs2, name) => {
                let ty = reg(&mut ctx.types, name);
                let (rs1, rs2) = (pick(&self.ints, rs1), pick(&self.ints, rs2));
                self.ints.push(riscv::int_binary(ctx, block, op, rs1, rs2, ty));
            }
            Step::IntImmediate(op, rs, imm, name) => {
                let ty = reg(&mut ctx.types, name);
                let rs = pick(&self.ints, rs);
                self.ints.push(riscv::int_immediate(ctx, block, op, rs, imm, ty));
            }
            Step::FloatBinary(op, rs1, rs2, name) => {
                let ty = freg(&mut ctx.types, name);
                let (rs1, rs2) = (pick(&self.floats, rs1), pick(&self.floats, rs2));
                self.floats.push(riscv::float_binary(ctx, block, op, rs1, rs2, ty));
            }
            Step::FmvD(rs, name) => {
                let ty = freg(&mut ctx.types, name);
                let mv = riscv::fmv_d(ctx, block, pick(&self.floats, rs), ty);
                self.floats.push(ctx.op_result(mv.op_ref(), 0));
            }
            Step::Scfgw(rs1, rs2) => {
                let zero = reg(&mut ctx.types, Some("zero"));
                let (rs1, rs2) = (pick(&self.ints, rs1), pick(&self.ints, rs2));
                let op = riscv_snitch::scfgw(ctx, block, rs1, rs2, zero);
                self.ints.push(ctx.op_result(op.op_ref(), 0));
            }
            Step::Scfgwi(rs, imm) => {
                let zero = reg(&mut ctx.types, Some("zero"));
                let op = riscv_snitch::scfgwi(ctx, block, pick(&self.ints, rs), imm, zero);
                self.ints.push(ctx.op_result(op.op_ref(), 0));
            }
            Step::Dma(kind, rs1, rs2, imm, name) => {
                let ty = reg(&mut ctx.types, name);
                let operands = [pick(&self.ints, rs1), pick(&self.ints, rs2)];
                let op = riscv_snitch::dma(ctx, block, kind, &operands[..kind.operand_count()], imm, ty);
                if kind.has_result() {
                    self.ints.push(ctx.op_result(op, 0));
                }
            }
            Step::Read => {
                let value = riscv_snitch::read(ctx, block, self.input).expect("input is readable");
                self.floats.push(value);
            }
            Step::Write(rs) => {
                let mv = riscv::fmv_d(ctx, block, pick(&self.floats, rs), self.output_element);
                let value = ctx.op_result(mv.op_ref(), 0);
                riscv_snitch::write(ctx, block, value, self.output);
            }
            Step::Frep(kind, max_rep, mask, count, ref body) => {
                let scope = (self.ints.len(), self.floats.len());
                let max_rep = pick(&self.ints, max_rep);
                let (_, inner) = riscv_snitch::frep(ctx, block, kind, max_rep, mask, count);
                for step in body {
                    self.apply(ctx, inner, step);
                }
                riscv_snitch::frep_yield(ctx, inner);
                self.ints.truncate(scope.0);
                self.floats.truncate(scope.1);
            }
        }
    }
}

fn build(steps: &[Step]) -> Module {
    let mut module = Module::empty();
    let top = module.body().expect("empty module has a body");
    let ctx = module.ctx_mut();
    let a0 = reg(&mut ctx.types, Some("a0"));
    let fa0 = freg(&mut ctx.types, Some("fa0"));
    let ft0 = freg(&mut ctx.types, Some("ft0"));
    let ft1 = freg(&mut ctx.types, Some("ft1"));
    let readable = stream_type(&mut ctx.types, StreamDirection::Readable, ft0);
    let writable = stream_type(&mut ctx.types, StreamDirection::Writable, ft1);

    let (_, entry) = riscv_func::func(ctx, top, "kernel", &[a0, fa0], &[a0]);
    let &[n, alpha] = ctx.block_args(entry) else {
        unreachable!("two entry arguments");
    };
    let input = riscv_snitch::get_stream(ctx, entry, readable);
    let output = riscv_snitch::get_stream(ctx, entry, writable);
    let mut kernel = Kernel {
        ints: vec![n],
        floats: vec![alpha],
        input: ctx.op_result(input.op_ref(), 0),
        output: ctx.op_result(output.op_ref(), 0),
        output_element: ft1,
    };
    for step in steps {
        kernel.apply(ctx, entry, step);
    }
    riscv_func::ret(ctx, entry, &[n]);
    module
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn built_kernels_round_trip(steps in prop::collection::vec(step(), 0..24)) {
        let registry = registry().unwrap();
        let module = build(&steps);
        if let Err(errors) = verify_module(&registry, &module, VerifyMode::Accumulate) {
            return Err(TestCaseError::fail(format!("{errors:?}")));
        }

        let custom = print_module(&registry, &module, Syntax::Custom);
        let generic = print_module(&registry, &module, Syntax::Generic);
        for text in [&custom, &generic] {
            let reparsed = parse_module(&registry, text)
                .map_err(|e| TestCaseError::fail(format!("{e}\n{text}")))?;
            if let Some(diff) = module.structural_diff(&reparsed) {
                return Err(TestCaseError::fail(format!("{diff}\n{text}")));
            }
            prop_assert_eq!(&print_module(&registry, &reparsed, Syntax::Custom), &custom);
            prop_assert_eq!(&print_module(&registry, &reparsed, Syntax::Generic), &generic);
        }
    }

    #[test]
    fn frep_yield_only_prints_generically(
        kind in prop::sample::select(vec![FrepKind::Outer, FrepKind::Inner]),
        body in prop::collection::vec(instruction(), 0..4),
    ) {
        let registry = registry().unwrap();
        let module = build(&[Step::Frep(kind, 0, 0, 0, body)]);
        let custom = print_module(&registry, &module, Syntax::Custom);
        let generic = print_module(&registry, &module, Syntax::Generic);
        prop_assert!(!custom.contains("frep_yield"), "{}", custom);
        prop_assert_eq!(generic.matches(r#""riscv_snitch.frep_yield"() : () -> ()"#).count(), 1);
    }
}
