//! The `riscv` dialect: base instructions over register-typed values.
//!
//! Operands and results are `!riscv.reg` (integer) or `!riscv.freg`
//! (floating-point) values; a register type either names the register it
//! is fixed to or is left for allocation (`!riscv.reg<>`).

use sprig_ir::attribute::Attribute;
use sprig_ir::schema::{ArgDef, AttrConstraint, AttrDef, OpSchema};
use sprig_ir::types::IntegerType;
use sprig_ir::{BlockRef, DialectDefinition, IrContext, OpDefinition, TypeRef, ValueRef};

use crate::syntax::{IMMEDIATE, parse_asm, print_asm};
use crate::types::{FREG, REG, RISCV_TYPES};
use crate::{append, builder, dialect_ops};

pub const DIALECT: DialectDefinition = DialectDefinition::new("riscv", OPS, RISCV_TYPES);

pub const SI12: IntegerType = IntegerType::signed(12);
pub const UI5: IntegerType = IntegerType::unsigned(5);
pub const I32: IntegerType = IntegerType::signless(32);

const RD: &[ArgDef] = &[ArgDef::new("rd", REG)];
const RS: &[ArgDef] = &[ArgDef::new("rs", REG)];
const RS1_RS2: &[ArgDef] = &[ArgDef::new("rs1", REG), ArgDef::new("rs2", REG)];
const FRD: &[ArgDef] = &[ArgDef::new("rd", FREG)];
const FRS: &[ArgDef] = &[ArgDef::new("rs", FREG)];
const FRS1_FRS2: &[ArgDef] = &[ArgDef::new("rs1", FREG), ArgDef::new("rs2", FREG)];

const IMM_SI12: &[AttrDef] = &[AttrDef::required(IMMEDIATE, AttrConstraint::Integer(SI12))];
const IMM_UI5: &[AttrDef] = &[AttrDef::required(IMMEDIATE, AttrConstraint::Integer(UI5))];
const IMM_I32: &[AttrDef] = &[AttrDef::required(IMMEDIATE, AttrConstraint::Integer(I32))];

const fn asm(
    name: &'static str,
    operands: &'static [ArgDef],
    results: &'static [ArgDef],
    attributes: &'static [AttrDef],
) -> OpDefinition {
    OpDefinition::new(
        name,
        OpSchema {
            operands,
            results,
            attributes,
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_asm, print_asm)
}

const OPS: &[OpDefinition] = &[
    asm("riscv.get_register", &[], RD, &[]),
    asm("riscv.get_float_register", &[], FRD, &[]),
    asm("riscv.li", &[], RD, IMM_I32),
    asm("riscv.mv", RS, RD, &[]),
    asm("riscv.add", RS1_RS2, RD, &[]),
    asm("riscv.sub", RS1_RS2, RD, &[]),
    asm("riscv.mul", RS1_RS2, RD, &[]),
    asm("riscv.and", RS1_RS2, RD, &[]),
    asm("riscv.or", RS1_RS2, RD, &[]),
    asm("riscv.xor", RS1_RS2, RD, &[]),
    asm("riscv.addi", RS, RD, IMM_SI12),
    asm("riscv.andi", RS, RD, IMM_SI12),
    asm("riscv.slli", RS, RD, IMM_UI5),
    asm("riscv.fmv.d", FRS, FRD, &[]),
    asm("riscv.fadd.d", FRS1_FRS2, FRD, &[]),
    asm("riscv.fsub.d", FRS1_FRS2, FRD, &[]),
    asm("riscv.fmul.d", FRS1_FRS2, FRD, &[]),
];

dialect_ops! {
    GetRegister = "riscv.get_register";
    GetFloatRegister = "riscv.get_float_register";
    Li = "riscv.li";
    Mv = "riscv.mv";
    FmvD = "riscv.fmv.d";
}

/// Register-register integer instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntBinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

impl IntBinaryOp {
    pub const ALL: [IntBinaryOp; 6] = [
        IntBinaryOp::Add,
        IntBinaryOp::Sub,
        IntBinaryOp::Mul,
        IntBinaryOp::And,
        IntBinaryOp::Or,
        IntBinaryOp::Xor,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            IntBinaryOp::Add => "riscv.add",
            IntBinaryOp::Sub => "riscv.sub",
            IntBinaryOp::Mul => "riscv.mul",
            IntBinaryOp::And => "riscv.and",
            IntBinaryOp::Or => "riscv.or",
            IntBinaryOp::Xor => "riscv.xor",
        }
    }
}

/// Register-immediate integer instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntImmediateOp {
    Addi,
    Andi,
    Slli,
}

impl IntImmediateOp {
    pub const ALL: [IntImmediateOp; 3] = [IntImmediateOp::Addi, IntImmediateOp::Andi, IntImmediateOp::Slli];

    pub fn mnemonic(self) -> &'static str {
        match self {
            IntImmediateOp::Addi => "riscv.addi",
            IntImmediateOp::Andi => "riscv.andi",
            IntImmediateOp::Slli => "riscv.slli",
        }
    }

    pub fn immediate_type(self) -> IntegerType {
        match self {
            IntImmediateOp::Addi | IntImmediateOp::Andi => SI12,
            IntImmediateOp::Slli => UI5,
        }
    }
}

/// Double-precision register-register instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatBinaryOp {
    FaddD,
    FsubD,
    FmulD,
}

impl FloatBinaryOp {
    pub const ALL: [FloatBinaryOp; 3] = [FloatBinaryOp::FaddD, FloatBinaryOp::FsubD, FloatBinaryOp::FmulD];

    pub fn mnemonic(self) -> &'static str {
        match self {
            FloatBinaryOp::FaddD => "riscv.fadd.d",
            FloatBinaryOp::FsubD => "riscv.fsub.d",
            FloatBinaryOp::FmulD => "riscv.fmul.d",
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn get_register(ctx: &mut IrContext, block: BlockRef, ty: TypeRef) -> GetRegister {
    GetRegister(append(ctx, block, builder("riscv.get_register").result(ty)))
}

pub fn get_float_register(ctx: &mut IrContext, block: BlockRef, ty: TypeRef) -> GetFloatRegister {
    GetFloatRegister(append(ctx, block, builder("riscv.get_float_register").result(ty)))
}

pub fn li(ctx: &mut IrContext, block: BlockRef, value: i128, ty: TypeRef) -> Li {
    let immediate = Attribute::int(&mut ctx.types, value, I32);
    Li(append(
        ctx,
        block,
        builder("riscv.li").attr(IMMEDIATE, immediate).result(ty),
    ))
}

pub fn mv(ctx: &mut IrContext, block: BlockRef, rs: ValueRef, ty: TypeRef) -> Mv {
    Mv(append(ctx, block, builder("riscv.mv").operand(rs).result(ty)))
}

pub fn fmv_d(ctx: &mut IrContext, block: BlockRef, rs: ValueRef, ty: TypeRef) -> FmvD {
    FmvD(append(ctx, block, builder("riscv.fmv.d").operand(rs).result(ty)))
}

/// Returns the created op's result.
pub fn int_binary(
    ctx: &mut IrContext,
    block: BlockRef,
    kind: IntBinaryOp,
    rs1: ValueRef,
    rs2: ValueRef,
    ty: TypeRef,
) -> ValueRef {
    let op = append(
        ctx,
        block,
        builder(kind.mnemonic()).operand(rs1).operand(rs2).result(ty),
    );
    ctx.op_result(op, 0)
}

pub fn int_immediate(
    ctx: &mut IrContext,
    block: BlockRef,
    kind: IntImmediateOp,
    rs: ValueRef,
    value: i128,
    ty: TypeRef,
) -> ValueRef {
    let immediate = Attribute::int(&mut ctx.types, value, kind.immediate_type());
    let op = append(
        ctx,
        block,
        builder(kind.mnemonic())
            .operand(rs)
            .attr(IMMEDIATE, immediate)
            .result(ty),
    );
    ctx.op_result(op, 0)
}

pub fn float_binary(
    ctx: &mut IrContext,
    block: BlockRef,
    kind: FloatBinaryOp,
    rs1: ValueRef,
    rs2: ValueRef,
    ty: TypeRef,
) -> ValueRef {
    let op = append(
        ctx,
        block,
        builder(kind.mnemonic()).operand(rs1).operand(rs2).result(ty),
    );
    ctx.op_result(op, 0)
}
