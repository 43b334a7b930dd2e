//! The `riscv_snitch` dialect: Snitch core extensions.
//!
//! ```text
//! %c = riscv_snitch.scfgwi %0, 42 : (!riscv.reg<>) -> !riscv.reg<zero>
//! riscv_snitch.frep_outer %n stagger(3, 1) {
//!   %x = riscv_snitch.read from %in : !riscv.freg<ft0>
//!   riscv_snitch.write %x to %out : !riscv.freg<ft1>
//! }
//! ```
//!
//! `frep` bodies end in `riscv_snitch.frep_yield`, which the custom form
//! leaves implicit. The stagger clause is omitted when both values are 0.

use std::fmt::{self, Write};
use std::ops::ControlFlow;

use sprig_ir::attribute::Attribute;
use sprig_ir::context::{BlockData, RegionData};
use sprig_ir::lexer::TokenKind;
use sprig_ir::parser::{OperationState, Parser};
use sprig_ir::printer::{Printer, RegionOptions};
use sprig_ir::schema::{ArgDef, AttrConstraint, AttrDef, OpSchema, RegionDef, TypeConstraint};
use sprig_ir::types::IntegerType;
use sprig_ir::walk::walk_typed;
use sprig_ir::{BlockRef, DialectDefinition, DialectOp, IrContext, IrResult, OpDefinition, OpRef, RegionRef, Span, Symbol, TypeRef, ValueRef};

use crate::riscv::{SI12, UI5};
use crate::syntax::{IMMEDIATE, parse_asm, print_asm};
use crate::types::{READABLE, REG, SNITCH_TYPES, StreamDirection, WRITABLE, stream_element, stream_type};
use crate::{append, builder, dialect_ops};

pub const DIALECT: DialectDefinition = DialectDefinition::new("riscv_snitch", OPS, &[]);

/// Stream register types live in their own dialect.
pub const SNITCH_DIALECT: DialectDefinition = DialectDefinition::new("snitch", &[], SNITCH_TYPES);

pub const FREP_YIELD: &str = "riscv_snitch.frep_yield";
pub const STAGGER_MASK: &str = "stagger_mask";
pub const STAGGER_COUNT: &str = "stagger_count";

/// Largest stagger mask: one bit per operand slot.
pub const MAX_STAGGER_MASK: i128 = 15;
pub const MAX_STAGGER_COUNT: i128 = 7;

const RD: &[ArgDef] = &[ArgDef::new("rd", REG)];
const RS: &[ArgDef] = &[ArgDef::new("rs", REG)];
const RS1_RS2: &[ArgDef] = &[ArgDef::new("rs1", REG), ArgDef::new("rs2", REG)];
const IMM_SI12: &[AttrDef] = &[AttrDef::required(IMMEDIATE, AttrConstraint::Integer(SI12))];
const IMM_UI5: &[AttrDef] = &[AttrDef::required(IMMEDIATE, AttrConstraint::Integer(UI5))];

const STREAM: TypeConstraint = TypeConstraint::Predicate {
    description: "!snitch.readable or !snitch.writable",
    check: is_stream,
};

fn is_stream(ctx: &IrContext, ty: TypeRef) -> bool {
    stream_element(ctx, ty, StreamDirection::Readable).is_some()
        || stream_element(ctx, ty, StreamDirection::Writable).is_some()
}

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

const FREP_SCHEMA: OpSchema = OpSchema {
    operands: &[ArgDef::new("max_rep", REG)],
    attributes: &[
        AttrDef::required(STAGGER_MASK, AttrConstraint::BuiltinInt { max: MAX_STAGGER_MASK }),
        AttrDef::required(STAGGER_COUNT, AttrConstraint::BuiltinInt { max: MAX_STAGGER_COUNT }),
    ],
    regions: &[RegionDef::new("body")
        .single_block()
        .terminated_by(&[FREP_YIELD])],
    implicit_terminator: Some(FREP_YIELD),
    ..OpSchema::EMPTY
};

const OPS: &[OpDefinition] = &[
    asm("riscv_snitch.scfgw", RS1_RS2, RD, &[]),
    asm("riscv_snitch.scfgwi", RS, RD, IMM_SI12),
    OpDefinition::new("riscv_snitch.frep_outer", FREP_SCHEMA)
        .with_syntax(parse_frep, print_frep)
        .with_verifier(verify_frep),
    OpDefinition::new("riscv_snitch.frep_inner", FREP_SCHEMA)
        .with_syntax(parse_frep, print_frep)
        .with_verifier(verify_frep),
    OpDefinition::new(
        FREP_YIELD,
        OpSchema {
            is_terminator: true,
            ..OpSchema::EMPTY
        },
    ),
    asm("riscv_snitch.get_stream", &[], &[ArgDef::new("stream", STREAM)], &[]),
    OpDefinition::new(
        "riscv_snitch.read",
        OpSchema {
            operands: &[ArgDef::new("stream", READABLE)],
            results: &[ArgDef::new("value", TypeConstraint::Any)],
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_read, print_read)
    .with_verifier(verify_read),
    OpDefinition::new(
        "riscv_snitch.write",
        OpSchema {
            operands: &[
                ArgDef::new("value", TypeConstraint::Any),
                ArgDef::new("stream", WRITABLE),
            ],
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_write, print_write)
    .with_verifier(verify_write),
    asm("riscv_snitch.dmsrc", RS1_RS2, &[], &[]),
    asm("riscv_snitch.dmdst", RS1_RS2, &[], &[]),
    asm("riscv_snitch.dmstr", RS1_RS2, &[], &[]),
    asm("riscv_snitch.dmrep", RS, &[], &[]),
    asm("riscv_snitch.dmcpy", RS1_RS2, RD, &[]),
    asm("riscv_snitch.dmcpyi", RS, RD, IMM_UI5),
    asm("riscv_snitch.dmstat", RS, RD, &[]),
    asm("riscv_snitch.dmstati", &[], RD, IMM_UI5),
];

dialect_ops! {
    /// Write a stream configuration register selected by a register.
    Scfgw = "riscv_snitch.scfgw";
    /// Write a stream configuration register selected by an immediate.
    Scfgwi = "riscv_snitch.scfgwi";
    /// Hardware loop repeating its whole body `max_rep + 1` times.
    FrepOuter = "riscv_snitch.frep_outer";
    /// Hardware loop repeating each instruction of its body in turn.
    FrepInner = "riscv_snitch.frep_inner";
    FrepYield = "riscv_snitch.frep_yield";
    GetStream = "riscv_snitch.get_stream";
    StreamRead = "riscv_snitch.read";
    StreamWrite = "riscv_snitch.write";
}

/// Which flavor of `frep` loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrepKind {
    Outer,
    Inner,
}

impl FrepKind {
    pub fn mnemonic(self) -> &'static str {
        match self {
            FrepKind::Outer => FrepOuter::NAME,
            FrepKind::Inner => FrepInner::NAME,
        }
    }
}

/// Snitch DMA instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DmaOp {
    Src,
    Dst,
    Str,
    Rep,
    Cpy,
    Cpyi,
    Stat,
    Stati,
}

impl DmaOp {
    pub const ALL: [DmaOp; 8] = [
        DmaOp::Src,
        DmaOp::Dst,
        DmaOp::Str,
        DmaOp::Rep,
        DmaOp::Cpy,
        DmaOp::Cpyi,
        DmaOp::Stat,
        DmaOp::Stati,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            DmaOp::Src => "riscv_snitch.dmsrc",
            DmaOp::Dst => "riscv_snitch.dmdst",
            DmaOp::Str => "riscv_snitch.dmstr",
            DmaOp::Rep => "riscv_snitch.dmrep",
            DmaOp::Cpy => "riscv_snitch.dmcpy",
            DmaOp::Cpyi => "riscv_snitch.dmcpyi",
            DmaOp::Stat => "riscv_snitch.dmstat",
            DmaOp::Stati => "riscv_snitch.dmstati",
        }
    }

    /// Number of register operands.
    pub fn operand_count(self) -> usize {
        match self {
            DmaOp::Src | DmaOp::Dst | DmaOp::Str | DmaOp::Cpy => 2,
            DmaOp::Rep | DmaOp::Cpyi | DmaOp::Stat => 1,
            DmaOp::Stati => 0,
        }
    }

    pub fn has_result(self) -> bool {
        matches!(self, DmaOp::Cpy | DmaOp::Cpyi | DmaOp::Stat | DmaOp::Stati)
    }

    pub fn immediate_type(self) -> Option<IntegerType> {
        matches!(self, DmaOp::Cpyi | DmaOp::Stati).then_some(UI5)
    }
}

// ============================================================================
// Wrappers
// ============================================================================

fn builtin_int_attr(ctx: &IrContext, op: OpRef, key: &'static str) -> i128 {
    ctx.op(op)
        .attributes
        .get(&Symbol::new(key))
        .and_then(Attribute::as_builtin_int)
        .unwrap_or(0)
}

macro_rules! frep_accessors {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                pub fn max_rep(self, ctx: &IrContext) -> Option<ValueRef> {
                    ctx.op_operands(self.0).first().copied()
                }

                pub fn stagger_mask(self, ctx: &IrContext) -> i128 {
                    builtin_int_attr(ctx, self.0, STAGGER_MASK)
                }

                pub fn stagger_count(self, ctx: &IrContext) -> i128 {
                    builtin_int_attr(ctx, self.0, STAGGER_COUNT)
                }

                pub fn body(self, ctx: &IrContext) -> Option<RegionRef> {
                    ctx.op(self.0).regions.first().copied()
                }
            }
        )*
    };
}

frep_accessors!(FrepOuter, FrepInner);

// ============================================================================
// Builders
// ============================================================================

pub fn scfgw(ctx: &mut IrContext, block: BlockRef, rs1: ValueRef, rs2: ValueRef, ty: TypeRef) -> Scfgw {
    Scfgw(append(
        ctx,
        block,
        builder("riscv_snitch.scfgw").operand(rs1).operand(rs2).result(ty),
    ))
}

pub fn scfgwi(ctx: &mut IrContext, block: BlockRef, rs: ValueRef, immediate: i128, ty: TypeRef) -> Scfgwi {
    let immediate = Attribute::int(&mut ctx.types, immediate, SI12);
    Scfgwi(append(
        ctx,
        block,
        builder("riscv_snitch.scfgwi")
            .operand(rs)
            .attr(IMMEDIATE, immediate)
            .result(ty),
    ))
}

/// Append an `frep` loop with an empty body. The caller fills the body and
/// ends it with [`frep_yield`].
pub fn frep(
    ctx: &mut IrContext,
    block: BlockRef,
    kind: FrepKind,
    max_rep: ValueRef,
    stagger_mask: i128,
    stagger_count: i128,
) -> (OpRef, BlockRef) {
    let body = ctx.create_block(BlockData::new(Span::default(), vec![]));
    let region = ctx.create_region(RegionData::new(Span::default(), [body]));
    let mask = Attribute::builtin_int(&mut ctx.types, stagger_mask);
    let count = Attribute::builtin_int(&mut ctx.types, stagger_count);
    let op = append(
        ctx,
        block,
        builder(kind.mnemonic())
            .operand(max_rep)
            .attr(STAGGER_MASK, mask)
            .attr(STAGGER_COUNT, count)
            .region(region),
    );
    (op, body)
}

pub fn frep_yield(ctx: &mut IrContext, block: BlockRef) -> FrepYield {
    FrepYield(append(ctx, block, builder(FREP_YIELD)))
}

pub fn get_stream(ctx: &mut IrContext, block: BlockRef, ty: TypeRef) -> GetStream {
    GetStream(append(ctx, block, builder("riscv_snitch.get_stream").result(ty)))
}

/// Returns `None` when `stream` is not a readable stream.
pub fn read(ctx: &mut IrContext, block: BlockRef, stream: ValueRef) -> Option<ValueRef> {
    let element = stream_element(ctx, ctx.value_ty(stream), StreamDirection::Readable)?;
    let op = append(
        ctx,
        block,
        builder("riscv_snitch.read").operand(stream).result(element),
    );
    Some(ctx.op_result(op, 0))
}

pub fn write(ctx: &mut IrContext, block: BlockRef, value: ValueRef, stream: ValueRef) -> StreamWrite {
    StreamWrite(append(
        ctx,
        block,
        builder("riscv_snitch.write").operand(value).operand(stream),
    ))
}

/// Append a DMA instruction. `immediate` and `result` are used only by
/// the instructions that take them.
pub fn dma(
    ctx: &mut IrContext,
    block: BlockRef,
    kind: DmaOp,
    operands: &[ValueRef],
    immediate: i128,
    result: TypeRef,
) -> OpRef {
    let mut op = builder(kind.mnemonic()).operands(operands.iter().copied());
    if let Some(int) = kind.immediate_type() {
        op = op.attr(IMMEDIATE, Attribute::int(&mut ctx.types, immediate, int));
    }
    if kind.has_result() {
        op = op.result(result);
    }
    append(ctx, block, op)
}

// ============================================================================
// Syntax and verification
// ============================================================================

fn parse_frep(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let operand = p.parse_operand()?;
    let max_rep = p.resolve_operand_untyped(&operand)?;
    state.operands.push(max_rep);

    let (mut mask, mut count) = (0, 0);
    if p.consume_keyword("stagger")? {
        p.expect(TokenKind::LParen)?;
        mask = p.parse_integer()?.0;
        p.expect(TokenKind::Comma)?;
        count = p.parse_integer()?.0;
        p.expect(TokenKind::RParen)?;
    }
    let types = &mut p.ctx().types;
    let mask = Attribute::builtin_int(types, mask);
    let count = Attribute::builtin_int(types, count);
    state.add_attribute(STAGGER_MASK, mask);
    state.add_attribute(STAGGER_COUNT, count);

    if p.consume_keyword("attributes")? {
        p.parse_attr_dict(&mut state.attributes)?;
    }
    let body = p.parse_single_block_region(&[])?;
    state.regions.push(body);
    Ok(())
}

fn print_frep(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    printer.write_char(' ')?;
    printer.print_values(ctx.op_operands(op))?;

    let mask = builtin_int_attr(ctx, op, STAGGER_MASK);
    let count = builtin_int_attr(ctx, op, STAGGER_COUNT);
    if mask != 0 || count != 0 {
        write!(printer, " stagger({mask}, {count})")?;
    }
    let attrs = &ctx.op(op).attributes;
    let elided = [STAGGER_MASK, STAGGER_COUNT];
    if attrs.keys().any(|key| key.with_str(|k| !elided.contains(&k))) {
        printer.write_str(" attributes")?;
        printer.print_attr_dict(attrs, &elided)?;
    }
    for &region in &ctx.op(op).regions {
        printer.write_char(' ')?;
        printer.print_region(
            region,
            RegionOptions {
                print_entry_block_args: false,
                elide_terminator: Some(FREP_YIELD),
            },
        )?;
    }
    Ok(())
}

fn contains<T: DialectOp>(ctx: &IrContext, region: RegionRef) -> bool {
    walk_typed::<T, ()>(ctx, region, &mut |_| ControlFlow::Break(())).is_break()
}

fn verify_frep(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    for &region in &ctx.op(op).regions {
        let args = ctx
            .region(region)
            .blocks
            .iter()
            .any(|&b| !ctx.block_args(b).is_empty());
        if args {
            return Err("body cannot have block arguments".to_string());
        }
        if contains::<FrepOuter>(ctx, region) || contains::<FrepInner>(ctx, region) {
            return Err("frep loops cannot be nested".to_string());
        }
    }
    Ok(())
}

fn parse_read(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    p.expect_keyword("from")?;
    let stream = p.parse_operand()?;
    p.parse_optional_attr_dict(&mut state.attributes)?;
    p.expect(TokenKind::Colon)?;
    let element = p.parse_type()?;
    let stream_ty = stream_type(&mut p.ctx().types, StreamDirection::Readable, element);
    let stream = p.resolve_operand(&stream, stream_ty)?;
    state.operands.push(stream);
    state.result_types.push(element);
    Ok(())
}

fn print_read(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    printer.write_str(" from ")?;
    printer.print_values(ctx.op_operands(op))?;
    printer.print_attr_dict(&ctx.op(op).attributes, &[])?;
    printer.write_str(" : ")?;
    printer.print_types(ctx.op_result_types(op))
}

fn verify_read(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    let &[stream] = ctx.op_operands(op) else {
        return Ok(());
    };
    match stream_element(ctx, ctx.value_ty(stream), StreamDirection::Readable) {
        Some(element) if ctx.op_result_types(op) == [element] => Ok(()),
        _ => Err("result type must be the element type of the stream".to_string()),
    }
}

fn parse_write(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let value = p.parse_operand()?;
    p.expect_keyword("to")?;
    let stream = p.parse_operand()?;
    p.parse_optional_attr_dict(&mut state.attributes)?;
    p.expect(TokenKind::Colon)?;
    let element = p.parse_type()?;
    let stream_ty = stream_type(&mut p.ctx().types, StreamDirection::Writable, element);
    let value = p.resolve_operand(&value, element)?;
    let stream = p.resolve_operand(&stream, stream_ty)?;
    state.operands.extend([value, stream]);
    Ok(())
}

fn print_write(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    let &[value, stream] = ctx.op_operands(op) else {
        return Err(fmt::Error);
    };
    printer.write_char(' ')?;
    printer.print_value(value)?;
    printer.write_str(" to ")?;
    printer.print_value(stream)?;
    printer.print_attr_dict(&ctx.op(op).attributes, &[])?;
    printer.write_str(" : ")?;
    printer.print_type(ctx.value_ty(value))
}

fn verify_write(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    let &[value, stream] = ctx.op_operands(op) else {
        return Ok(());
    };
    match stream_element(ctx, ctx.value_ty(stream), StreamDirection::Writable) {
        Some(element) if ctx.value_ty(value) == element => Ok(()),
        _ => Err("value type must be the element type of the stream".to_string()),
    }
}
