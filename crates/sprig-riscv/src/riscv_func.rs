//! The `riscv_func` dialect: functions over RISC-V registers.
//!
//! ```text
//! riscv_func.func @scale(%x : !riscv.reg<a0>) -> !riscv.reg<a0> {
//!   %0 = riscv.slli %x, 2 : (!riscv.reg<a0>) -> !riscv.reg<a0>
//!   riscv_func.return %0 : !riscv.reg<a0>
//! }
//! ```
//!
//! The signature declares the entry block arguments, so the entry label is
//! never spelled in the custom form. Returns are explicit.

use std::fmt::{self, Write};

use sprig_ir::attribute::Attribute;
use sprig_ir::context::{BlockArgData, BlockData, RegionData};
use sprig_ir::lexer::TokenKind;
use sprig_ir::parser::{OperationState, Parser};
use sprig_ir::printer::{Printer, RegionOptions};
use sprig_ir::schema::{ArgDef, AttrConstraint, AttrDef, OpSchema, RegionDef};
use sprig_ir::types::FunctionType;
use sprig_ir::{BlockRef, DialectDefinition, DialectOp, IrContext, IrResult, OpDefinition, OpRef, RegionRef, Span, Symbol, TypeRef, ValueRef};

use crate::types::ANY_REGISTER;
use crate::{append, builder, dialect_ops};

pub const DIALECT: DialectDefinition = DialectDefinition::new("riscv_func", OPS, &[]);

pub const SYM_NAME: &str = "sym_name";
pub const FUNCTION_TYPE: &str = "function_type";

const OPS: &[OpDefinition] = &[
    OpDefinition::new(
        "riscv_func.func",
        OpSchema {
            attributes: &[
                AttrDef::required(SYM_NAME, AttrConstraint::String),
                AttrDef::required(FUNCTION_TYPE, AttrConstraint::FunctionType),
            ],
            regions: &[RegionDef::new("body").terminated_by(&["riscv_func.return"])],
            isolated_from_above: true,
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_func, print_func)
    .with_verifier(verify_func),
    OpDefinition::new(
        "riscv_func.return",
        OpSchema {
            operands: &[ArgDef::variadic("values", ANY_REGISTER)],
            is_terminator: true,
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_return, print_return)
    .with_verifier(verify_return),
];

dialect_ops! {
    Func = "riscv_func.func";
    Return = "riscv_func.return";
}

impl Func {
    pub fn sym_name(self, ctx: &IrContext) -> Option<&str> {
        ctx.op(self.0)
            .attributes
            .get(&Symbol::new(SYM_NAME))
            .and_then(Attribute::as_str)
    }

    pub fn function_type(self, ctx: &IrContext) -> Option<FunctionType> {
        let attr = ctx.op(self.0).attributes.get(&Symbol::new(FUNCTION_TYPE))?;
        FunctionType::from_type(&ctx.types, attr.as_type()?)
    }

    pub fn body(self, ctx: &IrContext) -> Option<RegionRef> {
        ctx.op(self.0).regions.first().copied()
    }

    pub fn entry_block(self, ctx: &IrContext) -> Option<BlockRef> {
        ctx.region(self.body(ctx)?).blocks.first().copied()
    }
}

/// Append a function with an empty entry block to `block`. Returns the
/// function and its entry block.
pub fn func(
    ctx: &mut IrContext,
    block: BlockRef,
    name: &str,
    inputs: &[TypeRef],
    outputs: &[TypeRef],
) -> (Func, BlockRef) {
    let signature = FunctionType::new(inputs.to_vec(), outputs.to_vec()).intern(&mut ctx.types);
    let args = inputs.iter().map(|&ty| BlockArgData::new(ty)).collect();
    let entry = ctx.create_block(BlockData::new(Span::default(), args));
    let body = ctx.create_region(RegionData::new(Span::default(), [entry]));
    let op = append(
        ctx,
        block,
        builder("riscv_func.func")
            .attr(SYM_NAME, Attribute::String(name.to_string()))
            .attr(FUNCTION_TYPE, Attribute::Type(signature))
            .region(body),
    );
    (Func(op), entry)
}

pub fn ret(ctx: &mut IrContext, block: BlockRef, values: &[ValueRef]) -> Return {
    Return(append(
        ctx,
        block,
        builder("riscv_func.return").operands(values.iter().copied()),
    ))
}

fn parse_func(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let name = p.parse_symbol_name()?;
    let args = p.parse_argument_list()?;
    let outputs = if p.consume_if(TokenKind::Arrow)? {
        if p.at(TokenKind::LParen) {
            p.parse_paren_type_list()?
        } else {
            vec![p.parse_type()?]
        }
    } else {
        Vec::new()
    };
    let inputs = args.iter().map(|arg| arg.ty).collect();
    let signature = FunctionType::new(inputs, outputs).intern(&mut p.ctx().types);
    state.add_attribute(SYM_NAME, Attribute::String(name));
    state.add_attribute(FUNCTION_TYPE, Attribute::Type(signature));
    if p.consume_keyword("attributes")? {
        p.parse_attr_dict(&mut state.attributes)?;
    }
    let body = p.parse_region(&args)?;
    state.regions.push(body);
    Ok(())
}

fn print_func(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    let func = Func(op);
    let (Some(name), Some(signature), Some(body)) =
        (func.sym_name(ctx), func.function_type(ctx), func.body(ctx))
    else {
        return Err(fmt::Error);
    };

    printer.write_char(' ')?;
    printer.print_symbol_name(name)?;
    printer.write_char('(')?;
    if let Some(entry) = func.entry_block(ctx) {
        printer.print_typed_values(ctx.block_args(entry))?;
    }
    printer.write_char(')')?;
    match signature.outputs.as_slice() {
        [] => {}
        [single] if FunctionType::from_type(&ctx.types, *single).is_none() => {
            printer.write_str(" -> ")?;
            printer.print_type(*single)?;
        }
        outputs => {
            printer.write_str(" -> (")?;
            printer.print_types(outputs)?;
            printer.write_char(')')?;
        }
    }

    let attrs = &ctx.op(op).attributes;
    let elided = [SYM_NAME, FUNCTION_TYPE];
    if attrs.keys().any(|key| key.with_str(|k| !elided.contains(&k))) {
        printer.write_str(" attributes")?;
        printer.print_attr_dict(attrs, &elided)?;
    }
    printer.write_char(' ')?;
    printer.print_region(
        body,
        RegionOptions {
            print_entry_block_args: false,
            elide_terminator: None,
        },
    )
}

fn verify_func(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    let func = Func(op);
    let signature = func
        .function_type(ctx)
        .ok_or_else(|| "missing function type".to_string())?;
    let Some(entry) = func.entry_block(ctx) else {
        return if signature.inputs.is_empty() {
            Ok(())
        } else {
            Err("a function with arguments needs an entry block".to_string())
        };
    };
    let arg_types: Vec<TypeRef> = ctx.block_args(entry).iter().map(|&v| ctx.value_ty(v)).collect();
    if arg_types != signature.inputs {
        return Err(format!(
            "entry block has {} argument(s) that do not match the {} input(s) of the signature",
            arg_types.len(),
            signature.inputs.len()
        ));
    }
    Ok(())
}

fn parse_return(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let operands = p.parse_operand_list()?;
    p.parse_optional_attr_dict(&mut state.attributes)?;
    if operands.is_empty() {
        return Ok(());
    }
    p.expect(TokenKind::Colon)?;
    let start = p.peek().span.start;
    let types = p.parse_type_list()?;
    let span = p.span_from(start);
    state.operands = p.resolve_operands(&operands, &types, span)?;
    Ok(())
}

fn print_return(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    let operands = ctx.op_operands(op);
    if !operands.is_empty() {
        printer.write_char(' ')?;
        printer.print_values(operands)?;
    }
    printer.print_attr_dict(&ctx.op(op).attributes, &[])?;
    if !operands.is_empty() {
        printer.write_str(" : ")?;
        let types: Vec<TypeRef> = operands.iter().map(|&v| ctx.value_ty(v)).collect();
        printer.print_types(&types)?;
    }
    Ok(())
}

fn verify_return(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    let func = ctx
        .parent_op(op)
        .and_then(|parent| Func::from_op(ctx, parent))
        .ok_or_else(|| "must be nested directly in 'riscv_func.func'".to_string())?;
    let Some(signature) = func.function_type(ctx) else {
        return Ok(());
    };
    let types: Vec<TypeRef> = ctx.op_operands(op).iter().map(|&v| ctx.value_ty(v)).collect();
    if types != signature.outputs {
        return Err(format!(
            "operand types do not match the result types of '@{}'",
            func.sym_name(ctx).unwrap_or_default()
        ));
    }
    Ok(())
}
