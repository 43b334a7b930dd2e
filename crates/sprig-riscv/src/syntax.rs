//! Assembly-like custom syntax shared by most RISC-V operations.
//!
//! ```text
//! %2 = riscv.add %0, %1 : (!riscv.reg<>, !riscv.reg<>) -> !riscv.reg<>
//! %3 = riscv.addi %2, -4 : (!riscv.reg<>) -> !riscv.reg<>
//! %4 = riscv.li 42 : !riscv.reg<>
//! %5 = riscv.get_register : !riscv.reg<sp>
//! ```
//!
//! Register operands come first, then the immediate when the op declares
//! one. The signature lists operand and result types; ops without register
//! operands spell only their result type.

use std::fmt::{self, Write};

use sprig_ir::attribute::Attribute;
use sprig_ir::lexer::TokenKind;
use sprig_ir::parser::{OperationState, Parser, UnresolvedOperand};
use sprig_ir::printer::Printer;
use sprig_ir::schema::AttrConstraint;
use sprig_ir::types::IntegerType;
use sprig_ir::{IrResult, OpName, OpRef, Registry, Symbol};

/// Attribute holding an instruction's immediate operand.
pub const IMMEDIATE: &str = "immediate";

/// Integer type of the op's immediate, if its schema declares one.
pub(crate) fn immediate_type(registry: &Registry, name: OpName) -> Option<IntegerType> {
    let def = registry.lookup_op(name)?;
    match def.schema.attribute(IMMEDIATE)?.kind {
        AttrConstraint::Integer(int) => Some(int),
        _ => None,
    }
}

pub(crate) fn parse_asm(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let immediate = immediate_type(p.registry(), state.name);

    let mut operands: Vec<UnresolvedOperand<'_>> = Vec::new();
    let mut trailing_comma = false;
    while p.at(TokenKind::ValueId) {
        operands.push(p.parse_operand()?);
        trailing_comma = p.consume_if(TokenKind::Comma)?;
        if !trailing_comma {
            break;
        }
    }

    match immediate {
        Some(int) => {
            if !operands.is_empty() && !trailing_comma {
                p.expect(TokenKind::Comma)?;
            }
            let (value, _) = p.parse_integer()?;
            let ty = int.intern(&mut p.ctx().types);
            state.add_attribute(IMMEDIATE, Attribute::Int { value, ty });
        }
        None if trailing_comma => return Err(p.unexpected("value name")),
        None => {}
    }

    p.parse_optional_attr_dict(&mut state.attributes)?;
    p.expect(TokenKind::Colon)?;

    if operands.is_empty() && !p.at(TokenKind::LParen) {
        let ty = p.parse_type()?;
        state.result_types.push(ty);
        return Ok(());
    }
    let start = p.peek().span.start;
    let signature = p.parse_function_type()?;
    let span = p.span_from(start);
    state.operands = p.resolve_operands(&operands, &signature.inputs, span)?;
    state.result_types = signature.outputs;
    Ok(())
}

pub(crate) fn print_asm(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    let data = ctx.op(op);
    let operands = ctx.op_operands(op);
    let results = ctx.op_result_types(op);

    if !operands.is_empty() {
        printer.write_char(' ')?;
        printer.print_values(operands)?;
    }
    let mut elided: &[&str] = &[];
    if immediate_type(printer.registry(), data.op_name()).is_some() {
        if let Some(value) = data
            .attributes
            .get(&Symbol::new(IMMEDIATE))
            .and_then(Attribute::as_int)
        {
            let sep = if operands.is_empty() { " " } else { ", " };
            write!(printer, "{sep}{value}")?;
            elided = &[IMMEDIATE];
        }
    }
    printer.print_attr_dict(&data.attributes, elided)?;

    printer.write_str(" : ")?;
    match results {
        [single] if operands.is_empty() => printer.print_type(*single),
        _ => {
            let inputs: Vec<_> = operands.iter().map(|&v| ctx.value_ty(v)).collect();
            printer.print_function_type(&inputs, results)
        }
    }
}
