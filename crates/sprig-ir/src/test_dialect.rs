//! A small dialect exercising every parser and printer path.
//!
//! - `test.const 42 : i32` (custom), integer constant
//! - `"test.add"(%a, %b) : (T, T) -> T` (generic only)
//! - `test.region [(%arg : T, ...)] { ... }` (custom, implicit `test.yield`)
//! - `"test.yield"(%v...) : (...) -> ()` (terminator, generic only)
//! - `"test.isolated"() ({ ... }) : () -> ()` (isolated from above)
//! - `!test.box<T>` (dialect type)

use std::fmt::{self, Write};

use crate::attribute::Attribute;
use crate::context::IrContext;
use crate::error::IrResult;
use crate::lexer::TokenKind;
use crate::parser::{OperationState, Parser};
use crate::printer::{Printer, RegionOptions, Syntax, print_op};
use crate::refs::OpRef;
use crate::registry::{DialectDefinition, OpDefinition, Registry, TypeDefinition};
use crate::schema::{ArgDef, AttrConstraint, AttrDef, OpSchema, RegionDef, TypeConstraint};
use crate::symbol::Symbol;
use crate::types::{TypeData, TypeDataBuilder};

const ANY: TypeConstraint = TypeConstraint::Any;

static OPS: &[OpDefinition] = &[
    OpDefinition::new(
        "test.const",
        OpSchema {
            results: &[ArgDef::new("result", ANY)],
            attributes: &[AttrDef::required("value", AttrConstraint::Any)],
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_const, print_const)
    .with_verifier(verify_const),
    OpDefinition::new(
        "test.add",
        OpSchema {
            operands: &[ArgDef::new("lhs", ANY), ArgDef::new("rhs", ANY)],
            results: &[ArgDef::new("result", ANY)],
            ..OpSchema::EMPTY
        },
    ),
    OpDefinition::new(
        "test.region",
        OpSchema {
            regions: &[RegionDef::new("body")
                .single_block()
                .terminated_by(&["test.yield"])],
            implicit_terminator: Some("test.yield"),
            ..OpSchema::EMPTY
        },
    )
    .with_syntax(parse_region_op, print_region_op),
    OpDefinition::new(
        "test.yield",
        OpSchema {
            operands: &[ArgDef::variadic("values", ANY)],
            is_terminator: true,
            ..OpSchema::EMPTY
        },
    ),
    OpDefinition::new(
        "test.isolated",
        OpSchema {
            regions: &[RegionDef::new("body")],
            isolated_from_above: true,
            ..OpSchema::EMPTY
        },
    ),
];

static TYPES: &[TypeDefinition] = &[TypeDefinition::new("test.box", parse_box, print_box)];

pub static DIALECT: DialectDefinition = DialectDefinition::new("test", OPS, TYPES);

pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_dialect(&DIALECT).unwrap();
    registry
}

pub fn parse(src: &str) -> IrResult<(IrContext, OpRef)> {
    let registry = registry();
    let mut ctx = IrContext::new();
    let root = Parser::new(&registry, &mut ctx, src)?.parse_top_level()?;
    Ok((ctx, root))
}

/// Parse `src` and print it back.
pub fn reprint(src: &str, syntax: Syntax) -> String {
    let registry = registry();
    let (ctx, root) = parse(src).unwrap();
    print_op(&registry, &ctx, root, syntax)
}

fn parse_const(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let (value, _) = p.parse_integer()?;
    p.expect(TokenKind::Colon)?;
    let ty = p.parse_type()?;
    state.add_attribute("value", Attribute::Int { value, ty });
    state.result_types.push(ty);
    Ok(())
}

fn print_const(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    match ctx.op(op).attributes.get(&Symbol::new("value")) {
        Some(Attribute::Int { value, .. }) => write!(printer, " {value}")?,
        Some(other) => {
            printer.write_char(' ')?;
            printer.print_attribute(other)?;
        }
        None => {}
    }
    printer.write_str(" : ")?;
    printer.print_types(ctx.op_result_types(op))
}

fn verify_const(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    match ctx.op(op).attributes.get(&Symbol::new("value")) {
        Some(Attribute::Int { ty, .. }) if ctx.op_result_types(op) == [*ty] => Ok(()),
        _ => Err("'value' must be an integer of the result type".to_string()),
    }
}

fn parse_region_op(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    let args = if p.at(TokenKind::LParen) {
        p.parse_argument_list()?
    } else {
        Vec::new()
    };
    let body = p.parse_single_block_region(&args)?;
    state.regions.push(body);
    Ok(())
}

fn print_region_op(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    for &region in &ctx.op(op).regions {
        let entry = ctx.region(region).blocks.first().copied();
        let args = entry.map(|b| ctx.block_args(b)).unwrap_or_default();
        if !args.is_empty() {
            printer.write_str(" (")?;
            printer.print_typed_values(args)?;
            printer.write_char(')')?;
        }
        printer.write_char(' ')?;
        printer.print_region(
            region,
            RegionOptions {
                print_entry_block_args: false,
                elide_terminator: Some("test.yield"),
            },
        )?;
    }
    Ok(())
}

fn parse_box(p: &mut Parser<'_>) -> IrResult<TypeData> {
    p.expect(TokenKind::Less)?;
    let inner = p.parse_type()?;
    p.expect(TokenKind::Greater)?;
    Ok(TypeDataBuilder::new(Symbol::new("test"), Symbol::new("box"))
        .param(inner)
        .build())
}

fn print_box(printer: &mut Printer<'_>, data: &TypeData) -> fmt::Result {
    printer.write_char('<')?;
    printer.print_types(&data.params)?;
    printer.write_char('>')
}
