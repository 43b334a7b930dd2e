//! The `builtin` dialect: the top-level `builtin.module` container.
//!
//! ```text
//! builtin.module @kernels attributes {"target" = "snitch"} {
//!   ...
//! }
//! ```

use std::fmt::{self, Write};

use crate::attribute::Attribute;
use crate::context::IrContext;
use crate::error::IrResult;
use crate::lexer::TokenKind;
use crate::parser::{OperationState, Parser};
use crate::printer::{Printer, RegionOptions};
use crate::refs::OpRef;
use crate::registry::{DialectDefinition, OpDefinition};
use crate::schema::{AttrConstraint, AttrDef, OpSchema, RegionDef};

pub const DIALECT_NAME: &str = "builtin";
pub const MODULE_NAME: &str = "module";
pub const SYM_NAME: &str = "sym_name";

const MODULE_SCHEMA: OpSchema = OpSchema {
    attributes: &[AttrDef::optional(SYM_NAME, AttrConstraint::String)],
    regions: &[RegionDef::new("body").single_block()],
    isolated_from_above: true,
    ..OpSchema::EMPTY
};

static OPS: &[OpDefinition] = &[OpDefinition::new("builtin.module", MODULE_SCHEMA)
    .with_syntax(parse_module, print_module)
    .with_verifier(verify_module)];

pub static DIALECT: DialectDefinition = DialectDefinition::new(DIALECT_NAME, OPS, &[]);

fn verify_module(ctx: &IrContext, op: OpRef) -> Result<(), String> {
    let has_args = ctx
        .op(op)
        .regions
        .iter()
        .flat_map(|&r| ctx.region(r).blocks.iter())
        .any(|&b| !ctx.block_args(b).is_empty());
    if has_args {
        return Err("module body cannot have block arguments".to_string());
    }
    Ok(())
}

fn parse_module(p: &mut Parser<'_>, state: &mut OperationState) -> IrResult<()> {
    if p.at(TokenKind::SymbolRef) {
        let name = p.parse_symbol_name()?;
        state.add_attribute(SYM_NAME, Attribute::String(name));
    }
    if p.consume_keyword("attributes")? {
        p.parse_attr_dict(&mut state.attributes)?;
    }
    let body = p.parse_single_block_region(&[])?;
    state.regions.push(body);
    Ok(())
}

fn print_module(printer: &mut Printer<'_>, op: OpRef) -> fmt::Result {
    let ctx = printer.ctx();
    let data = ctx.op(op);
    let sym_name = data
        .attributes
        .iter()
        .find(|(key, _)| **key == SYM_NAME)
        .and_then(|(_, value)| value.as_str());
    let mut elided: &[&str] = &[];
    if let Some(name) = sym_name {
        printer.write_char(' ')?;
        printer.print_symbol_name(name)?;
        elided = &[SYM_NAME];
    }
    let extra = data
        .attributes
        .keys()
        .any(|key| key.with_str(|k| !elided.contains(&k)));
    if extra {
        printer.write_str(" attributes")?;
        printer.print_attr_dict(&data.attributes, elided)?;
    }
    for &region in &data.regions {
        printer.write_char(' ')?;
        printer.print_region(region, RegionOptions::default())?;
    }
    Ok(())
}
