//! Register and stream types.
//!
//! ```text
//! !riscv.reg<>            integer register, not allocated yet
//! !riscv.reg<a0>          integer register fixed to a0
//! !riscv.freg<ft0>        floating-point register fixed to ft0
//! !snitch.readable<T>     stream the core reads elements of type T from
//! !snitch.writable<T>     stream the core writes elements of type T to
//! ```

use std::fmt::{self, Write};

use sprig_ir::attribute::Attribute;
use sprig_ir::lexer::TokenKind;
use sprig_ir::parser::Parser;
use sprig_ir::printer::Printer;
use sprig_ir::schema::TypeConstraint;
use sprig_ir::types::{TypeData, TypeDataBuilder, TypeInterner};
use sprig_ir::{IrContext, IrResult, Symbol, TypeDefinition, TypeRef};

use crate::registers::RegisterClass;

pub const RISCV: &str = "riscv";
pub const SNITCH: &str = "snitch";

/// Type attribute holding the fixed register name.
const REGISTER_KEY: &str = "name";

pub const REG: TypeConstraint = TypeConstraint::Named("riscv.reg");
pub const FREG: TypeConstraint = TypeConstraint::Named("riscv.freg");
pub const ANY_REGISTER: TypeConstraint = TypeConstraint::Predicate {
    description: "!riscv.reg or !riscv.freg",
    check: is_register,
};
pub const READABLE: TypeConstraint = TypeConstraint::Predicate {
    description: "!snitch.readable",
    check: is_readable,
};
pub const WRITABLE: TypeConstraint = TypeConstraint::Predicate {
    description: "!snitch.writable",
    check: is_writable,
};

pub(crate) const RISCV_TYPES: &[TypeDefinition] = &[
    TypeDefinition::new("riscv.reg", parse_reg, print_register),
    TypeDefinition::new("riscv.freg", parse_freg, print_register),
];

pub(crate) const SNITCH_TYPES: &[TypeDefinition] = &[
    TypeDefinition::new("snitch.readable", parse_readable, print_stream),
    TypeDefinition::new("snitch.writable", parse_writable, print_stream),
];

fn type_name(class: RegisterClass) -> &'static str {
    match class {
        RegisterClass::Integer => "reg",
        RegisterClass::Float => "freg",
    }
}

/// `!riscv.reg<name>` or `!riscv.freg<name>`; `None` leaves it unallocated.
///
/// The name is not checked here; types built from unchecked names print
/// fine but do not parse back.
pub fn register_type(types: &mut TypeInterner, class: RegisterClass, name: Option<&str>) -> TypeRef {
    let mut data = TypeDataBuilder::new(Symbol::new(RISCV), Symbol::new(type_name(class)));
    if let Some(name) = name {
        data = data.attr(REGISTER_KEY, Attribute::String(name.to_string()));
    }
    types.intern(data.build())
}

pub fn reg(types: &mut TypeInterner, name: Option<&str>) -> TypeRef {
    register_type(types, RegisterClass::Integer, name)
}

pub fn freg(types: &mut TypeInterner, name: Option<&str>) -> TypeRef {
    register_type(types, RegisterClass::Float, name)
}

fn is_register(ctx: &IrContext, ty: TypeRef) -> bool {
    register_class(&ctx.types, ty).is_some()
}

fn is_readable(ctx: &IrContext, ty: TypeRef) -> bool {
    stream_element(ctx, ty, StreamDirection::Readable).is_some()
}

fn is_writable(ctx: &IrContext, ty: TypeRef) -> bool {
    stream_element(ctx, ty, StreamDirection::Writable).is_some()
}

pub fn register_class(types: &TypeInterner, ty: TypeRef) -> Option<RegisterClass> {
    let data = types.get(ty);
    if data.is(RISCV, "reg") {
        Some(RegisterClass::Integer)
    } else if data.is(RISCV, "freg") {
        Some(RegisterClass::Float)
    } else {
        None
    }
}

/// The register a register type is fixed to, if any.
pub fn register_name(types: &TypeInterner, ty: TypeRef) -> Option<&str> {
    register_class(types, ty)?;
    types
        .get(ty)
        .attrs
        .get(&Symbol::new(REGISTER_KEY))
        .and_then(Attribute::as_str)
}

/// Direction of a Snitch stream register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamDirection {
    Readable,
    Writable,
}

impl StreamDirection {
    fn type_name(self) -> &'static str {
        match self {
            StreamDirection::Readable => "readable",
            StreamDirection::Writable => "writable",
        }
    }
}

pub fn stream_type(types: &mut TypeInterner, direction: StreamDirection, element: TypeRef) -> TypeRef {
    types.intern(
        TypeDataBuilder::new(Symbol::new(SNITCH), Symbol::new(direction.type_name()))
            .param(element)
            .build(),
    )
}

/// Element type of a stream of the given direction.
pub fn stream_element(ctx: &IrContext, ty: TypeRef, direction: StreamDirection) -> Option<TypeRef> {
    let data = ctx.types.get(ty);
    if !data.is(SNITCH, direction.type_name()) {
        return None;
    }
    data.params.first().copied()
}

fn parse_reg(p: &mut Parser<'_>) -> IrResult<TypeData> {
    parse_register(p, RegisterClass::Integer)
}

fn parse_freg(p: &mut Parser<'_>) -> IrResult<TypeData> {
    parse_register(p, RegisterClass::Float)
}

fn parse_register(p: &mut Parser<'_>, class: RegisterClass) -> IrResult<TypeData> {
    p.expect(TokenKind::Less)?;
    let mut data = TypeDataBuilder::new(Symbol::new(RISCV), Symbol::new(type_name(class)));
    if p.at(TokenKind::Ident) {
        let token = p.peek();
        if !class.contains(token.text) {
            return Err(p.unexpected(format!("{class} register name")));
        }
        p.bump()?;
        data = data.attr(REGISTER_KEY, Attribute::String(token.text.to_string()));
    }
    p.expect(TokenKind::Greater)?;
    Ok(data.build())
}

fn print_register(printer: &mut Printer<'_>, data: &TypeData) -> fmt::Result {
    printer.write_char('<')?;
    if let Some(name) = data
        .attrs
        .get(&Symbol::new(REGISTER_KEY))
        .and_then(Attribute::as_str)
    {
        printer.write_str(name)?;
    }
    printer.write_char('>')
}

fn parse_readable(p: &mut Parser<'_>) -> IrResult<TypeData> {
    parse_stream(p, StreamDirection::Readable)
}

fn parse_writable(p: &mut Parser<'_>) -> IrResult<TypeData> {
    parse_stream(p, StreamDirection::Writable)
}

fn parse_stream(p: &mut Parser<'_>, direction: StreamDirection) -> IrResult<TypeData> {
    p.expect(TokenKind::Less)?;
    let element = p.parse_type()?;
    p.expect(TokenKind::Greater)?;
    Ok(TypeDataBuilder::new(Symbol::new(SNITCH), Symbol::new(direction.type_name()))
        .param(element)
        .build())
}

fn print_stream(printer: &mut Printer<'_>, data: &TypeData) -> fmt::Result {
    printer.write_char('<')?;
    printer.print_types(&data.params)?;
    printer.write_char('>')
}
