//! Declarative operation schemas.
//!
//! A schema states what the verifier checks for every instance of an
//! operation: operand and result arity and types, attributes, regions and
//! terminator placement. Schemas are plain `const` data so dialects can
//! declare them in statics.

use crate::attribute::Attribute;
use crate::context::IrContext;
use crate::refs::TypeRef;
use crate::types::{FunctionType, IntegerType};

/// Constraint on the type of one operand or result.
#[derive(Clone, Copy, Debug)]
pub enum TypeConstraint {
    Any,
    /// A type by qualified name: `riscv.reg`, `builtin.index`.
    Named(&'static str),
    /// Builtin integer of exactly this width and signedness.
    Integer(IntegerType),
    Predicate {
        description: &'static str,
        check: fn(&IrContext, TypeRef) -> bool,
    },
}

impl TypeConstraint {
    pub fn matches(&self, ctx: &IrContext, ty: TypeRef) -> bool {
        match self {
            TypeConstraint::Any => true,
            TypeConstraint::Named(qualified) => match qualified.split_once('.') {
                Some((dialect, name)) => ctx.types.get(ty).is(dialect, name),
                None => false,
            },
            TypeConstraint::Integer(int) => {
                IntegerType::from_type(&ctx.types, ty).is_some_and(|found| found == *int)
            }
            TypeConstraint::Predicate { check, .. } => check(ctx, ty),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TypeConstraint::Any => "any type".to_string(),
            TypeConstraint::Named(qualified) => format!("!{qualified}"),
            TypeConstraint::Integer(int) => int.to_string(),
            TypeConstraint::Predicate { description, .. } => description.to_string(),
        }
    }
}

/// One operand or result slot.
#[derive(Clone, Copy, Debug)]
pub struct ArgDef {
    pub name: &'static str,
    pub ty: TypeConstraint,
    /// Matches zero or more values. At most one slot per list is variadic.
    pub variadic: bool,
}

impl ArgDef {
    pub const fn new(name: &'static str, ty: TypeConstraint) -> Self {
        Self {
            name,
            ty,
            variadic: false,
        }
    }

    pub const fn variadic(name: &'static str, ty: TypeConstraint) -> Self {
        Self {
            name,
            ty,
            variadic: true,
        }
    }
}

/// Check `types` against a slot list, returning a description of the first
/// violation.
pub fn check_values(
    ctx: &IrContext,
    what: &str,
    defs: &[ArgDef],
    types: &[TypeRef],
) -> Result<(), String> {
    let variadic = defs.iter().position(|d| d.variadic);
    let fixed = defs.len() - usize::from(variadic.is_some());
    match variadic {
        None if types.len() != fixed => {
            return Err(format!(
                "expected {fixed} {what}(s), found {}",
                types.len()
            ));
        }
        Some(_) if types.len() < fixed => {
            return Err(format!(
                "expected at least {fixed} {what}(s), found {}",
                types.len()
            ));
        }
        _ => {}
    }

    // Slots before the variadic one bind from the front, slots after it
    // bind from the back, and the variadic slot takes the middle.
    let split = variadic.unwrap_or(defs.len());
    let tail = defs.len() - split - usize::from(variadic.is_some());
    for (i, &ty) in types.iter().enumerate() {
        let def = if i < split {
            &defs[i]
        } else if i >= types.len() - tail {
            &defs[defs.len() - (types.len() - i)]
        } else {
            &defs[split]
        };
        if !def.ty.matches(ctx, ty) {
            return Err(format!(
                "{what} #{i} ('{}') must be {}",
                def.name,
                def.ty.describe()
            ));
        }
    }
    Ok(())
}

/// Constraint on an attribute value.
#[derive(Clone, Copy, Debug)]
pub enum AttrConstraint {
    Any,
    /// Typed integer of exactly this integer type, value within its range.
    Integer(IntegerType),
    /// `#builtin.int<N>` with `0 <= N <= max`.
    BuiltinInt { max: i128 },
    String,
    SymbolRef,
    Type,
    FunctionType,
}

impl AttrConstraint {
    pub fn check(&self, ctx: &IrContext, attr: &Attribute) -> Result<(), String> {
        let ok = match (self, attr) {
            (AttrConstraint::Any, _) => true,
            (AttrConstraint::Integer(int), Attribute::Int { value, ty }) => {
                if IntegerType::from_type(&ctx.types, *ty) != Some(*int) {
                    return Err(format!("must be a {int} integer"));
                }
                if !int.contains(*value) {
                    let (lo, hi) = int.range();
                    return Err(format!("value {value} is out of range for {int} ({lo}..={hi})"));
                }
                true
            }
            (AttrConstraint::BuiltinInt { max }, attr) => match attr.as_builtin_int() {
                Some(value) if (0..=*max).contains(&value) => true,
                Some(value) => return Err(format!("value {value} is out of range 0..={max}")),
                None => false,
            },
            (AttrConstraint::String, Attribute::String(_)) => true,
            (AttrConstraint::SymbolRef, Attribute::SymbolRef(_)) => true,
            (AttrConstraint::Type, Attribute::Type(_)) => true,
            (AttrConstraint::FunctionType, Attribute::Type(ty)) => {
                FunctionType::from_type(&ctx.types, *ty).is_some()
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "must be {}, found {}",
                self.describe(),
                attr.kind_name()
            ))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttrConstraint::Any => "any attribute".to_string(),
            AttrConstraint::Integer(int) => format!("a {int} integer"),
            AttrConstraint::BuiltinInt { .. } => "a #builtin.int".to_string(),
            AttrConstraint::String => "a string".to_string(),
            AttrConstraint::SymbolRef => "a symbol reference".to_string(),
            AttrConstraint::Type => "a type".to_string(),
            AttrConstraint::FunctionType => "a function type".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AttrDef {
    pub name: &'static str,
    pub kind: AttrConstraint,
    pub optional: bool,
}

impl AttrDef {
    pub const fn required(name: &'static str, kind: AttrConstraint) -> Self {
        Self {
            name,
            kind,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, kind: AttrConstraint) -> Self {
        Self {
            name,
            kind,
            optional: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RegionDef {
    pub name: &'static str,
    pub single_block: bool,
    /// When set, every block must end with one of these operations.
    pub terminators: Option<&'static [&'static str]>,
}

impl RegionDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            single_block: false,
            terminators: None,
        }
    }

    pub const fn single_block(mut self) -> Self {
        self.single_block = true;
        self
    }

    pub const fn terminated_by(mut self, terminators: &'static [&'static str]) -> Self {
        self.terminators = Some(terminators);
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OpSchema {
    pub operands: &'static [ArgDef],
    pub results: &'static [ArgDef],
    pub attributes: &'static [AttrDef],
    pub regions: &'static [RegionDef],
    /// The op may only appear as the last op of its block.
    pub is_terminator: bool,
    /// Terminator that custom syntax leaves implicit in each of this op's
    /// single-block regions.
    pub implicit_terminator: Option<&'static str>,
    /// Regions of this op cannot reference values defined outside it.
    pub isolated_from_above: bool,
}

impl OpSchema {
    pub const EMPTY: OpSchema = OpSchema {
        operands: &[],
        results: &[],
        attributes: &[],
        regions: &[],
        is_terminator: false,
        implicit_terminator: None,
        isolated_from_above: false,
    };

    pub fn attribute(&self, name: &str) -> Option<&AttrDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

impl Default for OpSchema {
    fn default() -> Self {
        Self::EMPTY
    }
}
