//! Compile-time constant attributes.

use crate::refs::TypeRef;
use crate::symbol::Symbol;
use crate::types::{IntegerType, TypeInterner};

/// IR attribute values.
///
/// Attributes that carry a `TypeRef` are relative to the `IrContext`
/// that interned the type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// `unit`
    Unit,
    Bool(bool),
    /// Integer constant with its builtin integer type, `42 : si12`.
    Int { value: i128, ty: TypeRef },
    /// Float constant stored as raw bits, `1.5 : f64`.
    Float { bits: u64, ty: TypeRef },
    String(String),
    /// Symbol reference, `@name`.
    SymbolRef(Symbol),
    Type(TypeRef),
    Array(Vec<Attribute>),
    /// Dialect attribute `#dialect.name<params>`. Purely structural, so
    /// dialects can use these without registering anything.
    Opaque {
        dialect: Symbol,
        name: Symbol,
        params: Vec<Attribute>,
    },
}

impl Attribute {
    /// Typed integer attribute.
    pub fn int(types: &mut TypeInterner, value: i128, ty: IntegerType) -> Self {
        Attribute::Int {
            value,
            ty: ty.intern(types),
        }
    }

    pub fn float(value: f64, ty: TypeRef) -> Self {
        Attribute::Float {
            bits: value.to_bits(),
            ty,
        }
    }

    /// `#builtin.int<value>`, an untyped integer.
    pub fn builtin_int(types: &mut TypeInterner, value: i128) -> Self {
        Attribute::Opaque {
            dialect: Symbol::new("builtin"),
            name: Symbol::new("int"),
            params: vec![Attribute::int(types, value, IntegerType::signless(64))],
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Attribute::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Value of a `#builtin.int<N>` attribute.
    pub fn as_builtin_int(&self) -> Option<i128> {
        match self {
            Attribute::Opaque {
                dialect,
                name,
                params,
            } if *dialect == "builtin" && *name == "int" => match params.as_slice() {
                [Attribute::Int { value, .. }] => Some(*value),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeRef> {
        match self {
            Attribute::Type(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Short description of the attribute's kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Attribute::Unit => "unit",
            Attribute::Bool(_) => "bool",
            Attribute::Int { .. } => "integer",
            Attribute::Float { .. } => "float",
            Attribute::String(_) => "string",
            Attribute::SymbolRef(_) => "symbol reference",
            Attribute::Type(_) => "type",
            Attribute::Array(_) => "array",
            Attribute::Opaque { .. } => "dialect attribute",
        }
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::String(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}

impl From<Vec<Attribute>> for Attribute {
    fn from(value: Vec<Attribute>) -> Self {
        Attribute::Array(value)
    }
}

impl From<TypeRef> for Attribute {
    fn from(value: TypeRef) -> Self {
        Attribute::Type(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_int_accessor() {
        let mut types = TypeInterner::new();
        let attr = Attribute::builtin_int(&mut types, 3);
        assert_eq!(attr.as_builtin_int(), Some(3));
        assert_eq!(attr.as_int(), None);
        let plain = Attribute::int(&mut types, 3, IntegerType::signless(64));
        assert_eq!(plain.as_builtin_int(), None);
        assert_eq!(plain.as_int(), Some(3));
    }

    #[test]
    fn typed_ints_with_different_types_differ() {
        let mut types = TypeInterner::new();
        let a = Attribute::int(&mut types, 42, IntegerType::signed(12));
        let b = Attribute::int(&mut types, 42, IntegerType::signless(32));
        assert_ne!(a, b);
        assert_eq!(a, Attribute::int(&mut types, 42, IntegerType::signed(12)));
    }
}
