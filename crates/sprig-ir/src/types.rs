//! Type interning and the builtin type family.
//!
//! Types are immutable and structurally interned: building the same
//! `TypeData` twice in one context yields the same `TypeRef`, so type
//! equality inside a context is ref equality. Across contexts use
//! [`crate::equivalence`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use cranelift_entity::PrimaryMap;
use smallvec::SmallVec;

use crate::attribute::Attribute;
use crate::refs::TypeRef;
use crate::symbol::Symbol;

// ============================================================================
// TypeData
// ============================================================================

/// Data for a single interned type.
///
/// Dialect types keep their parameters in `params` (nested types) and
/// `attrs` (everything else, e.g. a fixed register name).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeData {
    pub dialect: Symbol,
    pub name: Symbol,
    pub params: SmallVec<[TypeRef; 4]>,
    pub attrs: BTreeMap<Symbol, Attribute>,
}

impl TypeData {
    pub fn is(&self, dialect: &str, name: &str) -> bool {
        self.dialect == dialect && self.name == name
    }
}

/// Builder for constructing `TypeData` with a fluent API.
///
/// Defaults to empty params and empty attrs.
pub struct TypeDataBuilder {
    dialect: Symbol,
    name: Symbol,
    params: SmallVec<[TypeRef; 4]>,
    attrs: BTreeMap<Symbol, Attribute>,
}

impl TypeDataBuilder {
    pub fn new(dialect: Symbol, name: Symbol) -> Self {
        Self {
            dialect,
            name,
            params: SmallVec::new(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    pub fn params(mut self, tys: impl IntoIterator<Item = TypeRef>) -> Self {
        self.params.extend(tys);
        self
    }

    pub fn attr(mut self, key: impl Into<Symbol>, val: Attribute) -> Self {
        self.attrs.insert(key.into(), val);
        self
    }

    pub fn build(self) -> TypeData {
        TypeData {
            dialect: self.dialect,
            name: self.name,
            params: self.params,
            attrs: self.attrs,
        }
    }
}

// ============================================================================
// TypeInterner
// ============================================================================

/// Deduplicating type interner. Same `TypeData` always yields the same `TypeRef`.
#[derive(Debug)]
pub struct TypeInterner {
    types: PrimaryMap<TypeRef, TypeData>,
    dedup: HashMap<TypeData, TypeRef>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self {
            types: PrimaryMap::new(),
            dedup: HashMap::default(),
        }
    }

    /// Intern a type, returning an existing ref if the data matches.
    pub fn intern(&mut self, data: TypeData) -> TypeRef {
        if let Some(&existing) = self.dedup.get(&data) {
            return existing;
        }
        let r = self.types.push(data.clone());
        self.dedup.insert(data, r);
        r
    }

    /// Look up type data by reference.
    pub fn get(&self, r: TypeRef) -> &TypeData {
        &self.types[r]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Intern a builtin type with no parameters (`index`, `f64`, `si12`, ...).
    fn builtin(&mut self, name: Symbol) -> TypeRef {
        self.intern(TypeDataBuilder::new(Symbol::new("builtin"), name).build())
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builtin types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signless,
    Signed,
    Unsigned,
}

/// Builtin integer type: `i32`, `si12`, `ui5`.
///
/// Interned as `builtin.<spelling>` so two spellings of one width and
/// signedness are the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntegerType {
    pub width: u32,
    pub signedness: Signedness,
}

impl IntegerType {
    pub const fn signless(width: u32) -> Self {
        Self {
            width,
            signedness: Signedness::Signless,
        }
    }

    pub const fn signed(width: u32) -> Self {
        Self {
            width,
            signedness: Signedness::Signed,
        }
    }

    pub const fn unsigned(width: u32) -> Self {
        Self {
            width,
            signedness: Signedness::Unsigned,
        }
    }

    /// Parse a spelling such as `i32`, `si12` or `ui5`.
    pub fn from_keyword(text: &str) -> Option<Self> {
        let (signedness, digits) = if let Some(rest) = text.strip_prefix("si") {
            (Signedness::Signed, rest)
        } else if let Some(rest) = text.strip_prefix("ui") {
            (Signedness::Unsigned, rest)
        } else if let Some(rest) = text.strip_prefix('i') {
            (Signedness::Signless, rest)
        } else {
            return None;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0')
        {
            return None;
        }
        let width: u32 = digits.parse().ok()?;
        (1..=128).contains(&width).then_some(Self { width, signedness })
    }

    pub fn intern(self, types: &mut TypeInterner) -> TypeRef {
        types.builtin(Symbol::from_dynamic(&self.to_string()))
    }

    /// Recover the integer type from an interned ref, if it is one.
    pub fn from_type(types: &TypeInterner, ty: TypeRef) -> Option<Self> {
        let data = types.get(ty);
        if data.dialect != "builtin" {
            return None;
        }
        data.name.with_str(Self::from_keyword)
    }

    /// Inclusive value range representable by this type.
    ///
    /// Signless integers accept both the signed and the unsigned
    /// interpretation of their bit pattern.
    pub fn range(&self) -> (i128, i128) {
        // 2^bits - 1, saturating at i128::MAX
        let ones = |bits: u32| {
            if bits >= 127 {
                i128::MAX
            } else {
                (1i128 << bits) - 1
            }
        };
        let w = self.width;
        let signed_min = if w >= 128 {
            i128::MIN
        } else {
            -(1i128 << (w - 1))
        };
        match self.signedness {
            Signedness::Signed => (signed_min, ones(w - 1)),
            Signedness::Unsigned => (0, ones(w)),
            Signedness::Signless => (signed_min, ones(w)),
        }
    }

    pub fn contains(&self, value: i128) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&value)
    }
}

impl fmt::Display for IntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.signedness {
            Signedness::Signless => "i",
            Signedness::Signed => "si",
            Signedness::Unsigned => "ui",
        };
        write!(f, "{prefix}{}", self.width)
    }
}

/// Keyword builtin types other than integers and functions.
pub const SIMPLE_BUILTIN_TYPES: &[&str] = &["index", "none", "f16", "f32", "f64"];

/// Resolve a bare type keyword (`i32`, `si12`, `f64`, `index`, ...).
pub fn builtin_type_from_keyword(types: &mut TypeInterner, text: &str) -> Option<TypeRef> {
    if let Some(int) = IntegerType::from_keyword(text) {
        return Some(int.intern(types));
    }
    SIMPLE_BUILTIN_TYPES
        .iter()
        .find(|&&kw| kw == text)
        .map(|&kw| types.builtin(Symbol::new(kw)))
}

pub fn index_type(types: &mut TypeInterner) -> TypeRef {
    types.builtin(Symbol::new("index"))
}

pub fn float_type(types: &mut TypeInterner, width: u32) -> Option<TypeRef> {
    let name = match width {
        16 => "f16",
        32 => "f32",
        64 => "f64",
        _ => return None,
    };
    Some(types.builtin(Symbol::new(name)))
}

pub fn is_float_type(types: &TypeInterner, ty: TypeRef) -> bool {
    let data = types.get(ty);
    data.dialect == "builtin" && data.name.with_str(|n| matches!(n, "f16" | "f32" | "f64"))
}

/// Builtin function type `(inputs) -> (outputs)`.
///
/// Stored as `builtin.function` with inputs followed by outputs in
/// `params` and the input count in the `inputs` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionType {
    pub inputs: Vec<TypeRef>,
    pub outputs: Vec<TypeRef>,
}

impl FunctionType {
    pub fn new(inputs: Vec<TypeRef>, outputs: Vec<TypeRef>) -> Self {
        Self { inputs, outputs }
    }

    pub fn intern(&self, types: &mut TypeInterner) -> TypeRef {
        let i64_ty = IntegerType::signless(64).intern(types);
        let data = TypeDataBuilder::new(Symbol::new("builtin"), Symbol::new("function"))
            .params(self.inputs.iter().copied())
            .params(self.outputs.iter().copied())
            .attr(
                "inputs",
                Attribute::Int {
                    value: self.inputs.len() as i128,
                    ty: i64_ty,
                },
            )
            .build();
        types.intern(data)
    }

    pub fn from_type(types: &TypeInterner, ty: TypeRef) -> Option<Self> {
        let data = types.get(ty);
        if !data.is("builtin", "function") {
            return None;
        }
        let split = match data.attrs.get(&Symbol::new("inputs")) {
            Some(Attribute::Int { value, .. }) => usize::try_from(*value).ok()?,
            _ => return None,
        };
        if split > data.params.len() {
            return None;
        }
        Some(Self {
            inputs: data.params[..split].to_vec(),
            outputs: data.params[split..].to_vec(),
        })
    }
}
