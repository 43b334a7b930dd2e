//! Operation and type registry.
//!
//! Dialects describe their operations and types as static
//! [`DialectDefinition`]s. A [`Registry`] is populated once, by explicit
//! registration or from every dialect linked into the binary
//! (`inventory::submit!`), and is then shared read-only by any number of
//! concurrent parses and prints.
//!
//! ```ignore
//! inventory::submit! {
//!     DialectDefinition::new("riscv_snitch", OPS, TYPES)
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::context::IrContext;
use crate::error::{IrError, IrResult};
use crate::parser::{OperationState, Parser};
use crate::printer::Printer;
use crate::refs::OpRef;
use crate::schema::OpSchema;
use crate::symbol::{OpName, Symbol};
use crate::types::TypeData;

/// Parses everything after the mnemonic into `state`.
pub type CustomParseFn = fn(&mut Parser<'_>, &mut OperationState) -> IrResult<()>;

/// Prints everything after the mnemonic. The driver has already written
/// the result list and the mnemonic itself.
pub type CustomPrintFn = fn(&mut Printer<'_>, OpRef) -> fmt::Result;

/// Op-specific verification run after the schema checks pass.
pub type VerifyFn = fn(&IrContext, OpRef) -> Result<(), String>;

/// Parses the body of a dialect type after `!dialect.name`.
pub type TypeParseFn = fn(&mut Parser<'_>) -> IrResult<TypeData>;

/// Prints the body of a dialect type after `!dialect.name`.
pub type TypePrintFn = fn(&mut Printer<'_>, &TypeData) -> fmt::Result;

#[derive(Clone, Copy)]
pub struct CustomSyntax {
    pub parse: CustomParseFn,
    pub print: CustomPrintFn,
}

/// Everything the framework knows about one operation.
#[derive(Clone, Copy)]
pub struct OpDefinition {
    /// Full mnemonic, `dialect.name`.
    pub name: &'static str,
    pub schema: OpSchema,
    pub syntax: Option<CustomSyntax>,
    pub verify: Option<VerifyFn>,
}

impl OpDefinition {
    pub const fn new(name: &'static str, schema: OpSchema) -> Self {
        Self {
            name,
            schema,
            syntax: None,
            verify: None,
        }
    }

    pub const fn with_syntax(mut self, parse: CustomParseFn, print: CustomPrintFn) -> Self {
        self.syntax = Some(CustomSyntax { parse, print });
        self
    }

    pub const fn with_verifier(mut self, verify: VerifyFn) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn op_name(&self) -> Option<OpName> {
        OpName::parse(self.name)
    }
}

impl fmt::Debug for OpDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpDefinition")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("custom_syntax", &self.syntax.is_some())
            .field("verify", &self.verify.is_some())
            .finish()
    }
}

/// Parse and print hooks for a dialect type.
#[derive(Clone, Copy)]
pub struct TypeDefinition {
    /// Full name without the `!` sigil, `dialect.name`.
    pub name: &'static str,
    pub parse: TypeParseFn,
    pub print: TypePrintFn,
}

impl TypeDefinition {
    pub const fn new(name: &'static str, parse: TypeParseFn, print: TypePrintFn) -> Self {
        Self { name, parse, print }
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A dialect's operations and types.
#[derive(Debug)]
pub struct DialectDefinition {
    pub name: &'static str,
    pub ops: &'static [OpDefinition],
    pub types: &'static [TypeDefinition],
}

impl DialectDefinition {
    pub const fn new(
        name: &'static str,
        ops: &'static [OpDefinition],
        types: &'static [TypeDefinition],
    ) -> Self {
        Self { name, ops, types }
    }
}

inventory::collect!(DialectDefinition);

/// Lookup table from mnemonic to definition.
pub struct Registry {
    ops: HashMap<OpName, OpDefinition>,
    types: HashMap<(Symbol, Symbol), TypeDefinition>,
    dialects: Vec<&'static str>,
}

impl Registry {
    /// A registry with only the builtin dialect.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        // Builtin names cannot collide in an empty registry.
        let _ = registry.register_dialect(&crate::dialect::builtin::DIALECT);
        registry
    }

    /// A registry with nothing in it, not even `builtin.module`.
    pub fn empty() -> Self {
        Self {
            ops: HashMap::new(),
            types: HashMap::new(),
            dialects: Vec::new(),
        }
    }

    /// Builtin plus every dialect submitted through `inventory`, registered
    /// in name order so the outcome does not depend on link order.
    pub fn with_linked_dialects() -> IrResult<Self> {
        let mut registry = Self::new();
        let mut linked: Vec<&DialectDefinition> = inventory::iter::<DialectDefinition>().collect();
        linked.sort_by_key(|d| d.name);
        for dialect in linked {
            registry.register_dialect(dialect)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, def: OpDefinition) -> IrResult<()> {
        let name = def
            .op_name()
            .ok_or_else(|| IrError::unknown_operation(def.name, Default::default()))?;
        if self.ops.contains_key(&name) {
            return Err(IrError::duplicate_registration(def.name));
        }
        tracing::trace!(op = def.name, "registering operation");
        self.ops.insert(name, def);
        Ok(())
    }

    pub fn register_type(&mut self, def: TypeDefinition) -> IrResult<()> {
        let key = Self::type_key(def.name)
            .ok_or_else(|| IrError::unknown_type(def.name, Default::default()))?;
        if self.types.contains_key(&key) {
            return Err(IrError::duplicate_registration(format!("!{}", def.name)));
        }
        tracing::trace!(ty = def.name, "registering type");
        self.types.insert(key, def);
        Ok(())
    }

    /// Register a whole dialect. Nothing is registered if any of its names
    /// is already taken.
    pub fn register_dialect(&mut self, dialect: &DialectDefinition) -> IrResult<()> {
        for def in dialect.ops {
            if def.op_name().is_some_and(|n| self.ops.contains_key(&n)) {
                return Err(IrError::duplicate_registration(def.name));
            }
        }
        for def in dialect.types {
            if Self::type_key(def.name).is_some_and(|k| self.types.contains_key(&k)) {
                return Err(IrError::duplicate_registration(format!("!{}", def.name)));
            }
        }
        for def in dialect.ops {
            self.register(*def)?;
        }
        for def in dialect.types {
            self.register_type(*def)?;
        }
        tracing::debug!(
            dialect = dialect.name,
            ops = dialect.ops.len(),
            types = dialect.types.len(),
            "registered dialect"
        );
        self.dialects.push(dialect.name);
        Ok(())
    }

    pub fn lookup(&self, mnemonic: &str) -> Option<&OpDefinition> {
        self.lookup_op(OpName::parse(mnemonic)?)
    }

    pub fn lookup_op(&self, name: OpName) -> Option<&OpDefinition> {
        self.ops.get(&name)
    }

    pub fn lookup_type(&self, dialect: Symbol, name: Symbol) -> Option<&TypeDefinition> {
        self.types.get(&(dialect, name))
    }

    pub fn dialects(&self) -> &[&'static str] {
        &self.dialects
    }

    /// All registered operations, sorted by mnemonic.
    pub fn ops(&self) -> Vec<&OpDefinition> {
        let mut ops: Vec<&OpDefinition> = self.ops.values().collect();
        ops.sort_by_key(|d| d.name);
        ops
    }

    fn type_key(name: &str) -> Option<(Symbol, Symbol)> {
        let name = OpName::parse(name)?;
        Some((name.dialect, name.name))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("dialects", &self.dialects)
            .field("ops", &self.ops.len())
            .field("types", &self.types.len())
            .finish()
    }
}
