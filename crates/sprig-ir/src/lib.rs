//! Sprig IR.
//!
//! An arena IR for multi-dialect compilers with a textual format that has
//! two spellings for every operation: the generic form, available to all
//! registered operations, and an optional dialect-defined custom form.
//! Parsing either form and printing in either form are inverse up to value
//! names (see [`equivalence`]).

// === Core storage ===
pub mod attribute;
pub mod context;
pub mod refs;
pub mod symbol;
pub mod types;

// === Text format ===
pub mod lexer;
pub mod location;
pub mod parser;
pub mod printer;

// === Dialect plumbing ===
pub mod dialect;
pub mod ops;
pub mod registry;
pub mod schema;

// === Whole-module services ===
pub mod equivalence;
pub mod error;
pub mod module;
pub mod verifier;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_dialect;

// Re-export smallvec for dialect crates building `TypeData`.
pub use smallvec;

pub use attribute::Attribute;
pub use context::{AttributeMap, IrContext, OperationDataBuilder};
pub use error::{IrError, IrErrorKind, IrResult};
pub use location::Span;
pub use module::{Module, parse_module, parse_module_unverified, print_module, verify_module};
pub use ops::DialectOp;
pub use printer::Syntax;
pub use refs::{BlockRef, OpRef, RegionRef, TypeRef, ValueRef};
pub use registry::{DialectDefinition, OpDefinition, Registry, TypeDefinition};
pub use symbol::{OpName, Symbol};
pub use verifier::VerifyMode;
pub use walk::WalkAction;
