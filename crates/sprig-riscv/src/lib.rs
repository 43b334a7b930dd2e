//! RISC-V dialects for sprig-ir.
//!
//! - `riscv`: base integer and double-precision instructions over
//!   register-typed values
//! - `riscv_func`: functions and returns
//! - `riscv_snitch`: Snitch core extensions (stream configuration, `frep`
//!   hardware loops, stream reads and writes, DMA)
//! - `snitch`: stream register types
//!
//! Every dialect is submitted to the `inventory` registry, so
//! [`Registry::with_linked_dialects`] picks them up; [`register`] adds them
//! to a registry explicitly.

pub mod registers;
pub mod riscv;
pub mod riscv_func;
pub mod riscv_snitch;
mod syntax;
pub mod types;

use sprig_ir::{BlockRef, DialectDefinition, IrContext, IrResult, OpName, OpRef, OperationDataBuilder, Registry, Span, Symbol};

pub use registers::RegisterClass;
pub use syntax::IMMEDIATE;
pub use types::StreamDirection;

/// Every dialect in this crate, in registration order.
pub static DIALECTS: &[&DialectDefinition] = &[
    &riscv::DIALECT,
    &riscv_func::DIALECT,
    &riscv_snitch::DIALECT,
    &riscv_snitch::SNITCH_DIALECT,
];

inventory::submit! { riscv::DIALECT }
inventory::submit! { riscv_func::DIALECT }
inventory::submit! { riscv_snitch::DIALECT }
inventory::submit! { riscv_snitch::SNITCH_DIALECT }

/// Add this crate's dialects to `registry`.
pub fn register(registry: &mut Registry) -> IrResult<()> {
    for dialect in DIALECTS {
        registry.register_dialect(dialect)?;
    }
    Ok(())
}

/// Builtin plus this crate's dialects.
pub fn registry() -> IrResult<Registry> {
    let mut registry = Registry::new();
    register(&mut registry)?;
    Ok(registry)
}

/// `OpName` of a static `dialect.name` mnemonic.
pub(crate) fn static_op_name(mnemonic: &'static str) -> OpName {
    let (dialect, name) = mnemonic.split_once('.').unwrap_or(("", mnemonic));
    OpName::new(Symbol::new(dialect), Symbol::new(name))
}

/// Create an op and append it to `block`.
pub(crate) fn append(ctx: &mut IrContext, block: BlockRef, builder: OperationDataBuilder) -> OpRef {
    let op = builder.create(ctx);
    ctx.push_op(block, op);
    op
}

pub(crate) fn builder(mnemonic: &'static str) -> OperationDataBuilder {
    OperationDataBuilder::new(Span::default(), static_op_name(mnemonic))
}

/// Typed wrappers implementing [`sprig_ir::DialectOp`].
macro_rules! dialect_ops {
    ($($(#[$meta:meta])* $name:ident = $mnemonic:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct $name(sprig_ir::OpRef);

            impl sprig_ir::DialectOp for $name {
                const NAME: &'static str = $mnemonic;

                fn wrap(op: sprig_ir::OpRef) -> Self {
                    Self(op)
                }

                fn op_ref(&self) -> sprig_ir::OpRef {
                    self.0
                }
            }
        )*
    };
}
pub(crate) use dialect_ops;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_dialects_match_explicit_registration() {
        let linked = Registry::with_linked_dialects().unwrap();
        let explicit = registry().unwrap();
        for dialect in DIALECTS {
            assert!(linked.dialects().contains(&dialect.name), "{} not linked", dialect.name);
        }
        assert_eq!(linked.ops().len(), explicit.ops().len());
        assert!(linked.lookup("riscv_snitch.scfgwi").is_some());
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = registry().unwrap();
        let err = register(&mut registry).unwrap_err();
        assert_eq!(err.to_string(), "'riscv.get_register' is already registered");
        assert_eq!(registry.dialects(), ["builtin", "riscv", "riscv_func", "riscv_snitch", "snitch"]);
    }
}
