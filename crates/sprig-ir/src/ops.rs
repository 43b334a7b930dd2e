//! Typed operation wrappers.
//!
//! Dialects wrap an `OpRef` in a small `Copy` struct per operation and
//! implement [`DialectOp`] for it, so verifiers and builders can match and
//! read operations without string comparisons scattered around.

use crate::context::IrContext;
use crate::refs::OpRef;

pub trait DialectOp: Sized + Copy {
    /// Full mnemonic, `dialect.name`.
    const NAME: &'static str;

    fn wrap(op: OpRef) -> Self;

    fn op_ref(&self) -> OpRef;

    fn matches(ctx: &IrContext, op: OpRef) -> bool {
        ctx.op_name(op).is(Self::NAME)
    }

    fn from_op(ctx: &IrContext, op: OpRef) -> Option<Self> {
        Self::matches(ctx, op).then(|| Self::wrap(op))
    }
}
