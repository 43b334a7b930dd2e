//! Whole-module entry points: parse, print, verify, compare.

use crate::context::{BlockData, IrContext, OperationDataBuilder, RegionData};
use crate::dialect::builtin;
use crate::equivalence::{self, StructuralDiff};
use crate::error::{IrError, IrResult};
use crate::location::Span;
use crate::parser::Parser;
use crate::printer::{Syntax, print_op};
use crate::refs::{BlockRef, OpRef};
use crate::registry::Registry;
use crate::symbol::{OpName, Symbol};
use crate::verifier::{VerifyMode, verify_op};

/// A `builtin.module` together with the context that owns it.
pub struct Module {
    ctx: IrContext,
    root: OpRef,
}

impl Module {
    pub fn from_parts(ctx: IrContext, root: OpRef) -> Self {
        Self { ctx, root }
    }

    /// An empty `builtin.module` with a single empty body block.
    pub fn empty() -> Self {
        let mut ctx = IrContext::new();
        let block = ctx.create_block(BlockData::new(Span::default(), vec![]));
        let region = ctx.create_region(RegionData::new(Span::default(), [block]));
        let name = OpName::new(
            Symbol::new(builtin::DIALECT_NAME),
            Symbol::new(builtin::MODULE_NAME),
        );
        let root = OperationDataBuilder::new(Span::default(), name)
            .region(region)
            .create(&mut ctx);
        Self { ctx, root }
    }

    pub fn ctx(&self) -> &IrContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut IrContext {
        &mut self.ctx
    }

    pub fn root(&self) -> OpRef {
        self.root
    }

    /// First block of the module body.
    pub fn body(&self) -> Option<BlockRef> {
        let region = *self.ctx.op(self.root).regions.first()?;
        self.ctx.region(region).blocks.first().copied()
    }

    /// Top-level operations of the module body.
    pub fn ops(&self) -> &[OpRef] {
        match self.body() {
            Some(block) => &self.ctx.block(block).ops,
            None => &[],
        }
    }

    pub fn sym_name(&self) -> Option<&str> {
        self.ctx
            .op(self.root)
            .attributes
            .get(&Symbol::new(builtin::SYM_NAME))
            .and_then(|attr| attr.as_str())
    }

    pub fn structurally_eq(&self, other: &Module) -> bool {
        equivalence::structurally_eq(&self.ctx, self.root, &other.ctx, other.root)
    }

    pub fn structural_diff(&self, other: &Module) -> Option<StructuralDiff> {
        equivalence::structural_diff(&self.ctx, self.root, &other.ctx, other.root)
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("root", &self.root)
            .field("sym_name", &self.sym_name())
            .field("ops", &self.ops().len())
            .finish()
    }
}

/// Parse and verify a module. Fails with the first error; nothing of a
/// failed parse is kept.
pub fn parse_module(registry: &Registry, src: &str) -> IrResult<Module> {
    let module = parse_module_unverified(registry, src)?;
    verify_module(registry, &module, VerifyMode::FailFast).map_err(first_error)?;
    Ok(module)
}

/// Parse a module without running the verifier.
pub fn parse_module_unverified(registry: &Registry, src: &str) -> IrResult<Module> {
    let mut ctx = IrContext::new();
    let root = Parser::new(registry, &mut ctx, src)?.parse_top_level()?;
    tracing::debug!(ops = ctx.op_count(), "parsed module");
    Ok(Module { ctx, root })
}

/// Print a module followed by a newline.
pub fn print_module(registry: &Registry, module: &Module, syntax: Syntax) -> String {
    let mut text = print_op(registry, &module.ctx, module.root, syntax);
    text.push('\n');
    text
}

pub fn verify_module(
    registry: &Registry,
    module: &Module,
    mode: VerifyMode,
) -> Result<(), Vec<IrError>> {
    verify_op(registry, &module.ctx, module.root, mode)
}

fn first_error(errors: Vec<IrError>) -> IrError {
    errors
        .into_iter()
        .next()
        .unwrap_or_else(|| IrError::verification("builtin.module", "verification failed"))
}
