//! Structural and schema verification.
//!
//! Operations are checked bottom-up: an op is only checked once everything
//! nested in it verified, so one failure is reported once rather than again
//! for each enclosing op. Schema checks run first, then visibility of
//! operands, then the op's own hook.

use cranelift_entity::SecondaryMap;
use serde::{Deserialize, Serialize};

use crate::context::IrContext;
use crate::error::IrError;
use crate::refs::{BlockRef, OpRef, RegionRef, ValueDef, ValueRef};
use crate::registry::{OpDefinition, Registry};
use crate::schema::check_values;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyMode {
    /// Stop at the first error.
    #[default]
    FailFast,
    /// Keep checking independent siblings and report every error.
    Accumulate,
}

/// Verify `op` and everything nested in it.
pub fn verify_op(
    registry: &Registry,
    ctx: &IrContext,
    op: OpRef,
    mode: VerifyMode,
) -> Result<(), Vec<IrError>> {
    let mut verifier = Verifier {
        registry,
        ctx,
        mode,
        errors: Vec::new(),
        order: Order::of(ctx, op),
    };
    verifier.visit(op);
    if verifier.errors.is_empty() {
        Ok(())
    } else {
        Err(verifier.errors)
    }
}

struct Verifier<'a> {
    registry: &'a Registry,
    ctx: &'a IrContext,
    mode: VerifyMode,
    errors: Vec<IrError>,
    order: Order,
}

/// Positions of ops within their block and of blocks within their region.
#[derive(Default)]
struct Order {
    ops: SecondaryMap<OpRef, u32>,
    blocks: SecondaryMap<BlockRef, u32>,
}

impl Order {
    /// Index everything nested in `root` and every region enclosing it.
    fn of(ctx: &IrContext, root: OpRef) -> Self {
        let mut order = Order::default();
        let mut current = root;
        while let Some(block) = ctx.op(current).parent_block {
            let Some(region) = ctx.block(block).parent_region else {
                order.index_block(ctx, block);
                break;
            };
            order.index_region(ctx, region);
            let Some(parent) = ctx.region(region).parent_op else {
                break;
            };
            current = parent;
        }
        order.index_nested(ctx, root);
        order
    }

    fn index_nested(&mut self, ctx: &IrContext, op: OpRef) {
        for &region in &ctx.op(op).regions {
            self.index_region(ctx, region);
            for &block in &ctx.region(region).blocks {
                for &nested in &ctx.block(block).ops {
                    self.index_nested(ctx, nested);
                }
            }
        }
    }

    fn index_region(&mut self, ctx: &IrContext, region: RegionRef) {
        for (i, &block) in ctx.region(region).blocks.iter().enumerate() {
            self.blocks[block] = i as u32;
            self.index_block(ctx, block);
        }
    }

    fn index_block(&mut self, ctx: &IrContext, block: BlockRef) {
        for (i, &op) in ctx.block(block).ops.iter().enumerate() {
            self.ops[op] = i as u32;
        }
    }
}

impl Verifier<'_> {
    /// Returns whether the subtree rooted at `op` verified.
    fn visit(&mut self, op: OpRef) -> bool {
        let ctx = self.ctx;
        let mut nested_ok = true;
        for &region in &ctx.op(op).regions {
            for &block in &ctx.region(region).blocks {
                for &nested in &ctx.block(block).ops {
                    if !self.visit(nested) {
                        nested_ok = false;
                        if self.mode == VerifyMode::FailFast {
                            return false;
                        }
                    }
                }
            }
        }
        if !nested_ok {
            return false;
        }
        match self.check(op) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "verification failed");
                self.errors.push(err);
                false
            }
        }
    }

    fn check(&self, op: OpRef) -> Result<(), IrError> {
        let ctx = self.ctx;
        let data = ctx.op(op);
        let name = data.op_name();
        let def = self
            .registry
            .lookup_op(name)
            .ok_or_else(|| IrError::unknown_operation(name, data.span))?;
        let fail = |message: String| IrError::verification(name, message).with_span(data.span);

        check_schema(ctx, op, def).map_err(fail)?;
        self.check_operands_visible(op).map_err(fail)?;
        if let Some(verify) = def.verify {
            verify(ctx, op).map_err(fail)?;
        }
        Ok(())
    }

    fn check_operands_visible(&self, op: OpRef) -> Result<(), String> {
        for (i, &v) in self.ctx.op_operands(op).iter().enumerate() {
            self.check_visible(op, v)
                .map_err(|why| format!("operand #{i} {why}"))?;
        }
        Ok(())
    }

    /// A value is visible to `user` when it is defined earlier in one of
    /// the blocks enclosing `user`, or in an earlier block of a region
    /// enclosing it, without crossing an isolated-from-above op on the way
    /// out. Regions have no branches, so block order is dominance order.
    fn check_visible(&self, user: OpRef, v: ValueRef) -> Result<(), String> {
        let ctx = self.ctx;
        let (def_block, def_op) = match ctx.value_def(v) {
            ValueDef::ForwardRef => return Err("refers to a value that is never defined".into()),
            ValueDef::BlockArg(block, _) => (block, None),
            ValueDef::OpResult(def_op, _) => match ctx.op(def_op).parent_block {
                Some(block) => (block, Some(def_op)),
                None => return Err("is defined by a detached operation".into()),
            },
        };
        let def_region = ctx.block(def_block).parent_region;

        let mut current = user;
        loop {
            let Some(block) = ctx.op(current).parent_block else {
                return Err("is not visible from here".into());
            };
            if block == def_block {
                let Some(def_op) = def_op else {
                    return Ok(());
                };
                return if self.order.ops[def_op] < self.order.ops[current] {
                    Ok(())
                } else {
                    Err("is used before its definition".into())
                };
            }
            let Some(region) = ctx.block(block).parent_region else {
                return Err("is not visible from here".into());
            };
            if def_region == Some(region) {
                return if self.order.blocks[def_block] < self.order.blocks[block] {
                    Ok(())
                } else {
                    Err("is defined in a later block".into())
                };
            }
            let Some(parent) = ctx.region(region).parent_op else {
                return Err("is not visible from here".into());
            };
            let isolated = self
                .registry
                .lookup_op(ctx.op_name(parent))
                .is_some_and(|def| def.schema.isolated_from_above);
            if isolated {
                return Err(format!(
                    "is captured from outside isolated '{}'",
                    ctx.op_name(parent)
                ));
            }
            current = parent;
        }
    }
}

/// Whether `op` satisfies its own schema and verifier hook, ignoring
/// where its operands come from. Custom printers may rely on this.
pub(crate) fn conforms(ctx: &IrContext, op: OpRef, def: &OpDefinition) -> bool {
    check_schema(ctx, op, def).is_ok() && def.verify.is_none_or(|verify| verify(ctx, op).is_ok())
}

fn check_schema(ctx: &IrContext, op: OpRef, def: &OpDefinition) -> Result<(), String> {
    let data = ctx.op(op);
    let schema = &def.schema;

    let operand_types: Vec<_> = ctx
        .op_operands(op)
        .iter()
        .map(|&v| ctx.value_ty(v))
        .collect();
    check_values(ctx, "operand", schema.operands, &operand_types)?;
    check_values(ctx, "result", schema.results, ctx.op_result_types(op))?;

    for attr in schema.attributes {
        match data
            .attributes
            .iter()
            .find(|(key, _)| **key == attr.name)
        {
            Some((_, value)) => attr
                .kind
                .check(ctx, value)
                .map_err(|msg| format!("attribute '{}' {msg}", attr.name))?,
            None if attr.optional => {}
            None => return Err(format!("missing required attribute '{}'", attr.name)),
        }
    }

    if data.regions.len() != schema.regions.len() {
        return Err(format!(
            "expected {} region(s), found {}",
            schema.regions.len(),
            data.regions.len()
        ));
    }
    for (&region, region_def) in data.regions.iter().zip(schema.regions) {
        let blocks = &ctx.region(region).blocks;
        if region_def.single_block && blocks.len() != 1 {
            return Err(format!(
                "region '{}' must have exactly one block, found {}",
                region_def.name,
                blocks.len()
            ));
        }
        if let Some(allowed) = region_def.terminators {
            for &block in blocks {
                check_terminator(ctx, block, region_def.name, allowed)?;
            }
        }
    }

    if schema.is_terminator {
        let last = data
            .parent_block
            .and_then(|block| ctx.block(block).ops.last().copied());
        if last.is_some_and(|last| last != op) {
            return Err("terminator must be the last operation in its block".to_string());
        }
    }
    Ok(())
}

fn check_terminator(
    ctx: &IrContext,
    block: BlockRef,
    region: &str,
    allowed: &[&str],
) -> Result<(), String> {
    let expected = allowed.join("' or '");
    match ctx.block(block).ops.last() {
        Some(&last) if allowed.iter().any(|t| ctx.op_name(last).is(t)) => Ok(()),
        Some(&last) => Err(format!(
            "region '{region}' must end with '{expected}', found '{}'",
            ctx.op_name(last)
        )),
        None => Err(format!(
            "region '{region}' must end with '{expected}', found an empty block"
        )),
    }
}
