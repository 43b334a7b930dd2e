//! Structural equality of operation trees, possibly across contexts.
//!
//! Two trees are equal when they have the same shape, op names, types and
//! attributes, and their values correspond one-to-one: value names, spans
//! and attribute order do not matter. This is the equality the round-trip
//! contract is stated in.

use std::collections::HashMap;

use derive_more::Display;

use crate::attribute::Attribute;
use crate::context::IrContext;
use crate::refs::{OpRef, TypeRef, ValueRef};

/// The first place two trees disagree.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display("{path}: {message}")]
pub struct StructuralDiff {
    /// Location in the left tree, e.g. `builtin.module/0.0.2(riscv.add)`.
    pub path: String,
    pub message: String,
}

pub fn structurally_eq(a_ctx: &IrContext, a: OpRef, b_ctx: &IrContext, b: OpRef) -> bool {
    structural_diff(a_ctx, a, b_ctx, b).is_none()
}

pub fn structural_diff(
    a_ctx: &IrContext,
    a: OpRef,
    b_ctx: &IrContext,
    b: OpRef,
) -> Option<StructuralDiff> {
    let mut cmp = Comparison {
        a: a_ctx,
        b: b_ctx,
        values: HashMap::new(),
    };
    let root = a_ctx.op_name(a).to_string();
    // Bind every definition first so uses in later blocks of a region
    // resolve no matter where their definition sits.
    cmp.bind(a, b, &root)
        .and_then(|()| cmp.compare(a, b, &root))
        .err()
}

struct Comparison<'a> {
    a: &'a IrContext,
    b: &'a IrContext,
    values: HashMap<ValueRef, ValueRef>,
}

type Compared = Result<(), StructuralDiff>;

fn differ(path: &str, message: impl Into<String>) -> Compared {
    Err(StructuralDiff {
        path: path.to_string(),
        message: message.into(),
    })
}

fn child_path(path: &str, region: usize, block: usize, op: usize, name: impl std::fmt::Display) -> String {
    format!("{path}/{region}.{block}.{op}({name})")
}

impl Comparison<'_> {
    fn bind(&mut self, a: OpRef, b: OpRef, path: &str) -> Compared {
        let (a_ctx, b_ctx) = (self.a, self.b);
        if a_ctx.op_name(a) != b_ctx.op_name(b) {
            return differ(
                path,
                format!("operation '{}' vs '{}'", a_ctx.op_name(a), b_ctx.op_name(b)),
            );
        }
        let (a_results, b_results) = (a_ctx.op_results(a), b_ctx.op_results(b));
        if a_results.len() != b_results.len() {
            return differ(
                path,
                format!("{} result(s) vs {}", a_results.len(), b_results.len()),
            );
        }
        self.values.extend(a_results.iter().copied().zip(b_results.iter().copied()));

        let (a_regions, b_regions) = (&a_ctx.op(a).regions, &b_ctx.op(b).regions);
        if a_regions.len() != b_regions.len() {
            return differ(
                path,
                format!("{} region(s) vs {}", a_regions.len(), b_regions.len()),
            );
        }
        for (r, (&ar, &br)) in a_regions.iter().zip(b_regions).enumerate() {
            let (a_blocks, b_blocks) = (&a_ctx.region(ar).blocks, &b_ctx.region(br).blocks);
            if a_blocks.len() != b_blocks.len() {
                return differ(
                    path,
                    format!("region #{r}: {} block(s) vs {}", a_blocks.len(), b_blocks.len()),
                );
            }
            for (bi, (&ab, &bb)) in a_blocks.iter().zip(b_blocks).enumerate() {
                let (a_args, b_args) = (a_ctx.block_args(ab), b_ctx.block_args(bb));
                if a_args.len() != b_args.len() {
                    return differ(
                        path,
                        format!(
                            "block {r}.{bi}: {} argument(s) vs {}",
                            a_args.len(),
                            b_args.len()
                        ),
                    );
                }
                self.values.extend(a_args.iter().copied().zip(b_args.iter().copied()));

                let (a_ops, b_ops) = (&a_ctx.block(ab).ops, &b_ctx.block(bb).ops);
                if a_ops.len() != b_ops.len() {
                    return differ(
                        path,
                        format!("block {r}.{bi}: {} op(s) vs {}", a_ops.len(), b_ops.len()),
                    );
                }
                for (oi, (&ao, &bo)) in a_ops.iter().zip(b_ops).enumerate() {
                    let nested = child_path(path, r, bi, oi, a_ctx.op_name(ao));
                    self.bind(ao, bo, &nested)?;
                }
            }
        }
        Ok(())
    }

    fn compare(&self, a: OpRef, b: OpRef, path: &str) -> Compared {
        let (a_ctx, b_ctx) = (self.a, self.b);

        let (a_operands, b_operands) = (a_ctx.op_operands(a), b_ctx.op_operands(b));
        if a_operands.len() != b_operands.len() {
            return differ(
                path,
                format!("{} operand(s) vs {}", a_operands.len(), b_operands.len()),
            );
        }
        for (i, (&av, &bv)) in a_operands.iter().zip(b_operands).enumerate() {
            if self.values.get(&av) != Some(&bv) {
                return differ(path, format!("operand #{i} refers to a different value"));
            }
            if !self.type_eq(a_ctx.value_ty(av), b_ctx.value_ty(bv)) {
                return differ(path, format!("operand #{i} has a different type"));
            }
        }

        let (a_types, b_types) = (a_ctx.op_result_types(a), b_ctx.op_result_types(b));
        for (i, (&at, &bt)) in a_types.iter().zip(b_types).enumerate() {
            if !self.type_eq(at, bt) {
                return differ(path, format!("result #{i} has a different type"));
            }
        }

        let (a_attrs, b_attrs) = (&a_ctx.op(a).attributes, &b_ctx.op(b).attributes);
        for (key, value) in a_attrs {
            match b_attrs.get(key) {
                Some(other) if self.attr_eq(value, other) => {}
                Some(_) => return differ(path, format!("attribute '{key}' differs")),
                None => return differ(path, format!("attribute '{key}' is missing on the right")),
            }
        }
        if let Some(key) = b_attrs.keys().find(|key| !a_attrs.contains_key(*key)) {
            return differ(path, format!("attribute '{key}' is missing on the left"));
        }

        for (r, (&ar, &br)) in a_ctx.op(a).regions.iter().zip(&b_ctx.op(b).regions).enumerate() {
            let blocks = a_ctx.region(ar).blocks.iter().zip(&b_ctx.region(br).blocks);
            for (bi, (&ab, &bb)) in blocks.enumerate() {
                let args = a_ctx.block_args(ab).iter().zip(b_ctx.block_args(bb));
                for (i, (&av, &bv)) in args.enumerate() {
                    if !self.type_eq(a_ctx.value_ty(av), b_ctx.value_ty(bv)) {
                        return differ(
                            path,
                            format!("block {r}.{bi}: argument #{i} has a different type"),
                        );
                    }
                }
                let ops = a_ctx.block(ab).ops.iter().zip(&b_ctx.block(bb).ops);
                for (oi, (&ao, &bo)) in ops.enumerate() {
                    let nested = child_path(path, r, bi, oi, a_ctx.op_name(ao));
                    self.compare(ao, bo, &nested)?;
                }
            }
        }
        Ok(())
    }

    fn type_eq(&self, a: TypeRef, b: TypeRef) -> bool {
        let (da, db) = (self.a.types.get(a), self.b.types.get(b));
        da.dialect == db.dialect
            && da.name == db.name
            && da.params.len() == db.params.len()
            && da
                .params
                .iter()
                .zip(&db.params)
                .all(|(&pa, &pb)| self.type_eq(pa, pb))
            && da.attrs.len() == db.attrs.len()
            && da
                .attrs
                .iter()
                .zip(&db.attrs)
                .all(|((ka, va), (kb, vb))| ka == kb && self.attr_eq(va, vb))
    }

    fn attr_eq(&self, a: &Attribute, b: &Attribute) -> bool {
        match (a, b) {
            (Attribute::Int { value: va, ty: ta }, Attribute::Int { value: vb, ty: tb }) => {
                va == vb && self.type_eq(*ta, *tb)
            }
            (Attribute::Float { bits: ba, ty: ta }, Attribute::Float { bits: bb, ty: tb }) => {
                ba == bb && self.type_eq(*ta, *tb)
            }
            (Attribute::Type(ta), Attribute::Type(tb)) => self.type_eq(*ta, *tb),
            (Attribute::Array(xs), Attribute::Array(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.attr_eq(x, y))
            }
            (
                Attribute::Opaque {
                    dialect: da,
                    name: na,
                    params: pa,
                },
                Attribute::Opaque {
                    dialect: db,
                    name: nb,
                    params: pb,
                },
            ) => {
                da == db
                    && na == nb
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| self.attr_eq(x, y))
            }
            _ => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::registry::Registry;

    fn parse(registry: &Registry, src: &str) -> (IrContext, OpRef) {
        let mut ctx = IrContext::new();
        let root = Parser::new(registry, &mut ctx, src)
            .unwrap()
            .parse_top_level()
            .unwrap();
        (ctx, root)
    }

    fn diff(a: &str, b: &str) -> Option<StructuralDiff> {
        let registry = Registry::new();
        let (a_ctx, a_root) = parse(&registry, a);
        let (b_ctx, b_root) = parse(&registry, b);
        structural_diff(&a_ctx, a_root, &b_ctx, b_root)
    }

    #[test]
    fn names_and_attribute_order_do_not_matter() {
        assert_eq!(
            diff(
                r#"builtin.module @m attributes {a = 1, b = "x"} {}"#,
                r#""builtin.module"() ({^bb0:}) {"b" = "x", "sym_name" = "m", "a" = 1 : i64} : () -> ()"#,
            ),
            None
        );
    }

    #[test]
    fn attribute_type_matters() {
        let found = diff(
            "builtin.module attributes {a = 1 : si12} {}",
            "builtin.module attributes {a = 1 : i12} {}",
        )
        .unwrap();
        assert_eq!(found.to_string(), "builtin.module: attribute 'a' differs");
    }

    #[test]
    fn missing_attribute_is_reported() {
        let found = diff("builtin.module {}", "builtin.module @m {}").unwrap();
        assert_eq!(found.message, "attribute 'sym_name' is missing on the left");
    }

    #[test]
    fn nested_path_points_at_mismatch() {
        let found = diff(
            "builtin.module {\n  builtin.module {}\n  builtin.module {}\n}",
            "builtin.module {\n  builtin.module {}\n  builtin.module @x {}\n}",
        )
        .unwrap();
        assert_eq!(found.path, "builtin.module/0.0.1(builtin.module)");
    }

    #[test]
    fn block_count_matters() {
        let found = diff(
            r#""builtin.module"() ({}) : () -> ()"#,
            "builtin.module {}",
        )
        .unwrap();
        assert_eq!(found.message, "region #0: 0 block(s) vs 1");
    }
}
