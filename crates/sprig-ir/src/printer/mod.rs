//! Text format printer.
//!
//! Prints an operation tree in either syntax. In [`Syntax::Custom`] each
//! registered op with a custom form prints through its hook, provided it
//! satisfies its schema, and everything else falls back to the generic
//! form; [`Syntax::Generic`] prints every op generically. Value names are
//! assigned in one pre-pass over the whole tree, so the output is a pure
//! function of the IR.
//!
//! ```text
//! builtin.module {
//!   %0 = riscv.get_register : !riscv.reg<>
//!   %1 = riscv_snitch.scfgwi %0, 42 : (!riscv.reg<>) -> !riscv.reg<zero>
//! }
//! ```

mod generic;

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::context::{AttributeMap, IrContext};
use crate::refs::{BlockRef, OpRef, RegionRef, TypeRef, ValueRef};
use crate::registry::Registry;
use crate::symbol::Symbol;
use crate::types::{FunctionType, IntegerType, Signedness};
use crate::verifier;

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    #[display("generic")]
    Generic,
    #[default]
    #[display("custom")]
    Custom,
}

/// How a custom printer wants a region laid out.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionOptions {
    /// Print the entry block's label and arguments when it has arguments.
    /// Ops whose syntax declares the entry arguments elsewhere turn this off.
    pub print_entry_block_args: bool,
    /// Terminator left implicit in the custom form.
    pub elide_terminator: Option<&'static str>,
}

impl RegionOptions {
    pub const GENERIC: RegionOptions = RegionOptions {
        print_entry_block_args: true,
        elide_terminator: None,
    };
}

const INDENT: &str = "  ";

/// Names chosen for values and blocks of one printed tree.
#[derive(Default)]
struct Names {
    values: HashMap<ValueRef, String>,
    blocks: HashMap<BlockRef, String>,
    used: HashSet<String>,
    next_value: usize,
    next_block: usize,
}

impl Names {
    fn value(&mut self, ctx: &IrContext, v: ValueRef) -> &str {
        if !self.values.contains_key(&v) {
            let name = match ctx.value_name(v).and_then(usable_hint) {
                Some(base) => {
                    let mut candidate = base.clone();
                    let mut suffix = 1;
                    while self.used.contains(&candidate) {
                        candidate = format!("{base}_{suffix}");
                        suffix += 1;
                    }
                    candidate
                }
                None => loop {
                    let candidate = self.next_value.to_string();
                    self.next_value += 1;
                    if !self.used.contains(&candidate) {
                        break candidate;
                    }
                },
            };
            self.used.insert(name.clone());
            self.values.insert(v, name);
        }
        &self.values[&v]
    }

    fn block(&mut self, b: BlockRef) -> &str {
        let next = &mut self.next_block;
        self.blocks.entry(b).or_insert_with(|| {
            let label = format!("bb{next}");
            *next += 1;
            label
        })
    }

    /// Name every value in `op`'s subtree in print order. Block labels are
    /// named when printed, since only some blocks get one.
    fn assign(&mut self, ctx: &IrContext, op: OpRef) {
        for &v in ctx.op_results(op) {
            self.value(ctx, v);
        }
        for &region in &ctx.op(op).regions {
            for &block in &ctx.region(region).blocks {
                for &arg in ctx.block_args(block) {
                    self.value(ctx, arg);
                }
                for &nested in &ctx.block(block).ops {
                    self.assign(ctx, nested);
                }
            }
        }
    }
}

/// A parsed name hint that can be printed back as `%hint`.
fn usable_hint(hint: Symbol) -> Option<String> {
    hint.with_str(|s| {
        let valid = !s.is_empty()
            && !s.bytes().all(|b| b.is_ascii_digit())
            && s.chars().all(is_suffix_char);
        valid.then(|| s.to_string())
    })
}

fn is_suffix_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.')
}

pub struct Printer<'a> {
    ctx: &'a IrContext,
    registry: &'a Registry,
    syntax: Syntax,
    out: String,
    indent: usize,
    names: Names,
}

impl<'a> Printer<'a> {
    pub fn new(registry: &'a Registry, ctx: &'a IrContext, syntax: Syntax) -> Self {
        Self {
            ctx,
            registry,
            syntax,
            out: String::new(),
            indent: 0,
            names: Names::default(),
        }
    }

    pub fn ctx(&self) -> &'a IrContext {
        self.ctx
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn finish(self) -> String {
        self.out
    }

    /// Name every value and block under `op`, then print it.
    pub fn print_root(&mut self, op: OpRef) -> fmt::Result {
        self.names.assign(self.ctx, op);
        self.print_operation(op)
    }

    pub fn print_operation(&mut self, op: OpRef) -> fmt::Result {
        let ctx = self.ctx;
        self.write_indent();
        let results = ctx.op_results(op);
        if !results.is_empty() {
            self.print_values(results)?;
            self.out.push_str(" = ");
        }

        let name = ctx.op_name(op);
        // Custom hooks only see ops of the shape their syntax describes;
        // anything else prints generically so it still reads back.
        let custom = match self.syntax {
            Syntax::Custom => self.registry.lookup_op(name).and_then(|def| {
                let syntax = def.syntax?;
                verifier::conforms(ctx, op, def).then_some(syntax)
            }),
            Syntax::Generic => None,
        };
        tracing::trace!(op = %name, custom = custom.is_some(), "printing operation");
        match custom {
            Some(syntax) => {
                write!(self, "{name}")?;
                (syntax.print)(self, op)
            }
            None => self.print_generic_operation(op),
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    pub fn print_value(&mut self, v: ValueRef) -> fmt::Result {
        let name = self.names.value(self.ctx, v);
        self.out.push('%');
        self.out.push_str(name);
        Ok(())
    }

    /// Comma-separated values.
    pub fn print_values(&mut self, values: &[ValueRef]) -> fmt::Result {
        for (i, &v) in values.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.print_value(v)?;
        }
        Ok(())
    }

    /// `%a : T, %b : U` for a list of values.
    pub fn print_typed_values(&mut self, values: &[ValueRef]) -> fmt::Result {
        for (i, &v) in values.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.print_value(v)?;
            self.out.push_str(" : ");
            self.print_type(self.ctx.value_ty(v))?;
        }
        Ok(())
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn print_type(&mut self, ty: TypeRef) -> fmt::Result {
        let ctx = self.ctx;
        let data = ctx.types.get(ty);
        if data.dialect == "builtin" {
            if let Some(fty) = FunctionType::from_type(&ctx.types, ty) {
                return self.print_function_type(&fty.inputs, &fty.outputs);
            }
            return write!(self, "{}", data.name);
        }
        write!(self, "!{}.{}", data.dialect, data.name)?;
        let registry = self.registry;
        match registry.lookup_type(data.dialect, data.name) {
            Some(def) => (def.print)(self, data),
            None => self.print_opaque_type_body(ty),
        }
    }

    /// `<params, key = value>` for types without a registered printer.
    fn print_opaque_type_body(&mut self, ty: TypeRef) -> fmt::Result {
        let data = self.ctx.types.get(ty);
        if data.params.is_empty() && data.attrs.is_empty() {
            return Ok(());
        }
        self.out.push('<');
        let mut first = true;
        for &param in &data.params {
            if !first {
                self.out.push_str(", ");
            }
            first = false;
            self.print_type(param)?;
        }
        for (key, value) in &data.attrs {
            if !first {
                self.out.push_str(", ");
            }
            first = false;
            write!(self, "{key} = ")?;
            self.print_attribute(value)?;
        }
        self.out.push('>');
        Ok(())
    }

    /// Comma-separated types.
    pub fn print_types(&mut self, types: &[TypeRef]) -> fmt::Result {
        for (i, &ty) in types.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.print_type(ty)?;
        }
        Ok(())
    }

    /// `(A, B) -> R`. Results are parenthesized unless there is exactly one
    /// that is not itself a function type.
    pub fn print_function_type(&mut self, inputs: &[TypeRef], outputs: &[TypeRef]) -> fmt::Result {
        self.out.push('(');
        self.print_types(inputs)?;
        self.out.push_str(") -> ");
        match outputs {
            [single] if FunctionType::from_type(&self.ctx.types, *single).is_none() => {
                self.print_type(*single)
            }
            _ => {
                self.out.push('(');
                self.print_types(outputs)?;
                self.out.push(')');
                Ok(())
            }
        }
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn print_attribute(&mut self, attr: &Attribute) -> fmt::Result {
        match attr {
            Attribute::Unit => self.write_str("unit"),
            Attribute::Bool(b) => write!(self, "{b}"),
            Attribute::Int { value, ty } => {
                write!(self, "{value}")?;
                let default = IntegerType::from_type(&self.ctx.types, *ty)
                    == Some(IntegerType {
                        width: 64,
                        signedness: Signedness::Signless,
                    });
                if !default {
                    self.out.push_str(" : ");
                    self.print_type(*ty)?;
                }
                Ok(())
            }
            Attribute::Float { bits, ty } => {
                let value = f64::from_bits(*bits);
                let is_f64 = self.ctx.types.get(*ty).is("builtin", "f64");
                if value.is_finite() {
                    let text = format!("{value}");
                    self.out.push_str(&text);
                    if !text.contains(['.', 'e', 'E']) {
                        self.out.push_str(".0");
                    }
                    if is_f64 {
                        return Ok(());
                    }
                } else {
                    // inf and NaN have no literal; print the bit pattern.
                    write!(self, "0x{bits:016X}")?;
                }
                self.out.push_str(" : ");
                self.print_type(*ty)
            }
            Attribute::String(s) => self.print_string_literal(s),
            Attribute::SymbolRef(sym) => sym.with_str(|s| self.print_symbol_name(s)),
            Attribute::Type(ty) => self.print_type(*ty),
            Attribute::Array(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.print_attribute(item)?;
                }
                self.out.push(']');
                Ok(())
            }
            Attribute::Opaque {
                dialect,
                name,
                params,
            } => {
                write!(self, "#{dialect}.{name}")?;
                if !params.is_empty() {
                    self.out.push('<');
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.print_attribute(param)?;
                    }
                    self.out.push('>');
                }
                Ok(())
            }
        }
    }

    /// ` {"key" = value, ...}` with a leading space, skipping `elided` keys.
    /// Prints nothing when no attribute is left.
    pub fn print_attr_dict(&mut self, attrs: &AttributeMap, elided: &[&str]) -> fmt::Result {
        let mut first = true;
        for (key, value) in attrs {
            if key.with_str(|k| elided.contains(&k)) {
                continue;
            }
            self.out.push_str(if first { " {" } else { ", " });
            first = false;
            key.with_str(|k| self.print_string_literal(k))?;
            self.out.push_str(" = ");
            self.print_attribute(value)?;
        }
        if !first {
            self.out.push('}');
        }
        Ok(())
    }

    pub fn print_string_literal(&mut self, s: &str) -> fmt::Result {
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '\\' => self.out.push_str("\\\\"),
                '"' => self.out.push_str("\\\""),
                '\n' => self.out.push_str("\\n"),
                '\t' => self.out.push_str("\\t"),
                '\r' => self.out.push_str("\\r"),
                '\0' => self.out.push_str("\\0"),
                c if c.is_control() => write!(self.out, "\\x{:02x}", c as u32)?,
                c => self.out.push(c),
            }
        }
        self.out.push('"');
        Ok(())
    }

    /// `@name`, quoted when the name is not a plain identifier.
    pub fn print_symbol_name(&mut self, name: &str) -> fmt::Result {
        self.out.push('@');
        if !name.is_empty() && name.chars().all(is_suffix_char) {
            self.out.push_str(name);
            Ok(())
        } else {
            self.print_string_literal(name)
        }
    }

    // ========================================================================
    // Regions
    // ========================================================================

    pub fn print_region(&mut self, region: RegionRef, options: RegionOptions) -> fmt::Result {
        let ctx = self.ctx;
        let blocks = &ctx.region(region).blocks;
        self.out.push_str("{\n");
        for (i, &block) in blocks.iter().enumerate() {
            let ops = printed_ops(ctx, block, options.elide_terminator);
            let args = ctx.block_args(block);
            let labeled = if i == 0 {
                // An unlabeled empty entry block would vanish on re-parse.
                if options.print_entry_block_args {
                    !args.is_empty() || ops.is_empty()
                } else {
                    args.is_empty() && ops.is_empty() && blocks.len() > 1
                }
            } else {
                true
            };
            if labeled {
                self.write_indent();
                let label = self.names.block(block).to_string();
                write!(self, "^{label}")?;
                if !args.is_empty() {
                    self.out.push('(');
                    self.print_typed_values(args)?;
                    self.out.push(')');
                }
                self.out.push_str(":\n");
            }
            self.indent += 1;
            for &op in ops {
                self.print_operation(op)?;
                self.out.push('\n');
            }
            self.indent -= 1;
        }
        self.write_indent();
        self.out.push('}');
        Ok(())
    }
}

impl Write for Printer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.push_str(s);
        Ok(())
    }
}

/// The block's ops minus a trailing terminator that custom syntax leaves
/// implicit. Only a bare terminator is dropped; one carrying operands,
/// results, attributes or regions has to stay visible.
fn printed_ops<'c>(ctx: &'c IrContext, block: BlockRef, elide: Option<&str>) -> &'c [OpRef] {
    let ops = ctx.block(block).ops.as_slice();
    let Some(terminator) = elide else {
        return ops;
    };
    match ops.split_last() {
        Some((&last, rest))
            if ctx.op_name(last).is(terminator)
                && ctx.op_operands(last).is_empty()
                && ctx.op_results(last).is_empty()
                && ctx.op(last).attributes.is_empty()
                && ctx.op(last).regions.is_empty() =>
        {
            rest
        }
        _ => ops,
    }
}

/// Render a single type, for diagnostics.
pub fn type_to_string(registry: &Registry, ctx: &IrContext, ty: TypeRef) -> String {
    let mut printer = Printer::new(registry, ctx, Syntax::Custom);
    printer
        .print_type(ty)
        .expect("fmt::Write to String never fails");
    printer.finish()
}

/// Render a single attribute, for diagnostics.
pub fn attribute_to_string(registry: &Registry, ctx: &IrContext, attr: &Attribute) -> String {
    let mut printer = Printer::new(registry, ctx, Syntax::Custom);
    printer
        .print_attribute(attr)
        .expect("fmt::Write to String never fails");
    printer.finish()
}

/// Print one operation tree.
pub fn print_op(registry: &Registry, ctx: &IrContext, op: OpRef, syntax: Syntax) -> String {
    let mut printer = Printer::new(registry, ctx, syntax);
    printer
        .print_root(op)
        .expect("fmt::Write to String never fails");
    printer.finish()
}
