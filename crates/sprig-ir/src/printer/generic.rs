//! Generic operation syntax, the inverse of `parser::generic`.

use std::fmt::{self, Write};

use smallvec::SmallVec;

use crate::refs::{OpRef, TypeRef};

use super::{Printer, RegionOptions};

impl Printer<'_> {
    /// `"dialect.op"(%a) ({...}) {"key" = value} : (A) -> R`
    pub fn print_generic_operation(&mut self, op: OpRef) -> fmt::Result {
        let ctx = self.ctx;
        let data = ctx.op(op);
        self.print_string_literal(&data.op_name().to_string())?;
        self.write_char('(')?;
        self.print_values(ctx.op_operands(op))?;
        self.write_char(')')?;

        if !data.regions.is_empty() {
            self.write_str(" (")?;
            for (i, &region) in data.regions.iter().enumerate() {
                if i > 0 {
                    self.write_str(", ")?;
                }
                self.print_region(region, RegionOptions::GENERIC)?;
            }
            self.write_char(')')?;
        }

        self.print_attr_dict(&data.attributes, &[])?;

        self.write_str(" : ")?;
        let inputs: SmallVec<[TypeRef; 4]> = ctx
            .op_operands(op)
            .iter()
            .map(|&v| ctx.value_ty(v))
            .collect();
        self.print_function_type(&inputs, ctx.op_result_types(op))
    }
}
