//! Generic operation syntax:
//!
//! ```text
//! "dialect.op"(%a, %b) ({ region }, { region }) {"key" = value} : (A, B) -> R
//! ```
//!
//! Every registered operation can be written this way, whether or not it
//! has a custom form.

use std::mem;

use crate::error::{IrError, IrResult};
use crate::lexer::TokenKind;
use crate::refs::RegionRef;
use crate::symbol::OpName;

use super::{OperationState, Parser};

impl Parser<'_> {
    pub(super) fn parse_generic_operation(&mut self) -> IrResult<OperationState> {
        let head = self.expect(TokenKind::String)?;
        let mnemonic = head.string_value()?;
        let name = OpName::parse(&mnemonic)
            .ok_or_else(|| IrError::unknown_operation(&mnemonic, head.span))?;
        let registry = self.registry;
        let def = registry
            .lookup_op(name)
            .ok_or_else(|| IrError::unknown_operation(&mnemonic, head.span))?;
        let mut state = OperationState::new(name, head.span);

        self.expect(TokenKind::LParen)?;
        let operands = self.parse_operand_list()?;
        self.expect(TokenKind::RParen)?;

        if self.consume_if(TokenKind::LParen)? {
            let outer = mem::replace(&mut self.isolating, def.schema.isolated_from_above);
            let regions = self.parse_region_list();
            self.isolating = outer;
            state.regions = regions?;
            self.expect(TokenKind::RParen)?;
        }

        self.parse_optional_attr_dict(&mut state.attributes)?;

        self.expect(TokenKind::Colon)?;
        let signature_start = self.peek().span.start;
        let signature = self.parse_function_type()?;
        let signature_span = self.span_from(signature_start);
        state.operands = self.resolve_operands(&operands, &signature.inputs, signature_span)?;
        state.result_types = signature.outputs;
        Ok(state)
    }

    fn parse_region_list(&mut self) -> IrResult<Vec<RegionRef>> {
        let mut regions = Vec::new();
        loop {
            regions.push(self.parse_region(&[])?);
            if !self.consume_if(TokenKind::Comma)? {
                return Ok(regions);
            }
        }
    }
}
