//! Recursive-descent parser for the IR text format.
//!
//! One [`Parser`] handles both syntaxes. The first token of an operation
//! picks the engine: a string literal is the generic form
//! (`"dialect.op"(...)`), a bare identifier is the op's registered custom
//! form. Custom parse routines drive the parser through the public helper
//! methods below, so operands, attributes and regions they build are the
//! same as what the generic engine builds for equivalent text.

mod generic;
mod scope;

use std::mem;

use crate::attribute::Attribute;
use crate::context::{AttributeMap, BlockArgData, BlockData, IrContext, OperationDataBuilder, RegionData};
use crate::dialect::builtin;
use crate::error::{IrError, IrResult};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::location::Span;
use crate::printer::type_to_string;
use crate::refs::{BlockRef, OpRef, RegionRef, TypeRef, ValueDef, ValueRef};
use crate::registry::Registry;
use crate::symbol::{OpName, Symbol};
use crate::types::{FunctionType, IntegerType, builtin_type_from_keyword, is_float_type};

use scope::{Binding, Scope, ScopeStack};

/// An operation under construction. Custom parse routines fill this in;
/// the driver creates the operation from it.
#[derive(Debug)]
pub struct OperationState {
    pub name: OpName,
    pub span: Span,
    pub operands: Vec<ValueRef>,
    pub result_types: Vec<TypeRef>,
    pub attributes: AttributeMap,
    pub regions: Vec<RegionRef>,
}

impl OperationState {
    pub fn new(name: OpName, span: Span) -> Self {
        Self {
            name,
            span,
            operands: Vec::new(),
            result_types: Vec::new(),
            attributes: AttributeMap::new(),
            regions: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, key: &'static str, value: Attribute) {
        self.attributes.insert(Symbol::new(key), value);
    }

    fn into_builder(self) -> OperationDataBuilder {
        OperationDataBuilder::new(self.span, self.name)
            .operands(self.operands)
            .results(self.result_types)
            .attrs(self.attributes)
            .regions(self.regions)
    }
}

/// A `%name` reference whose value has not been looked up yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnresolvedOperand<'a> {
    pub name: &'a str,
    pub span: Span,
}

/// A `%name : type` entry from an argument list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argument<'a> {
    pub name: &'a str,
    pub ty: TypeRef,
    pub span: Span,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token<'a>,
    prev_end: usize,
    registry: &'a Registry,
    ctx: &'a mut IrContext,
    scopes: ScopeStack,
    /// Whether regions parsed now belong to an isolated-from-above op.
    isolating: bool,
}

impl<'a> Parser<'a> {
    pub fn new(registry: &'a Registry, ctx: &'a mut IrContext, src: &'a str) -> IrResult<Self> {
        let mut lexer = Lexer::new(src);
        let token = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            prev_end: 0,
            registry,
            ctx,
            scopes: ScopeStack::default(),
            isolating: false,
        })
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn ctx(&mut self) -> &mut IrContext {
        self.ctx
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    pub fn peek(&self) -> Token<'a> {
        self.token
    }

    pub fn peek_kind(&self) -> TokenKind {
        self.token.kind
    }

    /// The token after the current one.
    pub fn peek_second(&self) -> IrResult<Token<'a>> {
        let mut lexer = self.lexer;
        lexer.next_token()
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.token.kind == kind
    }

    pub fn at_keyword(&self, keyword: &str) -> bool {
        self.token.is_keyword(keyword)
    }

    /// Consume the current token and return it.
    pub fn bump(&mut self) -> IrResult<Token<'a>> {
        let token = self.token;
        if token.kind != TokenKind::Eof {
            self.token = self.lexer.next_token()?;
        }
        self.prev_end = token.span.end;
        Ok(token)
    }

    pub fn expect(&mut self, kind: TokenKind) -> IrResult<Token<'a>> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    pub fn consume_if(&mut self, kind: TokenKind) -> IrResult<bool> {
        if self.at(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> IrResult<Token<'a>> {
        if self.at_keyword(keyword) {
            self.bump()
        } else {
            Err(self.unexpected(format!("'{keyword}'")))
        }
    }

    pub fn consume_keyword(&mut self, keyword: &str) -> IrResult<bool> {
        if self.at_keyword(keyword) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// `UnexpectedToken` error at the current token.
    pub fn unexpected(&self, expected: impl std::fmt::Display) -> IrError {
        IrError::unexpected(expected, self.token.describe(), self.token.span)
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    // ========================================================================
    // Literals
    // ========================================================================

    pub fn parse_integer(&mut self) -> IrResult<(i128, Span)> {
        let token = self.expect(TokenKind::Integer)?;
        Ok((token.int_value()?, token.span))
    }

    pub fn parse_string(&mut self) -> IrResult<String> {
        self.expect(TokenKind::String)?.string_value()
    }

    /// `@name` or `@"name"`, without the sigil.
    pub fn parse_symbol_name(&mut self) -> IrResult<String> {
        self.expect(TokenKind::SymbolRef)?.symbol_value()
    }

    // ========================================================================
    // Values
    // ========================================================================

    pub fn parse_operand(&mut self) -> IrResult<UnresolvedOperand<'a>> {
        let token = self.expect(TokenKind::ValueId)?;
        Ok(UnresolvedOperand {
            name: token.sigil_name(),
            span: token.span,
        })
    }

    /// Zero or more comma-separated operands.
    pub fn parse_operand_list(&mut self) -> IrResult<Vec<UnresolvedOperand<'a>>> {
        let mut operands = Vec::new();
        if !self.at(TokenKind::ValueId) {
            return Ok(operands);
        }
        loop {
            operands.push(self.parse_operand()?);
            if !self.consume_if(TokenKind::Comma)? {
                return Ok(operands);
            }
        }
    }

    /// Resolve an operand whose type the syntax states. A name that is not
    /// defined yet becomes a placeholder of that type.
    pub fn resolve_operand(
        &mut self,
        operand: &UnresolvedOperand<'_>,
        ty: TypeRef,
    ) -> IrResult<ValueRef> {
        if let Some(value) = self.scopes.lookup(operand.name) {
            let found = self.ctx.value_ty(value);
            if found != ty {
                return Err(IrError::type_mismatch(
                    format!("'%{}'", operand.name),
                    self.type_name(ty),
                    self.type_name(found),
                )
                .with_span(operand.span));
            }
            return Ok(value);
        }
        let placeholder = self.ctx.create_forward_ref(ty);
        if !self.scopes.add_pending(operand.name, placeholder, operand.span) {
            return Err(IrError::undefined_value(operand.name, operand.span));
        }
        Ok(placeholder)
    }

    pub fn resolve_operands(
        &mut self,
        operands: &[UnresolvedOperand<'_>],
        types: &[TypeRef],
        span: Span,
    ) -> IrResult<Vec<ValueRef>> {
        if operands.len() != types.len() {
            return Err(IrError::type_mismatch(
                "operand list",
                format!("{} operand(s)", types.len()),
                format!("{} operand(s)", operands.len()),
            )
            .with_span(span));
        }
        operands
            .iter()
            .zip(types)
            .map(|(operand, &ty)| self.resolve_operand(operand, ty))
            .collect()
    }

    /// Resolve an operand whose type the syntax leaves implicit. The value
    /// must already be defined.
    pub fn resolve_operand_untyped(&mut self, operand: &UnresolvedOperand<'_>) -> IrResult<ValueRef> {
        self.scopes
            .lookup(operand.name)
            .ok_or_else(|| IrError::undefined_value(operand.name, operand.span))
    }

    /// Bind `%name` to `value` in the innermost scope. Earlier uses of the
    /// name are resolved when `value` is a block argument; an operation
    /// result never reaches uses that precede it.
    pub fn bind_value(&mut self, name: &str, span: Span, value: ValueRef) -> IrResult<()> {
        match self.scopes.define(name, value) {
            Binding::Fresh => {}
            Binding::Resolved(_, use_span)
                if matches!(self.ctx.value_def(value), ValueDef::OpResult(..)) =>
            {
                // Only later blocks' arguments may be named ahead of time.
                return Err(IrError::undefined_value(name, use_span));
            }
            Binding::Resolved(placeholder, use_span) => {
                let expected = self.ctx.value_ty(placeholder);
                let found = self.ctx.value_ty(value);
                if expected != found {
                    return Err(IrError::type_mismatch(
                        format!("'%{name}'"),
                        self.type_name(expected),
                        self.type_name(found),
                    )
                    .with_span(use_span));
                }
                self.ctx.replace_all_uses(placeholder, value);
            }
            Binding::Redefined => return Err(IrError::redefinition(format!("%{name}"), span)),
            Binding::NoScope => return Err(self.unexpected("operation inside a region")),
        }
        if !name.bytes().all(|b| b.is_ascii_digit()) {
            self.ctx.set_value_name(value, Some(Symbol::from_dynamic(name)));
        }
        Ok(())
    }

    /// `(%a : T, %b : U)`, possibly empty.
    pub fn parse_argument_list(&mut self) -> IrResult<Vec<Argument<'a>>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.consume_if(TokenKind::RParen)? {
            return Ok(args);
        }
        loop {
            let name = self.expect(TokenKind::ValueId)?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            args.push(Argument {
                name: name.sigil_name(),
                ty,
                span: name.span,
            });
            if !self.consume_if(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn parse_type(&mut self) -> IrResult<TypeRef> {
        let token = self.peek();
        match token.kind {
            TokenKind::TypeSigil => {
                self.bump()?;
                let qualified = token.sigil_name();
                let name = OpName::parse(qualified)
                    .ok_or_else(|| IrError::unknown_type(qualified, token.span))?;
                let registry = self.registry;
                let def = registry
                    .lookup_type(name.dialect, name.name)
                    .ok_or_else(|| IrError::unknown_type(qualified, token.span))?;
                let data = (def.parse)(self)?;
                Ok(self.ctx.types.intern(data))
            }
            TokenKind::Ident => {
                let ty = builtin_type_from_keyword(&mut self.ctx.types, token.text)
                    .ok_or_else(|| self.unexpected("type"))?;
                self.bump()?;
                Ok(ty)
            }
            TokenKind::LParen => {
                let fty = self.parse_function_type()?;
                Ok(fty.intern(&mut self.ctx.types))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// One or more comma-separated types.
    pub fn parse_type_list(&mut self) -> IrResult<Vec<TypeRef>> {
        let mut types = vec![self.parse_type()?];
        while self.consume_if(TokenKind::Comma)? {
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    /// `(T, U)`, possibly empty.
    pub fn parse_paren_type_list(&mut self) -> IrResult<Vec<TypeRef>> {
        self.expect(TokenKind::LParen)?;
        if self.consume_if(TokenKind::RParen)? {
            return Ok(Vec::new());
        }
        let types = self.parse_type_list()?;
        self.expect(TokenKind::RParen)?;
        Ok(types)
    }

    /// `(inputs) -> T` or `(inputs) -> (outputs)`.
    pub fn parse_function_type(&mut self) -> IrResult<FunctionType> {
        let inputs = self.parse_paren_type_list()?;
        self.expect(TokenKind::Arrow)?;
        let outputs = if self.at(TokenKind::LParen) {
            self.parse_paren_type_list()?
        } else {
            vec![self.parse_type()?]
        };
        Ok(FunctionType::new(inputs, outputs))
    }

    fn type_name(&self, ty: TypeRef) -> String {
        type_to_string(self.registry, self.ctx, ty)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn parse_attribute(&mut self) -> IrResult<Attribute> {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident if token.text == "true" || token.text == "false" => {
                self.bump()?;
                Ok(Attribute::Bool(token.text == "true"))
            }
            TokenKind::Ident if token.text == "unit" => {
                self.bump()?;
                Ok(Attribute::Unit)
            }
            TokenKind::Integer => {
                self.bump()?;
                let value = token.int_value()?;
                self.parse_integer_suffix(value, token.span)
            }
            TokenKind::Float => {
                self.bump()?;
                let value = token.float_value()?;
                let ty = if self.consume_if(TokenKind::Colon)? {
                    let start = self.peek().span.start;
                    let ty = self.parse_type()?;
                    if !is_float_type(&self.ctx.types, ty) {
                        return Err(IrError::type_mismatch(
                            "float literal",
                            "float type",
                            self.type_name(ty),
                        )
                        .with_span(self.span_from(start)));
                    }
                    ty
                } else {
                    builtin_type_from_keyword(&mut self.ctx.types, "f64")
                        .ok_or_else(|| IrError::unknown_type("builtin.f64", token.span))?
                };
                Ok(Attribute::float(value, ty))
            }
            TokenKind::String => {
                self.bump()?;
                Ok(Attribute::String(token.string_value()?))
            }
            TokenKind::SymbolRef => {
                self.bump()?;
                Ok(Attribute::SymbolRef(Symbol::from_dynamic(
                    &token.symbol_value()?,
                )))
            }
            TokenKind::LBracket => {
                self.bump()?;
                let mut items = Vec::new();
                if !self.consume_if(TokenKind::RBracket)? {
                    loop {
                        items.push(self.parse_attribute()?);
                        if !self.consume_if(TokenKind::Comma)? {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBracket)?;
                }
                Ok(Attribute::Array(items))
            }
            TokenKind::AttrSigil => {
                self.bump()?;
                let name = OpName::parse(token.sigil_name()).ok_or_else(|| {
                    IrError::unexpected("'#dialect.name'", token.describe(), token.span)
                })?;
                let mut params = Vec::new();
                if self.consume_if(TokenKind::Less)? {
                    loop {
                        params.push(self.parse_attribute()?);
                        if !self.consume_if(TokenKind::Comma)? {
                            break;
                        }
                    }
                    self.expect(TokenKind::Greater)?;
                }
                Ok(Attribute::Opaque {
                    dialect: name.dialect,
                    name: name.name,
                    params,
                })
            }
            TokenKind::TypeSigil | TokenKind::LParen | TokenKind::Ident => {
                match self.parse_type() {
                    Ok(ty) => Ok(Attribute::Type(ty)),
                    Err(err) if err.is_unexpected_token() => Err(self.unexpected("attribute")),
                    Err(err) => Err(err),
                }
            }
            _ => Err(self.unexpected("attribute")),
        }
    }

    /// Optional `: type` after an integer literal. Untyped literals are
    /// `i64`; a float type reads the literal as the float's bit pattern.
    fn parse_integer_suffix(&mut self, value: i128, span: Span) -> IrResult<Attribute> {
        if !self.consume_if(TokenKind::Colon)? {
            let ty = IntegerType::signless(64).intern(&mut self.ctx.types);
            return Ok(Attribute::Int { value, ty });
        }
        let ty = self.parse_type()?;
        if IntegerType::from_type(&self.ctx.types, ty).is_some() {
            return Ok(Attribute::Int { value, ty });
        }
        if is_float_type(&self.ctx.types, ty) {
            let bits = u64::try_from(value)
                .map_err(|_| IrError::lex(format!("{value} is not a float bit pattern"), span))?;
            return Ok(Attribute::Float { bits, ty });
        }
        Err(
            IrError::type_mismatch("integer literal", "integer type", self.type_name(ty))
                .with_span(self.span_from(span.start)),
        )
    }

    pub fn parse_optional_attr_dict(&mut self, attrs: &mut AttributeMap) -> IrResult<()> {
        if self.at(TokenKind::LBrace) {
            self.parse_attr_dict(attrs)
        } else {
            Ok(())
        }
    }

    /// `{key = value, "quoted key" = value, flag}`. A key without a value
    /// is `unit`.
    pub fn parse_attr_dict(&mut self, attrs: &mut AttributeMap) -> IrResult<()> {
        self.expect(TokenKind::LBrace)?;
        if self.consume_if(TokenKind::RBrace)? {
            return Ok(());
        }
        loop {
            let key_token = self.peek();
            let key = match key_token.kind {
                TokenKind::String => key_token.string_value()?,
                TokenKind::Ident => key_token.text.to_string(),
                _ => return Err(self.unexpected("attribute name")),
            };
            self.bump()?;
            let value = if self.consume_if(TokenKind::Equal)? {
                self.parse_attribute()?
            } else {
                Attribute::Unit
            };
            if attrs.insert(Symbol::from_dynamic(&key), value).is_some() {
                return Err(IrError::redefinition(key, key_token.span));
            }
            if !self.consume_if(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(())
    }

    // ========================================================================
    // Regions and blocks
    // ========================================================================

    /// `{ ops ^label(args): ops ... }`. `entry_args` become the arguments of
    /// an unlabeled entry block; `{}` is a region with no blocks.
    pub fn parse_region(&mut self, entry_args: &[Argument<'_>]) -> IrResult<RegionRef> {
        let open = self.expect(TokenKind::LBrace)?;
        let isolated = mem::replace(&mut self.isolating, false);
        self.scopes.push(isolated);
        let body = self.parse_region_body(entry_args);
        let scope = self.scopes.pop();
        self.isolating = isolated;
        let blocks = body?;
        check_resolved(&scope)?;
        let span = self.span_from(open.span.start);
        Ok(self.ctx.create_region(RegionData::new(span, blocks)))
    }

    /// Like [`Self::parse_region`], but an empty `{}` still gets its
    /// (empty) block.
    pub fn parse_single_block_region(&mut self, entry_args: &[Argument<'_>]) -> IrResult<RegionRef> {
        let region = self.parse_region(entry_args)?;
        if self.ctx.region(region).blocks.is_empty() {
            let span = self.ctx.region(region).span;
            let block = self.ctx.create_block(BlockData::new(span, vec![]));
            self.ctx.push_block(region, block);
        }
        Ok(region)
    }

    fn parse_region_body(&mut self, entry_args: &[Argument<'_>]) -> IrResult<Vec<BlockRef>> {
        let mut blocks = Vec::new();
        let implicit_entry = !entry_args.is_empty()
            || !matches!(self.peek_kind(), TokenKind::BlockId | TokenKind::RBrace);
        if implicit_entry {
            let block = self.create_block(entry_args, self.token.span)?;
            if !entry_args.is_empty() && self.at(TokenKind::BlockId) {
                // The signature already declared the entry block.
                return Err(self.unexpected("operation"));
            }
            self.parse_block_ops(block)?;
            blocks.push(block);
        }
        while self.at(TokenKind::BlockId) {
            blocks.push(self.parse_labeled_block()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(blocks)
    }

    fn parse_labeled_block(&mut self) -> IrResult<BlockRef> {
        let label = self.expect(TokenKind::BlockId)?;
        let args = if self.at(TokenKind::LParen) {
            self.parse_argument_list()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::Colon)?;
        let block = self.create_block(&args, label.span)?;
        if !self.scopes.define_block(label.sigil_name(), block) {
            return Err(IrError::redefinition(label.text, label.span));
        }
        self.parse_block_ops(block)?;
        Ok(block)
    }

    fn create_block(&mut self, args: &[Argument<'_>], span: Span) -> IrResult<BlockRef> {
        let data = args.iter().map(|arg| BlockArgData::new(arg.ty)).collect();
        let block = self.ctx.create_block(BlockData::new(span, data));
        for (i, arg) in args.iter().enumerate() {
            let value = self.ctx.block_arg(block, i as u32);
            self.bind_value(arg.name, arg.span, value)?;
        }
        Ok(block)
    }

    fn parse_block_ops(&mut self, block: BlockRef) -> IrResult<()> {
        while !matches!(
            self.peek_kind(),
            TokenKind::RBrace | TokenKind::BlockId | TokenKind::Eof
        ) {
            self.parse_operation(block)?;
        }
        Ok(())
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Parse one operation, including its result list, and append it to
    /// `block`.
    pub fn parse_operation(&mut self, block: BlockRef) -> IrResult<OpRef> {
        let start = self.token.span.start;
        let mut result_names = Vec::new();
        if self.at(TokenKind::ValueId) {
            loop {
                result_names.push(self.expect(TokenKind::ValueId)?);
                if !self.consume_if(TokenKind::Comma)? {
                    break;
                }
            }
            self.expect(TokenKind::Equal)?;
        }

        let mut state = match self.peek_kind() {
            TokenKind::String => self.parse_generic_operation()?,
            TokenKind::Ident => self.parse_custom_operation()?,
            _ => return Err(self.unexpected("operation")),
        };
        state.span = self.span_from(start);
        tracing::trace!(op = %state.name, span = %state.span, "parsed operation");

        if !result_names.is_empty() && result_names.len() != state.result_types.len() {
            return Err(IrError::type_mismatch(
                format!("results of '{}'", state.name),
                format!("{} result(s)", state.result_types.len()),
                format!("{} name(s)", result_names.len()),
            )
            .with_span(state.span));
        }

        let op = state.into_builder().create(self.ctx);
        self.ctx.push_op(block, op);
        for (i, name) in result_names.iter().enumerate() {
            let value = self.ctx.op_result(op, i as u32);
            self.bind_value(name.sigil_name(), name.span, value)?;
        }
        Ok(op)
    }

    fn parse_custom_operation(&mut self) -> IrResult<OperationState> {
        let head = self.expect(TokenKind::Ident)?;
        let name = OpName::parse(head.text)
            .ok_or_else(|| IrError::unknown_operation(head.text, head.span))?;
        let registry = self.registry;
        let def = registry
            .lookup_op(name)
            .ok_or_else(|| IrError::unknown_operation(head.text, head.span))?;
        let Some(syntax) = def.syntax else {
            return Err(IrError::unexpected(
                format!("generic form \"{}\"(...)", def.name),
                head.describe(),
                head.span,
            ));
        };

        let mut state = OperationState::new(name, head.span);
        let outer = mem::replace(&mut self.isolating, def.schema.isolated_from_above);
        let parsed = (syntax.parse)(self, &mut state);
        self.isolating = outer;
        parsed?;

        if let Some(terminator) = def.schema.implicit_terminator {
            for &region in &state.regions {
                self.insert_implicit_terminator(region, terminator)?;
            }
        }
        Ok(state)
    }

    /// Append `terminator` to the region's last block unless the block
    /// already ends with it.
    fn insert_implicit_terminator(&mut self, region: RegionRef, terminator: &str) -> IrResult<()> {
        let span = Span::new(self.prev_end, self.prev_end);
        let name = OpName::parse(terminator)
            .ok_or_else(|| IrError::unknown_operation(terminator, span))?;
        let block = match self.ctx.region(region).blocks.last() {
            Some(&block) => block,
            None => {
                let block = self.ctx.create_block(BlockData::new(span, vec![]));
                self.ctx.push_block(region, block);
                block
            }
        };
        let terminated = self
            .ctx
            .block(block)
            .ops
            .last()
            .is_some_and(|&op| self.ctx.op_name(op) == name);
        if !terminated {
            let op = OperationDataBuilder::new(span, name).create(self.ctx);
            self.ctx.push_op(block, op);
        }
        Ok(())
    }

    // ========================================================================
    // Top level
    // ========================================================================

    /// Parse a whole input. A lone `builtin.module` is returned as is;
    /// anything else is wrapped in an implicit module.
    pub fn parse_top_level(&mut self) -> IrResult<OpRef> {
        let start = self.token.span.start;
        let block = self
            .ctx
            .create_block(BlockData::new(Span::new(start, start), vec![]));
        self.scopes.push(true);
        let body = self.parse_block_ops(block);
        let scope = self.scopes.pop();
        body?;
        if !self.at(TokenKind::Eof) {
            return Err(self.unexpected("operation"));
        }
        check_resolved(&scope)?;

        let module = OpName::new(Symbol::new("builtin"), Symbol::new(builtin::MODULE_NAME));
        let ops = self.ctx.block(block).ops.clone();
        if let &[only] = ops.as_slice() {
            if self.ctx.op_name(only) == module {
                self.ctx.remove_op_from_block(block, only);
                return Ok(only);
            }
        }

        let span = Span::new(0, self.lexer.source().len());
        let region = self.ctx.create_region(RegionData::new(span, [block]));
        tracing::debug!(ops = ops.len(), "wrapping top-level operations in an implicit module");
        Ok(OperationDataBuilder::new(span, module)
            .region(region)
            .create(self.ctx))
    }
}

fn check_resolved(scope: &Scope) -> IrResult<()> {
    match scope.first_unresolved() {
        Some((name, span)) => Err(IrError::undefined_value(name, span)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
