//! Value and block-label scopes for region parsing.
//!
//! Every region opens a scope that all of its blocks share. Lookup walks
//! outwards until it has searched an isolated scope. Names used before
//! their definition get a typed placeholder in the innermost scope. Only a
//! later block's argument may resolve it; a placeholder claimed by an
//! operation result, or still pending when its scope closes, is an
//! undefined value.

use std::collections::HashMap;

use crate::location::Span;
use crate::refs::{BlockRef, ValueRef};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Pending {
    pub value: ValueRef,
    pub span: Span,
}

#[derive(Debug, Default)]
pub(crate) struct Scope {
    values: HashMap<String, ValueRef>,
    pending: HashMap<String, Pending>,
    blocks: HashMap<String, BlockRef>,
    isolated: bool,
}

impl Scope {
    /// The earliest use of a name that was never defined.
    pub fn first_unresolved(&self) -> Option<(&str, Span)> {
        self.pending
            .iter()
            .map(|(name, p)| (name.as_str(), p.span))
            .min_by_key(|&(_, span)| span)
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Binding {
    Fresh,
    /// The name had been used before; uses of this placeholder must be
    /// redirected to the new value.
    Resolved(ValueRef, Span),
    Redefined,
    NoScope,
}

#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn push(&mut self, isolated: bool) {
        self.scopes.push(Scope {
            isolated,
            ..Scope::default()
        });
    }

    pub fn pop(&mut self) -> Scope {
        self.scopes.pop().unwrap_or_default()
    }

    pub fn lookup(&self, name: &str) -> Option<ValueRef> {
        for scope in self.scopes.iter().rev() {
            if let Some(&v) = scope.values.get(name) {
                return Some(v);
            }
            if scope.isolated {
                break;
            }
        }
        self.scopes
            .last()?
            .pending
            .get(name)
            .map(|pending| pending.value)
    }

    /// Record a placeholder for a use of an undefined name.
    pub fn add_pending(&mut self, name: &str, value: ValueRef, span: Span) -> bool {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope
                    .pending
                    .insert(name.to_string(), Pending { value, span });
                true
            }
            None => false,
        }
    }

    pub fn define(&mut self, name: &str, value: ValueRef) -> Binding {
        let Some(scope) = self.scopes.last_mut() else {
            return Binding::NoScope;
        };
        if scope.values.contains_key(name) {
            return Binding::Redefined;
        }
        scope.values.insert(name.to_string(), value);
        match scope.pending.remove(name) {
            Some(pending) => Binding::Resolved(pending.value, pending.span),
            None => Binding::Fresh,
        }
    }

    /// Returns `false` when the label is already used in this region.
    pub fn define_block(&mut self, label: &str, block: BlockRef) -> bool {
        match self.scopes.last_mut() {
            Some(scope) => scope.blocks.insert(label.to_string(), block).is_none(),
            None => false,
        }
    }
}
