//! Interned names.

use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

/// Global string interner for symbols.
static INTERNER: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// Interned symbol for cheap comparison of dialect, operation, type and
/// attribute names.
///
/// Uses lasso for string interning with 4-byte Spur keys. The interner is
/// process-global, so symbols compare equal across independent `IrContext`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Intern a static string and return its symbol. Prefer this over `from_dynamic` when possible.
    pub fn new(text: &'static str) -> Self {
        Self::get_or_else(text, |rodeo| rodeo.get_or_intern_static(text))
    }

    /// Intern a string and return its symbol. Prefer `new` if the text is static.
    pub fn from_dynamic(text: &str) -> Self {
        Self::get_or_else(text, |rodeo| rodeo.get_or_intern(text))
    }

    fn get_or_else(text: &str, f: impl for<'r> FnOnce(&'r mut Rodeo) -> Spur) -> Self {
        let mut lock = INTERNER.upgradable_read();
        Symbol(if let Some(spur) = lock.get(text) {
            spur
        } else {
            lock.with_upgraded(f)
        })
    }

    /// Access the symbol's text without allocating.
    ///
    /// Uses `read_recursive()` so nested symbol operations inside the
    /// closure cannot deadlock.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = INTERNER.read_recursive();
        let text = interner.resolve(&self.0);
        f(text)
    }
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

/// Dialect-qualified operation name, e.g. `riscv_snitch.frep_outer`.
///
/// The dialect is everything before the first `.`; the operation name may
/// itself contain dots (`riscv.fadd.d`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpName {
    pub dialect: Symbol,
    pub name: Symbol,
}

impl OpName {
    pub fn new(dialect: Symbol, name: Symbol) -> Self {
        Self { dialect, name }
    }

    /// Split a mnemonic at its first dot. Returns `None` when there is no
    /// dialect prefix or either half is empty.
    pub fn parse(mnemonic: &str) -> Option<Self> {
        let (dialect, name) = mnemonic.split_once('.')?;
        if dialect.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            dialect: Symbol::from_dynamic(dialect),
            name: Symbol::from_dynamic(name),
        })
    }

    /// Check whether this name spells the given mnemonic.
    pub fn is(&self, mnemonic: &str) -> bool {
        match mnemonic.split_once('.') {
            Some((d, n)) => self.dialect == d && self.name == n,
            None => false,
        }
    }
}

impl std::fmt::Display for OpName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dialect, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_dynamic_symbols_agree() {
        let a = Symbol::new("riscv_snitch");
        let b = Symbol::from_dynamic(&String::from("riscv_snitch"));
        assert_eq!(a, b);
        assert_eq!(a, "riscv_snitch");
    }

    #[test]
    fn op_name_splits_at_first_dot() {
        let name = OpName::parse("riscv.fadd.d").unwrap();
        assert_eq!(name.dialect, "riscv");
        assert_eq!(name.name, "fadd.d");
        assert_eq!(name.to_string(), "riscv.fadd.d");
        assert!(name.is("riscv.fadd.d"));
        assert!(!name.is("riscv.fadd"));
    }

    #[test]
    fn op_name_rejects_unqualified() {
        assert!(OpName::parse("scfgw").is_none());
        assert!(OpName::parse(".scfgw").is_none());
        assert!(OpName::parse("riscv.").is_none());
    }
}
