//! Dialects that ship with the IR itself.

pub mod builtin;
