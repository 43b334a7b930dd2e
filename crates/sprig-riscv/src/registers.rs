//! RISC-V ABI register names.
//!
//! Register types only ever carry these names; anything else is rejected
//! while parsing `!riscv.reg<...>` and `!riscv.freg<...>`.

use derive_more::Display;

/// Which register file a name belongs to.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    #[display("integer")]
    Integer,
    #[display("floating-point")]
    Float,
}

impl RegisterClass {
    /// ABI names of this register file, in encoding order.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            RegisterClass::Integer => INT_REGISTERS,
            RegisterClass::Float => FLOAT_REGISTERS,
        }
    }

    pub fn contains(self, name: &str) -> bool {
        self.names().contains(&name)
    }

    /// Encoding index (`x<N>` / `f<N>`) of an ABI name.
    pub fn index_of(self, name: &str) -> Option<usize> {
        self.names().iter().position(|&n| n == name)
    }
}

/// `x0` through `x31`.
pub const INT_REGISTERS: &[&str] = &[
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", //
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", //
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", //
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// `f0` through `f31`.
pub const FLOAT_REGISTERS: &[&str] = &[
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", //
    "fs0", "fs1", "fa0", "fa1", "fa2", "fa3", "fa4", "fa5", //
    "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", //
    "fs8", "fs9", "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];
