//! Register definitions for the Vapor-M target.
//!
//! The machine model follows the MIPS-style convention: eight callee-saved
//! registers (`$s0`-`$s7`), nine caller-saved registers (`$t0`-`$t8`), four
//! argument registers (`$a0`-`$a3`), and two return/scratch registers
//! (`$v0`/`$v1`). Only the `$t` and `$s` classes are handed out by the
//! allocator; `$a` and `$v` are reserved for the calling convention and for
//! spill traffic.

use std::fmt;

/// A physical register. Variant order matches the textual name order, so
/// deriving `Ord` gives name ordering within each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    // Callee-saved
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    // Caller-saved
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    // Argument passing
    A0,
    A1,
    A2,
    A3,
    // Return value / scratch
    V0,
    V1,
}

impl Register {
    /// The register's bare name, without the `$` sigil.
    pub fn name(self) -> &'static str {
        use Register::*;
        match self {
            S0 => "s0",
            S1 => "s1",
            S2 => "s2",
            S3 => "s3",
            S4 => "s4",
            S5 => "s5",
            S6 => "s6",
            S7 => "s7",
            T0 => "t0",
            T1 => "t1",
            T2 => "t2",
            T3 => "t3",
            T4 => "t4",
            T5 => "t5",
            T6 => "t6",
            T7 => "t7",
            T8 => "t8",
            A0 => "a0",
            A1 => "a1",
            A2 => "a2",
            A3 => "a3",
            V0 => "v0",
            V1 => "v1",
        }
    }

    /// Is preservation across calls the callee's responsibility?
    pub fn is_callee_saved(self) -> bool {
        self.name().starts_with('s')
    }

    /// Is preservation across calls the caller's responsibility?
    pub fn is_caller_saved(self) -> bool {
        self.name().starts_with('t')
    }

    /// Is this one of the four argument-passing registers?
    pub fn is_arg_reg(self) -> bool {
        self.name().starts_with('a')
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name())
    }
}

/// Argument-passing registers, in calling-convention order.
pub const ARG_REGS: [Register; 4] = [Register::A0, Register::A1, Register::A2, Register::A3];

/// Callee-saved registers.
pub const CALLEE_SAVED: [Register; 8] = [
    Register::S0,
    Register::S1,
    Register::S2,
    Register::S3,
    Register::S4,
    Register::S5,
    Register::S6,
    Register::S7,
];

/// Caller-saved registers.
pub const CALLER_SAVED: [Register; 9] = [
    Register::T0,
    Register::T1,
    Register::T2,
    Register::T3,
    Register::T4,
    Register::T5,
    Register::T6,
    Register::T7,
    Register::T8,
];

/// Scratch registers used by the emitter to materialize spilled operands,
/// in acquisition order. Disjoint from the allocation pool.
pub const SCRATCH_REGS: [Register; 6] = [
    Register::V0,
    Register::V1,
    Register::A0,
    Register::A1,
    Register::A2,
    Register::A3,
];
