//! Lowered Vapor instructions.
//!
//! Every instruction is one variant of [`Instr`]; the register allocator and
//! the emitter dispatch on it with exhaustive matches. Positions are implicit:
//! an instruction's index in `Function::body` is its position.

use std::fmt;

/// An instruction operand: a variable, a literal, or a label reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A named temporary or local.
    Var(String),
    /// An integer literal.
    Imm(i64),
    /// A label reference, printed as `:name`.
    Label(String),
    /// A string literal (only valid as a builtin argument, e.g. `Error`).
    Str(String),
}

impl Operand {
    /// The variable name, if this operand is a variable.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Operand::Var(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(name) => write!(f, "{name}"),
            Operand::Imm(value) => write!(f, "{value}"),
            Operand::Label(name) => write!(f, ":{name}"),
            Operand::Str(text) => write!(f, "{text:?}"),
        }
    }
}

/// A call or jump target: a code label or a variable holding an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    Label(String),
    Var(String),
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Label(name) => write!(f, ":{name}"),
            Addr::Var(name) => write!(f, "{name}"),
        }
    }
}

/// One lowered Vapor instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `dest = src`
    Assign { dest: String, src: Operand },
    /// `dest = call addr(args...)`
    Call {
        dest: String,
        addr: Addr,
        args: Vec<Operand>,
    },
    /// `dest = Op(args...)` or bare `Op(args...)`
    Builtin {
        dest: Option<String>,
        op: String,
        args: Vec<Operand>,
    },
    /// `dest = [base+offset]`
    MemRead {
        dest: String,
        base: String,
        offset: i64,
    },
    /// `[base+offset] = src`
    MemWrite {
        base: String,
        offset: i64,
        src: Operand,
    },
    /// `if cond goto :target` (positive) or `if0 cond goto :target`
    Branch {
        cond: Operand,
        positive: bool,
        target: String,
    },
    /// `goto :label` or indirect `goto var`
    Goto { target: Addr },
    /// `ret` with an optional value
    Return { value: Option<Operand> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_display() {
        assert_eq!(Operand::Var("t.0".into()).to_string(), "t.0");
        assert_eq!(Operand::Imm(-3).to_string(), "-3");
        assert_eq!(Operand::Label("vmt_A".into()).to_string(), ":vmt_A");
    }

    #[test]
    fn operand_as_var() {
        assert_eq!(Operand::Var("x".into()).as_var(), Some("x"));
        assert_eq!(Operand::Imm(0).as_var(), None);
        assert_eq!(Operand::Label("l".into()).as_var(), None);
    }

    #[test]
    fn addr_display() {
        assert_eq!(Addr::Label("F_run".into()).to_string(), ":F_run");
        assert_eq!(Addr::Var("t.1".into()).to_string(), "t.1");
    }
}
