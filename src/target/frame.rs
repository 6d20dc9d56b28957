//! Stack frame layout for Vapor-M functions.
//!
//! A frame has three areas: `in` (incoming overflow parameters), `out`
//! (outgoing overflow call arguments), and `local` (callee saves, spill
//! slots, and caller saves at call sites, in that order from slot 0).

use std::fmt;

/// Per-function frame sizes, printed in the `func` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameLayout {
    /// Incoming overflow-parameter slots: `max(0, param_count - 4)`.
    pub in_slots: usize,
    /// Outgoing overflow-argument slots: max over call sites of
    /// `max(0, arg_count - 4)`.
    pub out_slots: usize,
    /// Local slots: callee saves + spill slots + the widest caller-save set
    /// among call sites.
    pub local_slots: usize,
}

/// A reference to one stack slot, printed as `in[i]`, `out[i]`, or
/// `local[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    In(usize),
    Out(usize),
    Local(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::In(i) => write!(f, "in[{i}]"),
            Slot::Out(i) => write!(f, "out[{i}]"),
            Slot::Local(i) => write!(f, "local[{i}]"),
        }
    }
}
