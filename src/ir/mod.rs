//! The Vapor intermediate representation consumed by the translator.
//!
//! A [`Program`] is what the parser hands to the back-end: constant data
//! segments plus a list of functions, each a flat instruction sequence with a
//! function-local label table.

mod function;
mod instruction;

pub use function::{DataSegment, DataValue, Function, Program};
pub use instruction::{Addr, Instr, Operand};
