//! Target machine model: the register file, register pools, and stack frame
//! layout for Vapor-M.

mod frame;
mod pool;
mod registers;

pub use frame::{FrameLayout, Slot};
pub use pool::RegisterPool;
pub use registers::{Register, ARG_REGS, CALLEE_SAVED, CALLER_SAVED, SCRATCH_REGS};
