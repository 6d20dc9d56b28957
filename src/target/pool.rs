//! An explicit, ordered register pool.
//!
//! Acquisition order is fixed by the pool's construction order, never by map
//! or set iteration order; identical inputs therefore acquire identical
//! register sequences.

use super::registers::{Register, CALLEE_SAVED, CALLER_SAVED, SCRATCH_REGS};
use indexmap::IndexSet;

/// An ordered set of available registers plus the subset currently in use.
#[derive(Debug, Clone)]
pub struct RegisterPool {
    all: Vec<Register>,
    in_use: IndexSet<Register>,
}

impl RegisterPool {
    fn new(regs: &[Register]) -> Self {
        Self {
            all: regs.to_vec(),
            in_use: IndexSet::new(),
        }
    }

    /// The pool the linear-scan allocator draws from: `$t0`-`$t8` first,
    /// then `$s0`-`$s7`.
    pub fn allocatable() -> Self {
        let mut regs = Vec::with_capacity(CALLER_SAVED.len() + CALLEE_SAVED.len());
        regs.extend_from_slice(&CALLER_SAVED);
        regs.extend_from_slice(&CALLEE_SAVED);
        Self::new(&regs)
    }

    /// The emitter's scratch pool for spill traffic: `$v0`, `$v1`, then
    /// `$a0`-`$a3`.
    pub fn scratch() -> Self {
        Self::new(&SCRATCH_REGS)
    }

    /// Does this pool own the given register (in use or not)?
    pub fn contains(&self, reg: Register) -> bool {
        self.all.contains(&reg)
    }

    /// Is at least one register free?
    pub fn has_free(&self) -> bool {
        self.in_use.len() < self.all.len()
    }

    /// Acquire the first free register in pool order, or `None` if the pool
    /// is exhausted.
    pub fn acquire(&mut self) -> Option<Register> {
        let reg = self
            .all
            .iter()
            .copied()
            .find(|reg| !self.in_use.contains(reg))?;
        self.in_use.insert(reg);
        Some(reg)
    }

    /// Return a register to the pool. Releasing a register the pool does not
    /// own is a no-op.
    pub fn release(&mut self, reg: Register) {
        self.in_use.shift_remove(&reg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_follows_pool_order() {
        let mut pool = RegisterPool::allocatable();
        assert_eq!(pool.acquire(), Some(Register::T0));
        assert_eq!(pool.acquire(), Some(Register::T1));
        for _ in 0..7 {
            pool.acquire();
        }
        // After t0-t8, the callee-saved class follows.
        assert_eq!(pool.acquire(), Some(Register::S0));
    }

    #[test]
    fn release_makes_register_reacquirable() {
        let mut pool = RegisterPool::allocatable();
        let t0 = pool.acquire().unwrap();
        let _t1 = pool.acquire().unwrap();
        pool.release(t0);
        // t0 is the first free register again.
        assert_eq!(pool.acquire(), Some(Register::T0));
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut pool = RegisterPool::scratch();
        for _ in 0..6 {
            assert!(pool.acquire().is_some());
        }
        assert!(!pool.has_free());
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn scratch_pool_starts_with_v0() {
        let mut pool = RegisterPool::scratch();
        assert_eq!(pool.acquire(), Some(Register::V0));
        assert_eq!(pool.acquire(), Some(Register::V1));
        assert_eq!(pool.acquire(), Some(Register::A0));
    }
}
