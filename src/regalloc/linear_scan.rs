//! Linear-scan register allocation.
//!
//! Intervals are processed in increasing-start order against an explicit
//! register pool. Parameters are tentatively given registers before the scan
//! and marked unused-so-far; a parameter register can then be reclaimed
//! without penalty if the scan never reaches a real use, and an unused
//! parameter is never picked as an eviction victim. All orderings (pool
//! acquisition, active list, spill slots) are explicit and stable, so the
//! allocation is deterministic.

use super::intervals::Interval;
use crate::target::{Register, RegisterPool};
use indexmap::{IndexMap, IndexSet};

/// The result of allocation: every variable appearing in an interval is
/// mapped to a register or to a spill slot, never both.
#[derive(Debug, Clone)]
pub struct AllocationMap {
    registers: IndexMap<String, Register>,
    stack: IndexSet<String>,
    /// Low `local` slots reserved for saving the callee-saved registers the
    /// allocator issued; spill slots start above them.
    reserved: usize,
}

impl AllocationMap {
    fn new(registers: IndexMap<String, Register>, stack: IndexSet<String>) -> Self {
        let mut callee: Vec<Register> = Vec::new();
        for reg in registers.values() {
            if reg.is_callee_saved() && !callee.contains(reg) {
                callee.push(*reg);
            }
        }
        let reserved = callee.len();
        Self {
            registers,
            stack,
            reserved,
        }
    }

    /// The register holding `var`, if it was not spilled.
    pub fn register(&self, var: &str) -> Option<Register> {
        self.registers.get(var).copied()
    }

    /// The `local` slot index holding `var`, if it was spilled.
    pub fn stack_slot(&self, var: &str) -> Option<usize> {
        self.stack.get_index_of(var).map(|i| i + self.reserved)
    }

    /// Callee-saved registers actually issued, in issue order.
    pub fn used_callee_registers(&self) -> Vec<Register> {
        let mut callee = Vec::new();
        for reg in self.registers.values() {
            if reg.is_callee_saved() && !callee.contains(reg) {
                callee.push(*reg);
            }
        }
        callee
    }

    /// Permanent `local` slots: callee saves plus spill slots. Caller saves
    /// at call sites sit above this.
    pub fn stack_size(&self) -> usize {
        self.stack.len() + self.reserved
    }
}

/// Linear-scan allocator state for one function.
pub struct LinearScanAllocator {
    pool: RegisterPool,
    /// Intervals currently holding a register, kept sorted by increasing
    /// end (stable, so insertion order breaks ties).
    active: Vec<Interval>,
    registers: IndexMap<String, Register>,
    /// Parameters holding a tentatively assigned register whose first real
    /// use the scan has not reached.
    unused_params: IndexSet<String>,
    stack: IndexSet<String>,
}

impl LinearScanAllocator {
    fn new() -> Self {
        Self {
            pool: RegisterPool::allocatable(),
            active: Vec::new(),
            registers: IndexMap::new(),
            unused_params: IndexSet::new(),
            stack: IndexSet::new(),
        }
    }

    /// Allocate registers for the given intervals. `params` is the
    /// function's parameter list in declaration order.
    pub fn run(intervals: &[Interval], params: &[String]) -> AllocationMap {
        let mut alloc = Self::new();

        let mut sorted: Vec<Interval> = intervals.to_vec();
        sorted.sort_by_key(|i| i.start);

        // Pre-seed parameters with registers. Parameters that do not fit
        // are left to the main scan, which will spill them to `local`.
        for param in params {
            if sorted.iter().any(|i| &i.var == param) {
                if let Some(reg) = alloc.pool.acquire() {
                    alloc.registers.insert(param.clone(), reg);
                    alloc.unused_params.insert(param.clone());
                }
            }
        }

        for interval in sorted {
            alloc.expire_old_intervals(&interval);

            // A pre-seeded parameter interval starting at entry already
            // holds its register.
            if interval.start == 0 && alloc.unused_params.contains(&interval.var) {
                continue;
            }

            if let Some(reg) = alloc.pool.acquire() {
                alloc.registers.insert(interval.var.clone(), reg);
                alloc.active.push(interval);
            } else {
                alloc.spill_at_interval(interval);
            }
        }

        AllocationMap::new(alloc.registers, alloc.stack)
    }

    /// Remove every active interval ending strictly before `current` starts,
    /// returning its register to the pool.
    fn expire_old_intervals(&mut self, current: &Interval) {
        self.active.sort_by_key(|i| i.end);

        let split = self
            .active
            .iter()
            .position(|i| i.end >= current.start)
            .unwrap_or(self.active.len());
        for expired in self.active.drain(..split) {
            if let Some(&reg) = self.registers.get(&expired.var) {
                self.pool.release(reg);
            }
            self.unused_params.shift_remove(&expired.var);
        }
    }

    /// The pool is exhausted: either evict the active interval with the
    /// largest end point (skipping unused-so-far parameters), or spill the
    /// current interval itself.
    fn spill_at_interval(&mut self, current: Interval) {
        self.active.sort_by_key(|i| i.end);

        let victim = self
            .active
            .iter()
            .rposition(|i| !self.unused_params.contains(&i.var));

        match victim {
            Some(pos) if self.active[pos].end > current.end => {
                let evicted = self.active.remove(pos);
                if let Some(&reg) = self.registers.get(&evicted.var) {
                    self.registers.insert(current.var.clone(), reg);
                }
                self.registers.shift_remove(&evicted.var);
                self.stack.insert(evicted.var);
                self.active.push(current);
            }
            _ => {
                self.stack.insert(current.var);
            }
        }
    }
}
