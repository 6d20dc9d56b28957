//! Vapor-M code emission.
//!
//! Re-walks each function's instructions with the allocation map and the
//! liveness facts, producing target text that honors the calling convention:
//! arguments in `$a0`-`$a3` with overflow in `out[]`, return values through
//! `$v0`, callee saves in low `local` slots, caller saves above the
//! permanent spill region at call sites. Spilled operands are staged through
//! a scratch pool (`$v0`/`$v1`/`$a0`-`$a3`) that is disjoint from the
//! allocation pool; scratch registers are released immediately after use.

mod output;

use crate::ir::{Addr, DataSegment, Function, Instr};
use crate::regalloc::{AllocationMap, FunctionAllocation};
use crate::target::{FrameLayout, Register, RegisterPool, Slot, ARG_REGS};
use anyhow::{anyhow, Result};
use std::fmt::Display;

pub use output::Output;

/// Emits a whole program; one instance is reused across functions.
pub struct Emitter {
    out: Output,
    scratch: RegisterPool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the frame sizes for a function under a given allocation.
///
/// `local` must cover the permanent area (callee saves + spill slots) plus
/// the widest set of caller-saved registers preserved around any single call
/// site; `out` is the widest overflow-argument area any call needs.
pub fn frame_layout(func: &Function, alloc: &FunctionAllocation) -> FrameLayout {
    let mut layout = FrameLayout {
        in_slots: func.params.len().saturating_sub(ARG_REGS.len()),
        out_slots: 0,
        local_slots: alloc.map.stack_size(),
    };

    for (n, instr) in func.body.iter().enumerate() {
        if let Instr::Call { args, .. } = instr {
            layout.out_slots = layout
                .out_slots
                .max(args.len().saturating_sub(ARG_REGS.len()));
            let saves = caller_saves(alloc, n).len();
            layout.local_slots = layout.local_slots.max(alloc.map.stack_size() + saves);
        }
    }
    layout
}

/// Caller-saved registers holding values live across the call at node `n`,
/// sorted by register name.
fn caller_saves(alloc: &FunctionAllocation, n: usize) -> Vec<Register> {
    let mut regs: Vec<Register> = alloc
        .liveness
        .live_across(&alloc.graph, n)
        .iter()
        .filter_map(|var| alloc.map.register(var))
        .filter(|reg| reg.is_caller_saved())
        .collect();
    regs.sort();
    regs.dedup();
    regs
}

fn mem_ref(reg: Register, offset: i64) -> String {
    if offset > 0 {
        format!("[{reg}+{offset}]")
    } else {
        format!("[{reg}]")
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            out: Output::new(),
            scratch: RegisterPool::scratch(),
        }
    }

    pub fn finish(self) -> String {
        self.out.finish()
    }

    fn assign(&mut self, lhs: impl Display, rhs: impl Display) {
        self.out.write_line(&format!("{lhs} = {rhs}"));
    }

    /// Emit every constant data segment, each followed by a blank line.
    pub fn emit_segments(&mut self, segments: &[DataSegment]) {
        for segment in segments {
            self.out.write_line(&format!("const {}", segment.name));
            self.out.indent();
            for value in &segment.values {
                self.out.write_line(&value.to_string());
            }
            self.out.dedent();
            self.out.blank_line();
        }
    }

    /// Materialize a variable into a register. Register-resident variables
    /// are returned as-is; spilled ones get a scratch register, loaded from
    /// their `local` slot unless the caller is about to overwrite it.
    fn load_variable(&mut self, map: &AllocationMap, var: &str, dest: bool) -> Result<Register> {
        if let Some(reg) = map.register(var) {
            return Ok(reg);
        }
        let offset = map
            .stack_slot(var)
            .ok_or_else(|| anyhow!("variable {var} has no assigned storage"))?;
        let reg = self
            .scratch
            .acquire()
            .ok_or_else(|| anyhow!("scratch register pool exhausted"))?;
        if !dest {
            self.assign(reg, Slot::Local(offset));
        }
        Ok(reg)
    }

    /// Store a freshly written value back to its spill slot, if it has one.
    fn store_variable(&mut self, map: &AllocationMap, var: &str, reg: Register) {
        if map.register(var).is_none() {
            if let Some(offset) = map.stack_slot(var) {
                self.assign(Slot::Local(offset), reg);
            }
        }
    }

    /// Release a register if it came from the scratch pool; registers from
    /// the allocation map pass through unchanged.
    fn release_scratch(&mut self, reg: Register) {
        if self.scratch.contains(reg) {
            self.scratch.release(reg);
        }
    }

    /// Emit one function: header, prologue, body, and an epilogue at every
    /// return.
    pub fn emit_function(&mut self, func: &Function, alloc: &FunctionAllocation) -> Result<()> {
        let map = &alloc.map;
        let callee = map.used_callee_registers();
        let layout = frame_layout(func, alloc);

        self.out.write_line(&format!(
            "func {} [in {}, out {}, local {}]",
            func.name, layout.in_slots, layout.out_slots, layout.local_slots
        ));
        self.out.indent();

        // Save issued callee-saved registers into the low local slots.
        for (i, reg) in callee.iter().enumerate() {
            self.assign(Slot::Local(i), reg);
        }

        // Move parameters from the calling convention into their homes.
        for (i, param) in func.params.iter().enumerate() {
            if let Some(reg) = map.register(param) {
                if i < ARG_REGS.len() {
                    self.assign(reg, ARG_REGS[i]);
                } else {
                    self.assign(reg, Slot::In(i - ARG_REGS.len()));
                }
            } else if let Some(offset) = map.stack_slot(param) {
                if i < ARG_REGS.len() {
                    self.assign(Slot::Local(offset), ARG_REGS[i]);
                } else {
                    let reg = self
                        .scratch
                        .acquire()
                        .ok_or_else(|| anyhow!("scratch register pool exhausted"))?;
                    self.assign(reg, Slot::In(i - ARG_REGS.len()));
                    self.assign(Slot::Local(offset), reg);
                    self.scratch.release(reg);
                }
            }
            // Parameters never read by the function have no home at all.
        }

        for (n, instr) in func.body.iter().enumerate() {
            let labels: Vec<&str> = func.labels_at(n).collect();
            if !labels.is_empty() {
                self.out.dedent();
                for label in labels {
                    self.out.write_line(&format!("{label}:"));
                }
                self.out.indent();
            }
            self.emit_instr(alloc, &callee, n, instr)?;
        }

        self.out.dedent();
        self.out.blank_line();
        Ok(())
    }

    fn emit_instr(
        &mut self,
        alloc: &FunctionAllocation,
        callee: &[Register],
        n: usize,
        instr: &Instr,
    ) -> Result<()> {
        let map = &alloc.map;
        match instr {
            Instr::Assign { dest, src } => {
                let dst = self.load_variable(map, dest, true)?;
                match src.as_var() {
                    Some(var) => {
                        let reg = self.load_variable(map, var, false)?;
                        self.assign(dst, reg);
                        self.release_scratch(reg);
                    }
                    None => self.assign(dst, src),
                }
                self.store_variable(map, dest, dst);
                self.release_scratch(dst);
            }

            Instr::Call { dest, addr, args } => {
                // Preserve caller-saved registers live across the call,
                // above the permanent local area.
                let saves = caller_saves(alloc, n);
                let base = map.stack_size();
                for (k, reg) in saves.iter().enumerate() {
                    self.assign(Slot::Local(base + k), reg);
                }

                for (k, arg) in args.iter().enumerate() {
                    match arg.as_var() {
                        Some(var) if k < ARG_REGS.len() => {
                            if let Some(reg) = map.register(var) {
                                self.assign(ARG_REGS[k], reg);
                            } else {
                                let offset = map.stack_slot(var).ok_or_else(|| {
                                    anyhow!("variable {var} has no assigned storage")
                                })?;
                                self.assign(ARG_REGS[k], Slot::Local(offset));
                            }
                        }
                        Some(var) => {
                            let reg = self.load_variable(map, var, false)?;
                            self.assign(Slot::Out(k - ARG_REGS.len()), reg);
                            self.release_scratch(reg);
                        }
                        None if k < ARG_REGS.len() => self.assign(ARG_REGS[k], arg),
                        None => self.assign(Slot::Out(k - ARG_REGS.len()), arg),
                    }
                }

                match addr {
                    Addr::Label(label) => self.out.write_line(&format!("call :{label}")),
                    Addr::Var(var) => {
                        let reg = self.load_variable(map, var, false)?;
                        self.out.write_line(&format!("call {reg}"));
                        self.release_scratch(reg);
                    }
                }

                let dst = self.load_variable(map, dest, true)?;
                if dst != Register::V0 {
                    self.assign(dst, Register::V0);
                }
                self.store_variable(map, dest, dst);
                self.release_scratch(dst);

                for (k, reg) in saves.iter().enumerate() {
                    self.assign(reg, Slot::Local(base + k));
                }
            }

            Instr::Builtin { dest, op, args } => {
                let mut rhs = format!("{op}(");
                let mut scratches = Vec::new();
                for (k, arg) in args.iter().enumerate() {
                    if k > 0 {
                        rhs.push(' ');
                    }
                    match arg.as_var() {
                        Some(var) => {
                            let reg = self.load_variable(map, var, false)?;
                            scratches.push(reg);
                            rhs.push_str(&reg.to_string());
                        }
                        None => rhs.push_str(&arg.to_string()),
                    }
                }
                rhs.push(')');
                for reg in scratches {
                    self.release_scratch(reg);
                }

                match dest {
                    None => self.out.write_line(&rhs),
                    Some(dest) => {
                        let dst = self.load_variable(map, dest, true)?;
                        self.assign(dst, rhs);
                        self.store_variable(map, dest, dst);
                        self.release_scratch(dst);
                    }
                }
            }

            Instr::MemRead { dest, base, offset } => {
                let dst = self.load_variable(map, dest, true)?;
                let base_reg = self.load_variable(map, base, false)?;
                self.assign(dst, mem_ref(base_reg, *offset));
                self.release_scratch(base_reg);
                self.store_variable(map, dest, dst);
                self.release_scratch(dst);
            }

            Instr::MemWrite { base, offset, src } => {
                let base_reg = self.load_variable(map, base, false)?;
                match src.as_var() {
                    Some(var) => {
                        let reg = self.load_variable(map, var, false)?;
                        self.assign(mem_ref(base_reg, *offset), reg);
                        self.release_scratch(reg);
                    }
                    None => self.assign(mem_ref(base_reg, *offset), src),
                }
                self.release_scratch(base_reg);
            }

            Instr::Branch {
                cond,
                positive,
                target,
            } => {
                let cond_text = match cond.as_var() {
                    Some(var) => {
                        let reg = self.load_variable(map, var, false)?;
                        self.release_scratch(reg);
                        reg.to_string()
                    }
                    None => cond.to_string(),
                };
                let keyword = if *positive { "if" } else { "if0" };
                self.out
                    .write_line(&format!("{keyword} {cond_text} goto :{target}"));
            }

            Instr::Goto { target } => match target {
                Addr::Label(label) => self.out.write_line(&format!("goto :{label}")),
                Addr::Var(var) => {
                    let reg = self.load_variable(map, var, false)?;
                    self.out.write_line(&format!("goto {reg}"));
                    self.release_scratch(reg);
                }
            },

            Instr::Return { value } => {
                if let Some(value) = value {
                    match value.as_var() {
                        Some(var) => {
                            let reg = self.load_variable(map, var, false)?;
                            if reg != Register::V0 {
                                self.assign(Register::V0, reg);
                            }
                            self.release_scratch(reg);
                        }
                        None => self.assign(Register::V0, value),
                    }
                }
                // Restore callee-saved registers before leaving.
                for (k, reg) in callee.iter().enumerate() {
                    self.assign(reg, Slot::Local(k));
                }
                self.out.write_line("ret");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::regalloc;

    fn emit_one(source: &str) -> String {
        let program = parser::parse(source).unwrap();
        let mut emitter = Emitter::new();
        emitter.emit_segments(&program.segments);
        for func in &program.functions {
            let alloc = regalloc::allocate(func).unwrap();
            emitter.emit_function(func, &alloc).unwrap();
        }
        emitter.finish()
    }

    #[test]
    fn straight_line_function() {
        let text = emit_one("func Main()\n  a = 1\n  b = 2\n  c = Add(a b)\n  PrintIntS(c)\n  ret\n");
        assert_eq!(
            text,
            "func Main [in 0, out 0, local 0]\n  \
             $t0 = 1\n  \
             $t1 = 2\n  \
             $t2 = Add($t0 $t1)\n  \
             PrintIntS($t2)\n  \
             ret\n\n"
        );
    }

    #[test]
    fn const_segments_come_out_verbatim() {
        let text = emit_one("const vmt_A\n  :A_foo\n  7\n\nfunc Main()\n  ret\n");
        assert!(text.starts_with("const vmt_A\n  :A_foo\n  7\n\n"));
    }

    #[test]
    fn labels_print_dedented() {
        let text = emit_one(
            "func Loop(n)\n  i = 0\nloop:\n  c = Lt(i n)\n  if0 c goto :end\n  i = Add(i 1)\n  goto :loop\nend:\n  ret\n",
        );
        assert_eq!(
            text,
            "func Loop [in 0, out 0, local 0]\n  \
             $t0 = $a0\n  \
             $t1 = 0\n\
             loop:\n  \
             $t2 = Lt($t1 $t0)\n  \
             if0 $t2 goto :end\n  \
             $t1 = Add($t1 1)\n  \
             goto :loop\n\
             end:\n  \
             ret\n\n"
        );
    }

    #[test]
    fn memory_reference_offsets() {
        assert_eq!(mem_ref(Register::T0, 8), "[$t0+8]");
        assert_eq!(mem_ref(Register::T0, 0), "[$t0]");
    }

    #[test]
    fn return_value_moves_to_v0() {
        let text = emit_one("func F()\n  x = 41\n  ret x\n");
        assert!(text.contains("$v0 = $t0"));
        assert!(text.ends_with("ret\n\n"));
    }
}
