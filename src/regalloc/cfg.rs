//! Control-flow graph construction.
//!
//! The graph is an index-addressed arena: one node per instruction, with
//! def/use sets and successor/predecessor index lists. No node objects point
//! at each other, so loops in the graph cost nothing in ownership terms.

use crate::ir::{Addr, Function, Instr};
use anyhow::{bail, Result};
use indexmap::IndexSet;

/// One CFG node. `def` and `uses` hold variable names; `succ`/`pred` hold
/// node indices, which equal instruction indices.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub def: IndexSet<String>,
    pub uses: IndexSet<String>,
    pub succ: Vec<usize>,
    pub pred: Vec<usize>,
}

/// Control-flow graph over a function body. Node count always equals
/// instruction count.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    nodes: Vec<Node>,
}

impl FlowGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Def/use sets for a single instruction.
fn def_use(instr: &Instr) -> (IndexSet<String>, IndexSet<String>) {
    let mut def = IndexSet::new();
    let mut uses = IndexSet::new();
    let mut use_var = |uses: &mut IndexSet<String>, operand: &crate::ir::Operand| {
        if let Some(var) = operand.as_var() {
            uses.insert(var.to_string());
        }
    };

    match instr {
        Instr::Assign { dest, src } => {
            def.insert(dest.clone());
            use_var(&mut uses, src);
        }
        Instr::Call { dest, addr, args } => {
            def.insert(dest.clone());
            if let Addr::Var(var) = addr {
                uses.insert(var.clone());
            }
            for arg in args {
                use_var(&mut uses, arg);
            }
        }
        Instr::Builtin { dest, args, .. } => {
            if let Some(dest) = dest {
                def.insert(dest.clone());
            }
            for arg in args {
                use_var(&mut uses, arg);
            }
        }
        Instr::MemRead { dest, base, .. } => {
            def.insert(dest.clone());
            uses.insert(base.clone());
        }
        Instr::MemWrite { base, src, .. } => {
            uses.insert(base.clone());
            use_var(&mut uses, src);
        }
        Instr::Branch { cond, .. } => {
            use_var(&mut uses, cond);
        }
        Instr::Goto { target } => {
            if let Addr::Var(var) = target {
                uses.insert(var.clone());
            }
        }
        Instr::Return { value } => {
            if let Some(value) = value {
                use_var(&mut uses, value);
            }
        }
    }
    (def, uses)
}

/// Build the CFG for a function. Fails if a branch or goto names a label
/// that is not bound to an instruction.
pub fn build(func: &Function) -> Result<FlowGraph> {
    let count = func.body.len();
    let mut nodes: Vec<Node> = func
        .body
        .iter()
        .map(|instr| {
            let (def, uses) = def_use(instr);
            Node {
                def,
                uses,
                succ: Vec::new(),
                pred: Vec::new(),
            }
        })
        .collect();

    let resolve = |label: &str| -> Result<usize> {
        match func.resolve_label(label) {
            Some(index) if index < count => Ok(index),
            _ => bail!(
                "undefined label :{} in function {}",
                label,
                func.name
            ),
        }
    };

    let mut edges: Vec<(usize, usize)> = Vec::new();
    for (i, instr) in func.body.iter().enumerate() {
        match instr {
            Instr::Goto {
                target: Addr::Label(label),
            } => {
                edges.push((i, resolve(label)?));
            }
            // An indirect goto has no statically resolved edge.
            Instr::Goto {
                target: Addr::Var(_),
            } => {}
            Instr::Return { .. } => {}
            Instr::Branch { target, .. } => {
                if i + 1 < count {
                    edges.push((i, i + 1));
                }
                edges.push((i, resolve(target)?));
            }
            _ => {
                if i + 1 < count {
                    edges.push((i, i + 1));
                }
            }
        }
    }

    for (from, to) in edges {
        if !nodes[from].succ.contains(&to) {
            nodes[from].succ.push(to);
        }
        if !nodes[to].pred.contains(&from) {
            nodes[to].pred.push(from);
        }
    }

    Ok(FlowGraph { nodes })
}
