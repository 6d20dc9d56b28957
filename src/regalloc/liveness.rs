//! Global liveness analysis.
//!
//! Classic backward may-live dataflow over the CFG: iterate
//! `in[n] = use[n] ∪ (out[n] − def[n])` and `out[n] = ⋃ in[s]` until a full
//! pass changes nothing. Both sets only ever grow and are bounded by the
//! finite variable universe, so the fixpoint is reached. Nodes are visited in
//! reverse instruction order, which converges quickly for mostly-forward
//! control flow; the fixpoint itself does not depend on the order.

use super::cfg::FlowGraph;
use std::collections::BTreeSet;

/// Per-node live-variable sets at convergence.
#[derive(Debug, Clone)]
pub struct Liveness {
    pub live_in: Vec<BTreeSet<String>>,
    pub live_out: Vec<BTreeSet<String>>,
}

impl Liveness {
    /// Variables live out of node `n` that `n` does not define. These are
    /// the values a call at `n` must preserve.
    pub fn live_across(&self, graph: &FlowGraph, n: usize) -> BTreeSet<String> {
        self.live_out[n]
            .iter()
            .filter(|var| !graph.node(n).def.contains(var.as_str()))
            .cloned()
            .collect()
    }
}

/// Run the fixpoint analysis.
pub fn analyze(graph: &FlowGraph) -> Liveness {
    let count = graph.len();
    let mut live_in: Vec<BTreeSet<String>> = vec![BTreeSet::new(); count];
    let mut live_out: Vec<BTreeSet<String>> = vec![BTreeSet::new(); count];

    let mut changed = true;
    let mut passes = 0usize;
    while changed {
        changed = false;
        passes += 1;

        for n in (0..count).rev() {
            let node = graph.node(n);

            let mut new_out = BTreeSet::new();
            for &s in &node.succ {
                new_out.extend(live_in[s].iter().cloned());
            }

            let mut new_in: BTreeSet<String> =
                node.uses.iter().cloned().collect();
            new_in.extend(
                new_out
                    .iter()
                    .filter(|var| !node.def.contains(var.as_str()))
                    .cloned(),
            );

            if new_in != live_in[n] || new_out != live_out[n] {
                changed = true;
            }
            live_in[n] = new_in;
            live_out[n] = new_out;
        }
    }

    log::debug!("liveness converged after {passes} passes over {count} nodes");
    Liveness { live_in, live_out }
}
