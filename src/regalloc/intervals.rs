//! Live-interval extraction.
//!
//! A variable is active at node `n` if `n` defines it or it is live into
//! `n`. Its interval spans the minimum to maximum active index. Disjoint
//! live spans of one variable are deliberately merged into a single
//! conservative interval; this can hold a register longer than strictly
//! needed but keeps allocation decisions simple and reproducible.

use super::cfg::FlowGraph;
use super::liveness::Liveness;
use indexmap::IndexMap;

/// Inclusive instruction-index range over which a variable must be
/// preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub var: String,
    pub start: usize,
    pub end: usize,
}

/// Extract one interval per variable appearing in any active set. Output
/// order is first-appearance order, which later stages rely on for stable
/// tie-breaking.
pub fn extract(graph: &FlowGraph, liveness: &Liveness) -> Vec<Interval> {
    let mut intervals: IndexMap<String, Interval> = IndexMap::new();

    for (n, node) in graph.nodes().iter().enumerate() {
        // active(n) = def(n) ∪ in(n)
        let active = node
            .def
            .iter()
            .map(|s| s.as_str())
            .chain(liveness.live_in[n].iter().map(|s| s.as_str()));

        for var in active {
            match intervals.get_mut(var) {
                Some(interval) => interval.end = n,
                None => {
                    intervals.insert(
                        var.to_string(),
                        Interval {
                            var: var.to_string(),
                            start: n,
                            end: n,
                        },
                    );
                }
            }
        }
    }

    intervals.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::regalloc::{cfg, liveness};

    fn intervals_for(source: &str) -> Vec<Interval> {
        let program = parser::parse(source).unwrap();
        let graph = cfg::build(&program.functions[0]).unwrap();
        let l = liveness::analyze(&graph);
        extract(&graph, &l)
    }

    fn find<'a>(intervals: &'a [Interval], var: &str) -> &'a Interval {
        intervals.iter().find(|i| i.var == var).unwrap()
    }

    #[test]
    fn straight_line_intervals() {
        let intervals =
            intervals_for("func F()\n  a = 1\n  b = 2\n  c = Add(a b)\n  PrintIntS(c)\n  ret\n");
        assert_eq!(find(&intervals, "a"), &Interval { var: "a".into(), start: 0, end: 2 });
        assert_eq!(find(&intervals, "b"), &Interval { var: "b".into(), start: 1, end: 2 });
        assert_eq!(find(&intervals, "c"), &Interval { var: "c".into(), start: 2, end: 3 });
    }

    #[test]
    fn parameter_interval_starts_at_entry() {
        let intervals = intervals_for("func F(p)\n  x = 1\n  y = Add(x p)\n  ret y\n");
        // p is live-in from node 0 even though first used at node 1.
        assert_eq!(find(&intervals, "p").start, 0);
        assert_eq!(find(&intervals, "p").end, 1);
    }

    #[test]
    fn disjoint_spans_merge_into_one_interval() {
        // x is dead between node 1 and its redefinition at node 2, but the
        // extractor still produces a single spanning interval.
        let intervals = intervals_for(
            "func F()\n  x = 1\n  PrintIntS(x)\n  x = 2\n  PrintIntS(x)\n  ret\n",
        );
        assert_eq!(find(&intervals, "x"), &Interval { var: "x".into(), start: 0, end: 3 });
        assert_eq!(intervals.len(), 1);
    }

    #[test]
    fn loop_extends_interval_to_back_edge() {
        let intervals = intervals_for(
            "func F(n)\n  i = 0\nloop:\n  c = Lt(i n)\n  if0 c goto :end\n  i = Add(i 1)\n  goto :loop\nend:\n  ret\n",
        );
        // i and n stay live through the goto that closes the loop.
        assert_eq!(find(&intervals, "i").end, 4);
        assert_eq!(find(&intervals, "n").end, 4);
    }
}
