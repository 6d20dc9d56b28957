//! Register allocation pipeline.
//!
//! Each function is analyzed independently: CFG construction, liveness
//! fixpoint, live-interval extraction, then linear-scan allocation. The
//! emitter consumes the whole bundle, since it needs liveness at call sites
//! as well as the final allocation map.

pub mod cfg;
pub mod intervals;
pub mod linear_scan;
pub mod liveness;

use crate::ir::Function;
use anyhow::{Context, Result};

pub use cfg::FlowGraph;
pub use intervals::Interval;
pub use linear_scan::{AllocationMap, LinearScanAllocator};
pub use liveness::Liveness;

/// Analysis and allocation results for one function.
#[derive(Debug)]
pub struct FunctionAllocation {
    pub graph: FlowGraph,
    pub liveness: Liveness,
    pub map: AllocationMap,
}

/// Run the full analysis-and-allocation pipeline for a single function.
pub fn allocate(func: &Function) -> Result<FunctionAllocation> {
    let graph = cfg::build(func)
        .with_context(|| format!("building control-flow graph for {}", func.name))?;
    let liveness = liveness::analyze(&graph);
    let intervals = intervals::extract(&graph, &liveness);
    log::debug!(
        "{}: {} instructions, {} intervals",
        func.name,
        graph.len(),
        intervals.len()
    );
    let map = LinearScanAllocator::run(&intervals, &func.params);
    Ok(FunctionAllocation {
        graph,
        liveness,
        map,
    })
}
