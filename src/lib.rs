//! Translator from Vapor, a three-address intermediate form with unlimited
//! named variables, to Vapor-M, the register-and-stack variant of the same
//! language. Each function is lowered independently: a control-flow graph
//! with one node per instruction, a backward may-live dataflow fixpoint,
//! live-interval extraction, linear-scan register allocation with spilling,
//! and finally calling-convention-aware code emission.
//!
//! The pipeline is fully deterministic: identical input produces identical
//! output, byte for byte.

pub mod emit;
pub mod ir;
pub mod parser;
pub mod regalloc;
pub mod target;

use anyhow::{Context, Result};
use emit::Emitter;

/// Translate a whole Vapor program into Vapor-M text.
pub fn translate(source: &str) -> Result<String> {
    let program = parser::parse(source).context("parsing input program")?;

    let mut emitter = Emitter::new();
    emitter.emit_segments(&program.segments);

    for func in &program.functions {
        let alloc = regalloc::allocate(func)
            .with_context(|| format!("allocating registers for function {}", func.name))?;
        emitter
            .emit_function(func, &alloc)
            .with_context(|| format!("emitting function {}", func.name))?;
    }

    Ok(emitter.finish())
}
