//! Back end of a teaching compiler: lowers a flat three-address-code (TAC)
//! instruction stream to MIPS assembly using classical graph-based register
//! allocation.
//!
//! Pipeline stages (each a pure function from one representation to the next):
//!
//! - [`cfg`]:          partition TAC into basic blocks, link branch edges.
//! - [`liveness`]:     backward fixpoint dataflow over the CFG.
//! - [`interference`]: build the variable interference graph.
//! - [`regalloc`]:     priority-driven graph coloring; colors beyond the
//!   register budget mean "spilled".
//! - [`spill`]:        rewrite TAC into TACspill, where every operand is a
//!   physical register or an explicit spill/unspill of a memory slot.
//! - [`isel`]:         instruction selection from TACspill to MIPS.
//!
//! The [`graph`] module provides the generic graph both the CFG and the
//! interference graph are built on, and [`interp`] contains reference
//! interpreters for TAC and TACspill used by the test suite.

pub mod cfg;
pub mod graph;
pub mod interference;
pub mod interp;
pub mod isel;
pub mod liveness;
pub mod mips;
pub mod regalloc;
pub mod spill;
pub mod tac;
pub mod tacspill;

use log::info;
use thiserror::Error;

/// Default register budget: MIPS has eight callee-saved `$s` registers.
pub const MAX_REGISTERS: usize = 8;

/// Fatal backend errors.
///
/// Covers malformed input from the upstream TAC producer (unresolved branch
/// targets, undefined variables, call shapes outside the builtin surface)
/// and capacity errors at instruction selection (immediates outside the
/// signed 16-bit range).  Register allocation itself never fails; running
/// out of registers produces spills, not errors.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Graph(#[from] graph::GraphError),

    #[error("unresolved label: {0}")]
    UnresolvedLabel(String),

    #[error("invalid call: {0}")]
    InvalidCall(String),

    #[error("immediate out of range: {0}")]
    ImmediateOutOfRange(i64),

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("input exhausted")]
    InputExhausted,
}

/// Compile a TAC instruction stream to MIPS with the default scratch
/// registers and register budget `max_regs`.
///
/// The caller is responsible for wrapping the returned instruction body in a
/// program prologue/epilogue (see [`mips::prologue`] and [`mips::epilogue`]).
pub fn compile_tac_to_mips(
    instrs: &[tac::Instr],
    max_regs: usize,
) -> Result<Vec<mips::Instr>, BackendError> {
    info!("compiling {} TAC instructions, max_regs={max_regs}", instrs.len());
    let scratch = spill::ScratchRegs::default();
    let spilled = spill::tac_to_tac_spill(instrs, max_regs, &scratch)?;
    isel::tac_spill_to_mips(&spilled, &scratch)
}
