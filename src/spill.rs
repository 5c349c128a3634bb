//! The TAC → TACspill rewrite.
//!
//! Runs the allocation pipeline (CFG → liveness → interference → coloring)
//! and rewrites the instruction stream against the resulting register map:
//! reads of spilled identifiers become unspill-then-read of a scratch
//! register, writes become write-then-spill, and everything else is renamed
//! in place to its physical register.
//!
//! All live values across a call sit in callee-saved `$s` registers or in
//! memory, so no save/restore sequence is emitted around calls.

use crate::cfg::build_control_flow_graph;
use crate::interference::build_interf_graph;
use crate::regalloc::{color_interf_graph, RegisterMap};
use crate::tac::{self, Exp, Ident, Prim};
use crate::tacspill;
use crate::BackendError;
use log::{debug, info};
use std::collections::HashMap;

/// The scratch registers reserved for staging spilled values.
///
/// `t1` and `t2` stage the first and second operand of an expression; `t3`
/// is left to the instruction selector for its own temporaries and is never
/// touched here.
#[derive(Debug, Clone)]
pub struct ScratchRegs {
    pub t1: Ident,
    pub t2: Ident,
    pub t3: Ident,
}

impl Default for ScratchRegs {
    fn default() -> Self {
        ScratchRegs {
            t1: Ident::new("$t0"),
            t2: Ident::new("$t1"),
            t3: Ident::new("$t2"),
        }
    }
}

#[derive(Clone, Copy)]
enum SlotAccess {
    Load,
    Store,
}

/// Resolve `x` to its register, or to `tmp` plus the spill/unspill
/// instruction moving the value between `tmp` and `x`'s slot.
fn spill_ident(
    x: &Ident,
    reg_map: &RegisterMap,
    tmp: &Ident,
    mode: SlotAccess,
) -> (Ident, Vec<tacspill::Instr>) {
    match reg_map.resolve(x) {
        Some(reg) => (reg, Vec::new()),
        None => {
            let instr = match mode {
                SlotAccess::Load => tacspill::Instr::Unspill {
                    reg: tmp.clone(),
                    slot: x.0.clone(),
                },
                SlotAccess::Store => tacspill::Instr::Spill {
                    reg: tmp.clone(),
                    slot: x.0.clone(),
                },
            };
            (tmp.clone(), vec![instr])
        }
    }
}

fn spill_prim(p: &Prim, reg_map: &RegisterMap, tmp: &Ident) -> (Prim, Vec<tacspill::Instr>) {
    match p {
        Prim::Const(n) => (Prim::Const(*n), Vec::new()),
        Prim::Name(x) => {
            let (new_x, loads) = spill_ident(x, reg_map, tmp, SlotAccess::Load);
            (Prim::Name(new_x), loads)
        }
    }
}

fn spill_exp(
    e: &Exp,
    reg_map: &RegisterMap,
    scratch: &ScratchRegs,
) -> (Exp, Vec<tacspill::Instr>) {
    match e {
        Exp::Prim(p) => {
            let (new_p, loads) = spill_prim(p, reg_map, &scratch.t1);
            (Exp::Prim(new_p), loads)
        }
        Exp::BinOp { left, op, right } => {
            let (new_left, mut loads) = spill_prim(left, reg_map, &scratch.t1);
            let (new_right, loads2) = spill_prim(right, reg_map, &scratch.t2);
            loads.extend(loads2);
            (
                Exp::BinOp {
                    left: new_left,
                    op: *op,
                    right: new_right,
                },
                loads,
            )
        }
    }
}

/// Rewrite one TAC instruction into its TACspill equivalent(s).
fn spill_instr(
    i: &tac::Instr,
    reg_map: &RegisterMap,
    scratch: &ScratchRegs,
) -> Vec<tacspill::Instr> {
    match i {
        tac::Instr::Assign { var, exp } => {
            let (new_exp, loads) = spill_exp(exp, reg_map, scratch);
            let (new_var, stores) = spill_ident(var, reg_map, &scratch.t1, SlotAccess::Store);
            let mut out = loads;
            out.push(tacspill::Instr::Assign {
                var: new_var,
                exp: new_exp,
            });
            out.extend(stores);
            out
        }
        tac::Instr::Call { var, name, args } => {
            let mut loads = Vec::new();
            let mut new_args = Vec::new();
            for a in args {
                let (new_a, l) = spill_prim(a, reg_map, &scratch.t1);
                new_args.push(new_a);
                loads.extend(l);
            }
            let (new_var, stores) = match var {
                Some(x) => {
                    let (new_x, s) = spill_ident(x, reg_map, &scratch.t1, SlotAccess::Store);
                    (Some(new_x), s)
                }
                None => (None, Vec::new()),
            };
            let mut out = loads;
            out.push(tacspill::Instr::Call {
                var: new_var,
                name: name.clone(),
                args: new_args,
            });
            out.extend(stores);
            out
        }
        tac::Instr::GotoIf { test, label } => {
            let (new_test, mut out) = spill_prim(test, reg_map, &scratch.t1);
            out.push(tacspill::Instr::GotoIf {
                test: new_test,
                label: label.clone(),
            });
            out
        }
        tac::Instr::Goto { label } => vec![tacspill::Instr::Goto {
            label: label.clone(),
        }],
        tac::Instr::Label { label } => vec![tacspill::Instr::Label {
            label: label.clone(),
        }],
    }
}

/// Transform TAC to TACspill with at most `max_regs` `$s` registers.
pub fn tac_to_tac_spill(
    instrs: &[tac::Instr],
    max_regs: usize,
    scratch: &ScratchRegs,
) -> Result<Vec<tacspill::Instr>, BackendError> {
    tac_to_tac_spill_with(instrs, max_regs, scratch, &HashMap::new())
}

/// Like [`tac_to_tac_spill`], with an explicit secondary tie-break order for
/// the allocator (used by tests that need a fixed coloring).
pub fn tac_to_tac_spill_with(
    instrs: &[tac::Instr],
    max_regs: usize,
    scratch: &ScratchRegs,
    secondary_order: &HashMap<Ident, i64>,
) -> Result<Vec<tacspill::Instr>, BackendError> {
    info!("TAC to TACspill, max_regs={max_regs}");
    let cfg = build_control_flow_graph(instrs)?;
    debug!("control flow graph: {cfg:?}");
    let interf = build_interf_graph(&cfg)?;
    let reg_map = color_interf_graph(&interf, secondary_order, max_regs);
    Ok(instrs
        .iter()
        .flat_map(|i| spill_instr(i, &reg_map, scratch))
        .collect())
}
