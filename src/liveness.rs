//! Liveness analysis: iterative backward dataflow over the control-flow
//! graph.
//!
//! The fixpoint loop maintains block-level live-in/live-out sets only; a
//! final pass re-runs the per-instruction transfer with the converged
//! live-out sets to record the `before`/`after` set of every instruction,
//! which is what interference-graph construction needs.
//!
//! Termination is guaranteed: the sets grow monotonically inside the finite
//! universe of program identifiers.

use crate::cfg::ControlFlowGraph;
use crate::tac::{Exp, Ident, Instr, Prim};
use crate::BackendError;
use std::collections::{HashMap, HashSet};

/// Identifies one instruction as (block index, instruction index within the
/// block).
pub type InstrId = (usize, usize);

/// Identifiers written by an instruction.
pub fn instr_def(instr: &Instr) -> Vec<Ident> {
    match instr {
        Instr::Assign { var, .. } => vec![var.clone()],
        Instr::Call { var: Some(x), .. } => vec![x.clone()],
        Instr::Call { var: None, .. }
        | Instr::GotoIf { .. }
        | Instr::Goto { .. }
        | Instr::Label { .. } => Vec::new(),
    }
}

fn prim_use(p: &Prim) -> Option<Ident> {
    match p {
        Prim::Const(_) => None,
        Prim::Name(x) => Some(x.clone()),
    }
}

/// Identifiers read by an instruction.
pub fn instr_use(instr: &Instr) -> Vec<Ident> {
    match instr {
        Instr::Assign { exp, .. } => match exp {
            Exp::Prim(p) => prim_use(p).into_iter().collect(),
            Exp::BinOp { left, right, .. } => {
                prim_use(left).into_iter().chain(prim_use(right)).collect()
            }
        },
        Instr::Call { args, .. } => args.iter().filter_map(prim_use).collect(),
        Instr::GotoIf { test, .. } => prim_use(test).into_iter().collect(),
        Instr::Goto { .. } | Instr::Label { .. } => Vec::new(),
    }
}

/// Per-instruction liveness tables.
pub struct Liveness {
    before: HashMap<InstrId, HashSet<Ident>>,
    after: HashMap<InstrId, HashSet<Ident>>,
}

impl Liveness {
    /// Run the fixpoint over `g` and record per-instruction sets.
    pub fn analyze(g: &ControlFlowGraph) -> Result<Self, BackendError> {
        // Reverse block order converges faster for a backward problem;
        // any fixed order would be correct.
        let mut order: Vec<usize> = g.vertices().copied().collect();
        order.sort_unstable_by(|a, b| b.cmp(a));

        let mut live_in: HashMap<usize, HashSet<Ident>> =
            order.iter().map(|&b| (b, HashSet::new())).collect();
        let mut live_out: HashMap<usize, HashSet<Ident>> =
            order.iter().map(|&b| (b, HashSet::new())).collect();

        let mut changed = true;
        while changed {
            changed = false;
            for &b in &order {
                let mut new_out: HashSet<Ident> = HashSet::new();
                for s in g.succs(&b) {
                    new_out.extend(live_in[s].iter().cloned());
                }
                if new_out != live_out[&b] {
                    live_out.insert(b, new_out.clone());
                    changed = true;
                }
                let new_in = transfer(&g.get_data(&b)?.instrs, &new_out);
                if new_in != live_in[&b] {
                    live_in.insert(b, new_in);
                    changed = true;
                }
            }
        }

        // Final pass: expand the converged block boundaries into
        // per-instruction before/after sets.
        let mut before = HashMap::new();
        let mut after = HashMap::new();
        for b in g.vertices() {
            let instrs = &g.get_data(b)?.instrs;
            let mut live = live_out[b].clone();
            for (k, instr) in instrs.iter().enumerate().rev() {
                after.insert((*b, k), live.clone());
                for x in instr_def(instr) {
                    live.remove(&x);
                }
                live.extend(instr_use(instr));
                before.insert((*b, k), live.clone());
            }
        }
        Ok(Liveness { before, after })
    }

    /// Variables live immediately before instruction `id`.
    pub fn before(&self, id: InstrId) -> Option<&HashSet<Ident>> {
        self.before.get(&id)
    }

    /// Variables live immediately after instruction `id`.
    pub fn after(&self, id: InstrId) -> Option<&HashSet<Ident>> {
        self.after.get(&id)
    }
}

/// Walk a block's instructions back to front, applying
/// `before = (after \ def) ∪ use`.  Returns the live set at the block entry
/// (`live_out` unchanged for an empty block).
fn transfer(instrs: &[Instr], live_out: &HashSet<Ident>) -> HashSet<Ident> {
    let mut live = live_out.clone();
    for instr in instrs.iter().rev() {
        for x in instr_def(instr) {
            live.remove(&x);
        }
        live.extend(instr_use(instr));
    }
    live
}
