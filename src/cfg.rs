//! Control-flow graph construction.
//!
//! Partitions a flat TAC instruction list into maximal basic blocks and
//! links them according to branch semantics: a block ending in `Goto` jumps
//! to the block owning the target label; a block ending in `GotoIf` gets
//! both the branch edge and a fall-through edge; any other block falls
//! through to the next sequential block, if one exists.

use crate::graph::{Graph, GraphKind};
use crate::tac::Instr;
use crate::BackendError;
use log::debug;
use std::collections::HashMap;

/// A maximal run of instructions with a single entry and a single exit.
///
/// Invariants: only the last instruction may be a branch; labels appear only
/// in the `labels` set attached to the block entry, never in `instrs`.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Position in block order.
    pub index: usize,
    /// Labels attached to the block entry.  Consecutive labels collapse
    /// into one block, so a block may carry several.
    pub labels: Vec<String>,
    /// The non-label instructions of the block.
    pub instrs: Vec<Instr>,
}

impl BasicBlock {
    pub fn last(&self) -> Option<&Instr> {
        self.instrs.last()
    }
}

pub type ControlFlowGraph = Graph<usize, BasicBlock>;

/// Peel one maximal basic block off the front of `instrs`.
/// Returns the block and the remaining instructions.
fn first_basic_block(instrs: &[Instr], index: usize) -> (BasicBlock, &[Instr]) {
    // Strip off all leading labels.
    let mut labels = Vec::new();
    let mut rest = instrs;
    while let Some(Instr::Label { label }) = rest.first() {
        labels.push(label.clone());
        rest = &rest[1..];
    }
    // Find the first instruction that is a jump or a label.  Jumps are part
    // of the block, labels are not.
    let mut end = rest.len();
    for (i, instr) in rest.iter().enumerate() {
        match instr {
            Instr::Assign { .. } | Instr::Call { .. } => {}
            Instr::Goto { .. } | Instr::GotoIf { .. } => {
                end = i + 1;
                break;
            }
            Instr::Label { .. } => {
                end = i;
                break;
            }
        }
    }
    let block = BasicBlock {
        index,
        labels,
        instrs: rest[..end].to_vec(),
    };
    (block, &rest[end..])
}

/// Build the control-flow graph of a TAC instruction list.
///
/// Fails with [`BackendError::UnresolvedLabel`] if some branch targets a
/// label that no block owns; this indicates malformed input from the
/// upstream TAC producer.
pub fn build_control_flow_graph(instrs: &[Instr]) -> Result<ControlFlowGraph, BackendError> {
    let mut g: ControlFlowGraph = Graph::new(GraphKind::Directed);
    let mut label_to_idx: HashMap<String, usize> = HashMap::new();

    let mut rest = instrs;
    let mut idx = 0;
    while !rest.is_empty() {
        let (bb, remaining) = first_basic_block(rest, idx);
        rest = remaining;
        debug!("block {idx}: labels={:?}, {} instrs", bb.labels, bb.instrs.len());
        for l in &bb.labels {
            label_to_idx.insert(l.clone(), idx);
        }
        g.add_vertex(idx, bb)?;
        idx += 1;
    }

    // Edge pass: every target label is known by now.
    let block_count = g.vertex_count();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for bb in g.values() {
        let mut succs = Vec::new();
        match bb.last() {
            Some(Instr::Goto { label }) => {
                let tgt = label_to_idx
                    .get(label)
                    .ok_or_else(|| BackendError::UnresolvedLabel(label.clone()))?;
                succs.push(*tgt);
            }
            Some(Instr::GotoIf { label, .. }) => {
                let tgt = label_to_idx
                    .get(label)
                    .ok_or_else(|| BackendError::UnresolvedLabel(label.clone()))?;
                succs.push(*tgt);
                if bb.index + 1 < block_count {
                    succs.push(bb.index + 1);
                }
            }
            _ => {
                if bb.index + 1 < block_count {
                    succs.push(bb.index + 1);
                }
            }
        }
        for s in succs {
            edges.push((bb.index, s));
        }
    }
    for (src, tgt) in edges {
        g.add_edge(src, tgt)?;
    }
    Ok(g)
}
