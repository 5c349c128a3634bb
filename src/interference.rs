//! Interference-graph construction.
//!
//! Two variables interfere when one is being defined at a point where the
//! other is live, making it unsafe to assign both the same register.  The
//! graph is undirected over identifiers; every identifier defined or used
//! anywhere in the program gets a vertex, even if it never interferes.

use crate::cfg::ControlFlowGraph;
use crate::graph::{Graph, GraphKind};
use crate::liveness::{instr_def, instr_use, InstrId, Liveness};
use crate::tac::{Exp, Ident, Instr, Prim};
use crate::BackendError;
use log::debug;

pub type InterfGraph = Graph<Ident, ()>;

/// Build the interference graph of a control-flow graph.
pub fn build_interf_graph(g: &ControlFlowGraph) -> Result<InterfGraph, BackendError> {
    let live = Liveness::analyze(g)?;

    let mut interf: InterfGraph = Graph::new(GraphKind::Undirected);
    // Vertex pre-pass: every identifier defined or used by any instruction,
    // in first-encounter order.
    for b in g.vertices() {
        for instr in &g.get_data(b)?.instrs {
            for x in instr_def(instr).into_iter().chain(instr_use(instr)) {
                if !interf.has_vertex(&x) {
                    interf.add_vertex(x, ())?;
                }
            }
        }
    }

    for b in g.vertices() {
        for (k, instr) in g.get_data(b)?.instrs.iter().enumerate() {
            add_edges_for_instr((*b, k), instr, &live, &mut interf)?;
        }
    }
    debug!("interference graph: {interf:?}");
    Ok(interf)
}

/// Add the edges contributed by one instruction: every variable live across
/// the instruction interferes with every variable it defines.
///
/// Exception: for `x = y OP z`, no edge is added between `x` and the *left*
/// operand `y`, so that `y` may share the destination register.  The right
/// operand and plain copies get no such treatment; this asymmetry is kept
/// for compatibility with the established allocation results.
fn add_edges_for_instr(
    id: InstrId,
    instr: &Instr,
    live: &Liveness,
    interf: &mut InterfGraph,
) -> Result<(), BackendError> {
    let empty = std::collections::HashSet::new();
    let before = live.before(id).unwrap_or(&empty);
    let after = live.after(id).unwrap_or(&empty);

    for v in instr_def(instr) {
        for u in before.iter().chain(after.iter()) {
            if *u == v {
                continue;
            }
            if is_left_operand(instr, u) {
                continue;
            }
            interf.add_edge(u.clone(), v.clone())?;
        }
    }
    Ok(())
}

fn is_left_operand(instr: &Instr, u: &Ident) -> bool {
    matches!(
        instr,
        Instr::Assign {
            exp: Exp::BinOp {
                left: Prim::Name(y),
                ..
            },
            ..
        } if y == u
    )
}
