use std::collections::HashSet;
use tac_mips::cfg::build_control_flow_graph;
use tac_mips::liveness::{instr_def, instr_use, Liveness};
use tac_mips::tac::{BinOp, Exp, Ident, Instr, Prim, INPUT_I64, PRINT_I64};

// ── Shared fixture ───────────────────────────────────────────────────────
// n = input(); res = 1; while n > 0 { res = res * n; n = n - 1 }; print(res)

fn factorial() -> Vec<Instr> {
    vec![
        Instr::Call {
            var: Some(Ident::new("n")),
            name: Ident::new(INPUT_I64),
            args: vec![],
        },
        Instr::assign("res", Exp::Prim(Prim::Const(1))),
        Instr::Label {
            label: "loop_start".into(),
        },
        Instr::binop("t", Prim::Const(0), BinOp::Lt, Prim::name("n")),
        Instr::GotoIf {
            test: Prim::name("t"),
            label: "loop_body".into(),
        },
        Instr::Goto {
            label: "loop_end".into(),
        },
        Instr::Label {
            label: "loop_body".into(),
        },
        Instr::binop("res", Prim::name("res"), BinOp::Mul, Prim::name("n")),
        Instr::binop("n", Prim::name("n"), BinOp::Sub, Prim::Const(1)),
        Instr::Goto {
            label: "loop_start".into(),
        },
        Instr::Label {
            label: "loop_end".into(),
        },
        Instr::Call {
            var: None,
            name: Ident::new(PRINT_I64),
            args: vec![Prim::name("res")],
        },
    ]
}

// ── CFG partition ────────────────────────────────────────────────────────

#[test]
fn cfg_partition_round_trips_the_instruction_list() {
    let prog = factorial();
    let g = build_control_flow_graph(&prog).unwrap();
    let mut rebuilt = Vec::new();
    for bb in g.values() {
        for l in &bb.labels {
            rebuilt.push(Instr::Label { label: l.clone() });
        }
        rebuilt.extend(bb.instrs.iter().cloned());
    }
    assert_eq!(rebuilt, prog);
}

#[test]
fn cfg_blocks_contain_at_most_one_trailing_branch() {
    let g = build_control_flow_graph(&factorial()).unwrap();
    for bb in g.values() {
        for instr in &bb.instrs[..bb.instrs.len().saturating_sub(1)] {
            assert!(
                matches!(instr, Instr::Assign { .. } | Instr::Call { .. }),
                "non-terminal instruction {instr} in block {}",
                bb.index
            );
        }
        assert!(
            !bb.instrs
                .iter()
                .any(|i| matches!(i, Instr::Label { .. })),
            "label inside block body"
        );
    }
}

#[test]
fn loop_has_a_back_edge() {
    let g = build_control_flow_graph(&factorial()).unwrap();
    // The loop body block ends in `GOTO loop_start`; find it and check the
    // edge points back to the block owning that label.
    let body = g
        .values()
        .find(|bb| bb.labels.contains(&"loop_body".to_string()))
        .unwrap();
    let head = g
        .values()
        .find(|bb| bb.labels.contains(&"loop_start".to_string()))
        .unwrap();
    assert!(g.succs(&body.index).contains(&&head.index));
}

// ── Liveness ─────────────────────────────────────────────────────────────

#[test]
fn liveness_satisfies_the_transfer_equation_everywhere() {
    let g = build_control_flow_graph(&factorial()).unwrap();
    let live = Liveness::analyze(&g).unwrap();
    for bb in g.values() {
        for (k, instr) in bb.instrs.iter().enumerate() {
            let id = (bb.index, k);
            let before = live.before(id).expect("before set recorded");
            let after = live.after(id).expect("after set recorded");
            let mut expected: HashSet<Ident> = after.clone();
            for x in instr_def(instr) {
                expected.remove(&x);
            }
            expected.extend(instr_use(instr));
            assert_eq!(before, &expected, "equation violated at {id:?}");
        }
    }
}

#[test]
fn liveness_after_equals_next_before_within_a_block() {
    let g = build_control_flow_graph(&factorial()).unwrap();
    let live = Liveness::analyze(&g).unwrap();
    for bb in g.values() {
        for k in 0..bb.instrs.len().saturating_sub(1) {
            assert_eq!(
                live.after((bb.index, k)).unwrap(),
                live.before((bb.index, k + 1)).unwrap(),
            );
        }
    }
}

#[test]
fn liveness_is_idempotent() {
    let g = build_control_flow_graph(&factorial()).unwrap();
    let a = Liveness::analyze(&g).unwrap();
    let b = Liveness::analyze(&g).unwrap();
    for bb in g.values() {
        for k in 0..bb.instrs.len() {
            let id = (bb.index, k);
            assert_eq!(a.before(id), b.before(id));
            assert_eq!(a.after(id), b.after(id));
        }
    }
}

#[test]
fn loop_variables_are_live_at_the_loop_head() {
    let g = build_control_flow_graph(&factorial()).unwrap();
    let live = Liveness::analyze(&g).unwrap();
    let head = g
        .values()
        .find(|bb| bb.labels.contains(&"loop_start".to_string()))
        .unwrap();
    // Both n and res flow around the loop.
    let before = live.before((head.index, 0)).unwrap();
    assert!(before.contains(&Ident::new("n")));
    assert!(before.contains(&Ident::new("res")));
}
