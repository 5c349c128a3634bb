use std::collections::HashMap;
use tac_mips::cfg::build_control_flow_graph;
use tac_mips::interference::{build_interf_graph, InterfGraph};
use tac_mips::liveness::{instr_def, Liveness};
use tac_mips::regalloc::color_interf_graph;
use tac_mips::tac::{BinOp, Exp, Ident, Instr, Prim, INPUT_I64, PRINT_I64};

fn input(var: &str) -> Instr {
    Instr::Call {
        var: Some(Ident::new(var)),
        name: Ident::new(INPUT_I64),
        args: vec![],
    }
}

fn print(var: &str) -> Instr {
    Instr::Call {
        var: None,
        name: Ident::new(PRINT_I64),
        args: vec![Prim::name(var)],
    }
}

fn interf_of(prog: &[Instr]) -> InterfGraph {
    let g = build_control_flow_graph(prog).unwrap();
    build_interf_graph(&g).unwrap()
}

// ── Interference construction ────────────────────────────────────────────

#[test]
fn simultaneously_live_variables_interfere() {
    // x, y and z are pairwise live across each other's definitions.
    let prog = vec![
        input("x"),
        input("y"),
        input("z"),
        print("x"),
        print("y"),
        print("z"),
    ];
    let interf = interf_of(&prog);
    for (a, b) in [("x", "y"), ("x", "z"), ("y", "z")] {
        assert!(interf.has_edge(&Ident::new(a), &Ident::new(b)));
        assert!(interf.has_edge(&Ident::new(b), &Ident::new(a)));
    }
}

#[test]
fn dead_variables_do_not_interfere() {
    // x is dead before y is defined.
    let prog = vec![
        Instr::assign("x", Exp::Prim(Prim::Const(1))),
        print("x"),
        Instr::assign("y", Exp::Prim(Prim::Const(2))),
        print("y"),
    ];
    let interf = interf_of(&prog);
    assert!(!interf.has_edge(&Ident::new("x"), &Ident::new("y")));
}

#[test]
fn every_defined_or_used_identifier_gets_a_vertex() {
    let prog = vec![
        Instr::assign("x", Exp::Prim(Prim::Const(1))),
        print("x"),
    ];
    let interf = interf_of(&prog);
    assert!(interf.has_vertex(&Ident::new("x")));
}

#[test]
fn interference_is_sound_against_liveness() {
    // For every instruction defining x, everything else live across it must
    // have an edge to x (modulo the left-operand exception).
    let prog = vec![
        input("a"),
        input("b"),
        Instr::binop("c", Prim::name("a"), BinOp::Add, Prim::name("b")),
        Instr::binop("d", Prim::name("c"), BinOp::Mul, Prim::name("a")),
        print("c"),
        print("d"),
    ];
    let g = build_control_flow_graph(&prog).unwrap();
    let live = Liveness::analyze(&g).unwrap();
    let interf = build_interf_graph(&g).unwrap();

    for bb in g.values() {
        for (k, instr) in bb.instrs.iter().enumerate() {
            let id = (bb.index, k);
            let left = match instr {
                Instr::Assign {
                    exp: Exp::BinOp {
                        left: Prim::Name(y),
                        ..
                    },
                    ..
                } => Some(y.clone()),
                _ => None,
            };
            for x in instr_def(instr) {
                let mut across: Vec<Ident> =
                    live.before(id).unwrap().iter().cloned().collect();
                across.extend(live.after(id).unwrap().iter().cloned());
                for u in across {
                    if u == x || Some(&u) == left.as_ref() {
                        continue;
                    }
                    assert!(
                        interf.has_edge(&u, &x),
                        "missing edge {u}-{x} at {id:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn left_operand_shares_no_edge_with_destination() {
    // c = ADD(a, b) with a live afterwards: the left operand a may share
    // the destination register, so no a-c edge is added here.
    let prog = vec![
        input("a"),
        input("b"),
        Instr::binop("c", Prim::name("a"), BinOp::Add, Prim::name("b")),
        print("c"),
        print("a"),
    ];
    let interf = interf_of(&prog);
    assert!(!interf.has_edge(&Ident::new("a"), &Ident::new("c")));
    assert!(interf.has_edge(&Ident::new("b"), &Ident::new("c")));
}

#[test]
fn right_operand_coincidence_still_interferes() {
    // Same shape, operands swapped: the exception does not apply to the
    // right operand.
    let prog = vec![
        input("a"),
        input("b"),
        Instr::binop("c", Prim::name("b"), BinOp::Add, Prim::name("a")),
        print("c"),
        print("a"),
    ];
    let interf = interf_of(&prog);
    assert!(interf.has_edge(&Ident::new("a"), &Ident::new("c")));
}

#[test]
fn left_operand_may_end_up_sharing_the_destination_register() {
    // Consequence of the missing a-c edge: the allocator is free to give
    // the destination the left operand's register, and with the default
    // tie-break it does.
    let prog = vec![
        input("a"),
        input("b"),
        Instr::binop("c", Prim::name("a"), BinOp::Add, Prim::name("b")),
        print("c"),
        print("a"),
    ];
    let interf = interf_of(&prog);
    let m = color_interf_graph(&interf, &HashMap::new(), 8);
    assert_eq!(m.color(&Ident::new("a")), m.color(&Ident::new("c")));
}

// ── Coloring ─────────────────────────────────────────────────────────────

#[test]
fn adjacent_vertices_get_distinct_colors() {
    let prog = vec![
        input("x"),
        input("y"),
        input("z"),
        print("x"),
        print("y"),
        print("z"),
    ];
    let interf = interf_of(&prog);
    let m = color_interf_graph(&interf, &HashMap::new(), 8);
    for (u, v) in interf.edges() {
        assert_ne!(m.color(u), m.color(v), "edge {u}-{v} shares a color");
    }
}

#[test]
fn non_interfering_variables_share_color_zero() {
    let prog = vec![
        Instr::assign("x", Exp::Prim(Prim::Const(1))),
        print("x"),
        Instr::assign("y", Exp::Prim(Prim::Const(2))),
        print("y"),
    ];
    let interf = interf_of(&prog);
    let m = color_interf_graph(&interf, &HashMap::new(), 4);
    assert_eq!(m.color(&Ident::new("x")), Some(0));
    assert_eq!(m.color(&Ident::new("y")), Some(0));
}

#[test]
fn three_cycle_with_two_registers_spills_exactly_one() {
    let prog = vec![
        input("x"),
        input("y"),
        input("z"),
        print("x"),
        print("y"),
        print("z"),
    ];
    let interf = interf_of(&prog);
    let m = color_interf_graph(&interf, &HashMap::new(), 2);
    let spilled: Vec<&str> = ["x", "y", "z"]
        .into_iter()
        .filter(|n| m.resolve(&Ident::new(*n)).is_none())
        .collect();
    assert_eq!(spilled.len(), 1, "expected exactly one spill, got {spilled:?}");
}

#[test]
fn budget_zero_spills_everything() {
    let prog = vec![
        input("x"),
        input("y"),
        print("x"),
        print("y"),
    ];
    let interf = interf_of(&prog);
    let m = color_interf_graph(&interf, &HashMap::new(), 0);
    for n in ["x", "y"] {
        assert_eq!(m.resolve(&Ident::new(n)), None);
        assert!(m.color(&Ident::new(n)).is_some(), "{n} still gets a color");
    }
}

#[test]
fn physical_registers_are_exactly_the_colors_below_budget() {
    let prog = vec![
        input("x"),
        input("y"),
        input("z"),
        print("x"),
        print("y"),
        print("z"),
    ];
    let interf = interf_of(&prog);
    let k = 2;
    let m = color_interf_graph(&interf, &HashMap::new(), k);
    for v in interf.vertices() {
        let c = m.color(v).unwrap();
        match m.resolve(v) {
            Some(reg) => {
                assert!(c < k);
                assert_eq!(reg, Ident::new(format!("$s{c}")));
            }
            None => assert!(c >= k),
        }
    }
}

// ── Determinism ──────────────────────────────────────────────────────────

#[test]
fn coloring_is_deterministic_across_runs() {
    let prog = vec![
        input("a"),
        input("b"),
        Instr::binop("c", Prim::name("a"), BinOp::Add, Prim::name("b")),
        Instr::binop("d", Prim::name("c"), BinOp::Mul, Prim::name("a")),
        print("c"),
        print("d"),
        print("b"),
    ];
    let interf1 = interf_of(&prog);
    let interf2 = interf_of(&prog);
    let m1 = color_interf_graph(&interf1, &HashMap::new(), 3);
    let m2 = color_interf_graph(&interf2, &HashMap::new(), 3);
    for v in interf1.vertices() {
        assert_eq!(m1.color(v), m2.color(v), "color of {v} differs between runs");
    }
}

#[test]
fn secondary_order_steers_tie_breaking() {
    let prog = vec![
        input("x"),
        input("y"),
        input("z"),
        print("x"),
        print("y"),
        print("z"),
    ];
    let interf = interf_of(&prog);
    // All three start with zero forbidden colors; the secondary order alone
    // decides who is colored first and therefore who receives color 0.
    let mut order = HashMap::new();
    order.insert(Ident::new("z"), 10);
    order.insert(Ident::new("y"), 5);
    order.insert(Ident::new("x"), 0);
    let m = color_interf_graph(&interf, &order, 8);
    assert_eq!(m.color(&Ident::new("z")), Some(0));
}
