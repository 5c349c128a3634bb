//! Three-address code (TAC), the input representation of the backend.
//!
//! TAC is a flat, ordered instruction list with no nested structure.  The
//! upstream lowering stage guarantees that every branch target exists as a
//! `Label` in the same list, that no two labels share a name, and that
//! identifiers are globally unique within one compiled unit.

use std::fmt;

/// An immutable variable name (source variable or compiler temporary).
/// Equality and hashing are by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(pub String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Ident(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builtin function names recognised by the backend.
pub const PRINT_I64: &str = "$print_i64";
pub const PRINT_I32: &str = "$print_i32";
pub const INPUT_I64: &str = "$input_i64";

// ── Operators ───────────────────────────────────────────────────────────

/// The closed set of binary operators.  Comparisons produce 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    /// The operator name as it appears in printed TAC.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::Eq => "EQ",
            BinOp::Ne => "NE",
            BinOp::Lt => "LT_S",
            BinOp::Gt => "GT_S",
            BinOp::Le => "LE_S",
            BinOp::Ge => "GE_S",
        }
    }

    /// Evaluate the operator on two values.  Shared by the interpreters and
    /// by constant folding in instruction selection.
    pub fn eval(&self, v1: i64, v2: i64) -> i64 {
        let b = |x: bool| x as i64;
        match self {
            BinOp::Add => v1.wrapping_add(v2),
            BinOp::Sub => v1.wrapping_sub(v2),
            BinOp::Mul => v1.wrapping_mul(v2),
            BinOp::Eq => b(v1 == v2),
            BinOp::Ne => b(v1 != v2),
            BinOp::Lt => b(v1 < v2),
            BinOp::Gt => b(v1 > v2),
            BinOp::Le => b(v1 <= v2),
            BinOp::Ge => b(v1 >= v2),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Expressions ─────────────────────────────────────────────────────────

/// A primitive operand: an integer constant or a variable read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prim {
    Const(i64),
    Name(Ident),
}

impl Prim {
    pub fn name(s: impl Into<String>) -> Self {
        Prim::Name(Ident::new(s))
    }
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prim::Const(v) => write!(f, "{v}"),
            Prim::Name(x) => write!(f, "{x}"),
        }
    }
}

/// The right-hand side of an assignment: a primitive or a binary operation
/// with at most two source operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exp {
    Prim(Prim),
    BinOp { left: Prim, op: BinOp, right: Prim },
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exp::Prim(p) => write!(f, "{p}"),
            Exp::BinOp { left, op, right } => write!(f, "{op}({left}, {right})"),
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────────

/// A single TAC instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `var = exp`
    Assign { var: Ident, exp: Exp },
    /// `var = CALL(name, args)`; `var` is absent for calls used only for
    /// their effect (e.g. print).
    Call {
        var: Option<Ident>,
        name: Ident,
        args: Vec<Prim>,
    },
    /// `IF test GOTO label`, taken when `test` is non-zero.
    GotoIf { test: Prim, label: String },
    /// `GOTO label`
    Goto { label: String },
    /// `label:`
    Label { label: String },
}

impl Instr {
    pub fn assign(var: impl Into<String>, exp: Exp) -> Self {
        Instr::Assign {
            var: Ident::new(var),
            exp,
        }
    }

    pub fn binop(var: impl Into<String>, left: Prim, op: BinOp, right: Prim) -> Self {
        Instr::Assign {
            var: Ident::new(var),
            exp: Exp::BinOp { left, op, right },
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Assign { var, exp } => write!(f, "  {var} = {exp}"),
            Instr::Call { var, name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                let call = format!("CALL({name}, {})", args.join(", "));
                match var {
                    Some(x) => write!(f, "  {x} = {call}"),
                    None => write!(f, "  {call}"),
                }
            }
            Instr::GotoIf { test, label } => write!(f, "  IF {test} GOTO {label}"),
            Instr::Goto { label } => write!(f, "  GOTO {label}"),
            Instr::Label { label } => write!(f, "{label}:"),
        }
    }
}

/// Render a list of instructions, one line per instruction.
pub fn pretty_instrs(instrs: &[Instr]) -> String {
    let lines: Vec<String> = instrs.iter().map(|i| i.to_string()).collect();
    lines.join("\n")
}
