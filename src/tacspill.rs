//! TACspill: TAC after register allocation.
//!
//! Structurally parallel to TAC, but every identifier is now a physical
//! register name (`$s0..`, or one of the scratch registers), and two new
//! instruction forms move values between registers and named spill slots.

use crate::tac::{Exp, Ident, Prim};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `reg = exp`, where the operands of `exp` are registers or constants.
    Assign { var: Ident, exp: Exp },
    /// Builtin call; at most one argument.
    Call {
        var: Option<Ident>,
        name: Ident,
        args: Vec<Prim>,
    },
    GotoIf { test: Prim, label: String },
    Goto { label: String },
    Label { label: String },
    /// Store register `reg` to the spill slot named after the original
    /// identifier.
    Spill { reg: Ident, slot: String },
    /// Load the spill slot back into register `reg`.
    Unspill { reg: Ident, slot: String },
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
            Instr::Spill { reg, slot } => write!(f, "  SPILL({reg}, {slot})"),
            Instr::Unspill { reg, slot } => write!(f, "  UNSPILL({reg}, {slot})"),
        }
    }
}

/// Render a list of instructions, one line per instruction.
pub fn pretty_instrs(instrs: &[Instr]) -> String {
    let lines: Vec<String> = instrs.iter().map(|i| i.to_string()).collect();
    lines.join("\n")
}
