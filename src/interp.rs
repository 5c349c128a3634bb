//! Reference interpreters for TAC and TACspill.
//!
//! Used by the test suite to check that the spill rewrite preserves program
//! behaviour: the same input must produce the same printed output before
//! and after allocation.  Inputs are injected and printed values collected,
//! so no I/O happens here.

use crate::tac::{self, Exp, Ident, Prim, INPUT_I64, PRINT_I32, PRINT_I64};
use crate::tacspill;
use crate::BackendError;
use std::collections::HashMap;

struct Io {
    inputs: Vec<i64>,
    next_input: usize,
    output: Vec<i64>,
}

impl Io {
    fn new(inputs: &[i64]) -> Self {
        Io {
            inputs: inputs.to_vec(),
            next_input: 0,
            output: Vec::new(),
        }
    }

    fn read(&mut self) -> Result<i64, BackendError> {
        let v = self
            .inputs
            .get(self.next_input)
            .copied()
            .ok_or(BackendError::InputExhausted)?;
        self.next_input += 1;
        Ok(v)
    }
}

fn find_label<I>(instrs: &[I], label: &str, label_of: impl Fn(&I) -> Option<&str>) -> Result<usize, BackendError> {
    instrs
        .iter()
        .position(|i| label_of(i) == Some(label))
        .ok_or_else(|| BackendError::UnresolvedLabel(label.to_string()))
}

// ── TAC ─────────────────────────────────────────────────────────────────

/// Execute a TAC program against `inputs`, returning the printed values.
pub fn run_tac(instrs: &[tac::Instr], inputs: &[i64]) -> Result<Vec<i64>, BackendError> {
    let mut vars: HashMap<Ident, i64> = HashMap::new();
    let mut io = Io::new(inputs);
    let mut pc = 0;

    let lookup = |vars: &HashMap<Ident, i64>, x: &Ident| -> Result<i64, BackendError> {
        vars.get(x)
            .copied()
            .ok_or_else(|| BackendError::UndefinedVariable(x.0.clone()))
    };
    let eval_prim = |vars: &HashMap<Ident, i64>, p: &Prim| -> Result<i64, BackendError> {
        match p {
            Prim::Const(v) => Ok(*v),
            Prim::Name(x) => lookup(vars, x),
        }
    };

    while pc < instrs.len() {
        match &instrs[pc] {
            tac::Instr::Assign { var, exp } => {
                let v = match exp {
                    Exp::Prim(p) => eval_prim(&vars, p)?,
                    Exp::BinOp { left, op, right } => {
                        op.eval(eval_prim(&vars, left)?, eval_prim(&vars, right)?)
                    }
                };
                vars.insert(var.clone(), v);
                pc += 1;
            }
            i @ tac::Instr::Call { var, name, args } => {
                match (name.as_str(), args.as_slice()) {
                    (INPUT_I64, []) => {
                        let x = var
                            .clone()
                            .ok_or_else(|| BackendError::InvalidCall(i.to_string()))?;
                        let v = io.read()?;
                        vars.insert(x, v);
                    }
                    (PRINT_I64, [p]) | (PRINT_I32, [p]) => {
                        io.output.push(eval_prim(&vars, p)?);
                    }
                    _ => return Err(BackendError::InvalidCall(i.to_string())),
                }
                pc += 1;
            }
            tac::Instr::GotoIf { test, label } => {
                if eval_prim(&vars, test)? != 0 {
                    pc = find_label(instrs, label, |i| match i {
                        tac::Instr::Label { label } => Some(label.as_str()),
                        _ => None,
                    })?;
                } else {
                    pc += 1;
                }
            }
            tac::Instr::Goto { label } => {
                pc = find_label(instrs, label, |i| match i {
                    tac::Instr::Label { label } => Some(label.as_str()),
                    _ => None,
                })?;
            }
            tac::Instr::Label { .. } => pc += 1,
        }
    }
    Ok(io.output)
}

// ── TACspill ────────────────────────────────────────────────────────────

/// Execute a TACspill program against `inputs`, returning the printed
/// values.  Registers and spill slots are separate stores; `Spill` copies
/// register → slot, `Unspill` copies slot → register.
pub fn run_tac_spill(
    instrs: &[tacspill::Instr],
    inputs: &[i64],
) -> Result<Vec<i64>, BackendError> {
    let mut regs: HashMap<Ident, i64> = HashMap::new();
    let mut slots: HashMap<String, i64> = HashMap::new();
    let mut io = Io::new(inputs);
    let mut pc = 0;

    let lookup = |regs: &HashMap<Ident, i64>, x: &Ident| -> Result<i64, BackendError> {
        regs.get(x)
            .copied()
            .ok_or_else(|| BackendError::UndefinedVariable(x.0.clone()))
    };
    let eval_prim = |regs: &HashMap<Ident, i64>, p: &Prim| -> Result<i64, BackendError> {
        match p {
            Prim::Const(v) => Ok(*v),
            Prim::Name(x) => lookup(regs, x),
        }
    };

    while pc < instrs.len() {
        match &instrs[pc] {
            tacspill::Instr::Assign { var, exp } => {
                let v = match exp {
                    Exp::Prim(p) => eval_prim(&regs, p)?,
                    Exp::BinOp { left, op, right } => {
                        op.eval(eval_prim(&regs, left)?, eval_prim(&regs, right)?)
                    }
                };
                regs.insert(var.clone(), v);
                pc += 1;
            }
            i @ tacspill::Instr::Call { var, name, args } => {
                match (name.as_str(), args.as_slice()) {
                    (INPUT_I64, []) => {
                        let x = var
                            .clone()
                            .ok_or_else(|| BackendError::InvalidCall(i.to_string()))?;
                        let v = io.read()?;
                        regs.insert(x, v);
                    }
                    (PRINT_I64, [p]) | (PRINT_I32, [p]) => {
                        io.output.push(eval_prim(&regs, p)?);
                    }
                    _ => return Err(BackendError::InvalidCall(i.to_string())),
                }
                pc += 1;
            }
            tacspill::Instr::GotoIf { test, label } => {
                if eval_prim(&regs, test)? != 0 {
                    pc = find_label(instrs, label, |i| match i {
                        tacspill::Instr::Label { label } => Some(label.as_str()),
                        _ => None,
                    })?;
                } else {
                    pc += 1;
                }
            }
            tacspill::Instr::Goto { label } => {
                pc = find_label(instrs, label, |i| match i {
                    tacspill::Instr::Label { label } => Some(label.as_str()),
                    _ => None,
                })?;
            }
            tacspill::Instr::Label { .. } => pc += 1,
            tacspill::Instr::Spill { reg, slot } => {
                let v = lookup(&regs, reg)?;
                slots.insert(slot.clone(), v);
                pc += 1;
            }
            tacspill::Instr::Unspill { reg, slot } => {
                let v = slots
                    .get(slot)
                    .copied()
                    .ok_or_else(|| BackendError::UndefinedVariable(slot.clone()))?;
                regs.insert(reg.clone(), v);
                pc += 1;
            }
        }
    }
    Ok(io.output)
}
