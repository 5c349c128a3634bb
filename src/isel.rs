//! Instruction selection: TACspill → MIPS.
//!
//! A pure pattern match over TACspill forms.  Constant/constant expressions
//! fold at translation time; a constant operand next to a register is
//! materialised through the selector's scratch register.  The two builtins
//! are recognised by callee name and expand to fixed syscall sequences.
//! Spill slot offsets are assigned on first encounter, 4 bytes per slot,
//! and never reused.

use crate::mips::{self, Imm, Reg};
use crate::spill::ScratchRegs;
use crate::tac::{BinOp, Exp, Ident, Prim, INPUT_I64, PRINT_I32, PRINT_I64};
use crate::tacspill;
use crate::BackendError;
use std::collections::HashMap;

/// Spill-slot offset table.  Offsets grow monotonically from 0 in 4-byte
/// steps, keyed by the spilled identifier's original name.
pub struct StackLocs {
    offsets: HashMap<String, i64>,
}

impl StackLocs {
    pub fn new() -> Self {
        StackLocs {
            offsets: HashMap::new(),
        }
    }

    /// The stack offset of `name`, assigning the next free slot on first
    /// encounter.
    pub fn stack_offset(&mut self, name: &str) -> i64 {
        match self.offsets.get(name) {
            Some(&off) => off,
            None => {
                // All values are word-sized.
                let off = self.offsets.len() as i64 * 4;
                self.offsets.insert(name.to_string(), off);
                off
            }
        }
    }
}

impl Default for StackLocs {
    fn default() -> Self {
        Self::new()
    }
}

fn reg(x: &Ident) -> Reg {
    Reg::new(x.as_str())
}

fn op_of(op: BinOp) -> mips::Op {
    match op {
        BinOp::Add => mips::Op::Add,
        BinOp::Sub => mips::Op::Sub,
        BinOp::Mul => mips::Op::Mul,
        BinOp::Eq => mips::Op::Eq,
        BinOp::Ne => mips::Op::NotEq,
        BinOp::Lt => mips::Op::Less,
        BinOp::Gt => mips::Op::Greater,
        BinOp::Le => mips::Op::LessEq,
        BinOp::Ge => mips::Op::GreaterEq,
    }
}

/// `li $v0, 4; la $a0, newline; syscall`: print the newline string.
fn print_newline() -> Vec<mips::Instr> {
    vec![
        mips::Instr::LoadI {
            target: Reg::v0(),
            value: Imm::small(4),
        },
        mips::Instr::LoadA {
            target: Reg::a0(),
            label: "newline".into(),
        },
        mips::Instr::Syscall,
    ]
}

fn syscall_code(code: i16) -> mips::Instr {
    mips::Instr::LoadI {
        target: Reg::v0(),
        value: Imm::small(code),
    }
}

/// Select MIPS instructions for a TACspill assignment.
fn assign_to_mips(
    var: &Ident,
    exp: &Exp,
    scratch: &ScratchRegs,
) -> Result<Vec<mips::Instr>, BackendError> {
    match exp {
        Exp::Prim(Prim::Const(n)) => Ok(vec![mips::Instr::LoadI {
            target: reg(var),
            value: Imm::new(*n)?,
        }]),
        Exp::Prim(Prim::Name(y)) => Ok(vec![mips::Instr::Move {
            target: reg(var),
            source: reg(y),
        }]),
        Exp::BinOp { left, op, right } => {
            let target = reg(var);
            let emit = |left: Reg, right: Reg| mips::Instr::Op {
                op: op_of(*op),
                target: target.clone(),
                left,
                right,
            };
            match (left, right) {
                // Both operands known: fold at translation time.
                (Prim::Const(a), Prim::Const(b)) => Ok(vec![mips::Instr::LoadI {
                    target,
                    value: Imm::new(op.eval(*a, *b))?,
                }]),
                (Prim::Const(a), Prim::Name(z)) => {
                    let tmp = reg(&scratch.t3);
                    Ok(vec![
                        mips::Instr::LoadI {
                            target: tmp.clone(),
                            value: Imm::new(*a)?,
                        },
                        emit(tmp, reg(z)),
                    ])
                }
                (Prim::Name(y), Prim::Const(b)) => {
                    let tmp = reg(&scratch.t3);
                    Ok(vec![
                        mips::Instr::LoadI {
                            target: tmp.clone(),
                            value: Imm::new(*b)?,
                        },
                        emit(reg(y), tmp),
                    ])
                }
                (Prim::Name(y), Prim::Name(z)) => Ok(vec![emit(reg(y), reg(z))]),
            }
        }
    }
}

/// Select MIPS instructions for a builtin call.
fn call_to_mips(
    i: &tacspill::Instr,
    var: &Option<Ident>,
    name: &Ident,
    args: &[Prim],
) -> Result<Vec<mips::Instr>, BackendError> {
    let is_print = name.as_str() == PRINT_I64 || name.as_str() == PRINT_I32;
    let is_input = name.as_str() == INPUT_I64;
    match (var, args) {
        (None, [Prim::Const(n)]) if is_print => {
            let mut out = vec![
                mips::Instr::LoadI {
                    target: Reg::a0(),
                    value: Imm::new(*n)?,
                },
                syscall_code(1),
                mips::Instr::Syscall,
            ];
            out.extend(print_newline());
            Ok(out)
        }
        (None, [Prim::Name(y)]) if is_print => {
            let mut out = vec![
                mips::Instr::Move {
                    target: Reg::a0(),
                    source: reg(y),
                },
                syscall_code(1),
                mips::Instr::Syscall,
            ];
            out.extend(print_newline());
            Ok(out)
        }
        (Some(x), []) if is_input => Ok(vec![
            syscall_code(5),
            mips::Instr::Syscall,
            mips::Instr::Move {
                target: reg(x),
                source: Reg::v0(),
            },
        ]),
        _ => Err(BackendError::InvalidCall(i.to_string())),
    }
}

/// Select MIPS instructions for one TACspill instruction.
fn to_mips(
    i: &tacspill::Instr,
    locs: &mut StackLocs,
    scratch: &ScratchRegs,
) -> Result<Vec<mips::Instr>, BackendError> {
    match i {
        tacspill::Instr::Assign { var, exp } => assign_to_mips(var, exp, scratch),
        tacspill::Instr::Call { var, name, args } => call_to_mips(i, var, name, args),
        tacspill::Instr::GotoIf {
            test: Prim::Const(n),
            label,
        } => {
            let tmp = reg(&scratch.t3);
            Ok(vec![
                mips::Instr::LoadI {
                    target: tmp.clone(),
                    value: Imm::new(*n)?,
                },
                mips::Instr::BranchNeqZero {
                    reg: tmp,
                    label: label.clone(),
                },
            ])
        }
        tacspill::Instr::GotoIf {
            test: Prim::Name(y),
            label,
        } => Ok(vec![mips::Instr::BranchNeqZero {
            reg: reg(y),
            label: label.clone(),
        }]),
        tacspill::Instr::Goto { label } => Ok(vec![mips::Instr::Branch {
            label: label.clone(),
        }]),
        tacspill::Instr::Label { label } => Ok(vec![mips::Instr::Label {
            label: label.clone(),
        }]),
        tacspill::Instr::Spill { reg: x, slot } => {
            let off = locs.stack_offset(slot);
            Ok(vec![mips::Instr::StoreWord {
                src: reg(x),
                offset: Imm::new(off)?,
                base: Reg::sp(),
            }])
        }
        tacspill::Instr::Unspill { reg: x, slot } => {
            let off = locs.stack_offset(slot);
            Ok(vec![mips::Instr::LoadWord {
                target: reg(x),
                offset: Imm::new(off)?,
                base: Reg::sp(),
            }])
        }
    }
}

/// Translate a TACspill instruction stream to MIPS.
pub fn tac_spill_to_mips(
    instrs: &[tacspill::Instr],
    scratch: &ScratchRegs,
) -> Result<Vec<mips::Instr>, BackendError> {
    let mut locs = StackLocs::new();
    let mut out = Vec::new();
    for i in instrs {
        out.extend(to_mips(i, &mut locs, scratch)?);
    }
    Ok(out)
}
