//! The MIPS target instruction set.
//!
//! A deliberately small slice of MIPS: three-register arithmetic/compare
//! ops, load/store with a 16-bit displacement, branches, moves, and
//! `syscall` for the two builtins.  `Display` lowers each instruction to one
//! line of SPIM-compatible assembly text.

use crate::BackendError;
use std::fmt;

/// A physical register by name (`$s0`, `$t2`, `$v0`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reg(pub String);

impl Reg {
    pub fn new(name: impl Into<String>) -> Self {
        Reg(name.into())
    }

    pub fn v0() -> Self {
        Reg::new("$v0")
    }

    pub fn a0() -> Self {
        Reg::new("$a0")
    }

    pub fn sp() -> Self {
        Reg::new("$sp")
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 16-bit signed immediate.  Construction checks the representable range;
/// violations are fatal capacity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imm(i64);

impl Imm {
    pub fn new(value: i64) -> Result<Self, BackendError> {
        if !(-(1 << 15)..(1 << 15)).contains(&value) {
            return Err(BackendError::ImmediateOutOfRange(value));
        }
        Ok(Imm(value))
    }

    /// Infallible constructor for values that fit by construction.
    pub fn small(value: i16) -> Self {
        Imm(value as i64)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Imm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-register operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Eq,
    NotEq,
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mulo",
            Op::Less => "slt",
            Op::LessEq => "sle",
            Op::Greater => "sgt",
            Op::GreaterEq => "sge",
            Op::Eq => "seq",
            Op::NotEq => "sne",
        }
    }
}

/// A single MIPS instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `op Rd,Ra,Rb`
    Op {
        op: Op,
        target: Reg,
        left: Reg,
        right: Reg,
    },
    /// `lw Rd off(Rb)`
    LoadWord { target: Reg, offset: Imm, base: Reg },
    /// `li Rd, imm`
    LoadI { target: Reg, value: Imm },
    /// `la Rd, label`
    LoadA { target: Reg, label: String },
    /// `sw Rs off(Rb)`
    StoreWord { src: Reg, offset: Imm, base: Reg },
    /// `bnez Rs, label`
    BranchNeqZero { reg: Reg, label: String },
    /// `b label`
    Branch { label: String },
    /// `move Rd,Rs`
    Move { target: Reg, source: Reg },
    Syscall,
    Label { label: String },
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Op {
                op,
                target,
                left,
                right,
            } => write!(f, "  {} {target},{left},{right}", op.mnemonic()),
            Instr::LoadWord {
                target,
                offset,
                base,
            } => write!(f, "  lw {target} {offset}({base})"),
            Instr::LoadI { target, value } => write!(f, "  li {target}, {value}"),
            Instr::LoadA { target, label } => write!(f, "  la {target}, {label}"),
            Instr::StoreWord { src, offset, base } => write!(f, "  sw {src} {offset}({base})"),
            Instr::BranchNeqZero { reg, label } => write!(f, "  bnez {reg}, {label}"),
            Instr::Branch { label } => write!(f, "  b {label}"),
            Instr::Move { target, source } => write!(f, "  move {target},{source}"),
            Instr::Syscall => write!(f, "  syscall"),
            Instr::Label { label } => write!(f, "{label}:"),
        }
    }
}

/// Render a list of instructions, one line per instruction.
pub fn pretty_instrs(instrs: &[Instr]) -> String {
    let lines: Vec<String> = instrs.iter().map(|i| i.to_string()).collect();
    lines.join("\n")
}

/// Program prologue: data section with the newline string, entry label.
pub fn prologue() -> &'static str {
    "\n  .data\nnewline:\n  .asciiz  \"\\n\"\n  .text\n  .globl main\nmain:\n"
}

/// Program epilogue: exit syscall.
pub fn epilogue() -> &'static str {
    "\n\n  # exit\n  li $v0,10\n  syscall\n"
}
