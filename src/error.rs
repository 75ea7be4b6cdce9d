use thiserror::Error;

use crate::instruction::OpCode;

/// Errors surfaced while loading or executing a program.
///
/// All engine failures propagate to the caller; there is no silent
/// recovery. Reverse-stepping an empty execution log is not an error
/// (see [`Machine::reverse_step`](crate::Machine::reverse_step)).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// The program failed load-time validation.
    #[error("invalid program: {0}")]
    InvalidProgram(#[from] ProgramError),

    /// `step` was invoked with the program counter outside the program.
    #[error("pc {pc} outside program of {len} instructions")]
    PcOutOfRange { pc: usize, len: usize },

    /// A taken branch names a label absent from the label map.
    #[error("unknown label `{label}`")]
    UnknownLabel { label: String },

    /// A forward or reverse handler is missing for a declared opcode.
    /// Reaching this is an internal bug, not a program error.
    #[error("no handler for opcode {op}")]
    UnsupportedOpcode { op: OpCode },
}

/// Program validity errors, raised by the assembly parser or by
/// load-time validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgramError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: {op} expects `{expected}`")]
    MalformedOperands {
        line: usize,
        op: &'static str,
        expected: &'static str,
    },

    #[error("line {line}: malformed operand `{token}`")]
    BadOperand { line: usize, token: String },

    #[error("line {line}: duplicate label `{label}`")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: `{label}` is not a valid label name")]
    InvalidLabel { line: usize, label: String },

    /// `RADD`/`RXOR` with `rd == rs1` would lose the prior register
    /// value on reverse; such programs are rejected when loaded.
    #[error("{op} r{rd}, r{rd} is not invertible (rd and rs1 alias)")]
    AliasedOperands { op: &'static str, rd: u8 },

    #[error("register r{reg} out of range (register file holds {count})")]
    RegisterOutOfRange { reg: u8, count: usize },
}
