//! ## Instruction Set Summary
//! These are the opcodes of the reversible register machine, shown with
//! their operands and forward semantics. All arithmetic is unsigned
//! 32-bit, wrapping modulo 2^32.
//!
//! ### Reversible data
//!
//! ```text
//! RXOR  rd, rs1        r[rd] = r[rd] XOR r[rs1]
//! RADD  rd, rs1        r[rd] = r[rd] + r[rs1]
//! RSWAP rd, rs1        swap r[rd], r[rs1]
//! ```
//!
//! ### Control flow (reversible at the PC level)
//!
//! ```text
//! BEQ   rs1, rs2, label    if r[rs1] == r[rs2]: PC = labels[label]
//! ```
//!
//! ### Irreversible data
//!
//! ```text
//! ADD   rd, rs1, (rs2|imm)     r[rd] = r[rs1] + operand
//! SUB   rd, rs1, (rs2|imm)     r[rd] = r[rs1] - operand
//! LOAD  rd, rs1 [, offset]     r[rd] = mem[r[rs1] + offset]
//! STORE rs1, rs2 [, offset]    mem[r[rs1] + offset] = r[rs2]
//! ```
//!
//! ### System
//!
//! ```text
//! HALT                 stop execution; the PC does not advance
//! ```
//!
//! The reversible opcodes are exactly `{RXOR, RADD, RSWAP, BEQ}`. A
//! reversible data opcode needs no recorded state to invert: XOR is its
//! own inverse, modular addition inverts with subtraction, and a swap
//! undoes itself. BEQ needs only the branch outcome and the PC it was
//! fetched from; it never touches the register file.

use std::fmt;

pub mod mnemonics;

pub use self::mnemonics::Mnemonic;

/// A register index into the machine's register file.
pub type Reg = u8;

/// The opcode tags of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    RXor,
    RAdd,
    RSwap,
    Beq,
    Add,
    Sub,
    Load,
    Store,
    Halt,
}

impl OpCode {
    /// The assembler mnemonic for this opcode.
    pub fn name(self) -> Mnemonic {
        match self {
            OpCode::RXor  => mnemonics::RXOR,
            OpCode::RAdd  => mnemonics::RADD,
            OpCode::RSwap => mnemonics::RSWAP,
            OpCode::Beq   => mnemonics::BEQ,
            OpCode::Add   => mnemonics::ADD,
            OpCode::Sub   => mnemonics::SUB,
            OpCode::Load  => mnemonics::LOAD,
            OpCode::Store => mnemonics::STORE,
            OpCode::Halt  => mnemonics::HALT,
        }
    }

    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(mnemonic: &str) -> Option<OpCode> {
        match mnemonic.to_ascii_uppercase().as_str() {
            mnemonics::RXOR  => Some(OpCode::RXor),
            mnemonics::RADD  => Some(OpCode::RAdd),
            mnemonics::RSWAP => Some(OpCode::RSwap),
            mnemonics::BEQ   => Some(OpCode::Beq),
            mnemonics::ADD   => Some(OpCode::Add),
            mnemonics::SUB   => Some(OpCode::Sub),
            mnemonics::LOAD  => Some(OpCode::Load),
            mnemonics::STORE => Some(OpCode::Store),
            mnemonics::HALT  => Some(OpCode::Halt),
            _ => None,
        }
    }

    /// True exactly for `{RXOR, RADD, RSWAP, BEQ}`.
    pub fn is_reversible(self) -> bool {
        matches!(self, OpCode::RXor | OpCode::RAdd | OpCode::RSwap | OpCode::Beq)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The second operand of `ADD`/`SUB`: a register or a signed immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Src {
    Reg(Reg),
    Imm(i32),
}

/// One decoded instruction. Which operand slots exist is fixed by the
/// opcode; an instruction is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Exclusive-or accumulate
    ///
    /// ```text
    /// r[rd] = r[rd] XOR r[rs1]
    /// PC = PC + 1
    /// ```
    RXor { rd: Reg, rs1: Reg },

    /// Modular add accumulate
    ///
    /// ```text
    /// r[rd] = (r[rd] + r[rs1]) mod 2^32
    /// PC = PC + 1
    /// ```
    RAdd { rd: Reg, rs1: Reg },

    /// Exchange two registers
    ///
    /// ```text
    /// swap r[rd], r[rs1]
    /// PC = PC + 1
    /// ```
    RSwap { rd: Reg, rs1: Reg },

    /// Branch on equal. With `rs1 == rs2` this is an unconditional
    /// branch by convention.
    ///
    /// ```text
    /// if r[rs1] == r[rs2]:
    ///     PC = labels[label]
    /// else:
    ///     PC = PC + 1
    /// ```
    Beq { rs1: Reg, rs2: Reg, label: String },

    /// Three-operand add
    ///
    /// ```text
    /// r[rd] = (r[rs1] + src) mod 2^32
    /// PC = PC + 1
    /// ```
    Add { rd: Reg, rs1: Reg, src: Src },

    /// Three-operand subtract
    ///
    /// ```text
    /// r[rd] = (r[rs1] - src) mod 2^32
    /// PC = PC + 1
    /// ```
    Sub { rd: Reg, rs1: Reg, src: Src },

    /// Load a word from memory
    ///
    /// ```text
    /// r[rd] = mem[r[rs1] + offset]
    /// PC = PC + 1
    /// ```
    Load { rd: Reg, rs1: Reg, offset: i32 },

    /// Store a word to memory
    ///
    /// ```text
    /// mem[r[rs1] + offset] = r[rs2]
    /// PC = PC + 1
    /// ```
    Store { rs1: Reg, rs2: Reg, offset: i32 },

    /// Stop execution. The PC stays on the HALT instruction.
    Halt,
}

impl Instruction {
    pub fn opcode(&self) -> OpCode {
        match *self {
            Instruction::RXor { .. }  => OpCode::RXor,
            Instruction::RAdd { .. }  => OpCode::RAdd,
            Instruction::RSwap { .. } => OpCode::RSwap,
            Instruction::Beq { .. }   => OpCode::Beq,
            Instruction::Add { .. }   => OpCode::Add,
            Instruction::Sub { .. }   => OpCode::Sub,
            Instruction::Load { .. }  => OpCode::Load,
            Instruction::Store { .. } => OpCode::Store,
            Instruction::Halt         => OpCode::Halt,
        }
    }

    pub fn is_reversible(&self) -> bool {
        self.opcode().is_reversible()
    }

    /// Every register index this instruction touches, for load-time
    /// range checks.
    pub fn registers(&self) -> Vec<Reg> {
        match *self {
            Instruction::RXor { rd, rs1 }
            | Instruction::RAdd { rd, rs1 }
            | Instruction::RSwap { rd, rs1 } => vec![rd, rs1],
            Instruction::Beq { rs1, rs2, .. } => vec![rs1, rs2],
            Instruction::Add { rd, rs1, ref src }
            | Instruction::Sub { rd, rs1, ref src } => {
                let mut regs = vec![rd, rs1];
                if let Src::Reg(rs2) = *src {
                    regs.push(rs2);
                }
                regs
            }
            Instruction::Load { rd, rs1, .. } => vec![rd, rs1],
            Instruction::Store { rs1, rs2, .. } => vec![rs1, rs2],
            Instruction::Halt => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self.opcode().name();
        match *self {
            Instruction::RXor { rd, rs1 }
            | Instruction::RAdd { rd, rs1 }
            | Instruction::RSwap { rd, rs1 } => {
                write!(f, "{} r{}, r{}", name, rd, rs1)
            }
            Instruction::Beq { rs1, rs2, ref label } => {
                write!(f, "{} r{}, r{}, {}", name, rs1, rs2, label)
            }
            Instruction::Add { rd, rs1, ref src }
            | Instruction::Sub { rd, rs1, ref src } => match *src {
                Src::Reg(rs2) => write!(f, "{} r{}, r{}, r{}", name, rd, rs1, rs2),
                Src::Imm(imm) => write!(f, "{} r{}, r{}, {}", name, rd, rs1, imm),
            },
            Instruction::Load { rd, rs1, offset } => {
                if offset == 0 {
                    write!(f, "{} r{}, r{}", name, rd, rs1)
                } else {
                    write!(f, "{} r{}, r{}, {}", name, rd, rs1, offset)
                }
            }
            Instruction::Store { rs1, rs2, offset } => {
                if offset == 0 {
                    write!(f, "{} r{}, r{}", name, rs1, rs2)
                } else {
                    write!(f, "{} r{}, r{}, {}", name, rs1, rs2, offset)
                }
            }
            Instruction::Halt => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversible_set_is_exact() {
        let reversible: Vec<Mnemonic> = mnemonics::ALL_MNEMONICS
            .iter()
            .filter_map(|m| OpCode::from_mnemonic(m))
            .filter(|op| op.is_reversible())
            .map(|op| op.name())
            .collect();
        assert_eq!(reversible, vec!["RXOR", "RADD", "RSWAP", "BEQ"]);
    }

    #[test]
    fn mnemonic_lookup_is_case_insensitive() {
        assert_eq!(OpCode::from_mnemonic("radd"), Some(OpCode::RAdd));
        assert_eq!(OpCode::from_mnemonic("Beq"), Some(OpCode::Beq));
        assert_eq!(OpCode::from_mnemonic("NOPE"), None);
    }

    #[test]
    fn display_matches_assembler_syntax() {
        let beq = Instruction::Beq { rs1: 1, rs2: 0, label: "done".into() };
        assert_eq!(beq.to_string(), "BEQ r1, r0, done");

        let add = Instruction::Add { rd: 1, rs1: 0, src: Src::Imm(10) };
        assert_eq!(add.to_string(), "ADD r1, r0, 10");

        let swap = Instruction::RSwap { rd: 2, rs1: 3 };
        assert_eq!(swap.to_string(), "RSWAP r2, r3");
    }
}
