use std::collections::HashMap;

use crate::error::ProgramError;
use crate::instruction::Instruction;

/// An instruction sequence indexed by PC plus its label map. Both are
/// immutable for the lifetime of a run; hand it to the Machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, labels: HashMap<String, usize>) -> Program {
        Program { instructions, labels }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    pub fn label_target(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn fetch(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Load-time validity check. Rejects register indices outside the
    /// machine's register file and the information-losing
    /// `RADD`/`RXOR` forms where `rd` aliases `rs1`.
    pub fn validate(&self, register_count: usize) -> Result<(), ProgramError> {
        for instruction in &self.instructions {
            match *instruction {
                Instruction::RXor { rd, rs1 } | Instruction::RAdd { rd, rs1 }
                    if rd == rs1 =>
                {
                    return Err(ProgramError::AliasedOperands {
                        op: instruction.opcode().name(),
                        rd,
                    });
                }
                _ => {}
            }

            for reg in instruction.registers() {
                if reg as usize >= register_count {
                    return Err(ProgramError::RegisterOutOfRange {
                        reg,
                        count: register_count,
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Program {
        Program::new(instructions, HashMap::new())
    }
}
