//! The reversible execution core: a register file, a program counter
//! and an execution log that together admit stepping a program
//! backward as well as forward.
//!
//! Forward execution appends one log entry per reversible dynamic
//! instruction; irreversible instructions leave no record (their
//! inputs are gone, there is nothing to invert). Reverse execution
//! pops entries in strict LIFO order and applies each opcode's
//! algebraic inverse, restoring the PC to the entry's fetch address.

use tracing::trace;

use crate::energy::EnergyModel;
use crate::error::MachineError;
use crate::instruction::{Instruction, OpCode, Reg, Src};
use crate::memory::Memory;
use crate::metrics::ReversibilityMetrics;
use crate::program::Program;

/// Register file size unless overridden at construction.
pub const DEFAULT_REGISTER_COUNT: usize = 32;

/// What a forward step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One instruction was executed.
    Executed,
    /// The machine is halted; nothing was executed.
    Halted,
}

/// Reversal data carried by one execution-log entry. Data-reversible
/// opcodes invert algebraically and carry nothing; BEQ records the
/// branch outcome and the PC it was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPayload {
    None,
    Branch { taken: bool, from_pc: usize },
}

/// One entry of the execution log: the fetch PC, the dynamic
/// instruction, and its reversal payload. The log is append-only
/// going forward and pop-only going backward, and is the only state
/// the engine consults to invert execution.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub pc: usize,
    pub instruction: Instruction,
    pub payload: LogPayload,
}

/// A reversible register machine.
///
/// The machine exclusively owns its register file, memory, execution
/// log, energy model and metrics; any number of machines can exist
/// independently.
#[derive(Debug)]
pub struct Machine {
    registers: Vec<u32>,
    pc: usize,
    program: Program,
    exec_log: Vec<LogEntry>,
    halted: bool,
    memory: Memory,
    energy: EnergyModel,
    metrics: ReversibilityMetrics,
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}

impl Machine {
    pub fn new() -> Machine {
        Machine::with_register_count(DEFAULT_REGISTER_COUNT)
    }

    pub fn with_register_count(count: usize) -> Machine {
        Machine {
            registers: vec![0; count],
            pc: 0,
            program: Program::default(),
            exec_log: Vec::new(),
            halted: false,
            memory: Memory::new(),
            energy: EnergyModel::new(),
            metrics: ReversibilityMetrics::new(),
        }
    }

    /// Replace the loaded program and label map after validating them.
    /// Resets the PC, execution log, halted flag and metrics; the
    /// register file and memory are left for the caller to preset.
    pub fn load_program(&mut self, program: Program) -> Result<(), MachineError> {
        program.validate(self.registers.len())?;
        self.program = program;
        self.pc = 0;
        self.exec_log.clear();
        self.halted = false;
        self.metrics = ReversibilityMetrics::new();
        Ok(())
    }

    pub fn registers(&self) -> &[u32] {
        &self.registers
    }

    pub fn register(&self, reg: Reg) -> u32 {
        self.registers[reg as usize]
    }

    /// Preset a register. The engine does not pin r0 to zero; treating
    /// r0 as a zero source is an assembler convention only.
    pub fn set_register(&mut self, reg: Reg, value: u32) {
        self.registers[reg as usize] = value;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn exec_log(&self) -> &[LogEntry] {
        &self.exec_log
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn energy(&self) -> &EnergyModel {
        &self.energy
    }

    pub fn set_energy_model(&mut self, energy: EnergyModel) {
        self.energy = energy;
    }

    pub fn metrics(&self) -> &ReversibilityMetrics {
        &self.metrics
    }

    /// Execute one instruction. A halted machine does not step; a PC
    /// outside the program is an error.
    pub fn step(&mut self) -> Result<Step, MachineError> {
        if self.halted {
            return Ok(Step::Halted);
        }

        let len = self.program.len();
        let instruction = match self.program.fetch(self.pc) {
            Some(instruction) => instruction.clone(),
            None => return Err(MachineError::PcOutOfRange { pc: self.pc, len }),
        };

        trace!(pc = self.pc, instr = %instruction, "step");
        let pc = self.pc;

        match instruction {
            Instruction::Beq { rs1, rs2, ref label } => {
                let taken = self.register(rs1) == self.register(rs2);

                // the branch is logged and charged before the label
                // resolves; a dangling label fails the step with the
                // entry already in place
                self.exec_log.push(LogEntry {
                    pc,
                    instruction: instruction.clone(),
                    payload: LogPayload::Branch { taken, from_pc: pc },
                });
                self.energy.charge_reversible();
                self.metrics.record(OpCode::Beq, true);

                self.pc = if taken {
                    self.program.label_target(label).ok_or_else(|| {
                        MachineError::UnknownLabel { label: label.clone() }
                    })?
                } else {
                    pc + 1
                };
            }

            Instruction::RXor { rd, rs1 } => {
                let value = self.register(rd) ^ self.register(rs1);
                self.set_register(rd, value);
                self.finish_reversible(pc, instruction.clone());
            }

            Instruction::RAdd { rd, rs1 } => {
                let value = self.register(rd).wrapping_add(self.register(rs1));
                self.set_register(rd, value);
                self.finish_reversible(pc, instruction.clone());
            }

            Instruction::RSwap { rd, rs1 } => {
                self.registers.swap(rd as usize, rs1 as usize);
                self.finish_reversible(pc, instruction.clone());
            }

            Instruction::Add { rd, rs1, ref src } => {
                let value = self.register(rs1).wrapping_add(self.src_value(src));
                self.set_register(rd, value);
                self.finish_irreversible(OpCode::Add);
            }

            Instruction::Sub { rd, rs1, ref src } => {
                let value = self.register(rs1).wrapping_sub(self.src_value(src));
                self.set_register(rd, value);
                self.finish_irreversible(OpCode::Sub);
            }

            Instruction::Load { rd, rs1, offset } => {
                let addr = self.register(rs1).wrapping_add(offset as u32);
                let value = self.memory.load_word(addr);
                self.set_register(rd, value);
                self.finish_irreversible(OpCode::Load);
            }

            Instruction::Store { rs1, rs2, offset } => {
                let addr = self.register(rs1).wrapping_add(offset as u32);
                let value = self.register(rs2);
                self.memory.store_word(addr, value);
                self.finish_irreversible(OpCode::Store);
            }

            Instruction::Halt => {
                self.halted = true;
                self.energy.charge_irreversible();
                self.metrics.record(OpCode::Halt, false);
                // the PC stays on the HALT instruction
                return Ok(Step::Halted);
            }
        }

        Ok(Step::Executed)
    }

    /// Undo the most recent logged instruction. An empty log is a
    /// defined no-op (`Ok(false)`), so rewinding to the origin is
    /// idempotent. The halted flag is never touched.
    pub fn reverse_step(&mut self) -> Result<bool, MachineError> {
        let entry = match self.exec_log.pop() {
            Some(entry) => entry,
            None => return Ok(false),
        };

        trace!(pc = entry.pc, instr = %entry.instruction, "reverse step");

        match entry.instruction {
            Instruction::Beq { .. } => {
                let from_pc = match entry.payload {
                    LogPayload::Branch { from_pc, .. } => from_pc,
                    LogPayload::None => entry.pc,
                };
                self.pc = from_pc;
            }

            Instruction::RXor { rd, rs1 } => {
                let value = self.register(rd) ^ self.register(rs1);
                self.set_register(rd, value);
                self.pc = entry.pc;
            }

            Instruction::RAdd { rd, rs1 } => {
                let value = self.register(rd).wrapping_sub(self.register(rs1));
                self.set_register(rd, value);
                self.pc = entry.pc;
            }

            Instruction::RSwap { rd, rs1 } => {
                self.registers.swap(rd as usize, rs1 as usize);
                self.pc = entry.pc;
            }

            ref other => {
                // irreversible opcodes are never logged; popping one
                // means a handler is missing somewhere
                return Err(MachineError::UnsupportedOpcode { op: other.opcode() });
            }
        }

        Ok(true)
    }

    /// Step until the machine halts or the optional cap is reached.
    /// Returns the number of steps taken; errors propagate and stop
    /// the run with state intact.
    pub fn run(&mut self, max_steps: Option<u64>) -> Result<u64, MachineError> {
        let mut steps = 0;
        while !self.halted {
            if let Some(max) = max_steps {
                if steps >= max {
                    break;
                }
            }
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }

    fn src_value(&self, src: &Src) -> u32 {
        match *src {
            Src::Reg(rs2) => self.register(rs2),
            Src::Imm(imm) => imm as u32,
        }
    }

    fn finish_reversible(&mut self, pc: usize, instruction: Instruction) {
        let op = instruction.opcode();
        self.exec_log.push(LogEntry {
            pc,
            instruction,
            payload: LogPayload::None,
        });
        self.energy.charge_reversible();
        self.metrics.record(op, true);
        self.pc = pc + 1;
    }

    fn finish_irreversible(&mut self, op: OpCode) {
        self.energy.charge_irreversible();
        self.metrics.record(op, false);
        self.pc += 1;
    }
}
