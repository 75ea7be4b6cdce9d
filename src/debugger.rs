//! Time-travel debugging on top of the reversible engine: run forward
//! with watchpoints, and when one trips walk the execution log
//! backward until the watched register changes, localizing the
//! instruction that introduced the corruption. No trace buffer, no
//! checkpoints; the undo record the machine keeps anyway is enough.

use std::fmt::Write;

use tracing::debug;

use crate::error::MachineError;
use crate::history::{EntryKind, HistoryBuffer};
use crate::instruction::{Instruction, OpCode, Reg};
use crate::machine::Machine;

/// A condition monitored during forward execution. The predicate
/// returns true when the watched register's value is BAD.
pub struct Watchpoint {
    pub name: String,
    pub register: Reg,
    pub condition: Box<dyn Fn(u32) -> bool>,
    pub description: String,
}

/// One tripped watchpoint, kept in the session's violation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub step: u64,
    pub watchpoint: String,
    pub register: Reg,
    pub value: u32,
}

/// Where a reverse walk first saw the watched register change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptionReport {
    pub pc: usize,
    pub instruction: Instruction,
    pub register: Reg,
    /// Register value once the instruction was undone.
    pub value_before: u32,
    /// The corrupted value observed before undoing.
    pub value_after: u32,
    pub steps_back: usize,
}

/// A debugging session over one machine.
///
/// The debugger exclusively borrows the machine for the session and
/// is its sole mutator; it owns its own watchpoint list and an
/// independent history buffer used for reporting.
pub struct TimeTravelDebugger<'m> {
    machine: &'m mut Machine,
    watchpoints: Vec<Watchpoint>,
    history: HistoryBuffer,
    step_count: u64,
    violations: Vec<Violation>,
}

impl<'m> TimeTravelDebugger<'m> {
    pub fn new(machine: &'m mut Machine) -> TimeTravelDebugger<'m> {
        TimeTravelDebugger {
            machine,
            watchpoints: Vec::new(),
            history: HistoryBuffer::new(),
            step_count: 0,
            violations: Vec::new(),
        }
    }

    pub fn machine(&self) -> &Machine {
        self.machine
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn watchpoints(&self) -> &[Watchpoint] {
        &self.watchpoints
    }

    pub fn add_watchpoint<F>(&mut self, name: &str, register: Reg, condition: F, description: &str)
    where
        F: Fn(u32) -> bool + 'static,
    {
        let description = if description.is_empty() {
            format!("Watch r{}", register)
        } else {
            description.to_string()
        };
        self.watchpoints.push(Watchpoint {
            name: name.to_string(),
            register,
            condition: Box::new(condition),
            description,
        });
    }

    /// Watch for `r[register] != expected`.
    pub fn watch_equals(&mut self, register: Reg, expected: u32) {
        self.add_watchpoint(
            &format!("r{}=={}", register, expected),
            register,
            move |value| value != expected,
            &format!("Trips when r{} != {}", register, expected),
        );
    }

    /// Watch for `r[register]` leaving the inclusive range `[lo, hi]`.
    pub fn watch_range(&mut self, register: Reg, lo: u32, hi: u32) {
        self.add_watchpoint(
            &format!("r{} in [{},{}]", register, lo, hi),
            register,
            move |value| value < lo || value > hi,
            &format!("Trips when r{} is outside [{}, {}]", register, lo, hi),
        );
    }

    fn record_history(&mut self, instruction: &Instruction, pc: usize) {
        if instruction.opcode() == OpCode::Beq {
            self.history.push(
                pc,
                instruction.opcode().name(),
                EntryKind::BranchDecision,
                Some(pc),
            );
        } else if instruction.is_reversible() {
            self.history.push(pc, instruction.opcode().name(), EntryKind::ReversibleOp, None);
        }
        // irreversible instructions are not recorded; a buffer cannot
        // help them anyway
    }

    fn check_watchpoints(&mut self) -> Option<usize> {
        for (index, wp) in self.watchpoints.iter().enumerate() {
            let value = self.machine.register(wp.register);
            if (wp.condition)(value) {
                debug!(step = self.step_count, watchpoint = %wp.name, value, "violation");
                self.violations.push(Violation {
                    step: self.step_count,
                    watchpoint: wp.name.clone(),
                    register: wp.register,
                    value,
                });
                return Some(index);
            }
        }
        None
    }

    /// Run forward until a watchpoint trips, the machine halts, or the
    /// step budget runs out. Watchpoints are checked after every step
    /// in insertion order; the first to trip wins and is returned.
    pub fn run_until_violation(&mut self, max_steps: u64) -> Result<Option<&Watchpoint>, MachineError> {
        while !self.machine.halted() && self.step_count < max_steps {
            if let Some(instruction) = self.machine.program().fetch(self.machine.pc()) {
                let instruction = instruction.clone();
                self.record_history(&instruction, self.machine.pc());
            }

            self.machine.step()?;
            self.step_count += 1;
            let step = self.step_count;
            self.history.record_snapshot(step);

            if let Some(index) = self.check_watchpoints() {
                return Ok(Some(&self.watchpoints[index]));
            }
        }
        Ok(None)
    }

    /// Walk backward through the execution log until undoing an
    /// instruction changes the watched register; that instruction is
    /// the corruption source. Returns `None` when the log drains
    /// without the value changing.
    pub fn find_corruption_source(
        &mut self,
        register: Reg,
        bad_value: u32,
    ) -> Result<Option<CorruptionReport>, MachineError> {
        let mut steps_back = 0;
        let mut current_value = bad_value;

        while let Some(entry) = self.machine.exec_log().last() {
            let pc = entry.pc;
            let instruction = entry.instruction.clone();

            self.machine.reverse_step()?;
            steps_back += 1;

            let new_value = self.machine.register(register);
            if new_value != current_value {
                return Ok(Some(CorruptionReport {
                    pc,
                    instruction,
                    register,
                    value_before: new_value,
                    value_after: current_value,
                    steps_back,
                }));
            }
            current_value = new_value;
        }

        Ok(None)
    }

    /// The complete workflow: run forward, detect a violation, walk
    /// backward to its source, and format the findings.
    pub fn run_and_diagnose(&mut self, max_steps: u64) -> Result<String, MachineError> {
        let rule = "=".repeat(65);
        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "TIME-TRAVEL DEBUGGER");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Watchpoints configured: {}", self.watchpoints.len());
        for wp in &self.watchpoints {
            let _ = writeln!(out, "  - {}: {}", wp.name, wp.description);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Running forward...");
        let violation = match self.run_until_violation(max_steps)? {
            Some(wp) => (wp.name.clone(), wp.register),
            None => {
                let _ = writeln!(out, "  Completed {} steps without violation.", self.step_count);
                let _ = writeln!(out);
                let _ = write!(out, "{}", self.history.format_report());
                return Ok(out);
            }
        };

        let (name, register) = violation;
        let bad_value = self.machine.register(register);
        let _ = writeln!(out, "  Violation at step {}", self.step_count);
        let _ = writeln!(out, "    Watchpoint: {}", name);
        let _ = writeln!(out, "    Register r{} = {}", register, bad_value);
        let _ = writeln!(out);

        let _ = writeln!(out, "Walking backward through reversible history...");
        match self.find_corruption_source(register, bad_value)? {
            None => {
                let _ = writeln!(out, "  Could not locate corruption source in reversible region.");
            }
            Some(report) => {
                let _ = writeln!(out, "  Found corruption source after {} reverse steps", report.steps_back);
                let _ = writeln!(out);
                let _ = writeln!(out, "  CORRUPTION SOURCE");
                let _ = writeln!(out, "    PC:          {}", report.pc);
                let _ = writeln!(out, "    Instruction: {}", report.instruction);
                let _ = writeln!(out, "    Register:    r{}", report.register);
                let _ = writeln!(out, "    Before:      {}", report.value_before);
                let _ = writeln!(out, "    After:       {}", report.value_after);
            }
        }

        let _ = writeln!(out);
        let _ = write!(out, "{}", self.history.format_report());
        Ok(out)
    }
}
