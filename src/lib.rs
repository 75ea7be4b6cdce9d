//! ## Overview
//! `revsim` simulates, on conventional hardware, a small register
//! machine whose instruction set admits algebraic inversion: a program
//! that has run forward can be stepped backward to recover earlier
//! architectural state without trace buffers or checkpoints. The
//! simulator exists to answer two questions:
//!
//! - how much storage would a hardware "history buffer" need to make
//!   reverse execution possible, and
//! - what does a debugging workflow look like when a watchpoint can
//!   walk the machine backward to the instruction that introduced a
//!   corruption.
//!
//! ## Architecture
//! The machine has a register file of 32-bit unsigned words (32
//! registers by default), a program counter, a sparse word-addressed
//! memory, and a small opcode set split into three groups:
//!
//! - **reversible data** (`RXOR`, `RADD`, `RSWAP`): each inverts from
//!   the instruction itself plus the post-state. XOR is its own
//!   inverse, modular addition inverts with subtraction, a swap undoes
//!   itself.
//! - **reversible control** (`BEQ`): reversible at the PC level; the
//!   branch outcome plus the originating PC suffice to invert it, and
//!   the register file is never touched.
//! - **irreversible** (`ADD`, `SUB`, `LOAD`, `STORE`, `HALT`):
//!   ordinary destructive operations. Nothing is recorded for them;
//!   they are the part of a run that cannot be walked back through.
//!
//! All arithmetic is unsigned 32-bit, wrapping modulo 2^32.
//!
//! ## Execution model
//! Forward execution appends one entry per reversible dynamic
//! instruction to the machine's execution log; reverse execution pops
//! entries in strict LIFO order and applies each opcode's inverse.
//! The log is the only state the engine needs to run backward.
//! Reverse-stepping with an empty log is a defined no-op, so "rewind
//! to the origin" is idempotent.
//!
//! Every step also charges a two-bucket energy model (cheap for
//! reversible instructions, expensive for irreversible ones) and a
//! per-opcode reversibility tally.
//!
//! ## Assembly
//! Programs are written one statement per line, with `;` comments and
//! trailing `label:` lines binding a name to the next instruction:
//!
//! ```text
//! ADD r1, r0, 10      ; r1 = 10
//! loop_start:
//! BEQ r1, r0, done    ; exit when the counter reaches zero
//! RADD r2, r1         ; reversible accumulate
//! SUB r1, r1, 1
//! BEQ r0, r0, loop_start
//! done:
//! HALT
//! ```
//!
//! ## Instrumentation
//! The [`HistoryBuffer`] is an accounting sidecar, separate from the
//! execution log: it models what silicon would store per entry kind
//! (33 bits for a branch decision, 8 for a reversible op, nothing for
//! irreversible ones) and tracks peak depth and bit high-water marks
//! for FIFO and SRAM sizing. The [`TimeTravelDebugger`] drives a
//! machine forward under watchpoints and, when one trips, reverses
//! until the watched register changes, reporting the corruption
//! source. [`ReversibleMemory`] and [`MemoryController`] model the
//! exchange-based cold path a reversible memory system would add next
//! to the ordinary hot path.

pub mod debugger;
pub mod energy;
pub mod error;
pub mod history;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod metrics;
pub mod parser;
pub mod program;

pub use debugger::{CorruptionReport, TimeTravelDebugger, Violation, Watchpoint};
pub use energy::EnergyModel;
pub use error::{MachineError, ProgramError};
pub use history::{EntryKind, HistoryAnalyzer, HistoryBuffer, HistoryEntry, HistorySummary};
pub use instruction::{Instruction, OpCode, Reg, Src};
pub use machine::{LogEntry, LogPayload, Machine, Step, DEFAULT_REGISTER_COUNT};
pub use memory::{Memory, MemoryController, RegionType, ReversibleMemory};
pub use metrics::ReversibilityMetrics;
pub use parser::parse_program;
pub use program::Program;
