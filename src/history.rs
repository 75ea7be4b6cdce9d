//! History-buffer instrumentation: a model of the silicon structure
//! that would store reversal state, separate from the machine's
//! execution log. The execution log is the correctness-critical undo
//! record; this buffer only accounts for what a hardware history
//! buffer would have to hold, so its figures drive FIFO and SRAM
//! sizing rather than reversal itself.

use std::fmt::Write;

use crate::instruction::Mnemonic;
use crate::metrics::ReversibilityMetrics;

/// Classification of one history entry, with its bit-cost contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Branch outcome: one taken bit plus the 32-bit source PC.
    BranchDecision,
    /// Reserved: a bare 32-bit source PC.
    BranchSource,
    /// Data-reversible op; only the op identifier is stored, the
    /// state itself derives algebraically.
    ReversibleOp,
    /// Not stored: there is nothing a buffer could do for it.
    IrreversibleOp,
}

impl EntryKind {
    pub const ALL: [EntryKind; 4] = [
        EntryKind::BranchDecision,
        EntryKind::BranchSource,
        EntryKind::ReversibleOp,
        EntryKind::IrreversibleOp,
    ];

    /// Estimated bits a hardware buffer spends on this entry kind.
    pub fn bit_cost(self) -> u64 {
        match self {
            EntryKind::BranchDecision => 1 + 32,
            EntryKind::BranchSource => 32,
            EntryKind::ReversibleOp => 8,
            EntryKind::IrreversibleOp => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntryKind::BranchDecision => "BRANCH_DECISION",
            EntryKind::BranchSource => "BRANCH_SOURCE",
            EntryKind::ReversibleOp => "REVERSIBLE_OP",
            EntryKind::IrreversibleOp => "IRREVERSIBLE_OP",
        }
    }

    fn index(self) -> usize {
        match self {
            EntryKind::BranchDecision => 0,
            EntryKind::BranchSource => 1,
            EntryKind::ReversibleOp => 2,
            EntryKind::IrreversibleOp => 3,
        }
    }
}

/// One entry in the modeled buffer. For branch kinds the payload is
/// the source PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub pc: usize,
    pub op: Mnemonic,
    pub kind: EntryKind,
    pub payload: Option<usize>,
}

impl HistoryEntry {
    pub fn bit_cost(&self) -> u64 {
        self.kind.bit_cost()
    }
}

/// Count and bit totals for one entry kind, cumulative over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindStats {
    pub count: u64,
    pub bits: u64,
}

/// Summary snapshot for silicon sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub current_depth: usize,
    pub current_bits: u64,
    pub max_depth: usize,
    pub max_bits: u64,
    pub total_entries: u64,
    pub total_bits: u64,
    pub by_kind: [(EntryKind, KindStats); 4],
    pub avg_bits_per_entry: f64,
}

/// Instrumented history buffer tracking depth and bit high-water
/// marks as entries are pushed and popped.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: Vec<HistoryEntry>,
    current_bits: u64,
    max_depth: usize,
    max_bits: u64,
    kind_stats: [KindStats; 4],
    depth_timeline: Vec<(u64, usize)>,
}

impl HistoryBuffer {
    pub fn new() -> HistoryBuffer {
        HistoryBuffer::default()
    }

    pub fn push(&mut self, pc: usize, op: Mnemonic, kind: EntryKind, payload: Option<usize>) {
        let entry = HistoryEntry { pc, op, kind, payload };
        let cost = entry.bit_cost();
        self.entries.push(entry);
        self.current_bits += cost;

        let stats = &mut self.kind_stats[kind.index()];
        stats.count += 1;
        stats.bits += cost;

        if self.entries.len() > self.max_depth {
            self.max_depth = self.entries.len();
        }
        if self.current_bits > self.max_bits {
            self.max_bits = self.current_bits;
        }
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        let entry = self.entries.pop()?;
        self.current_bits -= entry.bit_cost();
        Some(entry)
    }

    /// Append `(step, depth)` to the timeline for buffer-pressure
    /// analysis.
    pub fn record_snapshot(&mut self, step: u64) {
        self.depth_timeline.push((step, self.entries.len()));
    }

    pub fn current_depth(&self) -> usize {
        self.entries.len()
    }

    pub fn current_bits(&self) -> u64 {
        self.current_bits
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_bits(&self) -> u64 {
        self.max_bits
    }

    pub fn depth_timeline(&self) -> &[(u64, usize)] {
        &self.depth_timeline
    }

    pub fn summary(&self) -> HistorySummary {
        let total_entries: u64 = self.kind_stats.iter().map(|s| s.count).sum();
        let total_bits: u64 = self.kind_stats.iter().map(|s| s.bits).sum();
        let mut by_kind = [(EntryKind::BranchDecision, KindStats::default()); 4];
        for kind in EntryKind::ALL.iter() {
            by_kind[kind.index()] = (*kind, self.kind_stats[kind.index()]);
        }
        HistorySummary {
            current_depth: self.entries.len(),
            current_bits: self.current_bits,
            max_depth: self.max_depth,
            max_bits: self.max_bits,
            total_entries,
            total_bits,
            by_kind,
            avg_bits_per_entry: if total_entries == 0 {
                0.0
            } else {
                total_bits as f64 / total_entries as f64
            },
        }
    }

    /// Human-readable sizing report.
    pub fn format_report(&self) -> String {
        let s = self.summary();
        let rule = "=".repeat(60);

        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "HISTORY BUFFER ANALYSIS");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Peak requirements:");
        let _ = writeln!(out, "  Max depth:     {} entries", s.max_depth);
        let _ = writeln!(out, "  Max bits:      {} bits ({:.1} bytes)", s.max_bits, s.max_bits as f64 / 8.0);
        let _ = writeln!(out);
        let _ = writeln!(out, "Cumulative (full execution):");
        let _ = writeln!(out, "  Total entries: {}", s.total_entries);
        let _ = writeln!(out, "  Total bits:    {} bits ({:.1} bytes)", s.total_bits, s.total_bits as f64 / 8.0);
        let _ = writeln!(out, "  Avg bits/entry: {:.1}", s.avg_bits_per_entry);
        let _ = writeln!(out);
        let _ = writeln!(out, "By entry kind:");
        for (kind, stats) in s.by_kind.iter() {
            if stats.count > 0 {
                let _ = writeln!(
                    out,
                    "  {:<20}: {:5} entries, {:6} bits",
                    kind.name(),
                    stats.count,
                    stats.bits
                );
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Silicon implications:");
        let _ = writeln!(out, "  SRAM for history buffer: ~{:.2} KB", s.max_bits as f64 / 8.0 / 1024.0);
        let fits = |depth: usize| if s.max_depth <= depth { "OK" } else { "OVERFLOW" };
        let _ = writeln!(out, "  Entries at 64-deep FIFO: {}", fits(64));
        let _ = writeln!(out, "  Entries at 256-deep FIFO: {}", fits(256));
        let _ = write!(out, "{}", rule);
        out
    }
}

/// One recorded run inside a [`HistoryAnalyzer`].
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub name: String,
    pub history: HistorySummary,
    pub reversible_ratio: f64,
    pub total_instructions: u64,
}

/// Compares history-buffer behavior across named runs: loops versus
/// linear code, branch-heavy versus compute-heavy, different
/// reversibility ratios.
#[derive(Debug, Clone, Default)]
pub struct HistoryAnalyzer {
    runs: Vec<RunRecord>,
}

impl HistoryAnalyzer {
    pub fn new() -> HistoryAnalyzer {
        HistoryAnalyzer::default()
    }

    pub fn record_run(&mut self, name: &str, buffer: &HistoryBuffer, metrics: &ReversibilityMetrics) {
        self.runs.push(RunRecord {
            name: name.to_string(),
            history: buffer.summary(),
            reversible_ratio: metrics.reversible_ratio(),
            total_instructions: metrics.total(),
        });
    }

    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    /// Render the comparison table across all recorded runs.
    pub fn compare(&self) -> String {
        if self.runs.is_empty() {
            return "No runs recorded.".to_string();
        }

        let rule = "=".repeat(70);
        let line = "-".repeat(70);

        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "HISTORY BUFFER COMPARISON ACROSS PROGRAMS");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<25} {:>10} {:>10} {:>8} {:>12}",
            "Program", "MaxDepth", "MaxBits", "Rev%", "Bits/Instr"
        );
        let _ = writeln!(out, "{}", line);

        for run in &self.runs {
            let bits_per_instr = if run.total_instructions == 0 {
                0.0
            } else {
                run.history.max_bits as f64 / run.total_instructions as f64
            };
            let _ = writeln!(
                out,
                "{:<25} {:>10} {:>10} {:>7.0}% {:>12.1}",
                run.name,
                run.history.max_depth,
                run.history.max_bits,
                run.reversible_ratio * 100.0,
                bits_per_instr
            );
        }

        let _ = writeln!(out, "{}", line);
        let _ = writeln!(out);
        let _ = writeln!(out, "Bits per instruction is the buffer cost per unit of compute;");
        let _ = writeln!(out, "lower is better for silicon area.");
        let _ = write!(out, "{}", rule);
        out
    }
}
