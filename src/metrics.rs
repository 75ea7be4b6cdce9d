use std::collections::HashMap;

use crate::instruction::{Mnemonic, OpCode};

/// Per-run tally of reversible versus irreversible dynamic
/// instructions, with a per-opcode breakdown.
#[derive(Debug, Clone, Default)]
pub struct ReversibilityMetrics {
    reversible_count: u64,
    irreversible_count: u64,
    per_op_counts: HashMap<Mnemonic, u64>,
}

impl ReversibilityMetrics {
    pub fn new() -> ReversibilityMetrics {
        ReversibilityMetrics::default()
    }

    pub fn record(&mut self, op: OpCode, reversible: bool) {
        if reversible {
            self.reversible_count += 1;
        } else {
            self.irreversible_count += 1;
        }
        *self.per_op_counts.entry(op.name()).or_insert(0) += 1;
    }

    pub fn reversible_count(&self) -> u64 {
        self.reversible_count
    }

    pub fn irreversible_count(&self) -> u64 {
        self.irreversible_count
    }

    pub fn total(&self) -> u64 {
        self.reversible_count + self.irreversible_count
    }

    pub fn reversible_ratio(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.reversible_count as f64 / self.total() as f64
        }
    }

    pub fn per_op_counts(&self) -> &HashMap<Mnemonic, u64> {
        &self.per_op_counts
    }

    pub fn summary(&self) -> String {
        format!(
            "reversible={}, irreversible={}, ratio={:.2}",
            self.reversible_count,
            self.irreversible_count,
            self.reversible_ratio()
        )
    }
}
