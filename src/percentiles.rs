use serde::Serialize;

use crate::accumulator::Accumulator;

/// A percentile breakdown of one interval.
/// Serialized straight into the reporter's JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
    pub count: u64,
}

impl PercentileSet {
    /// Extract a full percentile set from an accumulator.
    /// Returns zeroed values if the accumulator is empty.
    pub fn from_accumulator(acc: &Accumulator) -> Self {
        if acc.is_empty() {
            return Self::empty();
        }

        Self {
            min: acc.min(),
            max: acc.max(),
            mean: acc.mean(),
            p50: acc.value_at_quantile(0.50),
            p95: acc.value_at_quantile(0.95),
            p99: acc.value_at_quantile(0.99),
            p999: acc.value_at_quantile(0.999),
            count: acc.count(),
        }
    }

    /// All-zero placeholder for an interval with no samples.
    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p95: 0,
            p99: 0,
            p999: 0,
            count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}
