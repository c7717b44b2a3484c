//! Per-range results and the policy applied to failed ranges.

use std::fmt;

use crate::planner::IdRange;
use crate::source::SourceError;

/// What the aggregator does when a range query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure, count the range as zero and keep going.
    /// The total then understates the table by that range's rows.
    #[default]
    SkipFailed,
    /// Stop at the first failure and return it as an error.
    Abort,
}

/// Result of one range-count worker.
#[derive(Debug)]
pub struct RangeOutcome {
    pub range: IdRange,
    pub result: Result<u64, RangeError>,
}

/// A range whose count was dropped from the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRange {
    pub range: IdRange,
    pub error: String,
}

/// Aggregated result of counting every planned range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSummary {
    /// Sum of all successful range counts.
    pub total: u64,
    /// Number of ranges planned.
    pub ranges: usize,
    /// Ranges counted as zero because their query failed.
    pub failed: Vec<FailedRange>,
}

impl CountSummary {
    /// True when every range was counted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for CountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows in {} ranges", self.total, self.ranges)?;
        if !self.failed.is_empty() {
            write!(f, " ({} failed)", self.failed.len())?;
        }
        Ok(())
    }
}

/// Why a single range produced no count.
#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    #[error("concurrency gate closed before the query started")]
    GateClosed,
    #[error(transparent)]
    Source(#[from] SourceError),
}
