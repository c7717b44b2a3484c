//! Id range type and range planning.

use std::fmt;

/// A single id range: `[start, end]` (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRange {
    /// First id (inclusive).
    pub start: u64,
    /// Last id (inclusive).
    pub end: u64,
}

impl IdRange {
    /// Number of ids covered by this range.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.start <= id && id <= self.end
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Plan for counting `[1, max_id]` in ranges of at most `step` ids.
///
/// The plan holds no iteration state; each call to `iter` regenerates the
/// same sequence from the beginning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePlan {
    max_id: u64,
    step: u64,
}

/// Builds a range plan for a given maximum id and step.
///
/// Ranges are `{1, min(step, max_id)}`, `{step + 1, min(2 * step, max_id)}`, ...
/// up to and including `max_id`. The plan is empty when `max_id` is 0.
/// A `step` of 0 is treated as 1.
pub fn plan_ranges(max_id: u64, step: u64) -> RangePlan {
    RangePlan {
        max_id,
        step: step.max(1),
    }
}

impl RangePlan {
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Number of ranges in the plan.
    pub fn len(&self) -> usize {
        if self.max_id == 0 {
            return 0;
        }
        let full = self.max_id / self.step;
        let partial = u64::from(self.max_id % self.step != 0);
        usize::try_from(full + partial).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.max_id == 0
    }

    pub fn iter(&self) -> RangePlanIter {
        RangePlanIter {
            next_start: if self.max_id == 0 { None } else { Some(1) },
            max_id: self.max_id,
            step: self.step,
        }
    }
}

impl IntoIterator for RangePlan {
    type Item = IdRange;
    type IntoIter = RangePlanIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &RangePlan {
    type Item = IdRange;
    type IntoIter = RangePlanIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the ranges of a `RangePlan`.
#[derive(Debug, Clone)]
pub struct RangePlanIter {
    next_start: Option<u64>,
    max_id: u64,
    step: u64,
}

impl Iterator for RangePlanIter {
    type Item = IdRange;

    fn next(&mut self) -> Option<IdRange> {
        let start = self.next_start?;
        let end = start.saturating_add(self.step - 1).min(self.max_id);
        self.next_start = match end.checked_add(1) {
            Some(next) if next <= self.max_id => Some(next),
            _ => None,
        };
        Some(IdRange { start, end })
    }
}
