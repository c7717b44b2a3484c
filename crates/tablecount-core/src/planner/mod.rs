//! Range planning over the primary-key id space.
//!
//! Splits `[1, max_id]` into contiguous inclusive ranges of at most `step`
//! ids each; every range becomes one `COUNT(id)` query.

mod range;

pub use range::{plan_ranges, IdRange, RangePlan, RangePlanIter};
