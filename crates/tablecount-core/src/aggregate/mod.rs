//! Parallel range counting.
//!
//! One task per planned range is spawned up front into a `JoinSet`; each
//! task waits on the shared `ConcurrencyGate` before querying, so at most
//! `gate.limit()` queries are in flight. The total is read only after every
//! task has been joined.

mod gate;
mod outcome;

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::planner::{IdRange, RangePlan};
use crate::source::TableSource;
use crate::table::TableName;

pub use gate::ConcurrencyGate;
pub use outcome::{CountSummary, FailedRange, FailurePolicy, RangeError, RangeOutcome};

/// Fatal aggregation failure.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// A range failed while running with `FailurePolicy::Abort`.
    #[error("error counting {table} in range {range}: {source}")]
    RangeFailed {
        table: String,
        range: IdRange,
        #[source]
        source: RangeError,
    },
    #[error("range count worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Counts one range while holding a gate slot.
async fn count_one_range<S: TableSource>(
    source: &S,
    table: &TableName,
    range: IdRange,
    gate: &ConcurrencyGate,
) -> RangeOutcome {
    let _permit = match gate.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return RangeOutcome {
                range,
                result: Err(RangeError::GateClosed),
            }
        }
    };
    tracing::debug!(table = %table, %range, "counting range");
    let result = source.count_range(table, range).await.map_err(RangeError::from);
    RangeOutcome { range, result }
}

/// Counts every range of `plan` against `table` and sums the results.
///
/// Failed ranges are handled per `policy`: with `SkipFailed` they are logged,
/// contribute zero and are listed in `CountSummary::failed`; with `Abort` the
/// first failure closes `gate`, cancels the remaining tasks and is returned.
/// A worker panic is always returned as an error.
pub async fn count_ranges<S>(
    source: Arc<S>,
    table: &TableName,
    plan: RangePlan,
    gate: &ConcurrencyGate,
    policy: FailurePolicy,
) -> Result<CountSummary, AggregateError>
where
    S: TableSource + 'static,
{
    let mut join_set = JoinSet::new();
    for range in plan.iter() {
        let source = Arc::clone(&source);
        let table = table.clone();
        let gate = gate.clone();
        join_set.spawn(async move { count_one_range(source.as_ref(), &table, range, &gate).await });
    }

    let mut summary = CountSummary {
        ranges: plan.len(),
        ..CountSummary::default()
    };

    while let Some(joined) = join_set.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                gate.close();
                join_set.abort_all();
                return Err(AggregateError::WorkerPanicked(e.to_string()));
            }
        };

        match outcome.result {
            Ok(count) => {
                summary.total = summary.total.saturating_add(count);
            }
            Err(err) => match policy {
                FailurePolicy::SkipFailed => {
                    tracing::warn!(
                        table = %table,
                        range = %outcome.range,
                        error = %err,
                        "error counting range; its rows are left out of the total"
                    );
                    summary.failed.push(FailedRange {
                        range: outcome.range,
                        error: err.to_string(),
                    });
                }
                FailurePolicy::Abort => {
                    gate.close();
                    join_set.abort_all();
                    return Err(AggregateError::RangeFailed {
                        table: table.to_string(),
                        range: outcome.range,
                        source: err,
                    });
                }
            },
        }
    }

    summary.failed.sort_by_key(|f| f.range.start);
    Ok(summary)
}
