//! Count one table end to end: validate the id column, fetch the max id,
//! plan ranges, then count them in parallel.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aggregate::{self, ConcurrencyGate, CountSummary, FailurePolicy};
use crate::planner;
use crate::schema;
use crate::source::TableSource;
use crate::table::TableName;

/// Knobs for a single count run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountOptions {
    pub concurrency: usize,
    pub step: u64,
    pub policy: FailurePolicy,
}

impl From<&crate::config::Settings> for CountOptions {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            concurrency: settings.concurrency,
            step: settings.step,
            policy: settings.failure_policy(),
        }
    }
}

/// Result of counting one table.
#[derive(Debug, Clone)]
pub struct CountReport {
    pub table: TableName,
    pub max_id: u64,
    pub step: u64,
    pub concurrency: usize,
    pub summary: CountSummary,
    pub elapsed: Duration,
}

impl CountReport {
    pub fn total(&self) -> u64 {
        self.summary.total
    }

    /// The single line printed on stdout.
    pub fn result_line(&self) -> String {
        format!(
            "Total number of records in the {} table: {}",
            self.table, self.summary.total
        )
    }
}

/// Runs the whole counting pipeline for `table`.
///
/// Schema and max-id failures abort before any count query is issued.
/// Range failures are handled according to `options.policy`.
pub async fn count_table<S>(
    source: Arc<S>,
    table: &TableName,
    options: CountOptions,
) -> Result<CountReport>
where
    S: TableSource + 'static,
{
    let started = Instant::now();

    schema::validate_id_column(source.as_ref(), table).await?;

    let max_id = source
        .max_id(table)
        .await
        .with_context(|| format!("failed to get max ID from {}", table))?;

    let plan = planner::plan_ranges(max_id, options.step);
    tracing::info!(
        table = %table,
        max_id,
        step = plan.step(),
        ranges = plan.len(),
        concurrency = options.concurrency,
        "counting rows"
    );

    let gate = ConcurrencyGate::new(options.concurrency);
    let summary = aggregate::count_ranges(source, table, plan, &gate, options.policy).await?;

    let elapsed = started.elapsed();
    if !summary.is_complete() {
        tracing::warn!(
            table = %table,
            failed = summary.failed.len(),
            ranges = summary.ranges,
            "some ranges could not be counted; the total is too low"
        );
    }
    tracing::info!("total running time: {:?}", elapsed);

    Ok(CountReport {
        table: table.clone(),
        max_id,
        step: plan.step(),
        concurrency: gate.limit(),
        summary,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IdColumnInfo, SchemaError};
    use crate::source::fake::FakeSource;
    use crate::source::SourceError;

    fn options(concurrency: usize, step: u64) -> CountOptions {
        CountOptions {
            concurrency,
            step,
            policy: FailurePolicy::SkipFailed,
        }
    }

    fn users() -> TableName {
        TableName::parse("users").unwrap()
    }

    #[tokio::test]
    async fn counts_three_rows() {
        let source = Arc::new(FakeSource::with_ids([1, 2, 3]));
        let report = count_table(Arc::clone(&source), &users(), options(2, 2))
            .await
            .unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(report.max_id, 3);
        assert_eq!(report.summary.ranges, 2);
        assert_eq!(
            report.result_line(),
            "Total number of records in the users table: 3"
        );
    }

    #[tokio::test]
    async fn empty_table_aborts_before_counting() {
        let source = Arc::new(FakeSource::with_ids([]));
        let err = count_table(Arc::clone(&source), &users(), options(3, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::EmptyTable(_))
        ));
        assert!(format!("{:#}", err).contains("failed to get max ID from users"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn varchar_id_aborts_before_counting() {
        let source = Arc::new(FakeSource::with_ids([1, 2]).with_column(Some(IdColumnInfo {
            name: "id".to_string(),
            data_type: "varchar".to_string(),
            primary_key: true,
        })));
        let err = count_table(Arc::clone(&source), &users(), options(3, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::NotIntegerPrimaryKey { .. })
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn missing_id_column_aborts() {
        let source = Arc::new(FakeSource::with_ids([1]).with_column(None));
        let err = count_table(Arc::clone(&source), &users(), options(3, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::Metadata { .. })
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn failed_range_is_dropped_by_default() {
        let source = Arc::new(FakeSource::with_ids(1..=6).failing(3));
        let report = count_table(Arc::clone(&source), &users(), options(2, 2))
            .await
            .unwrap();
        assert_eq!(report.total(), 4);
        assert_eq!(report.summary.failed.len(), 1);
    }

    #[tokio::test]
    async fn strict_mode_fails_the_run() {
        let source = Arc::new(FakeSource::with_ids(1..=6).failing(3));
        let opts = CountOptions {
            policy: FailurePolicy::Abort,
            ..options(2, 2)
        };
        let err = count_table(source, &users(), opts).await.unwrap_err();
        assert!(err
            .downcast_ref::<aggregate::AggregateError>()
            .is_some());
    }
}
