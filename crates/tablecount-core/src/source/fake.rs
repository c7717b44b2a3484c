//! In-memory table source for unit tests.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{SourceError, TableSource};
use crate::planner::IdRange;
use crate::schema::IdColumnInfo;
use crate::table::TableName;

/// Table of ids held in memory. Records how many count queries ran and the
/// peak number running at once.
#[derive(Debug)]
pub(crate) struct FakeSource {
    pub ids: Vec<u64>,
    pub column: Option<IdColumnInfo>,
    /// Ranges (by start id) whose count query fails with a dropped connection.
    pub failing_starts: HashSet<u64>,
    /// Ranges (by start id) whose count query panics.
    pub panicking_starts: HashSet<u64>,
    pub delay: Duration,
    pub count_calls: AtomicUsize,
    active: AtomicUsize,
    pub peak: AtomicUsize,
}

impl FakeSource {
    pub fn with_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            column: Some(IdColumnInfo {
                name: "id".to_string(),
                data_type: "int".to_string(),
                primary_key: true,
            }),
            failing_starts: HashSet::new(),
            panicking_starts: HashSet::new(),
            delay: Duration::from_millis(0),
            count_calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, start: u64) -> Self {
        self.failing_starts.insert(start);
        self
    }

    pub fn panicking(mut self, start: u64) -> Self {
        self.panicking_starts.insert(start);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_column(mut self, column: Option<IdColumnInfo>) -> Self {
        self.column = column;
        self
    }

    pub fn calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TableSource for FakeSource {
    async fn id_column(&self, table: &TableName) -> Result<IdColumnInfo, SourceError> {
        self.column
            .clone()
            .ok_or_else(|| SourceError::ColumnNotFound(table.to_string()))
    }

    async fn max_id(&self, table: &TableName) -> Result<u64, SourceError> {
        self.ids
            .iter()
            .copied()
            .max()
            .ok_or_else(|| SourceError::EmptyTable(table.to_string()))
    }

    async fn count_range(&self, _table: &TableName, range: IdRange) -> Result<u64, SourceError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panicking_starts.contains(&range.start) {
            panic!("count worker crashed on range {range}");
        }
        if self.failing_starts.contains(&range.start) {
            return Err(SourceError::Query(sqlx::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection dropped",
            ))));
        }
        Ok(self.ids.iter().filter(|id| range.contains(**id)).count() as u64)
    }
}
