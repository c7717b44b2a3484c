//! Database access for counting: column metadata, max id and range counts.
//!
//! `TableSource` is the seam between the counting pipeline and the database.
//! `Database` picks a backend from the connection string scheme:
//! `mysql://` / `mariadb://` use MySQL, `sqlite:` uses SQLite.

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod mysql;
mod sqlite;

use std::future::Future;

use crate::planner::IdRange;
use crate::schema::IdColumnInfo;
use crate::table::TableName;

pub use error::SourceError;
pub use mysql::MySqlSource;
pub use sqlite::SqliteSource;

/// Queries the counting pipeline needs from a database.
///
/// Implementations must be shareable across tasks; every method is read-only.
pub trait TableSource: Send + Sync {
    /// Metadata of the column named `id` in `table`.
    /// Returns `SourceError::ColumnNotFound` when the table or column does not exist.
    fn id_column(
        &self,
        table: &TableName,
    ) -> impl Future<Output = Result<IdColumnInfo, SourceError>> + Send;

    /// Largest id in `table` (`SourceError::EmptyTable` when there are no rows).
    /// Non-positive ids yield 0.
    fn max_id(&self, table: &TableName) -> impl Future<Output = Result<u64, SourceError>> + Send;

    /// `COUNT(id)` of rows whose id lies in `range` (inclusive).
    fn count_range(
        &self,
        table: &TableName,
        range: IdRange,
    ) -> impl Future<Output = Result<u64, SourceError>> + Send;
}

/// A connected database of either supported kind.
#[derive(Debug, Clone)]
pub enum Database {
    MySql(MySqlSource),
    Sqlite(SqliteSource),
}

/// Opens a connection pool for `database_url` with up to `max_connections` connections.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<Database, SourceError> {
    let parsed = url::Url::parse(database_url)?;
    let max_connections = max_connections.max(1);
    match parsed.scheme() {
        "mysql" | "mariadb" => Ok(Database::MySql(
            MySqlSource::connect(database_url, max_connections).await?,
        )),
        "sqlite" => Ok(Database::Sqlite(
            SqliteSource::connect(database_url, max_connections).await?,
        )),
        other => Err(SourceError::UnsupportedScheme(other.to_string())),
    }
}

/// Connection string with any password replaced by `***`, for logging.
pub fn redact_url(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparsable database URL>".to_string(),
    }
}

impl TableSource for Database {
    async fn id_column(&self, table: &TableName) -> Result<IdColumnInfo, SourceError> {
        match self {
            Database::MySql(s) => s.id_column(table).await,
            Database::Sqlite(s) => s.id_column(table).await,
        }
    }

    async fn max_id(&self, table: &TableName) -> Result<u64, SourceError> {
        match self {
            Database::MySql(s) => s.max_id(table).await,
            Database::Sqlite(s) => s.max_id(table).await,
        }
    }

    async fn count_range(&self, table: &TableName, range: IdRange) -> Result<u64, SourceError> {
        match self {
            Database::MySql(s) => s.count_range(table, range).await,
            Database::Sqlite(s) => s.count_range(table, range).await,
        }
    }
}
