//! SQLite table source (local database files; also backs the integration tests).

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use super::error::{id_param, non_negative, SourceError};
use super::TableSource;
use crate::planner::IdRange;
use crate::schema::IdColumnInfo;
use crate::table::TableName;

/// Handle to a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    pool: Pool<Sqlite>,
}

impl SqliteSource {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SourceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests build pools over temporary files).
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

impl TableSource for SqliteSource {
    async fn id_column(&self, table: &TableName) -> Result<IdColumnInfo, SourceError> {
        // pk is the 1-based position in the primary key, 0 when not part of it.
        let row: Option<(String, String, i64)> = sqlx::query_as(
            "SELECT name, type, pk FROM pragma_table_info(?1, ?2) WHERE name = 'id' COLLATE NOCASE",
        )
        .bind(table.table())
        .bind(table.schema().unwrap_or("main"))
        .fetch_optional(&self.pool)
        .await?;

        let (name, data_type, pk) =
            row.ok_or_else(|| SourceError::ColumnNotFound(table.to_string()))?;
        Ok(IdColumnInfo {
            name,
            data_type,
            primary_key: pk > 0,
        })
    }

    async fn max_id(&self, table: &TableName) -> Result<u64, SourceError> {
        let sql = format!(
            "SELECT id FROM {} ORDER BY id DESC LIMIT 1",
            table.quoted_ansi()
        );
        let max: Option<i64> = sqlx::query_scalar(&sql).fetch_optional(&self.pool).await?;
        max.map(non_negative)
            .ok_or_else(|| SourceError::EmptyTable(table.to_string()))
    }

    async fn count_range(&self, table: &TableName, range: IdRange) -> Result<u64, SourceError> {
        let sql = format!(
            "SELECT COUNT(id) FROM {} WHERE id BETWEEN ?1 AND ?2",
            table.quoted_ansi()
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id_param(range.start)?)
            .bind(id_param(range.end)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(non_negative(count))
    }
}
