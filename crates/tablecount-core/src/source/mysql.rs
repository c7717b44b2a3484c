//! MySQL / MariaDB table source.

use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};

use super::error::{id_param, non_negative, parse_max_id, SourceError};
use super::TableSource;
use crate::planner::IdRange;
use crate::schema::IdColumnInfo;
use crate::table::TableName;

/// Key value `INFORMATION_SCHEMA.COLUMNS.COLUMN_KEY` reports for primary keys.
const PRIMARY_KEY: &str = "PRI";

/// Handle to a MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: Pool<MySql>,
}

impl MySqlSource {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SourceError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

impl TableSource for MySqlSource {
    async fn id_column(&self, table: &TableName) -> Result<IdColumnInfo, SourceError> {
        // Unqualified names resolve against the connection's current database.
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR), CAST(COLUMN_KEY AS CHAR)
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
              AND TABLE_NAME = ?
              AND COLUMN_NAME = 'id'
            "#,
        )
        .bind(table.schema())
        .bind(table.table())
        .fetch_optional(&self.pool)
        .await?;

        let (name, data_type, column_key) =
            row.ok_or_else(|| SourceError::ColumnNotFound(table.to_string()))?;
        Ok(IdColumnInfo {
            name,
            data_type,
            primary_key: column_key == PRIMARY_KEY,
        })
    }

    async fn max_id(&self, table: &TableName) -> Result<u64, SourceError> {
        // Text decodes the same for signed and unsigned id columns.
        let sql = format!(
            "SELECT CAST(id AS CHAR) FROM {} ORDER BY id DESC LIMIT 1",
            table.quoted_mysql()
        );
        let max: Option<String> = sqlx::query_scalar(&sql).fetch_optional(&self.pool).await?;
        let max = max.ok_or_else(|| SourceError::EmptyTable(table.to_string()))?;
        parse_max_id(&max)
    }

    async fn count_range(&self, table: &TableName, range: IdRange) -> Result<u64, SourceError> {
        let sql = format!(
            "SELECT COUNT(id) FROM {} WHERE id BETWEEN ? AND ?",
            table.quoted_mysql()
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id_param(range.start)?)
            .bind(id_param(range.end)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(non_negative(count))
    }
}
