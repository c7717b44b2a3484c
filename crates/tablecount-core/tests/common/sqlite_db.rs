//! Temporary SQLite databases with small tables to count.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tablecount_core::source::SqliteSource;
use tempfile::TempDir;

/// Open a fresh database file in a temp dir. Keep the `TempDir` alive for the test.
pub async fn temp_db() -> (TempDir, SqliteSource) {
    let dir = tempfile::tempdir().unwrap();
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("count.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await
        .unwrap();
    (dir, SqliteSource::from_pool(pool))
}

/// `users (id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(50))` with `rows` rows.
pub async fn create_users(db: &SqliteSource, rows: usize) {
    sqlx::query(
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(50))",
    )
    .execute(db.pool())
    .await
    .unwrap();
    for i in 0..rows {
        sqlx::query("INSERT INTO users (name) VALUES (?1)")
            .bind(format!("user-{i}"))
            .execute(db.pool())
            .await
            .unwrap();
    }
}

/// Actual row count, for comparison with range counting.
pub async fn count_star(db: &SqliteSource, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}
