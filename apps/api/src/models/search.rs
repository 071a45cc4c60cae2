use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

/// Searches kept in history; older ones are pruned on every insert.
pub const HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SearchHistoryRow {
    pub id: i64,
    pub keywords: String,
    pub location: Option<String>,
    pub boards: Option<Json<Vec<String>>>,
    pub result_count: i64,
    pub created_at: DateTime<Utc>,
}

pub async fn record(
    pool: &SqlitePool,
    keywords: &str,
    location: Option<&str>,
    boards: Option<&[String]>,
    result_count: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO search_history (keywords, location, boards, result_count, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(keywords)
    .bind(location)
    .bind(boards.map(|b| Json(b.to_vec())))
    .bind(result_count)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM search_history
        WHERE id NOT IN (SELECT id FROM search_history ORDER BY id DESC LIMIT ?)
        "#,
    )
    .bind(HISTORY_LIMIT)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<SearchHistoryRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM search_history ORDER BY id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
}
