use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MasterResumeRow {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<MasterResumeRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM master_resumes ORDER BY is_default DESC, id ASC")
        .fetch_all(pool)
        .await
}

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<MasterResumeRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM master_resumes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// The resume used for tailoring: the default one, else the oldest.
pub async fn find_default(pool: &SqlitePool) -> Result<Option<MasterResumeRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM master_resumes ORDER BY is_default DESC, id ASC LIMIT 1")
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    content: &str,
    is_default: bool,
) -> Result<MasterResumeRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    if is_default {
        sqlx::query("UPDATE master_resumes SET is_default = 0 WHERE is_default = 1")
            .execute(&mut *tx)
            .await?;
    }

    let row = sqlx::query_as(
        r#"
        INSERT INTO master_resumes (name, content, is_default, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(content)
    .bind(is_default)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumeUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
    pub is_default: Option<bool>,
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    update: &ResumeUpdate,
) -> Result<Option<MasterResumeRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if update.is_default == Some(true) {
        sqlx::query("UPDATE master_resumes SET is_default = 0 WHERE is_default = 1 AND id != ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    let row = sqlx::query_as(
        r#"
        UPDATE master_resumes SET
            name = COALESCE(?, name),
            content = COALESCE(?, content),
            is_default = COALESCE(?, is_default),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&update.name)
    .bind(&update.content)
    .bind(update.is_default)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM master_resumes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_oldest_resume_used_when_none_is_default() {
        let pool = test_pool().await;
        assert!(find_default(&pool).await.unwrap().is_none());

        let first = create(&pool, "Main", "# Jane Doe", false).await.unwrap();
        create(&pool, "Alt", "# Jane D.", false).await.unwrap();
        assert_eq!(find_default(&pool).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_only_one_default() {
        let pool = test_pool().await;
        let first = create(&pool, "Main", "a", true).await.unwrap();
        let second = create(&pool, "Alt", "b", true).await.unwrap();

        assert!(!find(&pool, first.id).await.unwrap().unwrap().is_default);
        assert_eq!(find_default(&pool).await.unwrap().unwrap().id, second.id);

        update(
            &pool,
            first.id,
            &ResumeUpdate {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(find_default(&pool).await.unwrap().unwrap().id, first.id);
        assert!(!find(&pool, second.id).await.unwrap().unwrap().is_default);
    }
}
