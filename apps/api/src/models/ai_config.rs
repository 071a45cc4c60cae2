use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Stored provider configuration. Never serialized directly: the encrypted
/// credential stays server-side, see [`AiConfigView`].
#[derive(Debug, Clone, FromRow)]
pub struct AiConfigRow {
    pub id: i64,
    pub provider: String,
    pub encrypted_credential: Option<String>,
    pub model_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiConfigView {
    pub id: i64,
    pub provider: String,
    pub model_name: String,
    pub is_active: bool,
    pub has_credential: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&AiConfigRow> for AiConfigView {
    fn from(row: &AiConfigRow) -> Self {
        AiConfigView {
            id: row.id,
            provider: row.provider.clone(),
            model_name: row.model_name.clone(),
            is_active: row.is_active,
            has_credential: row.encrypted_credential.is_some(),
            updated_at: row.updated_at,
        }
    }
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<AiConfigRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ai_configs ORDER BY provider")
        .fetch_all(pool)
        .await
}

pub async fn find_active(pool: &SqlitePool) -> Result<Option<AiConfigRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ai_configs WHERE is_active = 1")
        .fetch_optional(pool)
        .await
}

pub async fn find_by_provider(
    pool: &SqlitePool,
    provider: &str,
) -> Result<Option<AiConfigRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ai_configs WHERE provider = ?")
        .bind(provider)
        .fetch_optional(pool)
        .await
}

/// Saves the configuration for `provider` and makes it the only active one.
///
/// A `None` credential keeps whatever was stored before for that provider, so
/// switching back to a provider does not require re-entering its key.
pub async fn save_active(
    pool: &SqlitePool,
    provider: &str,
    encrypted_credential: Option<&str>,
    model_name: &str,
) -> Result<AiConfigRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    sqlx::query("UPDATE ai_configs SET is_active = 0, updated_at = ? WHERE is_active = 1")
        .bind(now)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as(
        r#"
        INSERT INTO ai_configs (provider, encrypted_credential, model_name, is_active, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?)
        ON CONFLICT (provider) DO UPDATE SET
            encrypted_credential = COALESCE(excluded.encrypted_credential, ai_configs.encrypted_credential),
            model_name = excluded.model_name,
            is_active = 1,
            updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(provider)
    .bind(encrypted_credential)
    .bind(model_name)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
