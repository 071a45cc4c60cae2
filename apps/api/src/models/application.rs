use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::documents::{ApplicantInfo, DocumentPaths};
use crate::workflow::{ApplicationStatus, TransitionError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: i64,
    pub job_id: i64,
    pub resume_md: Option<String>,
    pub resume_pdf: Option<String>,
    pub cover_letter_md: Option<String>,
    pub cover_letter_pdf: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub tailored_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub external_application_id: Option<String>,
    pub status: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    pub fn application_status(&self) -> Result<ApplicationStatus, TransitionError> {
        self.status.parse()
    }

    /// True when all four document paths are recorded.
    pub fn has_documents(&self) -> bool {
        [
            &self.resume_md,
            &self.resume_pdf,
            &self.cover_letter_md,
            &self.cover_letter_pdf,
        ]
        .iter()
        .all(|p| p.as_deref().is_some_and(|p| !p.is_empty()))
    }
}

/// Application joined with the job it belongs to, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationSummary {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company: String,
    pub status: String,
    pub tailored_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM applications WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_job(
    pool: &SqlitePool,
    job_id: i64,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM applications WHERE job_id = ?")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &SqlitePool, limit: Option<i64>) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT a.id, a.job_id, j.title AS job_title, j.company, a.status,
               a.tailored_at, a.applied_at, a.created_at
        FROM applications a
        JOIN jobs j ON j.id = a.job_id
        ORDER BY a.created_at DESC, a.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await
}

/// Returns the job's application, creating a draft if none exists yet.
pub async fn find_or_create_draft(
    pool: &SqlitePool,
    job_id: i64,
) -> Result<ApplicationRow, sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO applications (job_id, status, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (job_id) DO NOTHING
        "#,
    )
    .bind(job_id)
    .bind(ApplicationStatus::Draft.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as("SELECT * FROM applications WHERE job_id = ?")
        .bind(job_id)
        .fetch_one(pool)
        .await
}

/// Stores a freshly written document set. Applicant fields are only filled
/// where the user has not entered anything yet.
pub async fn record_documents(
    pool: &SqlitePool,
    id: i64,
    paths: &DocumentPaths,
    provider: &str,
    model: &str,
    status: ApplicationStatus,
    applicant: &ApplicantInfo,
) -> Result<ApplicationRow, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
        UPDATE applications SET
            resume_md = ?, resume_pdf = ?, cover_letter_md = ?, cover_letter_pdf = ?,
            ai_provider = ?, ai_model = ?, tailored_at = ?, status = ?, last_error = NULL,
            first_name = COALESCE(NULLIF(first_name, ''), ?),
            last_name = COALESCE(NULLIF(last_name, ''), ?),
            email = COALESCE(NULLIF(email, ''), ?),
            phone = COALESCE(NULLIF(phone, ''), ?),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(paths.resume_md.to_string_lossy().into_owned())
    .bind(paths.resume_pdf.to_string_lossy().into_owned())
    .bind(paths.cover_letter_md.to_string_lossy().into_owned())
    .bind(paths.cover_letter_pdf.to_string_lossy().into_owned())
    .bind(provider)
    .bind(model)
    .bind(now)
    .bind(status.as_str())
    .bind(&applicant.first_name)
    .bind(&applicant.last_name)
    .bind(&applicant.email)
    .bind(&applicant.phone)
    .bind(now)
    .bind(id)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Overwrites applicant fields. Fields left out of the update keep their value.
pub async fn update_applicant(
    pool: &SqlitePool,
    id: i64,
    update: &ApplicantUpdate,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE applications SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            notes = COALESCE(?, notes),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .bind(&update.phone)
    .bind(&update.notes)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    status: ApplicationStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE applications SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_applied(
    pool: &SqlitePool,
    id: i64,
    status: ApplicationStatus,
    external_application_id: Option<&str>,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE applications SET
            status = ?, applied_at = ?,
            external_application_id = COALESCE(?, external_application_id),
            last_error = NULL, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(at)
    .bind(external_application_id)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_error(pool: &SqlitePool, id: i64, message: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE applications SET last_error = ?, updated_at = ? WHERE id = ?")
        .bind(message)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM applications WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::job::{self, NewJob};

    async fn job_id(pool: &SqlitePool) -> i64 {
        job::insert(
            pool,
            &NewJob {
                source: "manual".to_string(),
                title: "SRE".to_string(),
                company: "Acme".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_one_application_per_job() {
        let pool = test_pool().await;
        let job_id = job_id(&pool).await;

        let first = find_or_create_draft(&pool, job_id).await.unwrap();
        let second = find_or_create_draft(&pool, job_id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.application_status().unwrap(), ApplicationStatus::Draft);
        assert!(!first.has_documents());
    }

    #[tokio::test]
    async fn test_record_documents_keeps_user_entered_applicant_fields() {
        let pool = test_pool().await;
        let job_id = job_id(&pool).await;
        let app = find_or_create_draft(&pool, job_id).await.unwrap();

        update_applicant(
            &pool,
            app.id,
            &ApplicantUpdate {
                email: Some("me@work.example".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let paths = DocumentPaths::for_job(std::path::Path::new("/tmp/apps"), job_id);
        let applicant = ApplicantInfo {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane@home.example".to_string()),
            phone: None,
        };
        let row = record_documents(
            &pool,
            app.id,
            &paths,
            "claude",
            "claude-sonnet-4-20250514",
            ApplicationStatus::Ready,
            &applicant,
        )
        .await
        .unwrap();

        assert!(row.has_documents());
        assert_eq!(row.first_name.as_deref(), Some("Jane"));
        assert_eq!(row.email.as_deref(), Some("me@work.example"));
        assert_eq!(row.status, "ready");
    }

    #[tokio::test]
    async fn test_deleting_job_cascades_to_application() {
        let pool = test_pool().await;
        let job_id = job_id(&pool).await;
        let app = find_or_create_draft(&pool, job_id).await.unwrap();

        job::delete(&pool, job_id).await.unwrap();
        assert!(find(&pool, app.id).await.unwrap().is_none());
    }
}
