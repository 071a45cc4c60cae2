use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::workflow::{JobStatus, TransitionError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub board_job_id: Option<String>,
    pub board_token: Option<String>,
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_text: Option<String>,
    pub is_remote: Option<bool>,
    pub experience_years: Option<String>,
    pub skills: Option<Json<Vec<String>>>,
    pub hiring_manager: Option<String>,
    pub status: String,
    pub last_error: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    pub fn job_status(&self) -> Result<JobStatus, TransitionError> {
        self.status.parse()
    }
}

/// Fields for a job about to be stored, from a board search or a parsed paste.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub board_job_id: Option<String>,
    pub board_token: Option<String>,
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_text: Option<String>,
    pub is_remote: Option<bool>,
    pub experience_years: Option<String>,
    pub skills: Vec<String>,
    pub hiring_manager: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

pub async fn insert(pool: &SqlitePool, job: &NewJob) -> Result<JobRow, sqlx::Error> {
    let now = Utc::now();
    let skills = (!job.skills.is_empty()).then(|| Json(job.skills.clone()));

    sqlx::query_as(
        r#"
        INSERT INTO jobs
            (board_job_id, board_token, source, title, company, location, url, description,
             department, employment_type, salary_min, salary_max, salary_text, is_remote,
             experience_years, skills, hiring_manager, status, posted_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&job.board_job_id)
    .bind(&job.board_token)
    .bind(&job.source)
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.location)
    .bind(&job.url)
    .bind(&job.description)
    .bind(&job.department)
    .bind(&job.employment_type)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(&job.salary_text)
    .bind(job.is_remote)
    .bind(&job.experience_years)
    .bind(skills)
    .bind(&job.hiring_manager)
    .bind(JobStatus::New.as_str())
    .bind(job.posted_at)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_board_id(
    pool: &SqlitePool,
    board_job_id: &str,
) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM jobs WHERE board_job_id = ?")
        .bind(board_job_id)
        .fetch_optional(pool)
        .await
}

/// Lists jobs newest first. Without a filter, applied jobs are left out
/// because they are tracked on the applications list.
pub async fn list(pool: &SqlitePool, status: Option<JobStatus>) -> Result<Vec<JobRow>, sqlx::Error> {
    match status {
        Some(status) => {
            sqlx::query_as("SELECT * FROM jobs WHERE status = ? ORDER BY created_at DESC, id DESC")
                .bind(status.as_str())
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as("SELECT * FROM jobs WHERE status != ? ORDER BY created_at DESC, id DESC")
                .bind(JobStatus::Applied.as_str())
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM jobs ORDER BY created_at DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Moves a job from `from` to `to` only if it is still in `from`.
/// Returns false when another request changed the status first.
pub async fn transition(
    pool: &SqlitePool,
    id: i64,
    from: JobStatus,
    to: JobStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(from.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Releases a job from `tailoring`. Returns false when the job was rejected
/// or deleted while the run was in flight; such a job is left as it is.
pub async fn finish_tailoring(
    pool: &SqlitePool,
    id: i64,
    status: JobStatus,
    last_error: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE jobs SET status = ?, last_error = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(status.as_str())
    .bind(last_error)
    .bind(Utc::now())
    .bind(id)
    .bind(JobStatus::Tailoring.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_applied(
    pool: &SqlitePool,
    id: i64,
    from: JobStatus,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE jobs SET status = ?, applied_at = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(JobStatus::Applied.as_str())
    .bind(at)
    .bind(Utc::now())
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_by_status(pool: &SqlitePool) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Maps each already-stored board job id to its local job id.
pub async fn saved_board_ids(
    pool: &SqlitePool,
    board_job_ids: &[String],
) -> Result<HashMap<String, i64>, sqlx::Error> {
    if board_job_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT board_job_id, id FROM jobs WHERE board_job_id IN (");
    let mut ids = query.separated(", ");
    for board_job_id in board_job_ids {
        ids.push_bind(board_job_id);
    }
    ids.push_unseparated(")");

    let rows: Vec<(String, i64)> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn sample(board_job_id: Option<&str>) -> NewJob {
        NewJob {
            board_job_id: board_job_id.map(str::to_string),
            source: "manual".to_string(),
            title: "Platform Engineer".to_string(),
            company: "Acme".to_string(),
            skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_starts_as_new() {
        let pool = test_pool().await;
        let job = insert(&pool, &sample(None)).await.unwrap();
        assert_eq!(job.job_status().unwrap(), JobStatus::New);
        assert_eq!(job.skills.unwrap().0, vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn test_transition_only_applies_from_expected_status() {
        let pool = test_pool().await;
        let job = insert(&pool, &sample(None)).await.unwrap();

        assert!(transition(&pool, job.id, JobStatus::New, JobStatus::Tailoring)
            .await
            .unwrap());
        // A second claim from the stale status loses.
        assert!(!transition(&pool, job.id, JobStatus::New, JobStatus::Tailoring)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_finish_tailoring_leaves_rejected_job_alone() {
        let pool = test_pool().await;
        let job = insert(&pool, &sample(None)).await.unwrap();
        transition(&pool, job.id, JobStatus::New, JobStatus::Tailoring)
            .await
            .unwrap();
        transition(&pool, job.id, JobStatus::Tailoring, JobStatus::Rejected)
            .await
            .unwrap();

        assert!(!finish_tailoring(&pool, job.id, JobStatus::Ready, None).await.unwrap());
        let job = find(&pool, job.id).await.unwrap().unwrap();
        assert_eq!(job.job_status().unwrap(), JobStatus::Rejected);
    }

    #[tokio::test]
    async fn test_default_listing_hides_applied_jobs() {
        let pool = test_pool().await;
        let kept = insert(&pool, &sample(None)).await.unwrap();
        let applied = insert(&pool, &sample(None)).await.unwrap();
        sqlx::query("UPDATE jobs SET status = 'applied' WHERE id = ?")
            .bind(applied.id)
            .execute(&pool)
            .await
            .unwrap();

        let ids: Vec<i64> = list(&pool, None).await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![kept.id]);

        let applied_only = list(&pool, Some(JobStatus::Applied)).await.unwrap();
        assert_eq!(applied_only.len(), 1);
        assert_eq!(applied_only[0].id, applied.id);
    }

    #[tokio::test]
    async fn test_saved_board_ids_reports_only_stored_jobs() {
        let pool = test_pool().await;
        let stored = insert(&pool, &sample(Some("gh-1"))).await.unwrap();

        let saved = saved_board_ids(&pool, &["gh-1".to_string(), "gh-2".to_string()])
            .await
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved.get("gh-1"), Some(&stored.id));
        assert!(saved_board_ids(&pool, &[]).await.unwrap().is_empty());
    }
}
