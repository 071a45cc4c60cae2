use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::boards::{self, BoardJob, Freshness};
use crate::documents::render_preview;
use crate::errors::AppError;
use crate::jobs::{self, ManualJob};
use crate::models::application::{self, ApplicationRow};
use crate::models::job::{self, JobRow};
use crate::parser::{self, ParseHints, ParsedJob};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    #[serde(alias = "description")]
    pub text: String,
    #[serde(flatten)]
    pub hints: ParseHints,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobListParams {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportJobResponse {
    pub job: JobRow,
    /// False when the listing was already saved.
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct JobDetail {
    pub job: JobRow,
    pub age: Freshness,
    pub description_html: Option<String>,
    pub application: Option<ApplicationRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/parse
///
/// Extracts fields from a pasted posting without saving anything.
pub async fn handle_parse_job(Json(req): Json<ParseJobRequest>) -> Json<ParsedJob> {
    Json(parser::parse_job_description(&req.text, &req.hints))
}

/// GET /api/v1/jobs?status=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListParams>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let status = match params.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(jobs::parse_status(raw)?),
        None => None,
    };
    Ok(Json(job::list(&state.db, status).await?))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<ManualJob>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let row = jobs::create_manual(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/jobs/import
pub async fn handle_import_job(
    State(state): State<AppState>,
    Json(listing): Json<BoardJob>,
) -> Result<Json<ImportJobResponse>, AppError> {
    let (job, created) = jobs::import_board_job(&state.db, &listing).await?;
    Ok(Json(ImportJobResponse { job, created }))
}

/// GET /api/v1/jobs/:id
///
/// Opening a new job moves it to reviewing.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobDetail>, AppError> {
    let row = jobs::load(&state.db, id).await?;
    let row = jobs::open(&state.db, row).await?;
    let application = application::find_by_job(&state.db, id).await?;

    Ok(Json(JobDetail {
        age: boards::freshness(row.posted_at, Utc::now()),
        description_html: row.description.as_deref().map(render_preview),
        job: row,
        application,
    }))
}

/// DELETE /api/v1/jobs/:id
///
/// Removes the job, its application and the application's files.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !job::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    // The row is gone either way; a leftover directory is only logged.
    if state.documents.remove(id).await.is_err() {
        warn!(job_id = id, "Job deleted but its documents were left on disk");
    }
    info!(job_id = id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:id/applied
pub async fn handle_mark_applied(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(jobs::mark_applied(&state.db, id).await?))
}

/// POST /api/v1/jobs/:id/reject
pub async fn handle_reject_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(jobs::reject(&state.db, id).await?))
}
