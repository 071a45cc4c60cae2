//! Axum route handlers for tailoring.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::generation::tailor::{tailor_job, TailorOutcome};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TailorParams {
    /// Master resume to tailor from; the default one when absent.
    pub resume_id: Option<i64>,
}

/// POST /api/v1/jobs/:id/tailor
///
/// Generates a tailored resume and cover letter with the active AI provider
/// and writes both documents. Blocks until generation and conversion finish.
/// A failure is recorded on the job and can be retried with the same call.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Query(params): Query<TailorParams>,
) -> Result<Json<TailorOutcome>, AppError> {
    Ok(Json(tailor_job(&state, job_id, params.resume_id).await?))
}
