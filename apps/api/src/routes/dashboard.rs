use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::application::{self, ApplicationSummary};
use crate::models::job::{self, JobRow};
use crate::models::search::{self, SearchHistoryRow};
use crate::state::AppState;
use crate::workflow::JobStatus;

const RECENT_JOBS: i64 = 10;
const RECENT_APPLICATIONS: i64 = 10;
const RECENT_SEARCHES: i64 = 5;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_jobs: i64,
    pub ready_to_apply: i64,
    pub applied: i64,
    pub by_status: HashMap<String, i64>,
    pub recent_jobs: Vec<JobRow>,
    pub recent_applications: Vec<ApplicationSummary>,
    pub recent_searches: Vec<SearchHistoryRow>,
}

/// GET /api/v1/dashboard
pub async fn handle_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    let by_status = job::count_by_status(&state.db).await?;
    let count = |status: JobStatus| by_status.get(status.as_str()).copied().unwrap_or(0);

    Ok(Json(Dashboard {
        total_jobs: by_status.values().sum(),
        ready_to_apply: count(JobStatus::Ready),
        applied: count(JobStatus::Applied),
        recent_jobs: job::recent(&state.db, RECENT_JOBS).await?,
        recent_applications: application::list(&state.db, Some(RECENT_APPLICATIONS)).await?,
        recent_searches: search::recent(&state.db, RECENT_SEARCHES).await?,
        by_status,
    }))
}
