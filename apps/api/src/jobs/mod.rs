//! Saved jobs: manual entry from a pasted posting, import from board
//! search results, and the status moves the user makes by hand.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::boards::BoardJob;
use crate::errors::AppError;
use crate::models::application;
use crate::models::job::{self, JobRow, NewJob};
use crate::parser::{self, ParseHints, ParsedJob};
use crate::workflow::{JobEvent, JobStatus, TransitionError};

pub mod handlers;

/// A job typed or pasted in by the user. Explicit fields win over whatever
/// the parser finds in the description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualJob {
    pub description: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub hiring_manager: Option<String>,
    pub source: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Merges the user's fields with the parsed posting.
pub fn new_job_from_manual(input: &ManualJob, parsed: ParsedJob) -> Result<NewJob, AppError> {
    let title = non_empty(&input.title).or(parsed.title).ok_or_else(|| {
        AppError::Validation("Job title could not be found in the posting; enter it".to_string())
    })?;
    let company = non_empty(&input.company).or(parsed.company).ok_or_else(|| {
        AppError::Validation("Company could not be found in the posting; enter it".to_string())
    })?;

    let raw = input.description.trim();
    let description = parsed
        .cleaned_description
        .or_else(|| (!raw.is_empty()).then(|| raw.to_string()));

    Ok(NewJob {
        board_job_id: None,
        board_token: None,
        source: non_empty(&input.source).unwrap_or_else(|| "manual".to_string()),
        title,
        company,
        location: non_empty(&input.location).or(parsed.location),
        url: non_empty(&input.url),
        description,
        department: None,
        employment_type: None,
        salary_min: parsed.salary_min,
        salary_max: parsed.salary_max,
        salary_text: parsed.salary_text,
        is_remote: parsed.is_remote,
        experience_years: parsed.experience_years,
        skills: parsed.skills,
        hiring_manager: non_empty(&input.hiring_manager).or(parsed.hiring_manager),
        posted_at: parsed.posted_at,
    })
}

pub async fn create_manual(pool: &SqlitePool, input: &ManualJob) -> Result<JobRow, AppError> {
    let hints = ParseHints {
        title: non_empty(&input.title),
        location: non_empty(&input.location),
    };
    let parsed = parser::parse_job_description(&input.description, &hints);
    let new_job = new_job_from_manual(input, parsed)?;

    let row = job::insert(pool, &new_job).await?;
    info!(job_id = row.id, title = %row.title, company = %row.company, "Job added");
    Ok(row)
}

/// Saves a board listing. Saving the same listing twice returns the stored
/// job; the bool is true only when a row was created.
pub async fn import_board_job(pool: &SqlitePool, listing: &BoardJob) -> Result<(JobRow, bool), AppError> {
    if let Some(existing) = job::find_by_board_id(pool, &listing.board_job_id).await? {
        return Ok((existing, false));
    }
    let row = job::insert(pool, &listing.to_new_job()).await?;
    info!(job_id = row.id, board = %listing.board_token, board_job_id = %listing.board_job_id, "Job imported");
    Ok((row, true))
}

pub async fn load(pool: &SqlitePool, id: i64) -> Result<JobRow, AppError> {
    job::find(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// The error for a conditional update that lost a race: reports the status
/// the job holds now.
pub async fn lost_race(pool: &SqlitePool, id: i64, action: &'static str) -> AppError {
    match job::find(pool, id).await {
        Ok(Some(row)) => match row.job_status() {
            Ok(from) => TransitionError::Job { from, action }.into(),
            Err(e) => e.into(),
        },
        Ok(None) => AppError::NotFound(format!("Job {id} not found")),
        Err(e) => e.into(),
    }
}

/// Applies `Opened`: a new job moves to reviewing, anything else stays put.
pub async fn open(pool: &SqlitePool, row: JobRow) -> Result<JobRow, AppError> {
    let from = row.job_status()?;
    let next = from.apply(JobEvent::Opened)?;
    if next == from {
        return Ok(row);
    }
    // Losing the race here only means someone else moved it first.
    job::transition(pool, row.id, from, next).await?;
    load(pool, row.id).await
}

pub async fn reject(pool: &SqlitePool, id: i64) -> Result<JobRow, AppError> {
    let from = load(pool, id).await?.job_status()?;
    let next = from.apply(JobEvent::Rejected)?;
    if next != from && !job::transition(pool, id, from, next).await? {
        return Err(lost_race(pool, id, "reject").await);
    }
    info!(job_id = id, from = %from, "Job rejected");
    load(pool, id).await
}

/// Marks a job applied by hand. The job must be ready with a complete
/// document set; its application, if any, gets the same timestamp.
pub async fn mark_applied(pool: &SqlitePool, id: i64) -> Result<JobRow, AppError> {
    let from = load(pool, id).await?.job_status()?;
    let application = application::find_by_job(pool, id).await?;
    let documents_ready = application.as_ref().is_some_and(|a| a.has_documents());
    from.apply(JobEvent::MarkedApplied { documents_ready })?;

    let now = Utc::now();
    if !job::mark_applied(pool, id, from, now).await? {
        return Err(lost_race(pool, id, "mark applied").await);
    }
    if let Some(app) = application {
        application::mark_applied(pool, app.id, app.application_status()?, None, now).await?;
    }
    info!(job_id = id, "Job marked applied");
    load(pool, id).await
}

pub fn parse_status(raw: &str) -> Result<JobStatus, AppError> {
    raw.trim()
        .parse()
        .map_err(|e: TransitionError| AppError::Validation(e.to_string()))
}
