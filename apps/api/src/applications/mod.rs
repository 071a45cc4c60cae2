//! Tailored applications: review, edit, download, discard and submit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::boards::{Submission, SubmissionError, SubmissionReceipt};
use crate::documents::{self, extract_applicant_info, read_markdown, render_preview, DocumentKind};
use crate::errors::AppError;
use crate::jobs;
use crate::models::application::{self, ApplicantUpdate, ApplicationRow};
use crate::models::job::{self, JobRow};
use crate::state::AppState;
use crate::workflow::{ApplicationEvent, ApplicationStatus, JobEvent, JobStatus, TransitionError};

pub mod handlers;

#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    pub application: ApplicationRow,
    pub job: JobRow,
    pub resume_markdown: Option<String>,
    pub cover_letter_markdown: Option<String>,
    pub resume_html: Option<String>,
    pub cover_letter_html: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentEdits {
    pub resume_markdown: Option<String>,
    pub cover_letter_markdown: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub job: JobRow,
    pub application: ApplicationRow,
    pub receipt: SubmissionReceipt,
}

pub async fn load(state: &AppState, id: i64) -> Result<ApplicationRow, AppError> {
    application::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

async fn markdown(path: Option<&str>) -> Result<Option<String>, AppError> {
    match path {
        Some(path) => Ok(read_markdown(path).await?),
        None => Ok(None),
    }
}

/// Loads the application with its documents. Empty applicant fields are
/// filled from the resume the first time they are needed.
pub async fn detail(state: &AppState, id: i64) -> Result<ApplicationDetail, AppError> {
    let mut app = load(state, id).await?;
    let job = jobs::load(&state.db, app.job_id).await?;

    let resume_markdown = markdown(app.resume_md.as_deref()).await?;
    let cover_letter_markdown = markdown(app.cover_letter_md.as_deref()).await?;

    if let Some(resume) = &resume_markdown {
        if app.first_name.as_deref().map_or(true, str::is_empty) {
            let info = extract_applicant_info(resume);
            let update = ApplicantUpdate {
                first_name: info.first_name,
                last_name: info.last_name,
                email: info.email,
                phone: info.phone,
                notes: None,
            };
            if let Some(updated) = application::update_applicant(&state.db, id, &update).await? {
                app = updated;
            }
        }
    }

    Ok(ApplicationDetail {
        resume_html: resume_markdown.as_deref().map(render_preview),
        cover_letter_html: cover_letter_markdown.as_deref().map(render_preview),
        application: app,
        job,
        resume_markdown,
        cover_letter_markdown,
    })
}

/// Rewrites and re-converts the edited documents. Submitted applications
/// keep the files the board received.
pub async fn edit_documents(
    state: &AppState,
    id: i64,
    edits: &DocumentEdits,
) -> Result<ApplicationDetail, AppError> {
    let app = load(state, id).await?;
    if !app.has_documents() {
        return Err(AppError::Validation(
            "Tailor the job before editing its documents".to_string(),
        ));
    }
    app.application_status()?
        .apply(ApplicationEvent::DocumentsWritten)?;

    let mut changed = Vec::with_capacity(2);
    if let Some(resume) = edits.resume_markdown.as_deref() {
        changed.push((DocumentKind::Resume, resume));
    }
    if let Some(cover_letter) = edits.cover_letter_markdown.as_deref() {
        changed.push((DocumentKind::CoverLetter, cover_letter));
    }
    if changed.is_empty() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }
    if changed.iter().any(|(_, text)| text.trim().is_empty()) {
        return Err(AppError::Validation("Documents cannot be empty".to_string()));
    }

    state.documents.write(app.job_id, &changed).await?;
    info!(application_id = id, count = changed.len(), "Documents edited");
    detail(state, id).await
}

/// Deletes the application and its files. The job goes back to reviewing
/// unless it was rejected. Sent applications and applied jobs are kept.
pub async fn discard(state: &AppState, id: i64) -> Result<(), AppError> {
    let app = load(state, id).await?;
    let status = app.application_status()?;
    if matches!(status, ApplicationStatus::Submitted | ApplicationStatus::Confirmed) {
        return Err(TransitionError::Application {
            from: status,
            action: "discard",
        }
        .into());
    }
    let job = jobs::load(&state.db, app.job_id).await?;
    let from = job.job_status()?;

    let next = match from.apply(JobEvent::ApplicationDiscarded) {
        Ok(next) => Some(next),
        Err(_) if from == JobStatus::Rejected => None,
        Err(e) => return Err(e.into()),
    };

    application::delete(&state.db, id).await?;
    if state.documents.remove(app.job_id).await.is_err() {
        warn!(application_id = id, "Application discarded but its documents were left on disk");
    }
    if let Some(next) = next.filter(|next| *next != from) {
        if !job::transition(&state.db, job.id, from, next).await? {
            warn!(job_id = job.id, "Job status changed while its application was discarded");
        }
    }
    info!(application_id = id, job_id = job.id, "Application discarded");
    Ok(())
}

fn required(value: &Option<String>, field: &str) -> Result<String, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("Applicant {field} is required to submit")))
}

/// Sends the application to the job's board, then marks both rows applied.
/// A board failure is kept in `last_error` and nothing else changes.
pub async fn submit(state: &AppState, id: i64) -> Result<SubmitOutcome, AppError> {
    let app = load(state, id).await?;
    let job = jobs::load(&state.db, app.job_id).await?;

    let (Some(board_token), Some(board_job_id)) = (job.board_token.clone(), job.board_job_id.clone())
    else {
        return Err(SubmissionError::NotABoardJob.into());
    };

    let submitted = app.application_status()?.apply(ApplicationEvent::Submitted)?;
    let from = job.job_status()?;
    from.apply(JobEvent::MarkedApplied {
        documents_ready: app.has_documents(),
    })?;

    let paths = state.documents.paths(job.id);
    let submission = Submission {
        board_token,
        board_job_id,
        first_name: required(&app.first_name, "first name")?,
        last_name: required(&app.last_name, "last name")?,
        email: required(&app.email, "email")?,
        phone: app.phone.clone().filter(|p| !p.trim().is_empty()),
        resume_pdf: paths.path(documents::DocumentFile::ResumePdf).to_path_buf(),
        cover_letter_pdf: paths.path(documents::DocumentFile::CoverLetterPdf).to_path_buf(),
    };

    let receipt = match state.boards.submit(&submission).await {
        Ok(receipt) => receipt,
        Err(e) => {
            let message = e.to_string();
            warn!(application_id = id, job_id = job.id, "Submission failed: {message}");
            application::record_error(&state.db, id, &message).await?;
            return Err(e.into());
        }
    };

    let status = if receipt.confirmed {
        submitted.apply(ApplicationEvent::Confirmed)?
    } else {
        submitted
    };
    let now = Utc::now();
    application::mark_applied(&state.db, id, status, Some(&receipt.external_id), now).await?;
    if !job::mark_applied(&state.db, job.id, from, now).await? {
        warn!(job_id = job.id, "Job status changed during submission");
    }
    info!(
        application_id = id,
        job_id = job.id,
        external_id = %receipt.external_id,
        status = %status,
        "Application submitted"
    );

    Ok(SubmitOutcome {
        job: jobs::load(&state.db, job.id).await?,
        application: load(state, id).await?,
        receipt,
    })
}
