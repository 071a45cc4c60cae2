//! Tailoring pipeline: turns a stored job and a master resume into a
//! tailored resume and cover letter on disk.
//!
//! Flow: resolve active provider -> claim job (-> tailoring) -> generate resume
//!       -> generate cover letter -> write + convert document pair -> record
//!       application (-> ready) -> release job (-> ready).
//!
//! On any failure after the claim the job is released to `ready` if an older
//! document set still exists, otherwise to `reviewing`, and the cause is kept
//! in `last_error` on both rows. A job rejected mid-run stays rejected; a job
//! deleted mid-run loses the files the run wrote.

use serde::Serialize;
use tracing::{info, warn};

use crate::documents::extract_applicant_info;
use crate::errors::AppError;
use crate::jobs;
use crate::llm_client::{generate_document, GenerationRequest, TextGenerator};
use crate::models::application::{self, ApplicationRow};
use crate::models::job::{self, JobRow};
use crate::models::resume::{self, MasterResumeRow};
use crate::settings::resolve_active_provider;
use crate::state::AppState;
use crate::workflow::{ApplicationEvent, JobEvent, JobStatus, TransitionError};

#[derive(Debug, Serialize)]
pub struct TailorOutcome {
    pub job: JobRow,
    pub application: ApplicationRow,
}

/// Runs the full tailoring pipeline for one job.
///
/// `resume_id` picks a master resume; without it the default one is used.
pub async fn tailor_job(
    state: &AppState,
    job_id: i64,
    resume_id: Option<i64>,
) -> Result<TailorOutcome, AppError> {
    let job = job::find(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let from = job.job_status()?;
    from.apply(JobEvent::TailoringRequested)?;

    let description = job
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Job has no description to tailor against".to_string()))?
        .to_string();
    let master = load_master_resume(state, resume_id).await?;

    // Configuration problems surface before the job is touched.
    let active = resolve_active_provider(&state.db, &state.cipher).await?;
    let generator = state.providers.build(&active)?;

    if !job::transition(&state.db, job_id, from, JobStatus::Tailoring).await? {
        return Err(TransitionError::Job {
            from: JobStatus::Tailoring,
            action: "tailor",
        }
        .into());
    }
    info!(job_id, provider = %generator.kind(), model = generator.model(), "Tailoring started");

    let draft = application::find_or_create_draft(&state.db, job_id).await?;

    match generate_and_store(state, generator.as_ref(), &job, &description, &master, &draft).await {
        Ok(application) => {
            let next = JobStatus::Tailoring.apply(JobEvent::TailoringSucceeded)?;
            if !job::finish_tailoring(&state.db, job_id, next, None).await? {
                return Err(superseded(state, job_id, "finish tailoring").await);
            }
            info!(job_id, application_id = application.id, "Tailoring finished");

            let job = job::find(&state.db, job_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
            Ok(TailorOutcome { job, application })
        }
        Err(e) => {
            let message = e.to_string();
            warn!(job_id, "Tailoring failed: {message}");

            let next = JobStatus::Tailoring.apply(JobEvent::TailoringFailed {
                documents_ready: draft.has_documents(),
            })?;
            if !job::finish_tailoring(&state.db, job_id, next, Some(&message)).await? {
                return Err(superseded(state, job_id, "fail tailoring").await);
            }
            application::record_error(&state.db, draft.id, &message).await?;
            Err(e)
        }
    }
}

/// The job left `tailoring` while the run was in flight. Its status is not
/// touched; when the job is gone the files this run wrote are removed too.
async fn superseded(state: &AppState, job_id: i64, action: &'static str) -> AppError {
    let err = jobs::lost_race(&state.db, job_id, action).await;
    warn!(job_id, "Job changed while tailoring: {err}");
    if matches!(err, AppError::NotFound(_)) {
        // remove() logs its own failure
        let _ = state.documents.remove(job_id).await;
    }
    err
}

async fn load_master_resume(
    state: &AppState,
    resume_id: Option<i64>,
) -> Result<MasterResumeRow, AppError> {
    match resume_id {
        Some(id) => resume::find(&state.db, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found"))),
        None => resume::find_default(&state.db).await?.ok_or_else(|| {
            AppError::Validation("No master resume saved. Add one before tailoring.".to_string())
        }),
    }
}

async fn generate_and_store(
    state: &AppState,
    generator: &dyn TextGenerator,
    job: &JobRow,
    description: &str,
    master: &MasterResumeRow,
    draft: &ApplicationRow,
) -> Result<ApplicationRow, AppError> {
    let status = draft
        .application_status()?
        .apply(ApplicationEvent::DocumentsWritten)?;

    let resume = generate_document(
        generator,
        &GenerationRequest::tailored_resume(&master.content, description),
    )
    .await?;
    info!(job_id = job.id, chars = resume.len(), "Tailored resume generated");

    let cover_letter = generate_document(
        generator,
        &GenerationRequest::cover_letter(
            &resume,
            description,
            &job.company,
            &job.title,
            job.hiring_manager.as_deref(),
        ),
    )
    .await?;
    info!(job_id = job.id, chars = cover_letter.len(), "Cover letter generated");

    let paths = state.documents.write_pair(job.id, &resume, &cover_letter).await?;
    let applicant = extract_applicant_info(&resume);

    Ok(application::record_documents(
        &state.db,
        draft.id,
        &paths,
        generator.kind().as_str(),
        generator.model(),
        status,
        &applicant,
    )
    .await?)
}
