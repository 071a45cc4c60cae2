use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::applications::{self, ApplicationDetail, DocumentEdits, SubmitOutcome};
use crate::documents::DocumentFile;
use crate::errors::AppError;
use crate::models::application::{self, ApplicantUpdate, ApplicationRow, ApplicationSummary};
use crate::state::AppState;

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationSummary>>, AppError> {
    Ok(Json(application::list(&state.db, None).await?))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationDetail>, AppError> {
    Ok(Json(applications::detail(&state, id).await?))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    applications::discard(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/applications/:id/documents
pub async fn handle_edit_documents(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(edits): Json<DocumentEdits>,
) -> Result<Json<ApplicationDetail>, AppError> {
    Ok(Json(applications::edit_documents(&state, id, &edits).await?))
}

/// PUT /api/v1/applications/:id/applicant
pub async fn handle_update_applicant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ApplicantUpdate>,
) -> Result<Json<ApplicationRow>, AppError> {
    let row = application::update_applicant(&state.db, id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    Ok(Json(row))
}

/// GET /api/v1/applications/:id/documents/:kind
///
/// `kind` is one of resume_md, resume_pdf, cover_letter_md, cover_letter_pdf.
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path((id, kind)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let file: DocumentFile = kind.parse().map_err(AppError::Validation)?;
    let app = applications::load(&state, id).await?;

    let stored = match file {
        DocumentFile::ResumeMd => app.resume_md,
        DocumentFile::ResumePdf => app.resume_pdf,
        DocumentFile::CoverLetterMd => app.cover_letter_md,
        DocumentFile::CoverLetterPdf => app.cover_letter_pdf,
    };
    let missing = || AppError::NotFound(format!("Application {id} has no {file}"));
    let path = stored.ok_or_else(missing)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name()),
            ),
        ],
        bytes,
    ))
}

/// POST /api/v1/applications/:id/submit
pub async fn handle_submit_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SubmitOutcome>, AppError> {
    Ok(Json(applications::submit(&state, id).await?))
}
