use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::{self, MasterResumeRow, ResumeUpdate};
use crate::resumes::{self, DEFAULT_NAME};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub name: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_default: bool,
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid upload: {e}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<MasterResumeRow>>, AppError> {
    Ok(Json(resume::list(&state.db).await?))
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<MasterResumeRow>), AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Resume content is empty".to_string()));
    }
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_NAME);

    let row = resume::create(&state.db, name, &req.content, req.is_default).await?;
    info!(resume_id = row.id, is_default = row.is_default, "Resume created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/resumes/import
///
/// Multipart fields: `file` (.md, .txt or .pdf), optional `name` and `is_default`.
pub async fn handle_import_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MasterResumeRow>), AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut name: Option<String> = None;
    let mut is_default = false;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume.md").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some("name") => name = Some(field.text().await.map_err(bad_multipart)?),
            Some("is_default") => {
                let value = field.text().await.map_err(bad_multipart)?;
                is_default = matches!(value.trim(), "true" | "on" | "1");
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let content = resumes::text_from_upload(&file_name, bytes).await?;
    let name = resumes::name_for_upload(name.as_deref(), &file_name);

    let row = resume::create(&state.db, &name, &content, is_default).await?;
    info!(resume_id = row.id, file = %file_name, chars = content.len(), "Resume imported");
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ResumeUpdate>,
) -> Result<Json<MasterResumeRow>, AppError> {
    if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(AppError::Validation("Resume content is empty".to_string()));
    }
    let row = resume::update(&state.db, id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(row))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !resume::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    info!(resume_id = id, "Resume deleted");
    Ok(StatusCode::NO_CONTENT)
}
