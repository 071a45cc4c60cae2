//! Axum route handlers for AI provider settings.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{ActiveProvider, GenerationRequest, ProviderError, ProviderKind};
use crate::models::ai_config::{self, AiConfigView};
use crate::settings::{self, active_from_row, resolve_active_provider, validate_credential, AiSettings};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveAiSettingsRequest {
    pub provider: String,
    pub model_name: Option<String>,
    /// Omit to keep the stored credential.
    pub api_key: Option<String>,
}

/// Every field optional: an empty body tests the active configuration.
#[derive(Debug, Default, Deserialize)]
pub struct TestAiSettingsRequest {
    pub provider: Option<String>,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestAiSettingsResponse {
    pub ok: bool,
    pub provider: ProviderKind,
    pub model: String,
    pub reply: String,
}

/// Bad user input from the provider layer is a 400, not a gateway failure.
fn rejected(e: ProviderError) -> AppError {
    AppError::Validation(e.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/settings/ai
pub async fn handle_get_ai_settings(
    State(state): State<AppState>,
) -> Result<Json<AiSettings>, AppError> {
    Ok(Json(settings::load(&state.db).await?))
}

/// PUT /api/v1/settings/ai
///
/// Saves the provider's model and (optionally) a new credential, and makes it
/// the only active provider. The credential is encrypted before it is stored.
pub async fn handle_save_ai_settings(
    State(state): State<AppState>,
    Json(request): Json<SaveAiSettingsRequest>,
) -> Result<Json<AiConfigView>, AppError> {
    let kind: ProviderKind = request.provider.trim().parse().map_err(rejected)?;
    let model = non_empty(request.model_name).unwrap_or_else(|| kind.default_model().to_string());

    let sealed = match non_empty(request.api_key) {
        Some(key) if kind.credential_env().is_some() => {
            validate_credential(kind, &key).map_err(rejected)?;
            Some(state.cipher.encrypt(&key)?)
        }
        _ => None,
    };

    let row = ai_config::save_active(&state.db, kind.as_str(), sealed.as_deref(), &model).await?;
    info!(provider = %kind, model = %model, new_credential = sealed.is_some(), "AI provider saved");

    Ok(Json(AiConfigView::from(&row)))
}

/// POST /api/v1/settings/ai/test
///
/// Sends a one-word prompt through the given (or active) provider. Nothing is saved.
pub async fn handle_test_ai_settings(
    State(state): State<AppState>,
    Json(request): Json<TestAiSettingsRequest>,
) -> Result<Json<TestAiSettingsResponse>, AppError> {
    let active = match non_empty(request.provider) {
        None => resolve_active_provider(&state.db, &state.cipher).await?,
        Some(provider) => {
            let kind: ProviderKind = provider.parse().map_err(rejected)?;
            let stored = match ai_config::find_by_provider(&state.db, kind.as_str()).await? {
                Some(row) => Some(active_from_row(&row, &state.cipher)?),
                None => None,
            };

            let credential = match non_empty(request.api_key) {
                Some(key) => {
                    validate_credential(kind, &key).map_err(rejected)?;
                    Some(key)
                }
                None => stored
                    .as_ref()
                    .and_then(|s| s.credential.clone())
                    .or_else(|| settings::credential_from_env(kind)),
            };
            let model = non_empty(request.model_name)
                .or_else(|| stored.map(|s| s.model))
                .unwrap_or_else(|| kind.default_model().to_string());

            ActiveProvider {
                kind,
                model,
                credential,
            }
        }
    };

    info!(provider = %active.kind, model = %active.model, "Testing AI provider");
    let generator = state.providers.build(&active)?;
    let reply = generator.generate(&GenerationRequest::connection_test()).await?;

    Ok(Json(TestAiSettingsResponse {
        ok: true,
        provider: generator.kind(),
        model: generator.model().to_string(),
        reply: reply.trim().to_string(),
    }))
}
