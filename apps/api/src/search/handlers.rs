use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::search::{self, SearchHistoryRow, HISTORY_LIMIT};
use crate::search::{self as board_search, SearchRequest, SearchResponse};
use crate::state::AppState;

/// POST /api/v1/search
///
/// Boards are queried in sequence; a board that fails shows up in `errors`.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    Ok(Json(board_search::run(&state, &req).await?))
}

/// GET /api/v1/search/history
pub async fn handle_search_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<SearchHistoryRow>>, AppError> {
    Ok(Json(search::recent(&state.db, HISTORY_LIMIT).await?))
}
