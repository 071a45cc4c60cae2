//! Keyword search across the configured job boards, annotated with what is
//! already saved locally.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::boards::{self, BoardFailure, BoardJob, Freshness, SearchQuery};
use crate::config::split_board_list;
use crate::errors::AppError;
use crate::models::{job, search};
use crate::state::AppState;

pub mod handlers;

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    pub keywords: String,
    pub location: Option<String>,
    /// Board tokens; the configured defaults when absent or empty.
    pub boards: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub listing: BoardJob,
    pub age: Freshness,
    /// Local job id when the listing was saved earlier.
    pub saved_job_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub new_count: usize,
    pub errors: Vec<BoardFailure>,
}

pub async fn run(state: &AppState, request: &SearchRequest) -> Result<SearchResponse, AppError> {
    let keywords = request.keywords.trim();
    if keywords.is_empty() {
        return Err(AppError::Validation("Enter at least one keyword".to_string()));
    }

    let requested: Vec<String> = request
        .boards
        .iter()
        .flatten()
        .flat_map(|b| split_board_list(b))
        .collect();
    let board_list = if requested.is_empty() {
        state.config.default_boards.clone()
    } else {
        requested
    };
    let location = request.location.as_deref().map(str::trim).filter(|l| !l.is_empty());

    let query = SearchQuery::new(keywords, location, board_list.clone());
    let outcome = boards::search(state.boards.as_ref(), &query, state.config.board_pace).await;

    search::record(
        &state.db,
        keywords,
        location,
        Some(board_list.as_slice()),
        outcome.jobs.len() as i64,
    )
    .await?;

    let ids: Vec<String> = outcome.jobs.iter().map(|j| j.board_job_id.clone()).collect();
    let saved = job::saved_board_ids(&state.db, &ids).await?;

    let now = Utc::now();
    let mut results: Vec<SearchResult> = outcome
        .jobs
        .into_iter()
        .map(|listing| SearchResult {
            age: boards::freshness(listing.posted_at, now),
            saved_job_id: saved.get(&listing.board_job_id).copied(),
            listing,
        })
        .collect();
    // Stable: newest-first order is kept within each group.
    results.sort_by_key(|r| r.saved_job_id.is_some());

    Ok(SearchResponse {
        new_count: results.iter().filter(|r| r.saved_job_id.is_none()).count(),
        results,
        errors: outcome.errors,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::boards::fake::{board_job, FakeBoards};
    use crate::jobs;
    use crate::llm_client::mock::MockFactory;

    async fn state_with(boards: FakeBoards) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state =
            AppState::for_tests(dir.path(), Arc::new(MockFactory::default()), Arc::new(boards)).await;
        (dir, state)
    }

    fn request(keywords: &str, boards: &[&str]) -> SearchRequest {
        SearchRequest {
            keywords: keywords.to_string(),
            location: None,
            boards: Some(boards.iter().map(|b| b.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn test_saved_listings_sort_after_new_ones() {
        let boards = FakeBoards::default().with_board(
            "acme",
            vec![
                board_job("acme", "1", "Rust Engineer", "services"),
                board_job("acme", "2", "Rust Platform Engineer", "infra"),
            ],
        );
        let (_dir, state) = state_with(boards).await;
        let (saved, _) = jobs::import_board_job(
            &state.db,
            &board_job("acme", "1", "Rust Engineer", "services"),
        )
        .await
        .unwrap();

        let response = run(&state, &request("rust", &["acme"])).await.unwrap();

        assert_eq!(response.new_count, 1);
        assert_eq!(response.results[0].listing.board_job_id, "2");
        assert_eq!(response.results[1].saved_job_id, Some(saved.id));
        assert_eq!(response.results[1].age.label, "Unknown");
    }

    #[tokio::test]
    async fn test_failing_board_is_reported_and_search_is_recorded() {
        let boards = FakeBoards::default()
            .with_board("acme", vec![board_job("acme", "1", "Go Engineer", "backend")]);
        let (_dir, state) = state_with(boards).await;

        let response = run(&state, &request("go", &["acme", "down"])).await.unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].board, "down");

        let history = search::recent(&state.db, 10).await.unwrap();
        assert_eq!(history[0].keywords, "go");
        assert_eq!(history[0].result_count, 1);
        assert_eq!(
            history[0].boards.as_ref().map(|b| b.0.clone()),
            Some(vec!["acme".to_string(), "down".to_string()])
        );
    }

    #[tokio::test]
    async fn test_default_boards_used_when_none_given() {
        let boards = FakeBoards::default()
            .with_board("acme", vec![board_job("acme", "7", "Rust Engineer", "")]);
        let (_dir, state) = state_with(boards).await;

        let response = run(&state, &request("rust", &[])).await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_keywords_rejected() {
        let (_dir, state) = state_with(FakeBoards::default()).await;
        let err = run(&state, &request("   ", &["acme"])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
