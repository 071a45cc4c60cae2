pub mod dashboard;
pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::generation::handlers as generation;
use crate::jobs::handlers as jobs;
use crate::resumes::handlers as resumes;
use crate::search::handlers as search;
use crate::settings::handlers as settings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        // Board search
        .route("/api/v1/search", post(search::handle_search))
        .route("/api/v1/search/history", get(search::handle_search_history))
        // Jobs
        .route("/api/v1/jobs/parse", post(jobs::handle_parse_job))
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/import", post(jobs::handle_import_job))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/tailor", post(generation::handle_tailor))
        .route("/api/v1/jobs/:id/applied", post(jobs::handle_mark_applied))
        .route("/api/v1/jobs/:id/reject", post(jobs::handle_reject_job))
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application)
                .delete(applications::handle_delete_application),
        )
        .route(
            "/api/v1/applications/:id/documents",
            put(applications::handle_edit_documents),
        )
        .route(
            "/api/v1/applications/:id/applicant",
            put(applications::handle_update_applicant),
        )
        .route(
            "/api/v1/applications/:id/documents/:kind",
            get(applications::handle_download_document),
        )
        .route(
            "/api/v1/applications/:id/submit",
            post(applications::handle_submit_application),
        )
        // Master resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route("/api/v1/resumes/import", post(resumes::handle_import_resume))
        .route(
            "/api/v1/resumes/:id",
            put(resumes::handle_update_resume).delete(resumes::handle_delete_resume),
        )
        // AI settings
        .route(
            "/api/v1/settings/ai",
            get(settings::handle_get_ai_settings).put(settings::handle_save_ai_settings),
        )
        .route(
            "/api/v1/settings/ai/test",
            post(settings::handle_test_ai_settings),
        )
        .with_state(state)
}
